//! Data models for the share analysis.
//!
//! This module contains the core data structures used throughout
//! the application: input records, derived tables, and the report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// One row of the input table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Local area (geography) name.
    pub area: String,
    /// Coarse ethnic category.
    pub wider_group: String,
    /// Fine ethnic category.
    pub ethnic_group: String,
    /// Numeric identifier of the fine category.
    pub ethnic_group_id: i64,
    /// Population count.
    pub count: u64,
}

impl Record {
    /// Convenience constructor used by tests and in-memory datasets.
    pub fn new(
        area: &str,
        wider_group: &str,
        ethnic_group: &str,
        ethnic_group_id: i64,
        count: u64,
    ) -> Self {
        Self {
            area: area.to_string(),
            wider_group: wider_group.to_string(),
            ethnic_group: ethnic_group.to_string(),
            ethnic_group_id,
            count,
        }
    }
}

/// A percentage that may be undefined because its denominator was zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Ratio {
    /// A finite percentage value.
    Defined(f64),
    /// The denominator was zero.
    Undefined,
}

impl Ratio {
    /// `part / whole * 100`, or `Undefined` when `whole` is zero.
    pub fn percentage(part: u64, whole: u64) -> Self {
        if whole == 0 {
            Ratio::Undefined
        } else {
            Ratio::Defined(part as f64 / whole as f64 * 100.0)
        }
    }

    /// Returns the value if defined.
    pub fn value(&self) -> Option<f64> {
        match self {
            Ratio::Defined(v) => Some(*v),
            Ratio::Undefined => None,
        }
    }

    /// True when the denominator was zero.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Ratio::Undefined)
    }

    /// Difference of two ratios; undefined if either side is.
    pub fn diff(self, other: Ratio) -> Ratio {
        match (self, other) {
            (Ratio::Defined(a), Ratio::Defined(b)) => Ratio::Defined(a - b),
            _ => Ratio::Undefined,
        }
    }

    /// Ascending order with `Undefined` after every defined value.
    pub fn cmp_undefined_last(&self, other: &Ratio) -> Ordering {
        match (self, other) {
            (Ratio::Defined(a), Ratio::Defined(b)) => a.total_cmp(b),
            (Ratio::Defined(_), Ratio::Undefined) => Ordering::Less,
            (Ratio::Undefined, Ratio::Defined(_)) => Ordering::Greater,
            (Ratio::Undefined, Ratio::Undefined) => Ordering::Equal,
        }
    }

    /// Descending order with `Undefined` still after every defined value.
    pub fn cmp_desc_undefined_last(&self, other: &Ratio) -> Ordering {
        match (self, other) {
            (Ratio::Defined(a), Ratio::Defined(b)) => b.total_cmp(a),
            _ => self.cmp_undefined_last(other),
        }
    }
}

impl From<Option<f64>> for Ratio {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Ratio::Defined(v),
            _ => Ratio::Undefined,
        }
    }
}

impl From<Ratio> for Option<f64> {
    fn from(ratio: Ratio) -> Self {
        ratio.value()
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Defined(v) => fmt::Display::fmt(v, f),
            Ratio::Undefined => f.write_str("n/a"),
        }
    }
}

/// Per-area counts pivoted by wider ethnic group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaAggregate {
    /// Local area name.
    pub area: String,
    /// Summed count per wider group (every known group present, 0 if absent).
    pub counts: BTreeMap<String, u64>,
    /// Sum of all group counts.
    pub total: u64,
    /// Total minus the White count.
    pub nw_count: u64,
    /// Non-white share of the total.
    pub nw_percentage: Ratio,
}

impl AreaAggregate {
    /// Share of one wider group within this area.
    pub fn group_percentage(&self, group: &str) -> Ratio {
        Ratio::percentage(self.counts.get(group).copied().unwrap_or(0), self.total)
    }
}

/// Non-white percentage of a single area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaShare {
    /// Local area name.
    pub area: String,
    /// Non-white share of the area's total.
    pub nw_percentage: Ratio,
}

/// The full per-area aggregate table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaAggregateTable {
    /// Wider group columns, sorted by name.
    pub groups: Vec<String>,
    /// One row per area, sorted by area name.
    pub rows: Vec<AreaAggregate>,
}

impl AreaAggregateTable {
    /// Projection to the NW-percentage-only table.
    pub fn nw_percentages(&self) -> Vec<AreaShare> {
        self.rows
            .iter()
            .map(|row| AreaShare {
                area: row.area.clone(),
                nw_percentage: row.nw_percentage,
            })
            .collect()
    }

    /// Look up the row for one area.
    pub fn area(&self, name: &str) -> Option<&AreaAggregate> {
        self.rows.iter().find(|row| row.area == name)
    }

    /// True when the dataset had no areas.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Descriptive statistics over a percentage series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    /// Number of defined values used.
    pub count: usize,
    /// Number of undefined values left out.
    pub excluded: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    /// Smallest value.
    pub min: f64,
    /// First quartile.
    pub q1: f64,
    /// Second quartile.
    pub median: f64,
    /// Third quartile.
    pub q3: f64,
    /// Largest value.
    pub max: f64,
}

/// Count and share of one wider group within one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthnicShare {
    /// Wider ethnic group.
    pub group: String,
    /// Summed count of the group within the scope.
    pub count: u64,
    /// Share of the scope's non-white total.
    pub pct_share: Ratio,
}

/// Aligned share series for all areas and one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharePair {
    /// The area being compared.
    pub area: String,
    /// Shares within the whole dataset.
    pub all_areas: Vec<EthnicShare>,
    /// Shares within the area, in the same group order.
    pub area_shares: Vec<EthnicShare>,
}

/// One fine ethnic group compared between an area and all areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthnicShareComparison {
    /// Display label (configured prefix removed).
    pub ethnic_group: String,
    /// Count within the area (0 if the area lacks the group).
    pub count_area: u64,
    /// Share of the area's in-window total.
    pub pct_share_area: Ratio,
    /// Count across all areas.
    pub count_all: u64,
    /// Share of the in-window total across all areas.
    pub pct_share_all: Ratio,
    /// Area share minus national share.
    pub pct_share_diff: Ratio,
}

/// Sorted comparison rows with the largest over- and under-representations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthnicDiff {
    /// The area being compared.
    pub area: String,
    /// All joined rows, sorted by descending difference.
    pub rows: Vec<EthnicShareComparison>,
    /// First rows of the sorted list.
    pub top: Vec<EthnicShareComparison>,
    /// Last rows of the sorted list.
    pub bottom: Vec<EthnicShareComparison>,
}

/// Outcome of the chi-square test for one area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    /// Pearson chi-square statistic.
    pub statistic: f64,
    /// Upper-tail probability of the statistic.
    pub p_value: f64,
    /// Degrees of freedom (categories minus one).
    pub dof: usize,
    /// Categories that survived the join.
    pub categories: Vec<String>,
    /// Local counts per category.
    pub observed: Vec<f64>,
    /// National counts rescaled to the local total.
    pub expected: Vec<f64>,
}

/// Metadata about the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Path of the input file.
    pub dataset: String,
    /// Area the comparisons focus on.
    pub area: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of input records.
    pub records: usize,
    /// Number of distinct local areas.
    pub areas: usize,
    /// Duration of the analysis in seconds.
    pub duration_seconds: f64,
}

/// The complete share report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Input, focus area and timing.
    pub metadata: ReportMetadata,
    /// Per-area aggregate table.
    pub area_table: AreaAggregateTable,
    /// Statistics over the areas' NW percentages.
    pub nw_summary: Option<SummaryStatistics>,
    /// NW percentage of the focus area.
    pub highlighted: Ratio,
    /// Wider group shares, White excluded.
    pub shares: SharePair,
    /// Fine group differences.
    pub diff: EthnicDiff,
    /// Chi-square outcome, if the test could be computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chi_square: Option<ChiSquareResult>,
    /// Why the chi-square test could not be computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chi_square_error: Option<String>,
}
