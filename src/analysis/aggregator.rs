//! Per-area aggregation.
//!
//! Groups records by local area and wider ethnic group, and derives the
//! total, non-white count and non-white percentage of each area.

use super::AnalysisOptions;
use crate::dataset::Dataset;
use crate::models::{AreaAggregate, AreaAggregateTable, Ratio, Record};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Sum counts per key over a set of records.
pub fn sum_by<'a, I, F>(records: I, key: F) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Record>,
    F: Fn(&Record) -> &str,
{
    let mut sums: BTreeMap<String, u64> = BTreeMap::new();

    for record in records {
        *sums.entry(key(record).to_string()).or_default() += record.count;
    }

    sums
}

/// Pivot wider groups into columns and derive the NW columns for each area.
///
/// Areas and columns are both ordered by name. Every group seen anywhere in
/// the dataset appears in every row, filled with 0 when the area has none.
pub fn aggregate_by_area(dataset: &Dataset, options: &AnalysisOptions) -> AreaAggregateTable {
    let groups: BTreeSet<&str> = dataset
        .records()
        .iter()
        .map(|r| r.wider_group.as_str())
        .collect();

    let mut by_area: BTreeMap<&str, BTreeMap<String, u64>> = BTreeMap::new();
    for record in dataset.records() {
        let counts = by_area.entry(record.area.as_str()).or_insert_with(|| {
            groups.iter().map(|g| (g.to_string(), 0)).collect()
        });
        *counts.entry(record.wider_group.clone()).or_default() += record.count;
    }

    let rows: Vec<AreaAggregate> = by_area
        .into_iter()
        .map(|(area, counts)| {
            let total: u64 = counts.values().sum();
            let white = counts.get(&options.white_label).copied().unwrap_or(0);
            let nw_count = total - white;

            AreaAggregate {
                area: area.to_string(),
                counts,
                total,
                nw_count,
                nw_percentage: Ratio::percentage(nw_count, total),
            }
        })
        .collect();

    debug!(
        "Aggregated {} areas over {} wider groups",
        rows.len(),
        groups.len()
    );

    AreaAggregateTable {
        groups: groups.into_iter().map(String::from).collect(),
        rows,
    }
}
