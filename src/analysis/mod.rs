//! Analysis modules.
//!
//! Every function here is pure given a [`Dataset`](crate::dataset::Dataset)
//! and [`AnalysisOptions`]; the caller loads the data once and passes it in.

pub mod aggregator;
pub mod chi_square;
pub mod comparison;
pub mod summary;

pub use aggregator::*;
pub use chi_square::*;
pub use comparison::*;
pub use summary::*;

use std::ops::RangeInclusive;

/// Dataset-specific constants used by the analyses.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Wider group treated as the majority category.
    pub white_label: String,
    /// Ethnic Group IDs kept by the fine-group comparison.
    pub ethnic_ids: RangeInclusive<i64>,
    /// Prefix stripped from fine group labels.
    pub label_prefix: String,
    /// Rows kept at each end of the difference ranking.
    pub top_n: usize,
    /// Apply Yates' continuity correction when dof is 1.
    pub yates_correction: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::from(&crate::config::AnalysisConfig::default())
    }
}

impl From<&crate::config::AnalysisConfig> for AnalysisOptions {
    fn from(config: &crate::config::AnalysisConfig) -> Self {
        Self {
            white_label: config.white_label.clone(),
            ethnic_ids: config.ethnic_id_min..=config.ethnic_id_max,
            label_prefix: config.label_prefix.clone(),
            top_n: config.top_n,
            yates_correction: config.yates_correction,
        }
    }
}
