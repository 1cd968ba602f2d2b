//! EthnoShare - ethnic-group population share analysis.
//!
//! The library holds the whole pipeline; the binary only parses arguments,
//! loads configuration and writes the rendered report.
//!
//! # Modules
//!
//! - [`dataset`] - Loading the census count table into memory.
//! - [`analysis`] - Aggregation, summary statistics, comparisons and the chi-square test.
//! - [`report`] - Markdown/JSON rendering and text charts.
//! - [`config`] - `.ethnoshare.toml` handling.
//! - [`cli`] - Command-line arguments.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod report;

pub use analysis::{
    aggregate_by_area, chi_square_test, describe, ethnic_diff, ethnic_pct_shares,
    summary_statistics, AnalysisOptions,
};
pub use dataset::{load_dataset, Dataset};
pub use error::AnalysisError;
