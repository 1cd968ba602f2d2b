//! Error types for dataset loading and analysis.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a dataset or running an analysis.
///
/// An undefined percentage (a zero denominator) is not an error; it is
/// carried as [`crate::models::Ratio::Undefined`].
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The input file is missing or unreadable.
    #[error("Failed to open dataset {}: {source}", path.display())]
    Load {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying reader error.
        #[source]
        source: csv::Error,
    },

    /// The CSV reader failed mid-file.
    #[error("Failed to read dataset: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Dataset header is missing required column '{0}'")]
    MissingColumn(String),

    /// A data row could not be interpreted.
    #[error("Invalid value in line {line}, column '{column}': {message}")]
    InvalidRow {
        /// 1-based line number in the file (header is line 1).
        line: u64,
        /// Column name.
        column: String,
        /// What went wrong.
        message: String,
    },

    /// The requested local area does not occur in the dataset.
    #[error("Unknown local area: '{0}'")]
    UnknownArea(String),

    /// The chi-square test cannot be computed for this input.
    #[error("Chi-square test is degenerate: {0}")]
    DegenerateTest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AnalysisError::UnknownArea("Atlantis".to_string());
        assert_eq!(err.to_string(), "Unknown local area: 'Atlantis'");

        let err = AnalysisError::MissingColumn("Count".to_string());
        assert!(err.to_string().contains("'Count'"));

        let err = AnalysisError::InvalidRow {
            line: 3,
            column: "Count".to_string(),
            message: "negative count".to_string(),
        };
        assert!(err.to_string().contains("line 3"));
    }
}
