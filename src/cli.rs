//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// EthnoShare - ethnic-group population share reports
///
/// Summarises the non-white share of every local area in a census count
/// table, compares one area's group shares with all areas, and tests the
/// area's distribution against national proportions.
///
/// Examples:
///   ethnoshare --data FormattedData.csv
///   ethnoshare --data FormattedData.csv --area Watford --format json
///   ethnoshare --data FormattedData.csv --min-id 88 --max-id 144 --top 3
///   ethnoshare --data FormattedData.csv --list-areas
///   ethnoshare --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV file with the census count table
    ///
    /// Required columns: "Local Areas", "Wider Ethnic Group", "Ethnic Group",
    /// "Ethnic Group ID", "Count".
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "ETHNOSHARE_DATA",
        required_unless_present = "init_config"
    )]
    pub data: Option<PathBuf>,

    /// Local area to compare against all areas
    ///
    /// Defaults to the value in the config file ("Dacorum" if unset).
    #[arg(short, long, value_name = "NAME")]
    pub area: Option<String>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .ethnoshare.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of groups shown at each end of the difference ranking
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Lowest Ethnic Group ID included in the fine-group comparison
    #[arg(long, value_name = "ID", allow_negative_numbers = true)]
    pub min_id: Option<i64>,

    /// Highest Ethnic Group ID included in the fine-group comparison
    #[arg(long, value_name = "ID", allow_negative_numbers = true)]
    pub max_id: Option<i64>,

    /// Wider group treated as the majority category
    #[arg(long, value_name = "LABEL")]
    pub white_label: Option<String>,

    /// Prefix stripped from fine group labels in the report
    #[arg(long, value_name = "PREFIX")]
    pub label_prefix: Option<String>,

    /// Disable Yates' continuity correction for one degree of freedom
    #[arg(long)]
    pub no_yates: bool,

    /// Width of text bar charts, in characters
    #[arg(long, value_name = "COLS")]
    pub bar_width: Option<usize>,

    /// Exit with code 2 when the chi-square p-value is below this level
    ///
    /// Useful for scripted checks. Values in (0, 1].
    #[arg(long, value_name = "ALPHA")]
    pub fail_below_p: Option<f64>,

    /// Print the local areas found in the dataset and exit
    #[arg(long)]
    pub list_areas: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .ethnoshare.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension for reports in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.data {
            Some(ref path) if !path.is_file() => {
                return Err(format!("Data file does not exist: {}", path.display()));
            }
            None => return Err("A data file is required (--data)".to_string()),
            _ => {}
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        if self.bar_width == Some(0) {
            return Err("--bar-width must be at least 1".to_string());
        }

        if let (Some(min), Some(max)) = (self.min_id, self.max_id) {
            if min > max {
                return Err(format!("--min-id ({}) must not exceed --max-id ({})", min, max));
            }
        }

        if let Some(alpha) = self.fail_below_p {
            if !(alpha > 0.0 && alpha <= 1.0) {
                return Err("--fail-below-p must be in (0, 1]".to_string());
            }
        }

        if let Some(ref area) = self.area {
            if area.trim().is_empty() {
                return Err("--area must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins
    /// over both it and `--verbose`.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
