//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.ethnoshare.toml` files.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".ethnoshare.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Local area the comparisons focus on.
    #[serde(default = "default_area")]
    pub area: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            area: default_area(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "ethnoshare_report.md".to_string()
}

fn default_area() -> String {
    "Dacorum".to_string()
}

/// Dataset-specific analysis constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Wider group treated as the majority ("White") category.
    #[serde(default = "default_white_label")]
    pub white_label: String,

    /// Lowest Ethnic Group ID in the sub-classification window.
    #[serde(default = "default_ethnic_id_min")]
    pub ethnic_id_min: i64,

    /// Highest Ethnic Group ID in the sub-classification window.
    #[serde(default = "default_ethnic_id_max")]
    pub ethnic_id_max: i64,

    /// Prefix stripped from fine group labels for display.
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,

    /// Rows kept at each end of the difference ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Apply Yates' continuity correction when dof is 1.
    #[serde(default = "default_true")]
    pub yates_correction: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            white_label: default_white_label(),
            ethnic_id_min: default_ethnic_id_min(),
            ethnic_id_max: default_ethnic_id_max(),
            label_prefix: default_label_prefix(),
            top_n: default_top_n(),
            yates_correction: true,
        }
    }
}

fn default_white_label() -> String {
    "White".to_string()
}

fn default_ethnic_id_min() -> i64 {
    88
}

fn default_ethnic_id_max() -> i64 {
    144
}

fn default_label_prefix() -> String {
    "Mixed or Multiple ethnic groups: ".to_string()
}

fn default_top_n() -> usize {
    5
}

fn default_true() -> bool {
    true
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Width of text bar charts, in characters.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,

    /// Include the full per-area table.
    #[serde(default = "default_true")]
    pub include_area_table: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
            include_area_table: true,
        }
    }
}

fn default_bar_width() -> usize {
    40
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.analysis.ethnic_id_min > self.analysis.ethnic_id_max {
            bail!(
                "ethnic_id_min ({}) must not exceed ethnic_id_max ({})",
                self.analysis.ethnic_id_min,
                self.analysis.ethnic_id_max
            );
        }
        if self.analysis.top_n == 0 {
            bail!("top_n must be at least 1");
        }
        if self.report.bar_width == 0 {
            bail!("bar_width must be at least 1");
        }
        Ok(())
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref area) = args.area {
            self.general.area = area.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(top) = args.top {
            self.analysis.top_n = top;
        }
        if let Some(min_id) = args.min_id {
            self.analysis.ethnic_id_min = min_id;
        }
        if let Some(max_id) = args.max_id {
            self.analysis.ethnic_id_max = max_id;
        }
        if let Some(ref label) = args.white_label {
            self.analysis.white_label = label.clone();
        }
        if let Some(ref prefix) = args.label_prefix {
            self.analysis.label_prefix = prefix.clone();
        }
        if args.no_yates {
            self.analysis.yates_correction = false;
        }

        if let Some(width) = args.bar_width {
            self.report.bar_width = width;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.area, "Dacorum");
        assert_eq!(config.analysis.white_label, "White");
        assert_eq!(config.analysis.ethnic_id_min, 88);
        assert_eq!(config.analysis.ethnic_id_max, 144);
        assert_eq!(config.analysis.top_n, 5);
        assert!(config.analysis.yates_correction);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"
area = "Watford"

[analysis]
ethnic_id_min = 10
ethnic_id_max = 20
label_prefix = "Asian: "
yates_correction = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert_eq!(config.general.area, "Watford");
        assert!(!config.general.verbose);
        assert_eq!(config.analysis.ethnic_id_min, 10);
        assert_eq!(config.analysis.ethnic_id_max, 20);
        assert_eq!(config.analysis.label_prefix, "Asian: ");
        assert_eq!(config.analysis.white_label, "White");
        assert!(!config.analysis.yates_correction);
        assert_eq!(config.report.bar_width, 40);
    }

    #[test]
    fn test_verbose_from_file_sets_debug_level() {
        use crate::cli::Args;
        use clap::Parser;
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[general]\nverbose = true\n").unwrap();

        let mut config = Config::load(file.path()).unwrap();
        let args = Args::try_parse_from(["ethnoshare", "--data", "data.csv"]).unwrap();
        config.merge_with_args(&args);

        assert!(config.general.verbose);
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);

        let quiet = Args::try_parse_from(["ethnoshare", "--data", "data.csv", "-q"]).unwrap();
        assert_eq!(quiet.log_level(config.general.verbose), tracing::Level::ERROR);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = Config::default();
        config.analysis.ethnic_id_min = 200;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.top_n = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[analysis]"));
        assert!(toml_str.contains("[report]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.analysis.label_prefix, "Mixed or Multiple ethnic groups: ");
    }
}
