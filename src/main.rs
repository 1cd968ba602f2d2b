//! EthnoShare - ethnic-group population share reports
//!
//! A CLI tool that reads a census count table, summarises the non-white
//! share of every local area, compares one area with the whole dataset,
//! and tests that area against national proportions.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing file, bad header, unknown area, config, etc.)
//!   2 - Chi-square p-value below --fail-below-p

use anyhow::{Context, Result};
use chrono::Utc;
use ethnoshare::analysis::{self, AnalysisOptions};
use ethnoshare::cli::{Args, OutputFormat};
use ethnoshare::config::{self, Config};
use ethnoshare::dataset::{self, Dataset};
use ethnoshare::error::AnalysisError;
use ethnoshare::models::{Ratio, Report, ReportMetadata};
use ethnoshare::report;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Configuration is needed before logging: `[general] verbose` sets the level
    let (config, config_source) = match prepare_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose));

    info!("EthnoShare v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    match run_report(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .ethnoshare.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to set the focus area, ID range, label prefix, and more.");
    Ok(())
}

/// Initialize logging at the given maximum level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete report workflow. Returns exit code (0 or 2).
fn run_report(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let data_path = args
        .data
        .clone()
        .context("A data file is required (--data)")?;

    // Step 1: Load the dataset
    println!("📥 Loading dataset: {}", data_path.display());
    let dataset = dataset::load_dataset(&data_path)?;

    if args.list_areas {
        return handle_list_areas(&dataset);
    }

    let area = config.general.area.clone();
    let options = AnalysisOptions::from(&config.analysis);
    dataset.require_area(&area).with_context(|| {
        format!("Use --list-areas to see the {} areas in the dataset", dataset.areas().len())
    })?;

    // Step 2: Aggregate by area
    println!("🔢 Aggregating {} records...", dataset.len());
    let area_table = analysis::aggregate_by_area(&dataset, &options);
    let nw_values: Vec<Ratio> = area_table
        .nw_percentages()
        .into_iter()
        .map(|share| share.nw_percentage)
        .collect();
    let nw_summary = analysis::summary_statistics(&nw_values);
    let highlighted = area_table
        .area(&area)
        .map(|row| row.nw_percentage)
        .unwrap_or(Ratio::Undefined);

    // Step 3: Compare the focus area with all areas
    println!("📊 Comparing {} with all areas...", area);
    let shares = analysis::ethnic_pct_shares(&dataset, &area, &options)?;
    let diff = analysis::ethnic_diff(&dataset, &area, &options)?;

    // Step 4: Chi-square test
    let (chi_square, chi_square_error) = match analysis::chi_square_test(&dataset, &area, &options)
    {
        Ok(result) => (Some(result), None),
        Err(e @ AnalysisError::DegenerateTest(_)) => {
            warn!("{}", e);
            (None, Some(e.to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    // Step 5: Build and write the report
    println!("📝 Generating report...");

    let metadata = ReportMetadata {
        dataset: data_path.display().to_string(),
        area: area.clone(),
        generated_at: Utc::now(),
        records: dataset.len(),
        areas: area_table.rows.len(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report {
        metadata,
        area_table,
        nw_summary,
        highlighted,
        shares,
        diff,
        chi_square,
        chi_square_error,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = resolve_output_path(&args, &config);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    print_summary(&report);
    println!("\n✅ Report saved to: {}", output_path.display());

    // Check --fail-below-p threshold
    if let (Some(alpha), Some(result)) = (args.fail_below_p, report.chi_square.as_ref()) {
        if result.p_value < alpha {
            eprintln!(
                "\n⛔ p-value {:.4e} is below {}. Failing (exit code 2).",
                result.p_value, alpha
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Handle --list-areas: print every area in the dataset and exit.
fn handle_list_areas(dataset: &Dataset) -> Result<i32> {
    let areas = dataset.areas();

    if areas.is_empty() {
        println!("   No local areas found.");
    } else {
        println!("\n   Found {} local areas:\n", areas.len());
        for area in &areas {
            println!("     📍 {}", area);
        }
    }

    Ok(0)
}

/// Print the headline numbers to stdout.
fn print_summary(report: &Report) {
    println!("\n📊 Summary:");
    println!("   Areas: {}", report.metadata.areas);

    if let Some(ref stats) = report.nw_summary {
        println!(
            "   NW %: min {:.2} | Q1 {:.2} | median {:.2} | Q3 {:.2} | max {:.2}",
            stats.min, stats.q1, stats.median, stats.q3, stats.max
        );
    }
    println!("   {}: {:.2}", report.metadata.area, report.highlighted);

    if let Some(ref result) = report.chi_square {
        println!(
            "   Chi-square: {:.4} (p = {:.4e}, dof = {})",
            result.statistic, result.p_value, result.dof
        );
    }
}

/// Use --output when given, otherwise the configured path with the
/// extension of the chosen format.
fn resolve_output_path(args: &Args, config: &Config) -> PathBuf {
    match args.output {
        Some(ref path) => path.clone(),
        None => PathBuf::from(&config.general.output).with_extension(args.format.extension()),
    }
}

/// Load, merge and validate the configuration.
///
/// Runs before logging is installed, so problems go to stderr directly.
/// Also returns the path the configuration came from, if any.
fn prepare_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    let (mut config, source) = load_config(args)?;
    config.merge_with_args(args);
    config.validate()?;
    Ok((config, source))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Ok((Config::load(config_path)?, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(config::CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok((Config::default(), None))
        }
    }
}
