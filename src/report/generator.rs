//! Markdown and JSON report generation.
//!
//! This module renders the computed tables into a report. It receives
//! finished numbers only and never touches raw records.

use super::charts::{bar, boxplot_line, signed_bar};
use crate::config::ReportConfig;
use crate::models::{
    AreaAggregateTable, ChiSquareResult, EthnicDiff, EthnicShareComparison, Ratio, Report,
    ReportMetadata, SharePair, SummaryStatistics,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report, config: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# EthnoShare Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(config));

    if config.include_area_table {
        output.push_str(&generate_area_section(
            &report.area_table,
            &report.metadata.area,
        ));
    }

    output.push_str(&generate_summary_section(
        report.nw_summary.as_ref(),
        &report.metadata.area,
        report.highlighted,
        config.bar_width,
    ));
    output.push_str(&generate_shares_section(&report.shares, config.bar_width));
    output.push_str(&generate_diff_section(&report.diff, config.bar_width));
    output.push_str(&generate_chi_square_section(
        report.chi_square.as_ref(),
        report.chi_square_error.as_deref(),
        &report.metadata.area,
    ));

    // Footer
    output.push_str("---\n\n*Report generated by EthnoShare*\n");

    output
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Escape text for use inside a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Format a percentage with two decimals, or `n/a`.
fn pct(ratio: Ratio) -> String {
    match ratio {
        Ratio::Defined(v) => format!("{:.2}%", v),
        Ratio::Undefined => "n/a".to_string(),
    }
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Dataset:** `{}`\n", metadata.dataset));
    section.push_str(&format!("- **Focus Area:** {}\n", metadata.area));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Records:** {}\n", metadata.records));
    section.push_str(&format!("- **Local Areas:** {}\n", metadata.areas));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.3}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_table_of_contents(config: &ReportConfig) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    if config.include_area_table {
        toc.push_str("- [Non-White Share by Area](#non-white-share-by-area)\n");
    }
    toc.push_str("- [Summary Statistics](#summary-statistics)\n");
    toc.push_str("- [Wider Group Shares](#wider-group-shares)\n");
    toc.push_str("- [Fine Group Differences](#fine-group-differences)\n");
    toc.push_str("- [Chi-Square Test](#chi-square-test)\n\n");

    toc
}

fn generate_area_section(table: &AreaAggregateTable, focus: &str) -> String {
    let mut section = String::new();

    section.push_str("## Non-White Share by Area\n\n");

    if table.is_empty() {
        section.push_str("No areas in the dataset.\n\n");
        return section;
    }

    section.push_str("| Area |");
    for group in &table.groups {
        section.push_str(&format!(" {} |", cell(group)));
    }
    section.push_str(" Total | NW Count | NW % |\n");

    section.push_str("|:---|");
    section.push_str(&"---:|".repeat(table.groups.len() + 3));
    section.push('\n');

    for row in &table.rows {
        let name = if row.area == focus {
            format!("**{}**", cell(&row.area))
        } else {
            cell(&row.area)
        };
        section.push_str(&format!("| {} |", name));
        for group in &table.groups {
            section.push_str(&format!(" {} |", row.counts.get(group).copied().unwrap_or(0)));
        }
        section.push_str(&format!(
            " {} | {} | {} |\n",
            row.total,
            row.nw_count,
            pct(row.nw_percentage)
        ));
    }
    section.push('\n');

    section
}

fn generate_summary_section(
    stats: Option<&SummaryStatistics>,
    focus: &str,
    highlighted: Ratio,
    width: usize,
) -> String {
    let mut section = String::new();

    section.push_str("## Summary Statistics\n\n");

    let Some(stats) = stats else {
        section.push_str("No defined non-white percentages to summarise.\n\n");
        return section;
    };

    section.push_str("| Count | Mean | Std | Min | Q1 | Median | Q3 | Max |\n");
    section.push_str("|---:|---:|---:|---:|---:|---:|---:|---:|\n");
    section.push_str(&format!(
        "| {} | {:.2}% | {} | {:.2}% | {:.2}% | {:.2}% | {:.2}% | {:.2}% |\n\n",
        stats.count,
        stats.mean,
        stats
            .std
            .map(|s| format!("{:.2}", s))
            .unwrap_or_else(|| "n/a".to_string()),
        stats.min,
        stats.q1,
        stats.median,
        stats.q3,
        stats.max
    ));

    if stats.excluded > 0 {
        section.push_str(&format!(
            "*{} area(s) with no population were excluded.*\n\n",
            stats.excluded
        ));
    }

    section.push_str(&format!("**{}:** {}\n\n", focus, pct(highlighted)));

    section.push_str("```text\n");
    section.push_str(&format!(
        "{:.2}% {} {:.2}%\n",
        stats.min,
        boxplot_line(stats, highlighted.value(), width),
        stats.max
    ));
    section.push_str("```\n\n");

    section
}

fn generate_shares_section(shares: &SharePair, width: usize) -> String {
    let mut section = String::new();

    section.push_str("## Wider Group Shares\n\n");
    section.push_str(&format!(
        "Share of the non-white population, {} versus all areas.\n\n",
        shares.area
    ));

    if shares.all_areas.is_empty() {
        section.push_str("No non-white population in the dataset.\n\n");
        return section;
    }

    section.push_str(&format!("| Group | All Areas | {} |\n", cell(&shares.area)));
    section.push_str("|:---|---:|---:|\n");
    for (all, local) in shares.all_areas.iter().zip(&shares.area_shares) {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            cell(&all.group),
            pct(all.pct_share),
            pct(local.pct_share)
        ));
    }
    section.push('\n');

    let max = shares
        .all_areas
        .iter()
        .chain(&shares.area_shares)
        .filter_map(|s| s.pct_share.value())
        .fold(0.0, f64::max);
    let label_width = shares
        .all_areas
        .iter()
        .map(|s| s.group.chars().count())
        .max()
        .unwrap_or(0);

    section.push_str("```text\n");
    for (all, local) in shares.all_areas.iter().zip(&shares.area_shares) {
        section.push_str(&format!(
            "{:<w$} all  {}\n",
            all.group,
            bar(all.pct_share.value().unwrap_or(0.0), max, width),
            w = label_width
        ));
        section.push_str(&format!(
            "{:<w$} area {}\n",
            "",
            bar(local.pct_share.value().unwrap_or(0.0), max, width),
            w = label_width
        ));
    }
    section.push_str("```\n\n");

    section
}

fn generate_diff_section(diff: &EthnicDiff, width: usize) -> String {
    let mut section = String::new();

    section.push_str("## Fine Group Differences\n\n");
    section.push_str(&format!(
        "Percentage-point difference between {} and all areas.\n\n",
        diff.area
    ));

    if diff.rows.is_empty() {
        section.push_str("No fine groups in the selected ID range.\n\n");
        return section;
    }

    section.push_str("### Most Over-Represented\n\n");
    section.push_str(&generate_diff_table(&diff.top));
    section.push_str("### Most Under-Represented\n\n");
    section.push_str(&generate_diff_table(&diff.bottom));

    let max_abs = diff
        .top
        .iter()
        .chain(&diff.bottom)
        .filter_map(|r| r.pct_share_diff.value())
        .fold(0.0, |acc: f64, v| acc.max(v.abs()));
    let half = (width / 2).max(1);
    let label_width = diff
        .top
        .iter()
        .chain(&diff.bottom)
        .map(|r| r.ethnic_group.chars().count())
        .max()
        .unwrap_or(0);

    section.push_str("```text\n");
    for row in diff.top.iter().chain(&diff.bottom) {
        section.push_str(&format!(
            "{:<w$} {} {}\n",
            row.ethnic_group,
            signed_bar(row.pct_share_diff.value().unwrap_or(0.0), max_abs, half),
            pct(row.pct_share_diff),
            w = label_width
        ));
    }
    section.push_str("```\n\n");

    section
}

fn generate_diff_table(rows: &[EthnicShareComparison]) -> String {
    let mut table = String::new();

    table.push_str("| Ethnic Group | Area Count | Area % | All Count | All % | Diff |\n");
    table.push_str("|:---|---:|---:|---:|---:|---:|\n");
    for row in rows {
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            cell(&row.ethnic_group),
            row.count_area,
            pct(row.pct_share_area),
            row.count_all,
            pct(row.pct_share_all),
            pct(row.pct_share_diff)
        ));
    }
    table.push('\n');

    table
}

fn generate_chi_square_section(
    result: Option<&ChiSquareResult>,
    error: Option<&str>,
    focus: &str,
) -> String {
    let mut section = String::new();

    section.push_str("## Chi-Square Test\n\n");

    let Some(result) = result else {
        section.push_str(&format!(
            "The test could not be computed for {}: {}\n\n",
            focus,
            error.unwrap_or("no result")
        ));
        return section;
    };

    section.push_str(&format!(
        "Observed counts in {} against national shares rescaled to its population.\n\n",
        focus
    ));
    section.push_str("| Group | Observed | Expected |\n");
    section.push_str("|:---|---:|---:|\n");
    for ((group, observed), expected) in result
        .categories
        .iter()
        .zip(&result.observed)
        .zip(&result.expected)
    {
        section.push_str(&format!(
            "| {} | {:.0} | {:.2} |\n",
            cell(group),
            observed,
            expected
        ));
    }
    section.push('\n');

    section.push_str(&format!("- **Statistic:** {:.4}\n", result.statistic));
    section.push_str(&format!("- **p-value:** {:.4e}\n", result.p_value));
    section.push_str(&format!("- **Degrees of Freedom:** {}\n\n", result.dof));

    section
}
