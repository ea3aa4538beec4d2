//! Report assembly and the HTML, JSON and console renderings.

use super::charts::Chart;
use super::missing::MissingValueAudit;
use super::narrative::{Conclusion, conclusions};
use super::statistics::{ColumnStatistics, describe};
use crate::bucketizer::BucketSummaries;
use crate::cleaner::CleaningSummary;
use crate::config::{ParsePolicy, ReportConfig};
use crate::error::{ReportError, Result};
use crate::normalizer::{NormalizedTable, RowParseError};
use askama::Template;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Number of rejected rows listed individually in the report.
pub const REJECTED_SAMPLE_SIZE: usize = 20;

// ============================================================================
// Report Types
// ============================================================================

/// The complete incident report.
///
/// Serialized as-is for `--json` output and the JSON artifact; rendered to
/// HTML and plain text by [`ReportGenerator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Where the data came from
    pub source: String,
    pub run: RunSummary,
    pub column_statistics: Vec<ColumnStatistics>,
    pub missing_values: MissingValueAudit,
    pub summaries: BucketSummaries,
    pub conclusions: Vec<Conclusion>,
    /// The first rejected fields, in row order
    pub rejected_sample: Vec<RowParseError>,
}

/// Row accounting across the pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub duration_ms: u64,
    pub rows_loaded: usize,
    pub duplicates_removed: usize,
    pub columns_dropped: Vec<String>,
    pub rows_normalized: usize,
    pub rows_rejected: usize,
    pub parse_policy: ParsePolicy,
    pub cleaning_actions: Vec<String>,
}

/// Inputs for [`ReportGenerator::build_report`].
pub struct ReportParams<'a> {
    pub source: &'a str,
    pub cleaning: &'a CleaningSummary,
    pub table: &'a NormalizedTable,
    pub summaries: &'a BucketSummaries,
    pub parse_policy: ParsePolicy,
    pub duration_ms: u64,
}

// ============================================================================
// Generator
// ============================================================================

/// Builds the report and writes its artifacts.
pub struct ReportGenerator {
    output_dir: PathBuf,
    html_path: PathBuf,
    json_path: PathBuf,
    chart_width: u32,
    chart_height: u32,
}

impl ReportGenerator {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            html_path: config.html_path(),
            json_path: config.json_path(),
            chart_width: config.chart_width,
            chart_height: config.chart_height,
        }
    }

    /// Assemble the report from the outputs of the earlier stages.
    pub fn build_report(params: ReportParams<'_>) -> IncidentReport {
        let table = params.table;
        IncidentReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: params.source.to_string(),
            run: RunSummary {
                duration_ms: params.duration_ms,
                rows_loaded: params.cleaning.rows_before,
                duplicates_removed: params.cleaning.duplicates_removed,
                columns_dropped: params.cleaning.columns_dropped.clone(),
                rows_normalized: table.len(),
                rows_rejected: table.rejected_rows(),
                parse_policy: params.parse_policy,
                cleaning_actions: params.cleaning.actions.clone(),
            },
            column_statistics: describe(table),
            missing_values: MissingValueAudit::from_table(table),
            summaries: params.summaries.clone(),
            conclusions: conclusions(params.summaries),
            rejected_sample: table
                .rejected
                .iter()
                .take(REJECTED_SAMPLE_SIZE)
                .cloned()
                .collect(),
        }
    }

    /// The four charts in display order.
    pub fn charts(report: &IncidentReport) -> Vec<Chart> {
        report
            .summaries
            .tables()
            .into_iter()
            .map(Chart::from_summary)
            .collect()
    }

    /// Render the report as a self-contained HTML document.
    pub fn render_html(&self, report: &IncidentReport) -> Result<String> {
        let page = ReportPage {
            report,
            charts: Self::charts(report)
                .iter()
                .map(|chart| chart.render_svg(self.chart_width, self.chart_height))
                .collect(),
            statistics: report
                .column_statistics
                .iter()
                .map(StatisticsRow::from)
                .collect(),
        };
        page.render()
            .map_err(|e| ReportError::ReportGenerationFailed(format!("HTML template: {}", e)))
    }

    /// Render the summary statistics, missing-value audit and conclusions as plain text.
    pub fn render_text(report: &IncidentReport) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        write_text(&mut out, report).ok();
        out
    }

    /// Write the HTML document, returning its path.
    pub fn write_html(&self, report: &IncidentReport) -> Result<PathBuf> {
        let path = &self.html_path;
        self.write_artifact(path, self.render_html(report)?.as_bytes())?;
        info!("Report saved: {}", path.display());
        Ok(path.clone())
    }

    /// Write the report as pretty-printed JSON, returning its path.
    pub fn write_json(&self, report: &IncidentReport) -> Result<PathBuf> {
        let path = &self.json_path;
        let json = serde_json::to_string_pretty(report)?;
        self.write_artifact(path, json.as_bytes())?;
        info!("JSON report saved: {}", path.display());
        Ok(path.clone())
    }

    fn write_artifact(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let fail = |e: std::io::Error| {
            ReportError::ReportGenerationFailed(format!("{}: {}", path.display(), e))
        };
        fs::create_dir_all(&self.output_dir).map_err(fail)?;
        let mut file = File::create(path).map_err(fail)?;
        file.write_all(contents).map_err(fail)?;
        debug!("Wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }
}

// ============================================================================
// Rendering
// ============================================================================

#[derive(Template)]
#[template(path = "report.html")]
struct ReportPage<'a> {
    report: &'a IncidentReport,
    charts: Vec<String>,
    statistics: Vec<StatisticsRow<'a>>,
}

/// One statistics table row with blanks for fields that do not apply.
struct StatisticsRow<'a> {
    column: &'a str,
    dtype: &'a str,
    count: usize,
    unique: String,
    min: &'a str,
    max: &'a str,
    mean: &'a str,
    std: &'a str,
}

impl<'a> From<&'a ColumnStatistics> for StatisticsRow<'a> {
    fn from(s: &'a ColumnStatistics) -> Self {
        Self {
            column: &s.column,
            dtype: &s.dtype,
            count: s.count,
            unique: s.unique.map(|u| u.to_string()).unwrap_or_default(),
            min: s.min.as_deref().unwrap_or(""),
            max: s.max.as_deref().unwrap_or(""),
            mean: s.mean.as_deref().unwrap_or(""),
            std: s.std.as_deref().unwrap_or(""),
        }
    }
}

fn write_text(out: &mut String, report: &IncidentReport) -> fmt::Result {
    use std::fmt::Write as _;

    let rule = "=".repeat(80);
    writeln!(out, "{}", rule)?;
    writeln!(out, "NYPD SHOOTING INCIDENT REPORT")?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "Source: {}", report.source)?;
    writeln!(
        out,
        "Rows: {} loaded, {} duplicates removed, {} normalized, {} excluded",
        report.run.rows_loaded,
        report.run.duplicates_removed,
        report.run.rows_normalized,
        report.run.rows_rejected
    )?;
    writeln!(out, "Time: {}ms", report.run.duration_ms)?;

    writeln!(out, "\nSUMMARY STATISTICS")?;
    writeln!(
        out,
        "{:<14} {:<8} {:>8} {:>8} {:>12} {:>12} {:>12}",
        "column", "type", "count", "unique", "min", "max", "mean"
    )?;
    for s in &report.column_statistics {
        writeln!(
            out,
            "{:<14} {:<8} {:>8} {:>8} {:>12} {:>12} {:>12}",
            s.column,
            s.dtype,
            s.count,
            s.unique.map(|u| u.to_string()).unwrap_or_else(|| "-".into()),
            s.min.as_deref().unwrap_or("-"),
            s.max.as_deref().unwrap_or("-"),
            s.mean.as_deref().unwrap_or("-")
        )?;
    }

    writeln!(out, "\nMISSING VALUES")?;
    for c in &report.missing_values.columns {
        writeln!(
            out,
            "  {:<14} missing: {:>6}  unparsable: {:>6}  ({:.2}%)",
            c.column, c.missing, c.unparsable, c.percentage
        )?;
    }

    writeln!(out, "\nCONCLUSIONS")?;
    for c in &report.conclusions {
        writeln!(out, "  - {}", c.text)?;
    }
    writeln!(out, "{}", rule)
}
