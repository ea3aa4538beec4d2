//! Configuration types for the report pipeline.
//!
//! This module provides configuration options using the builder pattern.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// NYPD Shooting Incident Data (Historic), served as CSV by NYC Open Data.
pub const DEFAULT_SOURCE_URL: &str =
    "https://data.cityofnewyork.us/api/views/833y-fsy8/rows.csv?accessType=DOWNLOAD";

/// Environment variable that overrides the source URL.
pub const SOURCE_URL_ENV: &str = "SHOOTING_REPORT_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_OUTPUT_NAME: &str = "shooting_report";
const DEFAULT_CHART_WIDTH: u32 = 760;
const DEFAULT_CHART_HEIGHT: u32 = 360;

/// What to do with rows whose date or time cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParsePolicy {
    /// Drop the rows from every summary and report how many were dropped
    #[default]
    Exclude,
    /// Fail the whole run on the first batch of unparsable rows
    Abort,
}

/// Configuration for the report pipeline.
///
/// Use [`ReportConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use shooting_report::config::{ReportConfig, ParsePolicy};
///
/// let config = ReportConfig::builder()
///     .timeout_secs(30)
///     .parse_policy(ParsePolicy::Abort)
///     .output_dir("reports")
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// URL of the CSV resource.
    /// Default: [`DEFAULT_SOURCE_URL`]
    pub source_url: String,

    /// Timeout for the HTTP fetch, in seconds.
    /// Default: 60
    pub timeout_secs: u64,

    /// Policy for rows with unparsable dates or times.
    /// Default: Exclude
    pub parse_policy: ParsePolicy,

    /// Directory that receives the report artifacts.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// File stem of the report artifacts.
    /// Default: "shooting_report"
    pub output_name: String,

    /// Whether to write a JSON copy of the report next to the HTML.
    /// Default: false
    pub write_json: bool,

    /// Whether to write artifacts at all. When false the report is kept in memory.
    /// Default: true
    pub save_to_disk: bool,

    /// Width of each rendered chart, in pixels.
    /// Default: 760
    pub chart_width: u32,

    /// Height of each rendered chart, in pixels.
    /// Default: 360
    pub chart_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            parse_policy: ParsePolicy::default(),
            output_dir: PathBuf::from("output"),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            write_json: false,
            save_to_disk: true,
            chart_width: DEFAULT_CHART_WIDTH,
            chart_height: DEFAULT_CHART_HEIGHT,
        }
    }
}

impl ReportConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder::default()
    }

    /// Path of the HTML report document.
    pub fn html_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.html", self.output_name))
    }

    /// Path of the JSON report.
    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.output_name))
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let url = self.source_url.trim();
        if url.is_empty() {
            return Err(ConfigValidationError::EmptySourceUrl);
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigValidationError::UnsupportedScheme(url.to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigValidationError::ZeroTimeout);
        }

        if self.output_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyOutputName);
        }

        if self.chart_width == 0 || self.chart_height == 0 {
            return Err(ConfigValidationError::InvalidChartSize {
                width: self.chart_width,
                height: self.chart_height,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Source URL must not be empty")]
    EmptySourceUrl,

    #[error("Source URL must use http or https: {0}")]
    UnsupportedScheme(String),

    #[error("Fetch timeout must be at least 1 second")]
    ZeroTimeout,

    #[error("Output name must not be empty")]
    EmptyOutputName,

    #[error("Invalid chart size {width}x{height} (both dimensions must be positive)")]
    InvalidChartSize { width: u32, height: u32 },
}

impl From<ConfigValidationError> for crate::error::ReportError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::ReportError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug, Default)]
pub struct ReportConfigBuilder {
    source_url: Option<String>,
    timeout_secs: Option<u64>,
    parse_policy: Option<ParsePolicy>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    write_json: Option<bool>,
    save_to_disk: Option<bool>,
    chart_width: Option<u32>,
    chart_height: Option<u32>,
}

impl ReportConfigBuilder {
    /// Set the source URL.
    pub fn source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Set the fetch timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Set the policy for unparsable rows.
    pub fn parse_policy(mut self, policy: ParsePolicy) -> Self {
        self.parse_policy = Some(policy);
        self
    }

    /// Set the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Set the artifact file stem.
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    /// Write a JSON report alongside the HTML document.
    pub fn write_json(mut self, enabled: bool) -> Self {
        self.write_json = Some(enabled);
        self
    }

    /// Write artifacts to disk.
    pub fn save_to_disk(mut self, enabled: bool) -> Self {
        self.save_to_disk = Some(enabled);
        self
    }

    /// Set the chart dimensions in pixels.
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_width = Some(width);
        self.chart_height = Some(height);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ReportConfig, ConfigValidationError> {
        let defaults = ReportConfig::default();
        let config = ReportConfig {
            source_url: self.source_url.unwrap_or(defaults.source_url),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            parse_policy: self.parse_policy.unwrap_or(defaults.parse_policy),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name.unwrap_or(defaults.output_name),
            write_json: self.write_json.unwrap_or(defaults.write_json),
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
            chart_width: self.chart_width.unwrap_or(defaults.chart_width),
            chart_height: self.chart_height.unwrap_or(defaults.chart_height),
        };

        config.validate()?;
        Ok(config)
    }
}
