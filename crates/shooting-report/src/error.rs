//! Custom error types for the shooting incident report pipeline.
//!
//! This module provides the error hierarchy using `thiserror` for the five
//! pipeline stages. Fetch and schema errors abort the run; per-row parse
//! failures are collected by the normalizer and only become a
//! [`ReportError::Parse`] when the configured policy says so.
//!
//! Errors are serializable so they can be emitted as part of `--json` output.

use crate::normalizer::RowParseError;
use crate::pipeline::ReportStage;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the report pipeline.
#[derive(Error, Debug)]
pub enum ReportError {
    /// The source could not be fetched or did not contain tabular text.
    #[error("Failed to fetch incident data: {0}")]
    Fetch(String),

    /// One or more expected columns are absent from the source table.
    #[error("Missing expected column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Rows could not be parsed and the run is configured to abort on them.
    #[error("{rejected} row(s) could not be parsed; first failure: {first}")]
    Parse {
        rejected: usize,
        first: Box<RowParseError>,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error.
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// An error raised inside a named pipeline stage.
    #[error("{} failed: {source}", .stage.display_name())]
    StageFailed {
        stage: ReportStage,
        #[source]
        source: Box<ReportError>,
    },

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ReportError>,
    },
}

impl ReportError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ReportError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Tag the error with the stage that raised it.
    ///
    /// Tagging an already tagged error keeps the innermost stage.
    pub fn in_stage(self, stage: ReportStage) -> Self {
        match self {
            tagged @ ReportError::StageFailed { .. } => tagged,
            other => ReportError::StageFailed {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The stage that raised this error, if it was tagged.
    pub fn stage(&self) -> Option<ReportStage> {
        match self {
            Self::StageFailed { stage, .. } => Some(*stage),
            Self::WithContext { source, .. } => source.stage(),
            _ => None,
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "FETCH_ERROR",
            Self::Schema { .. } => "SCHEMA_ERROR",
            Self::Parse { .. } => "PARSE_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Http(_) => "HTTP_REQUEST_ERROR",
            Self::StageFailed { source, .. } => source.error_code(),
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether this error came from fetching the source (including HTTP failures).
    pub fn is_fetch_error(&self) -> bool {
        match self {
            Self::Fetch(_) | Self::Http(_) => true,
            Self::StageFailed { source, .. } | Self::WithContext { source, .. } => {
                source.is_fetch_error()
            }
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code`, `stage` and `message` fields.
impl Serialize for ReportError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ReportError", 3)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("stage", &self.stage())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ReportError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ReportError::Io(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{ParseFailure, RecordField};

    #[test]
    fn test_error_code() {
        assert_eq!(ReportError::Fetch("down".to_string()).error_code(), "FETCH_ERROR");
        assert_eq!(
            ReportError::Schema {
                missing: vec!["OCCUR_TIME".to_string()]
            }
            .error_code(),
            "SCHEMA_ERROR"
        );
    }

    #[test]
    fn test_schema_message_lists_columns() {
        let error = ReportError::Schema {
            missing: vec!["OCCUR_DATE".to_string(), "OCCUR_TIME".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Missing expected column(s): OCCUR_DATE, OCCUR_TIME"
        );
    }

    #[test]
    fn test_stage_tagging_names_stage() {
        let error = ReportError::Fetch("connection refused".to_string()).in_stage(ReportStage::Loading);
        assert_eq!(error.stage(), Some(ReportStage::Loading));
        assert!(error.to_string().starts_with("Loading Data failed:"));
        assert!(error.to_string().contains("connection refused"));
        assert_eq!(error.error_code(), "FETCH_ERROR");
        assert!(error.is_fetch_error());
    }

    #[test]
    fn test_stage_tagging_keeps_innermost_stage() {
        let error = ReportError::InvalidConfig("bad".to_string())
            .in_stage(ReportStage::Cleaning)
            .in_stage(ReportStage::Reporting);
        assert_eq!(error.stage(), Some(ReportStage::Cleaning));
    }

    #[test]
    fn test_parse_error_message() {
        let first = RowParseError {
            row: 3,
            incident_key: Some("42".to_string()),
            field: RecordField::OccurTime,
            value: Some("25:99".to_string()),
            reason: ParseFailure::Malformed,
        };
        let error = ReportError::Parse {
            rejected: 2,
            first: Box::new(first),
        };
        let message = error.to_string();
        assert!(message.starts_with("2 row(s) could not be parsed"));
        assert!(message.contains("25:99"));
        assert_eq!(error.error_code(), "PARSE_ERROR");
    }

    #[test]
    fn test_error_serialization() {
        let error = ReportError::Schema {
            missing: vec!["INCIDENT_KEY".to_string()],
        }
        .in_stage(ReportStage::Cleaning);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("SCHEMA_ERROR"));
        assert!(json.contains("cleaning"));
        assert!(json.contains("INCIDENT_KEY"));
    }

    #[test]
    fn test_with_context() {
        let error = ReportError::ReportGenerationFailed("disk full".to_string())
            .with_context("Writing HTML");
        assert!(error.to_string().contains("Writing HTML"));
        assert_eq!(error.error_code(), "REPORT_GENERATION_FAILED");
    }
}
