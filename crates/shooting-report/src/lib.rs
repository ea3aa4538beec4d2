//! NYPD Shooting Incident Report Library
//!
//! Downloads the NYPD shooting incident dataset and turns it into a
//! descriptive report: when incidents happen by year, month, day of week and
//! hour of day, plus column statistics, a missing-value audit and short
//! narrative conclusions.
//!
//! # Overview
//!
//! The pipeline runs five stages in order:
//!
//! - **Loader**: fetches the CSV (or reads a local file) into a polars `DataFrame`
//! - **Cleaner**: removes exact duplicate rows and keeps `INCIDENT_KEY`,
//!   `OCCUR_DATE` and `OCCUR_TIME`
//! - **Normalizer**: parses dates and times into typed values, collecting a
//!   [`RowParseError`] for every row that fails
//! - **Bucketizer**: derives year, month, weekday and hour and counts incidents per bucket
//! - **Reporter**: renders charts, statistics and conclusions as HTML, JSON or text
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use shooting_report::{ParsePolicy, ReportConfig, ReportPipeline};
//!
//! let config = ReportConfig::builder()
//!     .output_dir("reports")
//!     .parse_policy(ParsePolicy::Exclude)
//!     .write_json(true)
//!     .build()?;
//!
//! let outcome = ReportPipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//!
//! for conclusion in &outcome.report.conclusions {
//!     println!("- {}", conclusion.text);
//! }
//! ```
//!
//! # Using the stages directly
//!
//! ```rust,ignore
//! use shooting_report::{Bucketizer, DataCleaner, DataLoader, DataSource, Normalizer, ParsePolicy};
//! use std::time::Duration;
//!
//! let raw = DataLoader::new(Duration::from_secs(30))?
//!     .load(&DataSource::File("rows.csv".into()))?;
//! let (projected, _) = DataCleaner.clean(raw)?;
//! let table = Normalizer::new(ParsePolicy::Exclude).normalize(&projected)?;
//! let summaries = Bucketizer.bucketize(&table);
//! println!("{:?}", summaries.hourly.peak());
//! ```

pub mod bucketizer;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod loader;
pub mod normalizer;
pub mod pipeline;
pub mod reporting;

// Re-exports for convenient access
pub use bucketizer::{BucketCount, BucketSummaries, Bucketizer, Dimension, SummaryTable};
pub use cleaner::{CleaningSummary, DataCleaner};
pub use config::{ConfigValidationError, ParsePolicy, ReportConfig, ReportConfigBuilder};
pub use error::{ReportError, Result as ReportResult, ResultExt};
pub use loader::{DataLoader, DataSource};
pub use normalizer::{IncidentRecord, NormalizedTable, Normalizer, RowParseError};
pub use pipeline::{
    ClosureProgressReporter, ProgressReporter, ProgressUpdate, ReportOutcome, ReportPipeline,
    ReportPipelineBuilder, ReportStage,
};
pub use reporting::{IncidentReport, ReportGenerator, ReportParams};
