//! Progress reporting for the report pipeline.
//!
//! The pipeline is strictly sequential, so progress is a single stage plus a
//! fraction of that stage. Reporters receive [`ProgressUpdate`]s and decide
//! how to surface them (the CLI logs them through `tracing`).
//!
//! # Example
//!
//! ```rust,ignore
//! use shooting_report::{ReportPipeline, ReportConfig};
//!
//! let outcome = ReportPipeline::builder()
//!     .config(ReportConfig::default())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the report pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStage {
    /// Fetching the CSV resource into a table
    Loading,
    /// Removing duplicate rows and projecting columns
    Cleaning,
    /// Parsing date and time text into typed values
    Normalizing,
    /// Deriving calendar buckets and counting
    Bucketizing,
    /// Rendering charts, statistics and the report document
    Reporting,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl ReportStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Cleaning => "Cleaning Data",
            Self::Normalizing => "Normalizing Timestamps",
            Self::Bucketizing => "Bucketizing Incidents",
            Self::Reporting => "Generating Report",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    ///
    /// The network fetch dominates a real run.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.60,
            Self::Cleaning => 0.10,
            Self::Normalizing => 0.10,
            Self::Bucketizing => 0.05,
            Self::Reporting => 0.15,
            Self::Complete => 0.0,
            Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Cleaning => 0.60,
            Self::Normalizing => 0.70,
            Self::Bucketizing => 0.80,
            Self::Reporting => 0.85,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// Progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: ReportStage,

    /// Overall pipeline progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within the current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable status message
    pub message: String,
}

impl ProgressUpdate {
    /// Create an update for `stage` with `stage_progress` of that stage done.
    pub fn new(stage: ReportStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let stage_progress = stage_progress.clamp(0.0, 1.0);
        Self {
            stage,
            progress: stage.base_progress() + stage.weight() * stage_progress,
            stage_progress,
            message: message.into(),
        }
    }

    /// Terminal update for a successful run.
    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: ReportStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    /// Terminal update for a failed run.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: ReportStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.stage, ReportStage::Complete | ReportStage::Failed)
    }
}

/// Receives progress updates from the pipeline.
pub trait ProgressReporter {
    fn report(&self, update: ProgressUpdate);
}

/// Progress reporter backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate),
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate),
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate),
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}
