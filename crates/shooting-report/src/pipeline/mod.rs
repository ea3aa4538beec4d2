//! Pipeline module.
//!
//! Runs Loader, Cleaner, Normalizer, Bucketizer and Reporter in order.

mod builder;
pub mod progress;

pub use builder::{ReportOutcome, ReportPipeline, ReportPipelineBuilder};
pub use progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate, ReportStage};
