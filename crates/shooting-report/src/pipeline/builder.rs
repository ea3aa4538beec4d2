//! Main report pipeline module.
//!
//! This module provides the `ReportPipeline` struct and builder for
//! orchestrating the five report stages.

use crate::bucketizer::Bucketizer;
use crate::cleaner::DataCleaner;
use crate::config::ReportConfig;
use crate::error::Result;
use crate::loader::{DataLoader, DataSource};
use crate::normalizer::Normalizer;
use crate::pipeline::progress::{
    ClosureProgressReporter, ProgressReporter, ProgressUpdate, ReportStage,
};
use crate::reporting::{IncidentReport, ReportGenerator, ReportParams};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub report: IncidentReport,
    /// Files written, in write order. Empty when saving to disk is disabled.
    pub artifacts: Vec<PathBuf>,
}

/// The report pipeline.
///
/// Use [`ReportPipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use shooting_report::{ReportConfig, ReportPipeline};
///
/// let outcome = ReportPipeline::builder()
///     .config(ReportConfig::builder().write_json(true).build()?)
///     .on_progress(|update| println!("{}", update.message))
///     .build()?
///     .run()?;
///
/// for path in &outcome.artifacts {
///     println!("wrote {}", path.display());
/// }
/// ```
pub struct ReportPipeline {
    config: ReportConfig,
    progress_reporter: Option<Box<dyn ProgressReporter>>,
    loader: DataLoader,
    cleaner: DataCleaner,
    normalizer: Normalizer,
    bucketizer: Bucketizer,
    reporter: ReportGenerator,
}

impl ReportPipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> ReportPipelineBuilder {
        ReportPipelineBuilder::default()
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Run against the configured source URL.
    pub fn run(&self) -> Result<ReportOutcome> {
        self.run_with_source(DataSource::Url(self.config.source_url.clone()))
    }

    /// Run against an explicit source.
    ///
    /// # Errors
    ///
    /// Every error is wrapped in [`ReportError::StageFailed`](crate::ReportError::StageFailed)
    /// naming the stage that raised it.
    pub fn run_with_source(&self, source: DataSource) -> Result<ReportOutcome> {
        match self.run_internal(&source) {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete("Report completed successfully"));
                Ok(outcome)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn stage_started(&self, stage: ReportStage, message: &str) {
        self.report_progress(ProgressUpdate::new(stage, 0.0, message));
    }

    fn stage_finished(&self, stage: ReportStage, message: impl Into<String>) {
        self.report_progress(ProgressUpdate::new(stage, 1.0, message));
    }

    fn run_internal(&self, source: &DataSource) -> Result<ReportOutcome> {
        let start_time = Instant::now();
        info!("Starting shooting incident report...");

        // Step 1: Load
        self.stage_started(ReportStage::Loading, "Loading incident data...");
        info!("Step 1: Loading data from {}", source.describe());
        let raw = self
            .loader
            .load(source)
            .map_err(|e| e.in_stage(ReportStage::Loading))?;
        self.stage_finished(
            ReportStage::Loading,
            format!("Loaded {} rows", raw.height()),
        );

        // Step 2: Clean
        self.stage_started(ReportStage::Cleaning, "Removing duplicates...");
        info!("Step 2: Cleaning data...");
        let (projected, cleaning) = self
            .cleaner
            .clean(raw)
            .map_err(|e| e.in_stage(ReportStage::Cleaning))?;
        self.stage_finished(
            ReportStage::Cleaning,
            format!("{} duplicate rows removed", cleaning.duplicates_removed),
        );

        // Step 3: Normalize
        self.stage_started(ReportStage::Normalizing, "Parsing dates and times...");
        info!("Step 3: Normalizing timestamps...");
        let table = self
            .normalizer
            .normalize(&projected)
            .map_err(|e| e.in_stage(ReportStage::Normalizing))?;
        self.stage_finished(
            ReportStage::Normalizing,
            format!(
                "{} rows normalized, {} excluded",
                table.len(),
                table.rejected_rows()
            ),
        );

        // Step 4: Bucketize
        self.stage_started(ReportStage::Bucketizing, "Counting incidents per bucket...");
        info!("Step 4: Bucketizing incidents...");
        let summaries = self.bucketizer.bucketize(&table);
        self.stage_finished(ReportStage::Bucketizing, "Summaries ready");

        // Step 5: Report
        self.stage_started(ReportStage::Reporting, "Generating report...");
        info!("Step 5: Generating report...");
        let source_name = source.describe();
        let report = ReportGenerator::build_report(ReportParams {
            source: &source_name,
            cleaning: &cleaning,
            table: &table,
            summaries: &summaries,
            parse_policy: self.config.parse_policy,
            duration_ms: duration_ms(start_time.elapsed()),
        });

        let mut artifacts = Vec::new();
        if self.config.save_to_disk {
            artifacts.push(
                self.reporter
                    .write_html(&report)
                    .map_err(|e| e.in_stage(ReportStage::Reporting))?,
            );
            if self.config.write_json {
                artifacts.push(
                    self.reporter
                        .write_json(&report)
                        .map_err(|e| e.in_stage(ReportStage::Reporting))?,
                );
            }
        }
        self.stage_finished(
            ReportStage::Reporting,
            format!("{} artifact(s) written", artifacts.len()),
        );

        info!(
            "Report finished in {}ms",
            duration_ms(start_time.elapsed())
        );
        Ok(ReportOutcome { report, artifacts })
    }
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Builder for [`ReportPipeline`].
#[derive(Default)]
pub struct ReportPipelineBuilder {
    config: Option<ReportConfig>,
    progress_reporter: Option<Box<dyn ProgressReporter>>,
}

impl ReportPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: ReportConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during a run.
    pub fn progress_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + 'static,
    {
        self.progress_reporter = Some(Box::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn build(self) -> Result<ReportPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let loader = DataLoader::new(Duration::from_secs(config.timeout_secs))?;
        let reporter = ReportGenerator::new(&config);

        Ok(ReportPipeline {
            normalizer: Normalizer::new(config.parse_policy),
            config,
            progress_reporter: self.progress_reporter,
            loader,
            cleaner: DataCleaner,
            bucketizer: Bucketizer,
            reporter,
        })
    }
}
