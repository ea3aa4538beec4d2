//! Report generation.
//!
//! The reporter turns the normalized table and bucket summaries into an
//! [`IncidentReport`]: column statistics, a missing-value audit, four SVG
//! charts and narrative conclusions. The report can be rendered as a
//! self-contained HTML document, a JSON file, or plain text for the console.
//!
//! # Example
//!
//! ```rust,ignore
//! use shooting_report::reporting::{ReportGenerator, ReportParams};
//!
//! let report = ReportGenerator::build_report(ReportParams {
//!     source: "rows.csv",
//!     cleaning: &cleaning,
//!     table: &table,
//!     summaries: &summaries,
//!     parse_policy: ParsePolicy::Exclude,
//!     duration_ms: 0,
//! });
//!
//! println!("{}", ReportGenerator::render_text(&report));
//! ReportGenerator::new(&config).write_html(&report)?;
//! ```

pub mod charts;
mod generator;
pub mod missing;
pub mod narrative;
pub mod statistics;

pub use charts::{Chart, ChartKind};
pub use generator::{IncidentReport, REJECTED_SAMPLE_SIZE, ReportGenerator, ReportParams, RunSummary};
pub use missing::{ColumnAudit, MissingValueAudit};
pub use narrative::Conclusion;
pub use statistics::ColumnStatistics;
