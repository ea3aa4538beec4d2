//! CLI entry point for the shooting incident report.

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenv::dotenv;
use serde_json::json;
use shooting_report::config::{DEFAULT_SOURCE_URL, SOURCE_URL_ENV};
use shooting_report::{
    DataSource, IncidentReport, ParsePolicy, ReportConfig, ReportGenerator, ReportOutcome,
    ReportPipeline,
};
use std::env;
use std::path::PathBuf;
use tracing::{debug, error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "NYPD shooting incident report",
    long_about = "Downloads the NYPD shooting incident dataset and reports when incidents \
                  happen by year, month, day of week and hour of day.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  SHOOTING_REPORT_URL   Source CSV URL (overridden by --url)\n\n\
                  EXAMPLES:\n  \
                  # Download the published dataset and write output/shooting_report.html\n  \
                  shooting-report\n\n  \
                  # Use a local copy and fail on any unparsable row\n  \
                  shooting-report --input rows.csv --strict\n\n  \
                  # Print the report as JSON\n  \
                  shooting-report --json | jq .conclusions"
)]
struct Args {
    /// URL of the incident CSV
    #[arg(long, conflicts_with = "input")]
    url: Option<String>,

    /// Read the incident CSV from a local file instead of downloading it
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output directory for the report
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Report file name (without extension)
    #[arg(long, default_value = "shooting_report")]
    output_name: String,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "60")]
    timeout_secs: u64,

    /// Fail the run if any row has an unparsable date or time
    ///
    /// By default such rows are excluded from every summary and counted in the report.
    #[arg(long)]
    strict: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of the human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Also write the report as JSON to the output directory
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// `--url`, then the environment, then the published dataset.
fn resolve_source_url(flag: Option<&str>) -> String {
    flag.map(str::to_string)
        .or_else(|| env::var(SOURCE_URL_ENV).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    let source_url = resolve_source_url(args.url.as_deref());
    debug!("Source URL: {}", source_url);

    let config = ReportConfig::builder()
        .source_url(&source_url)
        .timeout_secs(args.timeout_secs)
        .parse_policy(if args.strict {
            ParsePolicy::Abort
        } else {
            ParsePolicy::Exclude
        })
        .output_dir(&args.output)
        .output_name(&args.output_name)
        .write_json(args.emit_report)
        .build()?;

    let quiet = args.quiet || args.json;
    let pipeline = ReportPipeline::builder()
        .config(config)
        .on_progress(move |update| {
            if !quiet && !update.is_terminal() && update.stage_progress >= 1.0 {
                info!("[{:>3.0}%] {}", update.progress * 100.0, update.message);
            }
        })
        .build()?;

    let source = match &args.input {
        Some(path) => DataSource::File(path.clone()),
        None => DataSource::Url(source_url),
    };

    match pipeline.run_with_source(source) {
        Ok(outcome) => handle_output(&outcome, &args),
        Err(e) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&json!({ "error": e }))?);
            } else {
                error!("{}", e);
            }
            Err(anyhow!("{}", e))
        }
    }
}

/// Print the report.
///
/// - Default: human-readable summary to stdout
/// - `--json`: the full report as JSON on stdout
fn handle_output(outcome: &ReportOutcome, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.report)?);
        return Ok(());
    }

    print_human_readable_summary(&outcome.report);
    for path in &outcome.artifacts {
        println!("Report written to: {}", path.display());
    }
    Ok(())
}

/// Print the console rendering of the report.
///
/// This uses `println!` rather than logging so it shows regardless of log level.
fn print_human_readable_summary(report: &IncidentReport) {
    println!();
    print!("{}", ReportGenerator::render_text(report));
}
