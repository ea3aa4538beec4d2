//! Integration tests for the shooting incident report pipeline.
//!
//! These tests drive the whole pipeline from fixture CSV files.

use pretty_assertions::assert_eq;
use shooting_report::{
    Bucketizer, DataCleaner, DataLoader, DataSource, Normalizer, ParsePolicy, ReportConfig,
    ReportError, ReportOutcome, ReportPipeline, ReportStage,
};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn fixture(filename: &str) -> DataSource {
    DataSource::File(fixtures_path().join(filename))
}

fn in_memory_pipeline(policy: ParsePolicy) -> ReportPipeline {
    ReportPipeline::builder()
        .config(
            ReportConfig::builder()
                .parse_policy(policy)
                .save_to_disk(false)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap()
}

fn run_fixture(filename: &str) -> ReportOutcome {
    in_memory_pipeline(ParsePolicy::Exclude)
        .run_with_source(fixture(filename))
        .expect("pipeline should succeed")
}

// ============================================================================
// Full Pipeline Tests
// ============================================================================

#[test]
fn test_sample_run_accounting() {
    let report = run_fixture("incidents_sample.csv").report;

    // One exact duplicate, plus one row that only differs in VIC_AGE_GROUP.
    assert_eq!(report.run.rows_loaded, 10);
    assert_eq!(report.run.duplicates_removed, 2);
    assert_eq!(report.run.rows_normalized, 8);
    assert_eq!(report.run.rows_rejected, 0);
    assert_eq!(
        report.run.columns_dropped,
        vec!["BORO", "PRECINCT", "STATISTICAL_MURDER_FLAG", "VIC_AGE_GROUP"]
    );
    assert!(report.missing_values.is_clean());
}

#[test]
fn test_sample_summaries() {
    let summaries = run_fixture("incidents_sample.csv").report.summaries;

    assert_eq!(summaries.yearly.labels(), vec!["2018", "2019", "2020", "2021"]);
    let yearly: Vec<usize> = summaries.yearly.buckets.iter().map(|b| b.count).collect();
    assert_eq!(yearly, vec![1, 3, 3, 1]);

    assert_eq!(summaries.monthly.count("May"), Some(1));
    assert_eq!(summaries.monthly.count("Jul"), Some(2));
    assert_eq!(summaries.monthly.count("Feb"), Some(0));

    assert_eq!(summaries.weekday.count("Thu"), Some(2));
    assert_eq!(summaries.weekday.count("Sun"), Some(2));
    assert_eq!(summaries.weekday.count("Wed"), Some(0));

    assert_eq!(summaries.hourly.count("21"), Some(1));
    assert_eq!(summaries.hourly.count("23"), Some(2));
    assert_eq!(summaries.hourly.count("12"), Some(0));
}

#[test]
fn test_every_summary_partitions_normalized_rows() {
    let report = run_fixture("incidents_sample.csv").report;
    for table in report.summaries.tables() {
        assert_eq!(
            table.total(),
            report.run.rows_normalized,
            "{:?}",
            table.dimension
        );
    }
    assert_eq!(report.summaries.monthly.len(), 12);
    assert_eq!(report.summaries.weekday.len(), 7);
    assert_eq!(report.summaries.hourly.len(), 24);
}

#[test]
fn test_two_incident_scenario() {
    let summaries = run_fixture("two_incidents.csv").report.summaries;

    assert_eq!(summaries.yearly.count("2019"), Some(1));
    assert_eq!(summaries.yearly.count("2020"), Some(1));
    assert_eq!(summaries.monthly.count("Jan"), Some(1));
    assert_eq!(summaries.monthly.count("Jul"), Some(1));
    assert_eq!(summaries.weekday.count("Tue"), Some(1));
    assert_eq!(summaries.weekday.count("Sat"), Some(1));
    assert_eq!(summaries.hourly.count("23"), Some(1));
    assert_eq!(summaries.hourly.count("8"), Some(1));
}

#[test]
fn test_appending_duplicate_changes_nothing() {
    let base = fs::read_to_string(fixtures_path().join("two_incidents.csv")).unwrap();
    let with_duplicate = format!("{}1,01/15/2019,23:45\n", base);

    let pipeline = in_memory_pipeline(ParsePolicy::Exclude);
    let original = pipeline
        .run_with_source(DataSource::Bytes(base.into_bytes()))
        .unwrap()
        .report;
    let duplicated = pipeline
        .run_with_source(DataSource::Bytes(with_duplicate.into_bytes()))
        .unwrap()
        .report;

    assert_eq!(duplicated.run.duplicates_removed, 1);
    assert_eq!(original.summaries, duplicated.summaries);
}

#[test]
fn test_stages_compose_directly() {
    let raw = DataLoader::new(Duration::from_secs(5))
        .unwrap()
        .load(&fixture("incidents_sample.csv"))
        .unwrap();
    let (projected, cleaning) = DataCleaner.clean(raw).unwrap();
    assert_eq!(projected.width(), 3);
    assert_eq!(cleaning.rows_after, 8);

    let (again, recleaning) = DataCleaner.clean(projected.clone()).unwrap();
    assert!(again.equals_missing(&projected));
    assert_eq!(recleaning.duplicates_removed, 0);

    let table = Normalizer::new(ParsePolicy::Abort).normalize(&projected).unwrap();
    let summaries = Bucketizer.bucketize(&table);
    assert_eq!(summaries.hourly.total(), 8);
}

// ============================================================================
// Malformed Data Tests
// ============================================================================

#[test]
fn test_malformed_rows_are_excluded() {
    let report = run_fixture("incidents_malformed.csv").report;

    assert_eq!(report.run.rows_normalized, 2);
    assert_eq!(report.run.rows_rejected, 2);
    assert_eq!(report.rejected_sample.len(), 2);
    for table in report.summaries.tables() {
        assert_eq!(table.total(), 2);
    }

    let time = report.missing_values.column("OCCUR_TIME").unwrap();
    assert_eq!(time.unparsable, 1);
    let date = report.missing_values.column("OCCUR_DATE").unwrap();
    assert_eq!(date.missing, 1);
    let key = report.missing_values.column("INCIDENT_KEY").unwrap();
    assert_eq!(key.missing, 1);
}

#[test]
fn test_strict_policy_fails_the_run() {
    let err = in_memory_pipeline(ParsePolicy::Abort)
        .run_with_source(fixture("incidents_malformed.csv"))
        .unwrap_err();

    assert_eq!(err.stage(), Some(ReportStage::Normalizing));
    assert_eq!(err.error_code(), "PARSE_ERROR");
    assert!(err.to_string().starts_with("Normalizing Timestamps failed:"));
}

#[test]
fn test_missing_column_is_schema_error() {
    let err = in_memory_pipeline(ParsePolicy::Exclude)
        .run_with_source(fixture("missing_time_column.csv"))
        .unwrap_err();

    assert_eq!(err.stage(), Some(ReportStage::Cleaning));
    match err {
        ReportError::StageFailed { source, .. } => match *source {
            ReportError::Schema { missing } => assert_eq!(missing, vec!["OCCUR_TIME"]),
            other => panic!("expected schema error, got {other:?}"),
        },
        other => panic!("expected stage error, got {other:?}"),
    }
}

#[test]
fn test_missing_file_fails_in_loading() {
    let err = in_memory_pipeline(ParsePolicy::Exclude)
        .run_with_source(fixture("does_not_exist.csv"))
        .unwrap_err();
    assert_eq!(err.stage(), Some(ReportStage::Loading));
    assert!(err.is_fetch_error());
}

#[test]
fn test_header_only_csv_reports_no_data() {
    let csv = b"INCIDENT_KEY,OCCUR_DATE,OCCUR_TIME\n".to_vec();
    let report = in_memory_pipeline(ParsePolicy::Exclude)
        .run_with_source(DataSource::Bytes(csv))
        .unwrap()
        .report;

    assert_eq!(report.run.rows_normalized, 0);
    assert!(report.summaries.yearly.is_empty());
    assert_eq!(report.conclusions.len(), 1);
}

// ============================================================================
// Artifact Tests
// ============================================================================

#[test]
fn test_writes_html_and_json_artifacts() {
    let temp = tempdir().unwrap();
    let dir = temp.path().join("report");
    let pipeline = ReportPipeline::builder()
        .config(
            ReportConfig::builder()
                .output_dir(&dir)
                .output_name("nypd")
                .write_json(true)
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();

    let outcome = pipeline
        .run_with_source(fixture("incidents_sample.csv"))
        .unwrap();

    assert_eq!(
        outcome.artifacts,
        vec![dir.join("nypd.html"), dir.join("nypd.json")]
    );

    let html = fs::read_to_string(dir.join("nypd.html")).unwrap();
    assert_eq!(html.matches("<svg").count(), 4);
    for hour in 0..24 {
        assert!(html.contains(&format!(">{}</text>", hour)));
    }

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("nypd.json")).unwrap()).unwrap();
    assert_eq!(json["run"]["rows_normalized"], 8);
    assert_eq!(json["summaries"]["weekday"]["buckets"][0]["label"], "Sun");

}
