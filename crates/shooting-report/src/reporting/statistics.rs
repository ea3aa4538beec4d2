//! Column-wise summary statistics of the normalized table.

use crate::bucketizer::IncidentBuckets;
use crate::cleaner::{INCIDENT_KEY, OCCUR_DATE, OCCUR_TIME};
use crate::normalizer::NormalizedTable;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const YEAR_COLUMN: &str = "YEAR";
pub const HOUR_COLUMN: &str = "HOUR";

/// Summary of one column. Fields that do not apply to the column's type are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub column: String,
    pub dtype: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<String>,
}

impl ColumnStatistics {
    fn new(column: &str, dtype: &str, count: usize) -> Self {
        Self {
            column: column.to_string(),
            dtype: dtype.to_string(),
            count,
            unique: None,
            min: None,
            max: None,
            mean: None,
            std: None,
        }
    }
}

/// Describe every column of the normalized table plus the derived year and hour.
pub fn describe(table: &NormalizedTable) -> Vec<ColumnStatistics> {
    let records = &table.records;

    let keys: Vec<&str> = records
        .iter()
        .filter_map(|r| r.incident_key.as_deref())
        .collect();
    let mut key_stats = ColumnStatistics::new(INCIDENT_KEY, "text", keys.len());
    key_stats.unique = Some(keys.iter().collect::<HashSet<_>>().len());

    let dates: Vec<NaiveDate> = records.iter().map(|r| r.occur_date).collect();
    let times: Vec<NaiveTime> = records.iter().map(|r| r.occur_time).collect();
    let years: Vec<f64> = records
        .iter()
        .map(|r| IncidentBuckets::of(r).year as f64)
        .collect();
    let hours: Vec<f64> = records
        .iter()
        .map(|r| IncidentBuckets::of(r).hour as f64)
        .collect();

    vec![
        key_stats,
        date_statistics(&dates),
        time_statistics(&times),
        numeric_statistics(YEAR_COLUMN, &years),
        numeric_statistics(HOUR_COLUMN, &hours),
    ]
}

fn date_statistics(dates: &[NaiveDate]) -> ColumnStatistics {
    let mut stats = ColumnStatistics::new(OCCUR_DATE, "date", dates.len());
    stats.min = dates.iter().min().map(|d| d.to_string());
    stats.max = dates.iter().max().map(|d| d.to_string());

    let days: Vec<f64> = dates.iter().map(|d| d.num_days_from_ce() as f64).collect();
    stats.mean = mean(&days)
        .and_then(|m| NaiveDate::from_num_days_from_ce_opt(m.round() as i32))
        .map(|d| d.to_string());
    stats
}

fn time_statistics(times: &[NaiveTime]) -> ColumnStatistics {
    let mut stats = ColumnStatistics::new(OCCUR_TIME, "time", times.len());
    stats.min = times.iter().min().map(|t| t.format("%H:%M").to_string());
    stats.max = times.iter().max().map(|t| t.format("%H:%M").to_string());

    let minutes: Vec<f64> = times
        .iter()
        .map(|t| (t.hour() * 60 + t.minute()) as f64)
        .collect();
    stats.mean = mean(&minutes).and_then(|m| {
        let m = m.round() as u32;
        NaiveTime::from_hms_opt(m / 60, m % 60, 0).map(|t| t.format("%H:%M").to_string())
    });
    stats
}

fn numeric_statistics(column: &str, values: &[f64]) -> ColumnStatistics {
    let mut stats = ColumnStatistics::new(column, "integer", values.len());
    let series = float_series(column, values);
    stats.min = series.min().map(|v| format!("{}", v));
    stats.max = series.max().map(|v| format!("{}", v));
    stats.mean = series.mean().map(|m| format!("{:.2}", m));
    stats.std = sample_std(values).map(|s| format!("{:.2}", s));
    stats
}

fn float_series(name: &str, values: &[f64]) -> Float64Chunked {
    Float64Chunked::from_slice(name.into(), values)
}

/// Arithmetic mean, `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    float_series("values", values).mean()
}

/// Sample standard deviation (n - 1), `None` with fewer than two values.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    float_series("values", values).std(1)
}
