//! Timestamp normalization for the projected incident table.
//!
//! `OCCUR_DATE` is published as `MM/DD/YYYY` and `OCCUR_TIME` as `HH:MM:SS`
//! (older extracts use `HH:MM`). Both are parsed into chrono values; times are
//! truncated to the minute. All values are local civil time of the source
//! jurisdiction: no time zone or DST adjustment is applied.
//!
//! Every row produces an explicit per-row result. Failed rows are collected as
//! [`RowParseError`]s and handled once, according to [`ParsePolicy`].

use crate::cleaner::{DataCleaner, INCIDENT_KEY, OCCUR_DATE, OCCUR_TIME};
use crate::config::ParsePolicy;
use crate::error::{ReportError, Result, ResultExt};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

const DATE_FORMAT: &str = "%m/%d/%Y";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// One incident with typed timestamp fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub incident_key: Option<String>,
    pub occur_date: NaiveDate,
    pub occur_time: NaiveTime,
}

impl IncidentRecord {
    pub fn year(&self) -> i32 {
        self.occur_date.year()
    }

    /// Calendar month, 1-12.
    pub fn month(&self) -> u32 {
        self.occur_date.month()
    }

    pub fn weekday(&self) -> Weekday {
        self.occur_date.weekday()
    }

    /// Hour of day, 0-23.
    pub fn hour(&self) -> u32 {
        self.occur_time.hour()
    }
}

/// Source column a parse failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    IncidentKey,
    OccurDate,
    OccurTime,
}

impl RecordField {
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::IncidentKey => INCIDENT_KEY,
            Self::OccurDate => OCCUR_DATE,
            Self::OccurTime => OCCUR_TIME,
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Why a field could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailure {
    /// Null or blank
    Missing,
    /// Present but not in the expected format, or out of range
    Malformed,
}

/// A row whose date or time could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowParseError {
    /// Zero-based row index in the cleaned table
    pub row: usize,
    pub incident_key: Option<String>,
    pub field: RecordField,
    pub value: Option<String>,
    pub reason: ParseFailure,
}

impl fmt::Display for RowParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.row)?;
        if let Some(key) = &self.incident_key {
            write!(f, " (incident {})", key)?;
        }
        match (self.reason, &self.value) {
            (ParseFailure::Malformed, Some(value)) => {
                write!(f, ": {} value '{}' is malformed", self.field, value)
            }
            _ => write!(f, ": {} is missing", self.field),
        }
    }
}

impl std::error::Error for RowParseError {}

/// Output of the normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedTable {
    /// Rows whose date and time both parsed, in input order.
    pub records: Vec<IncidentRecord>,
    /// One entry per failed field; a row may appear twice.
    pub rejected: Vec<RowParseError>,
    /// Rows seen by the normalizer.
    pub rows_in: usize,
    /// Rows with no incident key. These are kept.
    pub missing_keys: usize,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct rows excluded because of parse failures.
    pub fn rejected_rows(&self) -> usize {
        self.rejected
            .iter()
            .map(|e| e.row)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Count failures for `field` with the given `reason`.
    pub fn failures(&self, field: RecordField, reason: ParseFailure) -> usize {
        self.rejected
            .iter()
            .filter(|e| e.field == field && e.reason == reason)
            .count()
    }
}

/// Parse an `OCCUR_DATE` value.
///
/// Only the zero-padded `MM/DD/YYYY` shape is accepted. chrono alone would read
/// `01/15/19` as the year 19.
pub fn parse_occur_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let widths: Vec<usize> = text.split('/').map(str::len).collect();
    if widths != [2, 2, 4] || !text.chars().all(|c| c.is_ascii_digit() || c == '/') {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

/// Parse an `OCCUR_TIME` value, truncated to the minute.
pub fn parse_occur_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        .and_then(|t| NaiveTime::from_hms_opt(t.hour(), t.minute(), 0))
}

/// Normalize one row.
///
/// Both timestamp fields are checked so a row with two bad fields reports both.
pub fn normalize_row(
    row: usize,
    incident_key: Option<&str>,
    date: Option<&str>,
    time: Option<&str>,
) -> std::result::Result<IncidentRecord, Vec<RowParseError>> {
    let key = incident_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string);

    let parsed_date = date.and_then(parse_occur_date);
    let parsed_time = time.and_then(parse_occur_time);

    match (parsed_date, parsed_time) {
        (Some(occur_date), Some(occur_time)) => Ok(IncidentRecord {
            incident_key: key,
            occur_date,
            occur_time,
        }),
        (date_ok, time_ok) => {
            let failure = |field: RecordField, value: Option<&str>| {
                let present = value.filter(|v| !v.trim().is_empty());
                RowParseError {
                    row,
                    incident_key: key.clone(),
                    field,
                    value: present.map(str::to_string),
                    reason: if present.is_some() {
                        ParseFailure::Malformed
                    } else {
                        ParseFailure::Missing
                    },
                }
            };

            let mut errors = Vec::with_capacity(2);
            if date_ok.is_none() {
                errors.push(failure(RecordField::OccurDate, date));
            }
            if time_ok.is_none() {
                errors.push(failure(RecordField::OccurTime, time));
            }
            Err(errors)
        }
    }
}

/// Parses the projected table into typed records.
pub struct Normalizer {
    policy: ParsePolicy,
}

impl Normalizer {
    pub fn new(policy: ParsePolicy) -> Self {
        Self { policy }
    }

    /// Parse every row of the projected table.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Schema`] if a retained column is absent, and
    /// [`ReportError::Parse`] if any row fails under [`ParsePolicy::Abort`].
    pub fn normalize(&self, df: &DataFrame) -> Result<NormalizedTable> {
        info!("Normalizing {} rows...", df.height());
        DataCleaner::check_schema(df)?;

        let keys = text_column(df, INCIDENT_KEY)?;
        let dates = text_column(df, OCCUR_DATE)?;
        let times = text_column(df, OCCUR_TIME)?;

        let mut table = NormalizedTable {
            records: Vec::with_capacity(df.height()),
            rows_in: df.height(),
            ..Default::default()
        };

        for (row, ((key, date), time)) in keys.iter().zip(&dates).zip(&times).enumerate() {
            let key = key.as_deref();
            if key.is_none_or(|k| k.trim().is_empty()) {
                table.missing_keys += 1;
            }
            match normalize_row(row, key, date.as_deref(), time.as_deref()) {
                Ok(record) => table.records.push(record),
                Err(mut errors) => {
                    for e in &errors {
                        debug!("Rejected {}", e);
                    }
                    table.rejected.append(&mut errors);
                }
            }
        }

        let rejected_rows = table.rejected_rows();
        if rejected_rows > 0 {
            warn!(
                "{} of {} rows have an unparsable date or time",
                rejected_rows, table.rows_in
            );
            if self.policy == ParsePolicy::Abort {
                let first = table.rejected.swap_remove(0);
                return Err(ReportError::Parse {
                    rejected: rejected_rows,
                    first: Box::new(first),
                });
            }
            info!("Excluding {} rows from all summaries", rejected_rows);
        }

        Ok(table)
    }
}

/// Read a column as optional strings, casting non-text columns to text.
fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)
        .context(format!("Reading column {}", name))?
        .as_materialized_series()
        .cast(&DataType::String)
        .context(format!("Casting column {} to text", name))?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}
