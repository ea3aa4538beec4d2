//! Calendar bucketing and grouped counts.
//!
//! Each normalized record falls into exactly one year, month, weekday and hour
//! bucket. Month, weekday and hour use fixed ordered domains, so every label is
//! present in its summary even with a zero count. The year summary spans every
//! year from the earliest to the latest observed one.

use crate::normalizer::{IncidentRecord, NormalizedTable};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Month labels in calendar order.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Weekday labels, Sunday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub const HOURS_PER_DAY: usize = 24;

/// The four summary dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Year,
    Month,
    DayOfWeek,
    Hour,
}

impl Dimension {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Year => "Year",
            Self::Month => "Month",
            Self::DayOfWeek => "Day of Week",
            Self::Hour => "Hour of Day",
        }
    }
}

/// Bucket indices for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncidentBuckets {
    pub year: i32,
    /// 0 = Jan
    pub month: usize,
    /// 0 = Sun
    pub day_of_week: usize,
    pub hour: usize,
}

impl IncidentBuckets {
    pub fn of(record: &IncidentRecord) -> Self {
        Self {
            year: record.year(),
            month: record.month() as usize - 1,
            day_of_week: weekday_index(record.weekday()),
            hour: record.hour() as usize,
        }
    }

    pub fn month_label(&self) -> &'static str {
        MONTH_LABELS[self.month]
    }

    pub fn day_of_week_label(&self) -> &'static str {
        WEEKDAY_LABELS[self.day_of_week]
    }
}

/// Position of `day` in [`WEEKDAY_LABELS`].
pub fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_sunday() as usize
}

/// Label of an hour bucket.
pub fn hour_label(hour: usize) -> String {
    hour.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketCount {
    pub label: String,
    pub count: usize,
}

/// Counts per bucket for one dimension, in the dimension's display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTable {
    pub dimension: Dimension,
    pub buckets: Vec<BucketCount>,
}

impl SummaryTable {
    fn from_counts<L: ToString>(dimension: Dimension, counts: impl IntoIterator<Item = (L, usize)>) -> Self {
        let buckets = counts
            .into_iter()
            .map(|(label, count)| BucketCount {
                label: label.to_string(),
                count,
            })
            .collect();
        Self { dimension, buckets }
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.label.as_str()).collect()
    }

    pub fn count(&self, label: &str) -> Option<usize> {
        self.buckets.iter().find(|b| b.label == label).map(|b| b.count)
    }

    /// Bucket with the highest count; the earliest wins ties.
    pub fn peak(&self) -> Option<&BucketCount> {
        self.buckets
            .iter()
            .reduce(|best, b| if b.count > best.count { b } else { best })
    }

    /// Bucket with the lowest count; the earliest wins ties.
    pub fn trough(&self) -> Option<&BucketCount> {
        self.buckets
            .iter()
            .reduce(|best, b| if b.count < best.count { b } else { best })
    }

    /// Fraction of the total that falls in the given buckets.
    pub fn share_of(&self, labels: &[&str]) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let part: usize = self
            .buckets
            .iter()
            .filter(|b| labels.contains(&b.label.as_str()))
            .map(|b| b.count)
            .sum();
        part as f64 / total as f64
    }
}

/// The four grouped-count summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSummaries {
    pub yearly: SummaryTable,
    pub monthly: SummaryTable,
    pub weekday: SummaryTable,
    pub hourly: SummaryTable,
}

impl BucketSummaries {
    pub fn tables(&self) -> [&SummaryTable; 4] {
        [&self.yearly, &self.monthly, &self.weekday, &self.hourly]
    }
}

/// Derives calendar buckets and counts records per bucket.
pub struct Bucketizer;

impl Bucketizer {
    pub fn bucketize(&self, table: &NormalizedTable) -> BucketSummaries {
        info!("Bucketizing {} incidents...", table.len());

        let mut years: BTreeMap<i32, usize> = BTreeMap::new();
        let mut months = [0usize; 12];
        let mut weekdays = [0usize; 7];
        let mut hours = [0usize; HOURS_PER_DAY];

        for record in &table.records {
            let buckets = IncidentBuckets::of(record);
            *years.entry(buckets.year).or_default() += 1;
            months[buckets.month] += 1;
            weekdays[buckets.day_of_week] += 1;
            hours[buckets.hour] += 1;
        }

        let yearly = match (years.keys().next(), years.keys().next_back()) {
            (Some(&first), Some(&last)) => SummaryTable::from_counts(
                Dimension::Year,
                (first..=last).map(|year| (year, years.get(&year).copied().unwrap_or(0))),
            ),
            _ => SummaryTable::from_counts::<i32>(Dimension::Year, Vec::new()),
        };
        debug!("Yearly buckets span {} years", yearly.len());

        BucketSummaries {
            yearly,
            monthly: SummaryTable::from_counts(Dimension::Month, MONTH_LABELS.into_iter().zip(months)),
            weekday: SummaryTable::from_counts(
                Dimension::DayOfWeek,
                WEEKDAY_LABELS.into_iter().zip(weekdays),
            ),
            hourly: SummaryTable::from_counts(
                Dimension::Hour,
                (0..HOURS_PER_DAY).map(hour_label).zip(hours),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_row;
    use pretty_assertions::assert_eq;

    fn table(rows: &[(&str, &str, &str)]) -> NormalizedTable {
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, (k, d, t))| normalize_row(i, Some(k), Some(d), Some(t)).unwrap())
            .collect::<Vec<_>>();
        NormalizedTable {
            rows_in: records.len(),
            records,
            ..Default::default()
        }
    }

    fn two_incidents() -> BucketSummaries {
        Bucketizer.bucketize(&table(&[
            ("1", "01/15/2019", "23:45"),
            ("2", "07/04/2020", "08:10"),
        ]))
    }

    #[test]
    fn test_yearly_summary() {
        let summaries = two_incidents();
        assert_eq!(summaries.yearly.labels(), vec!["2019", "2020"]);
        assert_eq!(summaries.yearly.count("2019"), Some(1));
        assert_eq!(summaries.yearly.count("2020"), Some(1));
    }

    #[test]
    fn test_monthly_summary_has_full_domain() {
        let summaries = two_incidents();
        assert_eq!(summaries.monthly.labels(), MONTH_LABELS.to_vec());
        for label in MONTH_LABELS {
            let expected = if label == "Jan" || label == "Jul" { 1 } else { 0 };
            assert_eq!(summaries.monthly.count(label), Some(expected), "{label}");
        }
    }

    #[test]
    fn test_weekday_summary_sunday_first() {
        let summaries = two_incidents();
        assert_eq!(summaries.weekday.labels(), WEEKDAY_LABELS.to_vec());
        assert_eq!(summaries.weekday.count("Tue"), Some(1));
        assert_eq!(summaries.weekday.count("Sat"), Some(1));
        assert_eq!(summaries.weekday.count("Sun"), Some(0));
    }

    #[test]
    fn test_hourly_summary_has_every_hour() {
        let summaries = two_incidents();
        let expected: Vec<String> = (0..24).map(|h| h.to_string()).collect();
        assert_eq!(summaries.hourly.labels(), expected.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(summaries.hourly.count("23"), Some(1));
        assert_eq!(summaries.hourly.count("8"), Some(1));
        assert_eq!(summaries.hourly.count("0"), Some(0));
    }

    #[test]
    fn test_every_summary_partitions_records() {
        let summaries = Bucketizer.bucketize(&table(&[
            ("1", "01/15/2019", "23:45"),
            ("2", "07/04/2020", "08:10"),
            ("3", "12/31/2016", "00:00"),
            ("4", "02/29/2020", "12:30"),
            ("5", "02/29/2020", "12:31"),
        ]));
        for summary in summaries.tables() {
            assert_eq!(summary.total(), 5, "{:?}", summary.dimension);
        }
    }

    #[test]
    fn test_year_gaps_are_zero_filled_in_order() {
        let summaries = Bucketizer.bucketize(&table(&[
            ("1", "06/01/2021", "10:00"),
            ("2", "06/01/2018", "10:00"),
        ]));
        assert_eq!(summaries.yearly.labels(), vec!["2018", "2019", "2020", "2021"]);
        assert_eq!(summaries.yearly.count("2019"), Some(0));
    }

    #[test]
    fn test_two_digit_year_does_not_stretch_year_range() {
        use crate::cleaner::{INCIDENT_KEY, OCCUR_DATE, OCCUR_TIME};
        use crate::config::ParsePolicy;
        use crate::normalizer::Normalizer;
        use polars::prelude::*;

        let df = df!(
            INCIDENT_KEY => ["1", "2", "3"],
            OCCUR_DATE => ["01/15/19", "06/01/2019", "06/01/2020"],
            OCCUR_TIME => ["23:45:00", "10:00:00", "10:00:00"]
        )
        .unwrap();
        let table = Normalizer::new(ParsePolicy::Exclude).normalize(&df).unwrap();
        assert_eq!(table.rejected_rows(), 1);

        let summaries = Bucketizer.bucketize(&table);
        assert_eq!(summaries.yearly.labels(), vec!["2019", "2020"]);
        assert_eq!(summaries.yearly.total(), 2);
    }

    #[test]
    fn test_empty_table() {
        let summaries = Bucketizer.bucketize(&NormalizedTable::default());
        assert!(summaries.yearly.is_empty());
        assert_eq!(summaries.monthly.len(), 12);
        assert_eq!(summaries.weekday.len(), 7);
        assert_eq!(summaries.hourly.len(), 24);
        assert_eq!(summaries.hourly.total(), 0);
        assert_eq!(summaries.monthly.share_of(&["Jan"]), 0.0);
    }

    #[test]
    fn test_peak_and_trough_prefer_earliest() {
        let summaries = two_incidents();
        assert_eq!(summaries.monthly.peak().map(|b| b.label.as_str()), Some("Jan"));
        assert_eq!(summaries.monthly.trough().map(|b| b.label.as_str()), Some("Feb"));
    }

    #[test]
    fn test_share_of() {
        let summaries = two_incidents();
        assert!((summaries.weekday.share_of(&["Sat", "Sun"]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_incident_buckets_labels() {
        let record = normalize_row(0, Some("9"), Some("03/08/2020"), Some("02:30")).unwrap();
        let buckets = IncidentBuckets::of(&record);
        assert_eq!(buckets.month_label(), "Mar");
        assert_eq!(buckets.day_of_week_label(), "Sun");
        assert_eq!(buckets.hour, 2);
    }
}
