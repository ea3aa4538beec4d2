//! Plain-language conclusions drawn from the bucket summaries.

use crate::bucketizer::{BucketSummaries, MONTH_LABELS, SummaryTable};
use serde::{Deserialize, Serialize};

const SEASONS: [(&str, [&str; 3]); 4] = [
    ("winter", ["Dec", "Jan", "Feb"]),
    ("spring", ["Mar", "Apr", "May"]),
    ("summer", ["Jun", "Jul", "Aug"]),
    ("fall", ["Sep", "Oct", "Nov"]),
];
const WEEKEND: [&str; 2] = ["Sat", "Sun"];
const OVERNIGHT_HOURS: [&str; 9] = ["20", "21", "22", "23", "0", "1", "2", "3", "4"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conclusion {
    pub topic: String,
    pub text: String,
}

impl Conclusion {
    fn new(topic: &str, text: String) -> Self {
        Self {
            topic: topic.to_string(),
            text,
        }
    }
}

/// Summarize yearly, seasonal, weekly and daily patterns.
///
/// An empty dataset yields a single conclusion saying so.
pub fn conclusions(summaries: &BucketSummaries) -> Vec<Conclusion> {
    let total = summaries.monthly.total();
    if total == 0 {
        return vec![Conclusion::new(
            "data",
            "No incidents could be summarized, so no patterns can be reported.".to_string(),
        )];
    }

    let mut out = Vec::new();
    out.extend(yearly(&summaries.yearly));
    out.extend(monthly(&summaries.monthly));
    out.push(weekly(&summaries.weekday));
    out.extend(hourly(&summaries.hourly));
    out
}

fn yearly(table: &SummaryTable) -> Option<Conclusion> {
    let peak = table.peak()?;
    let trough = table.trough()?;
    let (first, last) = (table.buckets.first()?, table.buckets.last()?);

    if table.len() == 1 {
        return Some(Conclusion::new(
            "trend",
            format!(
                "All {} incidents occurred in {}, so no year-over-year trend is available.",
                peak.count, peak.label
            ),
        ));
    }

    let trend = if first.count == 0 {
        format!("rose from none in {} to {} in {}", first.label, last.count, last.label)
    } else {
        let change = (last.count as f64 - first.count as f64) / first.count as f64 * 100.0;
        let direction = if change > 0.0 {
            "rose"
        } else if change < 0.0 {
            "fell"
        } else {
            "was unchanged"
        };
        format!(
            "{} {:.1}% from {} in {} to {} in {}",
            direction,
            change.abs(),
            first.count,
            first.label,
            last.count,
            last.label
        )
    };

    Some(Conclusion::new(
        "trend",
        format!(
            "Incidents peaked in {} ({}) and were lowest in {} ({}). Over the whole period the yearly count {}.",
            peak.label, peak.count, trough.label, trough.count, trend
        ),
    ))
}

fn monthly(table: &SummaryTable) -> Vec<Conclusion> {
    let mut out = Vec::new();
    if let Some(peak) = table.peak() {
        out.push(Conclusion::new(
            "month",
            format!(
                "{} is the busiest month with {} incidents ({:.1}% of the total).",
                full_month_name(&peak.label),
                peak.count,
                table.share_of(&[peak.label.as_str()]) * 100.0
            ),
        ));
    }

    let busiest = SEASONS
        .iter()
        .map(|(name, months)| (name, table.share_of(months)))
        .reduce(|best, s| if s.1 > best.1 { s } else { best });
    if let Some((season, share)) = busiest {
        out.push(Conclusion::new(
            "season",
            format!(
                "The {} months account for {:.1}% of incidents, more than any other season.",
                season,
                share * 100.0
            ),
        ));
    }
    out
}

fn weekly(table: &SummaryTable) -> Conclusion {
    let weekend_share = table.share_of(&WEEKEND);
    let total = table.total() as f64;
    let weekend_per_day = total * weekend_share / 2.0;
    let weekday_per_day = total * (1.0 - weekend_share) / 5.0;
    let comparison = if weekend_per_day > weekday_per_day {
        "higher than"
    } else if weekend_per_day < weekday_per_day {
        "lower than"
    } else {
        "the same as"
    };

    Conclusion::new(
        "week",
        format!(
            "Weekends hold {:.1}% of incidents; the average weekend day sees {:.1} incidents, {} the {:.1} of an average weekday.",
            weekend_share * 100.0,
            weekend_per_day,
            comparison,
            weekday_per_day
        ),
    )
}

fn hourly(table: &SummaryTable) -> Vec<Conclusion> {
    let mut out = Vec::new();
    if let Some(peak) = table.peak() {
        out.push(Conclusion::new(
            "hour",
            format!(
                "The busiest hour is {:0>2}:00-{:0>2}:59 with {} incidents.",
                peak.label, peak.label, peak.count
            ),
        ));
    }
    out.push(Conclusion::new(
        "overnight",
        format!(
            "{:.1}% of incidents occur overnight between 20:00 and 04:59.",
            table.share_of(&OVERNIGHT_HOURS) * 100.0
        ),
    ));
    out
}

fn full_month_name(label: &str) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    MONTH_LABELS
        .iter()
        .position(|m| *m == label)
        .map(|i| NAMES[i])
        .unwrap_or("Unknown")
}
