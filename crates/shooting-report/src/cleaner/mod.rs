//! Data cleaning for the raw incident table.
//!
//! Cleaning is two steps:
//! - Removing rows that are exact duplicates across all source columns
//! - Projecting to the three columns the report needs
//!
//! Full-row duplicates are removed before projection. Rows that only become
//! identical once the dropped columns are gone are collapsed after it, so
//! cleaning an already clean table changes nothing.

use crate::error::{ReportError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const INCIDENT_KEY: &str = "INCIDENT_KEY";
pub const OCCUR_DATE: &str = "OCCUR_DATE";
pub const OCCUR_TIME: &str = "OCCUR_TIME";

/// Columns retained after projection, in output order.
pub const RETAINED_COLUMNS: [&str; 3] = [INCIDENT_KEY, OCCUR_DATE, OCCUR_TIME];

/// What the cleaner did to the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows_before: usize,
    pub duplicates_removed: usize,
    pub rows_after: usize,
    pub columns_dropped: Vec<String>,
    pub actions: Vec<String>,
}

/// Data cleaner for the raw incident table.
pub struct DataCleaner;

impl DataCleaner {
    /// Deduplicate and project `df`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Schema`] naming every expected column that is absent.
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, CleaningSummary)> {
        info!("Performing data cleaning...");
        Self::check_schema(&df)?;

        let mut summary = CleaningSummary {
            rows_before: df.height(),
            ..Default::default()
        };

        let (df, removed) = Self::remove_duplicates(df)?;
        summary.duplicates_removed = removed;
        if removed > 0 {
            let pct = (removed as f64 / summary.rows_before as f64) * 100.0;
            summary
                .actions
                .push(format!("Removed {} duplicate rows ({:.1}%)", removed, pct));
            debug!("Removed {} duplicate rows", removed);
        } else {
            summary.actions.push("No duplicate rows found".to_string());
            debug!("No duplicate rows found");
        }

        summary.columns_dropped = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .filter(|name| !RETAINED_COLUMNS.contains(&name.as_str()))
            .collect();

        let (df, collapsed) = Self::remove_duplicates(Self::project(&df)?)?;
        if collapsed > 0 {
            summary.duplicates_removed += collapsed;
            summary.actions.push(format!(
                "Removed {} rows identical on the retained columns",
                collapsed
            ));
            debug!("Removed {} rows duplicated after projection", collapsed);
        }
        if summary.columns_dropped.is_empty() {
            summary.actions.push("No columns to drop".to_string());
        } else {
            summary.actions.push(format!(
                "Dropped {} columns not used by the report",
                summary.columns_dropped.len()
            ));
        }

        summary.rows_after = df.height();
        Ok((df, summary))
    }

    /// Fail unless every retained column is present.
    pub fn check_schema(df: &DataFrame) -> Result<()> {
        let present: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let missing: Vec<String> = RETAINED_COLUMNS
            .iter()
            .filter(|col| !present.iter().any(|p| p == *col))
            .map(|col| col.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReportError::Schema { missing })
        }
    }

    /// Drop exact duplicate rows, keeping the first occurrence and the original order.
    ///
    /// Returns the deduplicated table and the number of rows removed.
    pub fn remove_duplicates(df: DataFrame) -> Result<(DataFrame, usize)> {
        let before = df.height();
        let deduped = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        let removed = before - deduped.height();
        Ok((deduped, removed))
    }

    /// Keep only the retained columns.
    pub fn project(df: &DataFrame) -> Result<DataFrame> {
        Self::check_schema(df)?;
        Ok(df.select(RETAINED_COLUMNS)?)
    }
}
