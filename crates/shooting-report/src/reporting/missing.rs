//! Missing-value audit of the retained columns.

use crate::normalizer::{NormalizedTable, ParseFailure, RecordField};
use serde::{Deserialize, Serialize};

/// Missing and unparsable counts for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAudit {
    pub column: String,
    pub missing: usize,
    pub unparsable: usize,
    /// Share of audited rows that are missing or unparsable, 0-100.
    pub percentage: f64,
}

impl ColumnAudit {
    pub fn problems(&self) -> usize {
        self.missing + self.unparsable
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingValueAudit {
    pub rows_audited: usize,
    pub columns: Vec<ColumnAudit>,
}

impl MissingValueAudit {
    /// Audit the normalizer's view of the projected table.
    ///
    /// Incident keys are never parsed, so their unparsable count is always zero.
    pub fn from_table(table: &NormalizedTable) -> Self {
        let rows = table.rows_in;
        let audit = |field: RecordField, missing: usize, unparsable: usize| {
            let percentage = if rows == 0 {
                0.0
            } else {
                (missing + unparsable) as f64 / rows as f64 * 100.0
            };
            ColumnAudit {
                column: field.column_name().to_string(),
                missing,
                unparsable,
                percentage,
            }
        };

        let columns = vec![
            audit(RecordField::IncidentKey, table.missing_keys, 0),
            audit(
                RecordField::OccurDate,
                table.failures(RecordField::OccurDate, ParseFailure::Missing),
                table.failures(RecordField::OccurDate, ParseFailure::Malformed),
            ),
            audit(
                RecordField::OccurTime,
                table.failures(RecordField::OccurTime, ParseFailure::Missing),
                table.failures(RecordField::OccurTime, ParseFailure::Malformed),
            ),
        ];

        Self {
            rows_audited: rows,
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnAudit> {
        self.columns.iter().find(|c| c.column == name)
    }

    pub fn is_clean(&self) -> bool {
        self.columns.iter().all(|c| c.problems() == 0)
    }
}
