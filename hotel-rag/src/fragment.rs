//! Per-row text fragments: the unit of embedding.

use serde::{Deserialize, Serialize};

use crate::dataset::{Row, Snapshot, columns};

const MISSING: &str = "unknown";

/// A natural-language description of one booking row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fragment {
    /// Index of the source row in the snapshot.
    pub row: usize,
    /// The synthesized description.
    pub text: String,
}

impl Fragment {
    /// Describe a row. Deterministic: the same row always yields the same text.
    pub fn from_row(row: &Row<'_>) -> Self {
        let field = |column: &str| row.display(column).unwrap_or_else(|| MISSING.to_string());
        let date = row
            .display(columns::RESERVATION_STATUS_DATE)
            .or_else(|| row.arrival_date().map(|d| d.format("%Y-%m-%d").to_string()))
            .unwrap_or_else(|| MISSING.to_string());

        let text = format!(
            "Booking from {} for {} on {}. ADR: {}, Canceled: {}",
            field(columns::COUNTRY),
            field(columns::HOTEL),
            date,
            field(columns::ADR),
            field(columns::IS_CANCELED),
        );
        Self { row: row.index(), text }
    }
}

/// Fragments for every row, in row order.
pub fn fragments(snapshot: &Snapshot) -> Vec<Fragment> {
    snapshot.rows().map(|row| Fragment::from_row(&row)).collect()
}
