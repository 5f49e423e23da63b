//! Dataset insights computed once at load time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dataset::{Snapshot, columns, format_number};

/// Guest categories summed into the guest-total fact, in reporting order.
pub(crate) const GUEST_COLUMNS: [(&str, &str); 3] =
    [(columns::ADULTS, "adults"), (columns::CHILDREN, "children"), (columns::BABIES, "babies")];

/// One human-readable fact about the dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Insight(pub String);

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered, read-only set of facts derived from a [`Snapshot`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InsightSet {
    insights: Vec<Insight>,
}

impl InsightSet {
    /// Derive the insight set. Always starts with the row count; date range,
    /// revenue and guest facts follow when their columns exist.
    pub fn summarize(snapshot: &Snapshot) -> Self {
        let mut insights = vec![Insight(format!(
            "Dataset contains {} hotel bookings.",
            snapshot.row_count()
        ))];

        if let Some((min, max)) = snapshot.date_range() {
            insights.push(Insight(format!(
                "Date range: {} to {}",
                min.format("%Y-%m-%d"),
                max.format("%Y-%m-%d")
            )));
        }

        if let Some(total) = snapshot.sum(columns::REVENUE) {
            insights.push(Insight(format!("Total revenue: {}", format_money(total))));
            if let Some(mean) = snapshot.mean(columns::REVENUE) {
                insights.push(Insight(format!("Average booking revenue: {}", format_money(mean))));
            }
        }

        if let Some(guests) = guest_totals(snapshot) {
            insights.push(Insight(format!("Total guests: {guests}")));
        }

        Self { insights }
    }

    /// The facts in their fixed order.
    pub fn insights(&self) -> &[Insight] {
        &self.insights
    }

    /// Number of facts.
    pub fn len(&self) -> usize {
        self.insights.len()
    }

    /// Whether there are no facts.
    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }

    /// Facts as plain strings, e.g. for a JSON payload.
    pub fn lines(&self) -> Vec<&str> {
        self.insights.iter().map(|i| i.0.as_str()).collect()
    }
}

impl fmt::Display for InsightSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, insight) in self.insights.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{insight}")?;
        }
        Ok(())
    }
}

/// `"{a} adults, {c} children, {b} babies"`, each part only when its column
/// exists. `None` when no guest column exists.
pub(crate) fn guest_totals(snapshot: &Snapshot) -> Option<String> {
    let parts: Vec<String> = GUEST_COLUMNS
        .iter()
        .filter_map(|(column, label)| {
            snapshot.sum(column).map(|total| format!("{} {label}", format_number(total)))
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

pub(crate) fn format_money(amount: f64) -> String {
    format!("${amount:.2}")
}
