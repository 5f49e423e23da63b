//! Deterministic intent matching.
//!
//! A [`QueryMatcher`] holds an ordered list of [`IntentRule`]s. The first
//! rule whose trigger fires answers the question; order is significant, so
//! more specific rules (revenue for a given month) sit before their general
//! counterparts (total revenue). A rule that fires but lacks the columns it
//! needs still answers, with a "not available" message, instead of falling
//! through to [`MatchOutcome::NoMatch`].

use std::sync::LazyLock;

use chrono::Month;
use regex::Regex;
use tracing::debug;

use crate::answer::{Answer, Intent};
use crate::dataset::{Snapshot, columns, parse_month};
use crate::insight::{InsightSet, format_money, guest_totals};

const TOP_COUNTRY_LIMIT: usize = 5;

static MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)\s+(\d{4})\b",
    )
    .expect("month-year pattern is valid")
});

/// Result of running a question through the matcher.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// An intent was recognized; the answer may report missing data.
    Answered(Answer),
    /// No intent was recognized. Not an error: callers fall back to generation.
    NoMatch,
}

impl MatchOutcome {
    /// The answer, if an intent was recognized.
    pub fn into_answer(self) -> Option<Answer> {
        match self {
            Self::Answered(answer) => Some(answer),
            Self::NoMatch => None,
        }
    }
}

/// Everything a rule may read while answering.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    /// The normalized question.
    pub question: &'a str,
    pub snapshot: &'a Snapshot,
    pub insights: &'a InsightSet,
}

/// One guarded rule: a trigger over the normalized question and a responder
/// that checks its own columns.
#[derive(Debug, Clone, Copy)]
pub struct IntentRule {
    pub intent: Intent,
    pub trigger: fn(&str) -> bool,
    pub respond: fn(&MatchContext<'_>) -> Answer,
}

/// Ordered intent rules; the first rule whose trigger fires wins.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    rules: Vec<IntentRule>,
}

impl Default for QueryMatcher {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl QueryMatcher {
    /// Create a matcher with a custom rule order.
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    /// Classify and, if recognized, answer the question from the dataset.
    pub fn match_question(
        &self,
        question: &str,
        snapshot: &Snapshot,
        insights: &InsightSet,
    ) -> MatchOutcome {
        let normalized = normalize(question);
        let ctx = MatchContext { question: &normalized, snapshot, insights };

        for rule in &self.rules {
            if (rule.trigger)(&normalized) {
                let answer = (rule.respond)(&ctx);
                debug!(intent = ?rule.intent, available = answer.available, "intent matched");
                return MatchOutcome::Answered(answer);
            }
        }

        debug!("no intent matched");
        MatchOutcome::NoMatch
    }
}

/// Lowercase, trim and collapse internal whitespace.
pub fn normalize(question: &str) -> String {
    question.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// The built-in rule order.
pub fn default_rules() -> Vec<IntentRule> {
    vec![
        IntentRule {
            intent: Intent::BookingCount,
            trigger: |q| {
                contains_any(q, &["how many bookings", "number of bookings", "total bookings"])
            },
            respond: booking_count,
        },
        IntentRule {
            intent: Intent::RevenueForMonth,
            trigger: |q| q.contains("revenue") && month_year(q).is_some(),
            respond: revenue_for_month,
        },
        IntentRule {
            intent: Intent::Revenue,
            trigger: |q| q.contains("revenue"),
            respond: revenue,
        },
        IntentRule {
            intent: Intent::DateRange,
            trigger: |q| contains_any(q, &["date range", "time period", "when are the bookings"]),
            respond: date_range,
        },
        IntentRule {
            intent: Intent::GuestTotals,
            trigger: |q| contains_any(q, &["how many guests", "number of guests", "total guests"]),
            respond: guests,
        },
        IntentRule {
            intent: Intent::CancellationRate,
            trigger: |q| {
                contains_any(
                    q,
                    &[
                        "cancellation rate",
                        "cancelation rate",
                        "how many cancel",
                        "canceled bookings",
                        "cancelled bookings",
                    ],
                )
            },
            respond: cancellation_rate,
        },
        IntentRule {
            intent: Intent::TopCountries,
            trigger: |q| {
                contains_any(
                    q,
                    &["top countries", "which countries", "which country", "most bookings from"],
                )
            },
            respond: top_countries,
        },
    ]
}

fn contains_any(question: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| question.contains(phrase))
}

/// Extract a `(year, month)` window such as "july 2017" or "jul 2017".
pub fn month_year(question: &str) -> Option<(i32, u32)> {
    let captures = MONTH_YEAR.captures(question)?;
    let name = match captures.get(1)?.as_str() {
        "sept" => "sep",
        name => name,
    };
    let month = parse_month(name)?;
    let year = captures.get(2)?.as_str().parse().ok()?;
    Some((year, month))
}

fn booking_count(ctx: &MatchContext<'_>) -> Answer {
    Answer::deterministic(
        Intent::BookingCount,
        format!("There are {} bookings in the dataset.", ctx.snapshot.row_count()),
    )
}

fn revenue_unavailable(intent: Intent) -> Answer {
    Answer::unavailable(intent, "Revenue data is not available in the dataset.")
}

fn revenue_for_month(ctx: &MatchContext<'_>) -> Answer {
    let intent = Intent::RevenueForMonth;
    if ctx.snapshot.numeric(columns::REVENUE).is_none() {
        return revenue_unavailable(intent);
    }
    let Some((year, month)) = month_year(ctx.question) else {
        return revenue_unavailable(intent);
    };
    let Some(rows) = ctx.snapshot.filter_by_year_month(year, month) else {
        return Answer::unavailable(
            intent,
            "Arrival date data is not available to filter revenue by month.",
        );
    };

    let total = ctx.snapshot.sum_rows(columns::REVENUE, &rows).unwrap_or_default();
    let month_name = Month::try_from(month as u8).map(|m| m.name()).unwrap_or("Unknown");
    Answer::deterministic(
        intent,
        format!("The total revenue for {month_name} {year} was {}.", format_money(total)),
    )
}

fn revenue(ctx: &MatchContext<'_>) -> Answer {
    let Some(total) = ctx.snapshot.sum(columns::REVENUE) else {
        return revenue_unavailable(Intent::Revenue);
    };
    let mean = ctx.snapshot.mean(columns::REVENUE).unwrap_or_default();
    Answer::deterministic(
        Intent::Revenue,
        format!(
            "Total revenue: {}. Average per booking: {}.",
            format_money(total),
            format_money(mean)
        ),
    )
}

fn date_range(ctx: &MatchContext<'_>) -> Answer {
    match ctx.snapshot.date_range() {
        Some((min, max)) => Answer::deterministic(
            Intent::DateRange,
            format!(
                "Bookings range from {} to {}.",
                min.format("%Y-%m-%d"),
                max.format("%Y-%m-%d")
            ),
        ),
        None => Answer::unavailable(Intent::DateRange, "Date information is not available."),
    }
}

fn guests(ctx: &MatchContext<'_>) -> Answer {
    match guest_totals(ctx.snapshot) {
        Some(totals) => {
            Answer::deterministic(Intent::GuestTotals, format!("Total guests: {totals}"))
        }
        None => Answer::unavailable(Intent::GuestTotals, "Guest information is not available."),
    }
}

fn cancellation_rate(ctx: &MatchContext<'_>) -> Answer {
    let Some(canceled) = ctx.snapshot.count_nonzero(columns::IS_CANCELED) else {
        return Answer::unavailable(
            Intent::CancellationRate,
            "Cancellation data is not available in the dataset.",
        );
    };
    let total = ctx.snapshot.row_count();
    let rate = if total == 0 { 0.0 } else { canceled as f64 / total as f64 * 100.0 };
    Answer::deterministic(
        Intent::CancellationRate,
        format!("The cancellation rate is {rate:.2}% ({canceled} of {total} bookings)."),
    )
}

fn top_countries(ctx: &MatchContext<'_>) -> Answer {
    let counts = ctx.snapshot.value_counts(columns::COUNTRY).unwrap_or_default();
    if counts.is_empty() {
        return Answer::unavailable(
            Intent::TopCountries,
            "Country data is not available in the dataset.",
        );
    }
    let ranked: Vec<String> = counts
        .iter()
        .take(TOP_COUNTRY_LIMIT)
        .map(|(country, count)| format!("{country} ({count})"))
        .collect();
    Answer::deterministic(
        Intent::TopCountries,
        format!("Top countries by bookings: {}.", ranked.join(", ")),
    )
}
