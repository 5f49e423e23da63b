//! Answers and their provenance.

use serde::{Deserialize, Serialize};

/// Where an answer came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    /// Computed directly from the dataset by an intent rule.
    Deterministic,
    /// Produced by the generation capability.
    Generated,
    /// A per-question failure; the text explains what went wrong.
    Error,
}

impl AnswerSource {
    /// Lowercase name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deterministic => "deterministic",
            Self::Generated => "generated",
            Self::Error => "error",
        }
    }

    /// Whether the answer is attributable to dataset values alone.
    pub fn is_deterministic(self) -> bool {
        matches!(self, Self::Deterministic)
    }
}

/// A recognized question category with a deterministic answering rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BookingCount,
    RevenueForMonth,
    Revenue,
    DateRange,
    GuestTotals,
    CancellationRate,
    TopCountries,
}

/// The outcome of answering one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The answer text. Never empty.
    pub text: String,
    /// Provenance of the text.
    pub source: AnswerSource,
    /// The intent that produced a deterministic answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// `false` when an intent was recognized but its data is missing.
    pub available: bool,
}

impl Answer {
    /// A deterministic answer backed by dataset values.
    pub fn deterministic(intent: Intent, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: AnswerSource::Deterministic,
            intent: Some(intent),
            available: true,
        }
    }

    /// A recognized intent whose required columns are missing.
    pub fn unavailable(intent: Intent, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: AnswerSource::Deterministic,
            intent: Some(intent),
            available: false,
        }
    }

    /// Generated text, captured verbatim.
    pub fn generated(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: AnswerSource::Generated, intent: None, available: true }
    }

    /// A degraded answer carrying an explanation of the failure.
    pub fn error(reason: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Error: {reason}"),
            source: AnswerSource::Error,
            intent: None,
            available: false,
        }
    }

    /// Convert to the facade response shape.
    pub fn into_response(self) -> AskResponse {
        AskResponse { text: self.text, source: self.source }
    }
}

/// The `ask` boundary consumed by outer service layers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskResponse {
    pub text: String,
    pub source: AnswerSource,
}
