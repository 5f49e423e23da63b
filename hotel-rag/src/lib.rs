//! Hybrid question answering over hotel booking data.
//!
//! Questions are answered in three tiers:
//!
//! 1. a [`QueryMatcher`] recognizes known intents (booking counts, revenue,
//!    date range, guests, ...) and answers straight from the [`Snapshot`];
//! 2. otherwise the question is embedded and the nearest booking
//!    [`Fragment`]s are fetched from the [`SimilarityIndex`];
//! 3. insights and fragments go into a prompt for the [`Generator`].
//!
//! The dataset, its [`InsightSet`] and the index are built once into a
//! [`KnowledgeBase`] and shared read-only by an [`AnswerOrchestrator`].

pub mod answer;
pub mod config;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod fragment;
pub mod generation;
pub mod index;
pub mod insight;
pub mod knowledge;
pub mod matcher;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod orchestrator;

pub use answer::{Answer, AnswerSource, AskResponse, Intent};
pub use config::{ContextPolicy, HotelRagConfig, HotelRagConfigBuilder};
pub use dataset::{Column, Row, Snapshot};
pub use embedding::EmbeddingProvider;
pub use error::{
    CapabilityError, ConfigError, HotelRagError, IndexBuildError, IndexError, LoadError, Result,
};
pub use fragment::Fragment;
pub use generation::Generator;
pub use index::{Neighbor, SimilarityIndex};
pub use insight::{Insight, InsightSet};
pub use knowledge::KnowledgeBase;
pub use matcher::{IntentRule, MatchOutcome, QueryMatcher};
pub use orchestrator::{AnswerOrchestrator, AnswerOrchestratorBuilder};
