//! Answer orchestrator.
//!
//! The [`AnswerOrchestrator`] answers one question at a time against a shared
//! [`KnowledgeBase`]: the [`QueryMatcher`] goes first and short-circuits on any
//! recognized intent; otherwise a prompt is assembled from the insights and
//! the nearest booking fragments and handed to the [`Generator`]. Every
//! per-question failure is turned into an [`Answer`] with
//! [`AnswerSource::Error`](crate::AnswerSource::Error), so callers never see a fault.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hotel_rag::{AnswerOrchestrator, HotelRagConfig, KnowledgeBase};
//!
//! let knowledge =
//!     KnowledgeBase::load("cleaned_hotel_bookings.csv", Some(&*embedder), &config).await?;
//! let orchestrator = AnswerOrchestrator::builder()
//!     .config(config)
//!     .knowledge(Arc::new(knowledge))
//!     .embedding_provider(embedder)
//!     .generator(Arc::new(my_llm))
//!     .build()?;
//!
//! let response = orchestrator.ask("How many bookings are there?").await;
//! ```

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::answer::{Answer, AskResponse};
use crate::config::{ContextPolicy, HotelRagConfig};
use crate::embedding::EmbeddingProvider;
use crate::error::{CapabilityError, ConfigError, bounded};
use crate::fragment::Fragment;
use crate::generation::Generator;
use crate::insight::InsightSet;
use crate::knowledge::KnowledgeBase;
use crate::matcher::{MatchOutcome, QueryMatcher};

const PROMPT_INSTRUCTIONS: &str = "Answer the question based on the data above. \
If you don't know or the information isn't available, say so.\n\
Provide concise, factual answers and mention if you're making any assumptions.";

/// Hybrid question answering: deterministic intents first, then retrieval
/// plus generation. Construct one via [`AnswerOrchestrator::builder()`].
pub struct AnswerOrchestrator {
    config: HotelRagConfig,
    knowledge: Arc<KnowledgeBase>,
    matcher: QueryMatcher,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generator: Arc<dyn Generator>,
}

impl AnswerOrchestrator {
    /// Create a new [`AnswerOrchestratorBuilder`].
    pub fn builder() -> AnswerOrchestratorBuilder {
        AnswerOrchestratorBuilder::default()
    }

    pub fn config(&self) -> &HotelRagConfig {
        &self.config
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    /// A new orchestrator over a replacement knowledge base, sharing this
    /// one's matcher, capabilities and configuration.
    pub fn with_knowledge(&self, knowledge: Arc<KnowledgeBase>) -> Self {
        Self {
            config: self.config.clone(),
            knowledge,
            matcher: self.matcher.clone(),
            embedding_provider: self.embedding_provider.clone(),
            generator: Arc::clone(&self.generator),
        }
    }

    /// Answer a question in the facade's `{text, source}` shape.
    pub async fn ask(&self, question: &str) -> AskResponse {
        self.answer(question).await.into_response()
    }

    /// Answer a question. Never fails: capability errors and timeouts
    /// become an answer with [`AnswerSource::Error`](crate::AnswerSource::Error).
    /// The prompt carries the question exactly as asked.
    pub async fn answer(&self, question: &str) -> Answer {
        if question.trim().is_empty() {
            warn!("rejected empty question");
            return Answer::error("question is empty");
        }

        let knowledge = &self.knowledge;
        if let MatchOutcome::Answered(answer) =
            self.matcher.match_question(question, knowledge.snapshot(), knowledge.insights())
        {
            info!(intent = ?answer.intent, available = answer.available, "answered from data");
            return answer;
        }

        let policy = self.config.context_policy;
        let fragments =
            if policy.wants_fragments() { self.retrieve(question).await } else { Vec::new() };
        let prompt = build_prompt(policy, knowledge.insights(), &fragments, question);
        debug!(prompt_len = prompt.len(), fragments = fragments.len(), "built generation prompt");

        let generated = bounded(
            "generation",
            self.config.generate_timeout(),
            self.generator.generate(&prompt),
        )
        .await;

        match generated {
            Ok(text) if text.trim().is_empty() => {
                let err =
                    CapabilityError::EmptyResponse { provider: self.generator.name().to_string() };
                error!(error = %err, "generation returned nothing");
                Answer::error(err)
            }
            Ok(text) => {
                info!(generator = self.generator.name(), "answered by generation");
                Answer::generated(text)
            }
            Err(e) => {
                error!(generator = self.generator.name(), error = %e, "generation failed");
                Answer::error(e)
            }
        }
    }

    /// Embed the question and fetch the `top_k` nearest fragments. Retrieval
    /// only enriches the prompt, so failures are logged and yield nothing.
    async fn retrieve(&self, question: &str) -> Vec<&Fragment> {
        let (Some(index), Some(embedder)) = (self.knowledge.index(), &self.embedding_provider)
        else {
            debug!("no similarity index configured; skipping retrieval");
            return Vec::new();
        };

        let query =
            match bounded("embedding", self.config.embed_timeout(), embedder.embed(question)).await
            {
                Ok(query) => query,
                Err(e) => {
                    warn!(provider = embedder.name(), error = %e, "question embedding failed");
                    return Vec::new();
                }
            };

        match index.search(&query, self.config.top_k) {
            Ok(neighbors) => {
                debug!(hits = neighbors.len(), "retrieved booking fragments");
                neighbors.iter().filter_map(|n| index.fragment(n.row)).collect()
            }
            Err(e) => {
                warn!(error = %e, "similarity search failed");
                Vec::new()
            }
        }
    }
}

/// Assemble the generation prompt.
///
/// Insights are included unless the policy is
/// [`ContextPolicy::FragmentsOnly`] and at least one fragment was retrieved,
/// so the prompt always carries some dataset context.
pub fn build_prompt(
    policy: ContextPolicy,
    insights: &InsightSet,
    fragments: &[&Fragment],
    question: &str,
) -> String {
    let include_insights = match policy {
        ContextPolicy::FragmentsOnly => fragments.is_empty(),
        ContextPolicy::InsightsOnly | ContextPolicy::InsightsAndFragments => true,
    };
    let include_fragments = policy.wants_fragments() && !fragments.is_empty();

    let mut prompt = String::new();
    if include_insights {
        prompt.push_str("Hotel Bookings Data Insights:\n");
        prompt.push_str(&insights.to_string());
        prompt.push_str("\n\n");
    }
    if include_fragments {
        prompt.push_str("Relevant Bookings:\n");
        for fragment in fragments {
            prompt.push_str("- ");
            prompt.push_str(&fragment.text);
            prompt.push('\n');
        }
        prompt.push('\n');
    }
    prompt.push_str("Question: ");
    prompt.push_str(question);
    prompt.push_str("\n\n");
    prompt.push_str(PROMPT_INSTRUCTIONS);
    prompt
}

/// Builder for constructing an [`AnswerOrchestrator`].
///
/// `knowledge` and `generator` are required. The embedding provider is
/// optional; without it the generation prompt carries insights only.
#[derive(Default)]
pub struct AnswerOrchestratorBuilder {
    config: Option<HotelRagConfig>,
    knowledge: Option<Arc<KnowledgeBase>>,
    matcher: Option<QueryMatcher>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn Generator>>,
}

impl AnswerOrchestratorBuilder {
    /// Set the configuration. Defaults to [`HotelRagConfig::default()`].
    pub fn config(mut self, config: HotelRagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the shared knowledge base.
    pub fn knowledge(mut self, knowledge: Arc<KnowledgeBase>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    /// Replace the built-in intent rules.
    pub fn matcher(mut self, matcher: QueryMatcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Set the embedding provider used to embed questions for retrieval.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation capability.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`AnswerOrchestrator`], validating required fields and the
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a required field is missing or the
    /// configuration is invalid.
    pub fn build(self) -> Result<AnswerOrchestrator, ConfigError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let knowledge =
            self.knowledge.ok_or_else(|| ConfigError::Invalid("knowledge is required".into()))?;
        let generator =
            self.generator.ok_or_else(|| ConfigError::Invalid("generator is required".into()))?;

        if knowledge.index().is_some() && self.embedding_provider.is_none() {
            warn!("similarity index present but no embedding provider; retrieval disabled");
        }

        let matcher = self.matcher.unwrap_or_default();
        debug!(
            rules = matcher.rules().len(),
            policy = ?config.context_policy,
            top_k = config.top_k,
            "built answer orchestrator"
        );

        Ok(AnswerOrchestrator {
            config,
            knowledge,
            matcher,
            embedding_provider: self.embedding_provider,
            generator,
        })
    }
}
