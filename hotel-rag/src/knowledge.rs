//! The shared, read-only state every question is answered against.

use std::path::Path;

use tracing::info;

use crate::config::HotelRagConfig;
use crate::dataset::Snapshot;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::index::SimilarityIndex;
use crate::insight::InsightSet;

/// Snapshot, insights and (optionally) the similarity index, built together
/// at startup and never mutated afterwards.
///
/// Reloading means building a new `KnowledgeBase` and swapping it in whole;
/// readers holding the old one keep a consistent view.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    snapshot: Snapshot,
    insights: InsightSet,
    index: Option<SimilarityIndex>,
}

impl KnowledgeBase {
    /// Bundle a snapshot with its insights and an optional index.
    pub fn new(snapshot: Snapshot, index: Option<SimilarityIndex>) -> Self {
        let insights = InsightSet::summarize(&snapshot);
        Self { snapshot, insights, index }
    }

    /// Load the dataset at `path`, summarize it, and build the similarity
    /// index when an embedding provider is given.
    ///
    /// # Errors
    ///
    /// Returns [`HotelRagError::Config`](crate::HotelRagError::Config),
    /// [`HotelRagError::Load`](crate::HotelRagError::Load) or
    /// [`HotelRagError::IndexBuild`](crate::HotelRagError::IndexBuild); all
    /// mean the system is not ready.
    pub async fn load(
        path: impl AsRef<Path>,
        embedder: Option<&dyn EmbeddingProvider>,
        config: &HotelRagConfig,
    ) -> Result<Self> {
        config.validate()?;
        let snapshot = Snapshot::load(path)?;
        let index = match embedder {
            Some(embedder) => Some(SimilarityIndex::build(&snapshot, embedder, config).await?),
            None => None,
        };
        let knowledge = Self::new(snapshot, index);
        info!(
            rows = knowledge.snapshot.row_count(),
            insights = knowledge.insights.len(),
            indexed = knowledge.index.is_some(),
            "knowledge base ready"
        );
        Ok(knowledge)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn insights(&self) -> &InsightSet {
        &self.insights
    }

    pub fn index(&self) -> Option<&SimilarityIndex> {
        self.index.as_ref()
    }
}
