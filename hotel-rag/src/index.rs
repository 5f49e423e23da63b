//! Flat similarity index over row embeddings.
//!
//! [`SimilarityIndex`] stores one embedding per dataset row in a single
//! contiguous buffer and answers k-nearest-neighbor queries by squared
//! Euclidean distance. It is built once and never mutated afterwards, so
//! [`search`](SimilarityIndex::search) takes `&self` and concurrent searches
//! need no locking. Rebuilding means building a new index.
//!
//! # Example
//!
//! ```rust,ignore
//! use hotel_rag::{HotelRagConfig, SimilarityIndex};
//!
//! let index = SimilarityIndex::build(&snapshot, &embedder, &HotelRagConfig::default()).await?;
//! let query = embedder.embed("cancelled city hotel bookings").await?;
//! for neighbor in index.search(&query, 3)? {
//!     println!("{} {}", neighbor.distance, index.fragment(neighbor.row).unwrap().text);
//! }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::HotelRagConfig;
use crate::dataset::Snapshot;
use crate::embedding::EmbeddingProvider;
use crate::error::{IndexBuildError, IndexError, bounded};
use crate::fragment::{Fragment, fragments};

/// A search hit: a row index and its squared Euclidean distance to the query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Neighbor {
    /// Index of the matching row (and fragment).
    pub row: usize,
    /// Squared L2 distance; smaller is closer.
    pub distance: f32,
}

/// An immutable k-NN index: fragment `i` ↔ embedding `i` ↔ row `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityIndex {
    dimensions: usize,
    vectors: Vec<f32>,
    fragments: Vec<Fragment>,
}

impl SimilarityIndex {
    /// Describe and embed every row of `snapshot`, then index the vectors.
    ///
    /// Fragments are embedded in batches of `config.embed_batch_size`, each
    /// call bounded by `config.embed_timeout()`.
    ///
    /// # Errors
    ///
    /// - [`IndexBuildError::Embedding`] if the provider fails or times out
    /// - [`IndexBuildError::BatchSize`] if a batch returns the wrong count
    /// - [`IndexBuildError::ZeroDimension`] if the first vector is empty
    /// - [`IndexBuildError::DimensionMismatch`] if any later vector differs
    ///   in length from the first
    pub async fn build(
        snapshot: &Snapshot,
        provider: &dyn EmbeddingProvider,
        config: &HotelRagConfig,
    ) -> Result<Self, IndexBuildError> {
        let fragments = fragments(snapshot);
        let mut builder = IndexBuilder::with_capacity(fragments.len());

        for batch in fragments.chunks(config.embed_batch_size.max(1)) {
            let start = batch[0].row;
            let texts: Vec<&str> = batch.iter().map(|f| f.text.as_str()).collect();
            let embeddings =
                bounded("embedding", config.embed_timeout(), provider.embed_batch(&texts)).await?;

            if embeddings.len() != batch.len() {
                return Err(IndexBuildError::BatchSize {
                    start,
                    expected: batch.len(),
                    actual: embeddings.len(),
                });
            }
            for (fragment, embedding) in batch.iter().zip(embeddings) {
                builder.push(fragment.clone(), &embedding)?;
            }
            debug!(start, batch_size = batch.len(), provider = provider.name(), "embedded batch");
        }

        let index = builder.finish();
        info!(
            rows = index.len(),
            dimensions = index.dimensions,
            provider = provider.name(),
            "built similarity index"
        );
        Ok(index)
    }

    /// Index precomputed embeddings, one per fragment, in order.
    ///
    /// # Errors
    ///
    /// Same dimension checks as [`build`](Self::build).
    pub fn from_embeddings(
        fragments: Vec<Fragment>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self, IndexBuildError> {
        if fragments.len() != embeddings.len() {
            return Err(IndexBuildError::BatchSize {
                start: 0,
                expected: fragments.len(),
                actual: embeddings.len(),
            });
        }
        let mut builder = IndexBuilder::with_capacity(fragments.len());
        for (fragment, embedding) in fragments.into_iter().zip(embeddings) {
            builder.push(fragment, &embedding)?;
        }
        Ok(builder.finish())
    }

    /// Number of indexed rows.
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Embedding dimension; zero for an empty index.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The fragment describing `row`.
    pub fn fragment(&self, row: usize) -> Option<&Fragment> {
        self.fragments.get(row)
    }

    /// The stored vector for `row`.
    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        if row >= self.len() {
            return None;
        }
        let start = row * self.dimensions;
        self.vectors.get(start..start + self.dimensions)
    }

    /// Return up to `k` rows closest to `query`, ascending by squared
    /// Euclidean distance, ties broken by lower row index.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::QueryDimension`] if `query` does not match the
    /// index dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(IndexError::QueryDimension {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let mut scored: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dimensions)
            .enumerate()
            .map(|(row, vector)| Neighbor { row, distance: squared_l2(vector, query) })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.row.cmp(&b.row)));
        scored.truncate(k);
        Ok(scored)
    }
}

/// Append-only accumulator enforcing a single embedding dimension.
struct IndexBuilder {
    dimensions: Option<usize>,
    vectors: Vec<f32>,
    fragments: Vec<Fragment>,
}

impl IndexBuilder {
    fn with_capacity(rows: usize) -> Self {
        Self { dimensions: None, vectors: Vec::new(), fragments: Vec::with_capacity(rows) }
    }

    fn push(&mut self, fragment: Fragment, embedding: &[f32]) -> Result<(), IndexBuildError> {
        let row = self.fragments.len();
        match self.dimensions {
            None if embedding.is_empty() => return Err(IndexBuildError::ZeroDimension),
            None => {
                self.dimensions = Some(embedding.len());
                self.vectors.reserve(embedding.len() * self.fragments.capacity());
            }
            Some(expected) if expected != embedding.len() => {
                return Err(IndexBuildError::DimensionMismatch {
                    row,
                    expected,
                    actual: embedding.len(),
                });
            }
            Some(_) => {}
        }
        self.vectors.extend_from_slice(embedding);
        self.fragments.push(Fragment { row, ..fragment });
        Ok(())
    }

    fn finish(self) -> SimilarityIndex {
        SimilarityIndex {
            dimensions: self.dimensions.unwrap_or(0),
            vectors: self.vectors,
            fragments: self.fragments,
        }
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
