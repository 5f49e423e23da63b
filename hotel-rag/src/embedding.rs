//! Embedding capability: turns text into fixed-length vectors.

use async_trait::async_trait;

use crate::error::CapabilityError;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a concrete embedding backend behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially;
/// backends that support native batching should override it. Batches must
/// preserve order: output `i` is the embedding of input `i`.
///
/// # Example
///
/// ```rust,ignore
/// use hotel_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed("Booking from prt for resort hotel").await?;
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError>;

    /// Generate embedding vectors for a batch of text inputs.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, CapabilityError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Short backend name for logs and errors.
    fn name(&self) -> &str;
}
