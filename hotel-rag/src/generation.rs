//! Generation capability: turns a prompt into free text.

use async_trait::async_trait;

use crate::error::CapabilityError;

/// A text generator, typically a remote LLM.
///
/// Treated as a black box: the orchestrator captures the output verbatim and
/// performs no retries. Retry or backoff, if wanted, belongs in the
/// implementation's own transport.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, CapabilityError>;

    /// Short backend or model name for logs and errors.
    fn name(&self) -> &str;
}
