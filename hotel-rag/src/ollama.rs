//! Ollama-backed embedding and generation capabilities.
//!
//! This module is only available when the `ollama` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::CapabilityError;
use crate::generation::Generator;

/// The default Ollama server address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "mistral";

/// The default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

const PROVIDER: &str = "Ollama";

/// Resolve the server address from `OLLAMA_HOST`, falling back to
/// [`DEFAULT_BASE_URL`]. A bare `host:port` gets an `http://` scheme.
pub fn base_url_from_env() -> String {
    match std::env::var("OLLAMA_HOST") {
        Ok(host) if !host.trim().is_empty() => normalize_base_url(&host),
        _ => DEFAULT_BASE_URL.to_string(),
    }
}

fn normalize_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

fn provider_error(message: impl Into<String>) -> CapabilityError {
    CapabilityError::Provider { provider: PROVIDER.into(), message: message.into() }
}

/// POST `body` to `{base_url}{path}` and decode a JSON response, mapping
/// transport, status and decoding failures to [`CapabilityError`].
async fn post_json<B, R>(
    client: &reqwest::Client,
    base_url: &str,
    path: &str,
    body: &B,
) -> Result<R, CapabilityError>
where
    B: Serialize + ?Sized,
    R: for<'de> Deserialize<'de>,
{
    let url = format!("{base_url}{path}");
    let response = client.post(&url).json(body).send().await.map_err(|e| {
        error!(provider = PROVIDER, %url, error = %e, "request failed");
        provider_error(format!("request failed: {e}"))
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);

        error!(provider = PROVIDER, %status, "API error");
        return Err(provider_error(format!("API returned {status}: {detail}")));
    }

    response.json().await.map_err(|e| {
        error!(provider = PROVIDER, error = %e, "failed to parse response");
        provider_error(format!("failed to parse response: {e}"))
    })
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// An [`EmbeddingProvider`] backed by Ollama's `/api/embed` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use hotel_rag::ollama::OllamaEmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::from_env().with_model("all-minilm");
/// let embedding = provider.embed("Booking from prt for resort hotel").await?;
/// ```
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbeddingProvider {
    /// Create a provider for the server at `base_url`.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(base_url.as_ref()),
            model: DEFAULT_EMBEDDING_MODEL.into(),
        }
    }

    /// Create a provider using `OLLAMA_HOST` or the default address.
    pub fn from_env() -> Self {
        Self::new(base_url_from_env())
    }

    /// Set the embedding model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CapabilityError> {
        debug!(provider = PROVIDER, text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| CapabilityError::EmptyResponse { provider: PROVIDER.into() })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, CapabilityError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.model,
            "embedding batch"
        );

        let request = EmbedRequest { model: &self.model, input: texts.to_vec() };
        let response: EmbedResponse =
            post_json(&self.client, &self.base_url, "/api/embed", &request).await?;
        Ok(response.embeddings)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// A [`Generator`] backed by Ollama's non-streaming `/api/generate` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    /// Create a generator for the server at `base_url`, using `mistral`.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(base_url.as_ref()),
            model: DEFAULT_GENERATION_MODEL.into(),
        }
    }

    /// Create a generator using `OLLAMA_HOST` or the default address.
    pub fn from_env() -> Self {
        Self::new(base_url_from_env())
    }

    /// Set the generation model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, CapabilityError> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "generating");

        let request = GenerateRequest { model: &self.model, prompt, stream: false };
        let response: GenerateResponse =
            post_json(&self.client, &self.base_url, "/api/generate", &request).await?;
        Ok(response.response)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
