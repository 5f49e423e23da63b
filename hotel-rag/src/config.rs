//! Configuration for the question-answering pipeline.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which context goes into the generation prompt when no intent matches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextPolicy {
    /// Only the dataset insights.
    InsightsOnly,
    /// Only the top-k retrieved booking fragments. Falls back to insights
    /// when nothing can be retrieved.
    FragmentsOnly,
    /// Insights followed by the retrieved fragments.
    #[default]
    InsightsAndFragments,
}

impl ContextPolicy {
    /// Whether this policy asks for retrieval at all.
    pub fn wants_fragments(self) -> bool {
        !matches!(self, Self::InsightsOnly)
    }
}

/// Configuration parameters for the answering pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HotelRagConfig {
    /// Number of fragments retrieved for the generation prompt.
    pub top_k: usize,
    /// How insights and retrieved fragments are combined in the prompt.
    pub context_policy: ContextPolicy,
    /// Number of fragments sent per embedding call while building the index.
    pub embed_batch_size: usize,
    /// Upper bound for a single embedding call, in seconds.
    pub embed_timeout_secs: u64,
    /// Upper bound for a single generation call, in seconds.
    pub generate_timeout_secs: u64,
}

impl Default for HotelRagConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            context_policy: ContextPolicy::default(),
            embed_batch_size: 32,
            embed_timeout_secs: 30,
            generate_timeout_secs: 120,
        }
    }
}

impl HotelRagConfig {
    /// Create a new builder for constructing a [`HotelRagConfig`].
    pub fn builder() -> HotelRagConfigBuilder {
        HotelRagConfigBuilder::default()
    }

    /// Read and validate a JSON configuration file. Missing fields take
    /// their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Embedding call bound.
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }

    /// Generation call bound.
    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }

    /// Check that all parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if any count or timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be greater than zero".to_string()));
        }
        if self.embed_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "embed_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.embed_timeout_secs == 0 || self.generate_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`HotelRagConfig`].
#[derive(Debug, Clone, Default)]
pub struct HotelRagConfigBuilder {
    config: HotelRagConfig,
}

impl HotelRagConfigBuilder {
    /// Start from an existing configuration, e.g. one read from a file.
    pub fn from_config(config: HotelRagConfig) -> Self {
        Self { config }
    }

    /// Set the number of fragments retrieved for generation.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set how prompt context is assembled.
    pub fn context_policy(mut self, policy: ContextPolicy) -> Self {
        self.config.context_policy = policy;
        self
    }

    /// Set the embedding batch size used during index construction.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Set the embedding timeout.
    pub fn embed_timeout(mut self, timeout: Duration) -> Self {
        self.config.embed_timeout_secs = timeout.as_secs();
        self
    }

    /// Set the generation timeout.
    pub fn generate_timeout(mut self, timeout: Duration) -> Self {
        self.config.generate_timeout_secs = timeout.as_secs();
        self
    }

    /// Build the [`HotelRagConfig`], validating that parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if:
    /// - `top_k == 0`
    /// - `embed_batch_size == 0`
    /// - either timeout is shorter than one second
    pub fn build(self) -> Result<HotelRagConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = HotelRagConfig::builder().build().unwrap();
        assert_eq!(config, HotelRagConfig::default());
        assert_eq!(config.context_policy, ContextPolicy::InsightsAndFragments);
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let err = HotelRagConfig::builder().top_k(0).build().unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn sub_second_timeout_is_rejected() {
        let result =
            HotelRagConfig::builder().generate_timeout(Duration::from_millis(500)).build();
        assert!(result.is_err());
    }

    #[test]
    fn json_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "top_k": 5, "context_policy": "insights_only" }"#).unwrap();

        let config = HotelRagConfig::from_json_file(&path).unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.context_policy, ContextPolicy::InsightsOnly);
        assert_eq!(config.embed_batch_size, 32);
    }

    #[test]
    fn invalid_json_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(HotelRagConfig::from_json_file(&path), Err(ConfigError::Parse(_))));
    }
}
