//! Error types for the `hotel-rag` crate.
//!
//! Startup errors ([`LoadError`], [`IndexBuildError`], [`ConfigError`]) keep
//! the system from becoming ready. Per-question errors ([`CapabilityError`],
//! [`IndexError`]) are always converted into an error
//! [`Answer`](crate::answer::Answer) by the orchestrator.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The dataset could not be loaded. No partial snapshot is ever exposed.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The dataset file could not be opened or read.
    #[error("failed to read dataset {path}: {source}")]
    Io {
        /// The path that was being read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The content is not parseable as CSV.
    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    /// The dataset has no header columns.
    #[error("dataset has no columns")]
    Empty,

    /// An arrival date cell could not be parsed.
    #[error("invalid arrival date '{value}' at row {row}")]
    InvalidDate {
        /// Zero-based data row index.
        row: usize,
        /// The raw cell value.
        value: String,
    },
}

/// The similarity index could not be built.
#[derive(Debug, Error)]
pub enum IndexBuildError {
    /// The embedding capability failed while embedding row fragments.
    #[error("embedding failed while building index: {0}")]
    Embedding(#[from] CapabilityError),

    /// A row produced an embedding whose length differs from the first one.
    #[error("embedding dimension mismatch at row {row}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The offending row index.
        row: usize,
        /// Dimension fixed by the first embedding.
        expected: usize,
        /// Dimension of the offending embedding.
        actual: usize,
    },

    /// The first embedding was empty.
    #[error("embedding capability returned a zero-dimension vector")]
    ZeroDimension,

    /// A batch call returned a different number of vectors than inputs.
    #[error("embedding batch starting at row {start} returned {actual} vectors for {expected} inputs")]
    BatchSize {
        /// First row index of the batch.
        start: usize,
        /// Number of fragments sent.
        expected: usize,
        /// Number of vectors received.
        actual: usize,
    },
}

/// A query against a built index was invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    /// The query vector has a different dimension than the indexed vectors.
    #[error("query dimension {actual} does not match index dimension {expected}")]
    QueryDimension {
        /// Index dimension.
        expected: usize,
        /// Query dimension.
        actual: usize,
    },
}

/// An embedding or generation capability failed.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The backend reported an error or was unreachable.
    #[error("{provider} error: {message}")]
    Provider {
        /// Name of the backend.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The call did not finish within the configured bound.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Which capability call timed out.
        operation: &'static str,
        /// The configured bound.
        after: Duration,
    },

    /// The backend answered with nothing usable.
    #[error("{provider} returned an empty response")]
    EmptyResponse {
        /// Name of the backend.
        provider: String,
    },
}

/// Configuration validation or loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting has an invalid value.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// The configuration path.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`HotelRagConfig`](crate::config::HotelRagConfig).
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Umbrella error for fallible startup paths.
#[derive(Debug, Error)]
pub enum HotelRagError {
    /// Dataset loading failed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Index construction failed.
    #[error(transparent)]
    IndexBuild(#[from] IndexBuildError),

    /// Configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A convenience result type for `hotel-rag` operations.
pub type Result<T> = std::result::Result<T, HotelRagError>;

/// Bound a capability call by `after`, mapping expiry to
/// [`CapabilityError::Timeout`].
pub(crate) async fn bounded<T, F>(
    operation: &'static str,
    after: Duration,
    call: F,
) -> std::result::Result<T, CapabilityError>
where
    F: std::future::Future<Output = std::result::Result<T, CapabilityError>>,
{
    tokio::time::timeout(after, call)
        .await
        .map_err(|_| CapabilityError::Timeout { operation, after })?
}
