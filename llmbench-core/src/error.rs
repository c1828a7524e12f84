//! Error types for the simulation pipeline.

use std::time::Duration;

use thiserror::Error;

/// A single (model, metric) series could not be generated.
///
/// Generation failures are contained per work item: the retry coordinator
/// retries them and eventually abandons the item.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The metric has no configured range.
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    /// The model's company key does not map to a known provider.
    #[error("unknown model kind: {0}")]
    UnknownModelKind(String),

    /// The requested bounds are not a finite, ordered interval.
    #[error("invalid range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },
}

/// The pipeline lock could not be obtained.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another holder kept the lock for the whole blocking window.
    #[error("timed out after {waited:?} waiting for lock {key}")]
    Timeout { key: String, waited: Duration },

    /// The backing store failed while acquiring.
    #[error("lock store error: {0}")]
    Store(#[from] llmbench_kv::Error),
}

/// A failure that aborts one pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The model or metric catalog could not be read.
    #[error("failed to read catalog: {0}")]
    Catalog(#[source] llmbench_storage::Error),

    /// Samples could not be deleted or written.
    #[error("failed to persist samples: {0}")]
    Persistence(#[source] llmbench_storage::Error),

    /// A cache entry could not be invalidated.
    #[error("failed to invalidate cache: {0}")]
    Cache(#[source] llmbench_kv::Error),

    /// Retry state could not be read or written.
    #[error("failed to update retry state: {0}")]
    RetryState(#[source] llmbench_kv::Error),
}

/// Errors raised by the read-side ranking service.
#[derive(Debug, Error)]
pub enum RankingError {
    #[error("storage error: {0}")]
    Storage(#[from] llmbench_storage::Error),

    #[error("cache error: {0}")]
    Cache(#[from] llmbench_kv::Error),

    #[error("malformed cache entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A configuration value could not be parsed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
