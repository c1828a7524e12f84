//! Catalog and aggregate types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a language model in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(pub Uuid);

impl ModelId {
    /// Create a new model ID with a UUIDv7 (time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a benchmark metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricId(pub Uuid);

impl MetricId {
    /// Create a new metric ID with a UUIDv7 (time-ordered).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MetricId {
    fn default() -> Self {
        Self::new()
    }
}

/// A language model whose performance is simulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    /// Display name, unique across the catalog.
    pub name: String,
    /// Provider key, e.g. `openai`.
    pub company_key: String,
}

/// A benchmark metric such as `ttft`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub id: MetricId,
    pub name: String,
}

/// Mean sample value of one model for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricMean {
    pub model_name: String,
    pub mean_value: f64,
}
