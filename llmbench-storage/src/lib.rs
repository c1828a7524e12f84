//! Persistence for the llmbench model catalog and simulated samples.
//!
//! The simulation pipeline reads the catalog and replaces samples; the
//! ranking read path aggregates samples into per-metric means. Both sides
//! talk to the traits below, so the pipeline can be driven against any
//! backing store.
//!
//! The Turso implementation stores data in libSQL (local file, in-memory
//! or remote database).

mod error;
mod seed;
mod turso;
mod types;

pub use error::{Error, Result};
pub use seed::{DEFAULT_METRICS, DEFAULT_MODELS, SeedReport};
pub use turso::TursoBenchmarkStorage;
pub use types::{Metric, MetricId, MetricMean, Model, ModelId};

use async_trait::async_trait;

/// Read-only access to the model and metric catalogs.
///
/// Both listings come back in catalog (insertion) order, which is the order
/// the pipeline walks its work set in.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// List every model.
    async fn list_models(&self) -> Result<Vec<Model>>;

    /// List every metric.
    async fn list_metrics(&self) -> Result<Vec<Metric>>;

    /// Look up a metric by its name.
    async fn get_metric_by_name(&self, name: &str) -> Result<Option<Metric>>;
}

/// Storage for simulated benchmark samples.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Remove every stored sample. Idempotent.
    async fn delete_all_samples(&self) -> Result<()>;

    /// Store a series for one (model, metric) pair.
    ///
    /// The series is written atomically: either every value is stored or
    /// none is. Returns the number of values written.
    async fn bulk_insert_samples(
        &self,
        model_id: ModelId,
        metric_id: MetricId,
        values: &[f64],
    ) -> Result<usize>;

    /// Mean sample value per model for one metric, highest mean first.
    async fn metric_means_by_model(&self, metric_name: &str) -> Result<Vec<MetricMean>>;
}
