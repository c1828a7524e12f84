//! Invalidation of cached ranking results.

use std::sync::Arc;

use llmbench_kv::KeyValueStore;
use tracing::debug;

use crate::keys;

/// Deletes cached ranking entries so the read path recomputes them.
#[derive(Clone)]
pub struct CacheInvalidator {
    store: Arc<dyn KeyValueStore>,
}

impl CacheInvalidator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Delete `key` if present. Returns `true` if an entry was removed;
    /// a missing key is not an error.
    pub async fn invalidate(&self, key: &str) -> llmbench_kv::Result<bool> {
        let removed = self.store.delete(key).await?;
        if removed {
            debug!(key, "cache entry invalidated");
        }
        Ok(removed)
    }

    /// Invalidate the cached rankings of one metric.
    pub async fn invalidate_metric(&self, metric_name: &str) -> llmbench_kv::Result<bool> {
        self.invalidate(&keys::metric_rankings(metric_name)).await
    }

    /// Invalidate the cached rankings across all metrics.
    pub async fn invalidate_all_rankings(&self) -> llmbench_kv::Result<bool> {
        self.invalidate(keys::ALL_RANKINGS).await
    }
}
