//! Cache-aside read path for model rankings.
//!
//! Rankings are cached without expiry; the simulation pipeline invalidates
//! them whenever the underlying samples change. The pipeline never writes
//! these entries, only this service does.

use std::sync::Arc;

use llmbench_kv::KeyValueStore;
use llmbench_storage::{Catalog, SampleStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::RankingError;
use crate::keys;

/// One model's position in a metric ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedModel {
    pub model_name: String,
    /// Mean of the model's samples, rounded to two decimals.
    pub mean_value: f64,
}

/// Models ordered by descending mean for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRanking {
    pub metric: String,
    pub rankings: Vec<RankedModel>,
}

pub type Result<T> = std::result::Result<T, RankingError>;

/// Serves rankings, computing and caching them on a miss.
pub struct RankingService {
    catalog: Arc<dyn Catalog>,
    samples: Arc<dyn SampleStore>,
    cache: Arc<dyn KeyValueStore>,
}

impl RankingService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        samples: Arc<dyn SampleStore>,
        cache: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            catalog,
            samples,
            cache,
        }
    }

    /// Rankings for every catalog metric, in catalog order.
    #[instrument(skip(self))]
    pub async fn all_rankings(&self) -> Result<Vec<MetricRanking>> {
        if let Some(cached) = self.cache.get(keys::ALL_RANKINGS).await? {
            debug!("rankings served from cache");
            return Ok(serde_json::from_str(&cached)?);
        }

        let mut rankings = Vec::new();
        for metric in self.catalog.list_metrics().await? {
            rankings.push(self.compute(&metric.name).await?);
        }

        self.cache
            .set(keys::ALL_RANKINGS, &serde_json::to_string(&rankings)?, None)
            .await?;
        Ok(rankings)
    }

    /// Rankings for one metric, or `None` if the catalog has no such metric.
    #[instrument(skip(self))]
    pub async fn metric_rankings(&self, metric_name: &str) -> Result<Option<MetricRanking>> {
        let key = keys::metric_rankings(metric_name);
        if let Some(cached) = self.cache.get(&key).await? {
            debug!("rankings served from cache");
            return Ok(Some(serde_json::from_str(&cached)?));
        }

        if self.catalog.get_metric_by_name(metric_name).await?.is_none() {
            return Ok(None);
        }

        let ranking = self.compute(metric_name).await?;
        self.cache
            .set(&key, &serde_json::to_string(&ranking)?, None)
            .await?;
        Ok(Some(ranking))
    }

    async fn compute(&self, metric_name: &str) -> Result<MetricRanking> {
        let rankings = self
            .samples
            .metric_means_by_model(metric_name)
            .await?
            .into_iter()
            .map(|m| RankedModel {
                model_name: m.model_name,
                mean_value: (m.mean_value * 100.0).round() / 100.0,
            })
            .collect();

        Ok(MetricRanking {
            metric: metric_name.to_string(),
            rankings,
        })
    }
}
