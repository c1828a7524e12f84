//! The simulation pipeline: one run regenerates every (model, metric) series.
//!
//! A run walks these states:
//!
//! ```text
//! Idle ─▶ AcquiringLock ─▶ Running ─▶ Invalidating ─▶ Idle
//!               │              │
//!               └──▶ Failed ◀──┘ ─▶ Idle
//! ```
//!
//! Inside `Running` the previous samples are wiped, then every work item is
//! generated under the retry coordinator. A successful item is written,
//! its retry counter cleared and its metric's cached rankings invalidated,
//! in that order, before the next item starts. An empty series is stored
//! nowhere and counts as abandoned. Once every item has been
//! attempted the global rankings entry is invalidated. The lock is released
//! on every exit path.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use llmbench_kv::KeyValueStore;
use llmbench_storage::{Catalog, Metric, MetricId, Model, ModelId, SampleStore};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use crate::cache::CacheInvalidator;
use crate::config::SimulatorConfig;
use crate::error::{LockError, PipelineError};
use crate::generator::SampleGenerator;
use crate::keys;
use crate::lock::{Lock, LockGateway};
use crate::retry::{RetryCoordinator, RetryPolicy};

/// Where the pipeline currently is in its run cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    AcquiringLock,
    Running,
    Invalidating,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AcquiringLock => write!(f, "acquiring_lock"),
            Self::Running => write!(f, "running"),
            Self::Invalidating => write!(f, "invalidating"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One (model, metric) pair to regenerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub model_id: ModelId,
    pub model_name: String,
    pub company_key: String,
    pub metric_id: MetricId,
    pub metric_name: String,
}

impl WorkItem {
    pub fn new(model: &Model, metric: &Metric) -> Self {
        Self {
            model_id: model.id,
            model_name: model.name.clone(),
            company_key: model.company_key.clone(),
            metric_id: metric.id,
            metric_name: metric.name.clone(),
        }
    }

    /// Store key of this item's attempt counter.
    pub fn retry_key(&self) -> String {
        keys::retry(&self.model_name, &self.metric_name)
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Items whose series were replaced.
    pub succeeded: Vec<WorkItem>,
    /// Items that exhausted their retries and now have no samples.
    pub abandoned: Vec<WorkItem>,
}

/// Result of one run attempt. Runs never return errors to their caller;
/// failures are logged and reported here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every work item was attempted.
    Completed(RunReport),
    /// Another holder kept the pipeline lock; nothing was touched.
    LockUnavailable,
    /// The run aborted.
    Failed(String),
}

/// Regenerates samples for the full model × metric work set.
pub struct SimulationPipeline {
    catalog: Arc<dyn Catalog>,
    samples: Arc<dyn SampleStore>,
    store: Arc<dyn KeyValueStore>,
    generator: SampleGenerator,
    retry: RetryCoordinator,
    locks: LockGateway,
    cache: CacheInvalidator,
    lock_timeout: Duration,
    lock_blocking_timeout: Duration,
    state: RwLock<PipelineState>,
    /// The lock taken by the run in flight, for release after a cancelled run.
    held: Mutex<Option<Lock>>,
}

impl SimulationPipeline {
    /// Build a pipeline over the given collaborators.
    ///
    /// `store` holds retry counters, the pipeline lock and cached rankings.
    pub fn new(
        config: &SimulatorConfig,
        catalog: Arc<dyn Catalog>,
        samples: Arc<dyn SampleStore>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let generator = SampleGenerator::new()
            .with_seed(config.seed.clone())
            .with_count(config.sample_count);
        let policy = RetryPolicy::new(config.max_retries, config.retry_delay);

        Self {
            catalog,
            samples,
            generator,
            retry: RetryCoordinator::new(store.clone(), policy),
            locks: LockGateway::new(store.clone()),
            cache: CacheInvalidator::new(store.clone()),
            store,
            lock_timeout: config.lock_timeout(),
            lock_blocking_timeout: config.lock_blocking_timeout,
            state: RwLock::new(PipelineState::Idle),
            held: Mutex::new(None),
        }
    }

    /// Replace the sample generator.
    #[must_use]
    pub fn with_generator(mut self, generator: SampleGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Current state of the run cycle.
    pub async fn state(&self) -> PipelineState {
        *self.state.read().await
    }

    async fn set_state(&self, state: PipelineState) {
        debug!(%state, "pipeline state");
        *self.state.write().await = state;
    }

    /// Execute one run: acquire the lock, regenerate everything, release.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> RunOutcome {
        self.set_state(PipelineState::AcquiringLock).await;

        let acquired = self
            .locks
            .acquire(
                keys::PIPELINE_LOCK,
                self.lock_timeout,
                self.lock_blocking_timeout,
            )
            .await;
        let mut guard = match acquired {
            Ok(guard) => guard,
            Err(e) => {
                self.set_state(PipelineState::Failed).await;
                let outcome = match e {
                    LockError::Timeout { .. } => {
                        warn!(error = %e, "pipeline lock unavailable, skipping run");
                        RunOutcome::LockUnavailable
                    }
                    LockError::Store(_) => {
                        error!(error = %e, "pipeline lock error");
                        RunOutcome::Failed(e.to_string())
                    }
                };
                self.set_state(PipelineState::Idle).await;
                return outcome;
            }
        };

        *self.held.lock().await = guard.lock().cloned();

        self.set_state(PipelineState::Running).await;
        let result = self.simulate().await;
        guard.release().await;
        self.held.lock().await.take();

        let outcome = match result {
            Ok(report) => {
                info!(
                    succeeded = report.succeeded.len(),
                    abandoned = report.abandoned.len(),
                    "simulation run complete"
                );
                RunOutcome::Completed(report)
            }
            Err(e) => {
                self.set_state(PipelineState::Failed).await;
                error!(error = %e, "simulation run failed");
                RunOutcome::Failed(e.to_string())
            }
        };
        self.set_state(PipelineState::Idle).await;
        outcome
    }

    /// Release the lock of a run that was cancelled mid-flight.
    ///
    /// Returns `true` if a held lock was removed. A no-op once the run has
    /// released it itself.
    pub async fn release_held_lock(&self) -> bool {
        let Some(lock) = self.held.lock().await.take() else {
            return false;
        };
        self.locks.release(&lock).await
    }

    async fn simulate(&self) -> Result<RunReport, PipelineError> {
        let models = self
            .catalog
            .list_models()
            .await
            .map_err(PipelineError::Catalog)?;
        let metrics = self
            .catalog
            .list_metrics()
            .await
            .map_err(PipelineError::Catalog)?;

        self.samples
            .delete_all_samples()
            .await
            .map_err(PipelineError::Persistence)?;
        info!(
            models = models.len(),
            metrics = metrics.len(),
            "cleared samples, regenerating"
        );

        let mut report = RunReport::default();
        for model in &models {
            for metric in &metrics {
                let item = WorkItem::new(model, metric);
                if self.process_item(&item).await? {
                    report.succeeded.push(item);
                } else {
                    report.abandoned.push(item);
                }
            }
        }

        self.set_state(PipelineState::Invalidating).await;
        self.cache
            .invalidate_all_rankings()
            .await
            .map_err(PipelineError::Cache)?;

        Ok(report)
    }

    /// Generate and store one item. Returns `false` if it was abandoned.
    async fn process_item(&self, item: &WorkItem) -> Result<bool, PipelineError> {
        let retry_key = item.retry_key();

        let generated = self
            .retry
            .run(&retry_key, || {
                std::future::ready(self.generator.generate_for(
                    &item.company_key,
                    &item.model_name,
                    &item.metric_name,
                ))
            })
            .await
            .map_err(PipelineError::RetryState)?;

        let Some(values) = generated else {
            return Ok(false);
        };
        if values.is_empty() {
            warn!(
                model = %item.model_name,
                metric = %item.metric_name,
                "generator produced an empty series, nothing stored"
            );
            return Ok(false);
        }

        let written = self
            .samples
            .bulk_insert_samples(item.model_id, item.metric_id, &values)
            .await
            .map_err(PipelineError::Persistence)?;
        self.store
            .delete(&retry_key)
            .await
            .map_err(PipelineError::RetryState)?;
        self.cache
            .invalidate_metric(&item.metric_name)
            .await
            .map_err(PipelineError::Cache)?;

        debug!(
            model = %item.model_name,
            metric = %item.metric_name,
            written,
            "work item stored"
        );
        Ok(true)
    }
}
