//! Scheduled benchmark simulation for llmbench.
//!
//! On a fixed interval the pipeline regenerates a synthetic sample series
//! for every (model, metric) pair in the catalog, then invalidates the
//! cached rankings that depended on the old samples. Runs are serialized
//! across instances by a distributed lock, and each work item is retried
//! with a fixed delay using an attempt counter kept in the shared store.
//!
//! # Key Types
//!
//! - [`SimulationPipeline`] - One run over the full work set
//! - [`Scheduler`] - Startup run plus periodic runs, with graceful shutdown
//! - [`SampleGenerator`] - Bounded, optionally seeded sample series
//! - [`RetryCoordinator`] - Fixed-delay retry with persisted attempt counts
//! - [`LockGateway`] - Token-guarded distributed lock
//! - [`RankingService`] - Cache-aside ranking reads
//! - [`SimulatorConfig`] - Retry, schedule, seed and lock settings

pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod keys;
pub mod lock;
pub mod pipeline;
pub mod rankings;
pub mod retry;
pub mod scheduler;

// Re-exports
pub use cache::CacheInvalidator;
pub use config::SimulatorConfig;
pub use error::{ConfigError, GenerationError, LockError, PipelineError, RankingError};
pub use generator::{MetricKind, MetricRange, ModelKind, RangeTable, SampleGenerator, derive_seed};
pub use lock::{Lock, LockGateway, LockGuard};
pub use pipeline::{PipelineState, RunOutcome, RunReport, SimulationPipeline, WorkItem};
pub use rankings::{MetricRanking, RankedModel, RankingService};
pub use retry::{RetryCoordinator, RetryPolicy};
pub use scheduler::{Scheduler, SchedulerHandle, ShutdownStatus};
