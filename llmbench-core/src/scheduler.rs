//! Periodic execution of the simulation pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::ConfigError;
use crate::pipeline::SimulationPipeline;

/// How a scheduler shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStatus {
    /// The loop exited within the grace period.
    Clean,
    /// The loop overran the grace period or panicked, and was aborted.
    Unclean,
}

/// Runs the pipeline once at startup and then on a fixed interval.
pub struct Scheduler;

impl Scheduler {
    /// Spawn the scheduling loop on the current runtime.
    ///
    /// Runs never overlap: a run is awaited inline and ticks missed while it
    /// was running are skipped. Cancellation is only observed between runs.
    /// A zero `interval` is rejected.
    pub fn spawn(
        pipeline: Arc<SimulationPipeline>,
        interval: Duration,
    ) -> Result<SchedulerHandle, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "schedule_interval",
                value: format!("{interval:?}"),
                reason: "interval must be positive".to_string(),
            });
        }

        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let runner = pipeline.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_secs = interval.as_secs(), "scheduler started");

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let outcome = runner.run_once().await;
                debug!(?outcome, "scheduled run finished");
            }

            info!("scheduler stopped");
        });

        Ok(SchedulerHandle {
            shutdown,
            task,
            pipeline,
        })
    }
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    shutdown: CancellationToken,
    task: JoinHandle<()>,
    pipeline: Arc<SimulationPipeline>,
}

impl SchedulerHandle {
    /// Whether the scheduling loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop scheduling new runs and wait up to `grace` for an in-flight run.
    ///
    /// On timeout the task is aborted and awaited, then any lock the
    /// interrupted run still holds is released before this returns.
    pub async fn shutdown(self, grace: Duration) -> ShutdownStatus {
        self.shutdown.cancel();
        let mut task = self.task;

        let waited = tokio::time::timeout(grace, &mut task).await;
        let status = match waited {
            Ok(Ok(())) => {
                info!("scheduler shut down cleanly");
                ShutdownStatus::Clean
            }
            Ok(Err(e)) => {
                error!(error = %e, "scheduler task failed");
                ShutdownStatus::Unclean
            }
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "scheduler did not shut down cleanly, aborting"
                );
                task.abort();
                match task.await {
                    Err(e) if !e.is_cancelled() => {
                        error!(error = %e, "scheduler task failed while aborting");
                    }
                    _ => {}
                }
                ShutdownStatus::Unclean
            }
        };

        if status == ShutdownStatus::Unclean && self.pipeline.release_held_lock().await {
            info!("released lock held by the interrupted run");
        }
        status
    }
}
