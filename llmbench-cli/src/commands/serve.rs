//! Long-running scheduler service.
//!
//! Seeds the catalog, runs the pipeline once at startup and then on the
//! configured interval, and shuts down gracefully on Ctrl-C.

use std::sync::Arc;

use anyhow::Result;
use llmbench_core::{Scheduler, ShutdownStatus, SimulationPipeline};
use tracing::{info, warn};

use crate::backend::{open_cache, open_storage};
use crate::config::AppConfig;

/// Run the serve command
pub async fn run(config: AppConfig) -> Result<()> {
    let storage = open_storage(&config.database).await?;
    let cache = open_cache(&config.database).await?;
    storage.seed_defaults().await?;

    let pipeline = Arc::new(SimulationPipeline::new(
        &config.simulator,
        storage.clone(),
        storage,
        cache,
    ));

    info!(
        interval_secs = config.simulator.schedule_interval.as_secs(),
        "starting llmbench scheduler"
    );
    let handle = Scheduler::spawn(pipeline, config.simulator.schedule_interval)?;

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    match handle.shutdown(config.simulator.shutdown_grace).await {
        ShutdownStatus::Clean => info!("scheduler shutdown complete"),
        ShutdownStatus::Unclean => warn!("scheduler did not shut down cleanly"),
    }
    Ok(())
}
