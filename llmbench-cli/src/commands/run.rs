//! One-shot pipeline run.

use anyhow::{Result, bail};
use llmbench_core::{RunOutcome, SimulationPipeline};

use crate::backend::{open_cache, open_storage};
use crate::config::AppConfig;

/// Run the pipeline once and report what it did
pub async fn run(config: AppConfig) -> Result<()> {
    let storage = open_storage(&config.database).await?;
    let cache = open_cache(&config.database).await?;

    let pipeline = SimulationPipeline::new(&config.simulator, storage.clone(), storage, cache);

    match pipeline.run_once().await {
        RunOutcome::Completed(report) => {
            println!(
                "Run complete: {} series regenerated, {} abandoned",
                report.succeeded.len(),
                report.abandoned.len()
            );
            for item in &report.abandoned {
                println!("  abandoned: {} / {}", item.model_name, item.metric_name);
            }
            Ok(())
        }
        RunOutcome::LockUnavailable => {
            println!("Another instance holds the pipeline lock, run skipped");
            Ok(())
        }
        RunOutcome::Failed(reason) => bail!("run failed: {reason}"),
    }
}
