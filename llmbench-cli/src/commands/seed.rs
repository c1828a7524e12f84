//! Catalog seeding.

use anyhow::Result;

use crate::backend::open_storage;
use crate::config::AppConfig;

/// Insert the default catalog where tables are empty
pub async fn run(config: AppConfig) -> Result<()> {
    let storage = open_storage(&config.database).await?;
    let report = storage.seed_defaults().await?;

    println!(
        "Seeded {} models and {} metrics",
        report.models_inserted, report.metrics_inserted
    );
    Ok(())
}
