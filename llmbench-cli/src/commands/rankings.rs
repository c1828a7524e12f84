//! Ranking queries through the cached read path.

use anyhow::{Result, bail};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use llmbench_core::{MetricRanking, RankingService};

use crate::backend::{open_cache, open_storage};
use crate::config::AppConfig;

/// Arguments for the rankings command
#[derive(Debug, Args)]
pub struct RankingsArgs {
    /// Only show one metric
    #[arg(short, long)]
    pub metric: Option<String>,

    /// Print JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

/// Run the rankings command
pub async fn run(config: AppConfig, args: RankingsArgs) -> Result<()> {
    let storage = open_storage(&config.database).await?;
    let cache = open_cache(&config.database).await?;
    let service = RankingService::new(storage.clone(), storage, cache);

    let rankings = match &args.metric {
        Some(name) => match service.metric_rankings(name).await? {
            Some(ranking) => vec![ranking],
            None => bail!("unknown metric: {name}"),
        },
        None => service.all_rankings().await?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rankings)?);
    } else {
        for ranking in &rankings {
            println!("{}\n{}\n", ranking.metric, render(ranking));
        }
    }
    Ok(())
}

fn render(ranking: &MetricRanking) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Rank").fg(Color::Cyan),
        Cell::new("Model").fg(Color::Cyan),
        Cell::new("Mean").fg(Color::Cyan),
    ]);

    for (rank, entry) in ranking.rankings.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&entry.model_name),
            Cell::new(format!("{:.2}", entry.mean_value)),
        ]);
    }
    table
}
