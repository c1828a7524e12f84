use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod backend;
mod commands;
mod config;

#[derive(Parser)]
#[command(name = "llmbench", about = "Scheduled LLM benchmark simulation")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation scheduler until interrupted
    Serve,
    /// Execute a single simulation run
    Run,
    /// Show model rankings
    Rankings(commands::rankings::RankingsArgs),
    /// Seed the default model and metric catalog
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // Logs go to stderr so command output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::ConfigLoader::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => commands::serve::run(config).await,
        Commands::Run => commands::run::run(config).await,
        Commands::Rankings(args) => commands::rankings::run(config, args).await,
        Commands::Seed => commands::seed::run(config).await,
    }
}
