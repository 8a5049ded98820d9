use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use starmig_core::config::WarehouseConfig;
use starmig_core::warehouse::{all_builders, Warehouse};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Star-schema immigration warehouse pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and publish every warehouse table
    Run(RunArgs),
    /// List the registered table builders in execution order
    Tables,
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Path to a starmig.toml configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the configured source root
    #[arg(long)]
    source_root: Option<String>,
    /// Override the configured destination root
    #[arg(long)]
    destination_root: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args).await,
        Command::Tables => {
            for builder in all_builders() {
                println!("{}", builder.table_name());
            }
            Ok(())
        }
    }
}

async fn handle_run(args: RunArgs) -> Result<()> {
    dotenvy::dotenv().ok();

    let mut config = match &args.config {
        Some(path) => WarehouseConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => WarehouseConfig::from_env().context(
            "STARMIG_SOURCE_ROOT and STARMIG_DESTINATION_ROOT must be set when no --config is given",
        )?,
    };

    if let Some(source_root) = args.source_root {
        config.source_root = source_root;
    }
    if let Some(destination_root) = args.destination_root {
        config.destination_root = destination_root;
    }

    let warehouse = Warehouse::bootstrap(config).await?;
    warehouse.run().await?;

    info!("warehouse run complete");
    Ok(())
}
