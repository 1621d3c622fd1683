use anyhow::{Context, Result};
use clap::Parser;
use salescan::watcher::{self, WatcherConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "salescan")]
#[command(about = "Watches a directory for flat sales data files and writes per-file summaries")]
#[command(version)]
struct Args {
    /// Directory to watch for incoming .dat files
    input_dir: PathBuf,

    /// Directory where .done.dat summary files are written
    output_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // WHY: structured JSON logging enables observability and debugging in production
    tracing_subscriber::fmt()
        .with_target(false)
        .json()
        .init();

    let args = Args::parse();

    info!("Starting salescan");
    info!(?args, "Parsed CLI arguments");

    // Bootstrap both directories so a fresh deployment can start from an
    // empty filesystem.
    tokio::fs::create_dir_all(&args.input_dir)
        .await
        .with_context(|| format!("failed to create input directory {}", args.input_dir.display()))?;
    tokio::fs::create_dir_all(&args.output_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create output directory {}",
                args.output_dir.display()
            )
        })?;

    info!("Directory setup completed successfully");

    watcher::run(&args.input_dir, &args.output_dir, WatcherConfig::default()).await
}
