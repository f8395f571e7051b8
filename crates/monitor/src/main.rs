//! Drowsiness Monitor - Main Entry Point

use clap::Parser;
use monitor::{init_logging, install_metrics, run, JsonLinesSource, MonitorConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "drowsiness-monitor", version, about = "Sustained eye closure alarm")]
struct Args {
    /// Configuration file (TOML); defaults to ./drowsiness.toml if present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Frame input (JSON lines); reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Actuator serial port, overrides the configuration
    #[arg(short, long)]
    port: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = MonitorConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.actuator.port = Some(port);
    }

    init_logging(&config.logging)?;
    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    install_metrics(config.metrics_addr)?;

    match args.input {
        Some(path) => run(config, JsonLinesSource::open(&path).await?).await?,
        None => run(config, JsonLinesSource::stdin()).await?,
    };

    Ok(())
}
