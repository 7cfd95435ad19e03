//! evotune - online evolutionary parameter tuning over HTTP.

use anyhow::Result;
use clap::Parser;
use evotune_core::TunerConfig;
use evotune_server::Server;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "evotune")]
#[command(about = "Online evolutionary parameter tuning over HTTP", long_about = None)]
struct Cli {
    /// The configuration file
    #[arg(short, long, default_value = "config.json")]
    config: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = TunerConfig::from_file(&cli.config)?;
    info!(
        "config: id={} port={} params={} duration={}",
        config.id,
        config.server,
        config.initial_data.len(),
        config.generation_duration
    );

    Server::new(config).run().await
}
