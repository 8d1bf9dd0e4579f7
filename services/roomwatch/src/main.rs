//! Roomwatch CLI
//!
//! Command-line interface for the live room monitoring and notification
//! service.

use std::path::PathBuf;

use clap::Parser;
use roomwatch::load_config;
use tracing::Level;

#[derive(Parser)]
#[command(name = "roomwatch")]
#[command(about = "Live room monitoring and notification service")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.dashboard_port,
        args.log_level
    );

    // Failure to load the configuration is the only fatal startup error
    let mut config = load_config(&args.config)?;

    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting roomwatch service");
    tracing::debug!(
        "Room groups: {}, Filters: {}, Notifiers: {}",
        config.rooms.len(),
        config.filters.len(),
        config.notifiers.len()
    );

    roomwatch::run(config).await?;

    Ok(())
}
