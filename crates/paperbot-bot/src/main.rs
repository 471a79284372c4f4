//! Entry point for the paper-trading platform.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Multi-strategy paper-trading platform for crypto perpetual futures
/// and prediction markets.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TRADING_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.or_else(|| std::env::var("TRADING_CONFIG").ok());
    let config = paperbot_bot::AppConfig::load(config_path.as_deref())?;

    paperbot_telemetry::init_logging(&config.logging.level, &config.logging.format)?;

    info!(version = env!("CARGO_PKG_VERSION"), "starting paperbot");

    let app = paperbot_bot::Application::new(config).await?;

    info!("running preflight checks");
    app.run_preflight().await?;

    app.run().await?;

    Ok(())
}
