//! Quoter - Entry Point
//!
//! Replays a recorded book file through the quoting strategy against a
//! paper venue.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

/// Single-instrument quoting strategy
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via QUOTER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Log filter, overrides the config file and RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > QUOTER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("QUOTER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = quoter_bot::AppConfig::from_file(&config_path)?;

    let level = args.log_level.as_deref().or(config.app.log_level.as_deref());
    quoter_telemetry::init_logging(level)?;

    info!("Starting quoter v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        instrument = %config.instrument.composed_name(),
        "Configuration loaded"
    );

    let dump_metrics = config.app.dump_metrics;
    let mut app = match quoter_bot::Application::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!(comment = %e.comment(), error = %e, "Strategy failed to start");
            return Err(e.into());
        }
    };

    let summary = app.run().await?;
    if let Some(comment) = summary.comment {
        info!(comment = %comment, lifecycle = %summary.lifecycle, "Strategy stopped");
    }

    if dump_metrics {
        print!("{}", quoter_telemetry::Metrics::render()?);
    }

    Ok(())
}
