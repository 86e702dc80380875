//! PSP risk predictor entry point

use anyhow::{Context, Result};
use clap::Parser;
use psp_ai_service::{start_server, ConfigOverrides, LogFormat, PredictorContext, ServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "risk-service")]
#[command(author = "PSP Risk Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve PSP transaction failure probabilities over HTTP", long_about = None)]
struct Args {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (host:port)
    #[arg(long)]
    listen_addr: Option<String>,

    /// Path to model.json
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Path to columns.json
    #[arg(long)]
    columns_path: Option<PathBuf>,

    /// Path to model.hash
    #[arg(long)]
    hash_path: Option<PathBuf>,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output style: pretty or compact
    #[arg(long, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen_addr: self.listen_addr.clone(),
            model_path: self.model_path.clone(),
            columns_path: self.columns_path.clone(),
            hash_path: self.hash_path.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }
}

fn parse_log_format(value: &str) -> std::result::Result<LogFormat, String> {
    match value.to_ascii_lowercase().as_str() {
        "pretty" => Ok(LogFormat::Pretty),
        "compact" => Ok(LogFormat::Compact),
        other => Err(format!("unknown log format `{other}` (expected pretty or compact)")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServiceConfig::load(args.config.as_deref())
        .context("failed to load service configuration")?;
    config.apply_overrides(args.overrides());

    init_logging(&config);
    info!("Starting PSP risk service v{}", env!("CARGO_PKG_VERSION"));

    let context = PredictorContext::load(&config.artifact_paths()).map_err(|e| {
        error!("Failed to load model artifacts: {}", e);
        e
    })?;

    start_server(Arc::new(context), &config.listen_addr).await?;

    info!("PSP risk service stopped");
    Ok(())
}

fn init_logging(config: &ServiceConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }
}
