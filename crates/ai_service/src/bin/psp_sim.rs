//! Simulated PSP endpoint for local routing experiments

use anyhow::{ensure, Result};
use clap::Parser;
use psp_ai_service::{build_psp_router, serve_router, PspSimulator, DEFAULT_BASE_FAIL};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "psp-sim", version, about = "Serve a simulated PSP over HTTP")]
struct Args {
    /// Address to listen on (host:port)
    #[arg(long, default_value = "0.0.0.0:9000")]
    listen_addr: String,

    /// Baseline failure probability of this PSP
    #[arg(long, default_value_t = DEFAULT_BASE_FAIL)]
    base_fail: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    ensure!(
        (0.0..=1.0).contains(&args.base_fail),
        "--base-fail must be within [0, 1], got {}",
        args.base_fail
    );

    info!(base_fail = args.base_fail, "starting PSP simulator");
    serve_router(build_psp_router(PspSimulator::new(args.base_fail)), &args.listen_addr).await
}
