use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use psp_txgen::TransactionGenerator;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about = "Generate synthetic PSP transactions as CSV")]
struct Args {
    /// Number of transactions to generate
    #[arg(long, default_value_t = 20_000)]
    rows: usize,

    /// Output CSV path
    #[arg(short, long, default_value = "transactions.csv")]
    output: PathBuf,

    /// Seed for reproducible output; random when omitted
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let file = File::create(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let summary = TransactionGenerator::new(args.seed)
        .write_csv(BufWriter::new(file), args.rows)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        rows = summary.rows,
        failure_rate = format!("{:.4}", summary.failure_rate()),
        "saved {}",
        args.output.display()
    );
    Ok(())
}
