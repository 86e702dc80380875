//! PSP risk trainer CLI
//!
//! Trains the failure-probability model and writes `model.json`,
//! `model.hash` and `columns.json` into the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use psp_ai_core::ArtifactPaths;
use psp_ai_trainer::{train_model_from_csv, TrainingParams};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "risk-trainer")]
#[command(author = "PSP Risk Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train the PSP transaction failure-risk model", long_about = None)]
struct Args {
    /// Input CSV with the transaction header and a `status` label column
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for model.json, model.hash and columns.json
    #[arg(short, long, default_value = "models")]
    output_dir: PathBuf,

    /// Maximum number of boosting rounds
    #[arg(long, default_value_t = 500)]
    rounds: usize,

    /// Shrinkage applied to every tree
    #[arg(long, default_value_t = 0.05)]
    learning_rate: f64,

    /// Maximum tree depth
    #[arg(long, default_value_t = 5)]
    max_depth: usize,

    /// Minimum samples per leaf
    #[arg(long, default_value_t = 20)]
    min_samples_leaf: usize,

    /// Minimum hessian sum per child
    #[arg(long, default_value_t = 1e-3)]
    min_child_weight: f64,

    /// L2 regularization on leaf values
    #[arg(long, default_value_t = 1.0)]
    l2: f64,

    /// Minimum gain required to split
    #[arg(long, default_value_t = 0.0)]
    min_split_gain: f64,

    /// Rounds without holdout improvement before stopping
    #[arg(long, default_value_t = 30)]
    early_stopping_rounds: usize,

    /// Fraction of rows held out for early stopping
    #[arg(long, default_value_t = 0.2)]
    holdout_fraction: f64,

    /// Seed for the train/holdout shuffle
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn params(&self) -> TrainingParams {
        TrainingParams {
            rounds: self.rounds,
            learning_rate: self.learning_rate,
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            min_child_weight: self.min_child_weight,
            l2_regularization: self.l2,
            min_split_gain: self.min_split_gain,
            early_stopping_rounds: self.early_stopping_rounds,
            holdout_fraction: self.holdout_fraction,
            seed: self.seed,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    info!("PSP risk trainer v{}", env!("CARGO_PKG_VERSION"));

    let params = args.params();
    info!(
        rounds = params.rounds,
        learning_rate = params.learning_rate,
        max_depth = params.max_depth,
        min_samples_leaf = params.min_samples_leaf,
        seed = params.seed,
        "training configuration"
    );

    let trained = train_model_from_csv(&args.input, params)
        .with_context(|| format!("training from {} failed", args.input.display()))?;

    let paths = ArtifactPaths::in_dir(&args.output_dir);
    let digest = trained
        .artifacts
        .save(&paths)
        .with_context(|| format!("failed to write artifacts to {}", args.output_dir.display()))?;

    info!("Holdout: {}", trained.report);
    info!("✓ Training completed successfully");
    info!("  Model: {} ({})", paths.model.display(), digest.model_hash);
    info!("  Columns: {} ({})", paths.columns.display(), digest.columns_hash);

    Ok(())
}
