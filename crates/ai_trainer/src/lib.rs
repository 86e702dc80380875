//! PSP risk trainer - offline GBDT training for failure-probability scoring
//!
//! Loads a labelled transaction CSV, derives the column list, fits a binary
//! GBDT with a seeded train/holdout split and returns the model together with
//! the exact column list it was trained against.

pub mod cart;
pub mod columns;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod evaluation;
pub mod trainer;

use std::path::Path;

pub use columns::derive_columns;
pub use dataset::{DataQuality, Dataset};
pub use deterministic::{train_holdout_split, LcgRng, SplitTieBreaker, TrainHoldoutSplit};
pub use errors::TrainerError;
pub use evaluation::EvaluationReport;
pub use trainer::{GbdtTrainer, TrainedModel, TrainingParams};

/// Train a model directly from a CSV file using the provided parameters.
pub fn train_model_from_csv(
    path: &Path,
    params: TrainingParams,
) -> Result<TrainedModel, TrainerError> {
    let dataset = Dataset::from_csv(path)?;
    GbdtTrainer::new(params).fit(&dataset)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
