use psp_ai_core::{AiCoreError, ArtifactError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the trainer.
///
/// All of them are fatal: the CLI reports the diagnostic and exits non-zero.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("training input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("dataset is empty")]
    EmptyDataset,

    #[error("{rows} rows cannot be split into non-empty train and holdout partitions")]
    InsufficientRows { rows: usize },

    #[error("invalid training parameter: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Core(#[from] AiCoreError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
