//! Error types for the scoring core

use std::path::PathBuf;
use thiserror::Error;

use crate::gbdt::ModelError;
use crate::serde_canon::CanonicalError;

/// Errors raised while building or validating core structures
#[derive(Error, Debug)]
pub enum AiCoreError {
    /// The same column name appears twice in a column list
    #[error("duplicate column in column list: {0}")]
    DuplicateColumn(String),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),
}

/// Errors raised while persisting or loading model artifacts
///
/// Every variant is a precondition failure: the predictor refuses to start.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed artifact {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model in {}: {source}", path.display())]
    InvalidModel {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("model and column list disagree: {0}")]
    Inconsistent(String),

    #[error("integrity check failed for {}: expected {expected}, found {actual}", path.display())]
    IntegrityMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, AiCoreError>;
