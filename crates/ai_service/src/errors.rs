//! Predictor service error types

use psp_ai_core::ArtifactError;
use thiserror::Error;

/// Predictor service errors
///
/// Everything here is a startup failure; request-time problems are answered
/// with an HTTP error body instead.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("configuration file not found: {0}")]
    ConfigFileMissing(String),

    #[error("failed to load model artifacts: {0}")]
    Artifacts(#[from] ArtifactError),
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
