//! Scoring core for PSP failure-risk prediction
//!
//! Holds everything training and serving must agree on:
//!
//! - `features`: the column list and the transaction encoder
//! - `gbdt`: the boosted-tree classifier and its canonical form
//! - `artifacts`: persisting and loading a model with its column list
//! - `serde_canon`: canonical JSON and blake3 digests

pub mod artifacts;
pub mod errors;
pub mod features;
pub mod gbdt;
pub mod serde_canon;

pub use artifacts::{
    ArtifactDigest, ArtifactPaths, ModelArtifacts, COLUMNS_FILE, HASH_FILE, MODEL_FILE,
};
pub use errors::{AiCoreError, ArtifactError};
pub use features::{encode, Column, ColumnList, FeatureVector};
pub use gbdt::{logit, sigmoid, Model, ModelError, ModelMetadata, Node, Tree};

/// Crate version string for metadata and diagnostics
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
