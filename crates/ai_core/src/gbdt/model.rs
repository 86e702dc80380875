//! Binary GBDT classifier
//!
//! The ensemble sums weighted leaf values on top of a log-odds bias and maps
//! the raw margin through the logistic function. Models persist as canonical
//! JSON so the same model always hashes to the same blake3 digest.

use super::tree::Tree;
use crate::serde_canon::{ensure_finite, hash_canonical_hex, to_canonical_json, CanonicalError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Current persisted model format
pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("model validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),
}

/// Training objective of the ensemble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Logistic loss; the margin is a log-odds of the positive class
    BinaryLogistic,
}

/// Provenance recorded next to the trees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModelMetadata {
    /// Width of the feature vectors this model expects
    pub feature_count: usize,
    /// Canonical digest of the column list the model was trained against
    pub columns_hash: String,
    /// Boosting round kept after early stopping (zero-based)
    pub best_iteration: usize,
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub seed: u64,
    /// Holdout diagnostics, informational only
    pub performance_metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    pub version: u32,
    pub objective: Objective,
    /// Initial margin shared by every sample (log-odds)
    pub bias: f64,
    pub trees: Vec<Tree>,
    pub metadata: ModelMetadata,
}

impl Model {
    pub fn new(trees: Vec<Tree>, bias: f64, metadata: ModelMetadata) -> Self {
        Self {
            version: MODEL_FORMAT_VERSION,
            objective: Objective::BinaryLogistic,
            bias,
            trees,
            metadata,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.metadata.feature_count
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != MODEL_FORMAT_VERSION {
            return Err(ModelError::ValidationFailed(format!(
                "unsupported model version: {}",
                self.version
            )));
        }

        if !self.bias.is_finite() {
            return Err(ModelError::ValidationFailed(format!(
                "bias is not finite: {}",
                self.bias
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.metadata.feature_count).map_err(|e| {
                ModelError::ValidationFailed(format!("tree {i} validation failed: {e}"))
            })?;
        }

        for (name, value) in &self.metadata.performance_metrics {
            ensure_finite(name, *value)?;
        }

        Ok(())
    }

    /// Raw margin (log-odds) for one feature vector.
    pub fn raw_score(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.bias, |sum, tree| sum + tree.contribution(features))
    }

    /// Probability of the positive (failure) class.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.raw_score(features))
    }

    /// Keep only the first `rounds` trees.
    pub fn truncate(&mut self, rounds: usize) {
        self.trees.truncate(rounds);
    }

    pub fn to_canonical_json(&self) -> Result<String, ModelError> {
        self.validate()?;
        Ok(to_canonical_json(self)?)
    }

    pub fn hash_hex(&self) -> Result<String, ModelError> {
        self.validate()?;
        Ok(hash_canonical_hex(self)?)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let json = self.to_canonical_json()?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path)?;
        let model: Model = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Inverse of [`sigmoid`] with `p` clamped away from 0 and 1.
pub fn logit(p: f64) -> f64 {
    let p = p.clamp(1e-6, 1.0 - 1e-6);
    (p / (1.0 - p)).ln()
}
