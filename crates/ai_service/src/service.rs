//! Predictor context
//!
//! Holds the loaded model and its column list. Built once at startup and
//! shared read-only by every request.

use psp_ai_core::{ArtifactPaths, ModelArtifacts};
use psp_types::Transaction;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::Result;

const PROBABILITY_SCALE: f64 = 10_000.0;

/// Response body of `/predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub txn_id: Option<String>,
    pub failure_probability: f64,
}

/// Response body of `/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug)]
pub struct PredictorContext {
    artifacts: ModelArtifacts,
}

impl PredictorContext {
    pub fn new(artifacts: ModelArtifacts) -> Self {
        Self { artifacts }
    }

    /// Load and verify the artifacts; any failure is fatal for the caller.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let artifacts = ModelArtifacts::load(paths)?;
        info!(
            model = %paths.model.display(),
            columns = artifacts.columns().len(),
            trees = artifacts.model().num_trees(),
            "predictor ready"
        );
        Ok(Self::new(artifacts))
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    pub fn predict(&self, txn: &Transaction) -> Prediction {
        let raw = self.artifacts.predict_proba(txn);
        let failure_probability = round_probability(raw);
        debug!(txn_id = ?txn.txn_id, failure_probability, "scored transaction");
        Prediction {
            txn_id: txn.txn_id.clone(),
            failure_probability,
        }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "ok".to_string(),
        }
    }
}

/// Clamp to `[0, 1]` (NaN reads as 0) and round to 4 decimals.
pub fn round_probability(p: f64) -> f64 {
    if p.is_nan() {
        return 0.0;
    }
    (p.clamp(0.0, 1.0) * PROBABILITY_SCALE).round() / PROBABILITY_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;
    use psp_ai_core::{logit, ColumnList, Model, ModelMetadata, Node, Tree};

    fn context() -> PredictorContext {
        let columns = ColumnList::from_names([
            "amount",
            "network_latency_ms",
            "psp_success_rate_5m",
            "app_GooglePay",
            "weekday_0",
        ])
        .unwrap();
        let tree = Tree::new(
            vec![
                Node::internal(0, 1, 120.0, 1, 2),
                Node::leaf(1, -0.5),
                Node::leaf(2, 1.5),
            ],
            1.0,
        );
        let metadata = ModelMetadata {
            feature_count: columns.len(),
            columns_hash: columns.hash_hex().unwrap(),
            ..ModelMetadata::default()
        };
        let model = Model::new(vec![tree], logit(0.03), metadata);
        PredictorContext::new(ModelArtifacts::new(model, columns).unwrap())
    }

    #[test]
    fn rounding_and_clamping() {
        assert_eq!(round_probability(0.123456), 0.1235);
        assert_eq!(round_probability(0.99999), 1.0);
        assert_eq!(round_probability(-0.2), 0.0);
        assert_eq!(round_probability(1.7), 1.0);
        assert_eq!(round_probability(f64::NAN), 0.0);
        assert_eq!(round_probability(f64::INFINITY), 1.0);
    }

    #[test]
    fn default_request_is_scored() {
        let ctx = context();
        let prediction = ctx.predict(&Transaction::default());
        assert_eq!(prediction.txn_id, None);
        // latency 100 <= 120 goes left
        let expected = round_probability(psp_ai_core::sigmoid(logit(0.03) - 0.5));
        assert_eq!(prediction.failure_probability, expected);
    }

    #[test]
    fn txn_id_is_echoed() {
        let ctx = context();
        let txn = Transaction {
            txn_id: Some("abc".into()),
            network_latency_ms: 400.0,
            ..Transaction::default()
        };
        let prediction = ctx.predict(&txn);
        assert_eq!(prediction.txn_id.as_deref(), Some("abc"));
        let baseline = ctx.predict(&Transaction::default());
        assert!(prediction.failure_probability > baseline.failure_probability);
    }

    #[test]
    fn health_is_ok() {
        assert_eq!(context().health().status, "ok");
    }
}
