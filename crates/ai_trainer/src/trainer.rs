//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Binary logistic boosting with exact-greedy CART trees. The holdout
//! partition drives early stopping only; the ensemble is truncated to the
//! round with the best holdout score.

use psp_ai_core::{
    encode, logit, sigmoid, AiCoreError, ColumnList, Model, ModelArtifacts, ModelMetadata,
};
use tracing::{debug, info};

use crate::cart::{CartBuilder, SortedIndex, TreeConfig};
use crate::columns::derive_columns;
use crate::dataset::Dataset;
use crate::deterministic::train_holdout_split;
use crate::errors::TrainerError;
use crate::evaluation::{log_loss, roc_auc, EvaluationReport};

const MIN_HESSIAN: f64 = 1e-16;

/// GBDT training parameters
#[derive(Clone, Debug)]
pub struct TrainingParams {
    pub rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub min_child_weight: f64,
    pub l2_regularization: f64,
    pub min_split_gain: f64,
    /// Rounds without holdout improvement before stopping
    pub early_stopping_rounds: usize,
    pub holdout_fraction: f64,
    pub seed: u64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            rounds: 500,
            learning_rate: 0.05,
            max_depth: 5,
            min_samples_leaf: 20,
            min_child_weight: 1e-3,
            l2_regularization: 1.0,
            min_split_gain: 0.0,
            early_stopping_rounds: 30,
            holdout_fraction: 0.2,
            seed: 42,
        }
    }
}

impl TrainingParams {
    pub fn validate(&self) -> Result<(), TrainerError> {
        let invalid = |msg: String| Err(TrainerError::InvalidParams(msg));

        if self.rounds == 0 {
            return invalid("rounds must be at least 1".into());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return invalid(format!("learning rate must be positive, got {}", self.learning_rate));
        }
        if !(self.holdout_fraction > 0.0 && self.holdout_fraction < 1.0) {
            return invalid(format!(
                "holdout fraction must lie in (0, 1), got {}",
                self.holdout_fraction
            ));
        }
        if !(self.l2_regularization >= 0.0 && self.l2_regularization.is_finite()) {
            return invalid(format!(
                "l2 regularization must be non-negative, got {}",
                self.l2_regularization
            ));
        }
        if !(self.min_child_weight >= 0.0 && self.min_child_weight.is_finite()) {
            return invalid(format!(
                "min child weight must be non-negative, got {}",
                self.min_child_weight
            ));
        }
        if !(self.min_split_gain >= 0.0 && self.min_split_gain.is_finite()) {
            return invalid(format!(
                "min split gain must be non-negative, got {}",
                self.min_split_gain
            ));
        }
        if self.early_stopping_rounds == 0 {
            return invalid("early stopping rounds must be at least 1".into());
        }
        Ok(())
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            min_child_weight: self.min_child_weight,
            l2_regularization: self.l2_regularization,
            min_split_gain: self.min_split_gain,
        }
    }
}

/// Fitted artifacts plus the holdout report
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub artifacts: ModelArtifacts,
    pub report: EvaluationReport,
}

/// Rows of one partition, encoded
struct Partition {
    features: Vec<Vec<f64>>,
    labels: Vec<u8>,
}

impl Partition {
    fn take(rows: &[usize], features: &[Vec<f64>], labels: &[u8]) -> Self {
        Self {
            features: rows.iter().map(|&i| features[i].clone()).collect(),
            labels: rows.iter().map(|&i| labels[i]).collect(),
        }
    }

    fn len(&self) -> usize {
        self.labels.len()
    }
}

/// GBDT trainer
pub struct GbdtTrainer {
    params: TrainingParams,
}

impl GbdtTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Derive the column list, encode every row and fit the ensemble.
    pub fn fit(&self, dataset: &Dataset) -> Result<TrainedModel, TrainerError> {
        self.params.validate()?;
        if dataset.is_empty() {
            return Err(TrainerError::EmptyDataset);
        }

        let columns = derive_columns(dataset)?;
        let encoded: Vec<Vec<f64>> = dataset
            .transactions
            .iter()
            .map(|txn| encode(txn, &columns))
            .collect();

        let split = train_holdout_split(
            dataset.len(),
            self.params.holdout_fraction,
            self.params.seed,
        )?;
        let train = Partition::take(&split.train, &encoded, &dataset.labels);
        let holdout = Partition::take(&split.holdout, &encoded, &dataset.labels);

        info!(
            columns = columns.len(),
            train_rows = train.len(),
            holdout_rows = holdout.len(),
            seed = self.params.seed,
            "starting GBDT training"
        );

        let model = self.boost(&train, &holdout, &columns)?;

        let probabilities: Vec<f64> = holdout
            .features
            .iter()
            .map(|row| model.predict_proba(row))
            .collect();
        let report = EvaluationReport::evaluate(&holdout.labels, &probabilities);
        info!(
            auc = ?report.auc,
            log_loss = report.log_loss,
            precision = report.precision,
            recall = report.recall,
            f1 = report.f1,
            "holdout evaluation"
        );

        let mut model = model;
        model.metadata.performance_metrics = report.as_metrics();
        let artifacts = ModelArtifacts::new(model, columns)?;

        Ok(TrainedModel { artifacts, report })
    }

    fn boost(
        &self,
        train: &Partition,
        holdout: &Partition,
        columns: &ColumnList,
    ) -> Result<Model, TrainerError> {
        let params = &self.params;
        let tree_config = params.tree_config();
        let index = SortedIndex::new(&train.features, columns.len());
        debug!(features = index.feature_count(), rows = index.rows(), "presorted features");

        let base_rate =
            train.labels.iter().map(|&y| f64::from(y)).sum::<f64>() / train.len() as f64;
        let bias = logit(base_rate);

        let mut train_margin = vec![bias; train.len()];
        let mut holdout_margin = vec![bias; holdout.len()];
        let mut gradients = vec![0.0; train.len()];
        let mut hessians = vec![0.0; train.len()];

        let mut trees = Vec::with_capacity(params.rounds);
        let mut best_score = f64::NEG_INFINITY;
        let mut best_round = 0;

        for round in 0..params.rounds {
            for (i, (&margin, &label)) in train_margin.iter().zip(&train.labels).enumerate() {
                let p = sigmoid(margin);
                gradients[i] = p - f64::from(label);
                hessians[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
            }

            let tree = CartBuilder::new(
                &tree_config,
                &train.features,
                &index,
                &gradients,
                &hessians,
            )
            .build(params.learning_rate);

            for (margin, row) in train_margin.iter_mut().zip(&train.features) {
                *margin += tree.contribution(row);
            }
            for (margin, row) in holdout_margin.iter_mut().zip(&holdout.features) {
                *margin += tree.contribution(row);
            }
            trees.push(tree);

            let score = holdout_score(&holdout.labels, &holdout_margin);
            debug!(round, score, "boosting round");

            if score > best_score {
                best_score = score;
                best_round = round;
            } else if round - best_round >= params.early_stopping_rounds {
                info!(round, best_round, "early stopping");
                break;
            }
        }

        trees.truncate(best_round + 1);
        info!(
            trees = trees.len(),
            best_round,
            best_score,
            "boosting finished"
        );

        let metadata = ModelMetadata {
            feature_count: columns.len(),
            columns_hash: columns.hash_hex().map_err(AiCoreError::from)?,
            best_iteration: best_round,
            train_rows: train.len(),
            holdout_rows: holdout.len(),
            seed: params.seed,
            ..ModelMetadata::default()
        };

        Ok(Model::new(trees, bias, metadata))
    }
}

/// Holdout AUC, or negative log-loss when AUC is undefined (single class).
fn holdout_score(labels: &[u8], margins: &[f64]) -> f64 {
    let probabilities: Vec<f64> = margins.iter().map(|&m| sigmoid(m)).collect();
    roc_auc(labels, &probabilities).unwrap_or_else(|| -log_loss(labels, &probabilities))
}
