//! Holdout diagnostics
//!
//! Ranking quality (ROC AUC), calibration (log-loss) and thresholded
//! classification quality (precision, recall, F1).

use std::collections::BTreeMap;
use std::fmt;

/// Probabilities strictly above this count as a predicted failure
pub const DECISION_THRESHOLD: f64 = 0.5;

const LOG_LOSS_EPS: f64 = 1e-15;

/// Area under the ROC curve; `None` when either class is absent.
///
/// Tied scores receive their average rank.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Option<f64> {
    let positives = labels.iter().filter(|&&y| y == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; the tie group spans start+1..=end
        let average_rank = (start + 1 + end) as f64 / 2.0;
        positive_rank_sum += order[start..end]
            .iter()
            .filter(|&&i| labels[i] == 1)
            .count() as f64
            * average_rank;
        start = end;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Mean binary cross-entropy with probabilities clipped away from 0 and 1.
pub fn log_loss(labels: &[u8], probabilities: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let total: f64 = labels
        .iter()
        .zip(probabilities)
        .map(|(&y, &p)| {
            let p = p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
            if y == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    total / labels.len() as f64
}

/// Confusion counts at [`DECISION_THRESHOLD`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl ConfusionCounts {
    pub fn tally(labels: &[u8], probabilities: &[f64]) -> Self {
        labels
            .iter()
            .zip(probabilities)
            .fold(Self::default(), |mut counts, (&y, &p)| {
                match (y == 1, p > DECISION_THRESHOLD) {
                    (true, true) => counts.true_positives += 1,
                    (false, true) => counts.false_positives += 1,
                    (true, false) => counts.false_negatives += 1,
                    (false, false) => counts.true_negatives += 1,
                }
                counts
            })
    }

    /// Zero when no failure was predicted.
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Zero when the labels contain no failure.
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        let (precision, recall) = (self.precision(), self.recall());
        if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Holdout report logged by the trainer and stored in model metadata
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub rows: usize,
    pub failures: usize,
    pub auc: Option<f64>,
    pub log_loss: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl EvaluationReport {
    pub fn evaluate(labels: &[u8], probabilities: &[f64]) -> Self {
        let counts = ConfusionCounts::tally(labels, probabilities);
        Self {
            rows: labels.len(),
            failures: labels.iter().filter(|&&y| y == 1).count(),
            auc: roc_auc(labels, probabilities),
            log_loss: log_loss(labels, probabilities),
            precision: counts.precision(),
            recall: counts.recall(),
            f1: counts.f1(),
        }
    }

    /// Metric map for `ModelMetadata::performance_metrics`; AUC is omitted
    /// when undefined.
    pub fn as_metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        if let Some(auc) = self.auc {
            metrics.insert("holdout_auc".to_string(), auc);
        }
        metrics.insert("holdout_log_loss".to_string(), self.log_loss);
        metrics.insert("holdout_precision".to_string(), self.precision);
        metrics.insert("holdout_recall".to_string(), self.recall);
        metrics.insert("holdout_f1".to_string(), self.f1);
        metrics
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.auc {
            Some(auc) => write!(f, "AUC {auc:.4}")?,
            None => write!(f, "AUC n/a")?,
        }
        write!(
            f,
            ", log-loss {:.4}, precision {:.4}, recall {:.4}, F1 {:.4} ({} rows, {} failures)",
            self.log_loss, self.precision, self.recall, self.f1, self.rows, self.failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_and_inverted_ranking() {
        let labels = [0, 0, 1, 1];
        assert_eq!(roc_auc(&labels, &[0.1, 0.2, 0.8, 0.9]), Some(1.0));
        assert_eq!(roc_auc(&labels, &[0.9, 0.8, 0.2, 0.1]), Some(0.0));
    }

    #[test]
    fn ties_count_half() {
        assert_eq!(roc_auc(&[0, 1], &[0.5, 0.5]), Some(0.5));
        let auc = roc_auc(&[0, 0, 1, 1], &[0.1, 0.4, 0.4, 0.1]).unwrap();
        assert!((auc - 0.5).abs() < 1e-12);
        let auc = roc_auc(&[0, 1, 1], &[0.3, 0.3, 0.9]).unwrap();
        assert!((auc - 0.75).abs() < 1e-12);
    }

    #[test]
    fn auc_undefined_for_single_class() {
        assert_eq!(roc_auc(&[1, 1], &[0.2, 0.4]), None);
        assert_eq!(roc_auc(&[], &[]), None);
    }

    #[test]
    fn log_loss_is_finite_at_extremes() {
        let loss = log_loss(&[1, 0], &[0.0, 1.0]);
        assert!(loss.is_finite());
        assert!(loss > 30.0);
        assert!((log_loss(&[1], &[0.5]) - std::f64::consts::LN_2).abs() < 1e-12);
        assert_eq!(log_loss(&[], &[]), 0.0);
    }

    #[test]
    fn threshold_is_strict() {
        let counts = ConfusionCounts::tally(&[1, 1, 0, 0], &[0.9, 0.5, 0.6, 0.1]);
        assert_eq!(
            counts,
            ConfusionCounts {
                true_positives: 1,
                false_positives: 1,
                false_negatives: 1,
                true_negatives: 1,
            }
        );
        assert_eq!(counts.precision(), 0.5);
        assert_eq!(counts.recall(), 0.5);
        assert_eq!(counts.f1(), 0.5);
    }

    #[test]
    fn no_predicted_failures_scores_zero() {
        let counts = ConfusionCounts::tally(&[1, 0], &[0.1, 0.2]);
        assert_eq!(counts.precision(), 0.0);
        assert_eq!(counts.f1(), 0.0);
    }

    #[test]
    fn report_metrics_map() {
        let report = EvaluationReport::evaluate(&[0, 1], &[0.2, 0.8]);
        let metrics = report.as_metrics();
        assert_eq!(metrics["holdout_auc"], 1.0);
        assert_eq!(metrics["holdout_f1"], 1.0);
        assert!(metrics.contains_key("holdout_log_loss"));
        assert_eq!(report.failures, 1);

        let single = EvaluationReport::evaluate(&[0, 0], &[0.2, 0.8]);
        assert!(!single.as_metrics().contains_key("holdout_auc"));
        assert!(single.to_string().starts_with("AUC n/a"));
    }
}
