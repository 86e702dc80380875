//! CART (Classification and Regression Tree) builder
//!
//! Depth-wise exact-greedy construction over second-order gradient
//! statistics. Every feature is sorted once per training run; each node keeps
//! per-feature sorted row lists that are stably partitioned on split.

use psp_ai_core::{Node, Tree};
use std::cmp::Ordering;

use crate::deterministic::SplitTieBreaker;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub min_child_weight: f64,
    pub l2_regularization: f64,
    pub min_split_gain: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_samples_leaf: 20,
            min_child_weight: 1e-3,
            l2_regularization: 1.0,
            min_split_gain: 0.0,
        }
    }
}

/// Row indices ordered by feature value, one list per feature
#[derive(Clone, Debug)]
pub struct SortedIndex {
    by_feature: Vec<Vec<usize>>,
    rows: usize,
}

impl SortedIndex {
    pub fn new(features: &[Vec<f64>], feature_count: usize) -> Self {
        let by_feature = (0..feature_count)
            .map(|f| {
                let mut rows: Vec<usize> = (0..features.len()).collect();
                rows.sort_by(|&a, &b| {
                    features[a][f]
                        .total_cmp(&features[b][f])
                        .then(a.cmp(&b))
                });
                rows
            })
            .collect();

        Self {
            by_feature,
            rows: features.len(),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.by_feature.len()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn beats(&self, other: &SplitCandidate) -> bool {
        match self.gain.partial_cmp(&other.gain) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => self.tie_breaker < other.tie_breaker,
            _ => false,
        }
    }
}

/// Rows reaching one node, sorted per feature
struct NodeRows {
    rows: Vec<usize>,
    sorted: Vec<Vec<usize>>,
}

/// Build a regression tree using the exact-greedy CART algorithm
pub struct CartBuilder<'a> {
    config: &'a TreeConfig,
    features: &'a [Vec<f64>],
    index: &'a SortedIndex,
    gradients: &'a [f64],
    hessians: &'a [f64],
}

impl<'a> CartBuilder<'a> {
    /// `features`, `gradients` and `hessians` are indexed by the same rows the
    /// `index` was built from.
    pub fn new(
        config: &'a TreeConfig,
        features: &'a [Vec<f64>],
        index: &'a SortedIndex,
        gradients: &'a [f64],
        hessians: &'a [f64],
    ) -> Self {
        debug_assert_eq!(features.len(), index.rows());
        debug_assert_eq!(features.len(), gradients.len());
        debug_assert_eq!(features.len(), hessians.len());

        Self {
            config,
            features,
            index,
            gradients,
            hessians,
        }
    }

    /// Build a tree with the given shrinkage weight.
    pub fn build(&self, weight: f64) -> Tree {
        let root = NodeRows {
            rows: (0..self.index.rows()).collect(),
            sorted: self.index.by_feature.clone(),
        };

        let mut nodes = Vec::new();
        self.build_node(root, 0, &mut nodes, 0);
        Tree::new(nodes, weight)
    }

    /// Recursively build tree nodes in pre-order; returns the node's index.
    fn build_node(
        &self,
        node_rows: NodeRows,
        depth: usize,
        nodes: &mut Vec<Node>,
        node_id: usize,
    ) -> i32 {
        let current_idx = nodes.len() as i32;
        let (sum_g, sum_h) = self.sum_gradients_hessians(&node_rows.rows);

        if depth >= self.config.max_depth
            || node_rows.rows.len() < 2 * self.config.min_samples_leaf.max(1)
        {
            nodes.push(Node::leaf(current_idx, self.leaf_value(sum_g, sum_h)));
            return current_idx;
        }

        let Some(split) = self.find_best_split(&node_rows, sum_g, sum_h, node_id) else {
            nodes.push(Node::leaf(current_idx, self.leaf_value(sum_g, sum_h)));
            return current_idx;
        };

        let (left_rows, right_rows) = self.partition(node_rows, split.feature_idx, split.threshold);

        // Placeholder, children patched once built
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        ));

        let left_idx = self.build_node(left_rows, depth + 1, nodes, node_id * 2 + 1);
        let right_idx = self.build_node(right_rows, depth + 1, nodes, node_id * 2 + 2);

        let node = &mut nodes[current_idx as usize];
        node.left = left_idx;
        node.right = right_idx;

        current_idx
    }

    fn find_best_split(
        &self,
        node_rows: &NodeRows,
        sum_g: f64,
        sum_h: f64,
        node_id: usize,
    ) -> Option<SplitCandidate> {
        let lambda = self.config.l2_regularization;
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_score = sum_g * sum_g / (sum_h + lambda);
        let total = node_rows.rows.len();

        let mut best: Option<SplitCandidate> = None;

        for (feature_idx, sorted) in node_rows.sorted.iter().enumerate() {
            let mut g_left = 0.0;
            let mut h_left = 0.0;

            for position in 0..total.saturating_sub(1) {
                let row = sorted[position];
                g_left += self.gradients[row];
                h_left += self.hessians[row];

                let left_count = position + 1;
                if left_count < min_leaf {
                    continue;
                }
                if total - left_count < min_leaf {
                    break;
                }

                let value = self.features[row][feature_idx];
                let next = self.features[sorted[position + 1]][feature_idx];
                if value >= next {
                    continue;
                }

                let g_right = sum_g - g_left;
                let h_right = sum_h - h_left;
                if h_left < self.config.min_child_weight || h_right < self.config.min_child_weight
                {
                    continue;
                }

                let gain = g_left * g_left / (h_left + lambda)
                    + g_right * g_right / (h_right + lambda)
                    - parent_score;
                if !gain.is_finite() || gain <= self.config.min_split_gain {
                    continue;
                }

                let candidate = SplitCandidate {
                    feature_idx,
                    threshold: midpoint(value, next),
                    gain,
                    tie_breaker: SplitTieBreaker::new(feature_idx, position, node_id),
                };

                if best.as_ref().map_or(true, |current| candidate.beats(current)) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Split the node's rows on `feature <= threshold`, keeping every
    /// per-feature list sorted.
    fn partition(
        &self,
        node_rows: NodeRows,
        feature_idx: usize,
        threshold: f64,
    ) -> (NodeRows, NodeRows) {
        let goes_left = |row: usize| self.features[row][feature_idx] <= threshold;

        let (left, right): (Vec<usize>, Vec<usize>) =
            node_rows.rows.iter().partition(|&&row| goes_left(row));

        let mut left_sorted = Vec::with_capacity(node_rows.sorted.len());
        let mut right_sorted = Vec::with_capacity(node_rows.sorted.len());
        for sorted in node_rows.sorted {
            let (l, r): (Vec<usize>, Vec<usize>) =
                sorted.into_iter().partition(|&row| goes_left(row));
            left_sorted.push(l);
            right_sorted.push(r);
        }

        (
            NodeRows {
                rows: left,
                sorted: left_sorted,
            },
            NodeRows {
                rows: right,
                sorted: right_sorted,
            },
        )
    }

    fn sum_gradients_hessians(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter().fold((0.0, 0.0), |(g, h), &row| {
            (g + self.gradients[row], h + self.hessians[row])
        })
    }

    /// Optimal leaf value: -G/(H+λ)
    fn leaf_value(&self, sum_g: f64, sum_h: f64) -> f64 {
        let value = -sum_g / (sum_h + self.config.l2_regularization);
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

/// Threshold between two distinct sorted values such that `lo <= t < hi`.
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid < hi && mid >= lo {
        mid
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_depth: usize, min_samples_leaf: usize) -> TreeConfig {
        TreeConfig {
            max_depth,
            min_samples_leaf,
            l2_regularization: 0.0,
            ..TreeConfig::default()
        }
    }

    fn build(features: &[Vec<f64>], gradients: &[f64], config: &TreeConfig) -> Tree {
        let hessians = vec![1.0; gradients.len()];
        let index = SortedIndex::new(features, features.first().map_or(0, Vec::len));
        CartBuilder::new(config, features, &index, gradients, &hessians).build(1.0)
    }

    fn leaf_index(tree: &Tree, row: &[f64]) -> usize {
        let mut idx = 0;
        while !tree.nodes[idx].is_leaf() {
            let node = &tree.nodes[idx];
            let next = if row[node.feature_idx as usize] <= node.threshold {
                node.left
            } else {
                node.right
            };
            idx = next as usize;
        }
        idx
    }

    #[test]
    fn test_simple_split() {
        let features = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        let gradients = vec![-1.0, -1.0, 1.0, 1.0];
        let tree = build(&features, &gradients, &config(2, 1));

        assert_eq!(tree.nodes[0].feature_idx, 0);
        assert_eq!(tree.nodes[0].threshold, 2.5);
        assert_eq!(tree.evaluate(&[1.5]), 1.0);
        assert_eq!(tree.evaluate(&[3.5]), -1.0);
        assert!(tree.validate(1).is_ok());
    }

    #[test]
    fn test_leaf_only_tree() {
        let features = vec![vec![1.0]];
        let tree = build(&features, &[-2.0], &TreeConfig::default());

        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.nodes[0].is_leaf());
        // -G/(H+λ) = 2/(1+1)
        assert_eq!(tree.nodes[0].leaf, Some(1.0));
    }

    #[test]
    fn test_constant_feature_never_splits() {
        let features = vec![vec![5.0]; 10];
        let gradients: Vec<f64> = (0..10).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let tree = build(&features, &gradients, &config(3, 1));
        assert_eq!(tree.nodes.len(), 1);
    }

    #[test]
    fn test_min_samples_leaf_is_respected() {
        let features: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let mut gradients = vec![1.0; 10];
        gradients[0] = -10.0;
        let tree = build(&features, &gradients, &config(3, 3));

        let mut counts = vec![0usize; tree.nodes.len()];
        for row in &features {
            counts[leaf_index(&tree, row)] += 1;
        }
        for (idx, node) in tree.nodes.iter().enumerate() {
            if node.is_leaf() {
                assert!(counts[idx] >= 3, "leaf {idx} holds {} rows", counts[idx]);
            }
        }
        assert!(tree.nodes.len() > 1);
    }

    #[test]
    fn test_picks_informative_feature() {
        let features: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![(i % 3) as f64, if i < 10 { 0.0 } else { 1.0 }])
            .collect();
        let gradients: Vec<f64> = (0..20).map(|i| if i < 10 { -1.0 } else { 1.0 }).collect();
        let tree = build(&features, &gradients, &config(1, 1));

        assert_eq!(tree.nodes[0].feature_idx, 1);
        assert_eq!(tree.nodes[0].threshold, 0.5);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_ties_prefer_lowest_feature() {
        // Identical columns give identical gains
        let features: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64, i as f64]).collect();
        let gradients: Vec<f64> = (0..8).map(|i| if i < 4 { -1.0 } else { 1.0 }).collect();
        let tree = build(&features, &gradients, &config(1, 1));
        assert_eq!(tree.nodes[0].feature_idx, 0);
    }

    #[test]
    fn test_pre_order_layout() {
        let features: Vec<Vec<f64>> = (0..16).map(|i| vec![i as f64]).collect();
        let gradients: Vec<f64> = (0..16).map(|i| ((i % 4) as f64) - 1.5).collect();
        let tree = build(&features, &gradients, &config(3, 1));

        for (idx, node) in tree.nodes.iter().enumerate() {
            assert_eq!(node.id, idx as i32);
            if !node.is_leaf() {
                assert!(node.left > idx as i32);
                assert!(node.right > node.left);
            }
        }
        assert!(tree.validate(1).is_ok());
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn test_midpoint_stays_below_upper() {
        assert_eq!(midpoint(1.0, 2.0), 1.5);
        let lo: f64 = 1.0;
        let hi = f64::from_bits(lo.to_bits() + 1);
        let t = midpoint(lo, hi);
        assert!(lo <= t && t < hi);
    }
}
