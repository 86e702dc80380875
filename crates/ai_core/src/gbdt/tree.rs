//! Decision tree structures for GBDT inference
//!
//! Nodes live in a flat vector with the root at index 0. Children always sit
//! after their parent, which `Tree::validate` enforces and which guarantees
//! traversal terminates.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// Internal nodes carry `feature_idx >= 0`, a threshold and child indices.
/// Leaves carry `feature_idx == -1`, `left == right == -1` and a leaf value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: i32,
    pub left: i32,
    pub right: i32,
    pub feature_idx: i32,
    /// Samples with `feature <= threshold` go left
    pub threshold: f64,
    pub leaf: Option<f64>,
}

impl Node {
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A single regression tree of the ensemble
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,

    /// Shrinkage applied to every leaf of this tree
    pub weight: f64,
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Raw (unweighted) leaf value reached by `features`.
    ///
    /// Malformed structure or an out-of-range feature index yields 0.0.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if node.is_leaf() {
                return node.leaf.unwrap_or(0.0);
            }

            let Some(&value) = usize::try_from(node.feature_idx)
                .ok()
                .and_then(|feature| features.get(feature))
            else {
                return 0.0;
            };

            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };

            match usize::try_from(next) {
                Ok(child) if child > idx => idx = child,
                _ => return 0.0,
            }
        }
    }

    /// Weighted contribution of this tree.
    pub fn contribution(&self, features: &[f64]) -> f64 {
        self.evaluate(features) * self.weight
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() => {
                    let child_depth = |child: i32| {
                        usize::try_from(child)
                            .ok()
                            .filter(|&child| child > idx)
                            .map_or(0, |child| walk(nodes, child))
                    };
                    1 + child_depth(node.left).max(child_depth(node.right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Structural checks; `feature_count` bounds every split index.
    pub fn validate(&self, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        if !self.weight.is_finite() {
            return Err(format!("tree weight is not finite: {}", self.weight));
        }

        let len = self.nodes.len() as i64;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(value) if value.is_finite() => {}
                    Some(value) => return Err(format!("leaf {i} value is not finite: {value}")),
                    None => return Err(format!("leaf {i} has no value")),
                }
                continue;
            }

            for (side, child) in [("left", node.left), ("right", node.right)] {
                let child = i64::from(child);
                if child <= i as i64 || child >= len {
                    return Err(format!("node {i} has invalid {side} child: {child}"));
                }
            }

            if node.feature_idx < 0 || node.feature_idx as usize >= feature_count {
                return Err(format!(
                    "node {i} splits on feature {} outside 0..{feature_count}",
                    node.feature_idx
                ));
            }

            if !node.threshold.is_finite() {
                return Err(format!("node {i} threshold is not finite"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(
            vec![
                Node::internal(0, 0, 50.0, 1, 2),
                Node::leaf(1, -0.25),
                Node::leaf(2, 0.75),
            ],
            0.1,
        )
    }

    #[test]
    fn equal_goes_left() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[30.0]), -0.25);
        assert_eq!(tree.evaluate(&[50.0]), -0.25);
        assert_eq!(tree.evaluate(&[60.0]), 0.75);
        assert!((tree.contribution(&[60.0]) - 0.075).abs() < 1e-12);
    }

    #[test]
    fn missing_feature_yields_zero() {
        assert_eq!(stump().evaluate(&[]), 0.0);
    }

    #[test]
    fn backward_child_does_not_loop() {
        let tree = Tree::new(
            vec![Node::internal(0, 0, 1.0, 0, 0), Node::leaf(1, 1.0)],
            1.0,
        );
        assert_eq!(tree.evaluate(&[0.0]), 0.0);
        assert!(tree.validate(1).is_err());
    }

    #[test]
    fn validation_checks_structure() {
        assert!(stump().validate(1).is_ok());
        assert!(stump().validate(0).is_err());

        let dangling = Tree::new(
            vec![
                Node::internal(0, 0, 50.0, 5, 2),
                Node::leaf(1, 1.0),
                Node::leaf(2, 2.0),
            ],
            1.0,
        );
        assert!(dangling.validate(1).is_err());

        let nan_leaf = Tree::new(vec![Node::leaf(0, f64::NAN)], 1.0);
        assert!(nan_leaf.validate(1).is_err());
    }

    #[test]
    fn shape_helpers() {
        let tree = stump();
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(Tree::new(vec![Node::leaf(0, 0.0)], 1.0).depth(), 0);
    }
}
