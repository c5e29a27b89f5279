//! Regression tree structures for GBDT inference
//!
//! Trees are flat node arrays with node 0 as the root. Traversal reads
//! features from a sparse row, where absent columns are zero.

use serde::{Deserialize, Serialize};

use crate::matrix::sparse_value;

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: column of the encoded feature row
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` contains the node's output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Node ID (position in the node array)
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Split threshold; rows with `x <= threshold` go left
    pub threshold: f64,

    /// Leaf value (Some for leaf nodes, None for internal nodes)
    pub leaf: Option<f64>,
}

impl Node {
    /// Create a new internal (split) node
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

    /// Create a new leaf node
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

    pub fn leaf_value(&self) -> Option<f64> {
        self.leaf
    }
}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,

    /// Multiplier applied to this tree's output (the shrinkage rate)
    pub weight: f64,
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Raw leaf value reached by `row`, before weighting.
    ///
    /// Malformed structure evaluates to 0.0; [`Tree::validate`] rejects it on load.
    pub fn evaluate(&self, row: &[(usize, f64)]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if node.is_leaf() {
                return node.leaf_value().unwrap_or(0.0);
            }

            let value = sparse_value(row, node.feature_idx as usize);
            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };

            if next < 0 {
                return 0.0;
            }
            idx = next as usize;
        }
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Deepest root-to-leaf path length (a lone leaf has depth 0)
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize, guard: usize) -> usize {
            match nodes.get(idx) {
                Some(node) if !node.is_leaf() && guard < nodes.len() => {
                    1 + walk(nodes, node.left as usize, guard + 1)
                        .max(walk(nodes, node.right as usize, guard + 1))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0, 0)
    }

    /// Validate tree structure
    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        if !self.weight.is_finite() {
            return Err(format!("Tree weight is not finite: {}", self.weight));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if !node.is_leaf() {
                // Children must come after their parent, which also rules out cycles
                if node.left <= i as i32 || node.left as usize >= self.nodes.len() {
                    return Err(format!("Node {} has invalid left child: {}", i, node.left));
                }

                if node.right <= i as i32 || node.right as usize >= self.nodes.len() {
                    return Err(format!(
                        "Node {} has invalid right child: {}",
                        i, node.right
                    ));
                }

                if node.feature_idx < 0 {
                    return Err(format!(
                        "Internal node {} has invalid feature index: {}",
                        i, node.feature_idx
                    ));
                }

                if !node.threshold.is_finite() {
                    return Err(format!("Node {i} has non-finite threshold"));
                }
            } else {
                match node.leaf {
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                    Some(v) if !v.is_finite() => {
                        return Err(format!("Leaf node {i} has non-finite value"))
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }

    /// Largest feature index referenced by a split
    pub fn max_feature_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf())
            .map(|n| n.feature_idx as usize)
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(
            vec![
                Node::internal(0, 2, 0.5, 1, 2),
                Node::leaf(1, -40.0),
                Node::leaf(2, 60.0),
            ],
            0.1,
        )
    }

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(0, 3, 0.5, 1, 2);
        assert_eq!(internal.feature_idx, 3);
        assert!(!internal.is_leaf());

        let leaf = Node::leaf(1, -234.5);
        assert_eq!(leaf.feature_idx, -1);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.leaf_value(), Some(-234.5));
    }

    #[test]
    fn test_tree_evaluation_on_sparse_rows() {
        let tree = stump();

        // Column 2 absent -> 0.0 <= 0.5 -> left
        assert_eq!(tree.evaluate(&[]), -40.0);
        assert_eq!(tree.evaluate(&[(0, 1.0)]), -40.0);
        assert_eq!(tree.evaluate(&[(2, 1.0)]), 60.0);
        // Equal goes left
        assert_eq!(tree.evaluate(&[(2, 0.5)]), -40.0);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate().is_ok());

        let out_of_bounds = Tree::new(
            vec![
                Node::internal(0, 0, 0.5, 5, 2),
                Node::leaf(1, 1.0),
                Node::leaf(2, 2.0),
            ],
            1.0,
        );
        assert!(out_of_bounds.validate().is_err());

        let cyclic = Tree::new(
            vec![
                Node::internal(0, 0, 0.5, 1, 2),
                Node::internal(1, 0, 0.5, 0, 2),
                Node::leaf(2, 2.0),
            ],
            1.0,
        );
        assert!(cyclic.validate().is_err());

        let nan_leaf = Tree::new(vec![Node::leaf(0, f64::NAN)], 1.0);
        assert!(nan_leaf.validate().is_err());
    }

    #[test]
    fn test_depth_and_features() {
        let tree = stump();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.max_feature_index(), Some(2));

        let leaf_only = Tree::new(vec![Node::leaf(0, 3.0)], 1.0);
        assert_eq!(leaf_only.depth(), 0);
        assert_eq!(leaf_only.max_feature_index(), None);
    }
}
