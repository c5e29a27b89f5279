//! CART (Classification and Regression Tree) builder
//!
//! Implements deterministic exact-greedy regression tree construction over
//! sparse encoded rows, using second-order gradient statistics.

use crop_price_core::gbdt::{Node, Tree};
use crop_price_core::FeatureMatrix;
use std::collections::BTreeMap;

use crate::deterministic::SplitTieBreaker;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Relative gain below which a split is treated as no improvement
const MIN_RELATIVE_GAIN: f64 = 1e-12;

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn new(feature_idx: usize, threshold: f64, gain: f64) -> Self {
        Self {
            feature_idx,
            threshold,
            gain,
            tie_breaker: SplitTieBreaker::new(feature_idx, threshold),
        }
    }

    fn beats(&self, current: &SplitCandidate) -> bool {
        self.gain > current.gain
            || (self.gain == current.gain && self.tie_breaker < current.tie_breaker)
    }
}

/// Gradient/hessian totals for a group of rows sharing one feature value
#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    value: f64,
    gradient: f64,
    hessian: f64,
    count: usize,
}

/// Build a regression tree using the exact-greedy CART algorithm
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a FeatureMatrix,
    gradients: &'a [f64],
    hessians: &'a [f64],
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a FeatureMatrix,
        gradients: &'a [f64],
        hessians: &'a [f64],
        config: TreeConfig,
    ) -> Self {
        debug_assert_eq!(features.n_rows(), gradients.len());
        debug_assert_eq!(features.n_rows(), hessians.len());

        Self {
            config,
            features,
            gradients,
            hessians,
        }
    }

    /// Build a tree over the rows in `indices`; the tree weight is 1.0.
    pub fn build(&self, indices: &[usize]) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(indices, 0, &mut nodes);
        Tree::new(nodes, 1.0)
    }

    /// Recursively build tree nodes
    fn build_node(&self, indices: &[usize], depth: usize, nodes: &mut Vec<Node>) -> i32 {
        let current_idx = nodes.len() as i32;
        let leaf_value = self.calculate_leaf_value(indices);

        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || indices.len() < 2 * self.config.min_samples_leaf
            || self.is_pure(indices)
        {
            nodes.push(Node::leaf(current_idx, leaf_value));
            return current_idx;
        }

        let Some(split) = self.find_best_split(indices) else {
            nodes.push(Node::leaf(current_idx, leaf_value));
            return current_idx;
        };

        let (left_indices, right_indices) =
            self.split_samples(indices, split.feature_idx, split.threshold);

        // Reserve space for current node
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        ));

        let left_idx = self.build_node(&left_indices, depth + 1, nodes);
        let right_idx = self.build_node(&right_indices, depth + 1, nodes);

        nodes[current_idx as usize].left = left_idx;
        nodes[current_idx as usize].right = right_idx;

        current_idx
    }

    /// Whether every gradient in the node is (numerically) the same
    fn is_pure(&self, indices: &[usize]) -> bool {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &idx in indices {
            min = min.min(self.gradients[idx]);
            max = max.max(self.gradients[idx]);
        }
        max - min <= 1e-9 * (1.0 + max.abs().max(min.abs()))
    }

    /// Find best split using the exact-greedy algorithm
    ///
    /// Only stored (non-zero) entries are visited; rows without an entry for
    /// a feature form one implicit zero-valued bucket.
    fn find_best_split(&self, indices: &[usize]) -> Option<SplitCandidate> {
        let (g_total, h_total) = self.sum_gradients_hessians(indices);
        let parent_score = score(g_total, h_total);

        let mut per_feature: BTreeMap<usize, Vec<(f64, usize)>> = BTreeMap::new();
        for &idx in indices {
            for &(feature, value) in self.features.row(idx) {
                per_feature.entry(feature).or_default().push((value, idx));
            }
        }

        let mut best_split: Option<SplitCandidate> = None;
        let min_gain = MIN_RELATIVE_GAIN * parent_score.abs().max(1.0);

        for (feature_idx, entries) in per_feature {
            let buckets = self.feature_buckets(entries, indices.len(), g_total, h_total);
            if buckets.len() < 2 {
                continue;
            }

            let mut g_left = 0.0;
            let mut h_left = 0.0;
            let mut n_left = 0usize;

            for pair in buckets.windows(2) {
                let (lo, hi) = (pair[0], pair[1]);
                g_left += lo.gradient;
                h_left += lo.hessian;
                n_left += lo.count;
                let n_right = indices.len() - n_left;

                if n_left < self.config.min_samples_leaf || n_right < self.config.min_samples_leaf
                {
                    continue;
                }

                let gain = score(g_left, h_left) + score(g_total - g_left, h_total - h_left)
                    - parent_score;
                if gain <= min_gain {
                    continue;
                }

                let candidate = SplitCandidate::new(feature_idx, midpoint(lo.value, hi.value), gain);
                best_split = match best_split {
                    None => Some(candidate),
                    Some(current) => Some(if candidate.beats(&current) {
                        candidate
                    } else {
                        current
                    }),
                };
            }
        }

        best_split
    }

    /// Group one feature's node entries into ascending value buckets,
    /// including the implicit zero bucket for rows without an entry.
    fn feature_buckets(
        &self,
        mut entries: Vec<(f64, usize)>,
        node_rows: usize,
        g_total: f64,
        h_total: f64,
    ) -> Vec<Bucket> {
        entries.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut buckets: Vec<Bucket> = Vec::new();
        let mut g_stored = 0.0;
        let mut h_stored = 0.0;

        for (value, idx) in &entries {
            let (g, h) = (self.gradients[*idx], self.hessians[*idx]);
            g_stored += g;
            h_stored += h;

            match buckets.last_mut() {
                Some(last) if last.value == *value => {
                    last.gradient += g;
                    last.hessian += h;
                    last.count += 1;
                }
                _ => buckets.push(Bucket {
                    value: *value,
                    gradient: g,
                    hessian: h,
                    count: 1,
                }),
            }
        }

        let zero_count = node_rows - entries.len();
        if zero_count > 0 {
            let zero = Bucket {
                value: 0.0,
                gradient: g_total - g_stored,
                hessian: h_total - h_stored,
                count: zero_count,
            };
            let pos = buckets.partition_point(|b| b.value < 0.0);
            match buckets.get_mut(pos) {
                Some(existing) if existing.value == 0.0 => {
                    existing.gradient += zero.gradient;
                    existing.hessian += zero.hessian;
                    existing.count += zero.count;
                }
                _ => buckets.insert(pos, zero),
            }
        }

        buckets
    }

    /// Split samples based on threshold
    fn split_samples(
        &self,
        indices: &[usize],
        feature_idx: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        indices
            .iter()
            .partition(|&&idx| self.features.get(idx, feature_idx) <= threshold)
    }

    /// Sum gradients and hessians for a set of samples
    fn sum_gradients_hessians(&self, indices: &[usize]) -> (f64, f64) {
        indices.iter().fold((0.0, 0.0), |(g, h), &idx| {
            (g + self.gradients[idx], h + self.hessians[idx])
        })
    }

    /// Calculate optimal leaf value: -G/H
    fn calculate_leaf_value(&self, indices: &[usize]) -> f64 {
        let (sum_g, sum_h) = self.sum_gradients_hessians(indices);
        if sum_h <= 0.0 {
            return 0.0;
        }
        -sum_g / sum_h
    }
}

/// Structure score G²/H of a node
fn score(gradient: f64, hessian: f64) -> f64 {
    if hessian > 0.0 {
        gradient * gradient / hessian
    } else {
        0.0
    }
}

/// Threshold between two adjacent distinct values that sends `lo` left and `hi` right
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid >= hi {
        lo
    } else {
        mid
    }
}
