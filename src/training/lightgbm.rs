//! LightGBM-style gradient boosting (residual model)
//!
//! Trees are grown leaf-wise: the leaf with the largest split gain is
//! expanded next until `max_leaves` is reached. Rows are bagged every
//! `bagging_freq` rounds and a feature subset is drawn for every tree.

use crate::error::{ForecastError, Result};
use super::Regressor;
use ndarray::{Array1, Array2, ArrayView1};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LightGBMConfig {
    /// Boosting rounds
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_leaves: usize,
    pub max_depth: Option<usize>,
    /// Minimum rows per leaf
    pub min_child_samples: usize,
    pub reg_lambda: f64,
    pub reg_alpha: f64,
    /// Share of features drawn per tree
    pub feature_fraction: f64,
    /// Share of rows drawn per bag
    pub bagging_fraction: f64,
    /// Rounds between re-bagging; 0 disables bagging
    pub bagging_freq: usize,
    pub random_state: Option<u64>,
}

impl Default for LightGBMConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_leaves: 31,
            max_depth: None,
            min_child_samples: 20,
            reg_lambda: 0.0,
            reg_alpha: 0.0,
            feature_fraction: 0.9,
            bagging_fraction: 0.8,
            bagging_freq: 5,
            random_state: Some(42),
        }
    }
}

impl LightGBMConfig {
    fn validate(&self) -> Result<()> {
        let fraction_ok = |v: f64| v > 0.0 && v <= 1.0;
        if !fraction_ok(self.feature_fraction) {
            return Err(invalid("feature_fraction", self.feature_fraction, "must be in (0, 1]"));
        }
        if !fraction_ok(self.bagging_fraction) {
            return Err(invalid("bagging_fraction", self.bagging_fraction, "must be in (0, 1]"));
        }
        if self.learning_rate <= 0.0 {
            return Err(invalid("learning_rate", self.learning_rate, "must be positive"));
        }
        if self.max_leaves < 2 {
            return Err(invalid("max_leaves", self.max_leaves, "must be at least 2"));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: impl ToString, reason: &str) -> ForecastError {
    ForecastError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone)]
enum LGBNode {
    Leaf { value: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<LGBNode>,
        right: Box<LGBNode>,
    },
}

impl LGBNode {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        match self {
            LGBNode::Leaf { value } => *value,
            LGBNode::Split { feature, threshold, left, right } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }

    fn n_leaves(&self) -> usize {
        match self {
            LGBNode::Leaf { .. } => 1,
            LGBNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

// ---- Tree building utilities ----

fn compute_leaf_weight(g: f64, h: f64, lambda: f64, alpha: f64) -> f64 {
    let g_adj = if g.abs() <= alpha { 0.0 } else { g - alpha * g.signum() };
    -g_adj / (h + lambda)
}

fn compute_gain_single(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

fn make_leaf(gradients: &[f64], hessians: &[f64], indices: &[usize], lambda: f64, alpha: f64) -> LGBNode {
    let g: f64 = indices.iter().map(|&i| gradients[i]).sum();
    let h: f64 = indices.iter().map(|&i| hessians[i]).sum();
    LGBNode::Leaf { value: compute_leaf_weight(g, h, lambda, alpha) }
}

struct SplitResult {
    feature: usize,
    threshold: f64,
    gain: f64,
    left_indices: Vec<usize>,
    right_indices: Vec<usize>,
}

fn find_best_split_for_feature(
    x: &Array2<f64>,
    gradients: &[f64],
    hessians: &[f64],
    indices: &[usize],
    feature: usize,
    config: &LightGBMConfig,
) -> Option<SplitResult> {
    let min_child = config.min_child_samples.max(1);
    if indices.len() < 2 * min_child {
        return None;
    }

    let mut sorted: Vec<(usize, f64)> = indices.iter().map(|&i| (i, x[[i, feature]])).collect();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));

    let total_g: f64 = indices.iter().map(|&i| gradients[i]).sum();
    let total_h: f64 = indices.iter().map(|&i| hessians[i]).sum();
    let base_score = compute_gain_single(total_g, total_h, config.reg_lambda);

    let mut left_g = 0.0;
    let mut left_h = 0.0;
    let mut best_gain = f64::NEG_INFINITY;
    let mut best_threshold = 0.0;
    let mut best_pos = 0;

    for i in 0..sorted.len() - 1 {
        left_g += gradients[sorted[i].0];
        left_h += hessians[sorted[i].0];

        if i + 1 < min_child || sorted.len() - i - 1 < min_child {
            continue;
        }
        if sorted[i].1 == sorted[i + 1].1 {
            continue;
        }

        let gain = compute_gain_single(left_g, left_h, config.reg_lambda)
            + compute_gain_single(total_g - left_g, total_h - left_h, config.reg_lambda)
            - base_score;

        if gain > best_gain {
            best_gain = gain;
            best_threshold = (sorted[i].1 + sorted[i + 1].1) / 2.0;
            best_pos = i + 1;
        }
    }

    if best_gain <= 0.0 {
        return None;
    }

    Some(SplitResult {
        feature,
        threshold: best_threshold,
        gain: best_gain,
        left_indices: sorted[..best_pos].iter().map(|&(i, _)| i).collect(),
        right_indices: sorted[best_pos..].iter().map(|&(i, _)| i).collect(),
    })
}

fn best_split(
    x: &Array2<f64>,
    gradients: &[f64],
    hessians: &[f64],
    indices: &[usize],
    features: &[usize],
    config: &LightGBMConfig,
) -> Option<SplitResult> {
    features
        .par_iter()
        .filter_map(|&feat| find_best_split_for_feature(x, gradients, hessians, indices, feat, config))
        .collect::<Vec<_>>()
        .into_iter()
        .fold(None, |acc: Option<SplitResult>, cand| match acc {
            Some(a) if a.gain >= cand.gain => Some(a),
            _ => Some(cand),
        })
}

struct PendingSplit {
    node_id: usize,
    split: SplitResult,
}

impl PartialEq for PendingSplit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for PendingSplit {}
impl PartialOrd for PendingSplit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for PendingSplit {
    // Highest gain first; ties go to the node created earliest.
    fn cmp(&self, other: &Self) -> Ordering {
        self.split
            .gain
            .total_cmp(&other.split.gain)
            .then_with(|| other.node_id.cmp(&self.node_id))
    }
}

enum NodeSlot {
    Leaf(Vec<usize>),
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

/// Build tree using leaf-wise (best-first) strategy
fn build_lgb_tree(
    x: &Array2<f64>,
    gradients: &[f64],
    hessians: &[f64],
    indices: &[usize],
    features: &[usize],
    config: &LightGBMConfig,
) -> LGBNode {
    let mut nodes: Vec<NodeSlot> = vec![NodeSlot::Leaf(indices.to_vec())];
    let mut depths: Vec<usize> = vec![0];
    let mut heap: BinaryHeap<PendingSplit> = BinaryHeap::new();
    let max_depth_limit = config.max_depth.unwrap_or(usize::MAX);

    if max_depth_limit > 0 {
        if let Some(split) = best_split(x, gradients, hessians, indices, features, config) {
            heap.push(PendingSplit { node_id: 0, split });
        }
    }

    let mut n_leaves = 1usize;

    while n_leaves < config.max_leaves {
        let PendingSplit { node_id, split } = match heap.pop() {
            Some(p) => p,
            None => break,
        };

        let depth = depths[node_id];
        let left_id = nodes.len();
        let right_id = left_id + 1;

        nodes[node_id] = NodeSlot::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_id,
            right: right_id,
        };
        n_leaves += 1;

        for (child_id, child_indices) in [(left_id, &split.left_indices), (right_id, &split.right_indices)] {
            if depth + 1 < max_depth_limit {
                if let Some(child_split) = best_split(x, gradients, hessians, child_indices, features, config) {
                    heap.push(PendingSplit { node_id: child_id, split: child_split });
                }
            }
            debug_assert_eq!(nodes.len(), child_id);
            nodes.push(NodeSlot::Leaf(child_indices.clone()));
            depths.push(depth + 1);
        }
    }

    fn to_node(nodes: &[NodeSlot], idx: usize, g: &[f64], h: &[f64], lam: f64, alpha: f64) -> LGBNode {
        match &nodes[idx] {
            NodeSlot::Leaf(indices) => make_leaf(g, h, indices, lam, alpha),
            NodeSlot::Split { feature, threshold, left, right } => LGBNode::Split {
                feature: *feature,
                threshold: *threshold,
                left: Box::new(to_node(nodes, *left, g, h, lam, alpha)),
                right: Box::new(to_node(nodes, *right, g, h, lam, alpha)),
            },
        }
    }
    to_node(&nodes, 0, gradients, hessians, config.reg_lambda, config.reg_alpha)
}

fn draw_bag(n: usize, fraction: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let k = ((n as f64 * fraction) as usize).clamp(1, n);
    let mut idx = rand::seq::index::sample(rng, n, k).into_vec();
    idx.sort_unstable();
    idx
}

fn draw_features(n_features: usize, fraction: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
    let k = ((n_features as f64 * fraction).ceil() as usize).clamp(1, n_features);
    let mut idx = rand::seq::index::sample(rng, n_features, k).into_vec();
    idx.sort_unstable();
    idx
}

// ============ LightGBM Regressor ============

#[derive(Debug, Clone)]
pub struct LightGBMRegressor {
    pub config: LightGBMConfig,
    trees: Vec<LGBNode>,
    base_prediction: f64,
    n_features: Option<usize>,
}

impl Default for LightGBMRegressor {
    fn default() -> Self {
        Self::new(LightGBMConfig::default())
    }
}

impl LightGBMRegressor {
    pub fn new(config: LightGBMConfig) -> Self {
        Self { config, trees: Vec::new(), base_prediction: 0.0, n_features: None }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.config.validate()?;

        let n = x.nrows();
        if n == 0 {
            return Err(ForecastError::TrainingError("Empty dataset".into()));
        }
        if n != y.len() {
            return Err(ForecastError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.ncols() == 0 {
            return Err(ForecastError::TrainingError("No feature columns".into()));
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state.unwrap_or(42));
        self.trees.clear();
        self.base_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n, self.base_prediction);
        let hessians: Vec<f64> = vec![1.0; n];
        let bagging = self.config.bagging_freq > 0 && self.config.bagging_fraction < 1.0;
        let mut bag: Vec<usize> = (0..n).collect();

        for round in 0..self.config.n_estimators {
            if bagging && round % self.config.bagging_freq == 0 {
                bag = draw_bag(n, self.config.bagging_fraction, &mut rng);
            }
            let features = draw_features(x.ncols(), self.config.feature_fraction, &mut rng);

            let gradients: Vec<f64> = predictions.iter().zip(y.iter()).map(|(&p, &yi)| p - yi).collect();
            let tree = build_lgb_tree(x, &gradients, &hessians, &bag, &features, &self.config);

            for (pred, row) in predictions.iter_mut().zip(x.rows()) {
                *pred += self.config.learning_rate * tree.predict(row);
            }
            self.trees.push(tree);
        }

        self.n_features = Some(x.ncols());
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let n_features = self.n_features.ok_or(ForecastError::ModelNotFitted)?;
        if x.ncols() != n_features {
            return Err(ForecastError::ShapeError {
                expected: format!("{} features", n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| {
                self.base_prediction
                    + self.trees.iter().map(|t| self.config.learning_rate * t.predict(row)).sum::<f64>()
            })
            .collect())
    }

    /// Number of boosting rounds completed
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Leaf counts per tree
    pub fn leaves_per_tree(&self) -> Vec<usize> {
        self.trees.iter().map(LGBNode::n_leaves).collect()
    }
}

impl Regressor for LightGBMRegressor {
    fn name(&self) -> &'static str {
        "lightgbm"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        LightGBMRegressor::fit(self, x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        LightGBMRegressor::predict(self, x)
    }
}
