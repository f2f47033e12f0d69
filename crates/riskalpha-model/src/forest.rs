//! Random forest regression.
//!
//! Bootstrap-aggregated CART trees grown on variance reduction. Each tree has
//! its own RNG seeded from the forest seed and the tree index, so the fitted
//! forest does not depend on how rayon schedules the trees.
//!
//! Importances are signed mean decrease in impurity: every split adds its
//! impurity decrease to the split feature, positive when the right child
//! (higher feature value) has the higher mean target and negative otherwise.
//! Per-tree totals are normalized by the tree's absolute decrease and then
//! averaged over trees.

use crate::error::{ModelError, Result};
use crate::predictor::{ModelFamily, Predictor};
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Random forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    /// Number of trees
    pub n_trees: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples in each leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (`None` = all)
    pub max_features: Option<usize>,
    /// RNG seed; `None` takes the run seed, or [`DEFAULT_FOREST_SEED`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Seed used when neither the forest nor the run sets one.
pub const DEFAULT_FOREST_SEED: u64 = 42;

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_leaf: 1,
            max_features: None,
            seed: None,
        }
    }
}

impl ForestParams {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.n_trees == 0 {
            return Err(ModelError::InvalidParameter("n_trees must be >= 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(ModelError::InvalidParameter("max_depth must be >= 1".to_string()));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParameter(
                "min_samples_leaf must be >= 1".to_string(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(ModelError::InvalidParameter(
                "max_features must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Fill in `seed` when the forest section left it unset.
    #[must_use]
    pub const fn or_seed(mut self, seed: u64) -> Self {
        if self.seed.is_none() {
            self.seed = Some(seed);
        }
        self
    }

    /// Seed the fit will use.
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_FOREST_SEED)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single regression tree stored as a flat node arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn predict(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = features.get(*feature).copied().unwrap_or(0.0);
                    index = if x <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Number of nodes.
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
    sign: f64,
}

struct TreeBuilder<'a> {
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'a, f64>,
    params: ForestParams,
    rng: StdRng,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl<'a> TreeBuilder<'a> {
    fn new(x: ArrayView2<'a, f64>, y: ArrayView1<'a, f64>, params: ForestParams, seed: u64) -> Self {
        Self {
            x,
            y,
            params,
            rng: StdRng::seed_from_u64(seed),
            nodes: Vec::new(),
            importances: vec![0.0; x.ncols()],
        }
    }

    fn grow(mut self) -> (RegressionTree, Vec<f64>) {
        let n = self.x.nrows();
        let samples: Vec<usize> = (0..n).map(|_| self.rng.gen_range(0..n)).collect();
        self.build(samples, 0);

        let total: f64 = self.importances.iter().map(|v| v.abs()).sum();
        if total > 0.0 {
            self.importances.iter_mut().for_each(|v| *v /= total);
        }
        (RegressionTree { nodes: self.nodes }, self.importances)
    }

    fn build(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let index = self.nodes.len();
        let mean = samples.iter().map(|&s| self.y[s]).sum::<f64>() / samples.len() as f64;
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= self.params.max_depth || samples.len() < 2 * self.params.min_samples_leaf {
            return index;
        }
        let Some(split) = self.best_split(&samples) else {
            return index;
        };

        self.importances[split.feature] += split.sign * split.gain;
        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| self.x[[s, split.feature]] <= split.threshold);

        let left = self.build(left, depth + 1);
        let right = self.build(right, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        index
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let p = self.x.ncols();
        match self.params.max_features {
            Some(k) if k < p => {
                let mut picked = rand::seq::index::sample(&mut self.rng, p, k).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..p).collect(),
        }
    }

    fn best_split(&mut self, samples: &[usize]) -> Option<BestSplit> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf;
        let total_sum: f64 = samples.iter().map(|&s| self.y[s]).sum();
        let total_sq: f64 = samples.iter().map(|&s| self.y[s] * self.y[s]).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;
        if parent_sse <= 1e-12 {
            return None;
        }

        let mut best: Option<BestSplit> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);
        for feature in self.candidate_features() {
            pairs.clear();
            pairs.extend(samples.iter().map(|&s| (self.x[[s, feature]], self.y[s])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            if pairs[0].0 == pairs[n - 1].0 {
                continue;
            }

            let (mut left_sum, mut left_sq) = (0.0, 0.0);
            for i in 0..n - 1 {
                left_sum += pairs[i].1;
                left_sq += pairs[i].1 * pairs[i].1;
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf || pairs[i].0 == pairs[i + 1].0 {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let left_sse = left_sq - left_sum * left_sum / n_left as f64;
                let right_sse = right_sq - right_sum * right_sum / n_right as f64;
                let gain = parent_sse - left_sse - right_sse;

                if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    let right_mean = right_sum / n_right as f64;
                    let left_mean = left_sum / n_left as f64;
                    best = Some(BestSplit {
                        feature,
                        threshold: 0.5 * (pairs[i].0 + pairs[i + 1].0),
                        gain,
                        sign: if right_mean >= left_mean { 1.0 } else { -1.0 },
                    });
                }
            }
        }
        best
    }
}

/// Fitted random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestModel {
    trees: Vec<RegressionTree>,
    importances: Vec<f64>,
    n_features: usize,
    params: ForestParams,
}

impl RandomForestModel {
    /// Fit a forest on a design matrix (rows are documents) and targets.
    pub fn fit(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, params: ForestParams) -> Result<Self> {
        params.validate()?;
        let (n, p) = x.dim();
        if y.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                actual: y.len(),
            });
        }
        if n == 0 {
            return Err(ModelError::InvalidParameter(
                "cannot fit a forest on zero samples".to_string(),
            ));
        }

        let seed = params.effective_seed();
        let grown: Vec<(RegressionTree, Vec<f64>)> = (0..params.n_trees)
            .into_par_iter()
            .map(|t| {
                TreeBuilder::new(x.view(), y.view(), params, seed.wrapping_add(t as u64))
                    .grow()
            })
            .collect();

        let mut importances = vec![0.0; p];
        let mut trees = Vec::with_capacity(grown.len());
        for (tree, tree_importances) in grown {
            for (acc, v) in importances.iter_mut().zip(tree_importances) {
                *acc += v;
            }
            trees.push(tree);
        }
        let scale = params.n_trees as f64;
        importances.iter_mut().for_each(|v| *v /= scale);

        Ok(Self {
            trees,
            importances,
            n_features: p,
            params,
        })
    }

    /// Fitted trees.
    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Hyperparameters used at fit time.
    pub const fn params(&self) -> &ForestParams {
        &self.params
    }
}

impl Predictor for RandomForestModel {
    fn family(&self) -> ModelFamily {
        ModelFamily::RandomForest
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> f64 {
        self.trees.iter().map(|t| t.predict(features)).sum::<f64>() / self.trees.len() as f64
    }

    fn importances(&self) -> Vec<f64> {
        self.importances.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn step_data() -> (Array2<f64>, Array1<f64>) {
        // Feature 0 pushes the target up, feature 1 pushes it down, feature 2 is constant.
        let mut x = Array2::zeros((40, 3));
        let mut y = Array1::zeros(40);
        for i in 0..40 {
            let up = if i % 4 == 0 { 1.0 } else { 0.0 };
            let down = if i % 5 == 0 { 1.0 } else { 0.0 };
            x[[i, 0]] = up;
            x[[i, 1]] = down;
            y[i] = up - down;
        }
        (x, y)
    }

    #[test]
    fn test_importance_signs() {
        let (x, y) = step_data();
        let params = ForestParams {
            n_trees: 20,
            ..ForestParams::default()
        };
        let model = RandomForestModel::fit(x.view(), y.view(), params).unwrap();
        let importances = model.importances();
        assert!(importances[0] > 0.0);
        assert!(importances[1] < 0.0);
        assert_eq!(importances[2], 0.0);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = step_data();
        let params = ForestParams {
            n_trees: 8,
            max_features: Some(2),
            ..ForestParams::default()
        };
        let a = RandomForestModel::fit(x.view(), y.view(), params).unwrap();
        let b = RandomForestModel::fit(x.view(), y.view(), params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_changes_bootstrap() {
        let (x, y) = step_data();
        let params = ForestParams {
            n_trees: 4,
            max_features: Some(1),
            ..ForestParams::default()
        };
        let a = RandomForestModel::fit(x.view(), y.view(), params.or_seed(1)).unwrap();
        let b = RandomForestModel::fit(x.view(), y.view(), params.or_seed(2)).unwrap();
        assert_ne!(a.trees(), b.trees());
        assert_eq!(params.or_seed(1).or_seed(2).seed, Some(1));
        assert_eq!(params.effective_seed(), DEFAULT_FOREST_SEED);
    }

    #[test]
    fn test_predicts_step() {
        let (x, y) = step_data();
        let model = RandomForestModel::fit(x.view(), y.view(), ForestParams::default()).unwrap();
        assert!(model.predict(&[1.0, 0.0, 0.0]) > 0.5);
        assert!(model.predict(&[0.0, 1.0, 0.0]) < -0.5);
    }

    #[test]
    fn test_zero_trees_rejected() {
        let (x, y) = step_data();
        let params = ForestParams {
            n_trees: 0,
            ..ForestParams::default()
        };
        assert!(RandomForestModel::fit(x.view(), y.view(), params).is_err());
    }
}
