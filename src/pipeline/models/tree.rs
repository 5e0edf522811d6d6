//! Weighted CART decision tree
//!
//! Splits maximize the weighted Gini reduction. The same builder grows the
//! trees of the random forest (best split over a feature subset), the extra
//! trees (one random threshold per feature) and the AdaBoost stumps (sample
//! weights).

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::pipeline::error::ModelError;

/// Features considered at each split
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    #[default]
    All,
    Sqrt,
    Log2,
}

impl MaxFeatures {
    pub fn count(&self, width: usize) -> usize {
        let n = match self {
            MaxFeatures::All => width,
            MaxFeatures::Sqrt => (width as f64).sqrt() as usize,
            MaxFeatures::Log2 => (width as f64).log2() as usize,
        };
        n.clamp(1, width.max(1))
    }
}

/// How thresholds are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Every midpoint between distinct sorted values
    Best,
    /// One uniform threshold between the node's min and max
    Random,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// None grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
        }
    }
}

impl TreeParams {
    pub fn sample(rng: &mut StdRng) -> Self {
        Self {
            max_depth: Some(rng.gen_range(1..=16)),
            min_samples_split: rng.gen_range(2..=10),
            min_samples_leaf: rng.gen_range(1..=5),
            max_features: [MaxFeatures::All, MaxFeatures::Sqrt, MaxFeatures::Log2]
                [rng.gen_range(0..3)],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TreeNode {
    Leaf {
        proba: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

/// Gini impurity of a weighted binary node: 2p(1 - p)
fn gini_impurity(positive: f64, negative: f64) -> f64 {
    let total = positive + negative;
    if total == 0.0 {
        return 0.0;
    }
    let p = positive / total;
    2.0 * p * (1.0 - p)
}

struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    weights: &'a [f64],
    params: &'a TreeParams,
    mode: SplitMode,
    rng: StdRng,
    nodes: Vec<TreeNode>,
}

impl Builder<'_> {
    fn class_weights(&self, rows: &[usize]) -> (f64, f64) {
        rows.iter().fold((0.0, 0.0), |(pos, neg), &r| {
            if self.y[r] == 1 {
                (pos + self.weights[r], neg)
            } else {
                (pos, neg + self.weights[r])
            }
        })
    }

    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let (pos, neg) = self.class_weights(&rows);
        let id = self.nodes.len();
        let proba = if pos + neg > 0.0 { pos / (pos + neg) } else { 0.0 };
        self.nodes.push(TreeNode::Leaf { proba });

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        let too_small = rows.len() < self.params.min_samples_split
            || rows.len() < 2 * self.params.min_samples_leaf;
        if depth_reached || too_small || pos == 0.0 || neg == 0.0 {
            return id;
        }

        let Some(split) = self.best_split(&rows, pos, neg) else {
            return id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.x[r][split.feature] <= split.threshold);

        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(&mut self, rows: &[usize], pos: f64, neg: f64) -> Option<Candidate> {
        let width = self.x[rows[0]].len();
        let n_features = self.params.max_features.count(width);
        let features: Vec<usize> = if n_features >= width {
            (0..width).collect()
        } else {
            sample(&mut self.rng, width, n_features).into_vec()
        };

        let parent_gini = gini_impurity(pos, neg);
        let mut best: Option<Candidate> = None;

        for feature in features {
            let found = match self.mode {
                SplitMode::Best => self.best_threshold(rows, feature, pos, neg, parent_gini),
                SplitMode::Random => self.random_threshold(rows, feature, pos, neg, parent_gini),
            };
            if let Some(c) = found {
                if best.as_ref().map_or(true, |b| c.gain > b.gain) {
                    best = Some(c);
                }
            }
        }

        best.filter(|c| c.gain > 1e-12)
    }

    fn child_gain(
        &self,
        left: (f64, f64),
        pos: f64,
        neg: f64,
        parent_gini: f64,
    ) -> f64 {
        let total = pos + neg;
        let right = (pos - left.0, neg - left.1);
        let left_share = (left.0 + left.1) / total;
        let right_share = (right.0 + right.1) / total;
        parent_gini
            - left_share * gini_impurity(left.0, left.1)
            - right_share * gini_impurity(right.0, right.1)
    }

    /// Scan sorted values, the way binning searches a single feature
    fn best_threshold(
        &self,
        rows: &[usize],
        feature: usize,
        pos: f64,
        neg: f64,
        parent_gini: f64,
    ) -> Option<Candidate> {
        let mut sorted: Vec<(f64, usize)> = rows.iter().map(|&r| (self.x[r][feature], r)).collect();
        sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let n = sorted.len();
        let min_leaf = self.params.min_samples_leaf;
        let mut left = (0.0f64, 0.0f64);
        let mut best: Option<Candidate> = None;

        for i in 0..n - 1 {
            let (value, r) = sorted[i];
            if self.y[r] == 1 {
                left.0 += self.weights[r];
            } else {
                left.1 += self.weights[r];
            }

            let left_count = i + 1;
            if left_count < min_leaf || n - left_count < min_leaf {
                continue;
            }
            // No threshold separates equal values
            if (value - sorted[i + 1].0).abs() < 1e-12 {
                continue;
            }

            let gain = self.child_gain(left, pos, neg, parent_gini);
            if best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(Candidate {
                    feature,
                    threshold: (value + sorted[i + 1].0) / 2.0,
                    gain,
                });
            }
        }

        best
    }

    fn random_threshold(
        &mut self,
        rows: &[usize],
        feature: usize,
        pos: f64,
        neg: f64,
        parent_gini: f64,
    ) -> Option<Candidate> {
        let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
            (lo.min(self.x[r][feature]), hi.max(self.x[r][feature]))
        });
        if hi - lo < 1e-12 {
            return None;
        }

        let threshold = self.rng.gen_range(lo..hi);
        let mut left = (0.0f64, 0.0f64);
        let mut left_count = 0usize;
        for &r in rows {
            if self.x[r][feature] <= threshold {
                left_count += 1;
                if self.y[r] == 1 {
                    left.0 += self.weights[r];
                } else {
                    left.1 += self.weights[r];
                }
            }
        }

        let min_leaf = self.params.min_samples_leaf;
        if left_count < min_leaf || rows.len() - left_count < min_leaf {
            return None;
        }

        Some(Candidate {
            feature,
            threshold,
            gain: self.child_gain(left, pos, neg, parent_gini),
        })
    }
}

impl DecisionTree {
    /// Grow a tree on the given rows of `x` with per-row sample weights.
    pub fn grow(
        params: &TreeParams,
        x: &[Vec<f64>],
        y: &[u8],
        weights: &[f64],
        rows: Vec<usize>,
        mode: SplitMode,
        seed: u64,
    ) -> Result<Self, ModelError> {
        if params.min_samples_split < 2 || params.min_samples_leaf < 1 {
            return Err(ModelError::FitError(format!(
                "invalid tree limits: min_samples_split {}, min_samples_leaf {}",
                params.min_samples_split, params.min_samples_leaf
            )));
        }
        if rows.is_empty() {
            return Err(ModelError::FitError("cannot grow a tree on zero rows".to_string()));
        }

        let mut builder = Builder {
            x,
            y,
            weights,
            params,
            mode,
            rng: StdRng::seed_from_u64(seed),
            nodes: Vec::new(),
        };
        builder.grow(rows, 0);
        Ok(Self {
            nodes: builder.nodes,
        })
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], id: usize) -> usize {
            match nodes[id] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

impl Classifier for DecisionTree {
    type Params = TreeParams;

    fn fit(params: &TreeParams, x: &[Vec<f64>], y: &[u8], seed: u64) -> Result<Self, ModelError> {
        let weights = vec![1.0; x.len()];
        DecisionTree::grow(params, x, y, &weights, (0..x.len()).collect(), SplitMode::Best, seed)
    }

    fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut id = 0;
        loop {
            match self.nodes[id] {
                TreeNode::Leaf { proba } => return proba,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => id = if row[feature] <= threshold { left } else { right },
            }
        }
    }
}
