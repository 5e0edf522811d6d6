//! Random forest and extremely randomized trees

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, MaxFeatures, SplitMode, TreeParams};
use super::Classifier;
use crate::pipeline::error::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
        }
    }
}

impl ForestParams {
    pub fn sample(rng: &mut StdRng) -> Self {
        Self {
            n_estimators: rng.gen_range(10..=300),
            max_depth: Some(rng.gen_range(1..=11)),
            min_samples_leaf: rng.gen_range(1..=6),
            max_features: [MaxFeatures::All, MaxFeatures::Sqrt, MaxFeatures::Log2]
                [rng.gen_range(0..3)],
        }
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: 2,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        }
    }
}

/// Grow `n_estimators` trees in parallel. Tree `t` is seeded with `seed + t`
/// so the result does not depend on scheduling.
fn grow_trees(
    params: &ForestParams,
    x: &[Vec<f64>],
    y: &[u8],
    seed: u64,
    mode: SplitMode,
    bootstrap: bool,
) -> Result<Vec<DecisionTree>, ModelError> {
    if params.n_estimators == 0 {
        return Err(ModelError::FitError("n_estimators must be at least 1".to_string()));
    }

    let tree_params = params.tree_params();
    let weights = vec![1.0; x.len()];

    (0..params.n_estimators)
        .into_par_iter()
        .map(|t| {
            let tree_seed = seed.wrapping_add(t as u64);
            let rows: Vec<usize> = if bootstrap {
                let mut rng = StdRng::seed_from_u64(tree_seed);
                (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect()
            } else {
                (0..x.len()).collect()
            };
            DecisionTree::grow(&tree_params, x, y, &weights, rows, mode, tree_seed.wrapping_mul(31))
        })
        .collect()
}

fn mean_proba(trees: &[DecisionTree], row: &[f64]) -> f64 {
    trees.iter().map(|t| t.predict_proba(row)).sum::<f64>() / trees.len().max(1) as f64
}

/// Bootstrapped trees with best splits over random feature subsets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl Classifier for RandomForest {
    type Params = ForestParams;

    fn fit(params: &ForestParams, x: &[Vec<f64>], y: &[u8], seed: u64) -> Result<Self, ModelError> {
        Ok(Self {
            trees: grow_trees(params, x, y, seed, SplitMode::Best, true)?,
        })
    }

    fn predict_proba(&self, row: &[f64]) -> f64 {
        mean_proba(&self.trees, row)
    }
}

/// Trees on the full training set with random thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraTrees {
    trees: Vec<DecisionTree>,
}

impl Classifier for ExtraTrees {
    type Params = ForestParams;

    fn fit(params: &ForestParams, x: &[Vec<f64>], y: &[u8], seed: u64) -> Result<Self, ModelError> {
        Ok(Self {
            trees: grow_trees(params, x, y, seed, SplitMode::Random, false)?,
        })
    }

    fn predict_proba(&self, row: &[f64]) -> f64 {
        mean_proba(&self.trees, row)
    }
}
