//! AdaBoost (SAMME) over weighted decision stumps

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, SplitMode, TreeParams};
use super::Classifier;
use crate::pipeline::error::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaBoostParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
}

impl Default for AdaBoostParams {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 1.0,
        }
    }
}

impl AdaBoostParams {
    pub fn sample(rng: &mut StdRng) -> Self {
        Self {
            n_estimators: rng.gen_range(10..=300),
            learning_rate: 10f64.powf(rng.gen_range(-3.0..0.0)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoost {
    stumps: Vec<DecisionTree>,
    alphas: Vec<f64>,
}

fn stump_vote(stump: &DecisionTree, row: &[f64]) -> f64 {
    if stump.predict_proba(row) >= 0.5 {
        1.0
    } else {
        -1.0
    }
}

impl Classifier for AdaBoost {
    type Params = AdaBoostParams;

    fn fit(params: &AdaBoostParams, x: &[Vec<f64>], y: &[u8], seed: u64) -> Result<Self, ModelError> {
        if params.n_estimators == 0 || params.learning_rate <= 0.0 {
            return Err(ModelError::FitError(format!(
                "invalid boosting setup: n_estimators {}, learning_rate {}",
                params.n_estimators, params.learning_rate
            )));
        }

        let stump_params = TreeParams {
            max_depth: Some(1),
            ..TreeParams::default()
        };
        let n = x.len();
        let rows: Vec<usize> = (0..n).collect();
        let mut weights = vec![1.0 / n as f64; n];
        let mut stumps = Vec::new();
        let mut alphas = Vec::new();

        for round in 0..params.n_estimators {
            let stump = DecisionTree::grow(
                &stump_params,
                x,
                y,
                &weights,
                rows.clone(),
                SplitMode::Best,
                seed.wrapping_add(round as u64),
            )?;

            let miss: Vec<bool> = x
                .iter()
                .zip(y)
                .map(|(row, &label)| (stump_vote(&stump, row) > 0.0) != (label == 1))
                .collect();
            let total: f64 = weights.iter().sum();
            let error: f64 = weights
                .iter()
                .zip(&miss)
                .filter(|(_, m)| **m)
                .map(|(w, _)| w)
                .sum::<f64>()
                / total;

            if error <= 0.0 {
                // A perfect stump decides alone
                stumps.push(stump);
                alphas.push(1.0);
                break;
            }
            if error >= 0.5 {
                break;
            }

            let alpha = params.learning_rate * ((1.0 - error) / error).ln();
            for (w, m) in weights.iter_mut().zip(&miss) {
                if *m {
                    *w *= alpha.exp();
                }
            }
            let total: f64 = weights.iter().sum();
            weights.iter_mut().for_each(|w| *w /= total);

            stumps.push(stump);
            alphas.push(alpha);
        }

        if stumps.is_empty() {
            return Err(ModelError::FitError(
                "no weak learner did better than chance".to_string(),
            ));
        }

        Ok(Self { stumps, alphas })
    }

    /// Normalized vote in [-1, 1] mapped through a logistic link
    fn predict_proba(&self, row: &[f64]) -> f64 {
        let total: f64 = self.alphas.iter().sum();
        let vote: f64 = self
            .stumps
            .iter()
            .zip(&self.alphas)
            .map(|(s, a)| a * stump_vote(s, row))
            .sum::<f64>()
            / total;
        super::sigmoid(2.0 * vote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::models::test_data::{accuracy, separable};

    #[test]
    fn test_boosted_stumps_fit_additive_boundary() {
        let (x, y) = separable(200);
        let model = AdaBoost::fit(&AdaBoostParams::default(), &x, &y, 0).unwrap();
        assert!(model.stumps.len() > 1);
        assert!(accuracy(|r| model.predict_proba(r), &x, &y) > 0.9);
    }

    #[test]
    fn test_perfect_stump_stops_early() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y: Vec<u8> = (0..10).map(|i| u8::from(i >= 5)).collect();
        let model = AdaBoost::fit(&AdaBoostParams::default(), &x, &y, 0).unwrap();
        assert_eq!(model.stumps.len(), 1);
        assert!(model.predict_proba(&[8.0]) > 0.5);
        assert!(model.predict_proba(&[1.0]) < 0.5);
    }
}
