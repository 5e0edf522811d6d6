//! Baseline classifier that ignores the features

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::pipeline::error::ModelError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DummyStrategy {
    /// Always the training share of positives
    #[default]
    Prior,
    /// Always 0 or 1 for the majority class
    MostFrequent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DummyParams {
    pub strategy: DummyStrategy,
}

impl DummyParams {
    pub fn sample(_rng: &mut StdRng) -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DummyClassifier {
    proba: f64,
}

impl Classifier for DummyClassifier {
    type Params = DummyParams;

    fn fit(params: &DummyParams, _x: &[Vec<f64>], y: &[u8], _seed: u64) -> Result<Self, ModelError> {
        let prior = y.iter().filter(|&&l| l == 1).count() as f64 / y.len().max(1) as f64;
        let proba = match params.strategy {
            DummyStrategy::Prior => prior,
            DummyStrategy::MostFrequent => f64::from(u8::from(prior > 0.5)),
        };
        Ok(Self { proba })
    }

    fn predict_proba(&self, _row: &[f64]) -> f64 {
        self.proba
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prior_and_majority() {
        let x = vec![vec![0.0]; 4];
        let y = [1, 0, 0, 0];
        let prior = DummyClassifier::fit(&DummyParams::default(), &x, &y, 0).unwrap();
        assert_eq!(prior.predict_proba(&[9.0]), 0.25);

        let params = DummyParams {
            strategy: DummyStrategy::MostFrequent,
        };
        let majority = DummyClassifier::fit(&params, &x, &y, 0).unwrap();
        assert_eq!(majority.predict_proba(&[9.0]), 0.0);
    }
}
