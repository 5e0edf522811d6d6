//! Ridge regression on ±1 targets, thresholded at zero

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::linear::{column_means, dot, solve};
use super::{sigmoid, Classifier};
use crate::pipeline::error::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeParams {
    pub alpha: f64,
}

impl Default for RidgeParams {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl RidgeParams {
    pub fn sample(rng: &mut StdRng) -> Self {
        Self {
            alpha: 10f64.powf(rng.gen_range(-2.0..1.0)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeClassifier {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl RidgeClassifier {
    pub fn decision_function(&self, row: &[f64]) -> f64 {
        dot(&self.coefficients, row) + self.intercept
    }
}

impl Classifier for RidgeClassifier {
    type Params = RidgeParams;

    fn fit(params: &RidgeParams, x: &[Vec<f64>], y: &[u8], _seed: u64) -> Result<Self, ModelError> {
        if params.alpha <= 0.0 {
            return Err(ModelError::FitError(format!(
                "alpha must be positive, got {}",
                params.alpha
            )));
        }

        let width = x[0].len();
        let x_mean = column_means(x);
        let targets: Vec<f64> = y.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect();
        let y_mean = targets.iter().sum::<f64>() / targets.len() as f64;

        // Centred normal equations: (XᵀX + αI) w = Xᵀy
        let mut gram = vec![vec![0.0; width]; width];
        let mut moment = vec![0.0; width];
        for (row, t) in x.iter().zip(&targets) {
            let centred: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            for i in 0..width {
                moment[i] += centred[i] * (t - y_mean);
                for j in 0..width {
                    gram[i][j] += centred[i] * centred[j];
                }
            }
        }
        for (i, row) in gram.iter_mut().enumerate() {
            row[i] += params.alpha;
        }

        let coefficients = solve(&gram, &moment)?;
        let intercept = y_mean - dot(&coefficients, &x_mean);
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    /// Squashed decision value; crosses 0.5 exactly where the decision is 0
    fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(2.0 * self.decision_function(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::models::test_data::{accuracy, separable};

    #[test]
    fn test_fits_separable_clusters() {
        let (x, y) = separable(200);
        let model = RidgeClassifier::fit(&RidgeParams::default(), &x, &y, 0).unwrap();
        assert!(accuracy(|r| model.predict_proba(r), &x, &y) > 0.95);
    }

    #[test]
    fn test_rejects_non_positive_alpha() {
        let (x, y) = separable(20);
        assert!(RidgeClassifier::fit(&RidgeParams { alpha: 0.0 }, &x, &y, 0).is_err());
    }
}
