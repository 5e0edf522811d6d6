//! L2-regularized logistic regression fitted by Newton's method

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::linear::{dot, solve};
use super::{sigmoid, Classifier};
use crate::pipeline::error::ModelError;

const TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularization strength
    #[serde(rename = "C")]
    pub c: f64,
    pub max_iter: usize,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
        }
    }
}

impl LogisticParams {
    pub fn sample(rng: &mut StdRng) -> Self {
        Self {
            c: 10f64.powf(rng.gen_range(-3.0..1.0)),
            max_iter: [100, 200, 500][rng.gen_range(0..3)],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    pub fn decision_function(&self, row: &[f64]) -> f64 {
        dot(&self.coefficients, row) + self.intercept
    }
}

impl Classifier for LogisticRegression {
    type Params = LogisticParams;

    fn fit(params: &LogisticParams, x: &[Vec<f64>], y: &[u8], _seed: u64) -> Result<Self, ModelError> {
        if params.c <= 0.0 {
            return Err(ModelError::FitError(format!("C must be positive, got {}", params.c)));
        }

        let width = x[0].len();
        // Parameter vector: coefficients followed by the unpenalized intercept
        let dim = width + 1;
        let penalty = 1.0 / params.c;
        let mut beta = vec![0.0; dim];

        for _ in 0..params.max_iter.max(1) {
            let mut gradient = vec![0.0; dim];
            let mut hessian = vec![vec![0.0; dim]; dim];

            for (row, &label) in x.iter().zip(y) {
                let z = dot(&beta[..width], row) + beta[width];
                let p = sigmoid(z);
                let residual = p - f64::from(label);
                let w = (p * (1.0 - p)).max(1e-10);

                for i in 0..dim {
                    let xi = if i < width { row[i] } else { 1.0 };
                    gradient[i] += residual * xi;
                    for j in 0..=i {
                        let xj = if j < width { row[j] } else { 1.0 };
                        hessian[i][j] += w * xi * xj;
                    }
                }
            }

            for i in 0..width {
                gradient[i] += penalty * beta[i];
                hessian[i][i] += penalty;
            }
            for i in 0..dim {
                for j in 0..i {
                    hessian[j][i] = hessian[i][j];
                }
            }

            let step = solve(&hessian, &gradient)?;
            let mut change = 0.0f64;
            for (b, s) in beta.iter_mut().zip(&step) {
                *b -= s;
                change = change.max(s.abs());
            }
            if change < TOLERANCE {
                break;
            }
        }

        let intercept = beta.pop().unwrap_or(0.0);
        Ok(Self {
            coefficients: beta,
            intercept,
        })
    }

    fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(self.decision_function(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::models::test_data::{accuracy, separable};

    #[test]
    fn test_fits_separable_clusters() {
        let (x, y) = separable(200);
        let model = LogisticRegression::fit(&LogisticParams::default(), &x, &y, 0).unwrap();
        assert!(model.coefficients[0] > 0.0 && model.coefficients[1] > 0.0);
        assert!(accuracy(|r| model.predict_proba(r), &x, &y) > 0.95);
    }

    #[test]
    fn test_stronger_penalty_shrinks_weights() {
        let (x, y) = separable(200);
        let loose = LogisticRegression::fit(&LogisticParams::default(), &x, &y, 0).unwrap();
        let tight = LogisticRegression::fit(
            &LogisticParams {
                c: 0.01,
                max_iter: 100,
            },
            &x,
            &y,
            0,
        )
        .unwrap();
        assert!(tight.coefficients[0].abs() < loose.coefficients[0].abs());
    }

    #[test]
    fn test_serialized_params_use_c_key() {
        let json = serde_json::to_value(LogisticParams::default()).unwrap();
        assert_eq!(json["C"], 1.0);
    }
}
