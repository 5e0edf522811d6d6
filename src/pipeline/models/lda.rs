//! Two-class linear discriminant analysis with optional shrinkage

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::linear::{column_means, dot, solve};
use super::{sigmoid, Classifier};
use crate::pipeline::error::ModelError;

/// Diagonal loading that keeps one-hot blocks invertible
const RIDGE: f64 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LdaParams {
    /// Blend of the pooled covariance towards a scaled identity, in [0, 1]
    pub shrinkage: Option<f64>,
}

impl LdaParams {
    pub fn sample(rng: &mut StdRng) -> Self {
        Self {
            shrinkage: if rng.gen_bool(0.2) {
                None
            } else {
                Some(rng.gen_range(0.0..1.0))
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearDiscriminant {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Classifier for LinearDiscriminant {
    type Params = LdaParams;

    fn fit(params: &LdaParams, x: &[Vec<f64>], y: &[u8], _seed: u64) -> Result<Self, ModelError> {
        let width = x[0].len();
        let mut neg_rows = Vec::new();
        let mut pos_rows = Vec::new();
        for (row, &label) in x.iter().zip(y) {
            if label == 1 {
                pos_rows.push(row.clone());
            } else {
                neg_rows.push(row.clone());
            }
        }

        let mu0 = column_means(&neg_rows);
        let mu1 = column_means(&pos_rows);

        let mut cov = vec![vec![0.0; width]; width];
        for (rows, mu) in [(&neg_rows, &mu0), (&pos_rows, &mu1)] {
            for row in rows {
                for i in 0..width {
                    let di = row[i] - mu[i];
                    for j in 0..width {
                        cov[i][j] += di * (row[j] - mu[j]);
                    }
                }
            }
        }
        let n = x.len() as f64;
        cov.iter_mut().flatten().for_each(|v| *v /= n);

        if let Some(shrinkage) = params.shrinkage {
            if !(0.0..=1.0).contains(&shrinkage) {
                return Err(ModelError::FitError(format!(
                    "shrinkage must be in [0, 1], got {}",
                    shrinkage
                )));
            }
            let mean_var = (0..width).map(|i| cov[i][i]).sum::<f64>() / width.max(1) as f64;
            for (i, row) in cov.iter_mut().enumerate() {
                for (j, v) in row.iter_mut().enumerate() {
                    *v *= 1.0 - shrinkage;
                    if i == j {
                        *v += shrinkage * mean_var;
                    }
                }
            }
        }
        for (i, row) in cov.iter_mut().enumerate() {
            row[i] += RIDGE;
        }

        let diff: Vec<f64> = mu1.iter().zip(&mu0).map(|(a, b)| a - b).collect();
        let coefficients = solve(&cov, &diff)?;

        let midpoint: Vec<f64> = mu1.iter().zip(&mu0).map(|(a, b)| (a + b) / 2.0).collect();
        let prior_ratio = (pos_rows.len() as f64 / neg_rows.len() as f64).ln();
        let intercept = prior_ratio - dot(&coefficients, &midpoint);

        Ok(Self {
            coefficients,
            intercept,
        })
    }

    fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(dot(&self.coefficients, row) + self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::models::test_data::{accuracy, separable};

    #[test]
    fn test_fits_separable_clusters() {
        let (x, y) = separable(200);
        let model = LinearDiscriminant::fit(&LdaParams::default(), &x, &y, 0).unwrap();
        assert!(accuracy(|r| model.predict_proba(r), &x, &y) > 0.95);
    }

    #[test]
    fn test_collinear_columns_still_solve() {
        let (x, y) = separable(100);
        // Append a duplicated column, as a two-level one-hot block would produce
        let x: Vec<Vec<f64>> = x
            .into_iter()
            .map(|mut r| {
                r.push(r[0]);
                r
            })
            .collect();
        let model = LinearDiscriminant::fit(&LdaParams { shrinkage: Some(0.1) }, &x, &y, 0).unwrap();
        assert!(model.coefficients.iter().all(|c| c.is_finite()));
    }
}
