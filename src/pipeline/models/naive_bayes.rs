//! Gaussian naive Bayes

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::pipeline::error::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesParams {
    /// Share of the largest feature variance added to every variance
    pub var_smoothing: f64,
}

impl Default for NaiveBayesParams {
    fn default() -> Self {
        Self {
            var_smoothing: 1e-9,
        }
    }
}

impl NaiveBayesParams {
    pub fn sample(rng: &mut StdRng) -> Self {
        Self {
            var_smoothing: 10f64.powf(rng.gen_range(-9.0..0.0)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Per class (negative, positive): log prior
    log_priors: [f64; 2],
    means: [Vec<f64>; 2],
    variances: [Vec<f64>; 2],
}

impl GaussianNaiveBayes {
    fn joint_log_likelihood(&self, class: usize, row: &[f64]) -> f64 {
        let ll: f64 = row
            .iter()
            .zip(self.means[class].iter().zip(&self.variances[class]))
            .map(|(v, (m, var))| {
                -0.5 * (2.0 * std::f64::consts::PI * var).ln() - (v - m).powi(2) / (2.0 * var)
            })
            .sum();
        self.log_priors[class] + ll
    }
}

impl Classifier for GaussianNaiveBayes {
    type Params = NaiveBayesParams;

    fn fit(params: &NaiveBayesParams, x: &[Vec<f64>], y: &[u8], _seed: u64) -> Result<Self, ModelError> {
        let width = x[0].len();
        let mut counts = [0usize; 2];
        let mut sums = [vec![0.0; width], vec![0.0; width]];
        let mut squares = [vec![0.0; width], vec![0.0; width]];

        for (row, &label) in x.iter().zip(y) {
            let c = usize::from(label == 1);
            counts[c] += 1;
            for (i, v) in row.iter().enumerate() {
                sums[c][i] += v;
                squares[c][i] += v * v;
            }
        }

        // Overall variance scales the smoothing term
        let n = x.len() as f64;
        let max_var = (0..width)
            .map(|i| {
                let mean = (sums[0][i] + sums[1][i]) / n;
                (squares[0][i] + squares[1][i]) / n - mean * mean
            })
            .fold(0.0f64, f64::max);
        let epsilon = (params.var_smoothing * max_var).max(1e-12);

        let mut means = [vec![0.0; width], vec![0.0; width]];
        let mut variances = [vec![0.0; width], vec![0.0; width]];
        for c in 0..2 {
            let nc = counts[c] as f64;
            for i in 0..width {
                let mean = sums[c][i] / nc;
                means[c][i] = mean;
                variances[c][i] = (squares[c][i] / nc - mean * mean).max(0.0) + epsilon;
            }
        }

        Ok(Self {
            log_priors: [(counts[0] as f64 / n).ln(), (counts[1] as f64 / n).ln()],
            means,
            variances,
        })
    }

    fn predict_proba(&self, row: &[f64]) -> f64 {
        let neg = self.joint_log_likelihood(0, row);
        let pos = self.joint_log_likelihood(1, row);
        // Two-class softmax in the stable form
        1.0 / (1.0 + (neg - pos).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::models::test_data::{accuracy, separable};

    #[test]
    fn test_fits_separable_clusters() {
        let (x, y) = separable(200);
        let model = GaussianNaiveBayes::fit(&NaiveBayesParams::default(), &x, &y, 0).unwrap();
        assert!(accuracy(|r| model.predict_proba(r), &x, &y) > 0.9);
    }

    #[test]
    fn test_constant_feature_does_not_blow_up() {
        let x = vec![vec![1.0, 0.0], vec![1.0, 1.0], vec![1.0, 5.0], vec![1.0, 6.0]];
        let y = [0, 0, 1, 1];
        let model = GaussianNaiveBayes::fit(&NaiveBayesParams::default(), &x, &y, 0).unwrap();
        let p = model.predict_proba(&[1.0, 5.5]);
        assert!(p.is_finite() && p > 0.5);
    }
}
