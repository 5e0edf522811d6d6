//! k-nearest-neighbours vote over stored training rows

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::pipeline::error::ModelError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnnWeights {
    #[default]
    Uniform,
    /// Votes weighted by inverse distance
    Distance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnParams {
    pub n_neighbors: usize,
    pub weights: KnnWeights,
}

impl Default for KnnParams {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            weights: KnnWeights::Uniform,
        }
    }
}

impl KnnParams {
    pub fn sample(rng: &mut StdRng) -> Self {
        Self {
            n_neighbors: rng.gen_range(1..=50),
            weights: if rng.gen_bool(0.5) {
                KnnWeights::Uniform
            } else {
                KnnWeights::Distance
            },
        }
    }
}

/// Squared Euclidean distance
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Indices into `candidates` of the `k` points nearest to `point`, nearest
/// first. `skip` excludes one candidate (the point itself). Ties go to the
/// lower index.
pub fn nearest_neighbors(
    point: &[f64],
    candidates: &[&[f64]],
    k: usize,
    skip: Option<usize>,
) -> Vec<(usize, f64)> {
    let mut dists: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .map(|(i, c)| (i, squared_distance(point, c)))
        .collect();
    dists.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    dists.truncate(k);
    dists
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNearestNeighbors {
    params: KnnParams,
    rows: Vec<Vec<f64>>,
    labels: Vec<u8>,
}

impl Classifier for KNearestNeighbors {
    type Params = KnnParams;

    fn fit(params: &KnnParams, x: &[Vec<f64>], y: &[u8], _seed: u64) -> Result<Self, ModelError> {
        if params.n_neighbors == 0 {
            return Err(ModelError::FitError("n_neighbors must be at least 1".to_string()));
        }
        Ok(Self {
            params: params.clone(),
            rows: x.to_vec(),
            labels: y.to_vec(),
        })
    }

    fn predict_proba(&self, row: &[f64]) -> f64 {
        let candidates: Vec<&[f64]> = self.rows.iter().map(Vec::as_slice).collect();
        let k = self.params.n_neighbors.min(candidates.len());
        let neighbours = nearest_neighbors(row, &candidates, k, None);

        if self.params.weights == KnnWeights::Distance {
            // An exact match decides the vote on its own
            let exact: Vec<usize> = neighbours
                .iter()
                .filter(|(_, d)| *d == 0.0)
                .map(|(i, _)| *i)
                .collect();
            if !exact.is_empty() {
                let pos = exact.iter().filter(|&&i| self.labels[i] == 1).count();
                return pos as f64 / exact.len() as f64;
            }
        }

        let (mut pos, mut total) = (0.0, 0.0);
        for (i, d) in &neighbours {
            let w = match self.params.weights {
                KnnWeights::Uniform => 1.0,
                KnnWeights::Distance => 1.0 / d.sqrt(),
            };
            total += w;
            if self.labels[*i] == 1 {
                pos += w;
            }
        }
        if total > 0.0 {
            pos / total
        } else {
            0.0
        }
    }
}
