//! Isolation-forest outlier removal
//!
//! Rows that isolate in few random splits score close to 1. The
//! `threshold` share of highest-scoring training rows is removed before the
//! estimator is fitted. Validation and prediction rows are never filtered.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

const N_TREES: usize = 100;
const MAX_SAMPLES: usize = 256;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(x: &[Vec<f64>], rows: Vec<usize>, height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = IsolationTree { nodes: Vec::new() };
        tree.grow(x, rows, 0, height_limit, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        rows: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });

        if rows.len() <= 1 || depth >= height_limit {
            return id;
        }

        // Only features that still vary can split
        let width = x[rows[0]].len();
        let ranges: Vec<(usize, f64, f64)> = (0..width)
            .filter_map(|f| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    (lo.min(x[r][f]), hi.max(x[r][f]))
                });
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();

        if ranges.is_empty() {
            return id;
        }

        let (feature, lo, hi) = ranges[rng.gen_range(0..ranges.len())];
        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| x[r][feature] < threshold);

        let left = self.grow(x, left_rows, depth + 1, height_limit, rng);
        let right = self.grow(x, right_rows, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[feature] < threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Anomaly score in (0, 1] for every row of `x`
pub fn anomaly_scores(x: &[Vec<f64>], seed: u64) -> Vec<f64> {
    let n = x.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let psi = n.min(MAX_SAMPLES);
    let height_limit = (psi as f64).log2().ceil() as usize;

    let trees: Vec<IsolationTree> = (0..N_TREES)
        .into_par_iter()
        .map(|t| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
            let rows = sample(&mut rng, n, psi).into_vec();
            IsolationTree::build(x, rows, height_limit, &mut rng)
        })
        .collect();

    let norm = average_path_length(psi);
    x.par_iter()
        .map(|row| {
            let mean_depth =
                trees.iter().map(|t| t.path_length(row)).sum::<f64>() / trees.len() as f64;
            2f64.powf(-mean_depth / norm)
        })
        .collect()
}

/// Indices of the rows kept after removing the `threshold` share with the
/// highest anomaly scores. Returned in ascending order.
pub fn inlier_indices(x: &[Vec<f64>], threshold: f64, seed: u64) -> Vec<usize> {
    let n = x.len();
    let n_remove = ((n as f64) * threshold).floor() as usize;
    if n_remove == 0 {
        return (0..n).collect();
    }

    let scores = anomaly_scores(x, seed);
    let mut order: Vec<usize> = (0..n).collect();
    // Highest score first; ties keep row order
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut kept = order.split_off(n_remove);
    kept.sort_unstable();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outlier() -> Vec<Vec<f64>> {
        let mut x: Vec<Vec<f64>> = (0..40)
            .map(|i| vec![(i % 5) as f64 * 0.1, (i % 7) as f64 * 0.1])
            .collect();
        x.push(vec![50.0, -50.0]);
        x
    }

    #[test]
    fn test_far_point_scores_highest() {
        let x = cluster_with_outlier();
        let scores = anomaly_scores(&x, 42);
        let top = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(top, 40);
    }

    #[test]
    fn test_inliers_drop_threshold_share() {
        let x = cluster_with_outlier();
        let kept = inlier_indices(&x, 0.05, 42);
        // floor(41 * 0.05) = 2 rows removed
        assert_eq!(kept.len(), 39);
        assert!(!kept.contains(&40));
        assert!(kept.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_zero_threshold_keeps_everything() {
        let x = cluster_with_outlier();
        assert_eq!(inlier_indices(&x, 0.0, 1).len(), x.len());
    }

    #[test]
    fn test_scores_are_deterministic() {
        let x = cluster_with_outlier();
        assert_eq!(anomaly_scores(&x, 9), anomaly_scores(&x, 9));
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > 9.0 && average_path_length(256) < 11.0);
    }
}
