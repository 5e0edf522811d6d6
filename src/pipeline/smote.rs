//! Minority-class oversampling for training folds
//!
//! SMOTE interpolates between a minority row and one of its `k` nearest
//! minority neighbours until both classes have the same count. Random
//! oversampling duplicates minority rows instead.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::ImbalanceMethod;
use super::models::knn::nearest_neighbors;

/// Rebalance `x`/`y` so both classes have the majority count.
///
/// Synthetic rows are appended after the originals. Inputs that are already
/// balanced or contain a single class are returned unchanged.
pub fn resample(
    x: Vec<Vec<f64>>,
    y: Vec<u8>,
    method: &ImbalanceMethod,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<u8>) {
    let positives = y.iter().filter(|&&l| l == 1).count();
    let negatives = y.len() - positives;
    if positives == 0 || negatives == 0 || positives == negatives {
        return (x, y);
    }

    let minority_label: u8 = if positives < negatives { 1 } else { 0 };
    let n_new = positives.abs_diff(negatives);
    let minority: Vec<usize> = (0..y.len()).filter(|&i| y[i] == minority_label).collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let synthetic: Vec<Vec<f64>> = match method {
        ImbalanceMethod::Smote { k_neighbors } if minority.len() >= 2 => {
            let k = (*k_neighbors).min(minority.len() - 1);
            let points: Vec<&[f64]> = minority.iter().map(|&i| x[i].as_slice()).collect();
            let neighbours: Vec<Vec<usize>> = (0..points.len())
                .map(|i| {
                    nearest_neighbors(points[i], &points, k, Some(i))
                        .into_iter()
                        .map(|(j, _)| j)
                        .collect()
                })
                .collect();

            (0..n_new)
                .map(|_| {
                    let base = rng.gen_range(0..points.len());
                    let other = neighbours[base][rng.gen_range(0..neighbours[base].len())];
                    let gap: f64 = rng.gen();
                    points[base]
                        .iter()
                        .zip(points[other])
                        .map(|(a, b)| a + gap * (b - a))
                        .collect()
                })
                .collect()
        }
        // One minority row, or random oversampling: duplicate rows
        _ => (0..n_new)
            .map(|_| x[minority[rng.gen_range(0..minority.len())]].clone())
            .collect(),
    };

    let mut x = x;
    let mut y = y;
    x.extend(synthetic);
    y.extend(std::iter::repeat(minority_label).take(n_new));
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..12 {
            x.push(vec![i as f64, 0.0]);
            y.push(0);
        }
        for i in 0..4 {
            x.push(vec![100.0 + i as f64, 10.0]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn test_smote_balances_classes() {
        let (x, y) = imbalanced();
        let (xr, yr) = resample(x, y, &ImbalanceMethod::Smote { k_neighbors: 5 }, 42);
        assert_eq!(xr.len(), 24);
        assert_eq!(yr.iter().filter(|&&l| l == 1).count(), 12);
    }

    #[test]
    fn test_smote_rows_lie_between_minority_rows() {
        let (x, y) = imbalanced();
        let (xr, _) = resample(x, y, &ImbalanceMethod::Smote { k_neighbors: 2 }, 7);
        for row in &xr[16..] {
            assert!(row[0] >= 100.0 && row[0] <= 103.0);
            assert_eq!(row[1], 10.0);
        }
    }

    #[test]
    fn test_random_oversampling_duplicates() {
        let (x, y) = imbalanced();
        let minority: Vec<Vec<f64>> = x[12..].to_vec();
        let (xr, yr) = resample(x, y, &ImbalanceMethod::Random, 3);
        assert_eq!(yr.len(), 24);
        assert!(xr[16..].iter().all(|r| minority.contains(r)));
    }

    #[test]
    fn test_single_class_unchanged() {
        let x = vec![vec![1.0], vec![2.0]];
        let (xr, yr) = resample(x.clone(), vec![0, 0], &ImbalanceMethod::default(), 1);
        assert_eq!(xr, x);
        assert_eq!(yr, vec![0, 0]);
    }
}
