//! Holdout splitting and cross-validation folds

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::config::FoldStrategy;
use super::error::ModelError;

/// Row indices of one cross-validation fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

fn class_indices(labels: &[u8]) -> (Vec<usize>, Vec<usize>) {
    let mut negatives = Vec::new();
    let mut positives = Vec::new();
    for (i, &label) in labels.iter().enumerate() {
        if label == 1 {
            positives.push(i);
        } else {
            negatives.push(i);
        }
    }
    (negatives, positives)
}

/// Shuffled stratified train/holdout split preserving class ratios.
///
/// Each class keeps at least one row on each side when it has two or more rows.
pub fn stratified_split(labels: &[u8], train_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let (mut negatives, mut positives) = class_indices(labels);
    negatives.shuffle(&mut rng);
    positives.shuffle(&mut rng);

    let mut train = Vec::with_capacity(labels.len());
    let mut holdout = Vec::new();

    for class in [&negatives, &positives] {
        let mut n_train = (class.len() as f64 * train_size).round() as usize;
        if class.len() >= 2 {
            n_train = n_train.clamp(1, class.len() - 1);
        } else {
            n_train = class.len();
        }
        train.extend_from_slice(&class[..n_train]);
        holdout.extend_from_slice(&class[n_train..]);
    }

    train.sort_unstable();
    holdout.sort_unstable();
    (train, holdout)
}

/// Build `k` folds over `labels`.
///
/// Stratified folds deal each class's rows round-robin in their original
/// order, so every fold keeps the class proportions. Plain k-fold cuts
/// contiguous blocks.
pub fn make_folds(labels: &[u8], k: usize, strategy: FoldStrategy) -> Result<Vec<Fold>, ModelError> {
    if k < 2 {
        return Err(ModelError::InvalidConfig(format!(
            "fold must be at least 2, got {}",
            k
        )));
    }

    let mut assignment = vec![0usize; labels.len()];

    match strategy {
        FoldStrategy::Stratifiedkfold => {
            let (negatives, positives) = class_indices(labels);
            for (class_name, class) in [("negative", &negatives), ("positive", &positives)] {
                if class.len() < k {
                    return Err(ModelError::InsufficientData {
                        class: class_name.to_string(),
                        required: k,
                        actual: class.len(),
                    });
                }
                for (pos, &row) in class.iter().enumerate() {
                    assignment[row] = pos % k;
                }
            }
        }
        FoldStrategy::Kfold => {
            if labels.len() < k {
                return Err(ModelError::InsufficientData {
                    class: "any".to_string(),
                    required: k,
                    actual: labels.len(),
                });
            }
            let n = labels.len();
            for (row, slot) in assignment.iter_mut().enumerate() {
                *slot = row * k / n;
            }
        }
    }

    Ok((0..k)
        .map(|fold| {
            let (validation, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&row| assignment[row] == fold);
            Fold { train, validation }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(neg: usize, pos: usize) -> Vec<u8> {
        let mut v = vec![0u8; neg];
        v.extend(vec![1u8; pos]);
        v
    }

    #[test]
    fn test_stratified_split_preserves_ratio() {
        let y = labels(70, 30);
        let (train, holdout) = stratified_split(&y, 0.7, 42);
        assert_eq!(train.len() + holdout.len(), 100);

        let train_pos = train.iter().filter(|&&i| y[i] == 1).count();
        let holdout_pos = holdout.iter().filter(|&&i| y[i] == 1).count();
        assert_eq!(train_pos, 21);
        assert_eq!(holdout_pos, 9);
    }

    #[test]
    fn test_stratified_split_is_deterministic() {
        let y = labels(40, 20);
        assert_eq!(stratified_split(&y, 0.7, 7), stratified_split(&y, 0.7, 7));
    }

    #[test]
    fn test_stratified_folds_cover_every_row_once() {
        let y = labels(23, 11);
        let folds = make_folds(&y, 5, FoldStrategy::Stratifiedkfold).unwrap();
        assert_eq!(folds.len(), 5);

        let mut seen = vec![0usize; y.len()];
        for fold in &folds {
            for &i in &fold.validation {
                seen[i] += 1;
            }
            assert_eq!(fold.train.len() + fold.validation.len(), y.len());
            let pos = fold.validation.iter().filter(|&&i| y[i] == 1).count();
            assert!(pos == 2 || pos == 3, "fold positives {}", pos);
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_too_few_minority_rows() {
        let y = labels(20, 3);
        let err = make_folds(&y, 5, FoldStrategy::Stratifiedkfold).unwrap_err();
        assert_eq!(
            err,
            ModelError::InsufficientData {
                class: "positive".to_string(),
                required: 5,
                actual: 3
            }
        );
    }

    #[test]
    fn test_plain_kfold_blocks() {
        let y = labels(6, 4);
        let folds = make_folds(&y, 5, FoldStrategy::Kfold).unwrap();
        assert_eq!(folds[0].validation, vec![0, 1]);
        assert_eq!(folds[4].validation, vec![8, 9]);
    }
}
