//! Dense linear-algebra helpers shared by the linear models

use faer::prelude::*;
use faer::Mat;

use crate::pipeline::error::ModelError;

/// Solve `a · x = b` for a square system via partial-pivot LU.
pub fn solve(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>, ModelError> {
    let n = b.len();
    let lhs = Mat::<f64>::from_fn(n, n, |i, j| a[i][j]);
    let rhs = Mat::<f64>::from_fn(n, 1, |i, _| b[i]);

    let solution = lhs.partial_piv_lu().solve(&rhs);
    let x: Vec<f64> = (0..n).map(|i| solution[(i, 0)]).collect();

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(ModelError::FitError(
            "linear system is singular or ill-conditioned".to_string(),
        ))
    }
}

/// Column means of `x`
pub fn column_means(x: &[Vec<f64>]) -> Vec<f64> {
    let width = x.first().map_or(0, Vec::len);
    let n = x.len().max(1) as f64;
    let mut means = vec![0.0; width];
    for row in x {
        for (m, v) in means.iter_mut().zip(row) {
            *m += v;
        }
    }
    means.iter_mut().for_each(|m| *m /= n);
    means
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_two_by_two() {
        let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
        let x = solve(&a, &[3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-10);
        assert!((x[1] - 1.4).abs() < 1e-10);
    }

    #[test]
    fn test_column_means() {
        let x = vec![vec![1.0, 10.0], vec![3.0, 20.0]];
        assert_eq!(column_means(&x), vec![2.0, 15.0]);
    }
}
