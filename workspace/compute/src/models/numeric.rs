//! Least-squares glue over `nalgebra`.

use nalgebra::{DMatrix, DVector};

/// Penalized least squares: minimizes `|X b - y|^2 + sum_j penalty_j * b_j^2`.
///
/// `penalties` holds one entry per design column. Returns `None` when the
/// penalized normal equations are not positive definite.
pub fn ridge_solve(design: &DMatrix<f64>, target: &DVector<f64>, penalties: &[f64]) -> Option<DVector<f64>> {
    if design.nrows() != target.len() || design.ncols() != penalties.len() {
        return None;
    }

    let transposed = design.transpose();
    let mut gram = &transposed * design;
    for (j, penalty) in penalties.iter().enumerate() {
        gram[(j, j)] += penalty;
    }
    let moment = &transposed * target;

    let solution = gram.cholesky()?.solve(&moment);
    solution.iter().all(|b| b.is_finite()).then_some(solution)
}
