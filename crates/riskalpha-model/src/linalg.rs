//! Dense linear-algebra helpers for the linear model family.

use crate::error::{ModelError, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Cholesky factor `L` of a symmetric positive definite matrix, with `A = L L^T`.
///
/// # Arguments
/// * `matrix` - Symmetric positive definite matrix
///
/// # Returns
/// * Lower-triangular factor
pub fn cholesky(matrix: &Array2<f64>) -> Result<Array2<f64>> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut diag = matrix[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if diag <= 1e-12 || !diag.is_finite() {
            return Err(ModelError::Singular(format!(
                "non-positive pivot {:.3e} at row {}",
                diag, j
            )));
        }
        let pivot = diag.sqrt();
        l[[j, j]] = pivot;

        for i in (j + 1)..n {
            let mut sum = matrix[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / pivot;
        }
    }
    Ok(l)
}

/// Solve `A x = b` for symmetric positive definite `A`.
pub fn cholesky_solve(matrix: &Array2<f64>, rhs: &Array1<f64>) -> Result<Array1<f64>> {
    let n = matrix.nrows();
    if rhs.len() != n {
        return Err(ModelError::DimensionMismatch {
            expected: n,
            actual: rhs.len(),
        });
    }
    let l = cholesky(matrix)?;

    // Forward substitution: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = rhs[i];
        for k in 0..i {
            sum -= l[[i, k]] * z[k];
        }
        z[i] = sum / l[[i, i]];
    }

    // Back substitution: L^T x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    Ok(x)
}

/// Column means of `x` and the mean-centered copy.
pub fn center_columns(x: ArrayView2<'_, f64>) -> (Array1<f64>, Array2<f64>) {
    let means = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(x.ncols()));
    let centered = &x - &means.view().insert_axis(Axis(0));
    (means, centered)
}

/// Mean of `y` and the mean-centered copy.
pub fn center(y: ArrayView1<'_, f64>) -> (f64, Array1<f64>) {
    let mean = y.mean().unwrap_or(0.0);
    (mean, y.mapv(|v| v - mean))
}
