//! Ridge regression.
//!
//! Minimizes `||y - X b - c||^2 + alpha ||b||^2` with an unpenalized intercept.
//! Columns and target are centered first. With `p <= n` the primal system
//! `(Xc^T Xc + alpha I) b = Xc^T yc` is solved; with `n < p` the dual
//! `(Xc Xc^T + alpha I) a = yc`, `b = Xc^T a`, keeps the system at `n x n`.

use crate::error::{ModelError, Result};
use crate::linalg::{center, center_columns, cholesky_solve};
use crate::predictor::{ModelFamily, Predictor};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Ridge hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RidgeParams {
    /// L2 penalty strength
    pub alpha: f64,
}

impl Default for RidgeParams {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl RidgeParams {
    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ModelError::InvalidParameter(format!(
                "ridge alpha must be finite and >= 0, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Fitted ridge model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeModel {
    coefficients: Vec<f64>,
    intercept: f64,
    alpha: f64,
}

impl RidgeModel {
    /// Fit on a design matrix (rows are documents) and targets.
    pub fn fit(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, params: RidgeParams) -> Result<Self> {
        params.validate()?;
        let (n, p) = x.dim();
        if y.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                actual: y.len(),
            });
        }
        if n == 0 {
            return Err(ModelError::InvalidParameter(
                "cannot fit ridge on zero samples".to_string(),
            ));
        }

        let (x_mean, xc) = center_columns(x);
        let (y_mean, yc) = center(y);

        let beta: Array1<f64> = if p <= n {
            let mut gram = xc.t().dot(&xc);
            add_ridge(&mut gram, params.alpha);
            cholesky_solve(&gram, &xc.t().dot(&yc))?
        } else {
            let mut gram = xc.dot(&xc.t());
            add_ridge(&mut gram, params.alpha);
            let dual = cholesky_solve(&gram, &yc)?;
            xc.t().dot(&dual)
        };

        let intercept = y_mean - x_mean.dot(&beta);
        Ok(Self {
            coefficients: beta.to_vec(),
            intercept,
            alpha: params.alpha,
        })
    }

    /// Fitted coefficients, one per feature.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Fitted intercept.
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Penalty used at fit time.
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }
}

fn add_ridge(gram: &mut Array2<f64>, alpha: f64) {
    gram.diag_mut().mapv_inplace(|d| d + alpha);
}

impl Predictor for RidgeModel {
    fn family(&self) -> ModelFamily {
        ModelFamily::Ridge
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }

    fn importances(&self) -> Vec<f64> {
        self.coefficients.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rstest::rstest;

    #[test]
    fn test_recovers_linear_relation() {
        // y = 1 + 2 x0 - 3 x1
        let x = array![
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [2.0, 1.0],
            [1.0, 2.0]
        ];
        let y = x.rows().into_iter().map(|r| 1.0 + 2.0 * r[0] - 3.0 * r[1]).collect::<Array1<_>>();
        let model = RidgeModel::fit(x.view(), y.view(), RidgeParams { alpha: 1e-9 }).unwrap();

        assert_relative_eq!(model.coefficients()[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(model.coefficients()[1], -3.0, epsilon = 1e-6);
        assert_relative_eq!(model.intercept(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(model.predict(&[3.0, 3.0]), -2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_dual_matches_primal_direction() {
        // More features than samples forces the dual path.
        let x = array![[1.0, 0.0, 0.0, 0.5], [0.0, 1.0, 0.0, 0.5], [0.0, 0.0, 1.0, 0.5]];
        let y = array![0.3, -0.3, 0.0];
        let model = RidgeModel::fit(x.view(), y.view(), RidgeParams::default()).unwrap();

        let coef = model.coefficients();
        assert!(coef[0] > 0.0);
        assert!(coef[1] < 0.0);
        assert_relative_eq!(coef[2], 0.0, epsilon = 1e-12);
        // A constant column carries no signal once centered.
        assert_relative_eq!(coef[3], 0.0, epsilon = 1e-12);
    }

    #[rstest]
    #[case(0.1)]
    #[case(1.0)]
    #[case(10.0)]
    fn test_penalty_shrinks_coefficients(#[case] alpha: f64) {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];
        let weak = RidgeModel::fit(x.view(), y.view(), RidgeParams { alpha }).unwrap();
        let strong = RidgeModel::fit(x.view(), y.view(), RidgeParams { alpha: alpha * 10.0 }).unwrap();
        assert!(strong.coefficients()[0].abs() < weak.coefficients()[0].abs());
    }

    #[test]
    fn test_negative_alpha_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];
        let result = RidgeModel::fit(x.view(), y.view(), RidgeParams { alpha: -1.0 });
        assert!(matches!(result, Err(ModelError::InvalidParameter(_))));
    }
}
