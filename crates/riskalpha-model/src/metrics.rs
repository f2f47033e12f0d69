//! Goodness-of-fit metrics.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coefficient of determination.
///
/// Defined as 0 when the target has no variance.
pub fn r2_score(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    let Some(mean) = y_true.mean() else {
        return 0.0;
    };
    let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot <= f64::EPSILON {
        return 0.0;
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}

/// Mean squared error.
pub fn mean_squared_error(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(y, p)| (y - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Mean absolute error.
pub fn mean_absolute_error(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(y, p)| (y - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

/// Pearson correlation, or `None` when either input is constant or shorter than 2.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a[..n].iter().zip(&b[..n]) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    if var_a <= f64::EPSILON || var_b <= f64::EPSILON {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Evaluation of one horizon's model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    /// R-squared on the evaluation rows
    pub r2: f64,
    /// Mean squared error on the evaluation rows
    pub mse: f64,
    /// Mean absolute error on the evaluation rows
    pub mae: f64,
    /// Training rows
    pub n_train: usize,
    /// Held-out rows (0 when evaluated in-sample)
    pub n_test: usize,
    /// Whether the metrics come from held-out documents
    pub out_of_sample: bool,
    /// R-squared of each comparison family, keyed by family name
    #[serde(default)]
    pub comparison: BTreeMap<String, f64>,
    /// Additional diagnostics attached by the caller
    #[serde(default)]
    pub diagnostics: BTreeMap<String, f64>,
}

impl EvaluationMetrics {
    /// Flatten into `metric name -> value`.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("r2".to_string(), self.r2);
        map.insert("mse".to_string(), self.mse);
        map.insert("mae".to_string(), self.mae);
        map.insert("n_train".to_string(), self.n_train as f64);
        map.insert("n_test".to_string(), self.n_test as f64);
        map.insert(
            "out_of_sample".to_string(),
            if self.out_of_sample { 1.0 } else { 0.0 },
        );
        for (family, r2) in &self.comparison {
            map.insert(format!("r2_{}", family), *r2);
        }
        for (name, value) in &self.diagnostics {
            map.insert(name.clone(), *value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_perfect_fit() {
        let y = array![1.0, 2.0, 3.0];
        assert_relative_eq!(r2_score(y.view(), y.view()), 1.0);
        assert_relative_eq!(mean_squared_error(y.view(), y.view()), 0.0);
    }

    #[test]
    fn test_mean_prediction_has_zero_r2() {
        let y = array![1.0, 2.0, 3.0];
        let p = array![2.0, 2.0, 2.0];
        assert_relative_eq!(r2_score(y.view(), p.view()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(mean_absolute_error(y.view(), p.view()), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_target() {
        let y = array![0.5, 0.5];
        let p = array![0.0, 1.0];
        assert_eq!(r2_score(y.view(), p.view()), 0.0);
    }

    #[test]
    fn test_pearson() {
        assert_relative_eq!(
            pearson_correlation(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap(),
            1.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            pearson_correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(),
            -1.0,
            epsilon = 1e-12
        );
        assert!(pearson_correlation(&[1.0, 1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_to_map_keys() {
        let mut metrics = EvaluationMetrics {
            r2: 0.1,
            n_train: 8,
            n_test: 2,
            out_of_sample: true,
            ..EvaluationMetrics::default()
        };
        metrics.comparison.insert("random_forest".to_string(), 0.05);
        metrics.diagnostics.insert("text_length_corr".to_string(), -0.2);

        let map = metrics.to_map();
        assert_eq!(map["n_train"], 8.0);
        assert_eq!(map["out_of_sample"], 1.0);
        assert_eq!(map["r2_random_forest"], 0.05);
        assert_eq!(map["text_length_corr"], -0.2);
    }
}
