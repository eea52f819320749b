//! Regression evaluation metrics

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Goodness-of-fit metrics persisted with every trained bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// R-squared on the held-out subset
    pub r2: f64,
    /// Mean absolute error on the held-out subset
    pub mae: f64,
}

impl RegressionMetrics {
    /// Compute metrics from true and predicted values.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len() as f64;
        if n == 0.0 {
            return Self { r2: 0.0, mae: 0.0 };
        }

        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean: f64 = y_true.iter().sum::<f64>() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        Self { r2, mae }
    }

    /// Round both metrics to `places` decimal places.
    pub fn rounded(self, places: i32) -> Self {
        Self {
            r2: round_to(self.r2, places),
            mae: round_to(self.mae, places),
        }
    }
}

/// Round `value` to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_fit() {
        let y = array![1.0, 2.0, 3.0];
        let metrics = RegressionMetrics::compute(&y, &y);
        assert_eq!(metrics.r2, 1.0);
        assert_eq!(metrics.mae, 0.0);
    }

    #[test]
    fn test_known_values() {
        let y_true = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let y_pred = array![1.1, 2.0, 2.9, 4.1, 5.0];

        let metrics = RegressionMetrics::compute(&y_true, &y_pred);
        assert!(metrics.r2 > 0.9);
        assert!((metrics.mae - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_constant_target_yields_zero_r2() {
        let y_true = array![3.0, 3.0, 3.0];
        let y_pred = array![2.0, 3.0, 4.0];
        let metrics = RegressionMetrics::compute(&y_true, &y_pred);
        assert_eq!(metrics.r2, 0.0);
    }

    #[test]
    fn test_rounding() {
        let metrics = RegressionMetrics {
            r2: 0.87654,
            mae: 1.23456,
        };
        let rounded = metrics.rounded(3);
        assert_eq!(rounded.r2, 0.877);
        assert_eq!(rounded.mae, 1.235);
        assert_eq!(round_to(24.555, 2), 24.56);
    }
}
