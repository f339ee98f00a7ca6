//! Wald test for negative binomial GLM coefficients.

use crate::error::{IobioError, Result};
use crate::model::NbFit;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// Result of Wald test for a single feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaldResultSingle {
    /// Feature identifier.
    pub feature_id: String,
    /// Estimated coefficient (natural log scale).
    pub estimate: f64,
    /// Standard error.
    pub std_error: f64,
    /// Wald statistic (z).
    pub statistic: f64,
    /// P-value (two-sided).
    pub p_value: f64,
}

/// Results of Wald tests for all features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaldResult {
    /// Individual test results, in fit order.
    pub results: Vec<WaldResultSingle>,
    /// Coefficient name being tested.
    pub coefficient: String,
}

impl WaldResult {
    /// Number of tests.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Get p-values for all features.
    pub fn p_values(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.p_value).collect()
    }

    /// Get feature IDs.
    pub fn feature_ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.feature_id.as_str()).collect()
    }
}

/// Perform Wald test on negative binomial GLM coefficients.
///
/// Tests H0: β = 0 vs H1: β ≠ 0. The statistic z = β / SE(β) is compared
/// to the standard normal. Features whose fit produced no usable standard
/// error get `NaN` statistics.
pub fn test_wald(fit: &NbFit, coefficient: &str) -> Result<WaldResult> {
    let coef_idx = fit.coefficient_index(coefficient).ok_or_else(|| {
        IobioError::InvalidParameter(format!(
            "Coefficient '{}' not found. Available: {:?}",
            coefficient, fit.coefficient_names
        ))
    })?;

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| IobioError::Numerical(format!("standard normal: {}", e)))?;

    let results = fit
        .fits
        .iter()
        .map(|f| {
            let estimate = f.coefficients.get(coef_idx).copied().unwrap_or(f64::NAN);
            let std_error = f.std_errors.get(coef_idx).copied().unwrap_or(f64::NAN);

            let statistic = if std_error > 0.0 && estimate.is_finite() {
                estimate / std_error
            } else {
                f64::NAN
            };

            let p_value = if statistic.is_nan() {
                f64::NAN
            } else {
                2.0 * (1.0 - normal.cdf(statistic.abs()))
            };

            WaldResultSingle {
                feature_id: f.feature_id.clone(),
                estimate,
                std_error,
                statistic,
                p_value,
            }
        })
        .collect();

    Ok(WaldResult {
        results,
        coefficient: coefficient.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NbFitSingle;
    use approx::assert_relative_eq;

    fn single(id: &str, coef: f64, se: f64) -> NbFitSingle {
        NbFitSingle {
            feature_id: id.to_string(),
            coefficients: vec![2.0, coef],
            std_errors: vec![0.1, se],
            dispersion: 0.1,
            log_likelihood: -10.0,
            deviance: 1.0,
            iterations: 5,
            converged: true,
        }
    }

    fn create_test_fit() -> NbFit {
        NbFit {
            fits: vec![
                single("a", 1.96, 1.0),
                single("b", 0.0, 0.5),
                single("c", f64::NAN, f64::NAN),
            ],
            coefficient_names: vec!["(Intercept)".into(), "Category".into()],
        }
    }

    #[test]
    fn test_wald_z_and_pvalue() {
        let wald = test_wald(&create_test_fit(), "Category").unwrap();
        assert_eq!(wald.len(), 3);

        let a = &wald.results[0];
        assert_relative_eq!(a.statistic, 1.96, epsilon = 1e-12);
        assert_relative_eq!(a.p_value, 0.05, epsilon = 1e-3);

        let b = &wald.results[1];
        assert_relative_eq!(b.p_value, 1.0, epsilon = 1e-12);

        assert!(wald.results[2].p_value.is_nan());
    }

    #[test]
    fn test_unknown_coefficient() {
        let err = test_wald(&create_test_fit(), "batch").unwrap_err();
        assert!(matches!(err, IobioError::InvalidParameter(_)));
    }
}
