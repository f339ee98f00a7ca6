//! Negative binomial GLM for expression counts.
//!
//! Log link with per-sample size-factor offsets:
//! `log(mu_ij) = log(s_j) + x_j' beta_i`, `Var(y) = mu + alpha * mu^2`.
//! Coefficients are fitted by IRLS; the dispersion `alpha` is re-estimated
//! by method of moments after every IRLS step.

use crate::data::{CountMatrix, DesignMatrix};
use crate::error::{IobioError, Result};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;

/// Minimum value for mean to avoid log(0).
const MIN_MU: f64 = 1e-10;

/// Dispersion bounds.
const MIN_DISPERSION: f64 = 1e-8;
const MAX_DISPERSION: f64 = 10.0;

/// IRLS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitConfig {
    /// Maximum IRLS iterations per feature.
    pub max_iter: usize,
    /// Relative convergence tolerance on the coefficient vector.
    pub tol: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iter: 50,
            tol: 1e-8,
        }
    }
}

/// Fit of a single feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbFitSingle {
    /// Feature identifier.
    pub feature_id: String,
    /// Estimated coefficients (natural log scale).
    pub coefficients: Vec<f64>,
    /// Standard errors of coefficients.
    pub std_errors: Vec<f64>,
    /// Dispersion `alpha` (`Var = mu + alpha * mu^2`).
    pub dispersion: f64,
    /// Log-likelihood at convergence.
    pub log_likelihood: f64,
    /// Deviance.
    pub deviance: f64,
    /// Number of iterations used.
    pub iterations: usize,
    /// Whether the fit converged.
    pub converged: bool,
}

impl NbFitSingle {
    fn not_fitted(feature_id: &str, n_coef: usize) -> Self {
        Self {
            feature_id: feature_id.to_string(),
            coefficients: vec![f64::NAN; n_coef],
            std_errors: vec![f64::NAN; n_coef],
            dispersion: f64::NAN,
            log_likelihood: f64::NAN,
            deviance: f64::NAN,
            iterations: 0,
            converged: false,
        }
    }

    /// z-statistic for a coefficient.
    pub fn z_statistic(&self, index: usize) -> Option<f64> {
        let coef = self.coefficients.get(index)?;
        let se = self.std_errors.get(index)?;
        if *se > 0.0 {
            Some(coef / se)
        } else {
            None
        }
    }
}

/// Fits for all features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NbFit {
    /// One fit per feature, in count-matrix row order.
    pub fits: Vec<NbFitSingle>,
    /// Coefficient names from the design matrix.
    pub coefficient_names: Vec<String>,
}

impl NbFit {
    /// Fit for a feature by ID.
    pub fn get_feature(&self, feature_id: &str) -> Option<&NbFitSingle> {
        self.fits.iter().find(|f| f.feature_id == feature_id)
    }

    /// Coefficient index by name.
    pub fn coefficient_index(&self, name: &str) -> Option<usize> {
        self.coefficient_names.iter().position(|n| n == name)
    }

    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.fits.len()
    }

    /// Number of fits that converged.
    pub fn n_converged(&self) -> usize {
        self.fits.iter().filter(|f| f.converged).count()
    }
}

/// Fit negative binomial GLMs to every feature.
///
/// Features with zero counts in every sample are not fitted; their
/// statistics are `NaN`.
///
/// # Arguments
/// * `counts` - Count matrix (features × samples)
/// * `design` - Design matrix, rows in the same sample order as `counts`
/// * `size_factors` - Per-sample size factors
/// * `config` - IRLS settings
pub fn model_nb(
    counts: &CountMatrix,
    design: &DesignMatrix,
    size_factors: &[f64],
    config: &FitConfig,
) -> Result<NbFit> {
    let n_samples = counts.n_samples();
    let n_coef = design.n_coefficients();

    if design.n_samples() != n_samples {
        return Err(IobioError::DimensionMismatch {
            expected: n_samples,
            actual: design.n_samples(),
        });
    }
    if size_factors.len() != n_samples {
        return Err(IobioError::DimensionMismatch {
            expected: n_samples,
            actual: size_factors.len(),
        });
    }
    if n_samples <= n_coef {
        return Err(IobioError::StatisticalFit(
            "Model is saturated (n_samples <= n_coefficients)".to_string(),
        ));
    }

    let x = design.matrix();
    let offsets = DVector::from_iterator(n_samples, size_factors.iter().map(|s| s.ln()));

    let fits: Vec<NbFitSingle> = (0..counts.n_features())
        .into_par_iter()
        .map(|i| {
            let feature_id = &counts.feature_ids()[i];
            let y: Vec<f64> = counts.row_dense(i).iter().map(|&v| v as f64).collect();
            if y.iter().all(|&v| v == 0.0) {
                return NbFitSingle::not_fitted(feature_id, n_coef);
            }
            fit_single_nb(&y, feature_id, x, &offsets, config)
        })
        .collect();

    Ok(NbFit {
        fits,
        coefficient_names: design.coefficient_names().to_vec(),
    })
}

fn fit_single_nb(
    y: &[f64],
    feature_id: &str,
    x: &DMatrix<f64>,
    offsets: &DVector<f64>,
    config: &FitConfig,
) -> NbFitSingle {
    let n_samples = y.len();
    let n_coef = x.ncols();
    let y_vec = DVector::from_column_slice(y);

    // Start from the intercept-only mean of normalized counts.
    let norm_mean = y
        .iter()
        .zip(offsets.iter())
        .map(|(yi, o)| yi / o.exp())
        .sum::<f64>()
        / n_samples as f64;
    let mut beta = DVector::zeros(n_coef);
    beta[0] = norm_mean.max(MIN_MU).ln();

    let mut mu = compute_mu(x, &beta, offsets);
    let mut alpha = estimate_dispersion_mom(&y_vec, &mu, n_coef);

    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..config.max_iter {
        iterations = iter + 1;

        // Working weights and response (offset removed from the response).
        let w = irls_weights(&mu, alpha);
        let z = DVector::from_iterator(
            n_samples,
            (0..n_samples).map(|i| {
                let m = mu[i].max(MIN_MU);
                m.ln() - offsets[i] + (y_vec[i] - m) / m
            }),
        );

        let Some(beta_new) = weighted_least_squares(x, &w, &z) else {
            let mut fit = NbFitSingle::not_fitted(feature_id, n_coef);
            fit.coefficients = beta.iter().copied().collect();
            fit.dispersion = alpha;
            fit.iterations = iterations;
            return fit;
        };

        let delta: f64 = (&beta_new - &beta).iter().map(|d| d.abs()).sum();
        let scale: f64 = beta.iter().map(|b| b.abs()).sum::<f64>().max(1.0);

        beta = beta_new;
        mu = compute_mu(x, &beta, offsets);
        alpha = estimate_dispersion_mom(&y_vec, &mu, n_coef);

        if delta / scale < config.tol {
            converged = true;
            break;
        }
    }

    // Standard errors from the Fisher information X' W X.
    let w = irls_weights(&mu, alpha);
    let fisher = weighted_gram(x, &w);
    let std_errors = match fisher.try_inverse() {
        Some(inv) => (0..n_coef).map(|j| inv[(j, j)].max(0.0).sqrt()).collect(),
        None => vec![f64::NAN; n_coef],
    };

    NbFitSingle {
        feature_id: feature_id.to_string(),
        coefficients: beta.iter().copied().collect(),
        std_errors,
        dispersion: alpha,
        log_likelihood: nb_log_likelihood(&y_vec, &mu, alpha),
        deviance: nb_deviance(&y_vec, &mu, alpha),
        iterations,
        converged,
    }
}

/// mu = exp(offset + X * beta).
fn compute_mu(x: &DMatrix<f64>, beta: &DVector<f64>, offsets: &DVector<f64>) -> DVector<f64> {
    let eta = x * beta + offsets;
    eta.map(|e| e.exp().max(MIN_MU))
}

/// W = mu / (1 + alpha * mu).
fn irls_weights(mu: &DVector<f64>, alpha: f64) -> DVector<f64> {
    mu.map(|m| m / (1.0 + alpha * m))
}

/// X' W X.
fn weighted_gram(x: &DMatrix<f64>, w: &DVector<f64>) -> DMatrix<f64> {
    let mut xw = x.clone();
    for (i, mut row) in xw.row_iter_mut().enumerate() {
        row *= w[i].sqrt();
    }
    xw.transpose() * &xw
}

/// beta = (X'WX)^-1 X'Wz.
fn weighted_least_squares(x: &DMatrix<f64>, w: &DVector<f64>, z: &DVector<f64>) -> Option<DVector<f64>> {
    let wz = z.component_mul(w);
    let xtwz = x.transpose() * wz;
    weighted_gram(x, w).try_inverse().map(|inv| inv * xtwz)
}

/// Moment estimate of alpha:
/// `sum(((y - mu)^2 - mu) / mu^2) / (n - p)`, clamped to a sane range.
fn estimate_dispersion_mom(y: &DVector<f64>, mu: &DVector<f64>, n_coef: usize) -> f64 {
    let df = (y.len().saturating_sub(n_coef)).max(1) as f64;
    let total: f64 = y
        .iter()
        .zip(mu.iter())
        .map(|(&yi, &mi)| {
            let m = mi.max(MIN_MU);
            ((yi - m).powi(2) - m) / (m * m)
        })
        .sum();
    (total / df).clamp(MIN_DISPERSION, MAX_DISPERSION)
}

fn nb_log_likelihood(y: &DVector<f64>, mu: &DVector<f64>, alpha: f64) -> f64 {
    let theta = 1.0 / alpha;
    y.iter()
        .zip(mu.iter())
        .map(|(&yi, &mi)| {
            let m = mi.max(MIN_MU);
            ln_gamma(yi + theta) - ln_gamma(theta) - ln_gamma(yi + 1.0)
                + theta * (theta / (theta + m)).ln()
                + yi * (m / (theta + m)).ln()
        })
        .sum()
}

fn nb_deviance(y: &DVector<f64>, mu: &DVector<f64>, alpha: f64) -> f64 {
    let theta = 1.0 / alpha;
    let dev_sum: f64 = y
        .iter()
        .zip(mu.iter())
        .map(|(&yi, &mi)| {
            let m = mi.max(MIN_MU);
            let term1 = if yi > 0.0 { yi * (yi / m).ln() } else { 0.0 };
            let term2 = (yi + theta) * ((yi + theta) / (m + theta)).ln();
            term1 - term2
        })
        .sum();
    2.0 * dev_sum
}
