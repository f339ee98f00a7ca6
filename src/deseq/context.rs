//! Fitting backends.
//!
//! A [`FittingContext`] is opened once and reused across calls. It owns the
//! [`DifferentialFitter`] that turns a [`DeseqDataSet`] into fitted models,
//! and assembles the per-feature results table from a fit.

use super::dataset::{DeseqDataSet, FittedDataSet};
use crate::correct::correct_bh_wald;
use crate::data::{DeResult, DeResultSet};
use crate::error::Result;
use crate::model::{model_nb, FitConfig};
use crate::normalize::{normalized_counts, size_factors};
use crate::test::test_wald;
use std::f64::consts::LN_2;

/// Something that can fit count models to a data set.
pub trait DifferentialFitter: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Estimate size factors and fit one model per feature.
    fn fit(&self, dataset: &DeseqDataSet) -> Result<FittedDataSet>;
}

/// Median-of-ratios size factors, moment dispersion and a negative
/// binomial GLM per feature.
#[derive(Debug, Clone, Default)]
pub struct NegativeBinomialFitter {
    config: FitConfig,
}

impl NegativeBinomialFitter {
    /// Create a fitter with explicit IRLS settings.
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }
}

impl DifferentialFitter for NegativeBinomialFitter {
    fn name(&self) -> &str {
        "negative-binomial"
    }

    fn fit(&self, dataset: &DeseqDataSet) -> Result<FittedDataSet> {
        let counts = dataset.counts();
        let sf = size_factors(counts)?;
        let normalized = normalized_counts(counts, &sf)?;
        let base_means = normalized.row_iter().map(|r| r.mean()).collect();

        let fit = model_nb(counts, dataset.design(), &sf, &self.config)?;

        let not_converged = fit
            .fits
            .iter()
            .filter(|f| !f.converged && f.coefficients.iter().all(|c| c.is_finite()))
            .count();
        if not_converged > 0 {
            tracing::warn!(
                not_converged,
                total = fit.n_features(),
                "some feature fits did not converge"
            );
        }

        Ok(FittedDataSet {
            size_factors: sf,
            base_means,
            fit,
        })
    }
}

/// Session object through which all fitting goes.
pub struct FittingContext {
    fitter: Box<dyn DifferentialFitter>,
}

impl std::fmt::Debug for FittingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FittingContext")
            .field("fitter", &self.fitter.name())
            .finish()
    }
}

impl Default for FittingContext {
    fn default() -> Self {
        Self::open()
    }
}

impl FittingContext {
    /// Open a context with the default negative binomial fitter.
    pub fn open() -> Self {
        Self::with_fitter(Box::new(NegativeBinomialFitter::default()))
    }

    /// Open a context with the negative binomial fitter and custom settings.
    pub fn with_config(config: FitConfig) -> Self {
        Self::with_fitter(Box::new(NegativeBinomialFitter::new(config)))
    }

    /// Open a context around any fitter.
    pub fn with_fitter(fitter: Box<dyn DifferentialFitter>) -> Self {
        Self { fitter }
    }

    /// Name of the active fitter.
    pub fn fitter_name(&self) -> &str {
        self.fitter.name()
    }

    /// Fit the data set.
    pub fn fit(&self, dataset: &DeseqDataSet) -> Result<FittedDataSet> {
        tracing::debug!(
            fitter = self.fitter.name(),
            features = dataset.counts().n_features(),
            samples = dataset.counts().n_samples(),
            formula = %dataset.formula(),
            "fitting data set"
        );
        self.fitter.fit(dataset)
    }

    /// Results for one coefficient: log2 fold change, its standard error,
    /// Wald statistic, p-value and BH-adjusted p-value per feature.
    ///
    /// `index_name` labels the feature column of the table.
    pub fn results(
        &self,
        fitted: &FittedDataSet,
        coefficient: &str,
        index_name: &str,
    ) -> Result<DeResultSet> {
        let wald = test_wald(&fitted.fit, coefficient)?;
        let corrected = correct_bh_wald(&wald);

        let results = wald
            .results
            .iter()
            .zip(&corrected.q_values)
            .zip(&fitted.base_means)
            .map(|((w, &q), &base_mean)| DeResult {
                feature_id: w.feature_id.clone(),
                base_mean,
                log2_fold_change: w.estimate / LN_2,
                lfc_se: w.std_error / LN_2,
                stat: w.statistic,
                p_value: w.p_value,
                p_adj: q,
            })
            .collect();

        Ok(DeResultSet {
            index_name: index_name.to_string(),
            coefficient: coefficient.to_string(),
            results,
        })
    }
}
