//! Median-of-ratios size factors.
//!
//! Each sample's size factor is the median, over features with no zero
//! count, of the ratio between the sample's count and the feature's
//! geometric mean across samples.
//!
//! # Reference
//!
//! Anders S, Huber W. Differential expression analysis for sequence count
//! data. Genome Biology 11, R106 (2010).

use crate::data::CountMatrix;
use crate::error::{IobioError, Result};

/// Compute median-of-ratios size factors, one per sample.
pub fn size_factors(counts: &CountMatrix) -> Result<Vec<f64>> {
    let n_samples = counts.n_samples();
    if n_samples == 0 || counts.n_features() == 0 {
        return Err(IobioError::EmptyData(
            "Count matrix has no features or no samples".to_string(),
        ));
    }

    // log counts of features without any zero, with their log geometric mean
    let usable: Vec<(Vec<f64>, f64)> = (0..counts.n_features())
        .filter_map(|row| {
            let values = counts.row_dense(row);
            if values.iter().any(|&v| v == 0) {
                return None;
            }
            let logs: Vec<f64> = values.iter().map(|&v| (v as f64).ln()).collect();
            let log_geo_mean = logs.iter().sum::<f64>() / n_samples as f64;
            Some((logs, log_geo_mean))
        })
        .collect();

    if usable.is_empty() {
        return Err(IobioError::StatisticalFit(
            "every feature contains at least one zero, cannot compute log geometric means"
                .to_string(),
        ));
    }

    let factors = (0..n_samples)
        .map(|sample| {
            let mut ratios: Vec<f64> = usable
                .iter()
                .map(|(logs, log_geo_mean)| logs[sample] - log_geo_mean)
                .collect();
            median(&mut ratios).exp()
        })
        .collect();

    Ok(factors)
}

/// Divide each count by its sample's size factor.
pub fn normalized_counts(counts: &CountMatrix, factors: &[f64]) -> Result<nalgebra::DMatrix<f64>> {
    if factors.len() != counts.n_samples() {
        return Err(IobioError::DimensionMismatch {
            expected: counts.n_samples(),
            actual: factors.len(),
        });
    }
    let mut dense = counts.to_dense();
    for (j, mut col) in dense.column_iter_mut().enumerate() {
        col /= factors[j];
    }
    Ok(dense)
}

fn median(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
