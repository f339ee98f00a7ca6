//! Row-wise rescaling for heatmap display.
//!
//! Both transforms work the same way: transpose, rescale every column of the
//! transposed matrix (one original row each), transpose back.

use nalgebra::DMatrix;

/// Rescale each row to [0, 1]: the row minimum maps to 0, the maximum to 1.
///
/// Constant rows map to 0; missing (non-finite) cells are left alone.
pub fn row_range_normalize(data: &DMatrix<f64>) -> DMatrix<f64> {
    let mut t = data.transpose();
    for mut col in t.column_iter_mut() {
        let min = col.iter().copied().fold(f64::INFINITY, f64::min);
        let max = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        for v in col.iter_mut().filter(|v| v.is_finite()) {
            *v = if range > 0.0 { (*v - min) / range } else { 0.0 };
        }
    }
    t.transpose()
}

/// Standardize each row to mean 0 and (population) standard deviation 1.
///
/// Statistics skip missing (non-finite) cells, which stay as they are.
/// Constant rows map to 0.
pub fn row_mean_normalize(data: &DMatrix<f64>) -> DMatrix<f64> {
    let mut t = data.transpose();
    for mut col in t.column_iter_mut() {
        let finite: Vec<f64> = col.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            continue;
        }
        let n = finite.len() as f64;
        let mean = finite.iter().sum::<f64>() / n;
        let sd = (finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        for v in col.iter_mut().filter(|v| v.is_finite()) {
            *v = if sd > 0.0 { (*v - mean) / sd } else { 0.0 };
        }
    }
    t.transpose()
}
