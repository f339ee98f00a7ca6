//! Benjamini-Hochberg false discovery rate correction.

use crate::test::WaldResult;
use serde::{Deserialize, Serialize};

/// Result of BH correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BhCorrected {
    /// Feature IDs in original order.
    pub feature_ids: Vec<String>,
    /// Original p-values.
    pub p_values: Vec<f64>,
    /// Adjusted p-values; `NaN` where the raw p-value is `NaN`.
    pub q_values: Vec<f64>,
    /// Number of non-missing p-values the correction ran over.
    pub n_tests: usize,
}

impl BhCorrected {
    /// Get q-value for a specific feature.
    pub fn get_qvalue(&self, feature_id: &str) -> Option<f64> {
        let idx = self.feature_ids.iter().position(|f| f == feature_id)?;
        self.q_values.get(idx).copied()
    }

    /// Count significant results at a threshold.
    pub fn n_significant(&self, alpha: f64) -> usize {
        self.q_values.iter().filter(|&&q| q < alpha).count()
    }
}

/// Apply Benjamini-Hochberg FDR correction.
///
/// `NaN` p-values are left out of the ranking and stay `NaN`. For the
/// remaining `n` values, sorted ascending:
/// `q[i] = min(p[i] * n / rank[i], q[i+1])`, capped at 1.
pub fn correct_bh(p_values: &[f64], feature_ids: &[String]) -> BhCorrected {
    let mut indices: Vec<usize> = (0..p_values.len())
        .filter(|&i| !p_values[i].is_nan())
        .collect();
    indices.sort_by(|&a, &b| {
        p_values[a]
            .partial_cmp(&p_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let n = indices.len();
    let mut q_values = vec![f64::NAN; p_values.len()];

    // Work backwards from the largest p-value
    let mut running_min = 1.0_f64;
    for (i, &orig_idx) in indices.iter().enumerate().rev() {
        let rank = i + 1;
        let adjusted = p_values[orig_idx] * n as f64 / rank as f64;
        running_min = running_min.min(adjusted);
        q_values[orig_idx] = running_min;
    }

    BhCorrected {
        feature_ids: feature_ids.to_vec(),
        p_values: p_values.to_vec(),
        q_values,
        n_tests: n,
    }
}

/// Apply BH correction to Wald test results.
pub fn correct_bh_wald(wald: &WaldResult) -> BhCorrected {
    let p_values = wald.p_values();
    let feature_ids: Vec<String> = wald.feature_ids().iter().map(|s| s.to_string()).collect();
    correct_bh(&p_values, &feature_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn test_bh_known_values() {
        let p = vec![0.01, 0.04, 0.03, 0.5];
        let bh = correct_bh(&p, &ids(4));
        // sorted: 0.01, 0.03, 0.04, 0.5 -> 0.04, 0.0533, 0.0533, 0.5
        assert_relative_eq!(bh.q_values[0], 0.04, epsilon = 1e-12);
        assert_relative_eq!(bh.q_values[2], 0.04 * 4.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(bh.q_values[1], 0.04 * 4.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(bh.q_values[3], 0.5, epsilon = 1e-12);
        assert_eq!(bh.n_significant(0.05), 1);
    }

    #[test]
    fn test_bh_skips_nan() {
        let p = vec![0.01, f64::NAN, 0.02];
        let bh = correct_bh(&p, &ids(3));
        assert_eq!(bh.n_tests, 2);
        assert!(bh.q_values[1].is_nan());
        assert_relative_eq!(bh.q_values[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(bh.q_values[2], 0.02, epsilon = 1e-12);
        assert_eq!(bh.get_qvalue("f2"), Some(0.02));
    }

    #[test]
    fn test_bh_monotone_and_capped() {
        let p = vec![0.9, 0.8, 0.95, 0.001];
        let bh = correct_bh(&p, &ids(4));
        assert!(bh.q_values.iter().all(|&q| q <= 1.0));
        assert!(bh.q_values.iter().zip(&p).all(|(q, p)| q >= p));
    }

    #[test]
    fn test_bh_empty() {
        let bh = correct_bh(&[], &[]);
        assert_eq!(bh.n_tests, 0);
        assert!(bh.q_values.is_empty());
    }
}
