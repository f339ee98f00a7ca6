//! Differential expression results table.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Result row for a single feature.
///
/// Statistics are `NaN` where they could not be computed (for example a
/// feature with zero counts in every sample).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeResult {
    /// Feature identifier.
    pub feature_id: String,
    /// Mean of size-factor normalized counts over all samples.
    pub base_mean: f64,
    /// Estimated effect on the log2 scale.
    pub log2_fold_change: f64,
    /// Standard error of `log2_fold_change`.
    pub lfc_se: f64,
    /// Wald statistic.
    pub stat: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Benjamini-Hochberg adjusted p-value.
    pub p_adj: f64,
}

impl DeResult {
    /// Whether the adjusted p-value is below `alpha`.
    pub fn is_significant_at(&self, alpha: f64) -> bool {
        self.p_adj < alpha
    }
}

/// Results table indexed by feature, in count-matrix row order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeResultSet {
    /// Name of the index column (the expression-name field).
    pub index_name: String,
    /// Coefficient the statistics refer to.
    pub coefficient: String,
    /// One row per feature.
    pub results: Vec<DeResult>,
}

impl DeResultSet {
    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Feature IDs in table order.
    pub fn feature_ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.feature_id.as_str()).collect()
    }

    /// Result for a specific feature.
    pub fn get_feature(&self, feature_id: &str) -> Option<&DeResult> {
        self.results.iter().find(|r| r.feature_id == feature_id)
    }

    /// Results sorted by p-value, missing values last.
    pub fn sorted_by_pvalue(&self) -> Vec<&DeResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| nan_last(a.p_value, b.p_value));
        sorted
    }

    /// Results with `padj < alpha`.
    pub fn significant_at(&self, alpha: f64) -> Vec<&DeResult> {
        self.results
            .iter()
            .filter(|r| r.is_significant_at(alpha))
            .collect()
    }

    /// Write the table as TSV.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "{}\tbaseMean\tlog2FoldChange\tlfcSE\tstat\tpvalue\tpadj",
            self.index_name
        )?;
        for r in &self.results {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                r.feature_id,
                fmt_value(r.base_mean),
                fmt_value(r.log2_fold_change),
                fmt_value(r.lfc_se),
                fmt_value(r.stat),
                fmt_value(r.p_value),
                fmt_value(r.p_adj),
            )?;
        }
        Ok(())
    }

    /// Iterate over results.
    pub fn iter(&self) -> impl Iterator<Item = &DeResult> {
        self.results.iter()
    }
}

fn nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        "NA".to_string()
    } else {
        format!("{:.6e}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    fn row(id: &str, p: f64, padj: f64) -> DeResult {
        DeResult {
            feature_id: id.to_string(),
            base_mean: 10.0,
            log2_fold_change: 1.0,
            lfc_se: 0.5,
            stat: 2.0,
            p_value: p,
            p_adj: padj,
        }
    }

    fn create_set() -> DeResultSet {
        DeResultSet {
            index_name: "Name".to_string(),
            coefficient: "Category".to_string(),
            results: vec![row("g1", 0.2, 0.3), row("g2", f64::NAN, f64::NAN), row("g3", 0.001, 0.003)],
        }
    }

    #[test]
    fn test_sorted_by_pvalue_nan_last() {
        let set = create_set();
        let ids: Vec<&str> = set.sorted_by_pvalue().iter().map(|r| r.feature_id.as_str()).collect();
        assert_eq!(ids, vec!["g3", "g1", "g2"]);
    }

    #[test]
    fn test_significant_at() {
        let set = create_set();
        assert_eq!(set.significant_at(0.05).len(), 1);
        assert_eq!(set.significant_at(0.5).len(), 2);
    }

    #[test]
    fn test_to_tsv() {
        let set = create_set();
        let file = NamedTempFile::new().unwrap();
        set.to_tsv(file.path()).unwrap();

        let text = fs::read_to_string(file.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name\tbaseMean\tlog2FoldChange\tlfcSE\tstat\tpvalue\tpadj");
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("g2\t"));
        assert!(lines[2].ends_with("NA\tNA"));
    }
}
