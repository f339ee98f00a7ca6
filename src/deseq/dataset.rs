//! Count data bundled with its sample annotation and design.

use crate::data::{CountMatrix, DesignMatrix, Formula, Metadata};
use crate::error::{IobioError, Result};
use crate::model::NbFit;

/// An unfitted data set: counts, sample metadata aligned to the count
/// columns, the design formula and the design matrix built from them.
#[derive(Debug, Clone)]
pub struct DeseqDataSet {
    counts: CountMatrix,
    metadata: Metadata,
    formula: Formula,
    design: DesignMatrix,
}

impl DeseqDataSet {
    /// Assemble a data set.
    ///
    /// Metadata rows are reordered to match the count matrix columns; a
    /// sample absent from the metadata is a data-shape error. The design
    /// must be full rank.
    pub fn new(counts: CountMatrix, metadata: &Metadata, formula: Formula) -> Result<Self> {
        let metadata = metadata.align_to(counts.sample_ids())?;
        let design = DesignMatrix::from_formula(&metadata, &formula)?;

        if design.n_samples() <= design.n_coefficients() {
            return Err(IobioError::StatisticalFit(format!(
                "{} samples cannot fit {} coefficients of '{}'",
                design.n_samples(),
                design.n_coefficients(),
                formula
            )));
        }
        if !design.is_full_rank() {
            return Err(IobioError::StatisticalFit(format!(
                "design matrix for '{}' is not full rank",
                formula
            )));
        }

        Ok(Self {
            counts,
            metadata,
            formula,
            design,
        })
    }

    /// Count matrix (features × samples).
    pub fn counts(&self) -> &CountMatrix {
        &self.counts
    }

    /// Metadata in count-column order.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Design formula.
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Design matrix.
    pub fn design(&self) -> &DesignMatrix {
        &self.design
    }
}

/// A fitted data set.
#[derive(Debug, Clone)]
pub struct FittedDataSet {
    /// Per-sample size factors.
    pub size_factors: Vec<f64>,
    /// Per-feature mean of normalized counts.
    pub base_means: Vec<f64>,
    /// Per-feature GLM fits.
    pub fit: NbFit,
}

impl FittedDataSet {
    /// Number of features.
    pub fn n_features(&self) -> usize {
        self.base_means.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Variable;

    fn create_test_counts() -> CountMatrix {
        let triplets: Vec<(usize, usize, u64)> =
            (0..4).flat_map(|j| (0..2).map(move |i| (i, j, 10 + (i * 4 + j) as u64))).collect();
        CountMatrix::from_triplets(
            vec!["g1".into(), "g2".into()],
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            &triplets,
        )
        .unwrap()
    }

    fn create_test_metadata(samples: &[&str], groups: &[i64]) -> Metadata {
        let rows = samples
            .iter()
            .zip(groups)
            .map(|(s, g)| (s.to_string(), vec![Variable::Ordinal(*g)]))
            .collect();
        Metadata::from_rows(vec!["Category".into()], rows).unwrap()
    }

    #[test]
    fn test_metadata_aligned_to_counts() {
        let meta = create_test_metadata(&["d", "c", "b", "a"], &[2, 2, 1, 1]);
        let formula = Formula::parse("~ Category").unwrap();
        let ds = DeseqDataSet::new(create_test_counts(), &meta, formula).unwrap();

        assert_eq!(ds.metadata().sample_ids(), &["a", "b", "c", "d"]);
        let col: Vec<f64> = ds.design().matrix().column(1).iter().copied().collect();
        assert_eq!(col, vec![1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_missing_sample() {
        let meta = create_test_metadata(&["a", "b", "c"], &[1, 1, 2]);
        let formula = Formula::parse("~ Category").unwrap();
        let err = DeseqDataSet::new(create_test_counts(), &meta, formula).unwrap_err();
        assert!(matches!(err, IobioError::DataShape(_)));
    }

    #[test]
    fn test_rank_deficient_design() {
        let meta = create_test_metadata(&["a", "b", "c", "d"], &[2, 2, 2, 2]);
        let formula = Formula::parse("~ Category").unwrap();
        let err = DeseqDataSet::new(create_test_counts(), &meta, formula).unwrap_err();
        assert!(matches!(err, IobioError::StatisticalFit(_)));
    }
}
