//! Sparse count matrix for expression counts.

use super::table::{read_labelled_tsv, LabelledCells};
use crate::error::{IobioError, Result};
use sprs::{CsMat, TriMat};
use std::path::Path;

/// A sparse count matrix storing feature counts across samples.
///
/// Rows are features (genes, transcripts), columns are samples.
/// Stored in CSR format.
#[derive(Debug, Clone)]
pub struct CountMatrix {
    data: CsMat<u64>,
    /// Feature identifiers (row names)
    feature_ids: Vec<String>,
    /// Sample identifiers (column names)
    sample_ids: Vec<String>,
}

impl CountMatrix {
    /// Create a new CountMatrix from a sparse matrix and identifiers.
    pub fn new(data: CsMat<u64>, feature_ids: Vec<String>, sample_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != feature_ids.len() {
            return Err(IobioError::DimensionMismatch {
                expected: nrows,
                actual: feature_ids.len(),
            });
        }
        if ncols != sample_ids.len() {
            return Err(IobioError::DimensionMismatch {
                expected: ncols,
                actual: sample_ids.len(),
            });
        }
        Ok(Self {
            data,
            feature_ids,
            sample_ids,
        })
    }

    /// Build from `(row, col, count)` triplets. Zero counts are not stored.
    pub fn from_triplets(
        feature_ids: Vec<String>,
        sample_ids: Vec<String>,
        triplets: &[(usize, usize, u64)],
    ) -> Result<Self> {
        let shape = (feature_ids.len(), sample_ids.len());
        let mut tri_mat = TriMat::new(shape);
        for &(row, col, val) in triplets {
            if row >= shape.0 || col >= shape.1 {
                return Err(IobioError::InvalidParameter(format!(
                    "Triplet ({}, {}) outside a {}x{} matrix",
                    row, col, shape.0, shape.1
                )));
            }
            if val > 0 {
                tri_mat.add_triplet(row, col, val);
            }
        }
        Self::new(tri_mat.to_csr(), feature_ids, sample_ids)
    }

    /// Load a feature × sample count matrix from a TSV file: a header of
    /// sample IDs after the feature-ID column, then one row per feature.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let LabelledCells {
            column_labels,
            row_labels,
            cells,
        } = read_labelled_tsv(path)?;

        let mut triplets = Vec::new();
        for (row, fields) in cells.iter().enumerate() {
            for (col, raw) in fields.iter().enumerate() {
                let value: u64 = raw.parse().map_err(|_| IobioError::InvalidCount {
                    value: raw.clone(),
                    row,
                    col,
                })?;
                triplets.push((row, col, value));
            }
        }
        Self::from_triplets(row_labels, column_labels, &triplets)
    }

    /// Write as TSV with `index_name` heading the feature column.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P, index_name: &str) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;

        wtr.write_record(std::iter::once(index_name).chain(self.sample_ids.iter().map(String::as_str)))?;
        for (row, feature_id) in self.feature_ids.iter().enumerate() {
            let counts = self.row_dense(row).into_iter().map(|c| c.to_string());
            wtr.write_record(std::iter::once(feature_id.clone()).chain(counts))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Get the value at (row, col), returning 0 for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u64 {
        self.data.get(row, col).copied().unwrap_or(0)
    }

    /// Number of features (rows).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.data.rows()
    }

    /// Number of samples (columns).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.data.cols()
    }

    /// Feature identifiers.
    #[inline]
    pub fn feature_ids(&self) -> &[String] {
        &self.feature_ids
    }

    /// Sample identifiers.
    #[inline]
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Dense counts of one feature.
    pub fn row_dense(&self, row: usize) -> Vec<u64> {
        let mut dense = vec![0u64; self.n_samples()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Convert to a dense matrix (f64).
    pub fn to_dense(&self) -> nalgebra::DMatrix<f64> {
        let mut dense = nalgebra::DMatrix::zeros(self.n_features(), self.n_samples());
        for (row, row_vec) in self.data.outer_iterator().enumerate() {
            for (col, &val) in row_vec.iter() {
                dense[(row, col)] = val as f64;
            }
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_matrix() -> CountMatrix {
        let feature_ids = vec!["geneA".to_string(), "geneB".to_string()];
        let sample_ids = vec!["s1".to_string(), "s2".to_string(), "s3".to_string()];
        CountMatrix::from_triplets(
            feature_ids,
            sample_ids,
            &[(0, 0, 10), (0, 2, 5), (1, 0, 100), (1, 1, 0), (1, 2, 150)],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions_and_values() {
        let mat = create_test_matrix();
        assert_eq!(mat.n_features(), 2);
        assert_eq!(mat.n_samples(), 3);
        assert_eq!(mat.get(0, 1), 0);
        assert_eq!(mat.row_dense(1), vec![100, 0, 150]);
    }

    #[test]
    fn test_triplet_out_of_bounds() {
        let result = CountMatrix::from_triplets(vec!["g".into()], vec!["s".into()], &[(1, 0, 3)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_tsv_written_with_index_name() {
        let mat = create_test_matrix();
        let file = NamedTempFile::new().unwrap();
        mat.to_tsv(file.path(), "Name").unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Name\ts1\ts2\ts3"));
        assert_eq!(lines.next(), Some("geneA\t10\t0\t5"));

        let loaded = CountMatrix::from_tsv(file.path()).unwrap();
        assert_eq!(loaded.feature_ids(), mat.feature_ids());
        assert_eq!(loaded.sample_ids(), mat.sample_ids());
        assert_eq!(loaded.to_dense(), mat.to_dense());
    }
}
