//! Labelled dense tables used as heatmap panel inputs.
//!
//! Rows are entities (genes, features, annotations), columns are samples.

use crate::error::{IobioError, Result};
use nalgebra::DMatrix;
use std::collections::HashMap;
use std::path::Path;

/// A dense numeric table with row and column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTable {
    /// Values (rows × columns).
    data: DMatrix<f64>,
    /// Row labels.
    row_labels: Vec<String>,
    /// Column labels.
    column_labels: Vec<String>,
}

impl NumericTable {
    /// Create a table from a matrix and its labels.
    pub fn new(
        data: DMatrix<f64>,
        row_labels: Vec<String>,
        column_labels: Vec<String>,
    ) -> Result<Self> {
        if data.nrows() != row_labels.len() {
            return Err(IobioError::DimensionMismatch {
                expected: data.nrows(),
                actual: row_labels.len(),
            });
        }
        if data.ncols() != column_labels.len() {
            return Err(IobioError::DimensionMismatch {
                expected: data.ncols(),
                actual: column_labels.len(),
            });
        }
        Ok(Self {
            data,
            row_labels,
            column_labels,
        })
    }

    /// Create a table from row vectors.
    pub fn from_rows<R: AsRef<[f64]>>(
        rows: &[R],
        row_labels: Vec<String>,
        column_labels: Vec<String>,
    ) -> Result<Self> {
        let n_cols = column_labels.len();
        let mut flat = Vec::with_capacity(rows.len() * n_cols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != n_cols {
                return Err(IobioError::DimensionMismatch {
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let data = DMatrix::from_row_slice(rows.len(), n_cols, &flat);
        Self::new(data, row_labels, column_labels)
    }

    /// Load a table from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with column labels (first field is the row-label header)
    /// - Subsequent rows: row label followed by numeric values
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let LabelledCells {
            column_labels,
            row_labels,
            cells,
        } = read_labelled_tsv(path)?;
        let mut rows = Vec::with_capacity(cells.len());
        for (row_idx, fields) in cells.iter().enumerate() {
            let values = fields
                .iter()
                .enumerate()
                .map(|(col_idx, raw)| {
                    if raw.is_empty() || raw.eq_ignore_ascii_case("na") {
                        return Ok(f64::NAN);
                    }
                    raw.parse::<f64>().map_err(|_| IobioError::InvalidValue {
                        value: raw.clone(),
                        row: row_idx,
                        col: col_idx,
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(values);
        }
        Self::from_rows(&rows, row_labels, column_labels)
    }

    /// Underlying matrix.
    #[inline]
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// Row labels.
    #[inline]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    /// Column labels.
    #[inline]
    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.data.ncols()
    }

    /// Value at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[(row, col)]
    }

    /// A row as a vector.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.data.row(row).iter().copied().collect()
    }

    /// Index of a column label.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.column_labels.iter().position(|c| c == label)
    }

    /// Restrict and reorder columns to the given labels.
    ///
    /// Every requested label must exist; a missing one is a `MissingColumn` error.
    pub fn select_columns(&self, columns: &[String]) -> Result<Self> {
        let indices = column_positions(&self.column_labels, columns)?;
        let data = self.data.select_columns(indices.iter());
        Self::new(data, self.row_labels.clone(), columns.to_vec())
    }

    /// Reorder rows by index.
    pub fn reorder_rows(&self, order: &[usize]) -> Result<Self> {
        check_permutation(order, self.n_rows())?;
        let data = self.data.select_rows(order.iter());
        let row_labels = order.iter().map(|&i| self.row_labels[i].clone()).collect();
        Self::new(data, row_labels, self.column_labels.clone())
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Self {
        Self {
            data: self.data.transpose(),
            row_labels: self.column_labels.clone(),
            column_labels: self.row_labels.clone(),
        }
    }

    /// Replace the values, keeping the labels.
    pub fn with_data(&self, data: DMatrix<f64>) -> Result<Self> {
        Self::new(data, self.row_labels.clone(), self.column_labels.clone())
    }
}

/// A dense table of categorical (string) cells with row and column labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalTable {
    /// Cells in row-major order.
    values: Vec<Vec<String>>,
    row_labels: Vec<String>,
    column_labels: Vec<String>,
}

impl CategoricalTable {
    /// Create a table from row vectors of cells.
    pub fn new(
        values: Vec<Vec<String>>,
        row_labels: Vec<String>,
        column_labels: Vec<String>,
    ) -> Result<Self> {
        if values.len() != row_labels.len() {
            return Err(IobioError::DimensionMismatch {
                expected: values.len(),
                actual: row_labels.len(),
            });
        }
        for row in &values {
            if row.len() != column_labels.len() {
                return Err(IobioError::DimensionMismatch {
                    expected: column_labels.len(),
                    actual: row.len(),
                });
            }
        }
        Ok(Self {
            values,
            row_labels,
            column_labels,
        })
    }

    /// Load a table from a TSV file (same layout as [`NumericTable::from_tsv`]).
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let cells = read_labelled_tsv(path)?;
        Self::new(cells.cells, cells.row_labels, cells.column_labels)
    }

    /// Cell at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &str {
        &self.values[row][col]
    }

    /// All rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.values
    }

    /// Row labels.
    #[inline]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    /// Column labels.
    #[inline]
    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.values.len()
    }

    /// Number of columns.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.column_labels.len()
    }
}

/// Positions of `wanted` labels within `labels`.
pub(crate) fn column_positions(labels: &[String], wanted: &[String]) -> Result<Vec<usize>> {
    let lookup: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect();
    wanted
        .iter()
        .map(|w| {
            lookup
                .get(w.as_str())
                .copied()
                .ok_or_else(|| IobioError::MissingColumn(w.clone()))
        })
        .collect()
}

/// Fails unless `order` holds each of `0..n` exactly once.
pub(crate) fn check_permutation(order: &[usize], n: usize) -> Result<()> {
    if order.len() != n {
        return Err(IobioError::DimensionMismatch {
            expected: n,
            actual: order.len(),
        });
    }
    let mut seen = vec![false; n];
    for &i in order {
        if i >= n || seen[i] {
            return Err(IobioError::InvalidParameter(format!(
                "Order is not a permutation of 0..{}",
                n
            )));
        }
        seen[i] = true;
    }
    Ok(())
}

/// Header labels, row labels and raw cells of a labelled TSV file.
pub(crate) struct LabelledCells {
    pub column_labels: Vec<String>,
    pub row_labels: Vec<String>,
    pub cells: Vec<Vec<String>>,
}

/// Read a tab-separated file whose first column labels the rows and whose
/// header labels the remaining columns. Blank lines are skipped; every row
/// must have as many cells as the header.
pub(crate) fn read_labelled_tsv<P: AsRef<Path>>(path: P) -> Result<LabelledCells> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .from_path(path)?;

    let header = rdr.headers()?.clone();
    if header.len() < 2 {
        return Err(IobioError::EmptyData(
            "TSV must have a label column and at least one data column".to_string(),
        ));
    }
    let column_labels: Vec<String> = header.iter().skip(1).map(str::to_string).collect();

    let mut row_labels = Vec::new();
    let mut cells = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut fields = record.iter();
        let Some(label) = fields.next() else {
            continue;
        };
        row_labels.push(label.to_string());
        cells.push(fields.map(|f| f.trim().to_string()).collect());
    }

    if row_labels.is_empty() {
        return Err(IobioError::EmptyData("No rows in TSV".to_string()));
    }
    Ok(LabelledCells {
        column_labels,
        row_labels,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn labels(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn create_test_table() -> NumericTable {
        NumericTable::from_rows(
            &[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
            labels("g", 2),
            labels("s", 3),
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows() {
        let t = create_test_table();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.n_cols(), 3);
        assert_eq!(t.get(1, 2), 6.0);
        assert_eq!(t.row(0), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = NumericTable::from_rows(
            &[vec![1.0, 2.0], vec![3.0]],
            labels("g", 2),
            labels("s", 2),
        );
        assert!(matches!(result, Err(IobioError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_select_columns_reorders() {
        let t = create_test_table();
        let cols = vec!["s3".to_string(), "s1".to_string()];
        let sub = t.select_columns(&cols).unwrap();
        assert_eq!(sub.column_labels(), &["s3", "s1"]);
        assert_eq!(sub.row(0), vec![3.0, 1.0]);
        assert_eq!(sub.row(1), vec![6.0, 4.0]);
    }

    #[test]
    fn test_select_missing_column() {
        let t = create_test_table();
        let cols = vec!["s1".to_string(), "s9".to_string()];
        match t.select_columns(&cols) {
            Err(IobioError::MissingColumn(c)) => assert_eq!(c, "s9"),
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_reorder_rows() {
        let t = create_test_table();
        let r = t.reorder_rows(&[1, 0]).unwrap();
        assert_eq!(r.row_labels(), &["g2", "g1"]);
        assert_eq!(r.row(0), vec![4.0, 5.0, 6.0]);
        assert!(t.reorder_rows(&[0, 0]).is_err());
    }

    #[test]
    fn test_transpose() {
        let t = create_test_table().transpose();
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.row_labels(), &["s1", "s2", "s3"]);
        assert_eq!(t.row(2), vec![3.0, 6.0]);
    }

    #[test]
    fn test_numeric_tsv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene\tS1\tS2").unwrap();
        writeln!(file, "g1\t0.5\t1.5").unwrap();
        writeln!(file, "g2\t-2\t3").unwrap();
        file.flush().unwrap();

        let t = NumericTable::from_tsv(file.path()).unwrap();
        assert_eq!(t.column_labels(), &["S1", "S2"]);
        assert_eq!(t.row_labels(), &["g1", "g2"]);
        assert_eq!(t.get(1, 0), -2.0);
    }

    #[test]
    fn test_numeric_tsv_missing_and_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene\tS1\tS2").unwrap();
        writeln!(file, "g1\tNA\t1.5").unwrap();
        file.flush().unwrap();
        let t = NumericTable::from_tsv(file.path()).unwrap();
        assert!(t.get(0, 0).is_nan());

        let mut bad = NamedTempFile::new().unwrap();
        writeln!(bad, "gene\tS1").unwrap();
        writeln!(bad, "g1\thigh").unwrap();
        bad.flush().unwrap();
        assert!(matches!(
            NumericTable::from_tsv(bad.path()),
            Err(IobioError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_categorical_tsv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "annotation\tS1\tS2").unwrap();
        writeln!(file, "response\tCR\tPD").unwrap();
        file.flush().unwrap();

        let t = CategoricalTable::from_tsv(file.path()).unwrap();
        assert_eq!(t.n_rows(), 1);
        assert_eq!(t.get(0, 1), "PD");
    }
}
