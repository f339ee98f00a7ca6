//! Long-format expression records.

use crate::error::{IobioError, Result};
use std::io::Read;
use std::path::Path;

/// Expression records in long format: one row per (feature, sample)
/// measurement, plus whatever per-sample annotation columns the source
/// carries alongside.
#[derive(Debug, Clone)]
pub struct ExpressionTable {
    headers: Vec<String>,
    records: Vec<Vec<String>>,
}

impl ExpressionTable {
    /// Build a table from a header and rows of string cells.
    pub fn new(headers: Vec<String>, records: Vec<Vec<String>>) -> Result<Self> {
        for record in &records {
            if record.len() != headers.len() {
                return Err(IobioError::DimensionMismatch {
                    expected: headers.len(),
                    actual: record.len(),
                });
            }
        }
        Ok(Self { headers, records })
    }

    /// Load a tab-separated file with a header row.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, b'\t')
    }

    /// Read delimited records with a header row from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(IobioError::EmptyData("Expression table has no header".to_string()));
        }

        let mut records = Vec::new();
        for record in rdr.records() {
            let record = record?;
            records.push(record.iter().map(|s| s.trim().to_string()).collect());
        }

        Self::new(headers, records)
    }

    /// Column names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of records.
    pub fn n_records(&self) -> usize {
        self.records.len()
    }

    /// Position of a column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IobioError::MissingColumn(name.to_string()))
    }

    /// All values of a column, in record order.
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.column_index(name)?;
        Ok(self.records.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Iterate over records.
    pub fn records(&self) -> impl Iterator<Item = &[String]> {
        self.records.iter().map(|r| r.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_reader() {
        let text = "Name,Sample,NumReads\ng1,s1,10\ng1,s2,12.5\n";
        let table = ExpressionTable::from_reader(text.as_bytes(), b',').unwrap();
        assert_eq!(table.headers(), &["Name", "Sample", "NumReads"]);
        assert_eq!(table.n_records(), 2);
        assert_eq!(table.column("NumReads").unwrap(), vec!["10", "12.5"]);
    }

    #[test]
    fn test_from_tsv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Name\tSample\tNumReads\tCategory").unwrap();
        writeln!(file, "g1\ts1\t4\t1").unwrap();
        writeln!(file, "g2\ts1\t9\t1").unwrap();

        let table = ExpressionTable::from_tsv(file.path()).unwrap();
        assert_eq!(table.n_records(), 2);
        assert_eq!(table.column("Category").unwrap(), vec!["1", "1"]);
    }

    #[test]
    fn test_missing_column() {
        let table = ExpressionTable::new(vec!["a".into()], vec![vec!["1".into()]]).unwrap();
        assert!(matches!(table.column("b"), Err(IobioError::MissingColumn(c)) if c == "b"));
    }

    #[test]
    fn test_ragged_rows() {
        let result = ExpressionTable::new(vec!["a".into(), "b".into()], vec![vec!["1".into()]]);
        assert!(result.is_err());
    }
}
