//! Per-sample metadata.

use super::table::{read_labelled_tsv, LabelledCells};
use crate::error::{IobioError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// A variable value that can be categorical, continuous, or ordinal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical variable with string levels.
    Categorical(String),
    /// Continuous numeric variable.
    Continuous(f64),
    /// Ordinal (integer) variable, used numerically in designs.
    Ordinal(i64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of a continuous or ordinal variable.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            Variable::Ordinal(v) => Some(*v as f64),
            _ => None,
        }
    }

    fn type_hint(&self) -> Option<VariableType> {
        match self {
            Variable::Categorical(_) => Some(VariableType::Categorical),
            Variable::Continuous(_) => Some(VariableType::Continuous),
            Variable::Ordinal(_) => Some(VariableType::Ordinal),
            Variable::Missing => None,
        }
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variable::Categorical(s) => write!(f, "{}", s),
            Variable::Continuous(v) => write!(f, "{}", v),
            Variable::Ordinal(v) => write!(f, "{}", v),
            Variable::Missing => write!(f, "NA"),
        }
    }
}

/// Column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
    Ordinal,
}

/// Per-sample covariates, stored column by column.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    sample_ids: Vec<String>,
    sample_index: HashMap<String, usize>,
    column_names: Vec<String>,
    /// `None` for a column with only missing values.
    column_types: Vec<Option<VariableType>>,
    /// One vector per column, in sample order.
    columns: Vec<Vec<Variable>>,
}

impl Metadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build metadata from rows of variables.
    ///
    /// Each row is a sample ID followed by one value per column. A column's
    /// type is taken from its first non-missing value; mixing types within a
    /// column is an error.
    pub fn from_rows(column_names: Vec<String>, rows: Vec<(String, Vec<Variable>)>) -> Result<Self> {
        let mut meta = Self {
            column_types: vec![None; column_names.len()],
            columns: vec![Vec::with_capacity(rows.len()); column_names.len()],
            column_names,
            ..Default::default()
        };

        for (sample_id, values) in rows {
            if values.len() != meta.column_names.len() {
                return Err(IobioError::DimensionMismatch {
                    expected: meta.column_names.len(),
                    actual: values.len(),
                });
            }
            if meta.sample_index.contains_key(&sample_id) {
                return Err(IobioError::DataShape(format!(
                    "Duplicate sample '{}' in metadata",
                    sample_id
                )));
            }
            for (k, value) in values.into_iter().enumerate() {
                match (meta.column_types[k], value.type_hint()) {
                    (Some(existing), Some(hint)) if existing != hint => {
                        return Err(IobioError::InvalidVariableType {
                            column: meta.column_names[k].clone(),
                            reason: format!("mixes {:?} and {:?} values", existing, hint),
                        });
                    }
                    (None, hint) => meta.column_types[k] = hint,
                    _ => {}
                }
                meta.columns[k].push(value);
            }
            meta.sample_index.insert(sample_id.clone(), meta.sample_ids.len());
            meta.sample_ids.push(sample_id);
        }

        Ok(meta)
    }

    /// Load metadata from a TSV file.
    ///
    /// The first column holds sample IDs. Columns whose values all parse as
    /// numbers are continuous, all others categorical. Empty cells and `NA`
    /// are missing.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let LabelledCells {
            column_labels: column_names,
            row_labels: sample_ids,
            cells,
        } = read_labelled_tsv(path)?;
        let raw_rows: Vec<(String, Vec<String>)> = sample_ids.into_iter().zip(cells).collect();

        let is_missing = |v: &str| v.is_empty() || v.eq_ignore_ascii_case("na");
        let numeric: Vec<bool> = (0..column_names.len())
            .map(|col| {
                raw_rows
                    .iter()
                    .all(|(_, values)| is_missing(&values[col]) || values[col].parse::<f64>().is_ok())
            })
            .collect();

        let rows = raw_rows
            .into_iter()
            .map(|(sample_id, values)| {
                let vars = values
                    .into_iter()
                    .enumerate()
                    .map(|(col, raw)| {
                        if is_missing(&raw) {
                            Variable::Missing
                        } else if numeric[col] {
                            raw.parse::<f64>()
                                .map(Variable::Continuous)
                                .unwrap_or(Variable::Missing)
                        } else {
                            Variable::Categorical(raw)
                        }
                    })
                    .collect();
                (sample_id, vars)
            })
            .collect();

        Self::from_rows(column_names, rows)
    }

    /// Sample IDs in order.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Value for one sample and column.
    pub fn get(&self, sample_id: &str, column: &str) -> Option<&Variable> {
        let row = *self.sample_index.get(sample_id)?;
        let k = self.column_position(column)?;
        self.columns[k].get(row)
    }

    /// All values of a column, in sample order.
    pub fn column(&self, column: &str) -> Result<Vec<&Variable>> {
        let k = self
            .column_position(column)
            .ok_or_else(|| IobioError::MissingColumn(column.to_string()))?;
        Ok(self.columns[k].iter().collect())
    }

    /// Type of a column, if it exists and has any non-missing value.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.column_position(column).and_then(|k| self.column_types[k])
    }

    /// Sorted unique levels of a categorical column.
    pub fn levels(&self, column: &str) -> Result<Vec<String>> {
        let levels: BTreeSet<&str> = self
            .column(column)?
            .into_iter()
            .filter_map(Variable::as_categorical)
            .collect();
        Ok(levels.into_iter().map(String::from).collect())
    }

    /// Reorder (and subset) samples to match `sample_ids`.
    ///
    /// A sample absent from the metadata is a data-shape error.
    pub fn align_to(&self, sample_ids: &[String]) -> Result<Self> {
        let rows = sample_ids
            .iter()
            .map(|sid| {
                self.sample_index.get(sid).copied().ok_or_else(|| {
                    IobioError::DataShape(format!("Sample '{}' not found in metadata", sid))
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        Ok(Self {
            sample_ids: sample_ids.to_vec(),
            sample_index: sample_ids.iter().enumerate().map(|(i, s)| (s.clone(), i)).collect(),
            column_names: self.column_names.clone(),
            column_types: self.column_types.clone(),
            columns: self
                .columns
                .iter()
                .map(|values| rows.iter().map(|&r| values[r].clone()).collect())
                .collect(),
        })
    }

    fn column_position(&self, column: &str) -> Option<usize> {
        self.column_names.iter().position(|c| c == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_tsv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "sample_id\tgroup\tage").unwrap();
        writeln!(file, "S1\tcontrol\t25").unwrap();
        writeln!(file, "S2\ttreatment\t30").unwrap();
        writeln!(file, "S3\tcontrol\tNA").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_metadata() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        assert_eq!(meta.n_samples(), 3);
        assert_eq!(meta.sample_ids(), &["S1", "S2", "S3"]);
        assert_eq!(meta.column_type("group"), Some(VariableType::Categorical));
        assert_eq!(meta.column_type("age"), Some(VariableType::Continuous));
        assert_eq!(meta.get("S2", "age").unwrap().as_numeric(), Some(30.0));
        assert!(meta.get("S3", "age").unwrap().is_missing());
    }

    #[test]
    fn test_levels() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();
        assert_eq!(meta.levels("group").unwrap(), vec!["control", "treatment"]);
        assert!(matches!(meta.levels("nope"), Err(IobioError::MissingColumn(_))));
    }

    #[test]
    fn test_from_rows_types() {
        let meta = Metadata::from_rows(
            vec!["Category".into()],
            vec![
                ("a".into(), vec![Variable::Ordinal(2)]),
                ("b".into(), vec![Variable::Missing]),
                ("c".into(), vec![Variable::Ordinal(1)]),
            ],
        )
        .unwrap();
        assert_eq!(meta.column_type("Category"), Some(VariableType::Ordinal));
        assert!(meta.get("b", "Category").unwrap().is_missing());
    }

    #[test]
    fn test_from_rows_mixed_types_rejected() {
        let result = Metadata::from_rows(
            vec!["x".into()],
            vec![
                ("a".into(), vec![Variable::Ordinal(2)]),
                ("b".into(), vec![Variable::Categorical("two".into())]),
            ],
        );
        assert!(matches!(result, Err(IobioError::InvalidVariableType { .. })));
    }

    #[test]
    fn test_align_to() {
        let file = create_test_tsv();
        let meta = Metadata::from_tsv(file.path()).unwrap();

        let aligned = meta.align_to(&["S3".to_string(), "S1".to_string()]).unwrap();
        assert_eq!(aligned.sample_ids(), &["S3", "S1"]);

        let missing = meta.align_to(&["S4".to_string()]);
        assert!(matches!(missing, Err(IobioError::DataShape(_))));
    }
}
