//! Design matrices built from metadata and a formula.

use crate::data::{Formula, Metadata, Term, Variable, VariableType};
use crate::error::{IobioError, Result};
use nalgebra::DMatrix;
use std::collections::HashMap;

/// Model matrix, samples × coefficients, with coefficient names.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    matrix: DMatrix<f64>,
    coefficient_names: Vec<String>,
    sample_ids: Vec<String>,
    reference_levels: HashMap<String, String>,
}

impl DesignMatrix {
    /// Build a design matrix from metadata and formula.
    ///
    /// Numeric (continuous or ordinal) variables enter as one column named
    /// after the variable. Categorical variables become indicator columns
    /// named `{variable}{level}`; with an intercept the alphabetically first
    /// level is the reference and gets no column. Missing values are rejected.
    pub fn from_formula(metadata: &Metadata, formula: &Formula) -> Result<Self> {
        let n_samples = metadata.n_samples();
        let mut names = Vec::new();
        let mut columns: Vec<Vec<f64>> = Vec::new();
        let mut reference_levels = HashMap::new();

        if formula.intercept {
            names.push("(Intercept)".to_string());
            columns.push(vec![1.0; n_samples]);
        }

        for term in &formula.terms {
            let Term::Main(var) = term else {
                continue;
            };
            let values = complete_column(metadata, var)?;
            match metadata.column_type(var) {
                Some(VariableType::Continuous) | Some(VariableType::Ordinal) => {
                    names.push(var.clone());
                    columns.push(values.iter().filter_map(|v| v.as_numeric()).collect());
                }
                Some(VariableType::Categorical) | None => {
                    let mut levels = metadata.levels(var)?.into_iter();
                    if formula.intercept {
                        if let Some(reference) = levels.next() {
                            reference_levels.insert(var.clone(), reference);
                        }
                    }
                    for level in levels {
                        columns.push(
                            values
                                .iter()
                                .map(|v| (v.as_categorical() == Some(level.as_str())) as u8 as f64)
                                .collect(),
                        );
                        names.push(format!("{}{}", var, level));
                    }
                }
            }
        }

        Ok(Self {
            matrix: DMatrix::from_fn(n_samples, columns.len(), |i, j| columns[j][i]),
            coefficient_names: names,
            sample_ids: metadata.sample_ids().to_vec(),
            reference_levels,
        })
    }

    /// The matrix, samples × coefficients.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Coefficient names, one per column.
    pub fn coefficient_names(&self) -> &[String] {
        &self.coefficient_names
    }

    /// Sample IDs, one per row.
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    /// Number of samples (rows).
    pub fn n_samples(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of coefficients (columns).
    pub fn n_coefficients(&self) -> usize {
        self.matrix.ncols()
    }

    /// Reference level of a categorical variable.
    pub fn reference_level(&self, variable: &str) -> Option<&str> {
        self.reference_levels.get(variable).map(String::as_str)
    }

    /// Column index of a coefficient.
    pub fn coefficient_index(&self, name: &str) -> Option<usize> {
        self.coefficient_names.iter().position(|n| n == name)
    }

    /// Whether the columns are linearly independent.
    ///
    /// Singular values below `1e-10` times the largest count as zero.
    pub fn is_full_rank(&self) -> bool {
        let (rows, cols) = self.matrix.shape();
        if cols == 0 || rows < cols {
            return false;
        }
        let singular = self.matrix.clone().svd(false, false).singular_values;
        let largest = singular.max();
        largest > 0.0 && singular.iter().filter(|&&s| s > largest * 1e-10).count() == cols
    }
}

/// Values of a design variable; every sample must have one.
fn complete_column<'a>(metadata: &'a Metadata, var: &str) -> Result<Vec<&'a Variable>> {
    let values = metadata.column(var)?;
    if let Some(pos) = values.iter().position(|v| v.is_missing()) {
        return Err(IobioError::InvalidVariableType {
            column: var.to_string(),
            reason: format!("missing value for sample '{}'", metadata.sample_ids()[pos]),
        });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_metadata() -> Metadata {
        Metadata::from_rows(
            vec!["group".into(), "age".into(), "batch".into()],
            vec![
                ("S1".into(), vec![Variable::Categorical("control".into()), Variable::Continuous(25.0), Variable::Ordinal(1)]),
                ("S2".into(), vec![Variable::Categorical("treatment".into()), Variable::Continuous(30.0), Variable::Ordinal(1)]),
                ("S3".into(), vec![Variable::Categorical("control".into()), Variable::Continuous(35.0), Variable::Ordinal(2)]),
                ("S4".into(), vec![Variable::Categorical("treatment".into()), Variable::Continuous(28.0), Variable::Ordinal(2)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_categorical_variable() {
        let meta = create_test_metadata();
        let dm = DesignMatrix::from_formula(&meta, &Formula::parse("~ group").unwrap()).unwrap();

        assert_eq!(dm.coefficient_names(), &["(Intercept)", "grouptreatment"]);
        assert_eq!(dm.reference_level("group"), Some("control"));
        let col: Vec<f64> = (0..4).map(|i| dm.matrix()[(i, 1)]).collect();
        assert_eq!(col, vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_ordinal_is_numeric() {
        let meta = create_test_metadata();
        let dm = DesignMatrix::from_formula(&meta, &Formula::parse("~ `batch` + age").unwrap()).unwrap();

        assert_eq!(dm.coefficient_names(), &["(Intercept)", "batch", "age"]);
        let col: Vec<f64> = (0..4).map(|i| dm.matrix()[(i, 1)]).collect();
        assert_eq!(col, vec![1.0, 1.0, 2.0, 2.0]);
        assert!(dm.is_full_rank());
    }

    #[test]
    fn test_no_intercept_keeps_all_levels() {
        let meta = create_test_metadata();
        let dm = DesignMatrix::from_formula(&meta, &Formula::parse("~ 0 + group").unwrap()).unwrap();
        assert_eq!(dm.coefficient_names(), &["groupcontrol", "grouptreatment"]);
    }

    #[test]
    fn test_collinear_design_not_full_rank() {
        let meta = Metadata::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                ("S1".into(), vec![Variable::Ordinal(1), Variable::Ordinal(2)]),
                ("S2".into(), vec![Variable::Ordinal(2), Variable::Ordinal(4)]),
                ("S3".into(), vec![Variable::Ordinal(3), Variable::Ordinal(6)]),
            ],
        )
        .unwrap();
        let dm = DesignMatrix::from_formula(&meta, &Formula::parse("~ a + b").unwrap()).unwrap();
        assert!(!dm.is_full_rank());
    }

    #[test]
    fn test_unknown_column() {
        let meta = create_test_metadata();
        let result = DesignMatrix::from_formula(&meta, &Formula::parse("~ site").unwrap());
        assert!(matches!(result, Err(IobioError::MissingColumn(c)) if c == "site"));
    }

    #[test]
    fn test_missing_value_rejected() {
        let meta = Metadata::from_rows(
            vec!["a".into()],
            vec![
                ("S1".into(), vec![Variable::Ordinal(1)]),
                ("S2".into(), vec![Variable::Missing]),
            ],
        )
        .unwrap();
        let result = DesignMatrix::from_formula(&meta, &Formula::parse("~ a").unwrap());
        assert!(matches!(result, Err(IobioError::InvalidVariableType { .. })));
    }
}
