//! Two-level differential expression from long-format records.

use super::context::FittingContext;
use super::dataset::{DeseqDataSet, FittedDataSet};
use super::records::ExpressionTable;
use crate::data::{CountMatrix, DeResultSet, Formula, Metadata, Variable};
use crate::error::{IobioError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Column names and comparison levels for [`deseq_basic`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeseqConfig {
    /// Category value treated as the numerator of the fold change.
    pub numerator: String,
    /// Category value treated as the denominator.
    pub denominator: String,
    /// Column holding each sample's category.
    pub category_field: String,
    /// Column holding sample identifiers.
    pub sample_field: String,
    /// Optional integer batch column, added to the design before category.
    pub batch_field: Option<String>,
    /// Column holding feature names.
    pub expression_name_field: String,
    /// Column holding the counts.
    pub counts_field: String,
}

impl Default for DeseqConfig {
    fn default() -> Self {
        Self {
            numerator: "2".to_string(),
            denominator: "1".to_string(),
            category_field: "Category".to_string(),
            sample_field: "Sample".to_string(),
            batch_field: None,
            expression_name_field: "Name".to_string(),
            counts_field: "NumReads".to_string(),
        }
    }
}

impl DeseqConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(IobioError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(IobioError::from)
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(IobioError::from)
    }
}

/// Everything [`deseq_basic`] produces.
#[derive(Debug, Clone)]
pub struct DeseqOutput {
    /// The unfitted data set.
    pub dataset: DeseqDataSet,
    /// The fitted data set.
    pub fitted: FittedDataSet,
    /// Per-feature results in matrix row order.
    pub results: DeResultSet,
    /// Pivoted count matrix (features × samples).
    pub matrix: CountMatrix,
    /// Per-sample annotation as found in the records (first record per sample).
    pub sample_metadata: Metadata,
}

/// Compare two category levels across samples.
///
/// Records are pivoted into a feature × sample count matrix (both axes
/// sorted). Each sample's category is recoded numerator → 2,
/// denominator → 1; the design is `~ category` or `~ batch + category`, and
/// the reported fold change is numerator over denominator.
pub fn deseq_basic(
    table: &ExpressionTable,
    config: &DeseqConfig,
    context: &FittingContext,
) -> Result<DeseqOutput> {
    let matrix = pivot_counts(table, config)?;
    let sample_metadata = first_record_metadata(table, config, matrix.sample_ids())?;
    let model_metadata = recode_metadata(&sample_metadata, config)?;

    let formula = Formula::for_comparison(&config.category_field, config.batch_field.as_deref())?;
    let dataset = DeseqDataSet::new(matrix.clone(), &model_metadata, formula)?;

    let fitted = context.fit(&dataset)?;
    let results = context.results(&fitted, &config.category_field, &config.expression_name_field)?;

    tracing::info!(
        features = results.len(),
        samples = matrix.n_samples(),
        converged = fitted.fit.n_converged(),
        significant = results.significant_at(0.05).len(),
        "differential expression complete"
    );

    Ok(DeseqOutput {
        dataset,
        fitted,
        results,
        matrix,
        sample_metadata,
    })
}

/// Long records to a feature × sample count matrix.
fn pivot_counts(table: &ExpressionTable, config: &DeseqConfig) -> Result<CountMatrix> {
    if table.n_records() == 0 {
        return Err(IobioError::EmptyData("Expression table has no records".to_string()));
    }

    let name_idx = table.column_index(&config.expression_name_field)?;
    let sample_idx = table.column_index(&config.sample_field)?;
    let count_idx = table.column_index(&config.counts_field)?;

    let features: BTreeSet<&str> = table.records().map(|r| r[name_idx].as_str()).collect();
    let samples: BTreeSet<&str> = table.records().map(|r| r[sample_idx].as_str()).collect();
    let feature_pos: HashMap<&str, usize> = features.iter().enumerate().map(|(i, f)| (*f, i)).collect();
    let sample_pos: HashMap<&str, usize> = samples.iter().enumerate().map(|(j, s)| (*s, j)).collect();

    let mut cells: HashMap<(usize, usize), u64> = HashMap::with_capacity(table.n_records());
    for (row, record) in table.records().enumerate() {
        let i = feature_pos[record[name_idx].as_str()];
        let j = sample_pos[record[sample_idx].as_str()];
        let value = parse_count(&record[count_idx], row, count_idx)?;
        if cells.insert((i, j), value).is_some() {
            return Err(IobioError::DataShape(format!(
                "Duplicate record for feature '{}' in sample '{}'",
                record[name_idx], record[sample_idx]
            )));
        }
    }

    let expected = features.len() * samples.len();
    if cells.len() != expected {
        return Err(IobioError::DataShape(format!(
            "Expected {} feature/sample records, found {}",
            expected,
            cells.len()
        )));
    }

    let triplets: Vec<(usize, usize, u64)> = cells.into_iter().map(|((i, j), v)| (i, j, v)).collect();
    CountMatrix::from_triplets(
        features.iter().map(|s| s.to_string()).collect(),
        samples.iter().map(|s| s.to_string()).collect(),
        &triplets,
    )
}

/// Counts may arrive as estimated (fractional) reads; they are truncated.
fn parse_count(value: &str, row: usize, col: usize) -> Result<u64> {
    let invalid = || IobioError::InvalidCount {
        value: value.to_string(),
        row,
        col,
    };
    let parsed: f64 = value.trim().parse().map_err(|_| invalid())?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(invalid());
    }
    Ok(parsed.trunc() as u64)
}

/// Category (and batch) as found in the first record of each sample.
fn first_record_metadata(
    table: &ExpressionTable,
    config: &DeseqConfig,
    sample_ids: &[String],
) -> Result<Metadata> {
    let sample_idx = table.column_index(&config.sample_field)?;
    let mut columns = vec![config.category_field.clone()];
    if let Some(batch) = &config.batch_field {
        columns.push(batch.clone());
    }
    let column_idx: Vec<usize> = columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<_>>()?;

    let mut first: HashMap<&str, Vec<Variable>> = HashMap::new();
    for record in table.records() {
        first.entry(record[sample_idx].as_str()).or_insert_with(|| {
            column_idx
                .iter()
                .map(|&k| Variable::Categorical(record[k].clone()))
                .collect()
        });
    }

    let rows = sample_ids
        .iter()
        .map(|sid| {
            first
                .remove(sid.as_str())
                .map(|values| (sid.clone(), values))
                .ok_or_else(|| IobioError::DataShape(format!("Sample '{}' has no records", sid)))
        })
        .collect::<Result<Vec<_>>>()?;

    Metadata::from_rows(columns, rows)
}

/// Numeric model covariates: category recoded to 2/1, batch parsed as an integer.
fn recode_metadata(raw: &Metadata, config: &DeseqConfig) -> Result<Metadata> {
    let mut columns = vec![config.category_field.clone()];
    if let Some(batch) = &config.batch_field {
        columns.push(batch.clone());
    }

    let mut seen_numerator = false;
    let mut seen_denominator = false;
    let mut rows = Vec::with_capacity(raw.n_samples());

    for sid in raw.sample_ids() {
        let category = raw
            .get(sid, &config.category_field)
            .map(|v| v.to_string())
            .unwrap_or_default();
        let coded = if category == config.numerator {
            seen_numerator = true;
            2
        } else if category == config.denominator {
            seen_denominator = true;
            1
        } else {
            return Err(IobioError::StatisticalFit(format!(
                "Sample '{}' has {} '{}', which is neither numerator '{}' nor denominator '{}'",
                sid, config.category_field, category, config.numerator, config.denominator
            )));
        };

        let mut values = vec![Variable::Ordinal(coded)];
        if let Some(batch) = &config.batch_field {
            let text = raw.get(sid, batch).map(|v| v.to_string()).unwrap_or_default();
            let level: i64 = text.trim().parse().map_err(|_| IobioError::InvalidVariableType {
                column: batch.clone(),
                reason: format!("batch value '{}' for sample '{}' is not an integer", text, sid),
            })?;
            values.push(Variable::Ordinal(level));
        }
        rows.push((sid.clone(), values));
    }

    if !seen_numerator || !seen_denominator {
        let absent = if seen_numerator { &config.denominator } else { &config.numerator };
        return Err(IobioError::StatisticalFit(format!(
            "No samples with {} '{}'",
            config.category_field, absent
        )));
    }

    Metadata::from_rows(columns, rows)
}
