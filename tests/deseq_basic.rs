//! Integration tests for two-level differential expression

use approx::assert_relative_eq;
use iobio::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

const N_SAMPLES: usize = 8;

/// Fold change applied to numerator samples, per gene.
fn fold(gene: usize) -> f64 {
    match gene {
        0 => 8.0,
        1 => 0.25,
        _ => 1.0,
    }
}

fn gene_name(gene: usize) -> String {
    match gene {
        0 => "up".to_string(),
        1 => "down".to_string(),
        g => format!("flat{:02}", g),
    }
}

/// Long-format records as a TSV file: samples 1-4 are category "1",
/// 5-8 category "2", batch alternates 1/2.
fn create_records_file(n_genes: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Name\tSample\tNumReads\tCategory\tBatch").unwrap();
    for gene in 0..n_genes {
        let base = 200.0 + 40.0 * gene as f64;
        for j in 0..N_SAMPLES {
            let numerator = j >= N_SAMPLES / 2;
            // deterministic jitter of up to +-10%
            let jitter = 1.0 + 0.05 * (((gene * 7 + j * 3) % 5) as f64 - 2.0);
            let reads = base * jitter * if numerator { fold(gene) } else { 1.0 };
            writeln!(
                file,
                "{}\tsample{}\t{:.3}\t{}\t{}",
                gene_name(gene),
                j + 1,
                reads,
                if numerator { 2 } else { 1 },
                j % 2 + 1
            )
            .unwrap();
        }
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_detects_fold_changes() {
    let file = create_records_file(10);
    let table = ExpressionTable::from_tsv(file.path()).unwrap();
    let context = FittingContext::open();

    let output = deseq_basic(&table, &DeseqConfig::default(), &context).unwrap();

    assert_eq!(output.matrix.n_features(), 10);
    assert_eq!(output.matrix.n_samples(), N_SAMPLES);
    assert_eq!(output.results.index_name, "Name");
    assert_eq!(output.results.coefficient, "Category");

    // results follow matrix row order
    let ids: Vec<&str> = output.results.feature_ids();
    let rows: Vec<&str> = output.matrix.feature_ids().iter().map(String::as_str).collect();
    assert_eq!(ids, rows);

    let up = output.results.get_feature("up").unwrap();
    assert!(up.log2_fold_change > 0.0);
    assert_relative_eq!(up.log2_fold_change, 3.0, epsilon = 0.3);
    assert!(up.p_adj < 0.01);

    let down = output.results.get_feature("down").unwrap();
    assert!(down.log2_fold_change < 0.0);
    assert_relative_eq!(down.log2_fold_change, -2.0, epsilon = 0.3);
    assert!(down.p_adj < 0.01);

    for r in output.results.iter().filter(|r| r.feature_id.starts_with("flat")) {
        assert!(r.log2_fold_change.abs() < 0.5, "{} lfc {}", r.feature_id, r.log2_fold_change);
    }

    let hits = output.results.significant_at(0.05);
    let significant: Vec<&str> = hits.iter().map(|r| r.feature_id.as_str()).collect();
    assert!(significant.contains(&"up"));
    assert!(significant.contains(&"down"));
}

#[test]
fn test_sample_metadata_from_first_record() {
    let file = create_records_file(3);
    let table = ExpressionTable::from_tsv(file.path()).unwrap();
    let config = DeseqConfig {
        batch_field: Some("Batch".to_string()),
        ..Default::default()
    };

    let output = deseq_basic(&table, &config, &FittingContext::open()).unwrap();
    let meta = &output.sample_metadata;

    assert_eq!(meta.sample_ids(), output.matrix.sample_ids());
    assert_eq!(meta.get("sample1", "Category").unwrap().to_string(), "1");
    assert_eq!(meta.get("sample8", "Category").unwrap().to_string(), "2");
    assert_eq!(meta.get("sample2", "Batch").unwrap().to_string(), "2");
    assert_eq!(output.dataset.design().n_coefficients(), 3);
}

#[test]
fn test_batch_design_keeps_effect() {
    let file = create_records_file(10);
    let table = ExpressionTable::from_tsv(file.path()).unwrap();
    let config = DeseqConfig {
        batch_field: Some("Batch".to_string()),
        ..Default::default()
    };

    let output = deseq_basic(&table, &config, &FittingContext::open()).unwrap();
    let up = output.results.get_feature("up").unwrap();
    assert_relative_eq!(up.log2_fold_change, 3.0, epsilon = 0.3);
}

#[test]
fn test_swapped_levels_flip_sign() {
    let file = create_records_file(10);
    let table = ExpressionTable::from_tsv(file.path()).unwrap();
    let config = DeseqConfig {
        numerator: "1".to_string(),
        denominator: "2".to_string(),
        ..Default::default()
    };

    let output = deseq_basic(&table, &config, &FittingContext::open()).unwrap();
    let up = output.results.get_feature("up").unwrap();
    assert!(up.log2_fold_change < 0.0);
    assert_relative_eq!(up.log2_fold_change, -3.0, epsilon = 0.3);
}

#[test]
fn test_absent_level_is_fit_error() {
    let file = create_records_file(3);
    let table = ExpressionTable::from_tsv(file.path()).unwrap();
    let config = DeseqConfig {
        numerator: "treated".to_string(),
        ..Default::default()
    };
    let err = deseq_basic(&table, &config, &FittingContext::open()).unwrap_err();
    assert!(matches!(err, IobioError::StatisticalFit(_)));
}

#[test]
fn test_non_integer_batch_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Name\tSample\tNumReads\tCategory\tBatch").unwrap();
    for (j, batch) in ["a", "a", "b", "b"].iter().enumerate() {
        writeln!(file, "g1\ts{}\t{}\t{}\t{}", j, 10 + j, j / 2 + 1, batch).unwrap();
    }
    file.flush().unwrap();

    let table = ExpressionTable::from_tsv(file.path()).unwrap();
    let config = DeseqConfig {
        batch_field: Some("Batch".to_string()),
        ..Default::default()
    };
    let err = deseq_basic(&table, &config, &FittingContext::open()).unwrap_err();
    assert!(matches!(err, IobioError::InvalidVariableType { ref column, .. } if column == "Batch"));
}

#[test]
fn test_results_written_as_tsv() {
    let file = create_records_file(4);
    let table = ExpressionTable::from_tsv(file.path()).unwrap();
    let output = deseq_basic(&table, &DeseqConfig::default(), &FittingContext::open()).unwrap();

    let out = NamedTempFile::new().unwrap();
    output.results.to_tsv(out.path()).unwrap();
    let text = fs::read_to_string(out.path()).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("Name\tbaseMean\tlog2FoldChange"));
    // matrix rows are sorted by name
    assert!(lines[1].starts_with("down\t"));
}

#[test]
fn test_config_from_json() {
    let config = DeseqConfig::from_json(
        r#"{"numerator": "tumor", "denominator": "normal", "category_field": "Group", "batch_field": "Lane"}"#,
    )
    .unwrap();
    assert_eq!(config.category_field, "Group");
    assert_eq!(config.batch_field.as_deref(), Some("Lane"));
    assert_eq!(config.sample_field, "Sample");
}

#[test]
fn test_entropy_of_sample_correlations() {
    let matrix = nalgebra::DMatrix::from_row_slice(3, 3, &[1.0, 0.5, 0.5, 0.5, 1.0, 0.5, 0.5, 0.5, 1.0]);
    let entropy = correlation_matrix_to_entropy(&matrix).unwrap();
    assert_relative_eq!(entropy, -0.5 * 0.5f64.ln(), epsilon = 1e-12);
}
