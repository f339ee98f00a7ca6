//! Entropy summary of a correlation matrix.

use crate::data::NumericTable;
use crate::error::{IobioError, Result};
use nalgebra::DMatrix;

/// Mean of `-c * ln(c)` over the strictly lower triangle of a square
/// correlation matrix (row index greater than column index).
///
/// Each unordered pair is counted once and the diagonal is ignored. Pairs
/// whose value has no positive logarithm (zero, negative or `NaN`)
/// contribute 0 but still count toward the number of pairs.
pub fn correlation_matrix_to_entropy(matrix: &DMatrix<f64>) -> Result<f64> {
    let (n_rows, n_cols) = matrix.shape();
    if n_rows != n_cols {
        return Err(IobioError::DimensionMismatch {
            expected: n_rows,
            actual: n_cols,
        });
    }
    if n_rows < 2 {
        return Err(IobioError::EmptyData(
            "Correlation matrix needs at least two rows to have off-diagonal pairs".to_string(),
        ));
    }

    let mut total = 0.0;
    let mut n_pairs = 0usize;
    for col in 0..n_cols {
        for row in (col + 1)..n_rows {
            let c = matrix[(row, col)];
            if c > 0.0 {
                total -= c * c.ln();
            }
            n_pairs += 1;
        }
    }

    Ok(total / n_pairs as f64)
}

/// [`correlation_matrix_to_entropy`] over a labelled table.
pub fn correlation_table_entropy(table: &NumericTable) -> Result<f64> {
    correlation_matrix_to_entropy(table.data())
}
