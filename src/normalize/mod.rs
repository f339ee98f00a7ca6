//! Normalization.
//!
//! - **Size factors**: median-of-ratios library size correction for counts
//! - **Rows**: per-row rescaling of continuous heatmap data

mod rows;
mod size_factors;

pub use rows::{row_mean_normalize, row_range_normalize};
pub use size_factors::{normalized_counts, size_factors};
