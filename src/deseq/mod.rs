//! Differential expression between two sample categories.
//!
//! [`deseq_basic`] takes long-format expression records, pivots them into a
//! count matrix, fits a negative binomial model per feature through a
//! [`FittingContext`] and reports log2 fold changes with Wald p-values and
//! Benjamini-Hochberg adjusted p-values.

mod basic;
mod context;
mod dataset;
mod records;

pub use basic::{deseq_basic, DeseqConfig, DeseqOutput};
pub use context::{DifferentialFitter, FittingContext, NegativeBinomialFitter};
pub use dataset::{DeseqDataSet, FittedDataSet};
pub use records::ExpressionTable;
