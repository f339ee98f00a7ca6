//! iobio: small analysis tools for expression data
//!
//! # Overview
//!
//! - **heatmap**: stacked heatmaps of categorical and numeric panels over a
//!   shared column order, rendered with plotters
//! - **cluster**: hierarchical clustering with optimal leaf ordering
//! - **deseq**: two-level differential expression from long-format records
//! - **entropy**: entropy summary of a correlation matrix
//! - **data**: labelled tables, count matrices, metadata, design and results
//! - **normalize**: size factors and row rescaling
//! - **model**, **test**, **correct**: the negative binomial GLM, Wald test
//!   and Benjamini-Hochberg correction behind `deseq`
//!
//! # Example
//!
//! ```no_run
//! use iobio::prelude::*;
//!
//! let expression = NumericTable::from_tsv("expression.tsv").unwrap();
//! let groups = CategoricalTable::from_tsv("groups.tsv").unwrap();
//!
//! let colors = CategoryColors::new().with("tumor", "crimson").with("normal", "steelblue");
//! let mut stack = StackedHeatmap::new();
//! stack
//!     .add_level(DiscreteMatrix::new(groups, Some(colors)).unwrap())
//!     .add_level(ContinuousMatrix::new(expression, "expression").unwrap());
//! stack.cluster_columns(Linkage::Average).unwrap();
//!
//! let svg = stack.draw(&DrawOptions::default()).unwrap().render_svg().unwrap();
//! std::fs::write("stacked.svg", svg).unwrap();
//! ```

pub mod cluster;
pub mod correct;
pub mod data;
pub mod deseq;
pub mod entropy;
pub mod error;
pub mod heatmap;
pub mod model;
pub mod normalize;
pub mod test;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::cluster::{cluster_order, linkage, optimal_leaf_order, Dendrogram, Linkage};
    pub use crate::correct::{correct_bh, BhCorrected};
    pub use crate::data::{
        CategoricalTable, CountMatrix, DeResult, DeResultSet, DesignMatrix, Formula, Metadata,
        NumericTable, Variable,
    };
    pub use crate::deseq::{
        deseq_basic, DeseqConfig, DeseqDataSet, DeseqOutput, DifferentialFitter, ExpressionTable,
        FittedDataSet, FittingContext, NegativeBinomialFitter,
    };
    pub use crate::entropy::{correlation_matrix_to_entropy, correlation_table_entropy};
    pub use crate::error::{IobioError, Result};
    pub use crate::heatmap::{
        CategoryColors, ColorScale, ContinuousConfig, ContinuousMatrix, DiscreteConfig,
        DiscreteMatrix, DrawOptions, Figure, Level, Panel, StackedHeatmap, TickDisplay,
    };
    pub use crate::model::{model_nb, FitConfig, NbFit};
    pub use crate::normalize::{row_mean_normalize, row_range_normalize, size_factors};
    pub use crate::test::{test_wald, WaldResult};
}
