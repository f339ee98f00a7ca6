//! Data structures: tables, counts, metadata, design and results.

mod count_matrix;
mod design_matrix;
mod formula;
mod metadata;
mod result;
mod table;

pub use count_matrix::CountMatrix;
pub use design_matrix::DesignMatrix;
pub use formula::{Formula, Term};
pub use metadata::{Metadata, Variable, VariableType};
pub use result::{DeResult, DeResultSet};
pub use table::{CategoricalTable, NumericTable};
pub(crate) use table::check_permutation;
