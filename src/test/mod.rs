//! Hypothesis tests on fitted coefficients.

mod wald;

pub use wald::{test_wald, WaldResult, WaldResultSingle};
