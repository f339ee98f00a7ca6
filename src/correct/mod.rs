//! Multiple testing correction.

mod bh;

pub use bh::{correct_bh, correct_bh_wald, BhCorrected};
