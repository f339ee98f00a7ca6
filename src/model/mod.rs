//! Statistical models for differential expression.

mod nb;

pub use nb::{model_nb, FitConfig, NbFit, NbFitSingle};
