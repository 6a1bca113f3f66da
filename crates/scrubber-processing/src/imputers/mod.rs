//! Imputation module for handling missing values.
//!
//! Statistical per-column fills (mean, median, mode, backward, constant).

mod statistical;

pub use statistical::{ColumnFill, StatisticalImputer};
