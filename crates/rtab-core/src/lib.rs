//! Data handling and model formulas for rtab
//!
//! `data` holds study exports as typed columns with `"NA"` missing
//! values and applies configured cleaning steps. `formula` parses
//! R-style model formulas and builds treatment-coded design matrices.

pub mod data;
pub mod formula;

pub use data::{CleaningConfig, DataError, DataFrame, Series};
pub use formula::{DesignMatrix, Formula, FormulaError};
