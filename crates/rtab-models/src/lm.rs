//! Linear regression models
//!
//! Ordinary least squares with R-style formulas. Factors are treatment
//! coded, so coefficient names read `{factor}{level}` the same way the
//! reporting layer expects from any other fitting library.

pub mod ols;
pub mod result;


// Re-exports
pub use ols::LinearRegression;
pub use result::LinearRegressionResult;

use crate::base::Result;
use rtab_core::data::DataFrame;

/// Vector type alias for 1D arrays
pub type Vector = ndarray::Array1<f64>;

/// Convenience function for OLS regression
pub fn lm(formula: &str, data: &DataFrame) -> Result<LinearRegressionResult> {
    LinearRegression::new(formula)?.data(data).fit()
}
