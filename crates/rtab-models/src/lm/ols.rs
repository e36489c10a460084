//! Ordinary Least Squares (OLS) linear regression
//!
//! This module implements the standard linear regression model
//! using the ordinary least squares estimator.

use log::debug;
use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::base::{Matrix, ModelError, Result};
use crate::lm::{LinearRegressionResult, Vector};
use rtab_core::data::DataFrame;
use rtab_core::formula::{Formula, FormulaError};

/// Pivot ratio below which `X'X` is treated as singular
const SINGULARITY_TOLERANCE: f64 = 1e-7;

/// OLS linear regression model
#[derive(Debug, Clone)]
pub struct LinearRegression {
    /// Model formula
    formula: Formula,
    /// Data
    data: Option<DataFrame>,
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new(formula: &str) -> Result<Self> {
        let formula = Formula::parse(formula).map_err(ModelError::Formula)?;

        if let Some(group) = formula.random_group() {
            return Err(ModelError::InvalidConfig {
                message: format!(
                    "random intercept for '{}' needs a mixed model fit, not OLS",
                    group
                ),
            });
        }

        Ok(Self {
            formula,
            data: None,
        })
    }

    /// Set data for the model
    pub fn data(mut self, data: &DataFrame) -> Self {
        self.data = Some(data.clone());
        self
    }

    /// Fit the OLS model
    pub fn fit(self) -> Result<LinearRegressionResult> {
        let data = self.data.as_ref().ok_or_else(|| ModelError::InvalidConfig {
            message: "No data provided".to_string(),
        })?;

        let design = self.formula.design_matrix(data)?;
        let y = design
            .y
            .clone()
            .ok_or(ModelError::Formula(FormulaError::MissingResponse))?;
        let x = &design.x;

        let n = x.nrows();
        let p = x.ncols();

        if n <= p {
            return Err(ModelError::InsufficientData {
                n_samples: n,
                n_predictors: p,
            });
        }

        // Normal equations through a Cholesky factor of X'X
        let xtx = x.t().dot(x);
        let chol = cholesky(&xtx)?;

        let xty = x.t().dot(&y);
        let solution = chol.solve(&DVector::from_iterator(p, xty.iter().copied()));
        let coefficients: Vector = solution.iter().copied().collect();

        let inverse = chol.inverse();
        let xtx_inv = Matrix::from_shape_fn((p, p), |(i, j)| inverse[(i, j)]);

        let fitted_values = x.dot(&coefficients);
        let residuals = &y - &fitted_values;

        let df_residual = n - p;
        let rss = residuals.mapv(|r| r * r).sum();
        let sigma2 = rss / df_residual as f64;

        let vcov = &xtx_inv * sigma2;
        let standard_errors = vcov.diag().mapv(|v| v.max(0.0).sqrt());

        let (t_statistics, p_values) =
            inference(&coefficients, &standard_errors, df_residual as f64)?;

        // Uncentered total sum of squares without an intercept, as R does
        let tss = if self.formula.has_intercept {
            let y_mean = y.mean().unwrap_or(0.0);
            y.iter().map(|&yi| (yi - y_mean).powi(2)).sum::<f64>()
        } else {
            y.iter().map(|&yi| yi * yi).sum::<f64>()
        };
        let r_squared = 1.0 - rss / tss;
        let intercept_df = if self.formula.has_intercept { 1.0 } else { 0.0 };
        let adj_r_squared =
            1.0 - (1.0 - r_squared) * ((n as f64 - intercept_df) / df_residual as f64);

        debug!(
            "Fitted '{}' on {} observations ({} dropped), residual df {}",
            self.formula, n, design.dropped_rows, df_residual
        );

        Ok(LinearRegressionResult {
            formula: self.formula.to_string(),
            variable_names: design.column_names,
            coefficients,
            standard_errors,
            t_statistics,
            p_values,
            vcov,
            fitted_values,
            residuals,
            df_residual,
            r_squared,
            adj_r_squared,
            residual_std_error: sigma2.sqrt(),
            dropped_rows: design.dropped_rows,
            factor_levels: design.factor_levels,
        })
    }
}

/// Factor `X'X`, rejecting (numerically) rank-deficient designs
fn cholesky(xtx: &Matrix) -> Result<Cholesky<f64, Dyn>> {
    let p = xtx.nrows();
    let m = DMatrix::from_fn(p, p, |i, j| xtx[(i, j)]);

    let singular = || ModelError::SingularMatrix {
        operation: "cholesky of X'X".to_string(),
    };

    let chol = m.cholesky().ok_or_else(singular)?;

    let l = chol.l();
    for i in 0..p {
        let scale = xtx[(i, i)].sqrt();
        if scale == 0.0 || l[(i, i)] / scale < SINGULARITY_TOLERANCE {
            return Err(singular());
        }
    }

    Ok(chol)
}

/// t-statistics and two-sided p-values
fn inference(coefficients: &Vector, std_errors: &Vector, df: f64) -> Result<(Vector, Vector)> {
    let t_statistics: Vector = coefficients
        .iter()
        .zip(std_errors.iter())
        .map(|(&coef, &se)| coef / se)
        .collect();

    let t_dist =
        StudentsT::new(0.0, 1.0, df).map_err(|e| ModelError::numerical("inference", e))?;

    let p_values: Vector = t_statistics
        .iter()
        .map(|&t| {
            if t.is_nan() {
                f64::NAN
            } else {
                (2.0 * t_dist.sf(t.abs())).clamp(0.0, 1.0)
            }
        })
        .collect();

    Ok((t_statistics, p_values))
}
