//! Linear regression result structure
//!
//! This module defines the result structure for linear regression models,
//! containing all the information from fitting a linear model.

use indexmap::IndexMap;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::fmt;

use crate::base::{
    Coefficient, ConfidenceInterval, DegreesOfFreedom, FittedModel, Matrix, ModelError,
    ModelType, ParameterSet, Result, StatisticKind, check_confidence_level,
};
use crate::lm::Vector;

/// OLS linear regression result
#[derive(Debug, Clone)]
pub struct LinearRegressionResult {
    /// Formula as fitted
    pub formula: String,
    /// Coefficient names, in design matrix column order
    pub variable_names: Vec<String>,
    /// Coefficients (β)
    pub coefficients: Vector,
    /// Standard errors of coefficients
    pub standard_errors: Vector,
    /// t-statistics for coefficients
    pub t_statistics: Vector,
    /// p-values for coefficients
    pub p_values: Vector,
    /// Covariance matrix of the coefficients
    pub vcov: Matrix,
    /// Fitted values (ŷ)
    pub fitted_values: Vector,
    /// Residuals (y - ŷ)
    pub residuals: Vector,
    /// Residual degrees of freedom (n - p)
    pub df_residual: usize,
    /// R-squared
    pub r_squared: f64,
    /// Adjusted R-squared
    pub adj_r_squared: f64,
    /// Residual standard error
    pub residual_std_error: f64,
    /// Rows dropped for missing values before fitting
    pub dropped_rows: usize,
    /// Coded levels of each factor term, reference first
    pub factor_levels: IndexMap<String, Vec<String>>,
}

impl LinearRegressionResult {
    /// Levels of `factor` the fit coded, reference first
    pub fn levels(&self, factor: &str) -> Option<&[String]> {
        self.factor_levels.get(factor).map(Vec::as_slice)
    }

    /// Convert coefficients to Coefficient structs
    pub fn to_coefficients(&self) -> Vec<Coefficient> {
        self.variable_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Coefficient::new(name.clone(), self.coefficients[i])
                    .with_std_error(self.standard_errors[i])
                    .with_df(self.df_residual as f64)
                    .with_t_stat(self.t_statistics[i])
                    .with_p_value(self.p_values[i])
            })
            .collect()
    }

    /// Get the number of observations
    pub fn n_observations(&self) -> usize {
        self.residuals.len()
    }

    /// Get the number of predictors (including intercept)
    pub fn n_predictors(&self) -> usize {
        self.coefficients.len()
    }

    /// Get residual sum of squares
    pub fn rss(&self) -> f64 {
        self.residuals.mapv(|r| r * r).sum()
    }

    fn t_critical(&self, level: f64) -> Result<f64> {
        check_confidence_level(level)?;
        let t_dist = StudentsT::new(0.0, 1.0, self.df_residual as f64)
            .map_err(|e| ModelError::numerical("confint", e))?;
        Ok(t_dist.inverse_cdf(1.0 - (1.0 - level) / 2.0))
    }
}

impl FittedModel for LinearRegressionResult {
    fn model_type(&self) -> ModelType {
        ModelType::LinearRegression
    }

    fn term_names(&self) -> Vec<String> {
        self.variable_names.clone()
    }

    fn estimates(&self) -> Vec<f64> {
        self.coefficients.to_vec()
    }

    fn std_errors(&self) -> Result<Vec<f64>> {
        Ok(self.standard_errors.to_vec())
    }

    fn degrees_of_freedom(&self) -> Result<DegreesOfFreedom> {
        Ok(DegreesOfFreedom::Scalar(self.df_residual as f64))
    }

    fn statistic_kind(&self) -> StatisticKind {
        StatisticKind::T
    }

    fn statistics(&self) -> Result<Vec<f64>> {
        Ok(self.t_statistics.to_vec())
    }

    fn p_values(&self) -> Result<Vec<f64>> {
        Ok(self.p_values.to_vec())
    }

    /// Wald intervals; every OLS parameter is a fixed effect
    fn confint(&self, level: f64, _parameters: ParameterSet) -> Result<Vec<ConfidenceInterval>> {
        let t_critical = self.t_critical(level)?;

        Ok(self
            .variable_names
            .iter()
            .zip(self.coefficients.iter().zip(self.standard_errors.iter()))
            .map(|(name, (&coef, &se))| {
                ConfidenceInterval::new(name.clone(), coef - t_critical * se, coef + t_critical * se)
            })
            .collect())
    }

    fn vcov(&self) -> Result<Matrix> {
        Ok(self.vcov.clone())
    }

    fn n_obs(&self) -> Option<usize> {
        Some(self.n_observations())
    }
}

impl fmt::Display for LinearRegressionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Linear Regression Results")?;
        writeln!(f, "========================")?;
        writeln!(f, "Formula:      {}", self.formula)?;
        writeln!(f, "Observations: {}", self.n_observations())?;
        writeln!(f, "Predictors:   {}", self.n_predictors())?;
        writeln!(f)?;

        writeln!(
            f,
            "{:<24} {:>12} {:>12} {:>12} {:>12}",
            "Term", "Estimate", "Std Error", "t-value", "p-value"
        )?;
        writeln!(
            f,
            "{:-<24} {:-<12} {:-<12} {:-<12} {:-<12}",
            "", "", "", "", ""
        )?;
        for coeff in self.to_coefficients() {
            writeln!(
                f,
                "{:<24} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
                coeff.name,
                coeff.estimate,
                coeff.std_error.unwrap_or(f64::NAN),
                coeff.t_stat.unwrap_or(f64::NAN),
                coeff.p_value.unwrap_or(f64::NAN)
            )?;
        }
        writeln!(f)?;

        writeln!(f, "R-squared:           {:.4}", self.r_squared)?;
        writeln!(f, "Adjusted R-squared:  {:.4}", self.adj_r_squared)?;
        writeln!(
            f,
            "Residual Std Error:  {:.4} on {} df",
            self.residual_std_error, self.df_residual
        )?;

        Ok(())
    }
}
