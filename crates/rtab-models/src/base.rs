//! Core traits and types for fitted models
//!
//! `FittedModel` is the capability interface the reporting layer reads.
//! A fit result implements the accessors it can answer; the defaults fail
//! with `ModelError::MissingCapability` naming what is absent, so an
//! adapter over an external library only overrides what that library
//! actually reports.

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

// Re-export core types
pub use coefficient::Coefficient;

pub use crate::error::ModelError;

pub mod coefficient;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Matrix type alias for 2D arrays
pub type Matrix = Array2<f64>;

/// Optional accessors of a fitted model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    StdErrors,
    DegreesOfFreedom,
    Statistics,
    PValues,
    ConfidenceIntervals,
    VarianceComponentIntervals,
    Covariance,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::StdErrors => "standard errors",
            Capability::DegreesOfFreedom => "degrees of freedom",
            Capability::Statistics => "test statistics",
            Capability::PValues => "p-values",
            Capability::ConfidenceIntervals => "confidence intervals",
            Capability::VarianceComponentIntervals => "variance component intervals",
            Capability::Covariance => "a coefficient covariance matrix",
        };
        f.write_str(name)
    }
}

/// Which parameters an interval query covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterSet {
    /// Fixed-effect coefficients only
    FixedEffects,
    /// Fixed effects followed by variance components
    All,
}

/// Degrees of freedom attached to the coefficient tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DegreesOfFreedom {
    /// One residual df shared by every term (OLS)
    Scalar(f64),
    /// One df per fixed-effect term (e.g. Satterthwaite)
    PerTerm(Vec<f64>),
}

impl DegreesOfFreedom {
    /// Degrees of freedom for the term at `index`
    pub fn for_term(&self, index: usize) -> Option<f64> {
        match self {
            DegreesOfFreedom::Scalar(df) => Some(*df),
            DegreesOfFreedom::PerTerm(dfs) => dfs.get(index).copied(),
        }
    }

    /// Number of per-term values, `None` for a scalar
    pub fn per_term_len(&self) -> Option<usize> {
        match self {
            DegreesOfFreedom::Scalar(_) => None,
            DegreesOfFreedom::PerTerm(dfs) => Some(dfs.len()),
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, DegreesOfFreedom::Scalar(_))
    }
}

/// Reference distribution of the coefficient test statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatisticKind {
    T,
    Z,
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatisticKind::T => f.write_str("t"),
            StatisticKind::Z => f.write_str("z"),
        }
    }
}

/// A two-sided interval for one named parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub parameter: String,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn new(parameter: impl Into<String>, lower: f64, upper: f64) -> Self {
        Self {
            parameter: parameter.into(),
            lower,
            upper,
        }
    }
}

/// Model type enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    /// Linear regression
    LinearRegression,
    /// Linear mixed model
    LinearMixedModel,
    /// Other model type
    Other(String),
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::LinearRegression => write!(f, "Linear Regression"),
            ModelType::LinearMixedModel => write!(f, "Linear Mixed Model"),
            ModelType::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Capability interface of a fitted regression model
///
/// Per-term accessors return values in the model's coefficient order.
pub trait FittedModel {
    /// Kind of model
    fn model_type(&self) -> ModelType;

    /// Raw coefficient names, e.g. `conditionClimate_Change`
    fn term_names(&self) -> Vec<String>;

    /// Point estimates
    fn estimates(&self) -> Vec<f64>;

    /// Standard errors of the estimates
    fn std_errors(&self) -> Result<Vec<f64>> {
        Err(ModelError::MissingCapability(Capability::StdErrors))
    }

    /// Degrees of freedom of the coefficient tests
    fn degrees_of_freedom(&self) -> Result<DegreesOfFreedom> {
        Err(ModelError::MissingCapability(Capability::DegreesOfFreedom))
    }

    /// Distribution the statistics refer to
    fn statistic_kind(&self) -> StatisticKind {
        StatisticKind::T
    }

    /// Test statistics
    fn statistics(&self) -> Result<Vec<f64>> {
        Err(ModelError::MissingCapability(Capability::Statistics))
    }

    /// Two-sided p-values
    fn p_values(&self) -> Result<Vec<f64>> {
        Err(ModelError::MissingCapability(Capability::PValues))
    }

    /// Confidence intervals at `level` for the selected parameters
    fn confint(&self, level: f64, parameters: ParameterSet) -> Result<Vec<ConfidenceInterval>> {
        let _ = (level, parameters);
        Err(ModelError::MissingCapability(Capability::ConfidenceIntervals))
    }

    /// Covariance matrix of the fixed-effect estimates
    fn vcov(&self) -> Result<Matrix> {
        Err(ModelError::MissingCapability(Capability::Covariance))
    }

    /// Number of observations used in the fit, if known
    fn n_obs(&self) -> Option<usize> {
        None
    }
}

/// Reject confidence levels outside (0, 1)
pub fn check_confidence_level(level: f64) -> Result<()> {
    if level.is_finite() && level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(ModelError::InvalidConfig {
            message: format!("confidence level must lie in (0, 1), got {}", level),
        })
    }
}
