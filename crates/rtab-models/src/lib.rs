//! Fitted regression models for rtab
//!
//! `base` defines the `FittedModel` capability interface that the
//! reporting layer reads. `lm` fits ordinary least squares models from
//! formulas; `mixed` adapts externally fitted random-intercept models.

pub mod base;
pub mod error;
pub mod lm;
pub mod mixed;

pub use base::{
    Capability, Coefficient, ConfidenceInterval, DegreesOfFreedom, FittedModel, Matrix,
    ModelType, ParameterSet, StatisticKind,
};
pub use error::ModelError;
pub use lm::{LinearRegression, LinearRegressionResult, lm};
pub use mixed::{MixedModelFit, VarianceComponent};
