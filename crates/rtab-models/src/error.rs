//! Model-related error types

use thiserror::Error;

use rtab_core::data::DataError;
use rtab_core::formula::FormulaError;

use crate::base::Capability;

/// Model-related errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// Formula parsing or evaluation error
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    /// Data-related error
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// The fit result cannot provide a required quantity
    #[error("Model does not provide {0}")]
    MissingCapability(Capability),

    /// Per-term quantities disagree in length
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Quantity being checked
        what: String,
        /// Expected length
        expected: usize,
        /// Length found
        actual: usize,
    },

    /// Numerical computation error
    #[error("Numerical error: {message} (operation: {operation})")]
    NumericalError {
        /// Error message
        message: String,
        /// Operation that failed
        operation: String,
    },

    /// Insufficient data for model fitting
    #[error("Not enough data: {n_samples} samples for {n_predictors} predictors")]
    InsufficientData {
        /// Number of samples
        n_samples: usize,
        /// Number of predictors
        n_predictors: usize,
    },

    /// Singular matrix encountered
    #[error("Singular matrix encountered in {operation}")]
    SingularMatrix {
        /// Operation that failed
        operation: String,
    },

    /// Invalid model configuration
    #[error("Invalid model configuration: {message}")]
    InvalidConfig {
        /// Configuration error message
        message: String,
    },
}

impl ModelError {
    pub(crate) fn numerical(operation: &str, message: impl ToString) -> Self {
        ModelError::NumericalError {
            message: message.to_string(),
            operation: operation.to_string(),
        }
    }
}
