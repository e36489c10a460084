//! Reporting error types

use thiserror::Error;

use rtab_core::data::DataError;
use rtab_core::formula::FormulaError;
use rtab_models::{Capability, ModelError};

/// Errors raised while extracting, formatting or rendering results
#[derive(Debug, Error)]
pub enum ReportError {
    /// The fitted model cannot provide a required quantity
    #[error("Model does not provide {0}")]
    MissingCapability(Capability),

    /// Per-term quantities disagree in length
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// A result row holds a value outside its valid range
    #[error("Invalid row {row} ('{term}'): {reason}")]
    InvalidRow {
        /// Zero-based row position
        row: usize,
        term: String,
        reason: String,
    },

    /// Contrast weights do not sum to zero
    #[error("Contrast '{name}' is unbalanced: weights sum to {sum}")]
    UnbalancedContrast { name: String, sum: f64 },

    /// A contrast names a level the factor does not have
    #[error("Contrast '{contrast}' refers to unknown level '{level}' of '{factor}'")]
    UnknownLevel {
        contrast: String,
        factor: String,
        level: String,
    },

    /// A contrast level has no matching model coefficient
    #[error("Contrast '{contrast}' needs coefficient '{term}', which the model does not have")]
    UnknownTerm { contrast: String, term: String },

    #[error("Invalid table layout: {0}")]
    InvalidLayout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    #[error("Model error: {0}")]
    Model(ModelError),
}

impl From<ModelError> for ReportError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::MissingCapability(capability) => ReportError::MissingCapability(capability),
            ModelError::DimensionMismatch {
                what,
                expected,
                actual,
            } => ReportError::DimensionMismatch {
                what,
                expected,
                actual,
            },
            ModelError::InvalidConfig { message } => ReportError::InvalidConfig(message),
            ModelError::Formula(e) => ReportError::Formula(e),
            ModelError::Data(e) => ReportError::Data(e),
            other => ReportError::Model(other),
        }
    }
}

/// Result type for reporting operations
pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_errors_keep_their_kind() {
        let err: ReportError = ModelError::MissingCapability(Capability::PValues).into();
        assert!(matches!(
            err,
            ReportError::MissingCapability(Capability::PValues)
        ));
        assert_eq!(err.to_string(), "Model does not provide p-values");

        let err: ReportError = ModelError::SingularMatrix {
            operation: "cholesky".into(),
        }
        .into();
        assert!(matches!(err, ReportError::Model(_)));
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ReportError::UnbalancedContrast {
            name: "Climate vs Global".into(),
            sum: 1.0,
        };
        assert!(err.to_string().contains("Climate vs Global"));

        let err = ReportError::InvalidRow {
            row: 2,
            term: "conditionX".into(),
            reason: "p-value 1.5 outside [0, 1]".into(),
        };
        assert!(err.to_string().starts_with("Invalid row 2 ('conditionX')"));
    }
}
