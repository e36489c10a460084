//! Tabular data structures for rtab
//!
//! Survey and experiment exports arrive as columns of numbers and labels
//! with the literal token `"NA"` marking missing cells. This module holds
//! them in typed columns and provides the reshaping the analyses need
//! before a model is fitted.

mod builder;
mod cleaning;
mod dataframe;
mod series;

#[cfg(test)]
mod tests;

// Re-exports
pub use builder::DataFrameBuilder;
pub use cleaning::{CleaningConfig, LevelFilter};
pub use dataframe::DataFrame;
pub use series::Series;

/// Token used for missing cells in source data
pub const NA: &str = "NA";

// Type aliases for common use cases
pub type FloatArray = ndarray::Array1<f64>;
pub type Matrix = ndarray::Array2<f64>;

/// Error types specific to data operations
#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Invalid column type for '{column}': expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Cannot parse '{value}' as a number at row {row}")]
    ParseFloat { value: String, row: usize },

    #[error("Level '{level}' is not a level of '{column}'")]
    UnknownLevel { column: String, level: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for data operations
pub type Result<T> = std::result::Result<T, DataError>;
