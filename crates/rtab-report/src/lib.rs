//! Regression result tables for manuscripts
//!
//! The reporting path is: a `FittedModel` goes through `ResultExtractor`
//! into `ResultRow`s, `format_rows` turns those into display strings, and
//! `render_table` lays them out as a LaTeX `tabular`. `ContrastEvaluator`
//! tests weighted combinations of factor levels and feeds its results
//! through the same formatter.
//!
//! ```no_run
//! use rtab_models::lm;
//! use rtab_report::{ReportConfig, report_model};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let data = rtab_core::DataFrame::new();
//! let fit = lm("willingness ~ condition", &data)?;
//! let config = ReportConfig {
//!     term_prefix: Some("condition".into()),
//!     include_intercept: false,
//!     ..ReportConfig::default()
//! };
//! let table = report_model(&fit, &config)?;
//! table.write_to("tables/willingness.tex")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod contrast;
pub mod error;
pub mod escape;
pub mod extract;
pub mod format;
pub mod pipeline;
pub mod table;

pub use config::{AnalysisConfig, ContrastConfig, ReportConfig};
pub use contrast::{ContrastEvaluator, ContrastResult, ContrastSet, ContrastSpecification};
pub use error::{ReportError, Result};
pub use escape::{escape_markup, escape_text};
pub use extract::{ResultExtractor, ResultRow, term_label};
pub use format::{DfFormat, Emphasis, FormatOptions, FormattedRow, format_p_value, format_rows};
pub use pipeline::{Analysis, AnalysisOutput, report_model};
pub use table::{Column, TableArtifact, TableLayout, TermHeader, render_table, render_table_to_path};
