//! Configurable cleaning steps applied before model fitting
//!
//! Column lists and level filters are dataset specific, so they come in
//! as configuration rather than code.

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use super::*;

/// Keep only rows whose factor `column` is one of `keep`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelFilter {
    pub column: String,
    pub keep: Vec<String>,
}

/// Cleaning configuration
///
/// Steps run in field order: rename, drop, filter, relevel, then listwise
/// deletion over `require_complete`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Old name to new name
    pub rename: IndexMap<String, String>,
    /// Columns removed after renaming
    pub drop_columns: Vec<String>,
    /// Row filters on factor columns
    pub filters: Vec<LevelFilter>,
    /// Factor column to reference level
    pub reference_levels: IndexMap<String, String>,
    /// Columns that must be present in every kept row
    pub require_complete: Vec<String>,
}

impl CleaningConfig {
    /// Apply every configured step to a copy of `df`
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();

        for (from, to) in &self.rename {
            out.rename_column(from, to)?;
        }

        for name in &self.drop_columns {
            out.drop_column(name)?;
        }

        for filter in &self.filters {
            let before = out.n_rows();
            out = out.filter_levels(&filter.column, &filter.keep)?;
            debug!(
                "Filter on '{}' kept {} of {} rows",
                filter.column,
                out.n_rows(),
                before
            );
        }

        for (column, reference) in &self.reference_levels {
            out.relevel(column, reference)?;
        }

        if !self.require_complete.is_empty() {
            let rows = out.complete_cases(&self.require_complete)?;
            let dropped = out.n_rows() - rows.len();
            if dropped > 0 {
                debug!("Dropped {} incomplete rows", dropped);
            }
            out = out.take_rows(&rows)?;
        }

        Ok(out)
    }
}
