//! Design matrix construction
//!
//! Factors are treatment coded: one 0/1 column per non-reference level,
//! named `{factor}{level}` the way R names `lm` coefficients. Rows with a
//! missing value in any column the formula uses are dropped before
//! coding, and levels left without rows are dropped with them. The
//! reference is the first level that still has rows.

use indexmap::IndexMap;
use log::debug;
use ndarray::Array2;

use crate::data::{DataFrame, FloatArray, Matrix, Series};
use crate::formula::{Formula, FormulaError, Result};

/// Name given to the intercept column
pub const INTERCEPT: &str = "(Intercept)";

/// Level membership of each kept row for a random-intercept grouping factor
#[derive(Debug, Clone, PartialEq)]
pub struct GroupIndex {
    /// Grouping column name
    pub name: String,
    /// Position into `levels` for each kept row
    pub codes: Vec<usize>,
    /// Levels that occur in the kept rows
    pub levels: Vec<String>,
}

impl GroupIndex {
    /// Number of groups
    pub fn n_groups(&self) -> usize {
        self.levels.len()
    }
}

/// Model matrices built from a formula and a DataFrame
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    /// Fixed-effects design matrix
    pub x: Matrix,
    /// Response vector, when the formula has one
    pub y: Option<FloatArray>,
    /// Column names of `x`, in coefficient order
    pub column_names: Vec<String>,
    /// Random-intercept grouping, when the formula has one
    pub groups: Option<GroupIndex>,
    /// Coded levels of each factor term, reference first
    pub factor_levels: IndexMap<String, Vec<String>>,
    /// Source rows kept after listwise deletion
    pub rows: Vec<usize>,
    /// Number of source rows dropped for missing values
    pub dropped_rows: usize,
}

impl DesignMatrix {
    /// Number of observations
    pub fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    /// Number of fixed-effect columns
    pub fn n_columns(&self) -> usize {
        self.x.ncols()
    }
}

impl Formula {
    /// Create design matrix, response vector and grouping from a DataFrame
    pub fn design_matrix(&self, df: &DataFrame) -> Result<DesignMatrix> {
        let available = df.column_names();

        let mut used: Vec<&str> = Vec::new();
        if let Some(resp) = &self.response {
            used.push(resp);
        }
        used.extend(self.terms.iter().map(|t| t.variable_name()));
        for name in &used {
            if df.column(name).is_none() {
                return Err(FormulaError::variable_not_found(name, &available));
            }
        }

        let rows = df.complete_cases(&used)?;
        let dropped_rows = df.n_rows() - rows.len();
        if rows.is_empty() {
            return Err(FormulaError::NoCompleteRows {
                formula: self.to_string(),
            });
        }
        if dropped_rows > 0 {
            debug!(
                "Dropped {} of {} rows with missing values for '{}'",
                dropped_rows,
                df.n_rows(),
                self
            );
        }

        let n = rows.len();

        let y = match &self.response {
            Some(resp) => Some(numeric_column(df, resp, &rows)?),
            None => None,
        };

        let mut columns: Vec<(String, Vec<f64>)> = Vec::new();
        if self.has_intercept {
            columns.push((INTERCEPT.to_string(), vec![1.0; n]));
        }

        let mut factor_levels = IndexMap::new();
        let mut full_rank_factor_pending = !self.has_intercept;
        for name in self.fixed_terms() {
            match df.column(name) {
                Some(Series::Float(_)) => {
                    columns.push((name.to_string(), numeric_column(df, name, &rows)?.to_vec()));
                }
                Some(series) => {
                    let levels = present_levels(series, &rows);
                    let unused = series.levels().map_or(0, |all| all.len()) - levels.len();
                    if unused > 0 {
                        debug!("Dropped {} level(s) of '{}' with no complete rows", unused, name);
                    }

                    // Without an intercept the first factor keeps every level
                    let skip = if full_rank_factor_pending { 0 } else { 1 };
                    full_rank_factor_pending = false;

                    for level in levels.iter().skip(skip) {
                        let dummy: Vec<f64> = rows
                            .iter()
                            .map(|&i| if series.label(i) == Some(level.as_str()) { 1.0 } else { 0.0 })
                            .collect();
                        columns.push((format!("{}{}", name, level), dummy));
                    }
                    factor_levels.insert(name.to_string(), levels);
                }
                None => return Err(FormulaError::variable_not_found(name, &available)),
            }
        }

        let p = columns.len();
        let x = Array2::from_shape_fn((n, p), |(i, j)| columns[j].1[i]);
        let column_names = columns.into_iter().map(|(name, _)| name).collect();

        let groups = match self.random_group() {
            Some(group) => Some(group_index(df, group, &rows)?),
            None => None,
        };

        Ok(DesignMatrix {
            x,
            y,
            column_names,
            groups,
            factor_levels,
            rows,
            dropped_rows,
        })
    }
}

fn numeric_column(df: &DataFrame, name: &str, rows: &[usize]) -> Result<FloatArray> {
    let series = df.require(name)?;
    let values = series.as_float().ok_or_else(|| FormulaError::TypeMismatch {
        variable: name.to_string(),
        expected_type: "float64",
        actual_type: series.dtype(),
    })?;

    Ok(rows.iter().map(|&i| values[i]).collect())
}

/// Levels of a factor that occur in `rows`, in level order
fn present_levels(series: &Series, rows: &[usize]) -> Vec<String> {
    series
        .levels()
        .unwrap_or_default()
        .iter()
        .filter(|level| rows.iter().any(|&i| series.label(i) == Some(level.as_str())))
        .cloned()
        .collect()
}

fn group_index(df: &DataFrame, name: &str, rows: &[usize]) -> Result<GroupIndex> {
    let series = df.require(name)?;
    if series.levels().is_none() {
        return Err(FormulaError::TypeMismatch {
            variable: name.to_string(),
            expected_type: "factor",
            actual_type: series.dtype(),
        });
    }

    let levels = present_levels(series, rows);

    let codes = rows
        .iter()
        .map(|&i| {
            series
                .label(i)
                .and_then(|label| levels.iter().position(|l| l == label))
                .ok_or_else(|| FormulaError::NoCompleteRows {
                    formula: name.to_string(),
                })
        })
        .collect::<Result<Vec<usize>>>()?;

    Ok(GroupIndex {
        name: name.to_string(),
        codes,
        levels,
    })
}
