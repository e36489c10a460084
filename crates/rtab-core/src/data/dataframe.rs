//! DataFrame implementation for tabular data
//!
//! A DataFrame is an ordered set of equally long named columns. Column
//! order is insertion order.

use super::*;

use indexmap::IndexMap;

/// Main DataFrame structure
#[derive(Clone, Debug, Default)]
pub struct DataFrame {
    pub(crate) columns: IndexMap<String, Series>,
    pub(crate) nrows: usize,
}

impl DataFrame {
    /// Create an empty DataFrame
    pub fn new() -> Self {
        Self::default()
    }

    /// Create DataFrame from columns
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Series)>,
        S: Into<String>,
    {
        let mut builder = DataFrameBuilder::new();

        for (name, series) in columns.into_iter() {
            builder = builder.with_column(name, series)?;
        }

        builder.build()
    }

    /// Get the shape of the DataFrame (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.columns.len())
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.nrows
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.get(name)
    }

    /// Get a column by name, failing if absent
    pub fn require(&self, name: &str) -> Result<&Series> {
        self.column(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// Add a column
    pub fn with_column(mut self, name: impl Into<String>, series: Series) -> Result<Self> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(DataError::DuplicateColumn(name));
        }
        if !self.columns.is_empty() && series.len() != self.nrows {
            return Err(DataError::DimensionMismatch {
                expected: format!("{} rows", self.nrows),
                actual: format!("{} rows", series.len()),
            });
        }

        self.nrows = series.len();
        self.columns.insert(name, series);
        Ok(self)
    }

    /// Rename a column in place, keeping its position
    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            return self.require(from).map(|_| ());
        }
        if self.columns.contains_key(to) {
            return Err(DataError::DuplicateColumn(to.to_string()));
        }
        let (index, _, series) = self
            .columns
            .shift_remove_full(from)
            .ok_or_else(|| DataError::ColumnNotFound(from.to_string()))?;

        self.columns.shift_insert(index, to.to_string(), series);
        Ok(())
    }

    /// Remove a column, returning it
    pub fn drop_column(&mut self, name: &str) -> Result<Series> {
        self.columns
            .shift_remove(name)
            .ok_or_else(|| DataError::ColumnNotFound(name.to_string()))
    }

    /// Replace a factor column with a releveled copy
    pub fn relevel(&mut self, column: &str, reference: &str) -> Result<()> {
        let releveled = self.require(column)?.relevel(reference).map_err(|e| match e {
            DataError::UnknownLevel { level, .. } => DataError::UnknownLevel {
                column: column.to_string(),
                level,
            },
            DataError::TypeMismatch {
                expected, actual, ..
            } => DataError::TypeMismatch {
                column: column.to_string(),
                expected,
                actual,
            },
            other => other,
        })?;

        if let Some(slot) = self.columns.get_mut(column) {
            *slot = releveled;
        }
        Ok(())
    }

    /// Select rows by position across all columns
    pub fn take_rows(&self, rows: &[usize]) -> Result<Self> {
        if let Some(&bad) = rows.iter().find(|&&i| i >= self.nrows) {
            return Err(DataError::InvalidParameter(format!(
                "row {} out of bounds for {} rows",
                bad, self.nrows
            )));
        }

        Ok(Self {
            columns: self
                .columns
                .iter()
                .map(|(name, series)| (name.clone(), series.take(rows)))
                .collect(),
            nrows: rows.len(),
        })
    }

    /// Keep only rows whose factor `column` takes one of `keep`
    ///
    /// Levels are left untouched so treatment coding stays comparable
    /// across filtered subsets.
    pub fn filter_levels<T: AsRef<str>>(&self, column: &str, keep: &[T]) -> Result<Self> {
        let series = self.require(column)?;
        let levels = series.levels().ok_or_else(|| DataError::TypeMismatch {
            column: column.to_string(),
            expected: "factor",
            actual: series.dtype(),
        })?;

        for level in keep {
            if !levels.iter().any(|l| l == level.as_ref()) {
                return Err(DataError::UnknownLevel {
                    column: column.to_string(),
                    level: level.as_ref().to_string(),
                });
            }
        }

        let rows: Vec<usize> = (0..self.nrows)
            .filter(|&i| {
                series
                    .label(i)
                    .is_some_and(|label| keep.iter().any(|k| k.as_ref() == label))
            })
            .collect();

        self.take_rows(&rows)
    }

    /// Row positions with no missing cell in any of `columns`
    pub fn complete_cases<T: AsRef<str>>(&self, columns: &[T]) -> Result<Vec<usize>> {
        let selected = columns
            .iter()
            .map(|c| self.require(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok((0..self.nrows)
            .filter(|&i| selected.iter().all(|s| !s.is_missing(i)))
            .collect())
    }
}
