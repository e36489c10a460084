//! Series data structure for holding one column
//!
//! A Series is either numeric (`Float`, missing cells stored as NaN) or a
//! factor (`Factor`, level codes with `None` for missing cells). Factor
//! level order matters: the first level is the reference level for
//! treatment coding.

use super::*;

use std::collections::BTreeSet;

/// A typed, one-dimensional column of data
#[derive(Clone, Debug, PartialEq)]
pub enum Series {
    /// Floating point numbers, NaN marks a missing value
    Float(FloatArray),
    /// Factor codes into `levels`
    Factor {
        codes: Vec<Option<u32>>,
        levels: Vec<String>,
    },
}

impl Series {
    /// Create a new Float series
    pub fn float(data: impl Into<FloatArray>) -> Self {
        Series::Float(data.into())
    }

    /// Parse string cells as numbers, treating `"NA"` and empty cells as missing
    pub fn parse_float<T: AsRef<str>>(cells: &[T]) -> Result<Self> {
        let values = cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                let cell = cell.as_ref().trim();
                if cell.is_empty() || cell == NA {
                    Ok(f64::NAN)
                } else {
                    cell.parse::<f64>().map_err(|_| DataError::ParseFloat {
                        value: cell.to_string(),
                        row,
                    })
                }
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Series::Float(FloatArray::from(values)))
    }

    /// Create a factor with levels sorted alphabetically
    ///
    /// `"NA"` cells become missing values and never become a level.
    pub fn factor<T: AsRef<str>>(data: &[T]) -> Self {
        let levels: Vec<String> = data
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| *s != NA)
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let codes = data
            .iter()
            .map(|s| {
                levels
                    .iter()
                    .position(|level| level == s.as_ref())
                    .map(|i| i as u32)
            })
            .collect();

        Series::Factor { codes, levels }
    }

    /// Create a factor with an explicit level order
    pub fn factor_with_levels<T: AsRef<str>, L: AsRef<str>>(data: &[T], levels: &[L]) -> Result<Self> {
        let levels: Vec<String> = levels.iter().map(|l| l.as_ref().to_string()).collect();

        let codes = data
            .iter()
            .map(|s| {
                let s = s.as_ref();
                if s == NA {
                    return Ok(None);
                }
                levels
                    .iter()
                    .position(|level| level == s)
                    .map(|i| Some(i as u32))
                    .ok_or_else(|| DataError::UnknownLevel {
                        column: String::new(),
                        level: s.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Series::Factor { codes, levels })
    }

    /// Number of cells, missing ones included
    pub fn len(&self) -> usize {
        match self {
            Series::Float(arr) => arr.len(),
            Series::Factor { codes, .. } => codes.len(),
        }
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the data type name
    pub fn dtype(&self) -> &'static str {
        match self {
            Series::Float(_) => "float64",
            Series::Factor { .. } => "factor",
        }
    }

    /// Whether the cell at `row` is missing
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Series::Float(arr) => arr.get(row).is_none_or(|v| v.is_nan()),
            Series::Factor { codes, .. } => codes.get(row).is_none_or(|c| c.is_none()),
        }
    }

    /// Number of missing cells
    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }

    /// Factor levels, if this is a factor
    pub fn levels(&self) -> Option<&[String]> {
        match self {
            Series::Factor { levels, .. } => Some(levels),
            Series::Float(_) => None,
        }
    }

    /// Label of the factor cell at `row`
    pub fn label(&self, row: usize) -> Option<&str> {
        match self {
            Series::Factor { codes, levels } => codes
                .get(row)
                .copied()
                .flatten()
                .map(|code| levels[code as usize].as_str()),
            Series::Float(_) => None,
        }
    }

    /// Numeric view of a Float series
    pub fn as_float(&self) -> Option<&FloatArray> {
        match self {
            Series::Float(arr) => Some(arr),
            Series::Factor { .. } => None,
        }
    }

    /// Move `reference` to the front of the level order
    ///
    /// Codes are remapped so every cell keeps its label.
    pub fn relevel(&self, reference: &str) -> Result<Self> {
        let Series::Factor { codes, levels } = self else {
            return Err(DataError::TypeMismatch {
                column: String::new(),
                expected: "factor",
                actual: self.dtype(),
            });
        };

        let position = levels
            .iter()
            .position(|l| l == reference)
            .ok_or_else(|| DataError::UnknownLevel {
                column: String::new(),
                level: reference.to_string(),
            })? as u32;

        let mut new_levels = Vec::with_capacity(levels.len());
        new_levels.push(levels[position as usize].clone());
        new_levels.extend(
            levels
                .iter()
                .enumerate()
                .filter(|(i, _)| *i as u32 != position)
                .map(|(_, l)| l.clone()),
        );

        let new_codes = codes
            .iter()
            .map(|code| {
                code.map(|c| match c {
                    c if c == position => 0,
                    c if c < position => c + 1,
                    c => c,
                })
            })
            .collect();

        Ok(Series::Factor {
            codes: new_codes,
            levels: new_levels,
        })
    }

    /// Select rows by position
    pub fn take(&self, rows: &[usize]) -> Self {
        match self {
            Series::Float(arr) => Series::Float(rows.iter().map(|&i| arr[i]).collect()),
            Series::Factor { codes, levels } => Series::Factor {
                codes: rows.iter().map(|&i| codes[i]).collect(),
                levels: levels.clone(),
            },
        }
    }
}
