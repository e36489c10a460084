//! Coefficient extraction from fitted models
//!
//! `ResultExtractor` reads a `FittedModel` through its capability
//! accessors and produces one `ResultRow` per fixed-effect term, in the
//! model's own coefficient order. Interval queries are always restricted
//! to fixed effects, so variance components of mixed fits are neither
//! reported nor profiled.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use rtab_core::formula::INTERCEPT;
use rtab_models::base::check_confidence_level;
use rtab_models::{FittedModel, ParameterSet, StatisticKind};

/// Inference results for one model term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Raw coefficient name, e.g. `conditionClimate_Change`
    pub term: String,
    /// Display label, e.g. `Climate Change`
    pub term_label: String,
    pub estimate: f64,
    pub std_error: f64,
    /// Test degrees of freedom; `None` for normal-reference statistics
    pub df: Option<f64>,
    pub statistic: f64,
    pub statistic_kind: StatisticKind,
    /// Two-sided p-value
    pub p_value: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

impl ResultRow {
    /// Check range invariants; `row` is the position reported on failure
    pub fn validate(&self, row: usize) -> Result<()> {
        let invalid = |reason: String| ReportError::InvalidRow {
            row,
            term: self.term.clone(),
            reason,
        };

        if !self.p_value.is_finite() || !(0.0..=1.0).contains(&self.p_value) {
            return Err(invalid(format!("p-value {} outside [0, 1]", self.p_value)));
        }

        let fields = [
            ("estimate", self.estimate),
            ("standard error", self.std_error),
            ("statistic", self.statistic),
            ("lower confidence limit", self.ci_low),
            ("upper confidence limit", self.ci_high),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(invalid(format!("{} is {}", field, value)));
            }
        }

        if self.std_error < 0.0 {
            return Err(invalid(format!("negative standard error {}", self.std_error)));
        }

        if let Some(df) = self.df {
            if !df.is_finite() || df <= 0.0 {
                return Err(invalid(format!("degrees of freedom {}", df)));
            }
        }

        if self.ci_low > self.ci_high {
            return Err(invalid(format!(
                "confidence interval [{}, {}] is reversed",
                self.ci_low, self.ci_high
            )));
        }

        let slack = 1e-9 * self.estimate.abs().max(1.0);
        if self.estimate < self.ci_low - slack || self.estimate > self.ci_high + slack {
            return Err(invalid(format!(
                "estimate {} outside its interval [{}, {}]",
                self.estimate, self.ci_low, self.ci_high
            )));
        }

        Ok(())
    }
}

/// Derive a display label from a raw coefficient name
///
/// `prefix` is stripped once from the start, then every separator
/// character becomes a space.
pub fn term_label(raw: &str, prefix: Option<&str>, separators: &[char]) -> String {
    let stripped = prefix
        .filter(|p| !p.is_empty())
        .and_then(|p| raw.strip_prefix(p))
        .unwrap_or(raw);

    stripped
        .chars()
        .map(|c| if separators.contains(&c) { ' ' } else { c })
        .collect()
}

/// Builds `ResultRow`s from a fitted model
#[derive(Debug, Clone, PartialEq)]
pub struct ResultExtractor {
    confidence_level: f64,
    term_prefix: Option<String>,
    separators: Vec<char>,
    include_intercept: bool,
}

impl Default for ResultExtractor {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            term_prefix: None,
            separators: vec!['_', '.'],
            include_intercept: true,
        }
    }
}

impl ResultExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of the reported confidence intervals
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Factor name stripped from term labels
    pub fn term_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.term_prefix = Some(prefix.into());
        self
    }

    /// Characters replaced by spaces in term labels
    pub fn separators(mut self, separators: &[char]) -> Self {
        self.separators = separators.to_vec();
        self
    }

    /// Keep the `(Intercept)` row
    pub fn include_intercept(mut self, include: bool) -> Self {
        self.include_intercept = include;
        self
    }

    pub fn level(&self) -> f64 {
        self.confidence_level
    }

    /// Extract one row per retained fixed-effect term
    pub fn extract(&self, model: &dyn FittedModel) -> Result<Vec<ResultRow>> {
        check_confidence_level(self.confidence_level)?;

        let terms = model.term_names();
        let n = terms.len();

        let estimates = model.estimates();
        check_len("estimates", n, estimates.len())?;
        let std_errors = model.std_errors()?;
        check_len("standard errors", n, std_errors.len())?;
        let dof = model.degrees_of_freedom()?;
        if let Some(len) = dof.per_term_len() {
            check_len("degrees of freedom", n, len)?;
        }
        let statistics = model.statistics()?;
        check_len("test statistics", n, statistics.len())?;
        let p_values = model.p_values()?;
        check_len("p-values", n, p_values.len())?;
        let intervals = model.confint(self.confidence_level, ParameterSet::FixedEffects)?;
        check_len("confidence intervals", n, intervals.len())?;

        let statistic_kind = model.statistic_kind();
        let prefix = self.term_prefix.as_deref();

        let rows: Vec<ResultRow> = terms
            .into_iter()
            .enumerate()
            .filter(|(_, term)| self.include_intercept || term != INTERCEPT)
            .map(|(i, term)| ResultRow {
                term_label: term_label(&term, prefix, &self.separators),
                term,
                estimate: estimates[i],
                std_error: std_errors[i],
                df: dof.for_term(i),
                statistic: statistics[i],
                statistic_kind,
                p_value: p_values[i],
                ci_low: intervals[i].lower,
                ci_high: intervals[i].upper,
            })
            .collect();

        debug!(
            "Extracted {} of {} terms from {} at level {}",
            rows.len(),
            n,
            model.model_type(),
            self.confidence_level
        );

        Ok(rows)
    }
}

fn check_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ReportError::DimensionMismatch {
            what: what.to_string(),
            expected,
            actual,
        })
    }
}
