//! Coefficient definition

use serde::{Deserialize, Serialize};

/// One row of a fitted model's fixed-effects table
///
/// Every statistic is optional: some fitting libraries report estimates
/// and standard errors but no df or p-values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Coefficient name
    pub name: String,
    /// Coefficient estimate
    pub estimate: f64,
    /// Standard error
    pub std_error: Option<f64>,
    /// Degrees of freedom of the coefficient test
    pub df: Option<f64>,
    /// t-statistic
    pub t_stat: Option<f64>,
    /// p-value
    pub p_value: Option<f64>,
}

impl Coefficient {
    /// Create a new coefficient
    pub fn new(name: impl Into<String>, estimate: f64) -> Self {
        Self {
            name: name.into(),
            estimate,
            std_error: None,
            df: None,
            t_stat: None,
            p_value: None,
        }
    }

    /// Set standard error
    pub fn with_std_error(mut self, se: f64) -> Self {
        self.std_error = Some(se);
        self
    }

    /// Set degrees of freedom
    pub fn with_df(mut self, df: f64) -> Self {
        self.df = Some(df);
        self
    }

    /// Set t-statistic
    pub fn with_t_stat(mut self, t: f64) -> Self {
        self.t_stat = Some(t);
        self
    }

    /// Set p-value
    pub fn with_p_value(mut self, p: f64) -> Self {
        self.p_value = Some(p);
        self
    }

    /// Is this the intercept?
    pub fn is_intercept(&self) -> bool {
        self.name == rtab_core::formula::INTERCEPT
    }
}
