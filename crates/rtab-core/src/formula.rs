//! R-style formula parsing and design matrix construction
//!
//! This module provides formula parsing similar to R's formula syntax,
//! used for specifying the regression models whose results get reported.

pub use crate::formula::error::{FormulaError, FormulaResult};

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

mod design;
pub mod error;
mod parser;
mod term;


pub use design::{DesignMatrix, GroupIndex, INTERCEPT};
pub use parser::FormulaParser;
pub use term::Term;

pub type Result<T> = std::result::Result<T, FormulaError>;

/// A parsed formula specifying a statistical model
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    /// Response variable (left-hand side)
    pub response: Option<String>,

    /// Terms on the right-hand side, in written order
    pub terms: Vec<Term>,

    /// Whether to include an intercept
    pub has_intercept: bool,

    /// Original formula string
    pub original: String,
}

impl Formula {
    /// Parse a formula from a string
    pub fn parse(formula: &str) -> Result<Self> {
        FormulaParser::parse(formula)
    }

    /// Fixed-effect variable names in written order
    pub fn fixed_terms(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .filter(|t| !t.is_random())
            .map(Term::variable_name)
    }

    /// Grouping factor of the random intercept, if any
    pub fn random_group(&self) -> Option<&str> {
        self.terms.iter().find_map(|t| match t {
            Term::RandomIntercept { group } => Some(group.as_str()),
            Term::Variable(_) => None,
        })
    }

    /// Whether the formula has a random-effects part
    pub fn is_mixed(&self) -> bool {
        self.random_group().is_some()
    }

    /// Get all variable names mentioned in the formula
    pub fn variables(&self) -> HashSet<&str> {
        let mut vars: HashSet<&str> = self.terms.iter().map(Term::variable_name).collect();
        if let Some(resp) = &self.response {
            vars.insert(resp.as_str());
        }
        vars
    }

    /// Check if formula has a response variable
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(resp) = &self.response {
            write!(f, "{} ", resp)?;
        }
        write!(f, "~ ")?;

        let mut parts: Vec<String> = Vec::new();
        if !self.has_intercept {
            parts.push("0".to_string());
        } else if self.terms.is_empty() {
            parts.push("1".to_string());
        }
        parts.extend(self.terms.iter().map(Term::to_string));

        write!(f, "{}", parts.join(" + "))
    }
}
