//! Term types for formula specification

use std::fmt;

/// A term on the right-hand side of a formula
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// Main effect of a column; factors expand to treatment-coded dummies
    Variable(String),
    /// `(1 | group)`: one random intercept per level of `group`
    RandomIntercept { group: String },
}

impl Term {
    /// Create a new variable term
    pub fn variable(name: &str) -> Self {
        Term::Variable(name.to_string())
    }

    /// Create a random intercept term
    pub fn random_intercept(group: &str) -> Self {
        Term::RandomIntercept {
            group: group.to_string(),
        }
    }

    /// Whether the term is a random effect
    pub fn is_random(&self) -> bool {
        matches!(self, Term::RandomIntercept { .. })
    }

    /// The column this term reads
    pub fn variable_name(&self) -> &str {
        match self {
            Term::Variable(name) => name,
            Term::RandomIntercept { group } => group,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(name) => write!(f, "{}", name),
            Term::RandomIntercept { group } => write!(f, "(1 | {})", group),
        }
    }
}
