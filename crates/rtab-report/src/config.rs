//! Report and analysis configuration
//!
//! Both structs deserialise from TOML. Every field has a default, so a
//! configuration file only names what differs.
//!
//! ```toml
//! name = "wtc"
//! formula = "willingness ~ condition + age"
//! output = "tables/wtc.tex"
//!
//! [cleaning]
//! require_complete = ["willingness"]
//!
//! [cleaning.reference_levels]
//! condition = "Control"
//!
//! [report]
//! term_prefix = "condition"
//! include_intercept = false
//!
//! [report.format]
//! significance_threshold = 0.006
//!
//! [contrasts]
//! factor = "condition"
//! pairwise = true
//! output = "tables/wtc_pairwise.tex"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::contrast::{ContrastSet, ContrastSpecification};
use crate::error::{ReportError, Result};
use crate::extract::ResultExtractor;
use crate::format::FormatOptions;
use crate::table::TableLayout;
use rtab_core::data::CleaningConfig;

/// How rows are extracted, formatted and laid out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub confidence_level: f64,
    /// Factor name stripped from term labels
    pub term_prefix: Option<String>,
    /// Characters shown as spaces in term labels
    pub separators: Vec<char>,
    pub include_intercept: bool,
    pub format: FormatOptions,
    pub layout: TableLayout,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            term_prefix: None,
            separators: vec!['_', '.'],
            include_intercept: true,
            format: FormatOptions::default(),
            layout: TableLayout::coefficients(),
        }
    }
}

impl ReportConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let level = self.confidence_level;
        if !level.is_finite() || level <= 0.0 || level >= 1.0 {
            return Err(ReportError::InvalidConfig(format!(
                "confidence_level must lie in (0, 1), got {}",
                level
            )));
        }
        self.format.validate()?;
        self.layout.validate()
    }

    /// Extractor configured from these settings
    pub fn extractor(&self) -> ResultExtractor {
        let extractor = ResultExtractor::new()
            .confidence_level(self.confidence_level)
            .separators(&self.separators)
            .include_intercept(self.include_intercept);

        match &self.term_prefix {
            Some(prefix) => extractor.term_prefix(prefix.clone()),
            None => extractor,
        }
    }

    /// Layout with the interval header matching the extraction level
    pub fn table_layout(&self) -> TableLayout {
        TableLayout {
            confidence_level: self.confidence_level,
            ..self.layout.clone()
        }
    }
}

/// Contrasts tested after the main fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContrastConfig {
    /// Factor the contrasts range over
    pub factor: String,
    /// Add every pairwise difference
    #[serde(default)]
    pub pairwise: bool,
    /// Named weight vectors, tested after the pairwise ones
    #[serde(default)]
    pub custom: IndexMap<String, IndexMap<String, f64>>,
    /// Table for the contrast results
    pub output: PathBuf,
    #[serde(default = "ContrastConfig::default_layout")]
    pub layout: TableLayout,
}

impl ContrastConfig {
    fn default_layout() -> TableLayout {
        TableLayout::comparisons()
    }

    /// Contrast set over `levels`, given in model order
    pub fn contrast_set(&self, levels: &[String]) -> ContrastSet {
        let base = if self.pairwise {
            ContrastSet::pairwise(self.factor.clone(), levels.iter().cloned())
        } else {
            ContrastSet::new(self.factor.clone(), levels.iter().cloned())
        };

        self.custom.iter().fold(base, |set, (name, weights)| {
            set.with_contrast(ContrastSpecification {
                name: name.clone(),
                weights: weights.clone(),
            })
        })
    }
}

/// One analysis: cleaning, model, and output tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub name: String,
    /// Fixed-effects formula fitted by OLS
    pub formula: String,
    /// Coefficient table path
    pub output: PathBuf,
    #[serde(default)]
    pub cleaning: CleaningConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub contrasts: Option<ContrastConfig>,
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading analysis configuration from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ReportError::InvalidConfig("analysis name is empty".to_string()));
        }
        if self.formula.trim().is_empty() {
            return Err(ReportError::InvalidConfig(format!(
                "analysis '{}' has no formula",
                self.name
            )));
        }
        self.report.validate()?;

        if let Some(contrasts) = &self.contrasts {
            if contrasts.output == self.output {
                return Err(ReportError::InvalidConfig(format!(
                    "analysis '{}' writes both tables to {}",
                    self.name,
                    self.output.display()
                )));
            }
            if !contrasts.pairwise && contrasts.custom.is_empty() {
                return Err(ReportError::InvalidConfig(format!(
                    "analysis '{}' requests contrasts over '{}' but defines none",
                    self.name, contrasts.factor
                )));
            }
            contrasts.layout.validate()?;
        }

        Ok(())
    }
}
