//! End-to-end analysis runs
//!
//! An analysis cleans its input, fits the configured OLS model, and
//! writes a coefficient table plus an optional contrast table. Analyses
//! share nothing, so a failure aborts only the one that raised it.

use std::path::PathBuf;

use log::{debug, info};

use crate::config::{AnalysisConfig, ReportConfig};
use crate::contrast::{ContrastEvaluator, ContrastResult};
use crate::error::{ReportError, Result};
use crate::extract::ResultRow;
use crate::format::format_rows;
use crate::table::{TableArtifact, TableLayout, render_table, render_table_to_path};
use rtab_core::data::DataFrame;
use rtab_models::{FittedModel, LinearRegression};

/// Extract, format and render a fitted model's coefficient table
pub fn report_model(model: &dyn FittedModel, config: &ReportConfig) -> Result<TableArtifact> {
    config.validate()?;
    let rows = config.extractor().extract(model)?;
    let formatted = format_rows(&rows, &config.format)?;
    render_table(&formatted, &config.table_layout())
}

/// Tables written by one analysis
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub name: String,
    pub rows: Vec<ResultRow>,
    pub table_path: PathBuf,
    pub contrasts: Vec<ContrastResult>,
    pub contrast_table_path: Option<PathBuf>,
}

/// A configured analysis
#[derive(Debug, Clone)]
pub struct Analysis {
    config: AnalysisConfig,
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every step on `data`, writing the configured tables
    pub fn run(&self, data: &DataFrame) -> Result<AnalysisOutput> {
        let config = &self.config;
        info!("Running analysis '{}': {}", config.name, config.formula);

        let cleaned = config.cleaning.apply(data)?;
        debug!(
            "Cleaned data for '{}': {} of {} rows",
            config.name,
            cleaned.n_rows(),
            data.n_rows()
        );

        let fit = LinearRegression::new(&config.formula)?
            .data(&cleaned)
            .fit()?;

        let report = &config.report;
        let rows = report.extractor().extract(&fit)?;
        let formatted = format_rows(&rows, &report.format)?;
        render_table_to_path(&formatted, &report.table_layout(), &config.output)?;
        info!(
            "Wrote {} coefficient rows for '{}' to {}",
            rows.len(),
            config.name,
            config.output.display()
        );

        let mut output = AnalysisOutput {
            name: config.name.clone(),
            rows,
            table_path: config.output.clone(),
            contrasts: Vec::new(),
            contrast_table_path: None,
        };

        if let Some(contrast_config) = &config.contrasts {
            let levels = fit.levels(&contrast_config.factor).ok_or_else(|| {
                ReportError::InvalidConfig(format!(
                    "contrast factor '{}' is not a factor term of '{}'",
                    contrast_config.factor, config.formula
                ))
            })?;
            let set = contrast_config.contrast_set(levels);
            let results = ContrastEvaluator::new()
                .confidence_level(report.confidence_level)
                .evaluate(&fit, &set)?;

            let contrast_rows: Vec<ResultRow> = results
                .iter()
                .map(|r| r.to_labelled_row(&report.separators))
                .collect();
            let formatted = format_rows(&contrast_rows, &report.format)?;
            let layout = TableLayout {
                confidence_level: report.confidence_level,
                ..contrast_config.layout.clone()
            };
            render_table_to_path(&formatted, &layout, &contrast_config.output)?;
            info!(
                "Wrote {} contrasts for '{}' to {}",
                results.len(),
                config.name,
                contrast_config.output.display()
            );

            output.contrasts = results;
            output.contrast_table_path = Some(contrast_config.output.clone());
        }

        Ok(output)
    }
}
