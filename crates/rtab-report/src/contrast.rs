//! Linear contrasts over the levels of a treatment-coded factor
//!
//! Level weights map onto the model's `{factor}{level}` coefficients.
//! The reference level has no coefficient of its own; because weights sum
//! to zero the intercept cancels and the reference simply drops out.
//! Each contrast is tested as a general linear hypothesis `L·β = 0`.

use std::fmt;

use indexmap::IndexMap;
use log::debug;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::error::{ReportError, Result};
use crate::extract::{ResultRow, term_label};
use rtab_models::base::check_confidence_level;
use rtab_models::{Capability, DegreesOfFreedom, FittedModel, ModelError, StatisticKind};

/// Largest absolute weight sum accepted as zero
pub const BALANCE_TOLERANCE: f64 = 1e-9;

/// A named weight vector over factor levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastSpecification {
    pub name: String,
    /// Level to weight, in declared order
    pub weights: IndexMap<String, f64>,
}

impl ContrastSpecification {
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        weights: impl IntoIterator<Item = (S, f64)>,
    ) -> Self {
        Self {
            name: name.into(),
            weights: weights.into_iter().map(|(l, w)| (l.into(), w)).collect(),
        }
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }
}

/// Contrasts over one factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastSet {
    pub factor: String,
    /// Levels in model order; the first is the reference
    pub levels: Vec<String>,
    pub contrasts: Vec<ContrastSpecification>,
}

impl ContrastSet {
    pub fn new<S: Into<String>>(factor: impl Into<String>, levels: impl IntoIterator<Item = S>) -> Self {
        Self {
            factor: factor.into(),
            levels: levels.into_iter().map(Into::into).collect(),
            contrasts: Vec::new(),
        }
    }

    pub fn with_contrast(mut self, contrast: ContrastSpecification) -> Self {
        self.contrasts.push(contrast);
        self
    }

    /// All pairwise differences, labelled `later - earlier`
    pub fn pairwise<S: Into<String>>(factor: impl Into<String>, levels: impl IntoIterator<Item = S>) -> Self {
        let mut set = Self::new(factor, levels);
        let levels = set.levels.clone();

        for (i, first) in levels.iter().enumerate() {
            for second in &levels[i + 1..] {
                set.contrasts.push(ContrastSpecification::new(
                    format!("{} - {}", second, first),
                    [(second.clone(), 1.0), (first.clone(), -1.0)],
                ));
            }
        }
        set
    }

    pub fn reference(&self) -> Option<&str> {
        self.levels.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.contrasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contrasts.is_empty()
    }
}

/// Test result for one contrast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContrastResult {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub statistic: f64,
    pub statistic_kind: StatisticKind,
    /// Set for t tests
    pub df: Option<f64>,
    pub p_value: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

impl ContrastResult {
    /// Present the contrast as a table row labelled by its name
    pub fn to_result_row(&self) -> ResultRow {
        ResultRow {
            term: self.name.clone(),
            term_label: self.name.clone(),
            estimate: self.estimate,
            std_error: self.std_error,
            df: self.df,
            statistic: self.statistic,
            statistic_kind: self.statistic_kind,
            p_value: self.p_value,
            ci_low: self.ci_low,
            ci_high: self.ci_high,
        }
    }

    /// Like `to_result_row`, with `separators` shown as spaces in the label
    ///
    /// Level names then read the same as in the coefficient table.
    pub fn to_labelled_row(&self, separators: &[char]) -> ResultRow {
        ResultRow {
            term_label: term_label(&self.name, None, separators),
            ..self.to_result_row()
        }
    }
}

fn numerical(err: impl fmt::Display) -> ReportError {
    ReportError::Model(ModelError::NumericalError {
        message: err.to_string(),
        operation: "contrast reference distribution".to_string(),
    })
}

/// Reference distribution of a contrast test
enum Reference {
    T(StudentsT, f64),
    Z(Normal),
}

impl Reference {
    fn for_model(model: &dyn FittedModel) -> Result<Self> {
        match model.degrees_of_freedom() {
            Ok(DegreesOfFreedom::Scalar(df)) => {
                Ok(Reference::T(StudentsT::new(0.0, 1.0, df).map_err(numerical)?, df))
            }
            // No shared df: asymptotic normal reference
            Ok(DegreesOfFreedom::PerTerm(_))
            | Err(ModelError::MissingCapability(Capability::DegreesOfFreedom)) => {
                Ok(Reference::Z(Normal::new(0.0, 1.0).map_err(numerical)?))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn kind(&self) -> StatisticKind {
        match self {
            Reference::T(..) => StatisticKind::T,
            Reference::Z(_) => StatisticKind::Z,
        }
    }

    fn df(&self) -> Option<f64> {
        match self {
            Reference::T(_, df) => Some(*df),
            Reference::Z(_) => None,
        }
    }

    fn two_sided_p(&self, statistic: f64) -> f64 {
        let tail = match self {
            Reference::T(dist, _) => dist.sf(statistic.abs()),
            Reference::Z(dist) => dist.sf(statistic.abs()),
        };
        (2.0 * tail).clamp(0.0, 1.0)
    }

    fn critical(&self, level: f64) -> f64 {
        let q = 1.0 - (1.0 - level) / 2.0;
        match self {
            Reference::T(dist, _) => dist.inverse_cdf(q),
            Reference::Z(dist) => dist.inverse_cdf(q),
        }
    }
}

/// Validates and tests contrast sets against fitted models
#[derive(Debug, Clone, PartialEq)]
pub struct ContrastEvaluator {
    confidence_level: f64,
}

impl Default for ContrastEvaluator {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

impl ContrastEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Check every contrast before anything is tested
    pub fn validate(&self, set: &ContrastSet) -> Result<()> {
        if set.levels.is_empty() {
            return Err(ReportError::InvalidConfig(format!(
                "contrast set for '{}' declares no levels",
                set.factor
            )));
        }
        for (i, level) in set.levels.iter().enumerate() {
            if set.levels[..i].contains(level) {
                return Err(ReportError::InvalidConfig(format!(
                    "level '{}' of '{}' is declared twice",
                    level, set.factor
                )));
            }
        }

        for contrast in &set.contrasts {
            let sum = contrast.sum();
            if !sum.is_finite() || sum.abs() > BALANCE_TOLERANCE {
                return Err(ReportError::UnbalancedContrast {
                    name: contrast.name.clone(),
                    sum,
                });
            }

            if let Some(level) = contrast.weights.keys().find(|l| !set.levels.contains(*l)) {
                return Err(ReportError::UnknownLevel {
                    contrast: contrast.name.clone(),
                    factor: set.factor.clone(),
                    level: level.clone(),
                });
            }

            if contrast.weights.values().all(|&w| w == 0.0) {
                return Err(ReportError::InvalidConfig(format!(
                    "contrast '{}' has no non-zero weight",
                    contrast.name
                )));
            }
        }

        Ok(())
    }

    /// Test each contrast, in declared order
    pub fn evaluate(&self, model: &dyn FittedModel, set: &ContrastSet) -> Result<Vec<ContrastResult>> {
        self.validate(set)?;
        check_confidence_level(self.confidence_level)?;

        let terms = model.term_names();
        let n = terms.len();
        let beta = Array1::from(model.estimates());
        if beta.len() != n {
            return Err(ReportError::DimensionMismatch {
                what: "estimates".to_string(),
                expected: n,
                actual: beta.len(),
            });
        }
        let vcov = model.vcov()?;
        if vcov.nrows() != n || vcov.ncols() != n {
            return Err(ReportError::DimensionMismatch {
                what: "coefficient covariance".to_string(),
                expected: n,
                actual: vcov.nrows().max(vcov.ncols()),
            });
        }

        let reference = Reference::for_model(model)?;
        let critical = reference.critical(self.confidence_level);

        let results = set
            .contrasts
            .iter()
            .map(|contrast| {
                let l = self.hypothesis_row(contrast, set, &terms)?;
                let estimate = l.dot(&beta);
                let std_error = l.dot(&vcov.dot(&l)).max(0.0).sqrt();
                let statistic = estimate / std_error;

                Ok(ContrastResult {
                    name: contrast.name.clone(),
                    estimate,
                    std_error,
                    statistic,
                    statistic_kind: reference.kind(),
                    df: reference.df(),
                    p_value: reference.two_sided_p(statistic),
                    ci_low: estimate - critical * std_error,
                    ci_high: estimate + critical * std_error,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Evaluated {} contrasts over '{}' ({} reference)",
            results.len(),
            set.factor,
            reference.kind()
        );

        Ok(results)
    }

    /// Coefficient weights `L` for one contrast
    fn hypothesis_row(
        &self,
        contrast: &ContrastSpecification,
        set: &ContrastSet,
        terms: &[String],
    ) -> Result<Array1<f64>> {
        let mut l = Array1::zeros(terms.len());

        for (level, &weight) in &contrast.weights {
            let term = format!("{}{}", set.factor, level);
            match terms.iter().position(|t| *t == term) {
                Some(index) => l[index] += weight,
                None if set.reference() == Some(level.as_str()) => {}
                None => {
                    return Err(ReportError::UnknownTerm {
                        contrast: contrast.name.clone(),
                        term,
                    });
                }
            }
        }

        Ok(l)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use rtab_core::data::{DataFrameBuilder, Series};
    use rtab_models::{Coefficient, MixedModelFit, VarianceComponent, lm};

    /// Three conditions with means 2, 5 and 11; sigma^2 = 1 on 6 df
    fn condition_fit() -> rtab_models::LinearRegressionResult {
        let df = DataFrameBuilder::new()
            .with_column(
                "condition",
                Series::factor(&["A", "A", "A", "B", "B", "B", "C", "C", "C"]),
            )
            .unwrap()
            .with_column(
                "y",
                Series::float(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 10.0, 11.0, 12.0]),
            )
            .unwrap()
            .build()
            .unwrap();
        lm("y ~ condition", &df).unwrap()
    }

    #[test]
    fn test_pairwise_labels() {
        let set = ContrastSet::pairwise("condition", ["A", "B", "C"]);
        let names: Vec<&str> = set.contrasts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B - A", "C - A", "C - B"]);
        assert_eq!(set.contrasts[2].weights["C"], 1.0);
        assert_eq!(set.contrasts[2].weights["B"], -1.0);
        assert_eq!(set.reference(), Some("A"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_validate_unbalanced() {
        let set = ContrastSet::new("condition", ["A", "B", "C"])
            .with_contrast(ContrastSpecification::new("ok", [("A", -1.0), ("B", 1.0)]))
            .with_contrast(ContrastSpecification::new(
                "lopsided",
                [("A", 1.0), ("B", 1.0), ("C", -1.0)],
            ));

        match ContrastEvaluator::new().validate(&set).unwrap_err() {
            ReportError::UnbalancedContrast { name, sum } => {
                assert_eq!(name, "lopsided");
                assert_abs_diff_eq!(sum, 1.0);
            }
            other => panic!("expected UnbalancedContrast, got {:?}", other),
        }
    }

    #[test]
    fn test_unbalanced_contrast_never_evaluated() {
        /// Panics if the evaluator touches the model
        struct Untouchable;
        impl FittedModel for Untouchable {
            fn model_type(&self) -> rtab_models::ModelType {
                panic!("model queried")
            }
            fn term_names(&self) -> Vec<String> {
                panic!("model queried")
            }
            fn estimates(&self) -> Vec<f64> {
                panic!("model queried")
            }
        }

        let set = ContrastSet::new("condition", ["A", "B"])
            .with_contrast(ContrastSpecification::new("bad", [("A", 1.0), ("B", 0.5)]));
        assert!(matches!(
            ContrastEvaluator::new().evaluate(&Untouchable, &set),
            Err(ReportError::UnbalancedContrast { .. })
        ));
    }

    #[test]
    fn test_rational_weights_balance() {
        let third = 1.0 / 3.0;
        let set = ContrastSet::new("condition", ["A", "B", "C"]).with_contrast(
            ContrastSpecification::new("C vs rest", [("A", -third), ("B", -third), ("C", 2.0 * third)]),
        );
        assert!(ContrastEvaluator::new().validate(&set).is_ok());
    }

    #[test]
    fn test_validate_unknown_level() {
        let set = ContrastSet::new("condition", ["A", "B"])
            .with_contrast(ContrastSpecification::new("typo", [("A", 1.0), ("Bee", -1.0)]));
        assert!(matches!(
            ContrastEvaluator::new().validate(&set),
            Err(ReportError::UnknownLevel { level, .. }) if level == "Bee"
        ));
    }

    #[test]
    fn test_evaluate_pairwise_on_ols() {
        let fit = condition_fit();
        let set = ContrastSet::pairwise("condition", ["A", "B", "C"]);
        let results = ContrastEvaluator::new().evaluate(&fit, &set).unwrap();

        assert_eq!(results.len(), 3);

        // B - A uses only conditionB
        assert_abs_diff_eq!(results[0].estimate, 3.0, epsilon = 1e-10);
        assert_abs_diff_eq!(results[0].std_error, (2.0f64 / 3.0).sqrt(), epsilon = 1e-10);
        assert_eq!(results[0].statistic_kind, StatisticKind::T);
        assert_eq!(results[0].df, Some(6.0));

        // C - B = conditionC - conditionB, var = 2/3 + 2/3 - 2/3
        assert_abs_diff_eq!(results[2].estimate, 6.0, epsilon = 1e-10);
        assert_abs_diff_eq!(results[2].std_error, (2.0f64 / 3.0).sqrt(), epsilon = 1e-10);

        // Same p as the coefficient test for conditionB
        let p_b = fit.p_values().unwrap()[1];
        assert_abs_diff_eq!(results[0].p_value, p_b, epsilon = 1e-12);

        for r in &results {
            assert!(r.ci_low < r.estimate && r.estimate < r.ci_high);
            assert!(r.to_result_row().validate(0).is_ok());
        }
    }

    #[test]
    fn test_labelled_row_matches_coefficient_labels() {
        let result = ContrastResult {
            name: "Global.Warming - Climate_Change".to_string(),
            estimate: -1.75,
            std_error: 0.61,
            statistic: -2.86,
            statistic_kind: StatisticKind::T,
            df: Some(9.0),
            p_value: 0.019,
            ci_low: -3.13,
            ci_high: -0.37,
        };

        let row = result.to_labelled_row(&['_', '.']);
        assert_eq!(row.term, "Global.Warming - Climate_Change");
        assert_eq!(row.term_label, "Global Warming - Climate Change");
        assert_eq!(row.estimate, -1.75);

        assert_eq!(result.to_labelled_row(&[]).term_label, result.name);
        assert_eq!(result.to_result_row().term_label, result.name);
    }

    #[test]
    fn test_evaluate_custom_contrast() {
        let fit = condition_fit();
        let set = ContrastSet::new("condition", ["A", "B", "C"]).with_contrast(
            ContrastSpecification::new("C vs A and B", [("A", -0.5), ("B", -0.5), ("C", 1.0)]),
        );
        let results = ContrastEvaluator::new().evaluate(&fit, &set).unwrap();

        // 11 - (2 + 5) / 2
        assert_abs_diff_eq!(results[0].estimate, 7.5, epsilon = 1e-10);
        // sigma^2 * (1/3 + 0.25/3 + 0.25/3)
        assert_abs_diff_eq!(results[0].std_error, 0.5f64.sqrt(), epsilon = 1e-10);
        assert_eq!(results[0].name, "C vs A and B");
    }

    #[test]
    fn test_missing_coefficient() {
        let fit = condition_fit();
        let set = ContrastSet::new("treatment", ["A", "B"])
            .with_contrast(ContrastSpecification::new("B - A", [("B", 1.0), ("A", -1.0)]));
        assert!(matches!(
            ContrastEvaluator::new().evaluate(&fit, &set),
            Err(ReportError::UnknownTerm { term, .. }) if term == "treatmentB"
        ));
    }

    #[test]
    fn test_mixed_model_uses_normal_reference() {
        let fixed = vec![
            Coefficient::new("(Intercept)", 10.0).with_std_error(1.0).with_df(12.0),
            Coefficient::new("conditionB", 2.0).with_std_error(1.0).with_df(200.0),
        ];
        let model = MixedModelFit::new(
            "country",
            fixed,
            vec![VarianceComponent::intercept("country", 2.0)],
        )
        .unwrap()
        .with_vcov(ndarray::array![[1.0, -0.5], [-0.5, 1.0]])
        .unwrap();

        let set = ContrastSet::pairwise("condition", ["A", "B"]);
        let results = ContrastEvaluator::new().evaluate(&model, &set).unwrap();

        assert_eq!(results[0].statistic_kind, StatisticKind::Z);
        assert_eq!(results[0].df, None);
        assert_abs_diff_eq!(results[0].statistic, 2.0, epsilon = 1e-12);
        // 2 * (1 - pnorm(2))
        assert_abs_diff_eq!(results[0].p_value, 0.04550026389635842, epsilon = 1e-9);
        assert_abs_diff_eq!(
            results[0].ci_high - results[0].estimate,
            1.959963984540054,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_covariance_required() {
        let model = MixedModelFit::new(
            "country",
            vec![Coefficient::new("conditionB", 2.0).with_std_error(1.0)],
            Vec::new(),
        )
        .unwrap();
        let set = ContrastSet::pairwise("condition", ["A", "B"]);
        assert!(matches!(
            ContrastEvaluator::new().evaluate(&model, &set),
            Err(ReportError::MissingCapability(Capability::Covariance))
        ));
    }
}
