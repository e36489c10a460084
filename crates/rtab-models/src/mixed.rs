//! Random-intercept linear mixed models
//!
//! Fitting is left to an external library. `MixedModelFit` adapts its
//! output (a fixed-effects table with per-term degrees of freedom, the
//! variance components and optionally the fixed-effect covariance) to the
//! `FittedModel` interface.
//!
//! Interval queries restricted to `ParameterSet::FixedEffects` never
//! touch the variance components; intervals for those come only from
//! profile intervals supplied alongside the fit.

use log::debug;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::base::{
    Capability, Coefficient, ConfidenceInterval, DegreesOfFreedom, FittedModel, Matrix,
    ModelError, ModelType, ParameterSet, Result, StatisticKind, check_confidence_level,
};


/// Standard deviation of one random effect or of the residual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceComponent {
    /// Parameter name, e.g. `sd_(Intercept)|country` or `sigma`
    pub parameter: String,
    /// Standard deviation estimate
    pub std_dev: f64,
}

impl VarianceComponent {
    /// Random intercept standard deviation for `group`
    pub fn intercept(group: &str, std_dev: f64) -> Self {
        Self {
            parameter: format!("sd_(Intercept)|{}", group),
            std_dev,
        }
    }

    /// Residual standard deviation
    pub fn residual(std_dev: f64) -> Self {
        Self {
            parameter: "sigma".to_string(),
            std_dev,
        }
    }
}

/// Profile intervals for the variance components at one level
#[derive(Debug, Clone, PartialEq)]
struct ProfileIntervals {
    level: f64,
    intervals: Vec<ConfidenceInterval>,
}

/// Externally fitted linear mixed model with one random intercept
#[derive(Debug, Clone)]
pub struct MixedModelFit {
    group: String,
    fixed_effects: Vec<Coefficient>,
    variance_components: Vec<VarianceComponent>,
    vcov: Option<Matrix>,
    profile: Option<ProfileIntervals>,
    n_obs: Option<usize>,
    n_groups: Option<usize>,
}

impl MixedModelFit {
    /// Wrap a fixed-effects table and variance components
    pub fn new(
        group: impl Into<String>,
        fixed_effects: Vec<Coefficient>,
        variance_components: Vec<VarianceComponent>,
    ) -> Result<Self> {
        if fixed_effects.is_empty() {
            return Err(ModelError::InvalidConfig {
                message: "mixed model without fixed effects".to_string(),
            });
        }

        for (i, coefficient) in fixed_effects.iter().enumerate() {
            if fixed_effects[..i].iter().any(|c| c.name == coefficient.name) {
                return Err(ModelError::InvalidConfig {
                    message: format!("duplicate fixed effect '{}'", coefficient.name),
                });
            }
        }

        Ok(Self {
            group: group.into(),
            fixed_effects,
            variance_components,
            vcov: None,
            profile: None,
            n_obs: None,
            n_groups: None,
        })
    }

    /// Attach the covariance matrix of the fixed effects
    pub fn with_vcov(mut self, vcov: Matrix) -> Result<Self> {
        let p = self.fixed_effects.len();
        if vcov.nrows() != p || vcov.ncols() != p {
            return Err(ModelError::DimensionMismatch {
                what: "fixed-effect covariance".to_string(),
                expected: p,
                actual: vcov.nrows().max(vcov.ncols()),
            });
        }
        self.vcov = Some(vcov);
        Ok(self)
    }

    /// Attach profile intervals for the variance components, in component order
    pub fn with_profile_intervals(
        mut self,
        level: f64,
        intervals: Vec<ConfidenceInterval>,
    ) -> Result<Self> {
        check_confidence_level(level)?;
        if intervals.len() != self.variance_components.len() {
            return Err(ModelError::DimensionMismatch {
                what: "variance component intervals".to_string(),
                expected: self.variance_components.len(),
                actual: intervals.len(),
            });
        }
        self.profile = Some(ProfileIntervals { level, intervals });
        Ok(self)
    }

    /// Record observation and group counts
    pub fn with_counts(mut self, n_obs: usize, n_groups: usize) -> Self {
        self.n_obs = Some(n_obs);
        self.n_groups = Some(n_groups);
        self
    }

    /// Grouping factor of the random intercept
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Number of groups, if known
    pub fn n_groups(&self) -> Option<usize> {
        self.n_groups
    }

    pub fn fixed_effects(&self) -> &[Coefficient] {
        &self.fixed_effects
    }

    pub fn variance_components(&self) -> &[VarianceComponent] {
        &self.variance_components
    }

    /// Fixed-effect names followed by variance-component names
    pub fn parameter_names(&self) -> Vec<String> {
        self.fixed_effects
            .iter()
            .map(|c| c.name.clone())
            .chain(self.variance_components.iter().map(|v| v.parameter.clone()))
            .collect()
    }

    /// Collect one optional field across all fixed effects
    fn collect_field(
        &self,
        capability: Capability,
        field: impl Fn(&Coefficient) -> Option<f64>,
    ) -> Result<Vec<f64>> {
        self.fixed_effects
            .iter()
            .map(|c| field(c).ok_or(ModelError::MissingCapability(capability)))
            .collect()
    }

    fn fixed_intervals(&self, level: f64) -> Result<Vec<ConfidenceInterval>> {
        let std_errors = self.std_errors()?;
        let dfs = self.collect_field(Capability::DegreesOfFreedom, |c| c.df)?;

        self.fixed_effects
            .iter()
            .zip(std_errors.iter().zip(dfs.iter()))
            .map(|(c, (&se, &df))| {
                let t_dist = StudentsT::new(0.0, 1.0, df)
                    .map_err(|e| ModelError::numerical("confint", e))?;
                let t_critical = t_dist.inverse_cdf(1.0 - (1.0 - level) / 2.0);
                Ok(ConfidenceInterval::new(
                    c.name.clone(),
                    c.estimate - t_critical * se,
                    c.estimate + t_critical * se,
                ))
            })
            .collect()
    }
}

impl FittedModel for MixedModelFit {
    fn model_type(&self) -> ModelType {
        ModelType::LinearMixedModel
    }

    fn term_names(&self) -> Vec<String> {
        self.fixed_effects.iter().map(|c| c.name.clone()).collect()
    }

    fn estimates(&self) -> Vec<f64> {
        self.fixed_effects.iter().map(|c| c.estimate).collect()
    }

    fn std_errors(&self) -> Result<Vec<f64>> {
        self.collect_field(Capability::StdErrors, |c| c.std_error)
    }

    fn degrees_of_freedom(&self) -> Result<DegreesOfFreedom> {
        self.collect_field(Capability::DegreesOfFreedom, |c| c.df)
            .map(DegreesOfFreedom::PerTerm)
    }

    fn statistic_kind(&self) -> StatisticKind {
        StatisticKind::T
    }

    /// Reported t values, falling back to estimate / SE
    fn statistics(&self) -> Result<Vec<f64>> {
        self.collect_field(Capability::Statistics, |c| {
            c.t_stat.or_else(|| c.std_error.map(|se| c.estimate / se))
        })
    }

    fn p_values(&self) -> Result<Vec<f64>> {
        self.collect_field(Capability::PValues, |c| c.p_value)
    }

    fn confint(&self, level: f64, parameters: ParameterSet) -> Result<Vec<ConfidenceInterval>> {
        check_confidence_level(level)?;
        let mut intervals = self.fixed_intervals(level)?;

        if parameters == ParameterSet::All {
            let profile = self
                .profile
                .as_ref()
                .filter(|p| (p.level - level).abs() < 1e-12)
                .ok_or(ModelError::MissingCapability(
                    Capability::VarianceComponentIntervals,
                ))?;
            debug!(
                "Using {} supplied profile intervals for '{}'",
                profile.intervals.len(),
                self.group
            );
            intervals.extend(profile.intervals.iter().cloned());
        }

        Ok(intervals)
    }

    fn vcov(&self) -> Result<Matrix> {
        self.vcov
            .clone()
            .ok_or(ModelError::MissingCapability(Capability::Covariance))
    }

    fn n_obs(&self) -> Option<usize> {
        self.n_obs
    }
}
