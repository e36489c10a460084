//! Display formatting of result rows
//!
//! Numbers are rounded to a fixed number of decimals. p-values follow the
//! APA style: `< .001` below one in a thousand, otherwise three decimals
//! without the leading zero, emphasised when below the significance
//! threshold.

use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::extract::ResultRow;
use rtab_models::StatisticKind;

/// p-values below this render as `< .001`
pub const P_FLOOR: f64 = 0.001;

/// Markup wrapped around significant p-values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    #[default]
    Bold,
    Italic,
    None,
}

impl Emphasis {
    pub fn wrap(&self, text: &str) -> String {
        match self {
            Emphasis::Bold => format!("\\textbf{{{}}}", text),
            Emphasis::Italic => format!("\\emph{{{}}}", text),
            Emphasis::None => text.to_string(),
        }
    }
}

/// How the df column is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DfFormat {
    /// Whole numbers as integers, fractional df with the usual decimals
    #[default]
    Auto,
    Integer,
    Decimal,
}

/// Formatting options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatOptions {
    pub decimal_places: usize,
    /// p-values strictly below this are emphasised
    pub significance_threshold: f64,
    pub emphasis: Emphasis,
    pub df_format: DfFormat,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            decimal_places: 2,
            significance_threshold: 0.006,
            emphasis: Emphasis::Bold,
            df_format: DfFormat::Auto,
        }
    }
}

impl FormatOptions {
    pub fn validate(&self) -> Result<()> {
        if self.decimal_places > 10 {
            return Err(ReportError::InvalidConfig(format!(
                "decimal_places must be at most 10, got {}",
                self.decimal_places
            )));
        }
        let t = self.significance_threshold;
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            return Err(ReportError::InvalidConfig(format!(
                "significance_threshold must lie in [0, 1], got {}",
                t
            )));
        }
        Ok(())
    }
}

/// A result row rendered to display strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRow {
    pub term: String,
    pub estimate: String,
    pub std_error: String,
    /// Empty when the row has no df
    pub df: String,
    pub statistic: String,
    pub statistic_kind: StatisticKind,
    pub p_value: String,
    /// `[LL, UL]`
    pub confidence_interval: String,
    /// Whether `p_value` carries emphasis markup
    pub emphasized: bool,
}

/// Fixed-decimal rendering with negative zero normalised
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let mut text = format!("{:.*}", decimals, value);
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text.remove(0);
    }
    text
}

/// Render a p-value; the flag reports whether emphasis was applied
pub fn format_p_value(p: f64, threshold: f64, emphasis: Emphasis) -> (String, bool) {
    if p < P_FLOOR {
        return ("< .001".to_string(), false);
    }

    let fixed = format!("{:.3}", p);
    let text = fixed.strip_prefix('0').unwrap_or(&fixed);

    if p < threshold && emphasis != Emphasis::None {
        (emphasis.wrap(text), true)
    } else {
        (text.to_string(), false)
    }
}

fn format_df(df: Option<f64>, style: DfFormat, decimals: usize) -> String {
    let Some(df) = df else {
        return String::new();
    };

    match style {
        DfFormat::Integer => format!("{:.0}", df),
        DfFormat::Auto if df.fract() == 0.0 => format!("{:.0}", df),
        DfFormat::Auto | DfFormat::Decimal => format_fixed(df, decimals),
    }
}

/// Validate and render rows for display
pub fn format_rows(rows: &[ResultRow], options: &FormatOptions) -> Result<Vec<FormattedRow>> {
    options.validate()?;
    let d = options.decimal_places;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            row.validate(i)?;

            let (p_value, emphasized) =
                format_p_value(row.p_value, options.significance_threshold, options.emphasis);

            Ok(FormattedRow {
                term: row.term_label.clone(),
                estimate: format_fixed(row.estimate, d),
                std_error: format_fixed(row.std_error, d),
                df: format_df(row.df, options.df_format, d),
                statistic: format_fixed(row.statistic, d),
                statistic_kind: row.statistic_kind,
                p_value,
                confidence_interval: format!(
                    "[{}, {}]",
                    format_fixed(row.ci_low, d),
                    format_fixed(row.ci_high, d)
                ),
                emphasized,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(value: f64) -> String {
        format_p_value(value, 0.006, Emphasis::Bold).0
    }

    fn row(label: &str, estimate: f64, p_value: f64, ci: (f64, f64)) -> ResultRow {
        ResultRow {
            term: format!("condition{}", label),
            term_label: label.to_string(),
            estimate,
            std_error: 0.35,
            df: Some(96.0),
            statistic: estimate / 0.35,
            statistic_kind: StatisticKind::T,
            p_value,
            ci_low: ci.0,
            ci_high: ci.1,
        }
    }

    #[test]
    fn test_p_below_floor() {
        for value in [0.0, 1e-12, 0.0004, 0.000999] {
            assert_eq!(p(value), "< .001");
        }
    }

    #[test]
    fn test_p_three_decimals_without_leading_zero() {
        assert_eq!(p(0.034), ".034");
        assert_eq!(p(0.02), ".020");
        assert_eq!(p(0.1), ".100");
        assert_eq!(p(0.5), ".500");
        assert_eq!(p(0.9994), ".999");

        let mut value = 0.006;
        while value < 1.0 {
            let text = p(value);
            assert!(text.starts_with('.') || text == "1.000", "{}", text);
            assert_eq!(text.len(), 4);
            value += 0.0137;
        }
    }

    #[test]
    fn test_emphasis_threshold() {
        assert_eq!(p(0.001), "\\textbf{.001}");
        assert_eq!(p(0.0059), "\\textbf{.006}");
        assert_eq!(p(0.006), ".006");
        assert_eq!(p(0.2), ".200");

        let (text, emphasized) = format_p_value(0.004, 0.05, Emphasis::Italic);
        assert_eq!(text, "\\emph{.004}");
        assert!(emphasized);

        let (text, emphasized) = format_p_value(0.004, 0.05, Emphasis::None);
        assert_eq!(text, ".004");
        assert!(!emphasized);
    }

    #[test]
    fn test_fixed_normalises_negative_zero() {
        assert_eq!(format_fixed(-0.0, 2), "0.00");
        assert_eq!(format_fixed(-0.004, 2), "0.00");
        assert_eq!(format_fixed(-0.005001, 2), "-0.01");
        assert_eq!(format_fixed(1.235, 1), "1.2");
        assert_eq!(format_fixed(-0.45, 2), "-0.45");
    }

    #[test]
    fn test_worked_example() {
        let rows = vec![
            row("A", 1.23, 0.0004, (0.5, 1.9)),
            row("B", -0.45, 0.02, (-0.9, 0.0)),
            row("C", 2.01, 0.10, (1.0, 3.0)),
        ];

        let formatted = format_rows(&rows, &FormatOptions::default()).unwrap();

        let ps: Vec<&str> = formatted.iter().map(|r| r.p_value.as_str()).collect();
        assert_eq!(ps, vec!["< .001", ".020", ".100"]);
        assert!(formatted.iter().all(|r| !r.emphasized));

        let cis: Vec<&str> = formatted
            .iter()
            .map(|r| r.confidence_interval.as_str())
            .collect();
        assert_eq!(cis, vec!["[0.50, 1.90]", "[-0.90, 0.00]", "[1.00, 3.00]"]);

        assert_eq!(formatted[0].estimate, "1.23");
        assert_eq!(formatted[1].estimate, "-0.45");
        assert_eq!(formatted[0].term, "A");
    }

    #[test]
    fn test_df_rendering() {
        assert_eq!(format_df(Some(96.0), DfFormat::Auto, 2), "96");
        assert_eq!(format_df(Some(240.46), DfFormat::Auto, 2), "240.46");
        assert_eq!(format_df(Some(240.46), DfFormat::Integer, 2), "240");
        assert_eq!(format_df(Some(96.0), DfFormat::Decimal, 1), "96.0");
        assert_eq!(format_df(None, DfFormat::Auto, 2), "");
    }

    #[test]
    fn test_invalid_row_rejected() {
        let rows = vec![
            row("A", 1.23, 0.03, (0.5, 1.9)),
            row("B", 1.0, 1.2, (0.5, 1.9)),
        ];
        let err = format_rows(&rows, &FormatOptions::default()).unwrap_err();
        match err {
            ReportError::InvalidRow { row, term, .. } => {
                assert_eq!(row, 1);
                assert_eq!(term, "conditionB");
            }
            other => panic!("expected InvalidRow, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = FormatOptions {
            significance_threshold: f64::NAN,
            ..FormatOptions::default()
        };
        assert!(matches!(
            format_rows(&[], &options),
            Err(ReportError::InvalidConfig(_))
        ));
    }
}
