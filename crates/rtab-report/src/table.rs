//! Rendering formatted rows as a LaTeX `tabular`
//!
//! The alignment string carries one leading character for a row-label
//! gutter that is never printed, so it is always one longer than the
//! column list.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::escape::{escape_markup, escape_text};
use crate::format::FormattedRow;
use rtab_models::StatisticKind;

/// A table column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Term,
    Estimate,
    StdError,
    Df,
    Statistic,
    PValue,
    ConfidenceInterval,
}

impl Column {
    fn cell<'a>(&self, row: &'a FormattedRow) -> &'a str {
        match self {
            Column::Term => &row.term,
            Column::Estimate => &row.estimate,
            Column::StdError => &row.std_error,
            Column::Df => &row.df,
            Column::Statistic => &row.statistic,
            Column::PValue => &row.p_value,
            Column::ConfidenceInterval => &row.confidence_interval,
        }
    }

    /// Cells the formatter builds, which may contain markup
    fn is_markup(&self) -> bool {
        matches!(
            self,
            Column::Estimate | Column::PValue | Column::ConfidenceInterval
        )
    }
}

/// Label of the term column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermHeader {
    /// Coefficient tables
    #[default]
    Condition,
    /// Post-hoc and contrast tables
    Comparison,
}

impl TermHeader {
    pub fn label(&self) -> &'static str {
        match self {
            TermHeader::Condition => "Condition",
            TermHeader::Comparison => "Comparison",
        }
    }
}

/// Column set, alignment and header of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    pub columns: Vec<Column>,
    /// One of `l`, `c`, `r` per column, preceded by the gutter
    pub alignment: String,
    /// Overrides the derived column names
    pub header_labels: Option<Vec<String>>,
    pub term_header: TermHeader,
    /// Confidence level shown in the interval header
    pub confidence_level: f64,
    pub escape: bool,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self::coefficients()
    }
}

impl TableLayout {
    /// Condition, Estimate, SE, df, t, p, CI
    pub fn coefficients() -> Self {
        Self {
            columns: vec![
                Column::Term,
                Column::Estimate,
                Column::StdError,
                Column::Df,
                Column::Statistic,
                Column::PValue,
                Column::ConfidenceInterval,
            ],
            alignment: "llrrrrrc".to_string(),
            header_labels: None,
            term_header: TermHeader::Condition,
            confidence_level: 0.95,
            escape: true,
        }
    }

    /// Comparison, Estimate, SE, z, p
    pub fn comparisons() -> Self {
        Self {
            columns: vec![
                Column::Term,
                Column::Estimate,
                Column::StdError,
                Column::Statistic,
                Column::PValue,
            ],
            alignment: "llrrrr".to_string(),
            header_labels: None,
            term_header: TermHeader::Comparison,
            confidence_level: 0.95,
            escape: true,
        }
    }

    pub fn with_header_labels<S: Into<String>>(mut self, labels: impl IntoIterator<Item = S>) -> Self {
        self.header_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_alignment(mut self, alignment: impl Into<String>) -> Self {
        self.alignment = alignment.into();
        self
    }

    pub fn with_escape(mut self, escape: bool) -> Self {
        self.escape = escape;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(ReportError::InvalidLayout("no columns".to_string()));
        }

        let expected = self.columns.len() + 1;
        let actual = self.alignment.chars().count();
        if actual != expected {
            return Err(ReportError::InvalidLayout(format!(
                "alignment '{}' has {} entries, expected {} ({} columns plus the row-label gutter)",
                self.alignment,
                actual,
                expected,
                self.columns.len()
            )));
        }

        if let Some(bad) = self.alignment.chars().find(|c| !matches!(c, 'l' | 'c' | 'r')) {
            return Err(ReportError::InvalidLayout(format!(
                "unsupported alignment '{}' in '{}'",
                bad, self.alignment
            )));
        }

        if let Some(labels) = &self.header_labels {
            if labels.len() != self.columns.len() {
                return Err(ReportError::InvalidLayout(format!(
                    "{} header labels for {} columns",
                    labels.len(),
                    self.columns.len()
                )));
            }
        }

        Ok(())
    }

    fn column_label(&self, column: Column, statistic: StatisticKind) -> String {
        match column {
            Column::Term => self.term_header.label().to_string(),
            Column::Estimate => "Estimate".to_string(),
            Column::StdError => "SE".to_string(),
            Column::Df => "df".to_string(),
            Column::Statistic => statistic.to_string(),
            Column::PValue => "p".to_string(),
            Column::ConfidenceInterval => format!(
                "{}% CI [LL, UL]",
                format_level(self.confidence_level)
            ),
        }
    }

    fn header(&self, statistic: StatisticKind) -> Vec<String> {
        match &self.header_labels {
            Some(labels) => labels.clone(),
            None => self
                .columns
                .iter()
                .map(|&c| self.column_label(c, statistic))
                .collect(),
        }
    }
}

fn format_level(level: f64) -> String {
    let percent = level * 100.0;
    if (percent - percent.round()).abs() < 1e-9 {
        format!("{:.0}", percent)
    } else {
        format!("{}", percent)
    }
}

/// Rendered table source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableArtifact {
    content: String,
    n_rows: usize,
}

impl TableArtifact {
    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }

    /// Number of body rows
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Write the table to `path`, replacing any existing file
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(self.content.as_bytes())?;
        out.flush()?;
        debug!("Wrote {} table rows to {}", self.n_rows, path.display());
        Ok(())
    }
}

impl fmt::Display for TableArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Produces the lines of one table
struct Renderer<'a> {
    layout: &'a TableLayout,
    statistic: StatisticKind,
}

impl<'a> Renderer<'a> {
    fn new(rows: &[FormattedRow], layout: &'a TableLayout) -> Result<Self> {
        layout.validate()?;
        let statistic = rows
            .first()
            .map(|r| r.statistic_kind)
            .unwrap_or(StatisticKind::T);
        Ok(Self { layout, statistic })
    }

    fn opening(&self) -> String {
        // First alignment entry belongs to the unprinted gutter
        let spec: String = self.layout.alignment.chars().skip(1).collect();
        format!("\\begin{{tabular}}{{{}}}\n\\hline\n", spec)
    }

    fn header(&self) -> String {
        let cells: Vec<String> = self
            .layout
            .header(self.statistic)
            .iter()
            .map(|label| {
                if self.layout.escape {
                    escape_text(label)
                } else {
                    label.clone()
                }
            })
            .collect();
        format!("{} \\\\\n\\hline\n", cells.join(" & "))
    }

    fn row(&self, row: &FormattedRow) -> String {
        let cells: Vec<String> = self
            .layout
            .columns
            .iter()
            .map(|column| {
                let cell = column.cell(row);
                match (self.layout.escape, column.is_markup()) {
                    (false, _) => cell.to_string(),
                    (true, true) => escape_markup(cell),
                    (true, false) => escape_text(cell),
                }
            })
            .collect();
        format!("{} \\\\\n", cells.join(" & "))
    }

    fn closing(&self) -> &'static str {
        "\\hline\n\\end{tabular}\n"
    }
}

/// Render rows into a table
pub fn render_table(rows: &[FormattedRow], layout: &TableLayout) -> Result<TableArtifact> {
    let renderer = Renderer::new(rows, layout)?;

    let mut content = renderer.opening();
    content.push_str(&renderer.header());
    for row in rows {
        content.push_str(&renderer.row(row));
    }
    content.push_str(renderer.closing());

    Ok(TableArtifact {
        content,
        n_rows: rows.len(),
    })
}

/// Render rows straight into a file at `path`
///
/// Lines are streamed as they are produced; the file is closed on every
/// return path, and a failed write may leave a partial table behind.
pub fn render_table_to_path(
    rows: &[FormattedRow],
    layout: &TableLayout,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let renderer = Renderer::new(rows, layout)?;
    let mut out = BufWriter::new(File::create(path)?);

    out.write_all(renderer.opening().as_bytes())?;
    out.write_all(renderer.header().as_bytes())?;
    for row in rows {
        out.write_all(renderer.row(row).as_bytes())?;
    }
    out.write_all(renderer.closing().as_bytes())?;
    out.flush()?;

    debug!("Wrote {} table rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatted(term: &str, p_value: &str, emphasized: bool) -> FormattedRow {
        FormattedRow {
            term: term.to_string(),
            estimate: "1.23".to_string(),
            std_error: "0.35".to_string(),
            df: "96".to_string(),
            statistic: "3.51".to_string(),
            statistic_kind: StatisticKind::T,
            p_value: p_value.to_string(),
            confidence_interval: "[0.50, 1.90]".to_string(),
            emphasized,
        }
    }

    #[test]
    fn test_coefficient_table() {
        let rows = vec![
            formatted("Climate Change", "\\textbf{.004}", true),
            formatted("Income_2", ".020", false),
        ];
        let table = render_table(&rows, &TableLayout::coefficients()).unwrap();

        let expected = "\\begin{tabular}{lrrrrrc}\n\
                        \\hline\n\
                        Condition & Estimate & SE & df & t & p & 95\\% CI [LL, UL] \\\\\n\
                        \\hline\n\
                        Climate Change & 1.23 & 0.35 & 96 & 3.51 & \\textbf{.004} & [0.50, 1.90] \\\\\n\
                        Income\\_2 & 1.23 & 0.35 & 96 & 3.51 & .020 & [0.50, 1.90] \\\\\n\
                        \\hline\n\
                        \\end{tabular}\n";
        assert_eq!(table.as_str(), expected);
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn test_comparison_table() {
        let mut row = formatted("B - A", "< .001", false);
        row.statistic_kind = StatisticKind::Z;

        let table = render_table(&[row], &TableLayout::comparisons()).unwrap();
        assert!(table.as_str().starts_with("\\begin{tabular}{lrrrr}\n"));
        assert!(table.as_str().contains("Comparison & Estimate & SE & z & p \\\\\n"));
        assert!(table.as_str().contains("B - A & 1.23 & 0.35 & 3.51 & \\textless{} .001 \\\\\n"));
        assert!(!table.as_str().contains(" df "));
    }

    #[test]
    fn test_escape_disabled_is_verbatim() {
        let rows = vec![formatted("A<B_2 & 50%", "< .001", false)];
        let layout = TableLayout::coefficients()
            .with_header_labels(["Term_x", "b", "c", "d", "e", "f", "g"])
            .with_escape(false);
        let table = render_table(&rows, &layout).unwrap();

        assert!(table.as_str().contains("Term_x & b & c & d & e & f & g \\\\\n"));
        assert!(table.as_str().contains(
            "A<B_2 & 50% & 1.23 & 0.35 & 96 & 3.51 & < .001 & [0.50, 1.90] \\\\\n"
        ));
    }

    #[test]
    fn test_header_labels_override() {
        let layout = TableLayout::comparisons()
            .with_header_labels(["Contrast", "b", "SE", "t", "p_adj"]);
        let table = render_table(&[], &layout).unwrap();
        assert!(table.as_str().contains("Contrast & b & SE & t & p\\_adj \\\\\n"));
        assert_eq!(table.n_rows(), 0);
    }

    #[test]
    fn test_alignment_length_checked() {
        for alignment in ["lrrrrrc", "llrrrrrcc", ""] {
            let layout = TableLayout::coefficients().with_alignment(alignment);
            assert!(matches!(
                render_table(&[], &layout),
                Err(ReportError::InvalidLayout(_))
            ));
        }

        let layout = TableLayout::coefficients().with_alignment("llrrrrrx");
        assert!(matches!(
            render_table(&[], &layout),
            Err(ReportError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_header_label_count_checked() {
        let layout = TableLayout::coefficients().with_header_labels(["only", "three", "labels"]);
        assert!(matches!(
            render_table(&[], &layout),
            Err(ReportError::InvalidLayout(_))
        ));
    }

    #[test]
    fn test_confidence_level_in_header() {
        let layout = TableLayout {
            confidence_level: 0.9,
            ..TableLayout::coefficients()
        };
        let table = render_table(&[], &layout).unwrap();
        assert!(table.as_str().contains("90\\% CI [LL, UL]"));
    }

    #[test]
    fn test_write_and_stream_agree() {
        let dir = tempfile::tempdir().unwrap();
        let rows = vec![formatted("Climate Change", ".034", false)];
        let layout = TableLayout::coefficients();

        let table = render_table(&rows, &layout).unwrap();
        let written = dir.path().join("written.tex");
        table.write_to(&written).unwrap();

        let streamed = dir.path().join("streamed.tex");
        render_table_to_path(&rows, &layout, &streamed).unwrap();

        let a = std::fs::read_to_string(&written).unwrap();
        let b = std::fs::read_to_string(&streamed).unwrap();
        assert_eq!(a, table.to_string());
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_layout_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.tex");
        let layout = TableLayout::coefficients().with_alignment("lr");

        assert!(render_table_to_path(&[], &layout, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("table.tex");
        assert!(matches!(
            render_table_to_path(&[], &TableLayout::coefficients(), &path),
            Err(ReportError::Io(_))
        ));
    }
}
