//! Narrative report and its assembly.
//!
//! A [`Report`] is an ordered list of [`ReportSection`]s, one per heuristic
//! that applied to the dataset. Each section renders as a markdown heading
//! followed by its narrative lines; sections are separated by one blank line.
//!
//! The [`ReportAssembler`] collects section outcomes in stage order and pairs
//! the final report with the [`ResultBundle`] into an [`AnalysisOutput`].

pub mod bundle;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use bundle::{keys, BundleValue, CorrelationMatrix, CrossTab, RankedEntry, ResultBundle};

use crate::analyzers::HeuristicOutcome;

/// Report sections, in the order they appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Overview,
    ColumnTypes,
    Correlation,
    Outliers,
    TemporalTrend,
    CategoryLeaders,
    Leaderboards,
}

impl SectionKind {
    /// Every section, in report order.
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Overview,
        SectionKind::ColumnTypes,
        SectionKind::Correlation,
        SectionKind::Outliers,
        SectionKind::TemporalTrend,
        SectionKind::CategoryLeaders,
        SectionKind::Leaderboards,
    ];

    /// One-based position in the report.
    pub fn number(&self) -> usize {
        match self {
            SectionKind::Overview => 1,
            SectionKind::ColumnTypes => 2,
            SectionKind::Correlation => 3,
            SectionKind::Outliers => 4,
            SectionKind::TemporalTrend => 5,
            SectionKind::CategoryLeaders => 6,
            SectionKind::Leaderboards => 7,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Overview => "Visão Geral do Dataset",
            SectionKind::ColumnTypes => "Tipos de Colunas",
            SectionKind::Correlation => "Análise de Correlação",
            SectionKind::Outliers => "Análise de Outliers",
            SectionKind::TemporalTrend => "Análise de Tendência Temporal",
            SectionKind::CategoryLeaders => "Destaques por Categoria",
            SectionKind::Leaderboards => "Rankings",
        }
    }

    /// Markdown heading, e.g. `### 1. Visão Geral do Dataset`.
    pub fn heading(&self) -> String {
        format!("### {}. {}", self.number(), self.title())
    }
}

/// One heading plus its narrative lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub kind: SectionKind,
    pub lines: Vec<String>,
}

impl ReportSection {
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            lines: Vec::new(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.push(line);
        self
    }

    pub fn heading(&self) -> String {
        self.kind.heading()
    }

    /// Heading and lines joined by newlines.
    pub fn render(&self) -> String {
        let mut text = self.heading();
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }
}

/// Ordered narrative sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn contains(&self, kind: SectionKind) -> bool {
        self.section(kind).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// The full markdown narrative.
    pub fn text(&self) -> String {
        self.sections
            .iter()
            .map(ReportSection::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub report: Report,
    pub bundle: ResultBundle,
}

impl AnalysisOutput {
    /// Shorthand for `self.report.text()`.
    pub fn report_text(&self) -> String {
        self.report.text()
    }
}

/// Collects heuristic outcomes into a report and bundle.
///
/// Sections are kept in the order they are added; the engine adds them in
/// [`SectionKind::ALL`] order. Dropping the assembler discards everything.
#[derive(Debug, Default)]
pub struct ReportAssembler {
    report: Report,
    bundle: ResultBundle,
}

impl ReportAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, outcome: HeuristicOutcome) {
        if let Some(section) = outcome.section {
            self.report.sections.push(section);
        }
        for (key, value) in outcome.results {
            self.bundle.insert(key, value);
        }
    }

    pub fn section_count(&self) -> usize {
        self.report.sections.len()
    }

    pub fn finish(self) -> AnalysisOutput {
        AnalysisOutput {
            report: self.report,
            bundle: self.bundle,
        }
    }
}
