//! Core heuristic trait for the analysis engine.

use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use std::fmt::Debug;

use super::classifier::ColumnRoles;
use super::errors::AnalyzerResult;
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::report::{BundleValue, ReportSection, SectionKind};

/// Everything a heuristic may read during one run.
///
/// The dataset is already prepared (temporal text coerced) and registered in
/// `ctx` under [`TABLE_NAME`](crate::dataset::TABLE_NAME).
#[derive(Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub dataset: &'a Dataset,
    pub ctx: &'a SessionContext,
    pub roles: &'a ColumnRoles,
    pub config: &'a EngineConfig,
}

impl<'a> AnalysisInput<'a> {
    pub fn row_count(&self) -> usize {
        self.dataset.num_rows()
    }

    pub fn has_rows(&self) -> bool {
        self.row_count() > 0
    }
}

/// The section and bundle entries a heuristic contributes.
#[derive(Debug, Clone, Default)]
pub struct HeuristicOutcome {
    pub section: Option<ReportSection>,
    pub results: Vec<(String, BundleValue)>,
}

impl HeuristicOutcome {
    /// Contributes nothing.
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn with_section(section: ReportSection) -> Self {
        Self {
            section: Some(section),
            results: Vec::new(),
        }
    }

    /// Adds a bundle entry.
    pub fn result(mut self, key: impl Into<String>, value: BundleValue) -> Self {
        self.results.push((key.into(), value));
        self
    }
}

/// One stage of the analysis.
///
/// Heuristics are stateless: everything they need arrives through
/// [`AnalysisInput`], and everything they produce leaves through
/// [`HeuristicOutcome`]. A heuristic whose prerequisites are absent reports
/// `false` from [`is_applicable`](Heuristic::is_applicable) and contributes
/// no section at all.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use term_explore::analyzers::{AnalysisInput, AnalyzerResult, Heuristic, HeuristicOutcome};
/// use term_explore::report::{ReportSection, SectionKind};
///
/// #[derive(Debug)]
/// struct RowCount;
///
/// #[async_trait]
/// impl Heuristic for RowCount {
///     fn name(&self) -> &str {
///         "row_count"
///     }
///
///     fn section(&self) -> SectionKind {
///         SectionKind::Overview
///     }
///
///     fn progress_message(&self) -> &str {
///         "Contando linhas..."
///     }
///
///     async fn analyze(&self, input: &AnalysisInput<'_>) -> AnalyzerResult<HeuristicOutcome> {
///         let section = ReportSection::new(self.section())
///             .with_line(format!("- {} linhas", input.row_count()));
///         Ok(HeuristicOutcome::with_section(section))
///     }
/// }
/// ```
#[async_trait]
pub trait Heuristic: Send + Sync + Debug {
    /// Returns the name of this heuristic.
    ///
    /// Used in logs and progress reporting.
    fn name(&self) -> &str;

    /// The report section this heuristic writes.
    fn section(&self) -> SectionKind;

    /// Status message shown once this stage has finished.
    fn progress_message(&self) -> &str;

    /// Whether the dataset has what this heuristic needs.
    fn is_applicable(&self, _input: &AnalysisInput<'_>) -> bool {
        true
    }

    /// Runs the heuristic.
    async fn analyze(&self, input: &AnalysisInput<'_>) -> AnalyzerResult<HeuristicOutcome>;
}
