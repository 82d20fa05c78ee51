//! Dataset overview and column-type summary.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::crosstab::frequency_table;
use super::errors::AnalyzerResult;
use super::traits::{AnalysisInput, Heuristic, HeuristicOutcome};
use crate::report::{keys, BundleValue, ReportSection, SectionKind};

/// Row and column counts. Always applies, even to an empty dataset.
#[derive(Debug, Clone, Default)]
pub struct OverviewHeuristic;

impl OverviewHeuristic {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Heuristic for OverviewHeuristic {
    fn name(&self) -> &str {
        "overview"
    }

    fn section(&self) -> SectionKind {
        SectionKind::Overview
    }

    fn progress_message(&self) -> &str {
        "Calculando visão geral do dataset..."
    }

    #[instrument(skip(self, input))]
    async fn analyze(&self, input: &AnalysisInput<'_>) -> AnalyzerResult<HeuristicOutcome> {
        let rows = input.row_count();
        let columns = input.dataset.num_columns();

        let section = ReportSection::new(self.section())
            .with_line(format!("- **Número de Linhas:** {rows}"))
            .with_line(format!("- **Número de Colunas:** {columns}"));

        Ok(HeuristicOutcome::with_section(section)
            .result(keys::ROW_COUNT, BundleValue::Count(rows as u64))
            .result(keys::COLUMN_COUNT, BundleValue::Count(columns as u64)))
    }
}

/// Lists the columns of each role and stores the role lists in the bundle.
#[derive(Debug, Clone, Default)]
pub struct ColumnTypesHeuristic;

impl ColumnTypesHeuristic {
    pub fn new() -> Self {
        Self
    }
}

fn column_line(label: &str, columns: &[String]) -> String {
    if columns.is_empty() {
        format!("- **{label} (0):** nenhuma")
    } else {
        let names: Vec<String> = columns.iter().map(|c| format!("`{c}`")).collect();
        format!("- **{label} ({}):** {}", columns.len(), names.join(", "))
    }
}

#[async_trait]
impl Heuristic for ColumnTypesHeuristic {
    fn name(&self) -> &str {
        "column_types"
    }

    fn section(&self) -> SectionKind {
        SectionKind::ColumnTypes
    }

    fn progress_message(&self) -> &str {
        "Identificando tipos de colunas..."
    }

    #[instrument(skip(self, input))]
    async fn analyze(&self, input: &AnalysisInput<'_>) -> AnalyzerResult<HeuristicOutcome> {
        let roles = input.roles;

        let section = ReportSection::new(self.section())
            .with_line(column_line("Colunas Numéricas", &roles.numeric))
            .with_line(column_line("Colunas Categóricas", &roles.categorical))
            .with_line(column_line("Colunas de Data/Hora", &roles.temporal));

        let mut outcome = HeuristicOutcome::with_section(section)
            .result(keys::NUMERIC_COLS, BundleValue::Columns(roles.numeric.clone()))
            .result(
                keys::CATEGORICAL_COLS,
                BundleValue::Columns(roles.categorical.clone()),
            )
            .result(keys::DATETIME_COLS, BundleValue::Columns(roles.temporal.clone()));

        if let [row, column, ..] = roles.categorical.as_slice() {
            if input.has_rows() {
                let table = frequency_table(input.ctx, row, column).await?;
                debug!(row = %row, column = %column, cells = table.total(), "Built composition table");
                outcome = outcome.result(keys::COMPOSITION, BundleValue::CrossTab(table));
            }
        }
        Ok(outcome)
    }
}
