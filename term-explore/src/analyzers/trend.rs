//! Monotonic trends of numeric columns over the first temporal column.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::errors::AnalyzerResult;
use super::query;
use super::stats::pearson;
use super::temporal::to_epoch_nanos;
use super::traits::{AnalysisInput, Heuristic, HeuristicOutcome};
use crate::dataset::TABLE_NAME;
use crate::report::{ReportSection, SectionKind};

/// Correlates every numeric column with time.
#[derive(Debug, Clone, Default)]
pub struct TrendHeuristic;

impl TrendHeuristic {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Heuristic for TrendHeuristic {
    fn name(&self) -> &str {
        "temporal_trend"
    }

    fn section(&self) -> SectionKind {
        SectionKind::TemporalTrend
    }

    fn progress_message(&self) -> &str {
        "Analisando tendências temporais..."
    }

    fn is_applicable(&self, input: &AnalysisInput<'_>) -> bool {
        input.has_rows() && !input.roles.numeric.is_empty() && !input.roles.temporal.is_empty()
    }

    #[instrument(skip(self, input))]
    async fn analyze(&self, input: &AnalysisInput<'_>) -> AnalyzerResult<HeuristicOutcome> {
        let Some(time_column) = input.roles.first_temporal() else {
            return Ok(HeuristicOutcome::skipped());
        };

        let mut projection = vec![format!("{} AS moment", query::quoted(time_column)?)];
        for (idx, column) in input.roles.numeric.iter().enumerate() {
            projection.push(format!(
                "CAST({} AS DOUBLE) AS measure_{idx}",
                query::quoted(column)?
            ));
        }
        let sql = format!(
            "SELECT {} FROM {TABLE_NAME} ORDER BY moment ASC NULLS LAST",
            projection.join(", ")
        );
        let batches = query::collect(input.ctx, &sql).await?;

        let mut timestamps: Vec<Option<f64>> = Vec::new();
        for batch in &batches {
            timestamps.extend(
                to_epoch_nanos(batch.column(0))?
                    .into_iter()
                    .map(|nanos| nanos.map(|n| n as f64)),
            );
        }

        let threshold = input.config.trend_threshold;
        let mut section = ReportSection::new(self.section()).with_line(format!(
            "Analisando tendências ao longo do tempo usando a coluna **`{time_column}`**:"
        ));
        let mut found = false;

        for (idx, column) in input.roles.numeric.iter().enumerate() {
            let values = query::f64_values(&batches, idx + 1)?;
            let r = pearson(&timestamps, &values);
            debug!(column = %column, coefficient = r, "Computed trend coefficient");

            if !r.is_nan() && r.abs() > threshold {
                let direction = if r > 0.0 { "crescimento" } else { "decréscimo" };
                section.push(format!(
                    "- A coluna **`{column}`** mostra uma forte tendência de **{direction}** ao longo do tempo."
                ));
                found = true;
            }
        }

        if !found && input.config.explicit_empty_trend {
            section.push(format!(
                "- Nenhuma tendência temporal forte (acima de {threshold} ou abaixo de -{threshold}) foi encontrada."
            ));
        }

        Ok(HeuristicOutcome::with_section(section))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::{is_applicable, run_heuristic, run_heuristic_with};
    use crate::config::EngineConfig;
    use crate::dataset::Dataset;
    use arrow::array::{ArrayRef, Date32Array, Int64Array, StringArray};
    use std::sync::Arc;

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            // Deliberately unsorted dates.
            (
                "Data",
                Arc::new(Date32Array::from(vec![19_003, 19_000, 19_002, 19_001])) as ArrayRef,
            ),
            ("Vendas", Arc::new(Int64Array::from(vec![40, 10, 30, 20])) as ArrayRef),
            ("Devolucoes", Arc::new(Int64Array::from(vec![1, 9, 3, 6])) as ArrayRef),
            ("Ruido", Arc::new(Int64Array::from(vec![5, 5, 1, 9])) as ArrayRef),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_growth_and_decline() {
        let outcome = run_heuristic(&TrendHeuristic::new(), &dataset()).await.unwrap();
        let lines = outcome.section.unwrap().lines;
        assert_eq!(
            lines[0],
            "Analisando tendências ao longo do tempo usando a coluna **`Data`**:"
        );
        assert_eq!(
            lines[1],
            "- A coluna **`Vendas`** mostra uma forte tendência de **crescimento** ao longo do tempo."
        );
        assert_eq!(
            lines[2],
            "- A coluna **`Devolucoes`** mostra uma forte tendência de **decréscimo** ao longo do tempo."
        );
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_trend_sentence_is_configurable() {
        let flat = Dataset::from_columns(vec![
            (
                "Data",
                Arc::new(Date32Array::from(vec![19_000, 19_001, 19_002, 19_003])) as ArrayRef,
            ),
            ("Ruido", Arc::new(Int64Array::from(vec![5, 9, 1, 5])) as ArrayRef),
        ])
        .unwrap();

        let outcome = run_heuristic(&TrendHeuristic::new(), &flat).await.unwrap();
        let lines = outcome.section.unwrap().lines;
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("- Nenhuma tendência temporal forte"));

        let config = EngineConfig::default().with_explicit_empty_trend(false);
        let outcome = run_heuristic_with(&TrendHeuristic::new(), &flat, &config)
            .await
            .unwrap();
        assert_eq!(outcome.section.unwrap().lines.len(), 1);
    }

    #[tokio::test]
    async fn test_text_dates_are_used() {
        let dataset = Dataset::from_columns(vec![
            (
                "Data",
                Arc::new(StringArray::from(vec!["03/01/2024", "01/01/2024", "02/01/2024"]))
                    as ArrayRef,
            ),
            ("Vendas", Arc::new(Int64Array::from(vec![3, 1, 2])) as ArrayRef),
        ])
        .unwrap();
        let outcome = run_heuristic(&TrendHeuristic::new(), &dataset).await.unwrap();
        assert!(outcome.section.unwrap().lines[1].contains("**crescimento**"));
    }

    #[tokio::test]
    async fn test_requires_temporal_column() {
        let dataset = Dataset::from_columns(vec![(
            "Vendas",
            Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
        )])
        .unwrap();
        assert!(!is_applicable(&TrendHeuristic::new(), &dataset));
    }
}
