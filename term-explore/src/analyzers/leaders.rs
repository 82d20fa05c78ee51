//! Per-category leaders: the value of each categorical column with the
//! largest total of the chosen measure.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::errors::AnalyzerResult;
use super::query;
use super::schema::{select_metric, RankOrder};
use super::traits::{AnalysisInput, Heuristic, HeuristicOutcome};
use crate::report::{ReportSection, SectionKind};

#[derive(Debug, Clone, Default)]
pub struct CategoryLeaderHeuristic;

impl CategoryLeaderHeuristic {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Heuristic for CategoryLeaderHeuristic {
    fn name(&self) -> &str {
        "category_leaders"
    }

    fn section(&self) -> SectionKind {
        SectionKind::CategoryLeaders
    }

    fn progress_message(&self) -> &str {
        "Identificando destaques por categoria..."
    }

    fn is_applicable(&self, input: &AnalysisInput<'_>) -> bool {
        input.has_rows()
            && !input.roles.categorical.is_empty()
            && select_metric(input.roles, &input.config.preferred_metric_names).is_some()
    }

    #[instrument(skip(self, input))]
    async fn analyze(&self, input: &AnalysisInput<'_>) -> AnalyzerResult<HeuristicOutcome> {
        let Some(metric) = select_metric(input.roles, &input.config.preferred_metric_names) else {
            return Ok(HeuristicOutcome::skipped());
        };

        let mut section = ReportSection::new(self.section()).with_line(format!(
            "Usando a métrica **`{metric}`** para comparar categorias:"
        ));
        let mut eligible = 0usize;

        for column in &input.roles.categorical {
            let distinct = query::distinct_count(input.ctx, column).await?;
            if distinct <= 1 {
                debug!(column = %column, distinct, "Skipping column without variety");
                continue;
            }

            let leaders =
                query::grouped_sums(input.ctx, column, &metric, RankOrder::Descending, Some(1))
                    .await?;
            if let Some(leader) = leaders.first() {
                section.push(format!(
                    "- Em **`{column}`**, o destaque é **`{}`** com total de `{:.2}`.",
                    leader.label, leader.total
                ));
                eligible += 1;
            }
        }

        if eligible == 0 {
            return Ok(HeuristicOutcome::skipped());
        }
        Ok(HeuristicOutcome::with_section(section))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::{is_applicable, run_heuristic};
    use crate::dataset::Dataset;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_leader_per_category() {
        let dataset = Dataset::from_columns(vec![
            (
                "Regiao",
                Arc::new(StringArray::from(vec!["Sul", "Norte", "Sul", "Leste"])) as ArrayRef,
            ),
            (
                "Pais",
                Arc::new(StringArray::from(vec!["BR", "BR", "BR", "BR"])) as ArrayRef,
            ),
            ("Quantidade", Arc::new(Int64Array::from(vec![1, 100, 1, 1])) as ArrayRef),
            (
                "Receita",
                Arc::new(Float64Array::from(vec![50.0, 60.0, 20.0, 10.0])) as ArrayRef,
            ),
        ])
        .unwrap();

        let outcome = run_heuristic(&CategoryLeaderHeuristic::new(), &dataset)
            .await
            .unwrap();
        let lines = outcome.section.unwrap().lines;
        assert_eq!(
            lines,
            vec![
                "Usando a métrica **`Receita`** para comparar categorias:",
                "- Em **`Regiao`**, o destaque é **`Sul`** com total de `70.00`.",
            ]
        );
    }

    #[tokio::test]
    async fn test_tie_picks_smallest_label() {
        let dataset = Dataset::from_columns(vec![
            (
                "Loja",
                Arc::new(StringArray::from(vec!["B", "A"])) as ArrayRef,
            ),
            ("Valor", Arc::new(Int64Array::from(vec![5, 5])) as ArrayRef),
        ])
        .unwrap();
        let outcome = run_heuristic(&CategoryLeaderHeuristic::new(), &dataset)
            .await
            .unwrap();
        assert!(outcome.section.unwrap().lines[1].contains("**`A`**"));
    }

    #[tokio::test]
    async fn test_omitted_without_varied_category() {
        let dataset = Dataset::from_columns(vec![
            ("Pais", Arc::new(StringArray::from(vec!["BR", "BR"])) as ArrayRef),
            ("Vendas", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
        ])
        .unwrap();
        let outcome = run_heuristic(&CategoryLeaderHeuristic::new(), &dataset)
            .await
            .unwrap();
        assert!(outcome.section.is_none());

        let numeric_only = Dataset::from_columns(vec![(
            "Vendas",
            Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
        )])
        .unwrap();
        assert!(!is_applicable(&CategoryLeaderHeuristic::new(), &numeric_only));
    }
}
