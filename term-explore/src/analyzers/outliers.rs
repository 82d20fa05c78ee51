//! IQR-based outlier counting, one numeric column at a time.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::errors::AnalyzerResult;
use super::query;
use super::stats::IqrBounds;
use super::traits::{AnalysisInput, Heuristic, HeuristicOutcome};
use crate::report::{ReportSection, SectionKind};

/// Counts values outside the Tukey fences of each numeric column.
#[derive(Debug, Clone, Default)]
pub struct OutlierHeuristic;

impl OutlierHeuristic {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Heuristic for OutlierHeuristic {
    fn name(&self) -> &str {
        "outliers"
    }

    fn section(&self) -> SectionKind {
        SectionKind::Outliers
    }

    fn progress_message(&self) -> &str {
        "Detectando valores atípicos..."
    }

    fn is_applicable(&self, input: &AnalysisInput<'_>) -> bool {
        input.has_rows() && !input.roles.numeric.is_empty()
    }

    #[instrument(skip(self, input), fields(columns = input.roles.numeric.len()))]
    async fn analyze(&self, input: &AnalysisInput<'_>) -> AnalyzerResult<HeuristicOutcome> {
        let multiplier = input.config.iqr_multiplier;
        let mut section = ReportSection::new(self.section());

        for column in &input.roles.numeric {
            let values = query::numeric_values(input.ctx, column).await?;
            let Some(bounds) = IqrBounds::compute(&values, multiplier) else {
                debug!(column = %column, "No values to inspect");
                continue;
            };

            let count = bounds.count_outliers(&values);
            debug!(
                column = %column,
                lower = bounds.lower,
                upper = bounds.upper,
                outliers = count,
                "Computed IQR fences"
            );
            if count > 0 {
                section.push(format!(
                    "- A coluna **`{column}`** parece ter `{count}` valor(es) atípico(s). Isso pode indicar erros de entrada ou eventos raros que merecem atenção."
                ));
            }
        }

        if section.lines.is_empty() {
            section.push(
                "- Nenhuma coluna parece ter outliers significativos com base no método IQR.",
            );
        }

        Ok(HeuristicOutcome::with_section(section))
    }
}
