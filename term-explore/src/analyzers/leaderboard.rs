//! Top/bottom-N leaderboards driven by [`RankingRule`](super::RankingRule)s.

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::errors::AnalyzerResult;
use super::query;
use super::traits::{AnalysisInput, Heuristic, HeuristicOutcome};
use crate::report::{BundleValue, ReportSection, SectionKind};

/// Runs every ranking rule whose columns resolve.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardHeuristic;

impl LeaderboardHeuristic {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Heuristic for LeaderboardHeuristic {
    fn name(&self) -> &str {
        "leaderboards"
    }

    fn section(&self) -> SectionKind {
        SectionKind::Leaderboards
    }

    fn progress_message(&self) -> &str {
        "Montando rankings..."
    }

    fn is_applicable(&self, input: &AnalysisInput<'_>) -> bool {
        input.has_rows()
            && input
                .config
                .ranking_rules
                .iter()
                .any(|rule| rule.resolve(input.roles).is_some())
    }

    #[instrument(skip(self, input), fields(rules = input.config.ranking_rules.len()))]
    async fn analyze(&self, input: &AnalysisInput<'_>) -> AnalyzerResult<HeuristicOutcome> {
        let mut section = ReportSection::new(self.section());
        let mut results = Vec::new();

        for rule in &input.config.ranking_rules {
            let Some(resolved) = rule.resolve(input.roles) else {
                debug!(rule = %rule.key, "Ranking rule does not apply");
                continue;
            };

            let limit = rule.effective_limit(input.config.leaderboard_size);
            let entries = query::grouped_sums(
                input.ctx,
                &resolved.group,
                &resolved.metric,
                rule.order,
                Some(limit),
            )
            .await?;

            if !section.lines.is_empty() {
                section.push("");
            }
            section.push(format!("**{}:**", rule.heading(limit)));
            for (position, entry) in entries.iter().enumerate() {
                section.push(format!(
                    "  {}. `{}`: `{:.2}`",
                    position + 1,
                    entry.label,
                    entry.total
                ));
            }

            results.push((rule.key.clone(), BundleValue::Ranking(entries)));
        }

        if results.is_empty() {
            return Ok(HeuristicOutcome::skipped());
        }

        let mut outcome = HeuristicOutcome::with_section(section);
        outcome.results = results;
        Ok(outcome)
    }
}
