//! Heuristics bank: column classification and the insight heuristics.
//!
//! Every heuristic implements [`Heuristic`] and writes exactly one report
//! section. The engine runs them in the fixed order returned by
//! [`default_heuristics`]:
//!
//! 1. **Overview** (`overview`): row and column counts
//! 2. **Column types** (`overview`): numeric / categorical / temporal lists
//! 3. **Correlation** (`correlation`): Pearson matrix and strong pairs
//! 4. **Outliers** (`outliers`): IQR fences per numeric column
//! 5. **Temporal trend** (`trend`): correlation of each measure with time
//! 6. **Category leaders** (`leaders`): best value of each categorical column
//! 7. **Leaderboards** (`leaderboard`): top/bottom-N from [`RankingRule`]s
//!
//! Supporting modules:
//!
//! - [`classifier`]: assigns a [`ColumnRole`] to every column and coerces
//!   text dates to timestamps
//! - [`temporal`]: date format detection and conversion
//! - [`schema`]: declarative column requirements for the leaderboards
//! - [`stats`]: Pearson correlation, quantiles and IQR fences
//! - [`crosstab`]: cross-tabulation and value counts for charting
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use arrow::array::{ArrayRef, Int64Array};
//! use term_explore::analyzers::{AnalysisInput, ColumnClassifier, CorrelationHeuristic, Heuristic};
//! use term_explore::config::EngineConfig;
//! use term_explore::dataset::Dataset;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let dataset = Dataset::from_columns(vec![
//!     ("A", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
//!     ("B", Arc::new(Int64Array::from(vec![2, 4, 6])) as ArrayRef),
//! ])
//! .unwrap();
//!
//! let (prepared, roles) = ColumnClassifier::new().prepare(&dataset).unwrap();
//! let ctx = prepared.session_context().unwrap();
//! let config = EngineConfig::default();
//! let input = AnalysisInput { dataset: &prepared, ctx: &ctx, roles: &roles, config: &config };
//!
//! let heuristic = CorrelationHeuristic::new();
//! if heuristic.is_applicable(&input) {
//!     let outcome = heuristic.analyze(&input).await.unwrap();
//!     println!("{}", outcome.section.unwrap().render());
//! }
//! # })
//! ```

pub mod classifier;
pub mod correlation;
pub mod crosstab;
pub mod errors;
pub mod leaderboard;
pub mod leaders;
pub mod outliers;
pub mod overview;
pub mod query;
pub mod schema;
pub mod stats;
pub mod temporal;
pub mod traits;
pub mod trend;

pub use classifier::{ColumnClassifier, ColumnRole, ColumnRoles};
pub use correlation::{correlation_matrix, strong_pairs, CorrelatedPair, CorrelationHeuristic};
pub use crosstab::{cross_tabulate, value_counts};
pub use errors::{AnalyzerError, AnalyzerResult};
pub use leaderboard::LeaderboardHeuristic;
pub use leaders::CategoryLeaderHeuristic;
pub use outliers::OutlierHeuristic;
pub use overview::{ColumnTypesHeuristic, OverviewHeuristic};
pub use schema::{select_metric, ColumnMatcher, RankOrder, RankingRule, ResolvedRanking};
pub use stats::IqrBounds;
pub use temporal::TemporalFormat;
pub use traits::{AnalysisInput, Heuristic, HeuristicOutcome};
pub use trend::TrendHeuristic;

/// The heuristics in report order, one per [`SectionKind`](crate::report::SectionKind).
pub fn default_heuristics() -> Vec<Box<dyn Heuristic>> {
    vec![
        Box::new(OverviewHeuristic::new()),
        Box::new(ColumnTypesHeuristic::new()),
        Box::new(CorrelationHeuristic::new()),
        Box::new(OutlierHeuristic::new()),
        Box::new(TrendHeuristic::new()),
        Box::new(CategoryLeaderHeuristic::new()),
        Box::new(LeaderboardHeuristic::new()),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SectionKind;

    #[test]
    fn test_default_heuristics_follow_section_order() {
        let sections: Vec<SectionKind> = default_heuristics().iter().map(|h| h.section()).collect();
        assert_eq!(sections, SectionKind::ALL.to_vec());
    }

    #[test]
    fn test_heuristic_names_are_unique() {
        let mut names: Vec<String> = default_heuristics()
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
    }
}
