//! Engine and filter configuration.
//!
//! Both structs deserialize from JSON with every field optional; missing
//! fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::analyzers::RankingRule;
use crate::error::{ExploreError, Result};

/// Default |r| above which a pair of numeric columns is reported.
pub const DEFAULT_CORRELATION_THRESHOLD: f64 = 0.7;
/// Default |r| against time above which a trend is reported.
pub const DEFAULT_TREND_THRESHOLD: f64 = 0.6;
/// Default Tukey fence multiplier.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
/// Default leaderboard length.
pub const DEFAULT_LEADERBOARD_SIZE: usize = 5;
/// Default distinct-value ceiling for categorical filters.
pub const DEFAULT_CARDINALITY_CEILING: usize = 20;

/// Thresholds and rules used by the heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pairs with |r| strictly above this are reported
    pub correlation_threshold: f64,
    /// Columns whose |r| against time is strictly above this are reported
    pub trend_threshold: f64,
    /// Multiplier applied to the IQR to place the outlier fences
    pub iqr_multiplier: f64,
    /// Number of entries in each leaderboard
    pub leaderboard_size: usize,
    /// Measure columns tried first by the category leader heuristic
    pub preferred_metric_names: Vec<String>,
    /// Declarative leaderboards; defaults to the sales rankings. Rules without
    /// their own limit keep `leaderboard_size` entries.
    pub ranking_rules: Vec<RankingRule>,
    /// Emit a sentence when no temporal trend crosses the threshold
    pub explicit_empty_trend: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            correlation_threshold: DEFAULT_CORRELATION_THRESHOLD,
            trend_threshold: DEFAULT_TREND_THRESHOLD,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            preferred_metric_names: ["Vendas", "Receita", "Faturamento", "Valor", "Total"]
                .into_iter()
                .map(String::from)
                .collect(),
            ranking_rules: RankingRule::sales_defaults(),
            explicit_empty_trend: true,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from JSON and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ExploreError::configuration(format!("invalid engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the correlation threshold.
    pub fn with_correlation_threshold(mut self, threshold: f64) -> Self {
        self.correlation_threshold = threshold;
        self
    }

    /// Sets the trend threshold.
    pub fn with_trend_threshold(mut self, threshold: f64) -> Self {
        self.trend_threshold = threshold;
        self
    }

    /// Sets the IQR multiplier.
    pub fn with_iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = multiplier;
        self
    }

    /// Sets the length of every leaderboard whose rule has no limit of its own.
    pub fn with_leaderboard_size(mut self, size: usize) -> Self {
        self.leaderboard_size = size;
        self
    }

    /// Replaces the preferred metric names.
    pub fn with_preferred_metrics<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_metric_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the ranking rules.
    pub fn with_ranking_rules(mut self, rules: Vec<RankingRule>) -> Self {
        self.ranking_rules = rules;
        self
    }

    /// Adds a ranking rule after the existing ones.
    pub fn add_ranking_rule(mut self, rule: RankingRule) -> Self {
        self.ranking_rules.push(rule);
        self
    }

    /// Sets whether an empty trend analysis says so explicitly.
    pub fn with_explicit_empty_trend(mut self, enabled: bool) -> Self {
        self.explicit_empty_trend = enabled;
        self
    }

    /// Checks that every threshold is usable.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("correlation_threshold", self.correlation_threshold),
            ("trend_threshold", self.trend_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ExploreError::configuration(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }

        if !self.iqr_multiplier.is_finite() || self.iqr_multiplier < 0.0 {
            return Err(ExploreError::configuration(format!(
                "iqr_multiplier must be a non-negative number, got {}",
                self.iqr_multiplier
            )));
        }

        if self.leaderboard_size == 0 {
            return Err(ExploreError::configuration(
                "leaderboard_size must be at least 1",
            ));
        }

        for rule in &self.ranking_rules {
            if rule.key.trim().is_empty() {
                return Err(ExploreError::configuration("ranking rule key cannot be empty"));
            }
            if rule.limit == Some(0) {
                return Err(ExploreError::configuration(format!(
                    "ranking rule '{}' must keep at least one entry",
                    rule.key
                )));
            }
            if rule.group.names.is_empty() || rule.metric.names.is_empty() {
                return Err(ExploreError::configuration(format!(
                    "ranking rule '{}' must name its group and metric columns",
                    rule.key
                )));
            }
        }

        Ok(())
    }
}

/// Settings for filter candidate derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Categorical columns are offered as filters only below this many distinct values
    pub cardinality_ceiling: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cardinality_ceiling: DEFAULT_CARDINALITY_CEILING,
        }
    }
}

impl FilterConfig {
    pub fn with_cardinality_ceiling(mut self, ceiling: usize) -> Self {
        self.cardinality_ceiling = ceiling;
        self
    }
}
