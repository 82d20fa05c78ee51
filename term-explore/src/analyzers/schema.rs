//! Declarative column requirements for the domain-specific heuristics.
//!
//! A [`RankingRule`] names the columns it needs and the role each must carry.
//! The rule only runs when every requirement resolves against the classified
//! dataset, so leaderboards for sales data stay dormant on unrelated tables.

use serde::{Deserialize, Serialize};

use super::classifier::{ColumnRole, ColumnRoles};
use crate::report::keys;

/// Accepts a column by name (exact match first, then case-insensitive) among
/// the columns carrying `role`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMatcher {
    pub names: Vec<String>,
    pub role: ColumnRole,
}

impl ColumnMatcher {
    pub fn new(role: ColumnRole, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            role,
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self::new(ColumnRole::Numeric, [name])
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self::new(ColumnRole::Categorical, [name])
    }

    /// Returns the matching column, honouring the order of `names`.
    pub fn resolve(&self, roles: &ColumnRoles) -> Option<String> {
        let candidates = roles.columns(self.role);

        for name in &self.names {
            if let Some(found) = candidates.iter().find(|c| *c == name) {
                return Some(found.clone());
            }
        }
        for name in &self.names {
            if let Some(found) = candidates.iter().find(|c| c.eq_ignore_ascii_case(name)) {
                return Some(found.clone());
            }
        }
        None
    }
}

/// Picks the measure column used to compare categories.
///
/// The first preferred name that resolves wins; otherwise the first numeric
/// column in dataset order.
pub fn select_metric(roles: &ColumnRoles, preferred: &[String]) -> Option<String> {
    ColumnMatcher::new(ColumnRole::Numeric, preferred.iter().cloned())
        .resolve(roles)
        .or_else(|| roles.numeric.first().cloned())
}

/// Direction of a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    /// Largest totals first.
    Descending,
    /// Smallest totals first.
    Ascending,
}

/// Placeholder in a rule title replaced by the number of entries kept.
pub const LIMIT_PLACEHOLDER: &str = "{limit}";

/// Group `group` by summing `metric`, keep `limit` groups in `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRule {
    /// Bundle key the ranking is stored under.
    pub key: String,
    /// Narrative title; `{limit}` is replaced by the effective limit.
    pub title: String,
    pub group: ColumnMatcher,
    pub metric: ColumnMatcher,
    pub order: RankOrder,
    /// Entries kept; `None` follows `EngineConfig::leaderboard_size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Column names a rule resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRanking<'a> {
    pub rule: &'a RankingRule,
    pub group: String,
    pub metric: String,
}

impl RankingRule {
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        group: ColumnMatcher,
        metric: ColumnMatcher,
        order: RankOrder,
        limit: Option<usize>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            group,
            metric,
            order,
            limit,
        }
    }

    /// Resolves both columns, or `None` if either is missing or has the wrong role.
    pub fn resolve(&self, roles: &ColumnRoles) -> Option<ResolvedRanking<'_>> {
        Some(ResolvedRanking {
            rule: self,
            group: self.group.resolve(roles)?,
            metric: self.metric.resolve(roles)?,
        })
    }

    /// The rule's own limit, or `default` when it has none.
    pub fn effective_limit(&self, default: usize) -> usize {
        self.limit.unwrap_or(default)
    }

    /// Title with the placeholder filled in for `limit` entries.
    pub fn heading(&self, limit: usize) -> String {
        self.title.replace(LIMIT_PLACEHOLDER, &limit.to_string())
    }

    /// The sales leaderboards: top sellers, top and bottom product categories.
    ///
    /// Their length follows the configured leaderboard size.
    pub fn sales_defaults() -> Vec<RankingRule> {
        vec![
            RankingRule::new(
                keys::TOP_SELLERS,
                "Top {limit} Vendedores com Mais Vendas",
                ColumnMatcher::categorical("Vendedor"),
                ColumnMatcher::numeric("Vendas"),
                RankOrder::Descending,
                None,
            ),
            RankingRule::new(
                keys::TOP_PRODUCTS,
                "Top {limit} Produtos Mais Vendidos",
                ColumnMatcher::categorical("Categoria_Produto"),
                ColumnMatcher::numeric("Vendas"),
                RankOrder::Descending,
                None,
            ),
            RankingRule::new(
                keys::BOTTOM_PRODUCTS,
                "Top {limit} Produtos Menos Vendidos",
                ColumnMatcher::categorical("Categoria_Produto"),
                ColumnMatcher::numeric("Vendas"),
                RankOrder::Ascending,
                None,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> ColumnRoles {
        ColumnRoles {
            numeric: vec!["Quantidade".into(), "vendas".into()],
            categorical: vec!["Vendedor".into(), "Categoria_Produto".into()],
            temporal: vec!["Data".into()],
        }
    }

    #[test]
    fn test_matcher_case_insensitive_fallback() {
        let matcher = ColumnMatcher::numeric("Vendas");
        assert_eq!(matcher.resolve(&roles()), Some("vendas".to_string()));
    }

    #[test]
    fn test_matcher_requires_role() {
        let matcher = ColumnMatcher::numeric("Vendedor");
        assert_eq!(matcher.resolve(&roles()), None);
    }

    #[test]
    fn test_select_metric() {
        let preferred = vec!["Receita".to_string(), "Vendas".to_string()];
        assert_eq!(select_metric(&roles(), &preferred), Some("vendas".to_string()));

        let none_preferred = vec!["Lucro".to_string()];
        assert_eq!(
            select_metric(&roles(), &none_preferred),
            Some("Quantidade".to_string())
        );

        assert_eq!(select_metric(&ColumnRoles::default(), &preferred), None);
    }

    #[test]
    fn test_default_rules_resolve() {
        let rules = RankingRule::sales_defaults();
        let roles = roles();
        let resolved: Vec<_> = rules.iter().filter_map(|r| r.resolve(&roles)).collect();
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].group, "Vendedor");
        assert_eq!(resolved[2].rule.order, RankOrder::Ascending);
        assert!(rules.iter().all(|r| r.limit.is_none()));
        assert_eq!(rules[0].effective_limit(5), 5);
        assert_eq!(rules[0].heading(5), "Top 5 Vendedores com Mais Vendas");
    }

    #[test]
    fn test_rule_skipped_without_columns() {
        let roles = ColumnRoles {
            numeric: vec!["Vendas".into()],
            ..Default::default()
        };
        assert!(RankingRule::sales_defaults()
            .iter()
            .all(|r| r.resolve(&roles).is_none()));
    }

    #[test]
    fn test_explicit_limit_and_literal_title() {
        let rule = RankingRule::new(
            "top_regions",
            "Melhores Regiões",
            ColumnMatcher::categorical("Regiao"),
            ColumnMatcher::numeric("Vendas"),
            RankOrder::Descending,
            Some(2),
        );
        assert_eq!(rule.effective_limit(5), 2);
        assert_eq!(rule.heading(2), "Melhores Regiões");

        let parsed: RankingRule = serde_json::from_str(
            r#"{"key": "k", "title": "Top {limit}", "group": {"names": ["Regiao"], "role": "Categorical"},
                "metric": {"names": ["Vendas"], "role": "Numeric"}, "order": "descending"}"#,
        )
        .unwrap();
        assert_eq!(parsed.limit, None);
        assert_eq!(parsed.heading(7), "Top 7");
    }
}
