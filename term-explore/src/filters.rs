//! Row filters applied before the analysis runs.
//!
//! [`FilterLayer::derive_candidates`] inspects a dataset and offers one date
//! range (over the first temporal column) and one value set per categorical
//! column with fewer distinct values than the configured ceiling. The caller
//! narrows those candidates into a [`FilterSelection`], and
//! [`FilterLayer::apply`] keeps the rows matching every active predicate.
//!
//! Date ranges are closed on both ends and compared by calendar day. A range
//! whose start falls after its end selects nothing.

use std::collections::BTreeSet;

use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, NaiveDate};
use datafusion::prelude::{cast, ident, lit, Expr};
use datafusion::scalar::ScalarValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::analyzers::temporal::to_epoch_nanos;
use crate::analyzers::{query, ColumnClassifier, ColumnRole, ColumnRoles};
use crate::config::FilterConfig;
use crate::dataset::{Dataset, TABLE_NAME};
use crate::error::{ExploreError, Result};

/// Closed interval of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether the range selects no day at all.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Epoch nanoseconds of the first instant of `start`.
    fn lower_bound_nanos(&self) -> Result<i64> {
        midnight_nanos(self.start)
    }

    /// Epoch nanoseconds of the first instant after `end`.
    fn upper_bound_nanos(&self) -> Result<i64> {
        let next = self
            .end
            .succ_opt()
            .ok_or_else(|| ExploreError::configuration(format!("date {} is out of range", self.end)))?;
        midnight_nanos(next)
    }
}

fn midnight_nanos(day: NaiveDate) -> Result<i64> {
    day.and_hms_opt(0, 0, 0)
        .and_then(|dt| dt.and_utc().timestamp_nanos_opt())
        .ok_or_else(|| ExploreError::configuration(format!("date {day} is out of range")))
}

/// The date filter offered for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCandidate {
    pub column: String,
    /// First and last day present in the column.
    pub bounds: DateRange,
}

/// A categorical filter offered for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalCandidate {
    pub column: String,
    /// Distinct values, sorted.
    pub values: Vec<String>,
}

/// Every filter a dataset supports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCandidates {
    pub date: Option<DateCandidate>,
    pub categorical: Vec<CategoricalCandidate>,
}

impl FilterCandidates {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.categorical.is_empty()
    }

    /// The full date range and every value of every categorical candidate.
    pub fn default_selection(&self) -> FilterSelection {
        FilterSelection {
            date: self.date.as_ref().map(|d| DateSelection {
                column: d.column.clone(),
                range: d.bounds,
            }),
            categorical: self
                .categorical
                .iter()
                .map(|c| CategoricalSelection {
                    column: c.column.clone(),
                    values: c.values.iter().cloned().collect(),
                })
                .collect(),
        }
    }
}

/// An active date predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSelection {
    pub column: String,
    pub range: DateRange,
}

/// An active set-membership predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalSelection {
    pub column: String,
    pub values: BTreeSet<String>,
}

/// Predicates combined with AND. An empty selection keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub date: Option<DateSelection>,
    pub categorical: Vec<CategoricalSelection>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, column: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        self.date = Some(DateSelection {
            column: column.into(),
            range: DateRange::new(start, end),
        });
        self
    }

    pub fn with_values<I, S>(mut self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical.push(CategoricalSelection {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.categorical.is_empty()
    }
}

/// Derives and applies row filters.
#[derive(Debug, Clone, Default)]
pub struct FilterLayer {
    config: FilterConfig,
    classifier: ColumnClassifier,
}

impl FilterLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: FilterConfig) -> Self {
        self.config = config;
        self
    }

    /// Lists the filters the dataset supports.
    #[instrument(skip(self, dataset), fields(rows = dataset.num_rows()))]
    pub async fn derive_candidates(&self, dataset: &Dataset) -> Result<FilterCandidates> {
        let (prepared, roles) = self.classifier.prepare(dataset)?;
        let ctx = prepared.session_context()?;

        let mut candidates = FilterCandidates {
            date: date_candidate(&prepared, &roles)?,
            categorical: Vec::new(),
        };

        let ceiling = self.config.cardinality_ceiling;
        for column in &roles.categorical {
            let values = query::distinct_values(&ctx, column, ceiling).await?;
            if !values.is_empty() && values.len() < ceiling {
                candidates.categorical.push(CategoricalCandidate {
                    column: column.clone(),
                    values,
                });
            } else {
                debug!(column = %column, distinct = values.len(), "Column not offered as a filter");
            }
        }

        debug!(
            date = candidates.date.is_some(),
            categorical = candidates.categorical.len(),
            "Derived filter candidates"
        );
        Ok(candidates)
    }

    /// Keeps the rows matching every predicate of `selection`.
    ///
    /// An empty selection returns the dataset unchanged. Date-like text
    /// columns come back converted to timestamps.
    #[instrument(skip(self, dataset, selection), fields(rows = dataset.num_rows()))]
    pub async fn apply(&self, dataset: &Dataset, selection: &FilterSelection) -> Result<Dataset> {
        if selection.is_empty() {
            return Ok(dataset.clone());
        }

        let (prepared, roles) = self.classifier.prepare(dataset)?;
        let predicate = build_predicate(&prepared, &roles, selection)?;

        let ctx = prepared.session_context()?;
        let batches = ctx.table(TABLE_NAME).await?.filter(predicate)?.collect().await?;
        let filtered = Dataset::try_new(prepared.schema().clone(), batches)?;

        info!(
            before = dataset.num_rows(),
            after = filtered.num_rows(),
            "Applied filters"
        );
        Ok(filtered)
    }
}

fn date_candidate(dataset: &Dataset, roles: &ColumnRoles) -> Result<Option<DateCandidate>> {
    let Some(column) = roles.first_temporal() else {
        return Ok(None);
    };

    let nanos = to_epoch_nanos(&dataset.column(column)?)?;
    let present = nanos.iter().flatten();
    let (Some(min), Some(max)) = (present.clone().min(), present.max()) else {
        return Ok(None);
    };

    Ok(Some(DateCandidate {
        column: column.to_string(),
        bounds: DateRange::new(
            DateTime::from_timestamp_nanos(*min).date_naive(),
            DateTime::from_timestamp_nanos(*max).date_naive(),
        ),
    }))
}

fn ensure_role(roles: &ColumnRoles, column: &str, expected: ColumnRole) -> Result<()> {
    match roles.role_of(column) {
        None => Err(ExploreError::ColumnNotFound {
            column: column.to_string(),
        }),
        Some(role) if role != expected => Err(ExploreError::configuration(format!(
            "column '{column}' is {role:?}, expected {expected:?}"
        ))),
        Some(_) => Ok(()),
    }
}

fn build_predicate(dataset: &Dataset, roles: &ColumnRoles, selection: &FilterSelection) -> Result<Expr> {
    let mut predicates = Vec::new();

    if let Some(date) = &selection.date {
        ensure_role(roles, &date.column, ColumnRole::Temporal)?;
        if date.range.is_empty() {
            predicates.push(lit(false));
        } else {
            let moment = cast(
                ident(&date.column),
                DataType::Timestamp(TimeUnit::Nanosecond, None),
            );
            let lower = lit(ScalarValue::TimestampNanosecond(
                Some(date.range.lower_bound_nanos()?),
                None,
            ));
            let upper = lit(ScalarValue::TimestampNanosecond(
                Some(date.range.upper_bound_nanos()?),
                None,
            ));
            predicates.push(moment.clone().gt_eq(lower).and(moment.lt(upper)));
        }
    }

    for selected in &selection.categorical {
        if dataset.data_type(&selected.column).is_none() {
            return Err(ExploreError::ColumnNotFound {
                column: selected.column.clone(),
            });
        }
        if selected.values.is_empty() {
            predicates.push(lit(false));
            continue;
        }
        let values = selected.values.iter().map(|v| lit(v.as_str())).collect();
        predicates.push(cast(ident(&selected.column), DataType::Utf8).in_list(values, false));
    }

    Ok(predicates
        .into_iter()
        .reduce(Expr::and)
        .unwrap_or_else(|| lit(true)))
}
