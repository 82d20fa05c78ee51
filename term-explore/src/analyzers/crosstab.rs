//! Frequency views over categorical columns.

use std::collections::{BTreeMap, BTreeSet};

use datafusion::prelude::SessionContext;
use tracing::instrument;

use super::errors::AnalyzerResult;
use super::query;
use crate::dataset::{Dataset, TABLE_NAME};
use crate::error::{ExploreError, Result};
use crate::report::{CrossTab, RankedEntry};

fn ensure_column(dataset: &Dataset, column: &str) -> Result<()> {
    if dataset.data_type(column).is_none() {
        return Err(ExploreError::ColumnNotFound {
            column: column.to_string(),
        });
    }
    Ok(())
}

/// Counts rows for every pair of values of two columns.
///
/// Rows where either column is null are not counted. Labels are sorted.
#[instrument(skip(dataset))]
pub async fn cross_tabulate(
    dataset: &Dataset,
    row_column: &str,
    column_column: &str,
) -> Result<CrossTab> {
    ensure_column(dataset, row_column)?;
    ensure_column(dataset, column_column)?;

    let ctx = dataset.session_context()?;
    Ok(frequency_table(&ctx, row_column, column_column).await?)
}

/// [`cross_tabulate`] over a registered table.
pub(crate) async fn frequency_table(
    ctx: &SessionContext,
    row_column: &str,
    column_column: &str,
) -> AnalyzerResult<CrossTab> {
    let row_col = query::quoted(row_column)?;
    let col_col = query::quoted(column_column)?;
    let sql = format!(
        "SELECT row_label, column_label, COUNT(*) AS frequency
         FROM (
             SELECT CAST({row_col} AS VARCHAR) AS row_label,
                    CAST({col_col} AS VARCHAR) AS column_label
             FROM {TABLE_NAME}
             WHERE {row_col} IS NOT NULL AND {col_col} IS NOT NULL
         ) pairs
         GROUP BY row_label, column_label"
    );

    let batches = query::collect(ctx, &sql).await?;

    let mut cells = BTreeMap::new();
    let mut row_labels = BTreeSet::new();
    let mut column_labels = BTreeSet::new();
    for batch in &batches {
        for row in 0..batch.num_rows() {
            let r = query::string_at(batch.column(0), row)?;
            let c = query::string_at(batch.column(1), row)?;
            let n = query::extract_u64(batch.column(2), row)?;
            row_labels.insert(r.clone());
            column_labels.insert(c.clone());
            cells.insert((r, c), n);
        }
    }

    let row_labels: Vec<String> = row_labels.into_iter().collect();
    let column_labels: Vec<String> = column_labels.into_iter().collect();
    let counts = row_labels
        .iter()
        .map(|r| {
            column_labels
                .iter()
                .map(|c| cells.get(&(r.clone(), c.clone())).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    Ok(CrossTab {
        row_column: row_column.to_string(),
        column_column: column_column.to_string(),
        row_labels,
        column_labels,
        counts,
    })
}

/// The `limit` most frequent non-null values of a column.
///
/// Equal counts are ordered by label.
#[instrument(skip(dataset))]
pub async fn value_counts(dataset: &Dataset, column: &str, limit: usize) -> Result<Vec<RankedEntry>> {
    ensure_column(dataset, column)?;

    let col = query::quoted(column)?;
    let sql = format!(
        "SELECT label, COUNT(*) AS frequency
         FROM (
             SELECT CAST({col} AS VARCHAR) AS label
             FROM {TABLE_NAME}
             WHERE {col} IS NOT NULL
         ) present
         GROUP BY label
         ORDER BY frequency DESC, label ASC
         LIMIT {limit}"
    );

    let ctx = dataset.session_context()?;
    let batches = query::collect(&ctx, &sql).await?;

    let mut entries = Vec::new();
    for batch in &batches {
        for row in 0..batch.num_rows() {
            entries.push(RankedEntry::new(
                query::string_at(batch.column(0), row)?,
                query::extract_u64(batch.column(1), row)? as f64,
            ));
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, StringArray};
    use std::sync::Arc;

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            (
                "Regiao",
                Arc::new(StringArray::from(vec![
                    Some("Sul"),
                    Some("Norte"),
                    Some("Sul"),
                    Some("Sul"),
                    None,
                ])) as ArrayRef,
            ),
            (
                "Canal",
                Arc::new(StringArray::from(vec![
                    Some("Web"),
                    Some("Loja"),
                    Some("Loja"),
                    Some("Web"),
                    Some("Web"),
                ])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_cross_tabulate() {
        let table = cross_tabulate(&dataset(), "Regiao", "Canal").await.unwrap();
        assert_eq!(table.row_labels, vec!["Norte", "Sul"]);
        assert_eq!(table.column_labels, vec!["Loja", "Web"]);
        assert_eq!(table.counts, vec![vec![1, 0], vec![1, 2]]);
        assert_eq!(table.total(), 4);
    }

    #[tokio::test]
    async fn test_value_counts() {
        let counts = value_counts(&dataset(), "Canal", 10).await.unwrap();
        assert_eq!(counts[0], RankedEntry::new("Web", 3.0));
        assert_eq!(counts[1], RankedEntry::new("Loja", 2.0));

        let top = value_counts(&dataset(), "Regiao", 1).await.unwrap();
        assert_eq!(top, vec![RankedEntry::new("Sul", 3.0)]);
    }

    #[tokio::test]
    async fn test_missing_column() {
        let err = value_counts(&dataset(), "Produto", 5).await.unwrap_err();
        assert!(matches!(err, ExploreError::ColumnNotFound { .. }));
    }
}
