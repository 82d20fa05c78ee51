//! SQL helpers used by the heuristics to read from the registered dataset.

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, UInt64Array};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use datafusion::prelude::SessionContext;
use tracing::debug;

use super::errors::{AnalyzerError, AnalyzerResult};
use super::schema::RankOrder;
use crate::dataset::TABLE_NAME;
use crate::report::RankedEntry;
use crate::security::SqlSecurity;

/// Escapes a column name for use in generated SQL.
pub fn quoted(column: &str) -> AnalyzerResult<String> {
    SqlSecurity::escape_identifier(column)
        .map_err(|e| AnalyzerError::invalid_data(format!("Invalid column name '{column}': {e}")))
}

/// Runs a query and collects every batch.
pub async fn collect(ctx: &SessionContext, sql: &str) -> AnalyzerResult<Vec<RecordBatch>> {
    debug!(sql = sql, "Executing analysis query");
    let df = ctx.sql(sql).await?;
    Ok(df.collect().await?)
}

/// Reads the first cell of a single-row count query.
pub async fn scalar_u64(ctx: &SessionContext, sql: &str) -> AnalyzerResult<u64> {
    let batches = collect(ctx, sql).await?;
    let batch = batches
        .iter()
        .find(|b| b.num_rows() > 0)
        .ok_or_else(|| AnalyzerError::invalid_data("query returned no rows"))?;
    extract_u64(batch.column(0), 0)
}

/// Reads an integer cell, accepting the signed and unsigned 64-bit encodings.
pub fn extract_u64(column: &ArrayRef, row: usize) -> AnalyzerResult<u64> {
    if column.is_null(row) {
        return Ok(0);
    }
    if let Some(arr) = column.as_any().downcast_ref::<Int64Array>() {
        Ok(arr.value(row).max(0) as u64)
    } else if let Some(arr) = column.as_any().downcast_ref::<UInt64Array>() {
        Ok(arr.value(row))
    } else {
        Err(AnalyzerError::invalid_data(format!(
            "expected an integer, found {}",
            column.data_type()
        )))
    }
}

/// Reads a column of batches as optional doubles.
pub fn f64_values(batches: &[RecordBatch], col_idx: usize) -> AnalyzerResult<Vec<Option<f64>>> {
    let mut values = Vec::new();
    for batch in batches {
        let column = arrow::compute::cast(batch.column(col_idx), &DataType::Float64)?;
        let column = column
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| AnalyzerError::invalid_data("failed to read numeric values"))?;
        values.extend(column.iter());
    }
    Ok(values)
}

/// Renders any cell as text.
pub fn string_at(column: &ArrayRef, row: usize) -> AnalyzerResult<String> {
    Ok(array_value_to_string(column, row)?)
}

/// All values of a numeric column, in row order, as doubles.
pub async fn numeric_values(
    ctx: &SessionContext,
    column: &str,
) -> AnalyzerResult<Vec<Option<f64>>> {
    let col = quoted(column)?;
    let sql = format!("SELECT CAST({col} AS DOUBLE) AS value FROM {TABLE_NAME}");
    let batches = collect(ctx, &sql).await?;
    f64_values(&batches, 0)
}

/// Number of distinct non-null values in a column.
pub async fn distinct_count(ctx: &SessionContext, column: &str) -> AnalyzerResult<u64> {
    let col = quoted(column)?;
    let sql = format!("SELECT COUNT(DISTINCT {col}) AS distinct_count FROM {TABLE_NAME}");
    scalar_u64(ctx, &sql).await
}

/// Distinct non-null values of a column rendered as text, sorted, at most `limit`.
pub async fn distinct_values(
    ctx: &SessionContext,
    column: &str,
    limit: usize,
) -> AnalyzerResult<Vec<String>> {
    let col = quoted(column)?;
    let sql = format!(
        "SELECT DISTINCT CAST({col} AS VARCHAR) AS value
         FROM {TABLE_NAME}
         WHERE {col} IS NOT NULL
         ORDER BY value
         LIMIT {limit}"
    );
    let batches = collect(ctx, &sql).await?;

    let mut values = Vec::new();
    for batch in &batches {
        for row in 0..batch.num_rows() {
            values.push(string_at(batch.column(0), row)?);
        }
    }
    Ok(values)
}

/// Groups by `group` and sums `metric`, returning at most `limit` groups ranked
/// by total. Ties are broken by label, and the ascending ranking is the exact
/// reverse of the descending one, so top and bottom lists of a table with at
/// least twice `limit` groups never share a group.
pub async fn grouped_sums(
    ctx: &SessionContext,
    group: &str,
    metric: &str,
    order: RankOrder,
    limit: Option<usize>,
) -> AnalyzerResult<Vec<RankedEntry>> {
    let group_col = quoted(group)?;
    let metric_col = quoted(metric)?;
    let ordering = match order {
        RankOrder::Descending => "total DESC, label ASC",
        RankOrder::Ascending => "total ASC, label DESC",
    };
    let limit_clause = limit.map(|n| format!("LIMIT {n}")).unwrap_or_default();

    let sql = format!(
        "SELECT label, COALESCE(SUM(amount), 0.0) AS total
         FROM (
             SELECT CAST({group_col} AS VARCHAR) AS label,
                    CAST({metric_col} AS DOUBLE) AS amount
             FROM {TABLE_NAME}
             WHERE {group_col} IS NOT NULL
         ) grouped
         GROUP BY label
         ORDER BY {ordering}
         {limit_clause}"
    );
    let batches = collect(ctx, &sql).await?;

    let mut entries = Vec::new();
    for batch in &batches {
        let totals = f64_values(std::slice::from_ref(batch), 1)?;
        for (row, total) in totals.into_iter().enumerate() {
            entries.push(RankedEntry {
                label: string_at(batch.column(0), row)?,
                total: total.unwrap_or(0.0),
            });
        }
    }
    Ok(entries)
}
