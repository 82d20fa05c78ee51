//! In-memory tabular dataset handed to the engine.
//!
//! A [`Dataset`] is an ordered set of uniquely named Arrow columns of equal
//! length. Heuristics query it through a DataFusion [`SessionContext`] in which
//! the data is registered under [`TABLE_NAME`].

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use tracing::debug;

use crate::error::{ExploreError, Result};

/// Name under which the dataset is registered for SQL queries.
pub const TABLE_NAME: &str = "data";

/// An immutable, column-ordered table.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Dataset {
    /// Creates a dataset from a schema and record batches sharing that schema.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        validate_unique_names(&schema)?;

        for batch in &batches {
            let batch_schema = batch.schema();
            let matches = batch_schema.fields().len() == schema.fields().len()
                && batch_schema
                    .fields()
                    .iter()
                    .zip(schema.fields().iter())
                    .all(|(a, b)| a.name() == b.name() && a.data_type() == b.data_type());
            if !matches {
                return Err(ExploreError::load(
                    "record batch schema does not match the dataset schema",
                ));
            }
        }

        Ok(Self { schema, batches })
    }

    /// Creates a dataset from a single record batch.
    pub fn from_batch(batch: RecordBatch) -> Result<Self> {
        Self::try_new(batch.schema(), vec![batch])
    }

    /// Creates a dataset from named columns.
    ///
    /// Fails with a load error when two columns share a name or when the
    /// columns have different lengths.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ArrayRef)>,
        S: Into<String>,
    {
        let mut fields = Vec::new();
        let mut arrays = Vec::new();
        for (name, array) in columns {
            fields.push(Field::new(name.into(), array.data_type().clone(), true));
            arrays.push(array);
        }

        let schema = Arc::new(Schema::new(fields));
        validate_unique_names(&schema)?;

        let row_count = arrays.first().map(|a| a.len()).unwrap_or(0);
        if let Some((idx, array)) = arrays
            .iter()
            .enumerate()
            .find(|(_, a)| a.len() != row_count)
        {
            return Err(ExploreError::load(format!(
                "column '{}' has {} rows, expected {row_count}",
                schema.field(idx).name(),
                array.len()
            )));
        }

        let options = RecordBatchOptions::new().with_row_count(Some(row_count));
        let batch = RecordBatch::try_new_with_options(schema.clone(), arrays, &options)?;
        Ok(Self {
            schema,
            batches: vec![batch],
        })
    }

    /// Creates a dataset with the given schema and no rows.
    pub fn empty(schema: SchemaRef) -> Result<Self> {
        Self::try_new(schema, Vec::new())
    }

    /// Returns the schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Returns the underlying record batches.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Total number of rows.
    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Column names in dataset order.
    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    /// Returns the Arrow type of a column, if present.
    pub fn data_type(&self, name: &str) -> Option<&DataType> {
        self.schema
            .field_with_name(name)
            .ok()
            .map(|field| field.data_type())
    }

    /// Returns a column as one contiguous array.
    pub fn column(&self, name: &str) -> Result<ArrayRef> {
        let idx = self
            .schema
            .index_of(name)
            .map_err(|_| ExploreError::ColumnNotFound {
                column: name.to_string(),
            })?;

        if self.batches.is_empty() {
            return Ok(arrow::array::new_empty_array(
                self.schema.field(idx).data_type(),
            ));
        }

        let parts: Vec<&dyn Array> = self.batches.iter().map(|b| b.column(idx).as_ref()).collect();
        Ok(arrow::compute::concat(&parts)?)
    }

    /// Concatenates all batches into a single record batch.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        Ok(arrow::compute::concat_batches(&self.schema, &self.batches)?)
    }

    /// Returns a copy of the dataset where one column is replaced by `array`.
    ///
    /// The replacement may change the column type but must keep the row count.
    pub fn replace_column(&self, name: &str, array: ArrayRef) -> Result<Self> {
        let idx = self
            .schema
            .index_of(name)
            .map_err(|_| ExploreError::ColumnNotFound {
                column: name.to_string(),
            })?;

        let batch = self.to_record_batch()?;
        if array.len() != batch.num_rows() {
            return Err(ExploreError::load(format!(
                "replacement for column '{name}' has {} rows, expected {}",
                array.len(),
                batch.num_rows()
            )));
        }

        let mut fields: Vec<Field> = self
            .schema
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        fields[idx] = Field::new(name, array.data_type().clone(), true);

        let mut columns = batch.columns().to_vec();
        columns[idx] = array;

        let schema = Arc::new(Schema::new(fields));
        let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
        let batch = RecordBatch::try_new_with_options(schema.clone(), columns, &options)?;
        Ok(Self {
            schema,
            batches: vec![batch],
        })
    }

    /// Registers the dataset as [`TABLE_NAME`] in a fresh session context.
    pub fn session_context(&self) -> Result<SessionContext> {
        let ctx = SessionContext::new();
        self.register(&ctx, TABLE_NAME)?;
        Ok(ctx)
    }

    /// Registers the dataset in an existing context under `table_name`.
    pub fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()> {
        let provider = MemTable::try_new(self.schema.clone(), vec![self.batches.clone()])?;
        ctx.register_table(table_name, Arc::new(provider))?;
        debug!(
            table = table_name,
            rows = self.num_rows(),
            columns = self.num_columns(),
            "Registered dataset"
        );
        Ok(())
    }
}

fn validate_unique_names(schema: &Schema) -> Result<()> {
    let mut seen = HashSet::new();
    for field in schema.fields() {
        if !seen.insert(field.name().as_str()) {
            return Err(ExploreError::load(format!(
                "duplicate column name '{}'",
                field.name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            (
                "Vendas",
                Arc::new(Int64Array::from(vec![100, 200, 300])) as ArrayRef,
            ),
            (
                "Regiao",
                Arc::new(StringArray::from(vec!["Sul", "Norte", "Sul"])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns() {
        let dataset = sample();
        assert_eq!(dataset.num_rows(), 3);
        assert_eq!(dataset.num_columns(), 2);
        assert_eq!(dataset.column_names(), vec!["Vendas", "Regiao"]);
        assert_eq!(dataset.data_type("Vendas"), Some(&DataType::Int64));
    }

    #[test]
    fn test_mismatched_lengths_is_load_error() {
        let result = Dataset::from_columns(vec![
            ("a", Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef),
            ("b", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
        ]);
        assert!(matches!(result, Err(ExploreError::Load { .. })));
    }

    #[test]
    fn test_duplicate_names_is_load_error() {
        let result = Dataset::from_columns(vec![
            ("a", Arc::new(Int64Array::from(vec![1])) as ArrayRef),
            ("a", Arc::new(Int64Array::from(vec![2])) as ArrayRef),
        ]);
        assert!(matches!(result, Err(ExploreError::Load { .. })));
    }

    #[test]
    fn test_no_columns() {
        let dataset = Dataset::from_columns(Vec::<(String, ArrayRef)>::new()).unwrap();
        assert_eq!(dataset.num_rows(), 0);
        assert_eq!(dataset.num_columns(), 0);
    }

    #[test]
    fn test_replace_column() {
        let dataset = sample();
        let replaced = dataset
            .replace_column(
                "Vendas",
                Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])) as ArrayRef,
            )
            .unwrap();
        assert_eq!(replaced.data_type("Vendas"), Some(&DataType::Float64));
        assert_eq!(replaced.column_names(), dataset.column_names());

        let too_short = dataset.replace_column(
            "Vendas",
            Arc::new(Float64Array::from(vec![1.0])) as ArrayRef,
        );
        assert!(too_short.is_err());
    }

    #[test]
    fn test_column_missing() {
        let err = sample().column("Lucro").unwrap_err();
        assert!(matches!(err, ExploreError::ColumnNotFound { .. }));
    }

    #[tokio::test]
    async fn test_session_context() {
        let ctx = sample().session_context().unwrap();
        let batches = ctx
            .sql("SELECT COUNT(*) FROM data")
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        let count = batches[0]
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .value(0);
        assert_eq!(count, 3);
    }
}
