//! CSV loading with Arrow schema inference.

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::Array;
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::DataSource;
use crate::analyzers::temporal::{is_text_type, parse_lenient};
use crate::dataset::Dataset;
use crate::error::{ErrorContext, ExploreError, Result};

/// Options for reading CSV content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Field delimiter
    pub delimiter: u8,
    /// Whether the first line holds column names
    pub has_header: bool,
    /// Text columns whose lowercased name contains one of these are parsed as dates
    pub date_name_hints: Vec<String>,
    /// Rows read for schema inference (`None` reads everything)
    pub infer_rows: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            date_name_hints: vec!["data".to_string(), "date".to_string()],
            infer_rows: Some(1000),
        }
    }
}

#[derive(Debug, Clone)]
enum Origin {
    Path(PathBuf),
    Bytes(Arc<Vec<u8>>),
}

/// A CSV file on disk or already in memory.
#[derive(Debug, Clone)]
pub struct CsvSource {
    name: String,
    origin: Origin,
    options: CsvOptions,
}

impl CsvSource {
    /// Creates a source for a file path.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(ExploreError::load("CSV path cannot be empty"));
        }
        Ok(Self {
            name: path.display().to_string(),
            origin: Origin::Path(path),
            options: CsvOptions::default(),
        })
    }

    /// Creates a source over in-memory content, e.g. an uploaded file.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            origin: Origin::Bytes(Arc::new(bytes.into())),
            options: CsvOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CsvOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Raw content of the source.
    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.origin {
            Origin::Bytes(bytes) => Ok(bytes.as_ref().clone()),
            Origin::Path(path) => tokio::fs::read(path).await.map_err(|e| {
                ExploreError::load_with_source(format!("could not read '{}'", path.display()), Box::new(e))
            }),
        }
    }

    /// Parses CSV content into a dataset.
    #[instrument(skip(bytes, options), fields(size = bytes.len()))]
    pub fn parse(bytes: &[u8], options: &CsvOptions) -> Result<Dataset> {
        let format = Format::default()
            .with_header(options.has_header)
            .with_delimiter(options.delimiter);

        let (schema, inferred_rows) = format
            .infer_schema(Cursor::new(bytes), options.infer_rows)
            .map_err(|e| ExploreError::load_with_source("could not infer the CSV schema", Box::new(e)))?;
        if schema.fields().is_empty() {
            return Err(ExploreError::load("the file has no columns"));
        }
        debug!(columns = schema.fields().len(), inferred_rows, "Inferred CSV schema");

        let schema = Arc::new(schema);
        let reader = ReaderBuilder::new(schema.clone())
            .with_format(format)
            .build(Cursor::new(bytes))?;
        let batches = reader
            .collect::<std::result::Result<Vec<RecordBatch>, _>>()
            .map_err(|e| ExploreError::load_with_source("malformed CSV content", Box::new(e)))?;

        let dataset = Dataset::try_new(schema, batches)
            .context("CSV content does not form a valid table")?;
        coerce_date_named_columns(dataset, &options.date_name_hints)
    }
}

/// Parses text columns named like dates, turning unparseable values into nulls.
fn coerce_date_named_columns(mut dataset: Dataset, hints: &[String]) -> Result<Dataset> {
    let candidates: Vec<String> = dataset
        .schema()
        .fields()
        .iter()
        .filter(|f| is_text_type(f.data_type()))
        .map(|f| f.name().to_string())
        .filter(|name| {
            let lower = name.to_lowercase();
            hints.iter().any(|hint| lower.contains(&hint.to_lowercase()))
        })
        .collect();

    for name in candidates {
        match parse_lenient(&dataset.column(&name)?) {
            Ok(Some(parsed)) => {
                debug!(column = %name, invalid = parsed.null_count(), "Coerced date column");
                dataset = dataset.replace_column(&name, parsed)?;
            }
            Ok(None) => debug!(column = %name, "No parseable dates, keeping text"),
            Err(e) => warn!(column = %name, error = %e, "Date coercion failed"),
        }
    }
    Ok(dataset)
}

#[async_trait]
impl DataSource for CsvSource {
    #[instrument(skip(self), fields(source = %self.name))]
    async fn load(&self) -> Result<Dataset> {
        let bytes = self.read_bytes().await?;
        let dataset = Self::parse(&bytes, &self.options)?;
        info!(
            rows = dataset.num_rows(),
            columns = dataset.num_columns(),
            "Loaded CSV"
        );
        Ok(dataset)
    }

    fn description(&self) -> String {
        format!("CSV source '{}'", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::temporal::is_temporal_type;
    use arrow::datatypes::DataType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SALES: &str = "Data_Venda,Vendedor,Vendas\n\
                         15/01/2024,Ana,100\n\
                         16/01/2024,Bia,200\n\
                         ontem,Ana,300\n";

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SALES.as_bytes()).unwrap();

        let source = CsvSource::new(file.path()).unwrap();
        let dataset = source.load().await.unwrap();

        assert_eq!(dataset.num_rows(), 3);
        assert_eq!(dataset.column_names(), vec!["Data_Venda", "Vendedor", "Vendas"]);
        assert_eq!(dataset.data_type("Vendas"), Some(&DataType::Int64));
        assert!(is_temporal_type(dataset.data_type("Data_Venda").unwrap()));
        assert_eq!(dataset.column("Data_Venda").unwrap().null_count(), 1);
        assert!(source.description().contains("CSV source"));
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let source = CsvSource::new("/definitely/not/here.csv").unwrap();
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, ExploreError::Load { .. }));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let options = CsvOptions {
            delimiter: b';',
            ..Default::default()
        };
        let dataset = CsvSource::parse(b"Regiao;Valor\nSul;1.5\nNorte;2.5\n", &options).unwrap();
        assert_eq!(dataset.num_columns(), 2);
        assert_eq!(dataset.data_type("Valor"), Some(&DataType::Float64));
    }

    #[test]
    fn test_hint_requires_text_column() {
        let dataset = CsvSource::parse(b"Data,Quantidade\nabc,1\n", &CsvOptions::default()).unwrap();
        // No value parses, so the column stays text.
        assert_eq!(dataset.data_type("Data"), Some(&DataType::Utf8));
    }

    #[test]
    fn test_empty_content_is_load_error() {
        let err = CsvSource::parse(b"", &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, ExploreError::Load { .. }));
    }

    #[test]
    fn test_duplicate_header_is_load_error() {
        let err = CsvSource::parse(b"a,a\n1,2\n", &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, ExploreError::Load { .. }));
    }
}
