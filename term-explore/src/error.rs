//! Error types for the term-explore analysis engine.
//!
//! All errors surfaced by the public API are represented by [`ExploreError`].
//! Heuristics report failures through [`AnalyzerError`](crate::analyzers::AnalyzerError),
//! which the engine wraps into [`ExploreError::Analysis`] at its boundary.

use thiserror::Error;

use crate::analyzers::AnalyzerError;

/// Hint shown next to every user-facing error message.
pub const INPUT_FORMAT_HINT: &str =
    "Verifique se o arquivo está formatado corretamente e tente novamente.";

/// The main error type for term-explore.
#[derive(Error, Debug)]
pub enum ExploreError {
    /// The dataset could not be loaded or violates the table invariants.
    #[error("Load error: {message}")]
    Load {
        /// Human-readable error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A heuristic failed on unexpected data. The whole analysis is discarded.
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalyzerError),

    /// The export document could not be produced.
    #[error("Export error: {0}")]
    Export(String),

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A required column is not present in the dataset.
    #[error("Column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// An identifier could not be used safely in a query.
    #[error("Security error: {0}")]
    Security(String),
}

/// A type alias for `Result<T, ExploreError>`.
pub type Result<T> = std::result::Result<T, ExploreError>;

impl ExploreError {
    /// Creates a load error with the given message.
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a load error wrapping an underlying error.
    pub fn load_with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Load {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates an export error with the given message.
    pub fn export(message: impl Into<String>) -> Self {
        Self::Export(message.into())
    }

    /// Creates a configuration error with the given message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Converts the error into the message shown to the person running the analysis,
    /// together with a secondary hint.
    pub fn user_message(&self) -> (String, &'static str) {
        let message = match self {
            ExploreError::Load { message, .. } => {
                format!("Erro ao ler o arquivo: {message}")
            }
            ExploreError::Export(message) => {
                format!("Não foi possível gerar o relatório para download: {message}")
            }
            other => format!("Ocorreu um erro durante a análise dos dados: {other}"),
        };
        (message, INPUT_FORMAT_HINT)
    }
}

impl From<serde_json::Error> for ExploreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<ExploreError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            ExploreError::Load { message, source } => ExploreError::Load {
                message: format!("{}: {message}", f()),
                source,
            },
            ExploreError::Export(message) => ExploreError::Export(format!("{}: {message}", f())),
            ExploreError::Configuration(message) => {
                ExploreError::Configuration(format!("{}: {message}", f()))
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_load_error() {
        let err = ExploreError::load("duplicate column 'Vendas'");
        assert_eq!(err.to_string(), "Load error: duplicate column 'Vendas'");
    }

    #[test]
    fn test_load_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err = ExploreError::load_with_source("could not open file", Box::new(source));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_column_not_found() {
        let err = ExploreError::ColumnNotFound {
            column: "Vendas".to_string(),
        };
        assert_eq!(err.to_string(), "Column 'Vendas' not found in dataset");
    }

    #[test]
    fn test_analysis_error_user_message() {
        let err = ExploreError::from(AnalyzerError::invalid_data("non-numeric value"));
        let (message, hint) = err.user_message();
        assert!(message.starts_with("Ocorreu um erro durante a análise dos dados"));
        assert!(message.contains("non-numeric value"));
        assert_eq!(hint, INPUT_FORMAT_HINT);
    }

    #[test]
    fn test_load_error_user_message() {
        let (message, _) = ExploreError::load("bad header").user_message();
        assert_eq!(message, "Erro ao ler o arquivo: bad header");
    }

    #[test]
    fn test_error_context() {
        fn failing_operation() -> Result<()> {
            Err(ExploreError::load("truncated row"))
        }

        let err = failing_operation().context("Reading vendas.csv").unwrap_err();
        assert_eq!(err.to_string(), "Load error: Reading vendas.csv: truncated row");
    }
}
