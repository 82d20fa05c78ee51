//! Prelude for commonly used types and traits in term-explore.

pub use crate::charts::{ChartPlan, ChartSpec};
pub use crate::config::{EngineConfig, FilterConfig};
pub use crate::dataset::Dataset;
pub use crate::engine::{AnalysisProgress, InsightEngine};
pub use crate::error::{ErrorContext, ExploreError, Result};
pub use crate::export::ExportDocument;
pub use crate::filters::{FilterLayer, FilterSelection};
pub use crate::formatters::{FormatterConfig, ReportFormatter};
pub use crate::logging::LogConfig;
pub use crate::report::{AnalysisOutput, Report, ResultBundle};
pub use crate::sources::{CsvSource, DataSource, DatasetCache};
