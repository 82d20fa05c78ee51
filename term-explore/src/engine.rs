//! The analysis engine: classification, heuristics and report assembly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::analyzers::{default_heuristics, AnalysisInput, ColumnClassifier, Heuristic};
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::error::Result;
use crate::filters::{FilterLayer, FilterSelection};
use crate::logging::{truncate_field, LogConfig};
use crate::report::{AnalysisOutput, ReportAssembler};

/// Type alias for progress callback function.
pub type ProgressCallback = Arc<dyn Fn(&AnalysisProgress) + Send + Sync>;

/// Progress information reported after every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisProgress {
    /// Number of stages finished so far, starting at 1
    pub stage: usize,
    pub total_stages: usize,
    pub message: String,
}

impl AnalysisProgress {
    /// Completed share of the run, between 0.0 and 1.0.
    pub fn fraction(&self) -> f64 {
        if self.total_stages == 0 {
            1.0
        } else {
            self.stage as f64 / self.total_stages as f64
        }
    }
}

/// Runs the heuristics over a dataset and assembles the report.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use arrow::array::{ArrayRef, Int64Array};
/// use term_explore::dataset::Dataset;
/// use term_explore::engine::InsightEngine;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let dataset = Dataset::from_columns(vec![(
///     "Vendas",
///     Arc::new(Int64Array::from(vec![100, 200, 300, 900, 110])) as ArrayRef,
/// )])
/// .unwrap();
///
/// let engine = InsightEngine::builder()
///     .on_progress(|progress| {
///         println!("{:.0}% {}", progress.fraction() * 100.0, progress.message);
///     })
///     .build();
///
/// let output = engine.run(&dataset).await.unwrap();
/// println!("{}", output.report.text());
/// # })
/// ```
pub struct InsightEngine {
    config: EngineConfig,
    classifier: ColumnClassifier,
    heuristics: Vec<Box<dyn Heuristic>>,
    log_config: LogConfig,
    on_progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for InsightEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightEngine")
            .field("config", &self.config)
            .field("classifier", &self.classifier)
            .field("heuristics", &self.heuristics)
            .field("log_config", &self.log_config)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Creates an engine with the default configuration and no progress callback.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> InsightEngineBuilder {
        InsightEngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of stages, and therefore of progress reports, per run.
    pub fn stage_count(&self) -> usize {
        self.heuristics.len()
    }

    /// Analyzes the dataset.
    ///
    /// Stages run strictly in order and the progress callback fires once per
    /// stage, including stages that do not apply. Any stage error aborts the
    /// run and nothing is returned but the error.
    #[instrument(skip(self, dataset), fields(rows = dataset.num_rows(), columns = dataset.num_columns()))]
    pub async fn run(&self, dataset: &Dataset) -> Result<AnalysisOutput> {
        self.config.validate()?;
        info!("Starting analysis with {} stages", self.heuristics.len());

        let (prepared, roles) = self.classifier.prepare(dataset)?;
        let ctx = prepared.session_context()?;
        let input = AnalysisInput {
            dataset: &prepared,
            ctx: &ctx,
            roles: &roles,
            config: &self.config,
        };

        let total_stages = self.heuristics.len();
        let mut assembler = ReportAssembler::new();

        for (idx, heuristic) in self.heuristics.iter().enumerate() {
            if heuristic.is_applicable(&input) {
                debug!(heuristic = heuristic.name(), "Running heuristic");
                let outcome = heuristic.analyze(&input).await?;
                if let Some(ref section) = outcome.section {
                    crate::log_heuristic!(
                        self.log_config,
                        heuristic = heuristic.name(),
                        lines = section.lines.len(),
                        first_line = %truncate_field(
                            section.lines.first().map(String::as_str).unwrap_or_default(),
                            self.log_config.max_field_length
                        ),
                        "Heuristic produced a section"
                    );
                }
                assembler.add(outcome);
            } else {
                debug!(heuristic = heuristic.name(), "Heuristic does not apply");
            }

            self.report_progress(AnalysisProgress {
                stage: idx + 1,
                total_stages,
                message: heuristic.progress_message().to_string(),
            });
        }

        info!(sections = assembler.section_count(), "Analysis completed");
        Ok(assembler.finish())
    }

    /// Applies the filter selection, then analyzes the remaining rows.
    #[instrument(skip(self, dataset, selection))]
    pub async fn run_filtered(
        &self,
        dataset: &Dataset,
        selection: &FilterSelection,
    ) -> Result<AnalysisOutput> {
        let filtered = FilterLayer::new().apply(dataset, selection).await?;
        crate::log_data_op!(
            self.log_config,
            rows_before = dataset.num_rows(),
            rows_after = filtered.num_rows(),
            "Applied filter selection"
        );
        self.run(&filtered).await
    }

    fn report_progress(&self, progress: AnalysisProgress) {
        debug!(
            stage = progress.stage,
            total = progress.total_stages,
            message = %progress.message,
            "Stage finished"
        );
        if let Some(ref callback) = self.on_progress {
            callback(&progress);
        }
    }
}

/// Builder for [`InsightEngine`].
#[derive(Default)]
pub struct InsightEngineBuilder {
    config: EngineConfig,
    detect_text_temporals: Option<bool>,
    heuristics: Option<Vec<Box<dyn Heuristic>>>,
    log_config: LogConfig,
    on_progress: Option<ProgressCallback>,
}

impl InsightEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables or disables promotion of date-like text columns to temporal.
    pub fn detect_text_temporals(mut self, enable: bool) -> Self {
        self.detect_text_temporals = Some(enable);
        self
    }

    /// Replaces the default heuristics. They run in the given order.
    pub fn heuristics(mut self, heuristics: Vec<Box<dyn Heuristic>>) -> Self {
        self.heuristics = Some(heuristics);
        self
    }

    pub fn log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Sets a callback invoked after every stage.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&AnalysisProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> InsightEngine {
        let mut classifier = ColumnClassifier::new();
        if let Some(enable) = self.detect_text_temporals {
            classifier = classifier.detect_text_temporals(enable);
        }

        InsightEngine {
            config: self.config,
            classifier,
            heuristics: self.heuristics.unwrap_or_else(default_heuristics),
            log_config: self.log_config,
            on_progress: self.on_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExploreError;
    use crate::report::SectionKind;
    use arrow::array::{ArrayRef, Int64Array, StringArray};
    use std::sync::Mutex;

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            (
                "Vendedor",
                Arc::new(StringArray::from(vec!["Ana", "Bia", "Ana"])) as ArrayRef,
            ),
            ("Vendas", Arc::new(Int64Array::from(vec![10, 20, 30])) as ArrayRef),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_progress_reported_for_every_stage() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let engine = InsightEngine::builder()
            .on_progress(move |progress| {
                seen_clone.lock().unwrap().push(progress.clone());
            })
            .build();
        engine.run(&dataset()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), engine.stage_count());
        let stages: Vec<usize> = seen.iter().map(|p| p.stage).collect();
        assert_eq!(stages, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(seen.last().unwrap().fraction(), 1.0);
        assert!(seen.iter().all(|p| !p.message.is_empty()));
    }

    #[tokio::test]
    async fn test_sections_in_fixed_order() {
        let output = InsightEngine::new().run(&dataset()).await.unwrap();
        let kinds: Vec<SectionKind> = output.report.sections().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Overview,
                SectionKind::ColumnTypes,
                SectionKind::Outliers,
                SectionKind::CategoryLeaders,
                SectionKind::Leaderboards,
            ]
        );
        assert!(output.bundle.contains_key("top_sellers"));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let engine = InsightEngine::builder()
            .config(EngineConfig::default().with_correlation_threshold(2.0))
            .build();
        let err = engine.run(&dataset()).await.unwrap_err();
        assert!(matches!(err, ExploreError::Configuration(_)));
    }

    #[test]
    fn test_fraction() {
        let progress = AnalysisProgress {
            stage: 2,
            total_stages: 8,
            message: String::new(),
        };
        assert_eq!(progress.fraction(), 0.25);
    }
}
