//! # term-explore - Automatic exploratory analysis for tabular data
//!
//! term-explore looks at a table it has never seen and writes a short report
//! about it: how big it is, which columns are numbers, categories or dates,
//! which numeric columns move together, where the outliers are, whether
//! measures trend over time and which categories lead. The report is a
//! Portuguese markdown narrative, produced together with a bundle of
//! machine-usable results for charting and export.
//!
//! Queries run on DataFusion over Arrow record batches.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use term_explore::prelude::*;
//!
//! # async fn example() -> term_explore::Result<()> {
//! let dataset = CsvSource::new("vendas.csv")?.load().await?;
//!
//! let engine = InsightEngine::builder()
//!     .on_progress(|progress| println!("[{}/{}] {}", progress.stage, progress.total_stages, progress.message))
//!     .build();
//! let output = engine.run(&dataset).await?;
//!
//! println!("{}", output.report);
//! if let Some(top) = output.bundle.ranking("top_sellers") {
//!     println!("best seller: {}", top[0].label);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Report sections
//!
//! Sections always appear in this order; a section whose heuristic does not
//! apply is omitted:
//!
//! 1. Visão Geral do Dataset
//! 2. Tipos de Colunas
//! 3. Análise de Correlação
//! 4. Análise de Outliers
//! 5. Análise de Tendência Temporal
//! 6. Destaques por Categoria
//! 7. Rankings
//!
//! ## Filtering
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use term_explore::prelude::*;
//!
//! # async fn example(dataset: Dataset) -> term_explore::Result<()> {
//! let layer = FilterLayer::new();
//! let candidates = layer.derive_candidates(&dataset).await?;
//! let mut selection = candidates.default_selection();
//! if let Some(date) = &candidates.date {
//!     selection = selection.with_date_range(
//!         date.column.clone(),
//!         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
//!     );
//! }
//! let output = InsightEngine::new().run_filtered(&dataset, &selection).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`analyzers`**: column classification and the insight heuristics
//! - **`engine`**: runs the heuristics in order and reports progress
//! - **`report`**: narrative sections and the result bundle
//! - **`filters`**: date range and categorical row filters
//! - **`sources`**: CSV loading and the content-addressed dataset cache
//! - **`charts`**: declarative chart plans read from the bundle
//! - **`formatters`**: markdown, plain text and JSON output
//! - **`export`**: PDF report document with one page per chart image

pub mod analyzers;
pub mod charts;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod export;
pub mod filters;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod report;
pub mod security;
pub mod sources;

pub use error::{ExploreError, Result};
