//! Dataset loaders.
//!
//! Spreadsheet parsing stays with the caller; this module reads CSV through
//! Arrow and memoizes loads by content hash.

use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use std::fmt::Debug;

use crate::dataset::Dataset;
use crate::error::Result;

mod cache;
mod csv;

pub use cache::{load_key, CacheStats, DatasetCache};
pub use csv::{CsvOptions, CsvSource};

/// Something that can produce a [`Dataset`].
///
/// # Examples
///
/// ```rust,no_run
/// use term_explore::sources::{CsvSource, DataSource};
///
/// # async fn example() -> term_explore::Result<()> {
/// let source = CsvSource::new("vendas.csv")?;
/// let dataset = source.load().await?;
/// println!("{} rows from {}", dataset.num_rows(), source.description());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DataSource: Debug + Send + Sync {
    /// Reads and parses the source.
    async fn load(&self) -> Result<Dataset>;

    /// Loads the source and registers it with the given session context.
    async fn register(&self, ctx: &SessionContext, table_name: &str) -> Result<()> {
        self.load().await?.register(ctx, table_name)
    }

    /// Returns a human-readable description of this data source.
    fn description(&self) -> String;
}
