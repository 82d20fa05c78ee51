//! Content-addressed cache of parsed datasets.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tracing::debug;

use super::csv::{CsvOptions, CsvSource};
use crate::dataset::Dataset;
use crate::error::Result;

/// Hex SHA-256 of `bytes` followed by the JSON form of the parse options.
///
/// The same content parsed with different options gets a different key.
pub fn load_key(bytes: &[u8], options: &CsvOptions) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.update([0u8]);
    hasher.update(serde_json::to_vec(options)?);
    Ok(hex::encode(hasher.finalize()))
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Parsed datasets keyed by the hash of their raw content and parse options.
///
/// Owned by the caller; entries live until [`clear`](Self::clear) or drop.
/// Identical bytes uploaded under different names with the same options
/// share one entry.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: HashMap<String, Dataset>,
    stats: CacheStats,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached dataset for the source's content and options,
    /// parsing it on a miss.
    pub async fn get_or_load(&mut self, source: &CsvSource) -> Result<Dataset> {
        let bytes = source.read_bytes().await?;
        let key = load_key(&bytes, source.options())?;

        if let Some(dataset) = self.entries.get(&key) {
            self.stats.hits += 1;
            debug!(key = %key, source = source.name(), "Dataset cache hit");
            return Ok(dataset.clone());
        }

        self.stats.misses += 1;
        debug!(key = %key, source = source.name(), "Dataset cache miss");
        let dataset = CsvSource::parse(&bytes, source.options())?;
        self.entries.insert(key, dataset.clone());
        Ok(dataset)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
