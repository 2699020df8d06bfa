//! Single-entry cache of the parsed raw table.
//!
//! Keyed on a content hash of the uploaded bytes so unrelated interactions
//! (mapping or filter changes) skip re-parsing the CSV. A new upload
//! replaces the entry; there is nothing else to evict.

use crate::error::Result;
use crate::io;
use parking_lot::Mutex;
use polars::prelude::*;
use std::hash::{DefaultHasher, Hash, Hasher};
use tracing::debug;

/// Content-addressed cache holding at most one parsed table.
#[derive(Default)]
pub struct TableCache {
    slot: Mutex<Option<(u64, DataFrame)>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse CSV bytes, reusing the cached table when the content matches.
    ///
    /// The returned DataFrame is a cheap clone (columns are shared).
    pub fn load(&self, bytes: &[u8]) -> Result<DataFrame> {
        let key = content_hash(bytes);

        let mut slot = self.slot.lock();
        if let Some((cached_key, df)) = slot.as_ref()
            && *cached_key == key
        {
            debug!("Table cache hit ({} rows)", df.height());
            return Ok(df.clone());
        }

        let df = io::read_csv_bytes(bytes)?;
        debug!("Table cache miss, parsed {} rows", df.height());
        *slot = Some((key, df.clone()));
        Ok(df)
    }

    /// Drop the cached entry.
    pub fn invalidate(&self) {
        *self.slot.lock() = None;
    }
}

fn content_hash(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &[u8] = b"Region,Price\nEast,2\n";

    #[test]
    fn test_cache_hit_returns_same_table() {
        let cache = TableCache::new();
        let first = cache.load(CSV).unwrap();
        let second = cache.load(CSV).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cache_replaced_on_new_content() {
        let cache = TableCache::new();
        cache.load(CSV).unwrap();
        let other = cache.load(b"Region,Price\nWest,3\nSouth,4\n").unwrap();
        assert_eq!(other.height(), 2);
    }

    #[test]
    fn test_cache_invalidate() {
        let cache = TableCache::new();
        cache.load(CSV).unwrap();
        cache.invalidate();
        assert!(cache.slot.lock().is_none());
    }
}
