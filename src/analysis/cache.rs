use std::collections::HashMap;
use tracing::debug;

use crate::types::{AnalysisResult, DatasetKey};

/// Manages caching of analysis results
#[derive(Clone)]
pub struct CacheManager {
    cache: HashMap<DatasetKey, AnalysisResult>,
}

impl CacheManager {
    /// Create a new cache manager
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Store a result in the cache, replacing any earlier one for the key
    pub fn store(&mut self, key: DatasetKey, result: AnalysisResult) {
        self.cache.insert(key, result);
    }

    /// Retrieve a result from the cache
    pub fn get(&self, key: &DatasetKey) -> Option<&AnalysisResult> {
        let hit = self.cache.get(key);
        if hit.is_some() {
            debug!(path = %key.path, window = key.window_size, "analysis cache hit");
        }
        hit
    }

    /// Drop every result computed from the given file
    pub fn invalidate_path(&mut self, path: &str) {
        self.cache.retain(|key, _| key.path != path);
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}
