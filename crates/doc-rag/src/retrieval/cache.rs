//! Content-addressed cache of built indices
//!
//! Keyed by document hash plus embedding model, so re-uploading a document
//! skips the embedding pass entirely.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use super::VectorIndex;

/// LRU cache of built indices
pub struct IndexCache {
    inner: Mutex<CacheInner>,
    max_entries: usize,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, Arc<VectorIndex>>,
    /// Keys from least to most recently used
    recency: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.recency.iter().position(|k| k == key) {
            if let Some(k) = self.recency.remove(pos) {
                self.recency.push_back(k);
            }
        }
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Cached indices
    pub entries: usize,
    /// Lookups served from cache
    pub hits: u64,
    /// Lookups that required a build
    pub misses: u64,
}

impl IndexCache {
    /// Create a cache holding at most `max_entries` indices
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            max_entries,
        }
    }

    fn key(document_hash: &str, model: &str) -> String {
        format!("{}:{}", model, document_hash)
    }

    /// Look up an index built from this document with this model
    pub fn get(&self, document_hash: &str, model: &str) -> Option<Arc<VectorIndex>> {
        let key = Self::key(document_hash, model);
        let mut inner = self.inner.lock();

        match inner.entries.get(&key).cloned() {
            Some(index) => {
                inner.hits += 1;
                inner.touch(&key);
                Some(index)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Store a built index, evicting the least recently used when full
    pub fn insert(&self, index: Arc<VectorIndex>) {
        if self.max_entries == 0 {
            return;
        }
        let key = Self::key(index.document_hash(), index.model());
        let mut inner = self.inner.lock();

        if inner.entries.insert(key.clone(), index).is_some() {
            inner.touch(&key);
            return;
        }
        inner.recency.push_back(key);

        while inner.entries.len() > self.max_entries {
            let Some(oldest) = inner.recency.pop_front() else {
                break;
            };
            inner.entries.remove(&oldest);
            tracing::debug!("Evicted cached index {}", oldest);
        }
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entries: inner.entries.len(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::Result;
    use crate::providers::EmbeddingProvider;

    struct NamedEmbedder(&'static str);

    #[async_trait]
    impl EmbeddingProvider for NamedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        fn model(&self) -> &str {
            self.0
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "named"
        }
    }

    async fn index(hash: &str, model: &'static str) -> Arc<VectorIndex> {
        Arc::new(
            VectorIndex::build(hash, Vec::new(), &NamedEmbedder(model))
                .await
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_keyed_by_hash_and_model() {
        let cache = IndexCache::new(4);
        cache.insert(index("abc", "model-a").await);

        assert!(cache.get("abc", "model-a").is_some());
        assert!(cache.get("abc", "model-b").is_none());
        assert!(cache.get("def", "model-a").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = IndexCache::new(2);
        cache.insert(index("one", "m").await);
        cache.insert(index("two", "m").await);

        // Touch "one" so "two" becomes the eviction candidate
        assert!(cache.get("one", "m").is_some());
        cache.insert(index("three", "m").await);

        assert!(cache.get("one", "m").is_some());
        assert!(cache.get("two", "m").is_none());
        assert!(cache.get("three", "m").is_some());
        assert_eq!(cache.stats().entries, 2);
    }

    #[tokio::test]
    async fn test_zero_capacity_stores_nothing() {
        let cache = IndexCache::new(0);
        cache.insert(index("one", "m").await);
        assert!(cache.get("one", "m").is_none());
        assert_eq!(cache.stats().entries, 0);
    }
}
