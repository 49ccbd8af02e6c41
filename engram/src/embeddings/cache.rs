use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use lru::LruCache;

/// Thread-safe LRU + TTL cache for query embeddings.
///
/// Advisory only: a miss (or an expired entry) is always safe to recompute.
/// Keys are the lowercased, trimmed query text, so trivially different
/// spellings of the same query share an entry.
#[derive(Clone)]
pub struct QueryEmbeddingCache {
    cache: Arc<Mutex<LruCache<String, (Vec<f32>, Instant)>>>,
    ttl: Duration,
}

impl QueryEmbeddingCache {
    /// # Panics
    /// Panics if capacity is 0
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let cache = LruCache::new(NonZeroUsize::new(capacity).expect("Capacity must be non-zero"));
        Self {
            cache: Arc::new(Mutex::new(cache)),
            ttl,
        }
    }

    fn cache_key(query: &str) -> String {
        query.trim().to_lowercase()
    }

    pub fn get(&self, query: &str) -> Option<Vec<f32>> {
        let key = Self::cache_key(query);
        let mut cache = self.cache.lock().unwrap();
        match cache.get(&key) {
            Some((embedding, inserted_at)) if inserted_at.elapsed() < self.ttl => {
                Some(embedding.clone())
            }
            Some(_) => {
                cache.pop(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, query: &str, embedding: Vec<f32>) {
        let key = Self::cache_key(query);
        let mut cache = self.cache.lock().unwrap();
        cache.put(key, (embedding, Instant::now()));
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap().len()
    }
}
