//! Process wide cache of query results.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::search::QueryResult;

static GLOBAL_CACHE: OnceLock<Arc<QueryResultCache>> = OnceLock::new();

/// Query results keyed by a hash of index name and request body.
///
/// Entries are never evicted: the cache grows with every distinct query
/// executed with caching enabled for the lifetime of the process.
#[derive(Default)]
pub struct QueryResultCache {
    results: Mutex<HashMap<String, QueryResult>>,
}

impl QueryResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every query builder without an injected cache.
    pub fn global() -> Arc<QueryResultCache> {
        GLOBAL_CACHE
            .get_or_init(|| Arc::new(QueryResultCache::new()))
            .clone()
    }

    /// Cache key of a request: hex SHA-256 of the index name followed by the request JSON.
    pub fn key(index_name: &str, request: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(index_name.as_bytes());
        hasher.update(request.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<QueryResult> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: String, result: QueryResult) {
        self.lock().insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, QueryResult>> {
        self.results
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_depends_on_index_and_request() {
        let request = json!({"query": {"match_all": {}}});
        let key = QueryResultCache::key("assets", &request);

        assert_eq!(key.len(), 64);
        assert_eq!(key, QueryResultCache::key("assets", &request));
        assert_ne!(key, QueryResultCache::key("other", &request));
        assert_ne!(key, QueryResultCache::key("assets", &json!({"size": 1})));
    }

    #[test]
    fn test_global_cache_is_shared() {
        assert!(Arc::ptr_eq(&QueryResultCache::global(), &QueryResultCache::global()));
    }
}
