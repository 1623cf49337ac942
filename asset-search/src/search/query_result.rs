//! Lazily materialized query results.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;

use asset_search_repository::SearchIndexError;
use asset_search_shared::{Asset, RawHit};

use crate::search::{FetchedAssets, Query};

struct QueryResultState {
    query: Query,
    fetched: Option<FetchedAssets>,
    count: Option<u64>,
}

/// Result of a [`Query`], executed on first access and kept afterwards.
///
/// Clones share the same state, which is what the result cache hands out.
#[derive(Clone)]
pub struct QueryResult {
    state: Arc<Mutex<QueryResultState>>,
}

impl QueryResult {
    pub fn new(query: Query) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueryResultState {
                query,
                fetched: None,
                count: None,
            })),
        }
    }

    /// Whether both handles refer to the same result.
    pub fn ptr_eq(&self, other: &QueryResult) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Whether the query was executed already.
    pub async fn is_initialized(&self) -> bool {
        self.state.lock().await.fetched.is_some()
    }

    /// Drop the materialized assets so that the next access executes the query again.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.fetched = None;
        state.count = None;
    }

    async fn with_fetched<T>(&self, read: impl FnOnce(&FetchedAssets) -> T) -> T {
        let mut state = self.state.lock().await;
        if state.fetched.is_none() {
            let fetched = state.query.query_builder_mut().fetch().await;
            state.count = Some(state.query.query_builder().total_items());
            state.fetched = Some(fetched);
        }
        match &state.fetched {
            Some(fetched) => read(fetched),
            None => read(&FetchedAssets::default()),
        }
    }

    pub async fn to_vec(&self) -> Vec<Asset> {
        self.with_fetched(|fetched| fetched.assets.clone()).await
    }

    pub async fn first(&self) -> Option<Asset> {
        self.with_fetched(|fetched| fetched.assets.first().cloned())
            .await
    }

    pub async fn get(&self, index: usize) -> Option<Asset> {
        self.with_fetched(|fetched| fetched.assets.get(index).cloned())
            .await
    }

    /// Number of assets on this page, after deduplication.
    pub async fn accessible_count(&self) -> usize {
        self.with_fetched(|fetched| fetched.assets.len()).await
    }

    /// Total number of matching documents.
    ///
    /// Before the result is materialized this issues a count request instead
    /// of executing the search.
    pub async fn count(&self) -> Result<u64, SearchIndexError> {
        let mut state = self.state.lock().await;
        if let Some(count) = state.count {
            return Ok(count);
        }
        let count = state.query.query_builder().count().await?;
        state.count = Some(count);
        Ok(count)
    }

    /// Aggregation results, an empty object if none were requested.
    pub async fn aggregations(&self) -> Value {
        self.with_fetched(|fetched| object_or_empty(&fetched.aggregations))
            .await
    }

    /// Suggestion results, an empty object if none were requested.
    pub async fn suggestions(&self) -> Value {
        self.with_fetched(|fetched| object_or_empty(&fetched.suggest))
            .await
    }

    /// The raw hit the asset was resolved from.
    pub async fn search_hit_for_asset(&self, asset: &Asset) -> Option<RawHit> {
        let state = self.state.lock().await;
        state.query.query_builder().full_hit_for_asset(asset).cloned()
    }

    pub async fn sort_values_for_asset(&self, asset: &Asset) -> Vec<Value> {
        let state = self.state.lock().await;
        state.query.query_builder().sort_values_for_asset(asset)
    }

    /// A copy of the query behind this result.
    pub async fn query(&self) -> Query {
        self.state.lock().await.query.clone()
    }
}

fn object_or_empty(value: &Value) -> Value {
    if value.is_object() {
        value.clone()
    } else {
        json!({})
    }
}
