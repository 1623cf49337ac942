//! Search engine client trait definition.
//!
//! This module defines the abstract interface to the search engine's HTTP API,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, in-memory
//! fakes in tests).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::AliasAction;

/// Abstracts the search engine endpoints used for indexing and querying.
///
/// Implementations are injected into the drivers, the extractor and the query builder to
/// enable dependency injection and easy testing with mock implementations.
///
/// All methods return `Result<T, SearchIndexError>`. A response with a non-success status
/// must be reported as [`SearchIndexError::ApiError`] carrying that status, so that callers
/// can tell a 404 apart from other failures.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Check whether an index (or alias) with the given name exists.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - If the engine answered 200
    /// * `Ok(false)` - If the engine answered 404
    /// * `Err(SearchIndexError)` - On any other status or transport failure
    async fn index_exists(&self, index_name: &str) -> Result<bool, SearchIndexError>;

    /// Create an index with the given settings and mappings body.
    async fn create_index(&self, index_name: &str, body: &Value) -> Result<(), SearchIndexError>;

    /// Delete an index. Fails with a 404 `ApiError` if it does not exist.
    async fn delete_index(&self, index_name: &str) -> Result<(), SearchIndexError>;

    /// Make all writes to the index visible to search.
    async fn refresh_index(&self, index_name: &str) -> Result<(), SearchIndexError>;

    /// Submit a newline-delimited bulk payload targeting the given index.
    ///
    /// # Arguments
    ///
    /// * `index_name` - Default index for action lines that do not name one
    /// * `payload` - Action and payload lines, each terminated by a newline
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The bulk response, with its `errors` flag and `items` list
    /// * `Err(SearchIndexError)` - If the request could not be submitted
    async fn bulk(&self, index_name: &str, payload: String) -> Result<Value, SearchIndexError>;

    /// Apply a batch of alias actions as one atomic call.
    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError>;

    /// Read alias bindings.
    ///
    /// With a name, returns the bindings of that alias; without one, the bindings of every
    /// index. The body maps index names to `{"aliases": {...}}`. Fails with a 404 `ApiError`
    /// if the named alias does not exist.
    async fn get_aliases(&self, alias: Option<&str>) -> Result<Value, SearchIndexError>;

    /// Read index level statistics, including the `indices` map of every known index.
    async fn stats(&self) -> Result<Value, SearchIndexError>;

    /// Run a search request against the index and return the raw response body.
    async fn search(&self, index_name: &str, body: &Value) -> Result<Value, SearchIndexError>;

    /// Run a count request against the index and return the raw response body.
    async fn count(&self, index_name: &str, body: &Value) -> Result<Value, SearchIndexError>;

    /// Simulate an ingest pipeline on the documents contained in the body.
    async fn simulate_pipeline(&self, body: &Value) -> Result<Value, SearchIndexError>;
}
