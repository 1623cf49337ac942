//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{
        IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesGetAliasParts,
        IndicesRefreshParts, IndicesStatsParts,
    },
    ingest::IngestSimulateParts,
    BulkParts, CountParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchEngineClient;
use crate::types::AliasAction;

/// OpenSearch client implementation.
///
/// Thin adapter from the `SearchEngineClient` contract to the OpenSearch REST API.
/// Every response with a non-success status becomes a [`SearchIndexError::ApiError`].
///
/// # Example
///
/// ```ignore
/// use asset_search_repository::OpenSearchClient;
///
/// let client = OpenSearchClient::new("http://localhost:9200").await?;
/// if !client.index_exists("assets").await? {
///     client.create_index("assets", &get_index_settings()).await?;
/// }
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(url: &str) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch client");

        Ok(Self { client })
    }

    /// Turn a non-success response into an `ApiError` carrying its status and body.
    async fn check_status(
        response: Response,
        operation: &str,
    ) -> Result<Response, SearchIndexError> {
        let status = response.status_code();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        debug!(status = %status, body = %error_body, operation, "Request failed");
        Err(SearchIndexError::api(
            status.as_u16(),
            format!("{} failed: {}", operation, error_body),
        ))
    }

    /// Check the status and parse the body of a response as JSON.
    async fn json_body(response: Response, operation: &str) -> Result<Value, SearchIndexError> {
        Self::check_status(response, operation)
            .await?
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(format!("{}: {}", operation, e)))
    }
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    async fn index_exists(&self, index_name: &str) -> Result<bool, SearchIndexError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index_name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => Self::check_status(response, "index exists").await.map(|_| true),
        }
    }

    async fn create_index(&self, index_name: &str, body: &Value) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index_name))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check_status(response, "create index").await?;
        info!(index = %index_name, "Created index");
        Ok(())
    }

    async fn delete_index(&self, index_name: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index_name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check_status(response, "delete index").await?;
        info!(index = %index_name, "Deleted index");
        Ok(())
    }

    async fn refresh_index(&self, index_name: &str) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&[index_name]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check_status(response, "refresh index").await?;
        Ok(())
    }

    async fn bulk(&self, index_name: &str, payload: String) -> Result<Value, SearchIndexError> {
        let response = self
            .client
            .bulk(BulkParts::Index(index_name))
            .body(vec![payload])
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_index(e.to_string()))?;

        Self::json_body(response, "bulk").await
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .indices()
            .update_aliases()
            .body(json!({ "actions": actions }))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::check_status(response, "update aliases").await?;
        debug!(action_count = actions.len(), "Alias actions applied");
        Ok(())
    }

    async fn get_aliases(&self, alias: Option<&str>) -> Result<Value, SearchIndexError> {
        let indices = self.client.indices();
        let names: Vec<&str> = alias.into_iter().collect();
        let parts = if names.is_empty() {
            IndicesGetAliasParts::None
        } else {
            IndicesGetAliasParts::Name(&names)
        };
        let response = indices
            .get_alias(parts)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::json_body(response, "get aliases").await
    }

    async fn stats(&self) -> Result<Value, SearchIndexError> {
        let response = self
            .client
            .indices()
            .stats(IndicesStatsParts::None)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::json_body(response, "stats").await
    }

    async fn search(&self, index_name: &str, body: &Value) -> Result<Value, SearchIndexError> {
        let response = self
            .client
            .search(SearchParts::Index(&[index_name]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::json_body(response, "search").await
    }

    async fn count(&self, index_name: &str, body: &Value) -> Result<Value, SearchIndexError> {
        let response = self
            .client
            .count(CountParts::Index(&[index_name]))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::json_body(response, "count").await
    }

    async fn simulate_pipeline(&self, body: &Value) -> Result<Value, SearchIndexError> {
        let response = self
            .client
            .ingest()
            .simulate(IngestSimulateParts::None)
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        Self::json_body(response, "simulate pipeline").await
    }
}
