//! Scripted engine and repository for the search unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use asset_search_repository::{AliasAction, FilteredQuery, SearchEngineClient, SearchIndexError, SearchRequest};
use asset_search_shared::Asset;

use crate::interfaces::AssetRepository;
use crate::search::QueryBuilder;
use crate::{AssetSearchError, IndexNameStrategy};

/// Answers searches from a queue and fails once the queue is empty.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Value>>,
    count: Option<u64>,
    searches: Mutex<Vec<Value>>,
    counts: Mutex<Vec<Value>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            count: None,
            searches: Mutex::new(Vec::new()),
            counts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn search_requests(&self) -> Vec<Value> {
        self.searches.lock().unwrap().clone()
    }

    pub fn count_requests(&self) -> Vec<Value> {
        self.counts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchEngineClient for ScriptedClient {
    async fn index_exists(&self, _index_name: &str) -> Result<bool, SearchIndexError> {
        Ok(true)
    }
    async fn create_index(&self, _index_name: &str, _body: &Value) -> Result<(), SearchIndexError> {
        Ok(())
    }
    async fn delete_index(&self, _index_name: &str) -> Result<(), SearchIndexError> {
        Ok(())
    }
    async fn refresh_index(&self, _index_name: &str) -> Result<(), SearchIndexError> {
        Ok(())
    }
    async fn bulk(&self, _index_name: &str, _payload: String) -> Result<Value, SearchIndexError> {
        Ok(json!({"errors": false, "items": []}))
    }
    async fn update_aliases(&self, _actions: &[AliasAction]) -> Result<(), SearchIndexError> {
        Ok(())
    }
    async fn get_aliases(&self, _alias: Option<&str>) -> Result<Value, SearchIndexError> {
        Ok(json!({}))
    }
    async fn stats(&self) -> Result<Value, SearchIndexError> {
        Ok(json!({"indices": {}}))
    }
    async fn search(&self, _index_name: &str, body: &Value) -> Result<Value, SearchIndexError> {
        self.searches.lock().unwrap().push(body.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SearchIndexError::connection("no scripted response"))
    }
    async fn count(&self, _index_name: &str, body: &Value) -> Result<Value, SearchIndexError> {
        self.counts.lock().unwrap().push(body.clone());
        self.count
            .map(|count| json!({ "count": count }))
            .ok_or_else(|| SearchIndexError::connection("no scripted count"))
    }
    async fn simulate_pipeline(&self, _body: &Value) -> Result<Value, SearchIndexError> {
        Ok(json!({}))
    }
}

/// Knows an asset for every identifier.
pub struct EveryAssetRepository;

#[async_trait]
impl AssetRepository for EveryAssetRepository {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Asset>, AssetSearchError> {
        Ok(Some(Asset::new(identifier, format!("{}.pdf", identifier), 1)))
    }
    async fn find_all(&self) -> Result<Vec<Asset>, AssetSearchError> {
        Ok(Vec::new())
    }
    async fn read_resource(&self, _asset: &Asset) -> std::io::Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

pub fn search_response(hits: &[(&str, &str)], total: u64) -> Value {
    let hits: Vec<Value> = hits
        .iter()
        .map(|(id, index)| json!({ "_id": id, "_index": index }))
        .collect();
    json!({ "hits": { "total": { "value": total }, "hits": hits } })
}

pub fn builder_for(
    client: Arc<ScriptedClient>,
    request: Box<dyn SearchRequest>,
) -> (QueryBuilder, Arc<ScriptedClient>) {
    let builder = QueryBuilder::new(
        &IndexNameStrategy::new("assets"),
        client.clone(),
        Arc::new(EveryAssetRepository),
        request,
    )
    .unwrap();
    (builder, client)
}

pub fn builder_with(
    responses: Vec<Value>,
    request: Box<dyn SearchRequest>,
) -> (QueryBuilder, Arc<ScriptedClient>) {
    builder_for(Arc::new(ScriptedClient::new(responses)), request)
}

pub fn builder(responses: Vec<Value>) -> (QueryBuilder, Arc<ScriptedClient>) {
    builder_with(responses, Box::new(FilteredQuery::new()))
}
