//! In-memory engine and repository shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use asset_search::interfaces::AssetRepository;
use asset_search::{AssetSearchConfig, AssetSearchError, Dependencies};
use asset_search_repository::{AliasAction, SearchEngineClient, SearchIndexError};
use asset_search_shared::Asset;

/// Keeps indices with their aliases and records every write.
#[derive(Default)]
pub struct InMemoryEngine {
    indices: Mutex<BTreeMap<String, BTreeSet<String>>>,
    created: Mutex<Vec<(String, Value)>>,
    refreshed: Mutex<Vec<String>>,
    bulk_payloads: Mutex<Vec<(String, String)>>,
    alias_updates: Mutex<Vec<Vec<AliasAction>>>,
    search_responses: Mutex<VecDeque<Value>>,
    search_requests: Mutex<Vec<(String, Value)>>,
    simulate_response: Mutex<Option<Value>>,
    simulate_requests: Mutex<Vec<Value>>,
    bulk_response: Mutex<Option<Value>>,
    events: Mutex<Vec<String>>,
}

impl InMemoryEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add an index bound to the given aliases.
    pub fn with_index(&self, index_name: &str, aliases: &[&str]) {
        self.indices.lock().unwrap().insert(
            index_name.to_string(),
            aliases.iter().map(|alias| alias.to_string()).collect(),
        );
    }

    pub fn answer_searches_with(&self, responses: Vec<Value>) {
        self.search_responses.lock().unwrap().extend(responses);
    }

    pub fn answer_simulations_with(&self, response: Value) {
        *self.simulate_response.lock().unwrap() = Some(response);
    }

    pub fn answer_bulks_with(&self, response: Value) {
        *self.bulk_response.lock().unwrap() = Some(response);
    }

    pub fn index_names(&self) -> Vec<String> {
        self.indices.lock().unwrap().keys().cloned().collect()
    }

    /// Indices the alias points at.
    pub fn alias_targets(&self, alias: &str) -> Vec<String> {
        self.indices
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, aliases)| aliases.contains(alias))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn created_indices(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn refreshed_indices(&self) -> Vec<String> {
        self.refreshed.lock().unwrap().clone()
    }

    pub fn bulk_payloads(&self) -> Vec<(String, String)> {
        self.bulk_payloads.lock().unwrap().clone()
    }

    /// Every submitted bulk line, parsed.
    pub fn bulk_lines(&self) -> Vec<Value> {
        self.bulk_payloads
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, payload)| {
                payload
                    .lines()
                    .map(|line| serde_json::from_str(line).unwrap())
                    .collect::<Vec<Value>>()
            })
            .collect()
    }

    pub fn alias_updates(&self) -> Vec<Vec<AliasAction>> {
        self.alias_updates.lock().unwrap().clone()
    }

    pub fn search_requests(&self) -> Vec<(String, Value)> {
        self.search_requests.lock().unwrap().clone()
    }

    pub fn simulate_requests(&self) -> Vec<Value> {
        self.simulate_requests.lock().unwrap().clone()
    }

    /// Every write in the order the engine received it, such as
    /// `create assets-1`, `bulk assets-1`, `refresh assets-1` or
    /// `alias add assets-1 assets`.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Position of the first event equal to `event`.
    pub fn position_of(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|recorded| recorded == event)
    }

    fn record(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn alias_body<'a>(entries: impl Iterator<Item = (&'a String, &'a BTreeSet<String>)>) -> Value {
        let mut body = Map::new();
        for (index_name, aliases) in entries {
            let aliases: Map<String, Value> = aliases
                .iter()
                .map(|alias| (alias.clone(), json!({})))
                .collect();
            body.insert(index_name.clone(), json!({ "aliases": aliases }));
        }
        Value::Object(body)
    }
}

#[async_trait]
impl SearchEngineClient for InMemoryEngine {
    async fn index_exists(&self, index_name: &str) -> Result<bool, SearchIndexError> {
        let indices = self.indices.lock().unwrap();
        Ok(indices.contains_key(index_name)
            || indices.values().any(|aliases| aliases.contains(index_name)))
    }

    async fn create_index(&self, index_name: &str, body: &Value) -> Result<(), SearchIndexError> {
        let mut indices = self.indices.lock().unwrap();
        if indices.contains_key(index_name) {
            return Err(SearchIndexError::api(400, "resource_already_exists_exception"));
        }
        indices.insert(index_name.to_string(), BTreeSet::new());
        self.created
            .lock()
            .unwrap()
            .push((index_name.to_string(), body.clone()));
        self.record(format!("create {}", index_name));
        Ok(())
    }

    async fn delete_index(&self, index_name: &str) -> Result<(), SearchIndexError> {
        match self.indices.lock().unwrap().remove(index_name) {
            Some(_) => Ok(()),
            None => Err(SearchIndexError::api(404, "index_not_found_exception")),
        }
    }

    async fn refresh_index(&self, index_name: &str) -> Result<(), SearchIndexError> {
        self.refreshed.lock().unwrap().push(index_name.to_string());
        self.record(format!("refresh {}", index_name));
        Ok(())
    }

    async fn bulk(&self, index_name: &str, payload: String) -> Result<Value, SearchIndexError> {
        self.record(format!("bulk {}", index_name));
        self.bulk_payloads
            .lock()
            .unwrap()
            .push((index_name.to_string(), payload));
        Ok(self
            .bulk_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| json!({ "errors": false, "items": [] })))
    }

    async fn update_aliases(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError> {
        let mut indices = self.indices.lock().unwrap();
        let mut updated = indices.clone();
        for action in actions {
            match action {
                AliasAction::Add { index, alias } => match updated.get_mut(index) {
                    Some(aliases) => {
                        aliases.insert(alias.clone());
                    }
                    None => return Err(SearchIndexError::api(404, "index_not_found_exception")),
                },
                AliasAction::Remove { index, alias } => {
                    let removed = updated
                        .get_mut(index)
                        .is_some_and(|aliases| aliases.remove(alias));
                    if !removed {
                        return Err(SearchIndexError::api(404, "aliases_not_found_exception"));
                    }
                }
            }
        }
        *indices = updated;
        for action in actions {
            self.record(match action {
                AliasAction::Add { index, alias } => format!("alias add {} {}", index, alias),
                AliasAction::Remove { index, alias } => format!("alias remove {} {}", index, alias),
            });
        }
        self.alias_updates.lock().unwrap().push(actions.to_vec());
        Ok(())
    }

    async fn get_aliases(&self, alias: Option<&str>) -> Result<Value, SearchIndexError> {
        let indices = self.indices.lock().unwrap();
        match alias {
            Some(alias) => {
                let bound: Vec<(&String, &BTreeSet<String>)> = indices
                    .iter()
                    .filter(|(_, aliases)| aliases.contains(alias))
                    .collect();
                if bound.is_empty() {
                    return Err(SearchIndexError::api(404, format!("alias [{}] missing", alias)));
                }
                Ok(Self::alias_body(bound.into_iter()))
            }
            None => Ok(Self::alias_body(indices.iter())),
        }
    }

    async fn stats(&self) -> Result<Value, SearchIndexError> {
        let indices: Map<String, Value> = self
            .indices
            .lock()
            .unwrap()
            .keys()
            .map(|name| (name.clone(), json!({})))
            .collect();
        Ok(json!({ "indices": indices }))
    }

    async fn search(&self, index_name: &str, body: &Value) -> Result<Value, SearchIndexError> {
        self.search_requests
            .lock()
            .unwrap()
            .push((index_name.to_string(), body.clone()));
        Ok(self
            .search_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| json!({ "hits": { "total": { "value": 0 }, "hits": [] } })))
    }

    async fn count(&self, _index_name: &str, _body: &Value) -> Result<Value, SearchIndexError> {
        Ok(json!({ "count": 0 }))
    }

    async fn simulate_pipeline(&self, body: &Value) -> Result<Value, SearchIndexError> {
        self.simulate_requests.lock().unwrap().push(body.clone());
        self.simulate_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SearchIndexError::api(500, "no attachment processor"))
    }
}

/// Assets kept in memory, with every identifier lookup recorded.
#[derive(Default)]
pub struct InMemoryRepository {
    assets: Vec<Asset>,
    resources: HashMap<String, Vec<u8>>,
    lookups: Mutex<Vec<String>>,
}

impl InMemoryRepository {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self {
            assets,
            ..Default::default()
        }
    }

    pub fn with_resource(mut self, identifier: &str, bytes: &[u8]) -> Self {
        self.resources.insert(identifier.to_string(), bytes.to_vec());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetRepository for InMemoryRepository {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Asset>, AssetSearchError> {
        self.lookups.lock().unwrap().push(identifier.to_string());
        Ok(self
            .assets
            .iter()
            .find(|asset| asset.identifier == identifier)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Asset>, AssetSearchError> {
        Ok(self.assets.clone())
    }

    async fn read_resource(&self, asset: &Asset) -> std::io::Result<Vec<u8>> {
        self.resources
            .get(&asset.identifier)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no resource"))
    }
}

/// A response of the attachment pipeline carrying the given text.
pub fn attachment_response(content: &str) -> Value {
    json!({
        "docs": [{
            "doc": {
                "_source": {
                    "attachment": {
                        "content": content,
                        "title": "",
                        "content_type": "application/pdf",
                        "content_length": content.len(),
                        "language": "en"
                    }
                }
            }
        }]
    })
}

pub fn search_response(hits: &[(&str, &str)], total: u64) -> Value {
    let hits: Vec<Value> = hits
        .iter()
        .map(|(id, index)| json!({ "_id": id, "_index": index }))
        .collect();
    json!({ "hits": { "total": { "value": total }, "hits": hits } })
}

/// Dependencies over the in-memory engine, with phases running in process.
pub async fn dependencies(
    engine: Arc<InMemoryEngine>,
    repository: Arc<InMemoryRepository>,
    config: AssetSearchConfig,
) -> Dependencies {
    Dependencies::from_parts(config, engine, repository)
        .await
        .unwrap()
}

pub fn test_config() -> AssetSearchConfig {
    AssetSearchConfig {
        index_name: "assets".to_string(),
        use_sub_processes: false,
        ..Default::default()
    }
}
