//! Drivers for engines that still expect a mapping type in bulk action lines.
//!
//! The index, request and system drivers do not depend on mapping types and are
//! reused by the version 7 set.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::drivers::{
    DocumentDriver, IndexDriver, IndexerDriver, RequestDriver, SystemDriver, INDEX_PART_SEPARATOR,
};
use crate::errors::SearchIndexError;
use crate::interfaces::SearchEngineClient;
use crate::opensearch::index_config::{FULLTEXT_FIELD, FULLTEXT_PARTS_FIELD};
use crate::types::AliasAction;

const DOCUMENT_TYPE: &str = "_doc";

/// Painless source replacing a document while keeping its fulltext fields.
pub(crate) fn document_script() -> String {
    format!(
        "Map fulltext = (ctx._source.containsKey(\"{ft}\") && ctx._source.{ft} instanceof Map ? ctx._source.{ft} : new HashMap()); \
         Map fulltextParts = (ctx._source.containsKey(\"{parts}\") && ctx._source.{parts} instanceof Map ? ctx._source.{parts} : new HashMap()); \
         ctx._source = params.newData; \
         ctx._source.{ft} = fulltext; \
         ctx._source.{parts} = fulltextParts",
        ft = FULLTEXT_FIELD,
        parts = FULLTEXT_PARTS_FIELD
    )
}

/// Painless source storing one fulltext part and rebuilding the merged block from all parts.
pub(crate) fn fulltext_script() -> String {
    format!(
        "ctx._source.{ft} = new HashMap(); \
         if (!ctx._source.containsKey(\"{parts}\") || !(ctx._source.{parts} instanceof Map)) {{ ctx._source.{parts} = new HashMap(); }} \
         ctx._source.{parts}.put(params.identifier, params.fulltext); \
         for (fulltextPart in ctx._source.{parts}.entrySet()) {{ \
           for (entry in fulltextPart.getValue().entrySet()) {{ \
             def value = \"\"; \
             if (ctx._source.{ft}.containsKey(entry.getKey())) {{ value = ctx._source.{ft}[entry.getKey()] + \" \" + entry.getValue().trim(); }} \
             else {{ value = entry.getValue().trim(); }} \
             ctx._source.{ft}[entry.getKey()] = value; \
           }} \
         }}",
        ft = FULLTEXT_FIELD,
        parts = FULLTEXT_PARTS_FIELD
    )
}

pub(crate) fn document_payload(data: Value) -> Value {
    json!({
        "script": {
            "lang": "painless",
            "source": document_script(),
            "params": { "newData": data.clone() }
        },
        "upsert": data
    })
}

pub(crate) fn fulltext_payload(identifier: &str, fulltext: Value) -> Value {
    json!({
        "script": {
            "lang": "painless",
            "source": fulltext_script(),
            "params": {
                "identifier": identifier,
                "fulltext": fulltext.clone()
            }
        },
        "upsert": {
            (FULLTEXT_FIELD): fulltext,
            (FULLTEXT_PARTS_FIELD): {}
        }
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentDriverV6;

impl DocumentDriver for DocumentDriverV6 {
    fn delete(&self, identifier: &str) -> Vec<Value> {
        vec![json!({ "delete": { "_type": DOCUMENT_TYPE, "_id": identifier } })]
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IndexerDriverV6;

impl IndexerDriver for IndexerDriverV6 {
    fn document(&self, index_name: &str, identifier: &str, data: Value) -> Vec<Value> {
        vec![
            json!({
                "update": {
                    "_type": DOCUMENT_TYPE,
                    "_id": identifier,
                    "_index": index_name,
                    "retry_on_conflict": 3
                }
            }),
            document_payload(data),
        ]
    }

    fn fulltext(&self, identifier: &str, fulltext: Value) -> Vec<Value> {
        vec![
            json!({ "update": { "_type": DOCUMENT_TYPE, "_id": identifier } }),
            fulltext_payload(identifier, fulltext),
        ]
    }
}

/// Index and alias administration through the engine client.
pub struct IndexDriverV6 {
    client: Arc<dyn SearchEngineClient>,
}

impl IndexDriverV6 {
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IndexDriver for IndexDriverV6 {
    async fn alias_actions(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError> {
        self.client.update_aliases(actions).await
    }

    #[instrument(skip(self))]
    async fn delete_index(&self, index_name: &str) -> Result<(), SearchIndexError> {
        if !self.client.index_exists(index_name).await? {
            debug!(index = %index_name, "Index does not exist, nothing to delete");
            return Ok(());
        }
        self.client.delete_index(index_name).await
    }

    async fn index_names_by_alias(&self, alias: &str) -> Result<Vec<String>, SearchIndexError> {
        match self.client.get_aliases(Some(alias)).await {
            Ok(body) => Ok(object_keys(&body)),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn index_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, SearchIndexError> {
        let body = self.client.get_aliases(None).await?;
        let prefix = format!("{}{}", prefix, INDEX_PART_SEPARATOR);
        Ok(object_keys(&body)
            .into_iter()
            .filter(|name| name.starts_with(&prefix))
            .collect())
    }
}

fn object_keys(body: &Value) -> Vec<String> {
    body.as_object()
        .map(|indices| indices.keys().cloned().collect())
        .unwrap_or_default()
}

/// Bulk transmission through the engine client.
pub struct RequestDriverV6 {
    client: Arc<dyn SearchEngineClient>,
}

impl RequestDriverV6 {
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RequestDriver for RequestDriverV6 {
    async fn bulk(&self, index_name: &str, lines: &[String]) -> Result<Value, SearchIndexError> {
        // The bulk body must end with a line break.
        let payload = format!("{}\n", lines.join("\n").trim());
        self.client.bulk(index_name, payload).await
    }
}

pub struct SystemDriverV6 {
    client: Arc<dyn SearchEngineClient>,
}

impl SystemDriverV6 {
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SystemDriver for SystemDriverV6 {
    async fn status(&self) -> Result<Value, SearchIndexError> {
        self.client.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        existing: Vec<String>,
        aliases: Value,
        deleted: Mutex<Vec<String>>,
        bulk_payloads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchEngineClient for RecordingClient {
        async fn index_exists(&self, index_name: &str) -> Result<bool, SearchIndexError> {
            Ok(self.existing.iter().any(|name| name == index_name))
        }

        async fn create_index(&self, _index_name: &str, _body: &Value) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn delete_index(&self, index_name: &str) -> Result<(), SearchIndexError> {
            self.deleted.lock().unwrap().push(index_name.to_string());
            Ok(())
        }

        async fn refresh_index(&self, _index_name: &str) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn bulk(&self, _index_name: &str, payload: String) -> Result<Value, SearchIndexError> {
            self.bulk_payloads.lock().unwrap().push(payload);
            Ok(json!({ "errors": false, "items": [] }))
        }

        async fn update_aliases(&self, _actions: &[AliasAction]) -> Result<(), SearchIndexError> {
            Ok(())
        }

        async fn get_aliases(&self, alias: Option<&str>) -> Result<Value, SearchIndexError> {
            match alias {
                Some("missing") => Err(SearchIndexError::api(404, "alias [missing] missing")),
                Some("broken") => Err(SearchIndexError::api(500, "internal")),
                _ => Ok(self.aliases.clone()),
            }
        }

        async fn stats(&self) -> Result<Value, SearchIndexError> {
            Ok(json!({ "indices": {} }))
        }

        async fn search(&self, _index_name: &str, _body: &Value) -> Result<Value, SearchIndexError> {
            Ok(json!({}))
        }

        async fn count(&self, _index_name: &str, _body: &Value) -> Result<Value, SearchIndexError> {
            Ok(json!({ "count": 0 }))
        }

        async fn simulate_pipeline(&self, _body: &Value) -> Result<Value, SearchIndexError> {
            Ok(json!({}))
        }
    }

    #[test]
    fn test_document_operation_carries_type() {
        let lines = IndexerDriverV6.document("assets-1", "a1", json!({ "filename": "a.pdf" }));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["update"]["_type"], "_doc");
        assert_eq!(lines[0]["update"]["_index"], "assets-1");
        assert_eq!(lines[0]["update"]["retry_on_conflict"], 3);
        assert_eq!(lines[1]["upsert"]["filename"], "a.pdf");
        assert_eq!(lines[1]["script"]["params"]["newData"]["filename"], "a.pdf");
    }

    #[test]
    fn test_fulltext_operation_upserts_empty_parts() {
        let lines = IndexerDriverV6.fulltext("a1", json!({ "h1": "Title" }));
        assert_eq!(lines[0]["update"]["_id"], "a1");
        assert_eq!(lines[1]["script"]["params"]["identifier"], "a1");
        assert_eq!(lines[1]["upsert"]["fulltext"]["h1"], "Title");
        assert_eq!(lines[1]["upsert"]["fulltext_parts"], json!({}));
    }

    #[test]
    fn test_delete_operation() {
        assert_eq!(
            DocumentDriverV6.delete("a1"),
            vec![json!({ "delete": { "_type": "_doc", "_id": "a1" } })]
        );
    }

    #[tokio::test]
    async fn test_delete_index_probes_existence() {
        let client = Arc::new(RecordingClient {
            existing: vec!["assets-1".to_string()],
            ..Default::default()
        });
        let driver = IndexDriverV6::new(client.clone());

        driver.delete_index("assets-2").await.unwrap();
        driver.delete_index("assets-1").await.unwrap();

        assert_eq!(*client.deleted.lock().unwrap(), vec!["assets-1".to_string()]);
    }

    #[tokio::test]
    async fn test_index_names_by_alias_treats_not_found_as_empty() {
        let client = Arc::new(RecordingClient {
            aliases: json!({ "assets-1": { "aliases": { "assets": {} } } }),
            ..Default::default()
        });
        let driver = IndexDriverV6::new(client);

        assert_eq!(driver.index_names_by_alias("assets").await.unwrap(), vec!["assets-1"]);
        assert!(driver.index_names_by_alias("missing").await.unwrap().is_empty());
        assert!(driver.index_names_by_alias("broken").await.is_err());
    }

    #[tokio::test]
    async fn test_index_names_by_prefix_requires_separator() {
        let client = Arc::new(RecordingClient {
            aliases: json!({
                "assets-1": { "aliases": {} },
                "assets-2": { "aliases": {} },
                "assetsother-1": { "aliases": {} },
                "pages-1": { "aliases": {} }
            }),
            ..Default::default()
        });
        let driver = IndexDriverV6::new(client);

        let mut names = driver.index_names_by_prefix("assets").await.unwrap();
        names.sort();
        assert_eq!(names, vec!["assets-1", "assets-2"]);
    }

    #[tokio::test]
    async fn test_bulk_payload_ends_with_single_line_break() {
        let client = Arc::new(RecordingClient::default());
        let driver = RequestDriverV6::new(client.clone());

        let lines = vec!["{\"delete\":{\"_id\":\"a\"}}".to_string(), "".to_string()];
        driver.bulk("assets", &lines).await.unwrap();

        assert_eq!(
            client.bulk_payloads.lock().unwrap()[0],
            "{\"delete\":{\"_id\":\"a\"}}\n"
        );
    }
}
