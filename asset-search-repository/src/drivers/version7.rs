//! Drivers for typeless engines (Elasticsearch 7 and OpenSearch).

use serde_json::{json, Value};

use crate::drivers::version6::{document_payload, fulltext_payload};
use crate::drivers::{DocumentDriver, IndexerDriver};

#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentDriverV7;

impl DocumentDriver for DocumentDriverV7 {
    fn delete(&self, identifier: &str) -> Vec<Value> {
        vec![json!({ "delete": { "_id": identifier } })]
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IndexerDriverV7;

impl IndexerDriver for IndexerDriverV7 {
    fn document(&self, index_name: &str, identifier: &str, data: Value) -> Vec<Value> {
        vec![
            json!({
                "update": {
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
            json!({ "update": { "_id": identifier } }),
            fulltext_payload(identifier, fulltext),
        ]
    }
}
