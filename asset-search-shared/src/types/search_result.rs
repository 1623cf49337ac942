//! Search result types for the asset search.
//!
//! This module defines the raw response structures returned from search operations,
//! before hits are resolved back to assets.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single raw hit as returned by the search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawHit {
    /// Document id, equal to the stable identifier of the asset.
    #[serde(rename = "_id")]
    pub id: String,

    /// Physical index the hit was read from.
    #[serde(rename = "_index", default)]
    pub index: String,

    #[serde(rename = "_score", default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(rename = "_source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,

    /// Highlight fragments keyed by field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Value>,

    /// Sort values, present when the request was sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<Value>,
}

impl RawHit {
    pub fn new(id: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index: index.into(),
            score: None,
            source: None,
            highlight: None,
            sort: Vec::new(),
        }
    }
}

/// Parsed search response with hits and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Raw hits in the order returned by the engine.
    pub hits: Vec<RawHit>,

    /// Total number of matching documents.
    /// May be approximate and greater than the number of returned hits.
    pub total: u64,

    /// Aggregation results keyed by aggregation name.
    #[serde(default)]
    pub aggregations: Value,

    /// Suggestion results keyed by suggestion name.
    #[serde(default)]
    pub suggest: Value,
}

impl SearchResult {
    /// Create an empty search result.
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            total: 0,
            aggregations: Value::Null,
            suggest: Value::Null,
        }
    }

    /// Parse the body of a search response.
    ///
    /// The total is read from `hits.total.value`, or from `hits.total` when the engine
    /// reports it as a plain number, and defaults to 0.
    ///
    /// # Errors
    ///
    /// Returns an error if `hits.hits` is present but not a list of hit objects.
    pub fn from_response(response: &Value) -> Result<Self, serde_json::Error> {
        let hits_section = &response["hits"];
        let total = hits_section["total"]["value"]
            .as_u64()
            .or_else(|| hits_section["total"].as_u64())
            .unwrap_or(0);

        let hits = match hits_section.get("hits") {
            Some(hits) => serde_json::from_value(hits.clone())?,
            None => Vec::new(),
        };

        Ok(Self {
            hits,
            total,
            aggregations: response.get("aggregations").cloned().unwrap_or(Value::Null),
            suggest: response.get("suggest").cloned().unwrap_or(Value::Null),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_response() {
        let response = json!({
            "hits": {
                "total": {"value": 42, "relation": "eq"},
                "hits": [
                    {"_id": "a1", "_index": "assets-1", "_score": 1.5, "highlight": {"fulltext.text": ["<em>x</em>"]}},
                    {"_id": "a2", "_index": "assets-1", "sort": [3]}
                ]
            },
            "aggregations": {"types": {"buckets": []}}
        });

        let result = SearchResult::from_response(&response).unwrap();
        assert_eq!(result.total, 42);
        assert_eq!(result.hits.len(), 2);
        assert_eq!(result.hits[0].id, "a1");
        assert_eq!(result.hits[0].score, Some(1.5));
        assert!(result.hits[0].highlight.is_some());
        assert_eq!(result.hits[1].sort, vec![json!(3)]);
        assert!(result.aggregations["types"].is_object());
        assert!(result.suggest.is_null());
    }

    #[test]
    fn test_plain_total_and_missing_hits() {
        let result = SearchResult::from_response(&json!({"hits": {"total": 7}})).unwrap();
        assert_eq!(result.total, 7);
        assert!(result.hits.is_empty());

        let result = SearchResult::from_response(&json!({})).unwrap();
        assert_eq!(result, SearchResult::empty());
    }

    #[test]
    fn test_malformed_hits() {
        let response = json!({"hits": {"hits": [{"_index": "no-id"}]}});
        assert!(SearchResult::from_response(&response).is_err());
    }
}
