//! OpenSearch index configuration and mappings.
//!
//! This module defines the default index settings and mappings for the asset index.

use serde_json::{json, Value};

/// Field holding the merged fulltext block of a document.
pub const FULLTEXT_FIELD: &str = "fulltext";

/// Field holding the fulltext block contributed by each source, keyed by source identifier.
pub const FULLTEXT_PARTS_FIELD: &str = "fulltext_parts";

/// Get the default index settings and mappings for the asset index.
///
/// The configuration includes:
/// - **Keyword fields**: collections, tags, content type and filename for exact filtering
/// - **Text fields**: title, caption and copyright notice with a keyword sub field for sorting
/// - **Fulltext block**: `fulltext.h1` to `fulltext.text`, searched with different weights
/// - **Fulltext parts**: stored but not indexed, used to rebuild the block on partial updates
///
/// # Sharding Configuration
///
/// - 1 primary shard
/// - 1 replica for redundancy
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": {
                "title": {
                    "type": "text",
                    "fields": {
                        "raw": {
                            "type": "keyword",
                            "ignore_above": 256
                        }
                    }
                },
                "caption": {
                    "type": "text"
                },
                "copyrightNotice": {
                    "type": "text"
                },
                "lastModified": {
                    "type": "date",
                    "format": "date_time_no_millis"
                },
                "collections": {
                    "type": "keyword"
                },
                "tags": {
                    "type": "keyword"
                },
                "contentLength": {
                    "type": "long"
                },
                "contentType": {
                    "type": "keyword"
                },
                "fileSize": {
                    "type": "long"
                },
                "filename": {
                    "type": "keyword",
                    "fields": {
                        "text": {
                            "type": "text"
                        }
                    }
                },
                (FULLTEXT_FIELD): {
                    "properties": {
                        "h1": { "type": "text" },
                        "h2": { "type": "text" },
                        "h3": { "type": "text" },
                        "text": { "type": "text" }
                    }
                },
                (FULLTEXT_PARTS_FIELD): {
                    "type": "object",
                    "enabled": false
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_settings_structure() {
        let settings = get_index_settings();

        assert!(settings["settings"]["number_of_shards"].is_number());
        assert!(settings["settings"]["number_of_replicas"].is_number());

        let properties = &settings["mappings"]["properties"];
        assert_eq!(properties["collections"]["type"], "keyword");
        assert_eq!(properties["tags"]["type"], "keyword");
        assert_eq!(properties["lastModified"]["type"], "date");
        assert_eq!(properties["fulltext"]["properties"]["h1"]["type"], "text");
        assert_eq!(properties["fulltext_parts"]["enabled"], false);
    }
}
