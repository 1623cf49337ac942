//! Utility functions for working with request bodies as JSON trees.
//!
//! Paths are dot separated object keys, e.g. `query.bool.filter.bool.must`. When
//! reading, numeric segments also index into lists (`docs.0.doc`).

use serde_json::{Map, Value};

use crate::errors::SearchIndexError;

/// Read the value at a dotted path.
///
/// # Example
///
/// ```
/// use asset_search_repository::utils::value_at_path;
/// use serde_json::json;
///
/// let request = json!({"query": {"bool": {"must": []}}});
/// assert!(value_at_path(&request, "query.bool.must").unwrap().is_array());
/// assert!(value_at_path(&request, "query.bool.should").is_none());
/// ```
pub fn value_at_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => current.get(segment),
    })
}

/// Mutable access to the value at a dotted path, creating missing objects on the way.
///
/// Intermediate values that are not objects are replaced by empty objects. A missing
/// leaf is created as `null`.
pub fn value_at_path_mut<'v>(value: &'v mut Value, path: &str) -> &'v mut Value {
    path.split('.').fold(value, |current, segment| {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        match current {
            Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
            other => other,
        }
    })
}

/// Set the value at a dotted path, replacing whatever was there.
pub fn set_value_at_path(value: &mut Value, path: &str, new_value: Value) {
    *value_at_path_mut(value, path) = new_value;
}

/// Append an element to the list at a dotted path.
///
/// A missing or `null` value is treated as an empty list.
///
/// # Errors
///
/// Returns a query building error, without touching the tree, if the existing value at
/// the path is not a list.
pub fn append_at_path(value: &mut Value, path: &str, element: Value) -> Result<(), SearchIndexError> {
    if let Some(existing) = value_at_path(value, path) {
        if !existing.is_array() && !existing.is_null() {
            return Err(SearchIndexError::query_building(format!(
                "The element at path \"{}\" was not an array",
                path
            )));
        }
    }

    let target = value_at_path_mut(value, path);
    if target.is_null() {
        *target = Value::Array(Vec::new());
    }
    if let Value::Array(list) = target {
        list.push(element);
    }
    Ok(())
}
