//! Values accepted by the filter helpers of the query builder.

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;

use asset_search_shared::{Asset, AssetCollection, Tag, DATE_FORMAT};

/// A filter operand before it is written into the request.
///
/// Entities are referenced by their stable identifier and dates are written
/// in the same format the indexer uses for `lastModified`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Json(Value),
    Identifier(String),
    Date(DateTime<FixedOffset>),
}

impl FilterValue {
    pub fn into_json(self) -> Value {
        match self {
            FilterValue::Json(value) => value,
            FilterValue::Identifier(identifier) => Value::String(identifier),
            FilterValue::Date(date) => Value::String(date.format(DATE_FORMAT).to_string()),
        }
    }
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        FilterValue::Json(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Json(Value::from(value))
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Json(Value::from(value))
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Json(Value::from(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Json(Value::from(value))
    }
}

impl From<u64> for FilterValue {
    fn from(value: u64) -> Self {
        FilterValue::Json(Value::from(value))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Json(Value::from(value))
    }
}

impl From<&Asset> for FilterValue {
    fn from(asset: &Asset) -> Self {
        FilterValue::Identifier(asset.identifier.clone())
    }
}

impl From<&Tag> for FilterValue {
    fn from(tag: &Tag) -> Self {
        FilterValue::Identifier(tag.identifier.clone())
    }
}

impl From<&AssetCollection> for FilterValue {
    fn from(collection: &AssetCollection) -> Self {
        FilterValue::Identifier(collection.identifier.clone())
    }
}

impl From<DateTime<FixedOffset>> for FilterValue {
    fn from(date: DateTime<FixedOffset>) -> Self {
        FilterValue::Date(date)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(date: DateTime<Utc>) -> Self {
        FilterValue::Date(date.fixed_offset())
    }
}
