//! Request types shared by the search engine client and the drivers.

use serde::{Deserialize, Serialize};

/// A single action of an atomic alias update.
///
/// Serializes to the wire shape `{"add": {"index": ..., "alias": ...}}` or
/// `{"remove": {"index": ..., "alias": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasAction {
    /// Bind `alias` to `index`.
    Add { index: String, alias: String },
    /// Unbind `alias` from `index`.
    Remove { index: String, alias: String },
}

impl AliasAction {
    pub fn add(index: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Add {
            index: index.into(),
            alias: alias.into(),
        }
    }

    pub fn remove(index: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Remove {
            index: index.into(),
            alias: alias.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_alias_action_wire_shape() {
        let actions = vec![
            AliasAction::remove("assets-1", "assets"),
            AliasAction::add("assets-2", "assets"),
        ];
        assert_eq!(
            serde_json::to_value(&actions).unwrap(),
            json!([
                {"remove": {"index": "assets-1", "alias": "assets"}},
                {"add": {"index": "assets-2", "alias": "assets"}}
            ])
        );
    }
}
