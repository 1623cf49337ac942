//! Resolution of the logical index name.

use asset_search_repository::SearchIndexError;

/// Provides the base name of the asset index.
///
/// The base name doubles as the alias pointing at the live index; physical
/// indices are named `<base>-<postfix>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNameStrategy {
    index_name: String,
}

impl IndexNameStrategy {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
        }
    }

    /// The configured index name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the name is empty or only whitespace.
    pub fn get(&self) -> Result<String, SearchIndexError> {
        let name = self.index_name.trim();
        if name.is_empty() {
            return Err(SearchIndexError::configuration(
                "Index name can not be empty, check the ASSET_INDEX_NAME setting",
            ));
        }
        Ok(name.to_string())
    }
}
