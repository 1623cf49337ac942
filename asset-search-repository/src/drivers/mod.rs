//! Engine drivers.
//!
//! Every responsibility that depends on the engine's wire protocol is behind its own
//! trait. Each supported protocol version provides one implementation set, and the
//! [`DriverFactory`] resolves the active set once at startup.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::AliasAction;

mod factory;
mod version6;
mod version7;

pub use factory::{DriverFactory, DriverSet, DriverVersion, QueryType};
pub use version6::{
    DocumentDriverV6, IndexDriverV6, IndexerDriverV6, RequestDriverV6, SystemDriverV6,
};
pub use version7::{DocumentDriverV7, IndexerDriverV7};

/// Separator between the parts of an index name, e.g. `assets-1700000000`.
pub const INDEX_PART_SEPARATOR: &str = "-";

/// Builds bulk operations removing documents.
pub trait DocumentDriver: Send + Sync {
    /// Bulk lines deleting the document with the given id.
    fn delete(&self, identifier: &str) -> Vec<Value>;
}

/// Builds bulk operations writing documents.
pub trait IndexerDriver: Send + Sync {
    /// Bulk lines replacing the structured fields of a document while keeping its
    /// fulltext fields.
    ///
    /// # Arguments
    ///
    /// * `index_name` - Physical index the document is written to
    /// * `identifier` - Document id, the asset's stable identifier
    /// * `data` - Structured document fields
    fn document(&self, index_name: &str, identifier: &str, data: Value) -> Vec<Value>;

    /// Bulk lines merging a fulltext block into a document.
    fn fulltext(&self, identifier: &str, fulltext: Value) -> Vec<Value>;
}

/// Index and alias administration.
#[async_trait]
pub trait IndexDriver: Send + Sync {
    /// Apply the alias actions as one atomic call.
    async fn alias_actions(&self, actions: &[AliasAction]) -> Result<(), SearchIndexError>;

    /// Delete an index if it exists.
    async fn delete_index(&self, index_name: &str) -> Result<(), SearchIndexError>;

    /// Names of the indices bound to the alias. An unknown alias yields an empty list.
    async fn index_names_by_alias(&self, alias: &str) -> Result<Vec<String>, SearchIndexError>;

    /// Names of all indices starting with `prefix` followed by the part separator.
    async fn index_names_by_prefix(&self, prefix: &str) -> Result<Vec<String>, SearchIndexError>;
}

/// Transmits bulk requests.
#[async_trait]
pub trait RequestDriver: Send + Sync {
    /// Submit already serialized bulk lines against the index.
    async fn bulk(&self, index_name: &str, lines: &[String]) -> Result<Value, SearchIndexError>;
}

/// Cluster level information.
#[async_trait]
pub trait SystemDriver: Send + Sync {
    /// Index level statistics of the cluster.
    async fn status(&self) -> Result<Value, SearchIndexError>;
}
