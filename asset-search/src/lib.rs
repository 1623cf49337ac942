//! # Asset Search
//!
//! Indexes the binary assets of a content repository into OpenSearch and
//! exposes a fluent query builder over the resulting index.
//!
//! ## Architecture
//!
//! The write side follows a build/populate/swap cycle:
//!
//! 1. **Extractor**: Pulls text and metadata out of the asset's bytes through an ingest pipeline
//! 2. **Indexer**: Shapes documents and queues them in a bulk accumulator
//! 3. **Alias lifecycle**: Swaps the alias to the freshly built index and removes stale ones
//! 4. **Indexing manager**: Coalesces realtime changes before they reach the indexer
//!
//! The read side is the [`search::QueryBuilder`], executed through a
//! [`search::Query`] into a lazily materialized [`search::QueryResult`].
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`command`]: The `build` and `cleanup` commands and their phases
//! - [`extraction`]: Content extraction
//! - [`indexer`]: Bulk accumulator, asset indexer and indexing manager
//! - [`search`]: Query builder, query, result and result cache
//! - [`hooks`]: Realtime indexing event handlers
//! - [`errors`]: Error types for the commands

pub mod command;
pub mod config;
pub mod data_source;
pub mod error_handling;
pub mod errors;
pub mod extraction;
pub mod hooks;
pub mod index_name;
pub mod indexer;
pub mod interfaces;
pub mod repository;
pub mod search;

pub use config::{AssetSearchConfig, Dependencies};
pub use error_handling::ErrorHandlingService;
pub use errors::CommandError;
pub use index_name::IndexNameStrategy;

use asset_search_repository::SearchIndexError;
use thiserror::Error;

/// Errors that can occur during initialization or execution.
#[derive(Error, Debug)]
pub enum AssetSearchError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Search engine error.
    #[error("Search error: {0}")]
    Search(#[from] SearchIndexError),

    /// Command error.
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Asset repository error.
    #[error("Repository error: {0}")]
    Repository(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AssetSearchError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a repository error.
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
