//! # Asset Search Repository
//!
//! This crate provides everything that talks to the search engine: the
//! `SearchEngineClient` contract and its OpenSearch implementation, the
//! version specific drivers building bulk operations and administering
//! indices and aliases, and the search request representations driven by
//! the query builder.

pub mod config;
pub mod drivers;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod query;
pub mod types;
pub mod utils;

pub use config::BulkBatchConfig;
pub use drivers::{
    DocumentDriver, DriverFactory, DriverSet, DriverVersion, IndexDriver, IndexerDriver,
    QueryType, RequestDriver, SystemDriver, INDEX_PART_SEPARATOR,
};
pub use errors::SearchIndexError;
pub use interfaces::SearchEngineClient;
pub use opensearch::{get_index_settings, OpenSearchClient};
pub use query::{FilteredQuery, FunctionScoreQuery, SearchRequest};
pub use types::AliasAction;
