//! OpenSearch implementation of the search engine client.
//!
//! This module provides a concrete implementation of `SearchEngineClient`
//! using OpenSearch as the backend, plus the default index settings and mapping.

mod client;
pub mod index_config;

pub use client::OpenSearchClient;
pub use index_config::get_index_settings;
