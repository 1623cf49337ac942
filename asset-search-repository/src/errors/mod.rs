//! Error types for the asset search repository.
//!
//! This module provides a unified error type for all search engine operations.

mod search_index_error;

pub use search_index_error::SearchIndexError;
