//! Search index error types.
//!
//! This module defines the unified error type for all search engine operations,
//! including low-level transport errors, lifecycle errors around indices and aliases,
//! configuration errors and query building errors.

use thiserror::Error;

/// Unified errors from search engine operations.
///
/// Used by the `SearchEngineClient` trait, the drivers and the query representations.
/// Engine responses with an unexpected status are reported as `ApiError` so that callers
/// can reclassify a 404 as "nothing exists yet" via [`SearchIndexError::is_not_found`].
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Validation error (e.g., empty postfix, missing required values).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The engine answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// An index expected to exist does not.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// A bulk request could not be submitted.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to parse response from the search engine.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Failed to serialize data for the search engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Missing or invalid configuration (empty index name, unknown driver version).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A query could not be built from the given arguments.
    #[error("Query building error: {0}")]
    QueryBuildingError(String),

    /// The active request representation does not implement the operation.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an API error from a response status and body.
    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: msg.into(),
        }
    }

    /// Create an index not found error.
    pub fn index_not_found(index_name: &str) -> Self {
        Self::IndexNotFound(index_name.to_string())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationError(msg.into())
    }

    /// Create a query building error.
    pub fn query_building(msg: impl Into<String>) -> Self {
        Self::QueryBuildingError(msg.into())
    }

    /// Create an unsupported operation error.
    pub fn unsupported(operation: &str) -> Self {
        Self::UnsupportedOperation(format!(
            "`{}` is not implemented by the current request type",
            operation
        ))
    }

    /// Whether the engine reported that the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ApiError { status: 404, .. } | Self::IndexNotFound(_)
        )
    }
}
