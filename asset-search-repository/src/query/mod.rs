//! Search request representations.
//!
//! The query builder never writes request JSON itself; it drives a [`SearchRequest`]
//! produced by the active driver set. [`FilteredQuery`] is the plain boolean query,
//! [`FunctionScoreQuery`] additionally supports score functions.

use std::fmt::Debug;

use serde_json::Value;

use crate::errors::SearchIndexError;

mod filtered_query;
mod function_score_query;

pub use filtered_query::{FilteredQuery, DEFAULT_HIGHLIGHT_FIELD, VALID_CLAUSE_TYPES};
pub use function_score_query::FunctionScoreQuery;

/// A mutable search request as understood by one engine version.
///
/// Everything shared by all representations lives on [`FilteredQuery`] and is reached
/// through [`SearchRequest::filtered_mut`]. Operations only some representations support
/// have default implementations failing with [`SearchIndexError::UnsupportedOperation`].
pub trait SearchRequest: Send + Sync + Debug {
    fn filtered(&self) -> &FilteredQuery;

    fn filtered_mut(&mut self) -> &mut FilteredQuery;

    /// Deep copy, used to branch a request without affecting the original.
    fn clone_box(&self) -> Box<dyn SearchRequest>;

    /// The body sent to the search endpoint.
    fn to_request(&self) -> Value {
        self.filtered().request().clone()
    }

    /// The body sent to the count endpoint.
    fn to_count_request(&self) -> Value {
        self.filtered().count_request()
    }

    fn functions(&mut self, _functions: Value) -> Result<(), SearchIndexError> {
        Err(SearchIndexError::unsupported("functions"))
    }

    fn score_mode(&mut self, _score_mode: &str) -> Result<(), SearchIndexError> {
        Err(SearchIndexError::unsupported("score_mode"))
    }

    fn boost_mode(&mut self, _boost_mode: &str) -> Result<(), SearchIndexError> {
        Err(SearchIndexError::unsupported("boost_mode"))
    }

    fn max_boost(&mut self, _boost: f64) -> Result<(), SearchIndexError> {
        Err(SearchIndexError::unsupported("max_boost"))
    }

    fn min_score(&mut self, _score: f64) -> Result<(), SearchIndexError> {
        Err(SearchIndexError::unsupported("min_score"))
    }
}

impl Clone for Box<dyn SearchRequest> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
