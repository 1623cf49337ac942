//! Query wrapper handing out lazily executed results.

use tracing::debug;

use asset_search_repository::SearchIndexError;

use crate::search::{QueryBuilder, QueryResult, QueryResultCache};

/// A finished query builder, ready to be executed.
#[derive(Clone)]
pub struct Query {
    query_builder: QueryBuilder,
}

impl Query {
    pub fn new(query_builder: QueryBuilder) -> Self {
        Self { query_builder }
    }

    pub fn query_builder(&self) -> &QueryBuilder {
        &self.query_builder
    }

    pub fn query_builder_mut(&mut self) -> &mut QueryBuilder {
        &mut self.query_builder
    }

    /// # Errors
    ///
    /// Returns a query building error for a limit below 1.
    pub fn set_limit(&mut self, limit: usize) -> Result<&mut Self, SearchIndexError> {
        if limit < 1 {
            return Err(SearchIndexError::query_building(
                "Expecting an integer greater than zero for limit",
            ));
        }
        self.query_builder.limit(Some(limit))?;
        Ok(self)
    }

    pub fn limit(&self) -> Option<usize> {
        self.query_builder.limit_value()
    }

    /// # Errors
    ///
    /// Returns a query building error for an offset below 1.
    pub fn set_offset(&mut self, offset: usize) -> Result<&mut Self, SearchIndexError> {
        if offset < 1 {
            return Err(SearchIndexError::query_building(
                "Expecting an integer greater than zero for offset",
            ));
        }
        self.query_builder.from(Some(offset));
        Ok(self)
    }

    pub fn offset(&self) -> Option<usize> {
        self.query_builder.from_value()
    }

    /// Total number of matches reported by the last fetch.
    pub fn count(&self) -> u64 {
        self.query_builder.total_items()
    }

    /// Key of this query in a [`QueryResultCache`].
    pub fn cache_key(&self) -> String {
        QueryResultCache::key(
            self.query_builder.index_name(),
            &self.query_builder.search_request().to_request(),
        )
    }

    /// Wrap the query in a result that executes on first access.
    ///
    /// With `cache_result`, a result cached for the same index and request is
    /// returned instead, and a new result is cached for later calls.
    pub fn execute(self, cache_result: bool) -> QueryResult {
        if !cache_result {
            return QueryResult::new(self);
        }

        let cache = self.query_builder.cache();
        let key = self.cache_key();
        if let Some(result) = cache.get(&key) {
            debug!(key = %key, "Query result served from cache");
            return result;
        }

        let result = QueryResult::new(self);
        cache.insert(key, result.clone());
        result
    }
}
