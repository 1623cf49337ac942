//! Searching the asset index.
//!
//! A [`QueryBuilder`] collects the request, a [`Query`] turns it into a
//! [`QueryResult`] that executes on first access. Results of cached executions
//! are kept in a [`QueryResultCache`].

mod cache;
mod filter_value;
mod hits;
mod query;
mod query_builder;
mod query_result;

#[cfg(test)]
mod test_support;

pub use cache::QueryResultCache;
pub use filter_value::FilterValue;
pub use hits::{convert_hits_to_assets, ResolvedHits};
pub use query::Query;
pub use query_builder::{
    FetchedAssets, LikeItem, QueryBuilder, DEFAULT_SUGGESTION_FIELD, DEFAULT_SUGGESTION_NAME,
};
pub use query_result::QueryResult;
