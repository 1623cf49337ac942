//! Filtered query wrapped in a `function_score` query.

use serde_json::{json, Map, Value};

use crate::errors::SearchIndexError;
use crate::query::{FilteredQuery, SearchRequest};

const SCORE_MODES: [&str; 6] = ["multiply", "first", "sum", "avg", "max", "min"];
const BOOST_MODES: [&str; 6] = ["multiply", "replace", "sum", "avg", "max", "min"];

/// A [`FilteredQuery`] whose query is rescored by score functions.
///
/// As long as no function is registered the request is identical to the plain
/// filtered query.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionScoreQuery {
    query: FilteredQuery,
    function_score: Map<String, Value>,
}

impl Default for FunctionScoreQuery {
    fn default() -> Self {
        Self::new(FilteredQuery::new())
    }
}

impl FunctionScoreQuery {
    pub fn new(query: FilteredQuery) -> Self {
        let mut function_score = Map::new();
        function_score.insert("functions".to_string(), json!([]));
        Self {
            query,
            function_score,
        }
    }

    fn has_functions(&self) -> bool {
        self.function_score
            .get("functions")
            .and_then(Value::as_array)
            .is_some_and(|functions| !functions.is_empty())
    }
}

impl SearchRequest for FunctionScoreQuery {
    fn filtered(&self) -> &FilteredQuery {
        &self.query
    }

    fn filtered_mut(&mut self) -> &mut FilteredQuery {
        &mut self.query
    }

    fn clone_box(&self) -> Box<dyn SearchRequest> {
        Box::new(self.clone())
    }

    fn to_request(&self) -> Value {
        let mut request = self.query.request().clone();
        if !self.has_functions() {
            return request;
        }

        let mut function_score = self.function_score.clone();
        if let Some(query) = request.as_object_mut().and_then(|map| map.remove("query")) {
            function_score.insert("query".to_string(), query);
        }
        request["query"] = json!({ "function_score": function_score });
        request
    }

    /// Set the score functions.
    ///
    /// Accepts either a list of functions or a complete `function_score` body with a
    /// `functions` key, which then replaces every previously set option.
    fn functions(&mut self, functions: Value) -> Result<(), SearchIndexError> {
        match functions {
            Value::Object(body) if body.contains_key("functions") => {
                self.function_score = body;
            }
            Value::Array(_) => {
                self.function_score.insert("functions".to_string(), functions);
            }
            other => {
                return Err(SearchIndexError::query_building(format!(
                    "Invalid score functions: {}",
                    other
                )))
            }
        }
        Ok(())
    }

    fn score_mode(&mut self, score_mode: &str) -> Result<(), SearchIndexError> {
        if !SCORE_MODES.contains(&score_mode) {
            return Err(SearchIndexError::query_building(format!(
                "Invalid score mode \"{}\"",
                score_mode
            )));
        }
        self.function_score
            .insert("score_mode".to_string(), json!(score_mode));
        Ok(())
    }

    fn boost_mode(&mut self, boost_mode: &str) -> Result<(), SearchIndexError> {
        if !BOOST_MODES.contains(&boost_mode) {
            return Err(SearchIndexError::query_building(format!(
                "Invalid boost mode \"{}\"",
                boost_mode
            )));
        }
        self.function_score
            .insert("boost_mode".to_string(), json!(boost_mode));
        Ok(())
    }

    fn max_boost(&mut self, boost: f64) -> Result<(), SearchIndexError> {
        if !boost.is_finite() {
            return Err(SearchIndexError::query_building("Invalid max boost"));
        }
        self.function_score
            .insert("max_boost".to_string(), json!(boost));
        Ok(())
    }

    fn min_score(&mut self, score: f64) -> Result<(), SearchIndexError> {
        if !score.is_finite() {
            return Err(SearchIndexError::query_building("Invalid min score"));
        }
        self.function_score
            .insert("min_score".to_string(), json!(score));
        Ok(())
    }
}
