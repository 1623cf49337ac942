//! Boolean filtered query.

use serde_json::{json, Map, Value};

use crate::errors::SearchIndexError;
use crate::query::SearchRequest;
use crate::utils::{append_at_path, set_value_at_path, value_at_path_mut};

/// Clause types accepted by [`FilteredQuery::query_filter`].
pub const VALID_CLAUSE_TYPES: [&str; 4] = ["must", "should", "must_not", "filter"];

/// Field pattern highlighted when no other field is requested.
pub const DEFAULT_HIGHLIGHT_FIELD: &str = "fulltext.*";

/// Top level keys the count endpoint rejects.
const UNSUPPORTED_COUNT_FIELDS: [&str; 8] = [
    "fields",
    "sort",
    "from",
    "size",
    "highlight",
    "aggs",
    "aggregations",
    "suggest",
];

/// Request built around a `bool` query whose filters live under
/// `query.bool.filter.bool.<clause>`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredQuery {
    request: Value,
    query_string_parameters: Map<String, Value>,
}

impl Default for FilteredQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl FilteredQuery {
    /// Create a request matching every document, searching the fulltext block with
    /// decreasing weights from `h1` to `text`.
    pub fn new() -> Self {
        let mut parameters = Map::new();
        parameters.insert("default_operator".to_string(), json!("or"));
        parameters.insert(
            "fields".to_string(),
            json!(["fulltext.h1^20", "fulltext.h2^12", "fulltext.h3^10", "fulltext.text^1"]),
        );

        Self::with_query_string_parameters(parameters)
    }

    /// Create a request whose fulltext clause uses the given `query_string` parameters.
    pub fn with_query_string_parameters(query_string_parameters: Map<String, Value>) -> Self {
        Self {
            request: json!({
                "query": {
                    "bool": {
                        "must": [{"match_all": {}}],
                        "filter": {
                            "bool": {
                                "must": [],
                                "should": [],
                                "must_not": []
                            }
                        }
                    }
                }
            }),
            query_string_parameters,
        }
    }

    pub fn request(&self) -> &Value {
        &self.request
    }

    /// The request without the keys the count endpoint does not accept.
    pub fn count_request(&self) -> Value {
        let mut request = self.request.clone();
        if let Value::Object(map) = &mut request {
            for field in UNSUPPORTED_COUNT_FIELDS {
                map.remove(field);
            }
        }
        request
    }

    pub fn size(&mut self, size: usize) {
        self.request["size"] = json!(size);
    }

    pub fn from(&mut self, from: usize) {
        self.request["from"] = json!(from);
    }

    /// Append a sort criterion after the existing ones.
    pub fn add_sort_filter(&mut self, configuration: Value) -> Result<(), SearchIndexError> {
        self.append_at_path("sort", configuration)
    }

    /// Add a `query_string` clause for the search word, merged over the default parameters.
    pub fn fulltext(&mut self, search_word: &str, options: Map<String, Value>) {
        let mut query_string = self.query_string_parameters.clone();
        query_string.extend(options);
        query_string.insert("query".to_string(), json!(search_word));

        let must = value_at_path_mut(&mut self.request, "query.bool.must");
        match must {
            Value::Array(clauses) => clauses.push(json!({ "query_string": query_string })),
            other => *other = json!([{ "query_string": query_string }]),
        }
    }

    /// Add a filter of the given type under the given boolean clause.
    ///
    /// # Errors
    ///
    /// Returns a query building error, leaving the request untouched, if `clause_type`
    /// is not one of `must`, `should`, `must_not` or `filter`.
    pub fn query_filter(
        &mut self,
        filter_type: &str,
        filter_options: Value,
        clause_type: &str,
    ) -> Result<(), SearchIndexError> {
        if !VALID_CLAUSE_TYPES.contains(&clause_type) {
            return Err(SearchIndexError::query_building(format!(
                "The given clause type \"{}\" is not supported. Must be one of \"{}\".",
                clause_type,
                VALID_CLAUSE_TYPES.join("\", \"")
            )));
        }

        let mut filter = Map::new();
        filter.insert(filter_type.to_string(), filter_options);
        self.append_at_path(
            &format!("query.bool.filter.bool.{}", clause_type),
            Value::Object(filter),
        )
    }

    pub fn append_at_path(&mut self, path: &str, data: Value) -> Result<(), SearchIndexError> {
        append_at_path(&mut self.request, path, data)
    }

    pub fn set_by_path(&mut self, path: &str, data: Value) {
        set_value_at_path(&mut self.request, path, data);
    }

    /// Register an aggregation, at the top level or below an existing one.
    ///
    /// `parent_path` names a chain of aggregations separated by dots; the new
    /// aggregation becomes a sub aggregation of the last one.
    ///
    /// # Errors
    ///
    /// Returns a query building error if a segment of `parent_path` does not exist.
    pub fn aggregation(
        &mut self,
        name: &str,
        definition: Value,
        parent_path: Option<&str>,
    ) -> Result<(), SearchIndexError> {
        let mut target = self
            .request
            .as_object_mut()
            .ok_or_else(|| SearchIndexError::query_building("The request is not an object"))?
            .entry("aggregations")
            .or_insert_with(|| json!({}));

        if let Some(parent_path) = parent_path.filter(|path| !path.is_empty()) {
            for segment in parent_path.split('.') {
                let parent = target
                    .get_mut(segment)
                    .filter(|parent| parent.is_object())
                    .ok_or_else(|| {
                        SearchIndexError::query_building(format!(
                            "The parent path segment \"{}\" could not be found when adding a sub aggregation to parent path \"{}\"",
                            segment, parent_path
                        ))
                    })?;
                target = value_at_path_mut(parent, "aggregations");
                if target.is_null() {
                    *target = json!({});
                }
            }
        }

        if !target.is_object() {
            *target = json!({});
        }
        target[name] = definition;
        Ok(())
    }

    pub fn suggestions(&mut self, name: &str, definition: Value) {
        let suggest = value_at_path_mut(&mut self.request, "suggest");
        if !suggest.is_object() {
            *suggest = json!({});
        }
        suggest[name] = definition;
    }

    /// Configure highlighting for a field, or disable it with a `None` fragment size.
    pub fn highlight(
        &mut self,
        fragment_size: Option<usize>,
        fragment_count: Option<usize>,
        no_match_size: usize,
        field: &str,
    ) {
        let Some(fragment_size) = fragment_size else {
            if let Value::Object(map) = &mut self.request {
                map.remove("highlight");
            }
            return;
        };

        let mut settings = json!({
            "fragment_size": fragment_size,
            "no_match_size": no_match_size,
        });
        if let Some(fragment_count) = fragment_count {
            settings["number_of_fragments"] = json!(fragment_count);
        }

        let fields = value_at_path_mut(&mut self.request, "highlight.fields");
        if !fields.is_object() {
            *fields = json!({});
        }
        fields[field] = settings;
    }

    /// Add a `more_like_this` filter for the given like items.
    pub fn more_like_this(
        &mut self,
        like: Vec<Value>,
        fields: Vec<String>,
        options: Map<String, Value>,
    ) -> Result<(), SearchIndexError> {
        let mut more_like_this = options;
        more_like_this.insert("like".to_string(), Value::Array(like));
        if !fields.is_empty() {
            more_like_this.insert("fields".to_string(), json!(fields));
        }

        self.append_at_path(
            "query.bool.filter.bool.must",
            json!({ "more_like_this": more_like_this }),
        )
    }
}

impl SearchRequest for FilteredQuery {
    fn filtered(&self) -> &FilteredQuery {
        self
    }

    fn filtered_mut(&mut self) -> &mut FilteredQuery {
        self
    }

    fn clone_box(&self) -> Box<dyn SearchRequest> {
        Box::new(self.clone())
    }
}
