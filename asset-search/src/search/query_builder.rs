//! Fluent query builder over the asset index.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Map, Value};
use tracing::{debug, error, info, instrument};

use asset_search_repository::query::DEFAULT_HIGHLIGHT_FIELD;
use asset_search_repository::{SearchEngineClient, SearchIndexError, SearchRequest};
use asset_search_shared::{Asset, AssetCollection, RawHit, SearchResult, Tag};

use crate::index_name::IndexNameStrategy;
use crate::interfaces::AssetRepository;
use crate::search::hits::convert_hits_to_assets;
use crate::search::{FilterValue, Query, QueryResult, QueryResultCache};

/// Field term suggestions are computed on unless another one is given.
pub const DEFAULT_SUGGESTION_FIELD: &str = "fulltext.text";

/// Name term suggestions are registered under unless another one is given.
pub const DEFAULT_SUGGESTION_NAME: &str = "suggestions";

/// Highlight settings enabled by [`QueryBuilder::fulltext`].
const FULLTEXT_FRAGMENT_SIZE: usize = 150;
const FULLTEXT_FRAGMENT_COUNT: usize = 2;
const DEFAULT_NO_MATCH_SIZE: usize = 150;

/// Item of a more like this query.
#[derive(Debug, Clone, PartialEq)]
pub enum LikeItem {
    /// Free text or a document definition, used as given.
    Literal(Value),
    /// An indexed asset, resolved to its document before the query is built.
    Asset(Asset),
}

impl From<&str> for LikeItem {
    fn from(text: &str) -> Self {
        LikeItem::Literal(Value::from(text))
    }
}

impl From<Value> for LikeItem {
    fn from(value: Value) -> Self {
        LikeItem::Literal(value)
    }
}

impl From<&Asset> for LikeItem {
    fn from(asset: &Asset) -> Self {
        LikeItem::Asset(asset.clone())
    }
}

/// Assets and metadata of one executed search.
#[derive(Debug, Clone, Default)]
pub struct FetchedAssets {
    pub assets: Vec<Asset>,
    pub total: u64,
    pub aggregations: Value,
    pub suggest: Value,
}

/// Builds a search request step by step and runs it against the asset index.
///
/// Every method mutates the builder and returns it for chaining. Methods that
/// validate their input return a `Result` instead. The builder is not
/// immutable: clone it to branch a query.
///
/// ```ignore
/// let result = builder
///     .fulltext("annual report", Map::new())
///     .exact_match("contentType", "application/pdf")?
///     .sort_desc("lastModified")?
///     .limit(Some(20))?
///     .execute(true);
/// ```
#[derive(Clone)]
pub struct QueryBuilder {
    client: Arc<dyn SearchEngineClient>,
    repository: Arc<dyn AssetRepository>,
    index_name: String,
    request: Box<dyn SearchRequest>,
    limit: Option<usize>,
    from: Option<usize>,
    log_message: Option<String>,
    cache: Option<Arc<QueryResultCache>>,
    total_items: u64,
    hits_by_asset: HashMap<String, RawHit>,
}

impl QueryBuilder {
    /// Create a builder searching the alias named by the strategy.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the strategy yields an empty index name.
    pub fn new(
        index_name_strategy: &IndexNameStrategy,
        client: Arc<dyn SearchEngineClient>,
        repository: Arc<dyn AssetRepository>,
        request: Box<dyn SearchRequest>,
    ) -> Result<Self, SearchIndexError> {
        Ok(Self {
            client,
            repository,
            index_name: index_name_strategy.get()?,
            request,
            limit: None,
            from: None,
            log_message: None,
            cache: None,
            total_items: 0,
            hits_by_asset: HashMap::new(),
        })
    }

    /// Use this cache instead of the process wide one.
    pub fn with_cache(mut self, cache: Arc<QueryResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Arc<QueryResultCache> {
        self.cache.clone().unwrap_or_else(QueryResultCache::global)
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn search_request(&self) -> &dyn SearchRequest {
        self.request.as_ref()
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    pub fn from_value(&self) -> Option<usize> {
        self.from
    }

    /// Total number of matches reported by the last fetch.
    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// The raw hit the asset was resolved from in the last fetch.
    pub fn full_hit_for_asset(&self, asset: &Asset) -> Option<&RawHit> {
        self.hits_by_asset.get(&asset.identifier)
    }

    /// Sort values of the asset's hit in the last fetch, empty if it was not sorted.
    pub fn sort_values_for_asset(&self, asset: &Asset) -> Vec<Value> {
        self.full_hit_for_asset(asset)
            .map(|hit| hit.sort.clone())
            .unwrap_or_default()
    }

    /// Add a filter of `filter_type` to a boolean clause of the request.
    ///
    /// # Errors
    ///
    /// Returns a query building error, without changing the request, if the
    /// clause type is not `must`, `should`, `must_not` or `filter`.
    pub fn query_filter(
        &mut self,
        filter_type: &str,
        filter_options: Value,
        clause_type: &str,
    ) -> Result<&mut Self, SearchIndexError> {
        self.request
            .filtered_mut()
            .query_filter(filter_type, filter_options, clause_type)?;
        Ok(self)
    }

    /// Add one filter per entry: `terms` for lists, `term` for everything else.
    /// Null values are skipped.
    pub fn query_filter_multiple(
        &mut self,
        data: &Map<String, Value>,
        clause_type: &str,
    ) -> Result<&mut Self, SearchIndexError> {
        for (property, value) in data {
            match value {
                Value::Null => continue,
                Value::Array(_) => self.query_filter("terms", single(property, value.clone()), clause_type)?,
                _ => self.query_filter("term", single(property, value.clone()), clause_type)?,
            };
        }
        Ok(self)
    }

    /// Only match documents whose property equals the value.
    pub fn exact_match(
        &mut self,
        property: &str,
        value: impl Into<FilterValue>,
    ) -> Result<&mut Self, SearchIndexError> {
        self.query_filter("term", single(property, value.into().into_json()), "must")
    }

    /// Drop documents whose property equals the value.
    pub fn exclude(
        &mut self,
        property: &str,
        value: impl Into<FilterValue>,
    ) -> Result<&mut Self, SearchIndexError> {
        self.query_filter("term", single(property, value.into().into_json()), "must_not")
    }

    pub fn greater_than(
        &mut self,
        property: &str,
        value: impl Into<FilterValue>,
        clause_type: &str,
    ) -> Result<&mut Self, SearchIndexError> {
        self.range(property, "gt", value.into(), clause_type)
    }

    pub fn greater_than_or_equal(
        &mut self,
        property: &str,
        value: impl Into<FilterValue>,
        clause_type: &str,
    ) -> Result<&mut Self, SearchIndexError> {
        self.range(property, "gte", value.into(), clause_type)
    }

    pub fn less_than(
        &mut self,
        property: &str,
        value: impl Into<FilterValue>,
        clause_type: &str,
    ) -> Result<&mut Self, SearchIndexError> {
        self.range(property, "lt", value.into(), clause_type)
    }

    pub fn less_than_or_equal(
        &mut self,
        property: &str,
        value: impl Into<FilterValue>,
        clause_type: &str,
    ) -> Result<&mut Self, SearchIndexError> {
        self.range(property, "lte", value.into(), clause_type)
    }

    fn range(
        &mut self,
        property: &str,
        operator: &str,
        value: FilterValue,
        clause_type: &str,
    ) -> Result<&mut Self, SearchIndexError> {
        let bound = single(operator, value.into_json());
        self.query_filter("range", single(property, bound), clause_type)
    }

    pub fn prefix(
        &mut self,
        property: &str,
        prefix: &str,
        clause_type: &str,
    ) -> Result<&mut Self, SearchIndexError> {
        self.query_filter("prefix", single(property, Value::from(prefix)), clause_type)
    }

    /// Match documents whose geo point lies within `distance` of the given point.
    pub fn geo_distance(
        &mut self,
        property: &str,
        geo_point: Value,
        distance: &str,
        clause_type: &str,
    ) -> Result<&mut Self, SearchIndexError> {
        let mut options = Map::new();
        options.insert("distance".to_string(), Value::from(distance));
        options.insert(property.to_string(), geo_point);
        self.query_filter("geo_distance", Value::Object(options), clause_type)
    }

    /// Restrict the search to the assets of a collection. `None` leaves the query as is.
    pub fn query(
        &mut self,
        collection: Option<&AssetCollection>,
    ) -> Result<&mut Self, SearchIndexError> {
        match collection {
            Some(collection) => self.exact_match("collections", collection),
            None => Ok(self),
        }
    }

    /// Restrict the search to assets carrying the tag.
    pub fn tag(&mut self, tag: &Tag) -> Result<&mut Self, SearchIndexError> {
        self.exact_match("tags", tag.urlized_label())
    }

    /// Restrict the search to assets carrying a tag with this indexed value.
    pub fn tag_value(&mut self, value: &str) -> Result<&mut Self, SearchIndexError> {
        self.exact_match("tags", value)
    }

    pub fn sort_asc(&mut self, property: &str) -> Result<&mut Self, SearchIndexError> {
        self.sort(single(property, json!({"order": "asc"})))
    }

    pub fn sort_desc(&mut self, property: &str) -> Result<&mut Self, SearchIndexError> {
        self.sort(single(property, json!({"order": "desc"})))
    }

    /// Append a sort criterion after those already configured.
    pub fn sort(&mut self, configuration: Value) -> Result<&mut Self, SearchIndexError> {
        self.request.filtered_mut().add_sort_filter(configuration)?;
        Ok(self)
    }

    /// Return at most `limit` hits. `None` leaves the current limit in place.
    ///
    /// The limit bounds the raw hits returned by the engine. Duplicate hits are
    /// only removed afterwards, so a page can hold fewer assets than the limit.
    ///
    /// # Errors
    ///
    /// Returns a query building error for a limit of zero.
    pub fn limit(&mut self, limit: Option<usize>) -> Result<&mut Self, SearchIndexError> {
        let Some(limit) = limit else {
            return Ok(self);
        };
        if limit == 0 {
            return Err(SearchIndexError::query_building(
                "Expecting an integer greater than zero for limit",
            ));
        }
        self.limit = Some(limit);
        self.request.filtered_mut().size(limit);
        Ok(self)
    }

    /// Skip the first `from` hits. `None` and zero leave the request as is.
    pub fn from(&mut self, from: Option<usize>) -> &mut Self {
        if let Some(from) = from.filter(|from| *from > 0) {
            self.from = Some(from);
            self.request.filtered_mut().from(from);
        }
        self
    }

    /// Match the search word against the fulltext block.
    ///
    /// Enables highlighting of the fulltext fields unless highlighting was
    /// configured before.
    pub fn fulltext(&mut self, search_word: &str, options: Map<String, Value>) -> &mut Self {
        let encoded = Value::from(search_word.trim()).to_string();
        let search_word = encoded
            .strip_prefix('"')
            .and_then(|encoded| encoded.strip_suffix('"'))
            .unwrap_or(&encoded);

        let filtered = self.request.filtered_mut();
        filtered.fulltext(search_word, options);
        if filtered.request().get("highlight").is_none() {
            filtered.highlight(
                Some(FULLTEXT_FRAGMENT_SIZE),
                Some(FULLTEXT_FRAGMENT_COUNT),
                DEFAULT_NO_MATCH_SIZE,
                DEFAULT_HIGHLIGHT_FIELD,
            );
        }
        self
    }

    /// Configure highlighting of `field`, or remove highlighting with a `None` fragment size.
    pub fn highlight(
        &mut self,
        fragment_size: Option<usize>,
        fragment_count: Option<usize>,
        no_match_size: usize,
        field: &str,
    ) -> &mut Self {
        self.request
            .filtered_mut()
            .highlight(fragment_size, fragment_count, no_match_size, field);
        self
    }

    pub fn aggregation(
        &mut self,
        name: &str,
        definition: Value,
        parent_path: Option<&str>,
    ) -> Result<&mut Self, SearchIndexError> {
        self.request
            .filtered_mut()
            .aggregation(name, definition, parent_path)?;
        Ok(self)
    }

    /// Aggregate over a single field, e.g. a `terms` aggregation of content types.
    pub fn field_based_aggregation(
        &mut self,
        name: &str,
        field: &str,
        aggregation_type: &str,
        parent_path: Option<&str>,
        size: Option<usize>,
    ) -> Result<&mut Self, SearchIndexError> {
        let mut options = Map::new();
        options.insert("field".to_string(), Value::from(field));
        if let Some(size) = size {
            options.insert("size".to_string(), Value::from(size));
        }
        self.aggregation(name, single(aggregation_type, Value::Object(options)), parent_path)
    }

    pub fn suggestions(&mut self, name: &str, definition: Value) -> &mut Self {
        self.request.filtered_mut().suggestions(name, definition);
        self
    }

    /// Request term suggestions for the text, defaulting to the fulltext text field.
    pub fn term_suggestions(
        &mut self,
        text: &str,
        field: Option<&str>,
        name: Option<&str>,
    ) -> &mut Self {
        let definition = json!({
            "text": text,
            "term": { "field": field.unwrap_or(DEFAULT_SUGGESTION_FIELD) }
        });
        self.suggestions(name.unwrap_or(DEFAULT_SUGGESTION_NAME), definition)
    }

    /// Add a more like this filter.
    ///
    /// Assets are first resolved to their indexed document by a search for their
    /// id on a copy of the current request. Assets without a document are dropped,
    /// and no filter is added if nothing is left to compare with.
    ///
    /// # Errors
    ///
    /// Fails if a lookup search cannot be executed.
    #[instrument(skip_all, fields(items = like.len()))]
    pub async fn more_like_this(
        &mut self,
        like: Vec<LikeItem>,
        fields: Vec<String>,
        options: Map<String, Value>,
    ) -> Result<&mut Self, SearchIndexError> {
        let mut resolved = Vec::with_capacity(like.len());
        for item in like {
            match item {
                LikeItem::Literal(value) => {
                    if !is_blank(&value) {
                        resolved.push(value);
                    }
                }
                LikeItem::Asset(asset) => {
                    if let Some(document) = self.document_for_asset(&asset).await? {
                        resolved.push(document);
                    }
                }
            }
        }

        if !resolved.is_empty() {
            self.request
                .filtered_mut()
                .more_like_this(resolved, fields, options)?;
        }
        Ok(self)
    }

    async fn document_for_asset(&self, asset: &Asset) -> Result<Option<Value>, SearchIndexError> {
        let mut lookup = self.request.clone();
        lookup
            .filtered_mut()
            .query_filter("term", single("_id", Value::from(asset.identifier.as_str())), "must")?;

        let response = self
            .client
            .search(&self.index_name, &lookup.to_request())
            .await?;
        let result = SearchResult::from_response(&response)
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        match result.hits.first() {
            Some(hit) => Ok(Some(json!({ "_id": hit.id, "_index": hit.index }))),
            None => {
                info!(
                    asset = %asset.identifier,
                    "The asset was not found in the index"
                );
                Ok(None)
            }
        }
    }

    /// Set any part of the request, replacing what was there.
    pub fn request(&mut self, path: &str, value: Value) -> &mut Self {
        self.request.filtered_mut().set_by_path(path, value);
        self
    }

    /// Log the request, its timing and result size on execution.
    pub fn log(&mut self, message: impl Into<String>) -> &mut Self {
        self.log_message = Some(message.into());
        self
    }

    pub fn functions(&mut self, functions: Value) -> Result<&mut Self, SearchIndexError> {
        self.request.functions(functions)?;
        Ok(self)
    }

    pub fn score_mode(&mut self, score_mode: &str) -> Result<&mut Self, SearchIndexError> {
        self.request.score_mode(score_mode)?;
        Ok(self)
    }

    pub fn boost_mode(&mut self, boost_mode: &str) -> Result<&mut Self, SearchIndexError> {
        self.request.boost_mode(boost_mode)?;
        Ok(self)
    }

    pub fn max_boost(&mut self, boost: f64) -> Result<&mut Self, SearchIndexError> {
        self.request.max_boost(boost)?;
        Ok(self)
    }

    pub fn min_score(&mut self, score: f64) -> Result<&mut Self, SearchIndexError> {
        self.request.min_score(score)?;
        Ok(self)
    }

    /// Execute the search and resolve its hits to assets.
    ///
    /// A failed search is logged and yields no assets.
    #[instrument(skip(self), fields(index = %self.index_name))]
    pub async fn fetch(&mut self) -> FetchedAssets {
        let request = self.request.to_request();
        let started = Instant::now();

        let result = match self.client.search(&self.index_name, &request).await {
            Ok(response) => SearchResult::from_response(&response)
                .map_err(|e| SearchIndexError::parse(e.to_string())),
            Err(e) => Err(e),
        };
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Search request failed");
                self.total_items = 0;
                self.hits_by_asset.clear();
                return FetchedAssets::default();
            }
        };

        self.total_items = result.total;
        if let Some(message) = &self.log_message {
            debug!(
                log_message = %message,
                request = %request,
                elapsed_ms = started.elapsed().as_millis() as u64,
                limit = ?self.limit,
                hits = result.hits.len(),
                total = result.total,
                "Query log"
            );
        }

        let resolved =
            convert_hits_to_assets(&result.hits, self.repository.as_ref(), self.limit).await;
        if let Some(message) = &self.log_message {
            debug!(log_message = %message, assets = resolved.assets.len(), "Returned assets");
        }
        self.hits_by_asset = resolved.hits_by_identifier;

        FetchedAssets {
            assets: resolved.assets,
            total: result.total,
            aggregations: result.aggregations,
            suggest: result.suggest,
        }
    }

    /// Number of matching documents, from the count endpoint.
    #[instrument(skip(self), fields(index = %self.index_name))]
    pub async fn count(&self) -> Result<u64, SearchIndexError> {
        let request = self.request.to_count_request();
        let started = Instant::now();
        let response = self.client.count(&self.index_name, &request).await?;
        let count = response
            .get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| SearchIndexError::parse("The count response has no count"))?;

        if let Some(message) = &self.log_message {
            debug!(
                log_message = %message,
                request = %request,
                elapsed_ms = started.elapsed().as_millis() as u64,
                total = count,
                "Count query log"
            );
        }
        Ok(count)
    }

    /// A lazily executed result of the current request.
    pub fn execute(&self, cache_result: bool) -> QueryResult {
        Query::new(self.clone()).execute(cache_result)
    }

    /// A lazily executed result that bypasses the result cache.
    pub fn execute_uncached(&self) -> QueryResult {
        self.execute(false)
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
