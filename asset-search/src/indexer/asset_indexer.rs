//! Asset indexer and index lifecycle.
//!
//! A full build runs through these steps, each driven by the build command:
//!
//! 1. [`AssetIndexer::create_index`] creates `<alias>-<postfix>` with the mapping
//! 2. [`AssetIndexer::index_asset`] queues every asset, [`AssetIndexer::flush`] submits
//! 3. [`AssetIndexer::refresh`] makes the documents searchable
//! 4. [`AssetIndexer::update_index_alias`] moves the alias to the new index in one atomic call
//! 5. [`AssetIndexer::update_main_alias`] binds the main alias to every index of the build
//! 6. [`AssetIndexer::remove_old_indices`] deletes indices no longer behind the alias

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use asset_search_repository::{
    get_index_settings, AliasAction, BulkBatchConfig, DriverSet, SearchEngineClient,
    SearchIndexError, INDEX_PART_SEPARATOR,
};
use asset_search_shared::{Asset, AssetDocument, FulltextBlock};

use crate::error_handling::ErrorHandlingService;
use crate::extraction::AssetExtractor;
use crate::index_name::IndexNameStrategy;
use crate::indexer::{AssetIndexing, BulkRequestAccumulator};

/// Writes assets to the index and manages the index and alias lifecycle.
///
/// Indexing never writes synchronously: operations are queued in a
/// [`BulkRequestAccumulator`] and only guaranteed to be persisted after [`flush`](AssetIndexing::flush).
pub struct AssetIndexer {
    alias_name: String,
    postfix: String,
    client: Arc<dyn SearchEngineClient>,
    drivers: DriverSet,
    extractor: Arc<dyn AssetExtractor>,
    bulk: BulkRequestAccumulator,
    index_settings: Value,
    fulltext_enabled: bool,
}

impl AssetIndexer {
    /// Create a new indexer writing to the versionless index name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the index name strategy yields an empty name.
    pub fn new(
        index_name_strategy: &IndexNameStrategy,
        client: Arc<dyn SearchEngineClient>,
        drivers: DriverSet,
        extractor: Arc<dyn AssetExtractor>,
        error_handler: Arc<ErrorHandlingService>,
        bulk_config: BulkBatchConfig,
    ) -> Result<Self, SearchIndexError> {
        let alias_name = index_name_strategy.get()?;
        let bulk = BulkRequestAccumulator::new(
            drivers.request.clone(),
            error_handler,
            bulk_config,
            alias_name.clone(),
        );

        Ok(Self {
            alias_name,
            postfix: String::new(),
            client,
            drivers,
            extractor,
            bulk,
            index_settings: get_index_settings(),
            fulltext_enabled: true,
        })
    }

    /// Replace the default settings and mapping applied by [`create_index`](Self::create_index).
    pub fn with_index_settings(mut self, index_settings: Value) -> Self {
        self.index_settings = index_settings;
        self
    }

    /// Whether fulltext operations are queued next to the document operations.
    pub fn with_fulltext_enabled(mut self, enabled: bool) -> Self {
        self.fulltext_enabled = enabled;
        self
    }

    pub fn fulltext_enabled(&self) -> bool {
        self.fulltext_enabled
    }

    /// Name of the alias pointing at the live index.
    pub fn alias_name(&self) -> &str {
        &self.alias_name
    }

    pub fn index_name_postfix(&self) -> &str {
        &self.postfix
    }

    /// Physical index name, the alias name joined with the postfix if one is set.
    pub fn index_name(&self) -> String {
        if self.postfix.is_empty() {
            self.alias_name.clone()
        } else {
            format!("{}{}{}", self.alias_name, INDEX_PART_SEPARATOR, self.postfix)
        }
    }

    /// Target all following operations at the index of a build.
    pub fn set_index_name_postfix(&mut self, postfix: impl Into<String>) {
        self.postfix = postfix.into();
        self.bulk.set_index_name(self.index_name());
    }

    /// Number of operations waiting for the next flush.
    pub fn pending_operations(&self) -> usize {
        self.bulk.len()
    }

    pub async fn index_exists(&self) -> Result<bool, SearchIndexError> {
        self.client.index_exists(&self.index_name()).await
    }

    /// Create the index with the configured settings and mapping.
    ///
    /// An index of the same name is deleted first. In update mode nothing is
    /// recreated and the existing index is reused.
    #[instrument(skip(self), fields(index = %self.index_name()))]
    pub async fn create_index(&self, update: bool) -> Result<(), SearchIndexError> {
        if update {
            warn!("Update mode (development) active, reusing the existing index");
            return Ok(());
        }

        let index_name = self.index_name();
        if self.client.index_exists(&index_name).await? {
            warn!(postfix = %self.postfix, "Deleting index with the same postfix");
            self.client.delete_index(&index_name).await?;
        }
        self.client
            .create_index(&index_name, &self.index_settings)
            .await?;
        info!(index = %index_name, "Created index");
        Ok(())
    }

    /// Make all indexed documents visible to search.
    pub async fn refresh(&self) -> Result<(), SearchIndexError> {
        let index_name = self.index_name();
        info!(index = %index_name, "Refreshing index");
        self.client.refresh_index(&index_name).await
    }

    /// Point the alias at the current index and nothing else.
    ///
    /// The alias is removed from all other indices in the same atomic call. A
    /// physical index occupying the alias name is deleted first.
    ///
    /// # Errors
    ///
    /// Fails if no postfix is set, or if the current index does not exist.
    #[instrument(skip(self), fields(alias = %self.alias_name))]
    pub async fn update_index_alias(&self) -> Result<(), SearchIndexError> {
        if self.postfix.is_empty() {
            return Err(SearchIndexError::validation(
                "The index alias can only be updated after an index name postfix has been set",
            ));
        }

        let index_name = self.index_name();
        if !self.client.index_exists(&index_name).await? {
            return Err(SearchIndexError::index_not_found(&index_name));
        }

        let mut actions = self.alias_cleanup_actions(&self.alias_name).await?;
        actions.push(AliasAction::add(index_name.clone(), self.alias_name.clone()));
        self.drivers.index.alias_actions(&actions).await?;

        info!(index = %index_name, "Alias now points at index");
        Ok(())
    }

    /// Bind the main alias to every index built with the current postfix.
    #[instrument(skip(self), fields(alias = %self.alias_name))]
    pub async fn update_main_alias(&self) -> Result<(), SearchIndexError> {
        let postfix = format!("{}{}", INDEX_PART_SEPARATOR, self.postfix);
        let index_names: Vec<String> = self
            .drivers
            .index
            .index_names_by_prefix(&self.alias_name)
            .await?
            .into_iter()
            .filter(|name| !self.postfix.is_empty() && name.ends_with(&postfix))
            .collect();

        let mut actions = Vec::new();
        if !index_names.is_empty() {
            actions = self.alias_cleanup_actions(&self.alias_name).await?;
            actions.extend(
                index_names
                    .iter()
                    .map(|name| AliasAction::add(name.clone(), self.alias_name.clone())),
            );
        }

        if actions.is_empty() {
            debug!("No indices for the main alias");
            return Ok(());
        }
        self.drivers.index.alias_actions(&actions).await
    }

    /// Delete every index of this alias family that the alias does not point at.
    ///
    /// # Returns
    ///
    /// The names of the deleted indices.
    #[instrument(skip(self), fields(alias = %self.alias_name))]
    pub async fn remove_old_indices(&self) -> Result<Vec<String>, SearchIndexError> {
        let live_indices = self
            .drivers
            .index
            .index_names_by_alias(&self.alias_name)
            .await?;
        let status = self.drivers.system.status().await?;
        let prefix = format!("{}{}", self.alias_name, INDEX_PART_SEPARATOR);

        let stale: Vec<String> = status
            .get("indices")
            .and_then(Value::as_object)
            .map(|indices| {
                indices
                    .keys()
                    .filter(|name| name.starts_with(&prefix))
                    .filter(|name| !live_indices.contains(name))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        for index_name in &stale {
            self.drivers.index.delete_index(index_name).await?;
        }
        Ok(stale)
    }

    /// Whether the alias currently points at any index.
    pub async fn aliases_exist(&self) -> Result<bool, SearchIndexError> {
        Ok(!self
            .drivers
            .index
            .index_names_by_alias(&self.alias_name)
            .await?
            .is_empty())
    }

    async fn alias_cleanup_actions(&self, alias: &str) -> Result<Vec<AliasAction>, SearchIndexError> {
        let index_names = self.drivers.index.index_names_by_alias(alias).await?;
        if index_names.is_empty() {
            self.drivers.index.delete_index(alias).await?;
            return Ok(Vec::new());
        }
        Ok(index_names
            .into_iter()
            .map(|index_name| AliasAction::remove(index_name, alias))
            .collect())
    }
}

#[async_trait]
impl AssetIndexing for AssetIndexer {
    #[instrument(skip(self, asset), fields(asset = %asset.identifier))]
    async fn index_asset(&mut self, asset: &Asset) -> Result<(), SearchIndexError> {
        let content = self.extractor.extract(asset).await;

        let document = serde_json::to_value(AssetDocument::from_asset(asset, &content))
            .map_err(|e| SearchIndexError::serialization(e.to_string()))?;
        let operations =
            self.drivers
                .indexer
                .document(&self.index_name(), &asset.identifier, document);
        self.bulk.add(&operations).await?;

        if self.fulltext_enabled {
            let fulltext = serde_json::to_value(FulltextBlock::from_asset(asset, &content))
                .map_err(|e| SearchIndexError::serialization(e.to_string()))?;
            let operations = self.drivers.indexer.fulltext(&asset.identifier, fulltext);
            self.bulk.add(&operations).await?;
        }
        Ok(())
    }

    async fn remove_asset(&mut self, asset: &Asset) -> Result<(), SearchIndexError> {
        let operations = self.drivers.document.delete(&asset.identifier);
        self.bulk.add(&operations).await?;
        debug!(asset = %asset.identifier, "Removed asset from index");
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SearchIndexError> {
        self.bulk.flush().await
    }
}
