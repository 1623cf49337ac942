//! Asset repository trait definition.
//!
//! The host content repository owns the assets; indexing and search only look
//! them up by identifier and read their binary content.

use async_trait::async_trait;

use asset_search_shared::{Asset, AssetCollection, Tag};

use crate::AssetSearchError;

/// Lookup of assets managed by the host content repository.
///
/// Implementations are injected into the indexer, the extractor and the query
/// builder, which allows tests to use in-memory repositories.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Find an asset by its stable identifier.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Asset))` - If the asset exists
    /// * `Ok(None)` - If no asset has that identifier
    /// * `Err(AssetSearchError)` - If the repository could not be read
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Asset>, AssetSearchError>;

    /// All assets, in a stable order.
    async fn find_all(&self) -> Result<Vec<Asset>, AssetSearchError>;

    /// Read the binary content of an asset.
    async fn read_resource(&self, asset: &Asset) -> std::io::Result<Vec<u8>>;

    /// All tags used by assets, optionally restricted to the assets of a collection.
    ///
    /// Tags are returned once each, in order of first use.
    async fn find_tags(
        &self,
        collection: Option<&AssetCollection>,
    ) -> Result<Vec<Tag>, AssetSearchError> {
        let mut tags: Vec<Tag> = Vec::new();
        for asset in self.find_all().await? {
            if let Some(collection) = collection {
                if !asset
                    .collections
                    .iter()
                    .any(|candidate| candidate.identifier == collection.identifier)
                {
                    continue;
                }
            }
            for tag in asset.tags {
                if !tags.iter().any(|known| known.identifier == tag.identifier) {
                    tags.push(tag);
                }
            }
        }
        Ok(tags)
    }

    /// All collections referenced by assets, once each, in order of first use.
    async fn find_collections(&self) -> Result<Vec<AssetCollection>, AssetSearchError> {
        let mut collections: Vec<AssetCollection> = Vec::new();
        for asset in self.find_all().await? {
            for collection in asset.collections {
                if !collections
                    .iter()
                    .any(|known| known.identifier == collection.identifier)
                {
                    collections.push(collection);
                }
            }
        }
        Ok(collections)
    }
}
