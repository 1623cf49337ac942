//! Writing assets to the index.
//!
//! - [`BulkRequestAccumulator`] batches bulk operations
//! - [`AssetIndexer`] shapes documents and owns the index and alias lifecycle
//! - [`AssetIndexingManager`] coalesces realtime changes before they reach the indexer

use async_trait::async_trait;

use asset_search_repository::SearchIndexError;
use asset_search_shared::Asset;

mod asset_indexer;
mod bulk;
mod manager;

pub use asset_indexer::AssetIndexer;
pub use bulk::{BulkRequestAccumulator, BulkRequestPart};
pub use manager::AssetIndexingManager;

/// Queues asset changes for the index.
#[async_trait]
pub trait AssetIndexing: Send {
    /// Queue the document and fulltext operations of an asset.
    async fn index_asset(&mut self, asset: &Asset) -> Result<(), SearchIndexError>;

    /// Queue the removal of an asset.
    async fn remove_asset(&mut self, asset: &Asset) -> Result<(), SearchIndexError>;

    /// Submit everything queued so far.
    async fn flush(&mut self) -> Result<(), SearchIndexError>;
}
