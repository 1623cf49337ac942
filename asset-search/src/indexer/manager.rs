//! Coalescing of realtime index changes.

use std::collections::HashMap;
use std::mem;

use tracing::{debug, error, instrument};

use asset_search_repository::SearchIndexError;
use asset_search_shared::Asset;

use crate::indexer::AssetIndexing;

/// Assets keyed by identifier, iterated in the order they were first queued.
#[derive(Debug, Default)]
struct PendingAssets {
    sequence: u64,
    entries: HashMap<String, (u64, Asset)>,
}

impl PendingAssets {
    /// Queue an asset. A queued asset with the same identifier is replaced but
    /// keeps its position.
    fn insert(&mut self, asset: &Asset) {
        match self.entries.get_mut(&asset.identifier) {
            Some((_, queued)) => *queued = asset.clone(),
            None => {
                self.sequence += 1;
                self.entries
                    .insert(asset.identifier.clone(), (self.sequence, asset.clone()));
            }
        }
    }

    fn remove(&mut self, identifier: &str) {
        self.entries.remove(identifier);
    }

    fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn into_ordered(self) -> Vec<Asset> {
        let mut entries: Vec<(u64, Asset)> = self.entries.into_values().collect();
        entries.sort_by_key(|(sequence, _)| *sequence);
        entries.into_iter().map(|(_, asset)| asset).collect()
    }
}

/// Collects pending index and remove operations and hands them to the indexer in batches.
///
/// An asset is pending in at most one of the two queues: the last requested
/// operation wins. Queues are flushed once together they hold more than
/// `batch_size` assets, or explicitly with [`flush_queues`](Self::flush_queues).
pub struct AssetIndexingManager {
    indexer: Box<dyn AssetIndexing>,
    batch_size: usize,
    pending_index: PendingAssets,
    pending_remove: PendingAssets,
}

impl AssetIndexingManager {
    pub fn new(indexer: Box<dyn AssetIndexing>, batch_size: usize) -> Self {
        Self {
            indexer,
            batch_size,
            pending_index: PendingAssets::default(),
            pending_remove: PendingAssets::default(),
        }
    }

    pub async fn index_asset(&mut self, asset: &Asset) -> Result<(), SearchIndexError> {
        self.pending_remove.remove(&asset.identifier);
        self.pending_index.insert(asset);
        self.flush_queues_if_needed().await
    }

    pub async fn remove_asset(&mut self, asset: &Asset) -> Result<(), SearchIndexError> {
        self.pending_index.remove(&asset.identifier);
        self.pending_remove.insert(asset);
        self.flush_queues_if_needed().await
    }

    pub fn is_pending_index(&self, identifier: &str) -> bool {
        self.pending_index.contains(identifier)
    }

    pub fn is_pending_remove(&self, identifier: &str) -> bool {
        self.pending_remove.contains(identifier)
    }

    /// Number of assets waiting in both queues.
    pub fn pending_count(&self) -> usize {
        self.pending_index.len() + self.pending_remove.len()
    }

    async fn flush_queues_if_needed(&mut self) -> Result<(), SearchIndexError> {
        if self.pending_count() > self.batch_size {
            self.flush_queues().await?;
        }
        Ok(())
    }

    /// Hand all pending operations to the indexer, index operations first, and flush it.
    ///
    /// Both queues are emptied before anything is sent, so a failure does not
    /// leave operations behind for a retry. Every operation is attempted; the
    /// first error is returned.
    #[instrument(skip(self), fields(index_count = self.pending_index.len(), remove_count = self.pending_remove.len()))]
    pub async fn flush_queues(&mut self) -> Result<(), SearchIndexError> {
        let to_index = mem::take(&mut self.pending_index).into_ordered();
        let to_remove = mem::take(&mut self.pending_remove).into_ordered();
        debug!("Flushing indexing queues");

        let mut first_error = None;
        for asset in &to_index {
            if let Err(e) = self.indexer.index_asset(asset).await {
                error!(asset = %asset.identifier, error = %e, "Failed to index asset");
                first_error.get_or_insert(e);
            }
        }
        for asset in &to_remove {
            if let Err(e) = self.indexer.remove_asset(asset).await {
                error!(asset = %asset.identifier, error = %e, "Failed to remove asset");
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.indexer.flush().await {
            error!(error = %e, "Failed to flush the indexer");
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingIndexer {
        calls: Arc<Mutex<Vec<String>>>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl AssetIndexing for RecordingIndexer {
        async fn index_asset(&mut self, asset: &Asset) -> Result<(), SearchIndexError> {
            self.calls.lock().unwrap().push(format!("index:{}", asset.identifier));
            if self.fail_on.as_deref() == Some(asset.identifier.as_str()) {
                return Err(SearchIndexError::bulk_index("rejected"));
            }
            Ok(())
        }

        async fn remove_asset(&mut self, asset: &Asset) -> Result<(), SearchIndexError> {
            self.calls.lock().unwrap().push(format!("remove:{}", asset.identifier));
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), SearchIndexError> {
            self.calls.lock().unwrap().push("flush".to_string());
            Ok(())
        }
    }

    fn asset(identifier: &str) -> Asset {
        Asset::new(identifier, format!("{}.pdf", identifier), 10)
    }

    #[tokio::test]
    async fn test_last_operation_wins() {
        let indexer = RecordingIndexer::default();
        let mut manager = AssetIndexingManager::new(Box::new(indexer), 100);

        manager.index_asset(&asset("a")).await.unwrap();
        manager.remove_asset(&asset("a")).await.unwrap();
        assert!(!manager.is_pending_index("a"));
        assert!(manager.is_pending_remove("a"));

        manager.index_asset(&asset("a")).await.unwrap();
        assert!(manager.is_pending_index("a"));
        assert!(!manager.is_pending_remove("a"));
        assert_eq!(manager.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_flushes_when_batch_size_is_exceeded() {
        let indexer = RecordingIndexer::default();
        let calls = indexer.calls.clone();
        let mut manager = AssetIndexingManager::new(Box::new(indexer), 2);

        manager.index_asset(&asset("a")).await.unwrap();
        manager.remove_asset(&asset("b")).await.unwrap();
        assert!(calls.lock().unwrap().is_empty());

        manager.index_asset(&asset("c")).await.unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["index:a", "index:c", "remove:b", "flush"]
        );
        assert_eq!(manager.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_repeated_index_keeps_first_position() {
        let indexer = RecordingIndexer::default();
        let calls = indexer.calls.clone();
        let mut manager = AssetIndexingManager::new(Box::new(indexer), 100);

        manager.index_asset(&asset("a")).await.unwrap();
        manager.index_asset(&asset("b")).await.unwrap();
        manager.index_asset(&asset("a")).await.unwrap();
        manager.flush_queues().await.unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["index:a", "index:b", "flush"]);
    }

    #[tokio::test]
    async fn test_queues_are_cleared_on_failure() {
        let indexer = RecordingIndexer {
            fail_on: Some("a".to_string()),
            ..Default::default()
        };
        let calls = indexer.calls.clone();
        let mut manager = AssetIndexingManager::new(Box::new(indexer), 100);

        manager.index_asset(&asset("a")).await.unwrap();
        manager.index_asset(&asset("b")).await.unwrap();
        assert!(manager.flush_queues().await.is_err());

        assert_eq!(manager.pending_count(), 0);
        assert_eq!(*calls.lock().unwrap(), vec!["index:a", "index:b", "flush"]);
    }
}
