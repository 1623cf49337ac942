//! Realtime indexing of asset changes.
//!
//! Handlers are registered once at startup. Each asset event is routed to the
//! [`AssetIndexingManager`]; the end of a persistence cycle flushes its queues.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use asset_search_repository::SearchIndexError;
use asset_search_shared::Asset;

use crate::config::AssetSearchConfig;
use crate::indexer::AssetIndexingManager;

/// Changes reported by the host content repository.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetEvent {
    Created(Asset),
    Updated(Asset),
    ResourceReplaced(Asset),
    Removed(Asset),
    /// All pending changes were persisted.
    AllPersisted,
}

/// Event handlers feeding the indexing manager.
#[derive(Clone)]
pub struct RealtimeIndexingHandlers {
    manager: Arc<Mutex<AssetIndexingManager>>,
}

/// Register the realtime indexing handlers if realtime indexing is enabled.
pub fn register_realtime_indexing(
    config: &AssetSearchConfig,
    manager: AssetIndexingManager,
) -> Option<RealtimeIndexingHandlers> {
    if !config.realtime_indexing_enabled {
        info!("Realtime indexing is disabled");
        return None;
    }
    info!(batch_size = config.indexing_batch_size, "Realtime indexing enabled");
    Some(RealtimeIndexingHandlers::new(manager))
}

impl RealtimeIndexingHandlers {
    pub fn new(manager: AssetIndexingManager) -> Self {
        Self {
            manager: Arc::new(Mutex::new(manager)),
        }
    }

    pub fn manager(&self) -> Arc<Mutex<AssetIndexingManager>> {
        self.manager.clone()
    }

    pub async fn handle(&self, event: AssetEvent) -> Result<(), SearchIndexError> {
        let mut manager = self.manager.lock().await;
        match event {
            AssetEvent::Created(asset)
            | AssetEvent::Updated(asset)
            | AssetEvent::ResourceReplaced(asset) => manager.index_asset(&asset).await,
            AssetEvent::Removed(asset) => manager.remove_asset(&asset).await,
            AssetEvent::AllPersisted => manager.flush_queues().await,
        }
    }

    /// Handle events until the channel is closed, then flush what is left.
    ///
    /// A failing event is logged and does not stop the loop.
    pub async fn run(&self, mut events: mpsc::Receiver<AssetEvent>) -> Result<(), SearchIndexError> {
        while let Some(event) = events.recv().await {
            debug!(event = ?event, "Asset event received");
            if let Err(e) = self.handle(event).await {
                error!(error = %e, "Failed to handle asset event");
            }
        }
        self.manager.lock().await.flush_queues().await
    }
}
