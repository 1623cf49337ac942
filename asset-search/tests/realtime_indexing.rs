//! Integration tests for realtime indexing through the indexing manager.

mod common;

use std::sync::Arc;

use tokio::sync::mpsc;

use asset_search::hooks::{register_realtime_indexing, AssetEvent};
use asset_search::indexer::AssetIndexing;
use asset_search::AssetSearchConfig;
use asset_search_repository::BulkBatchConfig;
use asset_search_shared::Asset;

use common::{dependencies, test_config, InMemoryEngine, InMemoryRepository};

fn asset(identifier: &str) -> Asset {
    Asset::new(identifier, format!("{}.pdf", identifier), 10)
}

#[tokio::test]
async fn test_removal_after_indexing_only_deletes() {
    let engine = InMemoryEngine::new();
    let deps = dependencies(
        engine.clone(),
        Arc::new(InMemoryRepository::new(Vec::new())),
        test_config(),
    )
    .await;
    let handlers =
        register_realtime_indexing(&deps.config, deps.indexing_manager().unwrap()).unwrap();

    handlers.handle(AssetEvent::Created(asset("a1"))).await.unwrap();
    handlers.handle(AssetEvent::Removed(asset("a1"))).await.unwrap();
    {
        let manager = handlers.manager();
        let manager = manager.lock().await;
        assert!(manager.is_pending_remove("a1"));
        assert!(!manager.is_pending_index("a1"));
    }
    handlers.handle(AssetEvent::AllPersisted).await.unwrap();

    let lines = engine.bulk_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["delete"]["_id"], "a1");
}

#[tokio::test]
async fn test_events_from_a_channel_are_flushed_on_close() {
    let engine = InMemoryEngine::new();
    let deps = dependencies(
        engine.clone(),
        Arc::new(InMemoryRepository::new(Vec::new())),
        test_config(),
    )
    .await;
    let handlers =
        register_realtime_indexing(&deps.config, deps.indexing_manager().unwrap()).unwrap();

    let (sender, receiver) = mpsc::channel(16);
    let worker = tokio::spawn({
        let handlers = handlers.clone();
        async move { handlers.run(receiver).await }
    });
    sender.send(AssetEvent::Updated(asset("a1"))).await.unwrap();
    sender.send(AssetEvent::Updated(asset("a2"))).await.unwrap();
    sender.send(AssetEvent::Updated(asset("a1"))).await.unwrap();
    drop(sender);
    worker.await.unwrap().unwrap();

    let ids: Vec<String> = engine
        .bulk_lines()
        .iter()
        .step_by(2)
        .filter(|action| action["update"].get("_index").is_some())
        .map(|action| action["update"]["_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["a1", "a2"]);
}

#[tokio::test]
async fn test_disabled_realtime_indexing_registers_nothing() {
    let engine = InMemoryEngine::new();
    let config = AssetSearchConfig {
        realtime_indexing_enabled: false,
        ..test_config()
    };
    let deps = dependencies(
        engine,
        Arc::new(InMemoryRepository::new(Vec::new())),
        config,
    )
    .await;

    assert!(register_realtime_indexing(&deps.config, deps.indexing_manager().unwrap()).is_none());
}

#[tokio::test]
async fn test_bulk_is_submitted_when_the_element_threshold_is_reached() {
    let engine = InMemoryEngine::new();
    let config = AssetSearchConfig {
        bulk: BulkBatchConfig::new(3, usize::MAX),
        ..test_config()
    };
    let deps = dependencies(
        engine.clone(),
        Arc::new(InMemoryRepository::new(Vec::new())),
        config,
    )
    .await;
    let mut indexer = deps.asset_indexer().unwrap().with_fulltext_enabled(false);
    indexer.set_index_name_postfix("1");

    indexer.remove_asset(&asset("a1")).await.unwrap();
    indexer.remove_asset(&asset("a2")).await.unwrap();
    assert!(engine.bulk_payloads().is_empty());
    assert_eq!(indexer.pending_operations(), 2);

    indexer.remove_asset(&asset("a3")).await.unwrap();
    assert_eq!(engine.bulk_payloads().len(), 1);
    assert_eq!(indexer.pending_operations(), 0);
}

#[tokio::test]
async fn test_flushing_nothing_sends_nothing() {
    let engine = InMemoryEngine::new();
    let deps = dependencies(
        engine.clone(),
        Arc::new(InMemoryRepository::new(Vec::new())),
        test_config(),
    )
    .await;
    let mut indexer = deps.asset_indexer().unwrap();

    indexer.flush().await.unwrap();
    indexer.flush().await.unwrap();

    assert!(engine.bulk_payloads().is_empty());
    assert_eq!(indexer.pending_operations(), 0);
}
