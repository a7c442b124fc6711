//! Warm-restart tests: persist a snapshot, reload it from a fresh
//! controller.

use std::sync::Arc;

use sos_cache::{CacheController, CacheControllerConfig, SnapshotFilePersistence};
use sos_store::{InMemoryStore, MetadataStore};
use test_utils::populate_sample_store;

#[tokio::test]
async fn test_shutdown_snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content-cache.json");

    let store = Arc::new(populate_sample_store().await);
    let controller = CacheController::with_standard_battery(
        Arc::clone(&store) as Arc<dyn MetadataStore>,
        Arc::new(SnapshotFilePersistence::new(path.clone())),
        CacheControllerConfig::default(),
    )
    .await;

    controller.rebuild().await.unwrap();
    let persisted = controller.cache();
    controller.shutdown().await;

    // A fresh controller over an empty store warm-starts from the snapshot.
    let empty_store = Arc::new(InMemoryStore::new());
    let restarted = CacheController::with_standard_battery(
        empty_store,
        Arc::new(SnapshotFilePersistence::new(path)),
        CacheControllerConfig::default(),
    )
    .await;

    let loaded = restarted.cache();
    assert!(loaded.same_content(&persisted));
    assert_eq!(
        loaded.feature_ancestors("gauge-1"),
        persisted.feature_ancestors("gauge-1")
    );
}

#[tokio::test]
async fn test_missing_snapshot_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(populate_sample_store().await);

    let controller = CacheController::with_standard_battery(
        store,
        Arc::new(SnapshotFilePersistence::new(dir.path().join("absent.json"))),
        CacheControllerConfig::default(),
    )
    .await;

    assert_eq!(controller.cache().offerings().count(), 0);
    assert!(controller.cache().last_updated().is_none());
}

#[tokio::test]
async fn test_complete_rebuild_writes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("content-cache.json");

    let store = Arc::new(populate_sample_store().await);
    let controller = CacheController::with_standard_battery(
        store,
        Arc::new(SnapshotFilePersistence::new(path.clone())),
        CacheControllerConfig::default(),
    )
    .await;

    assert!(!path.exists());
    controller.rebuild().await.unwrap();
    assert!(path.exists());
}
