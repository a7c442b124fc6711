//! Controller behavior tests: rebuild, publication, failure isolation and
//! concurrency.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use sos_cache::{
    CacheController, CacheControllerConfig, CacheError, CacheUpdate, FeatureOfInterestCacheUpdate,
    NoPersistence, OfferingCacheUpdate, UpdateContext, UpdateFailure,
};
use sos_common::{Offering, SosOperation};
use sos_store::{FeatureRecord, InMemoryStore, MetadataStore, OfferingRecord};
use test_utils::{populate_sample_store, sample_features, FlakyStore, SlowStore};

async fn controller_over(
    store: Arc<dyn MetadataStore>,
    config: CacheControllerConfig,
) -> CacheController {
    CacheController::with_standard_battery(store, Arc::new(NoPersistence), config).await
}

#[tokio::test]
async fn test_rebuild_populates_all_collections() {
    let store = Arc::new(populate_sample_store().await);
    let controller = controller_over(store, CacheControllerConfig::default()).await;

    controller.rebuild().await.unwrap();
    let cache = controller.cache();

    assert_eq!(cache.offerings().count(), 2);
    assert_eq!(cache.procedures().count(), 3);
    assert_eq!(cache.features().count(), 5);
    assert!(cache.supports_operation(SosOperation::GetObservation));

    let weather_procedures = cache.procedures_for_offering("weather");
    assert_eq!(weather_procedures.len(), 2);

    // gauge-1 sits under both the river stretch and the network.
    let ancestors = cache.feature_ancestors("gauge-1");
    assert_eq!(ancestors.len(), 3);
    assert!(ancestors.contains("river-stretch"));
    assert!(ancestors.contains("network"));
    assert!(ancestors.contains("basin"));
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let store = Arc::new(populate_sample_store().await);
    let controller = controller_over(store, CacheControllerConfig::default()).await;

    controller.rebuild().await.unwrap();
    let first = controller.cache();

    controller.rebuild().await.unwrap();
    let second = controller.cache();

    assert!(first.same_content(&second));
}

#[tokio::test]
async fn test_failed_rebuild_keeps_previous_snapshot() {
    let flaky = Arc::new(FlakyStore::new(populate_sample_store().await));
    let controller =
        controller_over(Arc::clone(&flaky) as Arc<dyn MetadataStore>, CacheControllerConfig::default())
            .await;

    controller.rebuild().await.unwrap();
    let before = controller.cache();

    flaky.fail_features(true);
    let err = controller.rebuild().await.unwrap_err();
    match err {
        CacheError::Rebuild(composite) => {
            assert_eq!(composite.failures.len(), 1);
            assert_eq!(composite.failures[0].unit, "features");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // The stale snapshot stays authoritative.
    let after = controller.cache();
    assert!(before.same_content(&after));
    assert!(!controller.is_updating());
}

#[tokio::test]
async fn test_failed_partial_update_leaves_unrelated_collections_untouched() {
    let flaky = Arc::new(FlakyStore::new(populate_sample_store().await));
    let controller =
        controller_over(Arc::clone(&flaky) as Arc<dyn MetadataStore>, CacheControllerConfig::default())
            .await;

    controller.rebuild().await.unwrap();
    let before = controller.cache();

    flaky.fail_features(true);
    let err = controller
        .update(Arc::new(FeatureOfInterestCacheUpdate))
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Update(_)));

    let after = controller.cache();
    assert_eq!(before.offerings().count(), after.offerings().count());
    assert_eq!(before.features().count(), after.features().count());
    assert!(before.same_content(&after));
}

#[tokio::test]
async fn test_partial_update_patches_one_slice() {
    let store = Arc::new(populate_sample_store().await);
    let controller = controller_over(
        Arc::clone(&store) as Arc<dyn MetadataStore>,
        CacheControllerConfig::default(),
    )
    .await;
    controller.rebuild().await.unwrap();

    let mut offerings = store.offerings().await.unwrap();
    offerings.push(OfferingRecord::new("air-quality"));
    store.set_offerings(offerings).await;

    controller
        .update(Arc::new(OfferingCacheUpdate))
        .await
        .unwrap();

    let cache = controller.cache();
    assert!(cache.offering("air-quality").is_some());
    // Untouched collections carry over from the previous snapshot.
    assert_eq!(cache.features().count(), 5);
    assert_eq!(cache.procedures().count(), 3);
}

#[tokio::test]
async fn test_store_removal_is_reflected_without_corrupting_other_features() {
    let store = Arc::new(populate_sample_store().await);
    let controller = controller_over(
        Arc::clone(&store) as Arc<dyn MetadataStore>,
        CacheControllerConfig::default(),
    )
    .await;
    controller.rebuild().await.unwrap();
    assert!(controller.cache().feature_ancestors("gauge-1").contains("network"));

    // Drop the network feature from the backing store.
    let features: Vec<FeatureRecord> = sample_features()
        .into_iter()
        .filter(|f| f.id != "network")
        .collect();
    store.set_features(features).await;

    controller.rebuild().await.unwrap();
    let cache = controller.cache();

    let gauge_ancestors = cache.feature_ancestors("gauge-1");
    assert!(!gauge_ancestors.contains("network"));
    // The rest of the hierarchy survives.
    assert!(gauge_ancestors.contains("river-stretch"));
    assert!(gauge_ancestors.contains("basin"));
    assert!(cache.feature("weather-site-1").is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_second_rebuild_is_rejected_while_one_runs() {
    let sample = Arc::new(populate_sample_store().await);
    let slow = Arc::new(SlowStore::new(sample, Duration::from_millis(150)));
    let controller = Arc::new(
        controller_over(slow as Arc<dyn MetadataStore>, CacheControllerConfig::default()).await,
    );

    let background = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.rebuild().await })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(controller.is_updating());
    assert!(matches!(
        controller.rebuild().await,
        Err(CacheError::RebuildInProgress)
    ));

    background.await.unwrap().unwrap();
    assert!(!controller.is_updating());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_observe_a_torn_snapshot() {
    let store = Arc::new(InMemoryStore::new());
    store
        .set_offerings(vec![
            OfferingRecord::new("a-1"),
            OfferingRecord::new("a-2"),
            OfferingRecord::new("a-3"),
        ])
        .await;

    let slow = Arc::new(SlowStore::new(Arc::clone(&store), Duration::from_millis(5)));
    let controller = Arc::new(
        controller_over(slow as Arc<dyn MetadataStore>, CacheControllerConfig::default()).await,
    );
    controller.rebuild().await.unwrap();

    // Swap the backing rows to generation B and rebuild while readers spin.
    store
        .set_offerings(vec![
            OfferingRecord::new("b-1"),
            OfferingRecord::new("b-2"),
            OfferingRecord::new("b-3"),
        ])
        .await;

    let mut readers = Vec::new();
    for _ in 0..4 {
        let controller = Arc::clone(&controller);
        readers.push(tokio::spawn(async move {
            for _ in 0..500 {
                let cache = controller.cache();
                let ids: Vec<&str> = cache.offering_ids().collect();
                assert_eq!(ids.len(), 3, "partially populated snapshot observed");
                let generation = &ids[0][..1];
                assert!(
                    ids.iter().all(|id| id.starts_with(generation)),
                    "mixed-generation snapshot observed: {:?}",
                    ids
                );
                tokio::task::yield_now().await;
            }
        }));
    }

    controller.rebuild().await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    let cache = controller.cache();
    let ids: Vec<&str> = cache.offering_ids().collect();
    assert_eq!(ids, vec!["b-1", "b-2", "b-3"]);
}

#[tokio::test]
async fn test_unit_timeout_counts_as_failure() {
    let sample = Arc::new(populate_sample_store().await);
    let slow = Arc::new(SlowStore::new(sample, Duration::from_millis(200)));
    let config = CacheControllerConfig {
        update_timeout: Duration::from_millis(20),
    };
    let controller = controller_over(slow as Arc<dyn MetadataStore>, config).await;

    let err = controller.rebuild().await.unwrap_err();
    match err {
        CacheError::Rebuild(composite) => {
            assert_eq!(composite.failures.len(), 4);
            assert!(composite.failures[0].message.contains("timed out"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

/// A complete update that replaces the entire cache with one offering.
struct ReplaceEverythingUpdate;

#[async_trait]
impl CacheUpdate for ReplaceEverythingUpdate {
    fn name(&self) -> &'static str {
        "replace-everything"
    }

    fn is_complete(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &UpdateContext) -> Result<(), UpdateFailure> {
        let mut cache = ctx.cache_mut().await;
        cache.clear_offerings();
        cache.insert_offering(Offering::new("only-offering"));
        Ok(())
    }
}

#[tokio::test]
async fn test_complete_single_update_starts_from_empty_draft() {
    let store = Arc::new(populate_sample_store().await);
    let controller = controller_over(store, CacheControllerConfig::default()).await;
    controller.rebuild().await.unwrap();
    assert_eq!(controller.cache().features().count(), 5);

    controller
        .update(Arc::new(ReplaceEverythingUpdate))
        .await
        .unwrap();

    let cache = controller.cache();
    assert!(cache.offering("only-offering").is_some());
    // Complete updates do not inherit the previous snapshot's entities.
    assert_eq!(cache.features().count(), 0);
    assert_eq!(cache.procedures().count(), 0);
}
