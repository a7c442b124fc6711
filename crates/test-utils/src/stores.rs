//! Backing-store doubles for failure injection and timing control.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use sos_common::SosOperation;
use sos_store::{
    FeatureRecord, MetadataStore, OfferingRecord, ProcedureRecord, StoreError, StoreResult,
};

/// Wraps a store and fails selected queries on demand.
pub struct FlakyStore<S> {
    inner: S,
    fail_offerings: AtomicBool,
    fail_procedures: AtomicBool,
    fail_features: AtomicBool,
    fail_operations: AtomicBool,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fail_offerings: AtomicBool::new(false),
            fail_procedures: AtomicBool::new(false),
            fail_features: AtomicBool::new(false),
            fail_operations: AtomicBool::new(false),
        }
    }

    /// The wrapped store, for adjusting its rows mid-test.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn fail_offerings(&self, fail: bool) {
        self.fail_offerings.store(fail, Ordering::SeqCst);
    }

    pub fn fail_procedures(&self, fail: bool) {
        self.fail_procedures.store(fail, Ordering::SeqCst);
    }

    pub fn fail_features(&self, fail: bool) {
        self.fail_features.store(fail, Ordering::SeqCst);
    }

    pub fn fail_operations(&self, fail: bool) {
        self.fail_operations.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool, query: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Query(format!("injected {} failure", query)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<S: MetadataStore> MetadataStore for FlakyStore<S> {
    async fn offerings(&self) -> StoreResult<Vec<OfferingRecord>> {
        self.check(&self.fail_offerings, "offerings")?;
        self.inner.offerings().await
    }

    async fn procedures(&self) -> StoreResult<Vec<ProcedureRecord>> {
        self.check(&self.fail_procedures, "procedures")?;
        self.inner.procedures().await
    }

    async fn features(&self) -> StoreResult<Vec<FeatureRecord>> {
        self.check(&self.fail_features, "features")?;
        self.inner.features().await
    }

    async fn supported_operations(&self) -> StoreResult<Vec<SosOperation>> {
        self.check(&self.fail_operations, "operations")?;
        self.inner.supported_operations().await
    }
}

/// Wraps a store and delays every query by a fixed duration. Useful for
/// exercising in-progress rebuild states and timeouts.
pub struct SlowStore<S> {
    inner: Arc<S>,
    delay: Duration,
}

impl<S> SlowStore<S> {
    pub fn new(inner: Arc<S>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl<S: MetadataStore> MetadataStore for SlowStore<S> {
    async fn offerings(&self) -> StoreResult<Vec<OfferingRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.offerings().await
    }

    async fn procedures(&self) -> StoreResult<Vec<ProcedureRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.procedures().await
    }

    async fn features(&self) -> StoreResult<Vec<FeatureRecord>> {
        tokio::time::sleep(self.delay).await;
        self.inner.features().await
    }

    async fn supported_operations(&self) -> StoreResult<Vec<SosOperation>> {
        tokio::time::sleep(self.delay).await;
        self.inner.supported_operations().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sos_store::InMemoryStore;

    #[tokio::test]
    async fn test_flaky_store_toggles() {
        let store = FlakyStore::new(InMemoryStore::new());
        assert!(store.offerings().await.is_ok());

        store.fail_offerings(true);
        assert!(store.offerings().await.is_err());
        // Other queries stay healthy.
        assert!(store.features().await.is_ok());

        store.fail_offerings(false);
        assert!(store.offerings().await.is_ok());
    }
}
