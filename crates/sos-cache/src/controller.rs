//! Cache controller: owns the live snapshot and serializes rebuilds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use sos_common::SosError;
use sos_store::MetadataStore;

use crate::content::ContentCache;
use crate::persistence::PersistenceStrategy;
use crate::update::{
    rebuild_battery, CacheUpdate, CompositeRebuildFailure, UpdateContext, UpdateFailure,
};
use crate::writable::{InvariantViolation, WritableContentCache};

/// Errors raised by cache controller operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A second full rebuild was attempted while one is in progress.
    #[error("a full cache rebuild is already in progress")]
    RebuildInProgress,

    /// A single update unit failed; the published cache is untouched.
    #[error(transparent)]
    Update(#[from] UpdateFailure),

    /// One or more units of a full rebuild failed; the previous snapshot
    /// remains authoritative.
    #[error(transparent)]
    Rebuild(#[from] CompositeRebuildFailure),

    /// A draft failed validation while freezing.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl From<CacheError> for SosError {
    fn from(err: CacheError) -> Self {
        SosError::CacheError(err.to_string())
    }
}

/// Controller tunables.
#[derive(Debug, Clone)]
pub struct CacheControllerConfig {
    /// How long a single update unit may run; an elapsed timeout counts as
    /// that unit's failure.
    pub update_timeout: Duration,
}

impl Default for CacheControllerConfig {
    fn default() -> Self {
        Self {
            update_timeout: Duration::from_secs(30),
        }
    }
}

impl CacheControllerConfig {
    /// Configuration from environment variables.
    ///
    /// `SOS_CACHE_UPDATE_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Self {
        let secs = std::env::var("SOS_CACHE_UPDATE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        Self {
            update_timeout: Duration::from_secs(secs),
        }
    }
}

/// Owns the published [`ContentCache`] reference and every path that can
/// replace it.
///
/// Readers take `cache()` — a lock-free load of the current snapshot — and
/// are never blocked by an in-flight rebuild; the reference is swapped only
/// after a draft has been fully built and validated. Full rebuilds are
/// serialized through a controller-held gate: a second concurrent rebuild
/// is rejected, never interleaved. Construct one controller at process
/// start and share it by reference.
pub struct CacheController {
    current: ArcSwap<ContentCache>,
    store: Arc<dyn MetadataStore>,
    persistence: Arc<dyn PersistenceStrategy>,
    battery: Vec<Arc<dyn CacheUpdate>>,
    gate: Mutex<()>,
    updating: AtomicBool,
    update_timeout: Duration,
}

impl CacheController {
    /// Create a controller with an explicit update battery.
    ///
    /// Attempts a warm start from the persistence strategy; a missing or
    /// invalid snapshot falls back to an empty cache.
    pub async fn new(
        store: Arc<dyn MetadataStore>,
        persistence: Arc<dyn PersistenceStrategy>,
        battery: Vec<Arc<dyn CacheUpdate>>,
        config: CacheControllerConfig,
    ) -> Self {
        let initial = match persistence.load().await {
            Some(draft) => match draft.freeze() {
                Ok(cache) => {
                    info!(summary = %cache.summary(), "Starting from persisted cache snapshot");
                    cache
                }
                Err(e) => {
                    warn!(error = %e, "Persisted snapshot failed validation, starting empty");
                    ContentCache::default()
                }
            },
            None => ContentCache::default(),
        };

        Self {
            current: ArcSwap::from_pointee(initial),
            store,
            persistence,
            battery,
            gate: Mutex::new(()),
            updating: AtomicBool::new(false),
            update_timeout: config.update_timeout,
        }
    }

    /// Create a controller with the standard full-rebuild battery.
    pub async fn with_standard_battery(
        store: Arc<dyn MetadataStore>,
        persistence: Arc<dyn PersistenceStrategy>,
        config: CacheControllerConfig,
    ) -> Self {
        Self::new(store, persistence, rebuild_battery(), config).await
    }

    /// The currently published snapshot. Lock-free; never blocks on an
    /// in-flight rebuild. A returned snapshot stays valid for as long as
    /// the caller holds it.
    pub fn cache(&self) -> Arc<ContentCache> {
        self.current.load_full()
    }

    /// Whether a full rebuild (or complete single update) is in progress.
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }

    /// Run the full rebuild battery and publish the result.
    ///
    /// All units run concurrently on the worker pool and are joined before
    /// publication. If any unit fails, the previous snapshot stays
    /// published and the aggregated failures are returned.
    pub async fn rebuild(&self) -> Result<(), CacheError> {
        let _gate = self
            .gate
            .try_lock()
            .map_err(|_| CacheError::RebuildInProgress)?;

        self.updating.store(true, Ordering::SeqCst);
        let result = self.run_full_rebuild().await;
        self.updating.store(false, Ordering::SeqCst);
        result
    }

    async fn run_full_rebuild(&self) -> Result<(), CacheError> {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, units = self.battery.len(), "Starting full cache rebuild");

        let draft = Arc::new(RwLock::new(WritableContentCache::default()));
        let failures = self.run_battery(&draft, run_id).await;

        if !failures.is_empty() {
            warn!(
                run_id = %run_id,
                failed = failures.len(),
                "Cache rebuild failed, keeping previous snapshot"
            );
            return Err(CacheError::Rebuild(CompositeRebuildFailure { failures }));
        }

        let snapshot = draft.read().await.clone().freeze()?;
        let summary = snapshot.summary();
        self.current.store(Arc::new(snapshot));
        info!(run_id = %run_id, summary = %summary, "Published rebuilt cache");

        if let Err(e) = self
            .persistence
            .persist_on_complete_update(&self.cache())
            .await
        {
            warn!(run_id = %run_id, error = %e, "Failed to persist rebuilt cache");
        }
        Ok(())
    }

    async fn run_battery(
        &self,
        draft: &Arc<RwLock<WritableContentCache>>,
        run_id: Uuid,
    ) -> Vec<UpdateFailure> {
        let ctx = UpdateContext::new(Arc::clone(&self.store), Arc::clone(draft));
        let mut tasks: JoinSet<Result<(), UpdateFailure>> = JoinSet::new();

        for unit in &self.battery {
            let unit = Arc::clone(unit);
            let ctx = ctx.clone();
            let timeout = self.update_timeout;
            tasks.spawn(async move {
                let name = unit.name();
                match tokio::time::timeout(timeout, unit.execute(&ctx)).await {
                    Ok(result) => result,
                    Err(_) => Err(UpdateFailure::new(
                        name,
                        format!("timed out after {}s", timeout.as_secs()),
                    )),
                }
            });
        }

        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(failure)) => {
                    warn!(
                        run_id = %run_id,
                        unit = %failure.unit,
                        error = %failure.message,
                        "Cache update unit failed"
                    );
                    failures.push(failure);
                }
                Err(e) => {
                    failures.push(UpdateFailure::new("worker", format!("update task died: {}", e)));
                }
            }
        }
        failures
    }

    /// Run a single update unit and publish the result.
    ///
    /// A complete unit starts from an empty draft and is rejected while a
    /// full rebuild runs; a partial unit starts from a clone of the current
    /// snapshot and queues behind any in-flight rebuild, so two drafts are
    /// never live at once. A failed unit discards its draft and leaves the
    /// published cache untouched.
    pub async fn update(&self, unit: Arc<dyn CacheUpdate>) -> Result<(), CacheError> {
        if unit.is_complete() {
            let _gate = self
                .gate
                .try_lock()
                .map_err(|_| CacheError::RebuildInProgress)?;
            self.updating.store(true, Ordering::SeqCst);
            let result = self
                .run_single(unit, WritableContentCache::default(), true)
                .await;
            self.updating.store(false, Ordering::SeqCst);
            result
        } else {
            let _gate = self.gate.lock().await;
            let seed = WritableContentCache::from_cache(&self.cache());
            self.run_single(unit, seed, false).await
        }
    }

    async fn run_single(
        &self,
        unit: Arc<dyn CacheUpdate>,
        seed: WritableContentCache,
        complete: bool,
    ) -> Result<(), CacheError> {
        let name = unit.name();
        let draft = Arc::new(RwLock::new(seed));
        let ctx = UpdateContext::new(Arc::clone(&self.store), Arc::clone(&draft));

        match tokio::time::timeout(self.update_timeout, unit.execute(&ctx)).await {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => {
                warn!(unit = name, error = %failure.message, "Cache update failed");
                return Err(CacheError::Update(failure));
            }
            Err(_) => {
                return Err(CacheError::Update(UpdateFailure::new(
                    name,
                    format!("timed out after {}s", self.update_timeout.as_secs()),
                )));
            }
        }

        let snapshot = draft.read().await.clone().freeze()?;
        let summary = snapshot.summary();
        self.current.store(Arc::new(snapshot));
        info!(unit = name, complete, summary = %summary, "Published updated cache");

        let persisted = if complete {
            self.persistence
                .persist_on_complete_update(&self.cache())
                .await
        } else {
            self.persistence
                .persist_on_partial_update(&self.cache())
                .await
        };
        if let Err(e) = persisted {
            warn!(unit = name, error = %e, "Failed to persist updated cache");
        }
        Ok(())
    }

    /// Release any resources held by the persistence strategy.
    pub async fn cleanup(&self) {
        self.persistence.cleanup().await;
    }

    /// Persist the current snapshot and release persistence resources.
    pub async fn shutdown(&self) {
        let cache = self.cache();
        if let Err(e) = self.persistence.persist_on_shutdown(&cache).await {
            warn!(error = %e, "Failed to persist cache on shutdown");
        }
        self.cleanup().await;
    }
}
