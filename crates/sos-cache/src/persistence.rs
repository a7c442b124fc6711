//! Durable snapshot persistence for warm restarts.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::content::ContentCache;
use crate::writable::WritableContentCache;

/// Errors raised while persisting or loading a snapshot.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("snapshot IO error: {0}")]
    Io(String),

    #[error("snapshot serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

/// Durable load/save of content cache snapshots.
///
/// Hooks are invoked by the controller after a successful publication; they
/// never sit on the read path. The snapshot format is owned by the
/// strategy — the only contract is that `load()` returns what `persist*`
/// wrote.
#[async_trait]
pub trait PersistenceStrategy: Send + Sync {
    /// Load the last persisted snapshot as a writable draft, if any.
    async fn load(&self) -> Option<WritableContentCache>;

    async fn persist_on_partial_update(&self, cache: &ContentCache) -> Result<(), PersistenceError>;

    async fn persist_on_complete_update(&self, cache: &ContentCache)
        -> Result<(), PersistenceError>;

    async fn persist_on_shutdown(&self, cache: &ContentCache) -> Result<(), PersistenceError>;

    /// Release any resources the strategy holds.
    async fn cleanup(&self);
}

/// Inert strategy: nothing is persisted, `load()` is always empty.
pub struct NoPersistence;

#[async_trait]
impl PersistenceStrategy for NoPersistence {
    async fn load(&self) -> Option<WritableContentCache> {
        None
    }

    async fn persist_on_partial_update(
        &self,
        _cache: &ContentCache,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn persist_on_complete_update(
        &self,
        _cache: &ContentCache,
    ) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn persist_on_shutdown(&self, _cache: &ContentCache) -> Result<(), PersistenceError> {
        Ok(())
    }

    async fn cleanup(&self) {}
}

/// JSON snapshot file written atomically (temp file + rename).
///
/// Complete updates and shutdown write the snapshot; partial updates are
/// skipped to keep patch latency off the write path.
pub struct SnapshotFilePersistence {
    path: PathBuf,
}

impl SnapshotFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Strategy configured from `SOS_CACHE_SNAPSHOT_PATH`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var("SOS_CACHE_SNAPSHOT_PATH")
            .ok()
            .map(Self::new)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn write_snapshot(&self, cache: &ContentCache) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec(cache)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = ?self.path, bytes = json.len(), "Cache snapshot written");
        Ok(())
    }
}

#[async_trait]
impl PersistenceStrategy for SnapshotFilePersistence {
    async fn load(&self) -> Option<WritableContentCache> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No cache snapshot to load");
                return None;
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to read cache snapshot");
                return None;
            }
        };

        match serde_json::from_slice::<ContentCache>(&bytes) {
            Ok(cache) => {
                info!(
                    path = ?self.path,
                    summary = %cache.summary(),
                    "Loaded cache snapshot"
                );
                Some(WritableContentCache::from_cache(&cache))
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Discarding unreadable cache snapshot");
                None
            }
        }
    }

    async fn persist_on_partial_update(
        &self,
        _cache: &ContentCache,
    ) -> Result<(), PersistenceError> {
        debug!(path = ?self.path, "Skipping snapshot write for partial update");
        Ok(())
    }

    async fn persist_on_complete_update(
        &self,
        cache: &ContentCache,
    ) -> Result<(), PersistenceError> {
        self.write_snapshot(cache).await
    }

    async fn persist_on_shutdown(&self, cache: &ContentCache) -> Result<(), PersistenceError> {
        self.write_snapshot(cache).await
    }

    async fn cleanup(&self) {
        // Best-effort removal of a stale temp file from an interrupted write.
        let tmp = self.tmp_path();
        if tokio::fs::remove_file(&tmp).await.is_ok() {
            debug!(path = ?tmp, "Removed stale snapshot temp file");
        }
    }
}
