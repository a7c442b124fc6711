//! Capabilities content cache for sensor-sos.
//!
//! Holds the sensor-metadata graph (offerings, procedures,
//! features-of-interest and their hierarchy, supported operations) as
//! immutable snapshots rebuilt from the backing store — completely or one
//! slice at a time — published atomically to concurrent readers, and
//! optionally persisted for warm restart.

pub mod content;
pub mod controller;
pub mod persistence;
pub mod update;
pub mod writable;

pub use content::{CacheSummary, ContentCache};
pub use controller::{CacheController, CacheControllerConfig, CacheError};
pub use persistence::{
    NoPersistence, PersistenceError, PersistenceStrategy, SnapshotFilePersistence,
};
pub use update::{
    rebuild_battery, CacheUpdate, CompositeRebuildFailure, FeatureOfInterestCacheUpdate,
    OfferingCacheUpdate, OperationsCacheUpdate, ProcedureCacheUpdate, UpdateContext,
    UpdateFailure,
};
pub use writable::{InvariantViolation, WritableContentCache};
