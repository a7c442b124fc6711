//! Backing-store access for sensor-sos.
//!
//! The cache subsystem reads raw entity rows through the [`MetadataStore`]
//! trait; concrete deployments implement it over their database or service
//! of choice. An in-memory implementation is provided for tests and
//! embedded setups.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sos_common::{SosError, SosOperation, SpatialEnvelope, TimePeriod};

pub use memory::InMemoryStore;

/// Errors raised by backing-store queries.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store query failed: {0}")]
    Query(String),

    #[error("store query timed out")]
    Timeout,
}

impl From<StoreError> for SosError {
    fn from(err: StoreError) -> Self {
        SosError::StorageError(err.to_string())
    }
}

/// Result type for backing-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Raw offering row as the backing store reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferingRecord {
    pub id: String,
    pub name: Option<String>,
    pub procedures: Vec<String>,
    pub observable_properties: Vec<String>,
    pub phenomenon_time: Option<TimePeriod>,
    pub envelope: Option<SpatialEnvelope>,
}

impl OfferingRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            procedures: Vec::new(),
            observable_properties: Vec::new(),
            phenomenon_time: None,
            envelope: None,
        }
    }
}

/// Raw procedure row as the backing store reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureRecord {
    pub id: String,
    pub name: Option<String>,
}

impl ProcedureRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Raw feature-of-interest row with its parent edges and observing
/// procedures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub id: String,
    pub name: Option<String>,
    pub parents: Vec<String>,
    pub procedures: Vec<String>,
}

impl FeatureRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            parents: Vec::new(),
            procedures: Vec::new(),
        }
    }

    pub fn with_parents(mut self, parents: &[&str]) -> Self {
        self.parents = parents.iter().map(|p| p.to_string()).collect();
        self
    }
}

/// Opaque, fallible source of raw sensor metadata.
///
/// Each call issues its own query; implementations must be safe to call
/// from concurrent cache-update units, but a single returned result set is
/// owned exclusively by the unit that fetched it.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// All offerings currently known to the store.
    async fn offerings(&self) -> StoreResult<Vec<OfferingRecord>>;

    /// All procedures currently known to the store.
    async fn procedures(&self) -> StoreResult<Vec<ProcedureRecord>>;

    /// All features of interest with their parent edges.
    async fn features(&self) -> StoreResult<Vec<FeatureRecord>>;

    /// Operations the deployment supports.
    async fn supported_operations(&self) -> StoreResult<Vec<SosOperation>>;
}
