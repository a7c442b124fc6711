//! In-memory metadata store for tests and embedded deployments.

use async_trait::async_trait;
use tokio::sync::RwLock;

use sos_common::SosOperation;

use crate::{FeatureRecord, MetadataStore, OfferingRecord, ProcedureRecord, StoreResult};

/// A [`MetadataStore`] over owned row vectors.
///
/// Rows can be replaced at runtime, so tests can mutate the "database"
/// between cache rebuilds.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    offerings: RwLock<Vec<OfferingRecord>>,
    procedures: RwLock<Vec<ProcedureRecord>>,
    features: RwLock<Vec<FeatureRecord>>,
    operations: RwLock<Vec<SosOperation>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_offerings(&self, rows: Vec<OfferingRecord>) {
        *self.offerings.write().await = rows;
    }

    pub async fn set_procedures(&self, rows: Vec<ProcedureRecord>) {
        *self.procedures.write().await = rows;
    }

    pub async fn set_features(&self, rows: Vec<FeatureRecord>) {
        *self.features.write().await = rows;
    }

    pub async fn set_operations(&self, ops: Vec<SosOperation>) {
        *self.operations.write().await = ops;
    }
}

#[async_trait]
impl MetadataStore for InMemoryStore {
    async fn offerings(&self) -> StoreResult<Vec<OfferingRecord>> {
        Ok(self.offerings.read().await.clone())
    }

    async fn procedures(&self) -> StoreResult<Vec<ProcedureRecord>> {
        Ok(self.procedures.read().await.clone())
    }

    async fn features(&self) -> StoreResult<Vec<FeatureRecord>> {
        Ok(self.features.read().await.clone())
    }

    async fn supported_operations(&self) -> StoreResult<Vec<SosOperation>> {
        Ok(self.operations.read().await.clone())
    }
}
