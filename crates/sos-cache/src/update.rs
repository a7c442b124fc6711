//! Cache update units.
//!
//! A [`CacheUpdate`] is one unit of change against a writable draft. Units
//! fetch from the backing store first, without holding any lock, then apply
//! their slice under a short write lock on the shared draft. Failures are
//! values: a store error or a graph defect becomes an [`UpdateFailure`]
//! returned from `execute`, which the controller records and aggregates.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, warn};

use sos_common::{FeatureOfInterest, Offering, Procedure};
use sos_store::{MetadataStore, StoreError};

use crate::writable::WritableContentCache;

/// A single update unit's failure, isolated to that unit.
#[derive(Debug, Clone, Error)]
#[error("cache update '{unit}' failed: {message}")]
pub struct UpdateFailure {
    pub unit: String,
    pub message: String,
}

impl UpdateFailure {
    pub fn new(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            message: message.into(),
        }
    }

    pub fn from_store(unit: &str, err: StoreError) -> Self {
        Self::new(unit, err.to_string())
    }
}

/// Aggregate of every failed unit from a full rebuild.
#[derive(Debug, Error)]
#[error("{}", format_failures(.failures))]
pub struct CompositeRebuildFailure {
    pub failures: Vec<UpdateFailure>,
}

fn format_failures(failures: &[UpdateFailure]) -> String {
    let details: Vec<String> = failures.iter().map(|f| f.to_string()).collect();
    format!(
        "{} cache update unit(s) failed: {}",
        failures.len(),
        details.join("; ")
    )
}

/// Resources handed to an executing update unit.
///
/// The draft cache is shared between concurrently running units; the store
/// handle issues an independent query per call.
#[derive(Clone)]
pub struct UpdateContext {
    store: Arc<dyn MetadataStore>,
    cache: Arc<RwLock<WritableContentCache>>,
}

impl UpdateContext {
    pub fn new(store: Arc<dyn MetadataStore>, cache: Arc<RwLock<WritableContentCache>>) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &dyn MetadataStore {
        self.store.as_ref()
    }

    /// Write access to the shared draft. Hold the guard only while
    /// applying already-fetched data.
    pub async fn cache_mut(&self) -> RwLockWriteGuard<'_, WritableContentCache> {
        self.cache.write().await
    }
}

/// One unit of change against a writable content cache.
#[async_trait]
pub trait CacheUpdate: Send + Sync {
    /// Stable unit name used in failures and logs.
    fn name(&self) -> &'static str;

    /// Whether this unit replaces the whole cache rather than patching a
    /// slice. Complete units start from an empty draft.
    fn is_complete(&self) -> bool {
        false
    }

    async fn execute(&self, ctx: &UpdateContext) -> Result<(), UpdateFailure>;
}

/// Repopulates the offering collection from the backing store.
pub struct OfferingCacheUpdate;

#[async_trait]
impl CacheUpdate for OfferingCacheUpdate {
    fn name(&self) -> &'static str {
        "offerings"
    }

    async fn execute(&self, ctx: &UpdateContext) -> Result<(), UpdateFailure> {
        let records = ctx
            .store()
            .offerings()
            .await
            .map_err(|e| UpdateFailure::from_store(self.name(), e))?;

        let mut offerings = Vec::with_capacity(records.len());
        for record in records {
            let mut offering = Offering::new(record.id);
            offering.name = record.name;
            offering.procedures = record.procedures.into_iter().collect();
            offering.observable_properties = record.observable_properties.into_iter().collect();
            offering.phenomenon_time = record.phenomenon_time;
            offering.envelope = record.envelope;
            offerings.push(offering);
        }

        let mut cache = ctx.cache_mut().await;
        cache.clear_offerings();
        for offering in offerings {
            cache.insert_offering(offering);
        }
        debug!(unit = self.name(), "Cache update applied");
        Ok(())
    }
}

/// Repopulates the procedure collection and derives each procedure's
/// offering memberships from the offering rows.
pub struct ProcedureCacheUpdate;

#[async_trait]
impl CacheUpdate for ProcedureCacheUpdate {
    fn name(&self) -> &'static str {
        "procedures"
    }

    async fn execute(&self, ctx: &UpdateContext) -> Result<(), UpdateFailure> {
        let procedure_records = ctx
            .store()
            .procedures()
            .await
            .map_err(|e| UpdateFailure::from_store(self.name(), e))?;
        let offering_records = ctx
            .store()
            .offerings()
            .await
            .map_err(|e| UpdateFailure::from_store(self.name(), e))?;

        let mut offerings_by_procedure: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for offering in &offering_records {
            for procedure in &offering.procedures {
                offerings_by_procedure
                    .entry(procedure.clone())
                    .or_default()
                    .insert(offering.id.clone());
            }
        }

        let mut procedures = Vec::with_capacity(procedure_records.len());
        for record in procedure_records {
            let mut procedure = Procedure::new(record.id);
            procedure.name = record.name;
            if let Some(offerings) = offerings_by_procedure.remove(&procedure.id) {
                procedure.offerings = offerings;
            }
            procedures.push(procedure);
        }

        let mut cache = ctx.cache_mut().await;
        cache.clear_procedures();
        for procedure in procedures {
            cache.insert_procedure(procedure);
        }
        debug!(unit = self.name(), "Cache update applied");
        Ok(())
    }
}

/// Repopulates the feature-of-interest collection: identifiers, display
/// names, parent/child links and observing procedures.
///
/// Parent references to features absent from the store result are pruned
/// (logged) so the frozen snapshot cannot carry dangling ids. The unit
/// computes the transitive parent closure per feature, memoizing shared
/// ancestors, and fails when the graph turns out to be cyclic.
pub struct FeatureOfInterestCacheUpdate;

#[async_trait]
impl CacheUpdate for FeatureOfInterestCacheUpdate {
    fn name(&self) -> &'static str {
        "features"
    }

    async fn execute(&self, ctx: &UpdateContext) -> Result<(), UpdateFailure> {
        let records = ctx
            .store()
            .features()
            .await
            .map_err(|e| UpdateFailure::from_store(self.name(), e))?;

        let known: BTreeSet<&str> = records.iter().map(|r| r.id.as_str()).collect();

        let mut parents_by_id: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut features = Vec::with_capacity(records.len());
        for record in &records {
            let mut feature = FeatureOfInterest::new(record.id.clone());
            feature.name = record.name.clone();
            feature.procedures = record.procedures.iter().cloned().collect();
            for parent in &record.parents {
                if known.contains(parent.as_str()) {
                    feature.parents.insert(parent.clone());
                } else {
                    warn!(
                        feature = %record.id,
                        parent = %parent,
                        "Dropping reference to unknown parent feature"
                    );
                }
            }
            parents_by_id.insert(feature.id.clone(), feature.parents.clone());
            features.push(feature);
        }

        let mut memo: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut total_links = 0usize;
        for record in &records {
            let closure = parent_closure(&record.id, &parents_by_id, &mut memo, &mut Vec::new())
                .map_err(|cycle| {
                    UpdateFailure::new(
                        self.name(),
                        format!("feature hierarchy contains a cycle through '{}'", cycle),
                    )
                })?;
            total_links += closure.len();
        }
        debug!(
            unit = self.name(),
            features = records.len(),
            ancestor_links = total_links,
            "Computed feature parent closures"
        );

        let mut cache = ctx.cache_mut().await;
        cache.clear_features();
        for feature in features {
            cache.insert_feature(feature);
        }
        cache.link_feature_children();
        debug!(unit = self.name(), "Cache update applied");
        Ok(())
    }
}

/// Transitive parent closure of one feature, memoized across calls so
/// shared ancestors are walked once. Returns the id closing a cycle when
/// the graph is not a DAG.
fn parent_closure(
    id: &str,
    parents_by_id: &BTreeMap<String, BTreeSet<String>>,
    memo: &mut HashMap<String, BTreeSet<String>>,
    stack: &mut Vec<String>,
) -> Result<BTreeSet<String>, String> {
    if let Some(closure) = memo.get(id) {
        return Ok(closure.clone());
    }
    if stack.iter().any(|s| s == id) {
        return Err(id.to_string());
    }

    stack.push(id.to_string());
    let mut closure = BTreeSet::new();
    if let Some(parents) = parents_by_id.get(id) {
        for parent in parents {
            closure.insert(parent.clone());
            closure.extend(parent_closure(parent, parents_by_id, memo, stack)?);
        }
    }
    stack.pop();

    memo.insert(id.to_string(), closure.clone());
    Ok(closure)
}

/// Repopulates the supported-operation set.
pub struct OperationsCacheUpdate;

#[async_trait]
impl CacheUpdate for OperationsCacheUpdate {
    fn name(&self) -> &'static str {
        "operations"
    }

    async fn execute(&self, ctx: &UpdateContext) -> Result<(), UpdateFailure> {
        let operations = ctx
            .store()
            .supported_operations()
            .await
            .map_err(|e| UpdateFailure::from_store(self.name(), e))?;

        let mut cache = ctx.cache_mut().await;
        cache.set_operations(operations.into_iter().collect());
        debug!(unit = self.name(), "Cache update applied");
        Ok(())
    }
}

/// The standard full-rebuild battery.
pub fn rebuild_battery() -> Vec<Arc<dyn CacheUpdate>> {
    vec![
        Arc::new(OfferingCacheUpdate),
        Arc::new(ProcedureCacheUpdate),
        Arc::new(FeatureOfInterestCacheUpdate),
        Arc::new(OperationsCacheUpdate),
    ]
}
