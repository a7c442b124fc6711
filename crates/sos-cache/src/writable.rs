//! Mutable builder for content cache snapshots.

use std::collections::BTreeSet;

use chrono::Utc;
use thiserror::Error;

use sos_common::{FeatureOfInterest, Offering, Procedure, SosOperation};

use crate::content::ContentCache;

/// A snapshot failed validation while freezing.
#[derive(Debug, Error)]
#[error("cache invariant violated: {0}")]
pub struct InvariantViolation(pub String);

/// Mutable working copy of a content cache.
///
/// This is the only mutation surface in the crate: update units populate a
/// writable cache, and the controller freezes it into an immutable
/// [`ContentCache`] before publication. Freezing validates the feature
/// graph so a dangling or one-sided link can never reach readers.
#[derive(Debug, Clone, Default)]
pub struct WritableContentCache {
    inner: ContentCache,
}

impl WritableContentCache {
    /// Working copy seeded from an existing snapshot (partial updates).
    pub fn from_cache(cache: &ContentCache) -> Self {
        Self {
            inner: cache.clone(),
        }
    }

    pub fn insert_offering(&mut self, offering: Offering) {
        self.inner.offerings.insert(offering.id.clone(), offering);
    }

    pub fn remove_offering(&mut self, id: &str) -> Option<Offering> {
        self.inner.offerings.remove(id)
    }

    pub fn clear_offerings(&mut self) {
        self.inner.offerings.clear();
    }

    pub fn insert_procedure(&mut self, procedure: Procedure) {
        self.inner
            .procedures
            .insert(procedure.id.clone(), procedure);
    }

    pub fn remove_procedure(&mut self, id: &str) -> Option<Procedure> {
        self.inner.procedures.remove(id)
    }

    pub fn clear_procedures(&mut self) {
        self.inner.procedures.clear();
    }

    pub fn insert_feature(&mut self, feature: FeatureOfInterest) {
        self.inner.features.insert(feature.id.clone(), feature);
    }

    pub fn remove_feature(&mut self, id: &str) -> Option<FeatureOfInterest> {
        self.inner.features.remove(id)
    }

    pub fn clear_features(&mut self) {
        self.inner.features.clear();
    }

    pub fn set_operations(&mut self, operations: BTreeSet<SosOperation>) {
        self.inner.operations = operations;
    }

    /// Read access to the draft, e.g. for cross-checks inside an update.
    pub fn as_cache(&self) -> &ContentCache {
        &self.inner
    }

    /// Recompute every feature's child set as the inverse of the parent
    /// sets. Call after (re)populating features from parent-edge rows.
    pub fn link_feature_children(&mut self) {
        let links: Vec<(String, String)> = self
            .inner
            .features
            .values()
            .flat_map(|f| {
                f.parents
                    .iter()
                    .map(|p| (p.clone(), f.id.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();

        for feature in self.inner.features.values_mut() {
            feature.children.clear();
        }
        for (parent, child) in links {
            if let Some(parent_feature) = self.inner.features.get_mut(&parent) {
                parent_feature.children.insert(child);
            }
        }
    }

    /// Validate the draft and turn it into an immutable snapshot.
    ///
    /// Rejects feature links that point outside the snapshot or that are
    /// not mirrored on the other side. Stamps the publication time.
    pub fn freeze(mut self) -> Result<ContentCache, InvariantViolation> {
        for feature in self.inner.features.values() {
            for parent in &feature.parents {
                match self.inner.features.get(parent) {
                    None => {
                        return Err(InvariantViolation(format!(
                            "feature '{}' references unknown parent '{}'",
                            feature.id, parent
                        )))
                    }
                    Some(p) if !p.children.contains(&feature.id) => {
                        return Err(InvariantViolation(format!(
                            "feature '{}' is not listed as a child of '{}'",
                            feature.id, parent
                        )))
                    }
                    _ => {}
                }
            }
            for child in &feature.children {
                match self.inner.features.get(child) {
                    None => {
                        return Err(InvariantViolation(format!(
                            "feature '{}' references unknown child '{}'",
                            feature.id, child
                        )))
                    }
                    Some(c) if !c.parents.contains(&feature.id) => {
                        return Err(InvariantViolation(format!(
                            "feature '{}' is not listed as a parent of '{}'",
                            feature.id, child
                        )))
                    }
                    _ => {}
                }
            }
        }

        self.inner.last_updated = Some(Utc::now());
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(id: &str, parents: &[&str]) -> FeatureOfInterest {
        let mut f = FeatureOfInterest::new(id);
        f.parents = parents.iter().map(|p| p.to_string()).collect();
        f
    }

    #[test]
    fn test_freeze_stamps_timestamp() {
        let cache = WritableContentCache::default().freeze().unwrap();
        assert!(cache.last_updated().is_some());
    }

    #[test]
    fn test_freeze_rejects_dangling_parent() {
        let mut writable = WritableContentCache::default();
        writable.insert_feature(feature("station", &["ghost"]));

        let err = writable.freeze().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_freeze_rejects_one_sided_link() {
        let mut writable = WritableContentCache::default();
        writable.insert_feature(feature("network", &[]));
        writable.insert_feature(feature("station", &["network"]));
        // children not derived: the parent side of the link is missing

        assert!(writable.freeze().is_err());
    }

    #[test]
    fn test_link_feature_children_inverts_parent_edges() {
        let mut writable = WritableContentCache::default();
        writable.insert_feature(feature("network", &[]));
        writable.insert_feature(feature("station-1", &["network"]));
        writable.insert_feature(feature("station-2", &["network"]));
        writable.link_feature_children();

        let cache = writable.freeze().unwrap();
        let network = cache.feature("network").unwrap();
        assert_eq!(network.children.len(), 2);
    }

    #[test]
    fn test_from_cache_is_a_working_copy() {
        let mut writable = WritableContentCache::default();
        writable.insert_offering(Offering::new("ws-2500"));
        let published = writable.freeze().unwrap();

        let mut copy = WritableContentCache::from_cache(&published);
        copy.remove_offering("ws-2500");

        assert!(published.offering("ws-2500").is_some());
        assert!(copy.as_cache().offering("ws-2500").is_none());
    }
}
