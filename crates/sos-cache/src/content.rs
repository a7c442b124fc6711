//! Immutable content cache snapshots.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sos_common::{FeatureOfInterest, Offering, Procedure, SosOperation};

/// Entity counts for operator logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSummary {
    pub offerings: usize,
    pub procedures: usize,
    pub features: usize,
    pub operations: usize,
}

impl std::fmt::Display for CacheSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} offerings, {} procedures, {} features, {} operations",
            self.offerings, self.procedures, self.features, self.operations
        )
    }
}

/// Immutable snapshot of the sensor-metadata graph.
///
/// Entities live in per-collection maps keyed by id; relations between
/// entities are id sets resolved against the same snapshot. A published
/// snapshot is never mutated — new snapshots are built through
/// [`crate::WritableContentCache`] and swapped in whole by the controller.
/// Readers holding a previous snapshot keep a fully consistent view until
/// they drop it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentCache {
    pub(crate) offerings: BTreeMap<String, Offering>,
    pub(crate) procedures: BTreeMap<String, Procedure>,
    pub(crate) features: BTreeMap<String, FeatureOfInterest>,
    pub(crate) operations: BTreeSet<SosOperation>,
    pub(crate) last_updated: Option<DateTime<Utc>>,
}

impl ContentCache {
    /// Look up an offering by id.
    pub fn offering(&self, id: &str) -> Option<&Offering> {
        self.offerings.get(id)
    }

    /// All offerings in id order.
    pub fn offerings(&self) -> impl Iterator<Item = &Offering> {
        self.offerings.values()
    }

    pub fn offering_ids(&self) -> impl Iterator<Item = &str> {
        self.offerings.keys().map(String::as_str)
    }

    /// Look up a procedure by id.
    pub fn procedure(&self, id: &str) -> Option<&Procedure> {
        self.procedures.get(id)
    }

    /// All procedures in id order.
    pub fn procedures(&self) -> impl Iterator<Item = &Procedure> {
        self.procedures.values()
    }

    /// Procedures participating in an offering, in id order. Unknown
    /// offering ids and dangling procedure ids yield nothing.
    pub fn procedures_for_offering(&self, offering_id: &str) -> Vec<&Procedure> {
        match self.offerings.get(offering_id) {
            Some(offering) => offering
                .procedures
                .iter()
                .filter_map(|id| self.procedures.get(id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Look up a feature of interest by id.
    pub fn feature(&self, id: &str) -> Option<&FeatureOfInterest> {
        self.features.get(id)
    }

    /// All features in id order.
    pub fn features(&self) -> impl Iterator<Item = &FeatureOfInterest> {
        self.features.values()
    }

    /// Transitive ancestor closure of a feature (excluding the feature
    /// itself). Shared ancestors are visited once.
    pub fn feature_ancestors(&self, id: &str) -> BTreeSet<String> {
        self.feature_closure(id, |f| &f.parents)
    }

    /// Transitive descendant closure of a feature (excluding the feature
    /// itself).
    pub fn feature_descendants(&self, id: &str) -> BTreeSet<String> {
        self.feature_closure(id, |f| &f.children)
    }

    fn feature_closure<F>(&self, id: &str, edges: F) -> BTreeSet<String>
    where
        F: Fn(&FeatureOfInterest) -> &BTreeSet<String>,
    {
        let mut closure = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(id);

        while let Some(current) = queue.pop_front() {
            if let Some(feature) = self.features.get(current) {
                for next in edges(feature) {
                    if closure.insert(next.clone()) {
                        queue.push_back(next);
                    }
                }
            }
        }

        closure.remove(id);
        closure
    }

    /// Whether the deployment supports an operation.
    pub fn supports_operation(&self, op: SosOperation) -> bool {
        self.operations.contains(&op)
    }

    /// Supported operations in stable order.
    pub fn operations(&self) -> impl Iterator<Item = SosOperation> + '_ {
        self.operations.iter().copied()
    }

    /// When this snapshot was published, if it ever was.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Entity counts for logging.
    pub fn summary(&self) -> CacheSummary {
        CacheSummary {
            offerings: self.offerings.len(),
            procedures: self.procedures.len(),
            features: self.features.len(),
            operations: self.operations.len(),
        }
    }

    /// Equality over entities and relations, ignoring the publication
    /// timestamp. This is the identity that matters for rebuild
    /// idempotence.
    pub fn same_content(&self, other: &ContentCache) -> bool {
        self.offerings == other.offerings
            && self.procedures == other.procedures
            && self.features == other.features
            && self.operations == other.operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WritableContentCache;

    fn feature(id: &str, parents: &[&str]) -> FeatureOfInterest {
        let mut f = FeatureOfInterest::new(id);
        f.parents = parents.iter().map(|p| p.to_string()).collect();
        f
    }

    fn cache_with_features(features: Vec<FeatureOfInterest>) -> ContentCache {
        let mut writable = WritableContentCache::default();
        for f in features {
            writable.insert_feature(f);
        }
        writable.link_feature_children();
        writable.freeze().unwrap()
    }

    #[test]
    fn test_ancestor_closure_walks_transitively() {
        // basin <- river <- station
        let cache = cache_with_features(vec![
            feature("basin", &[]),
            feature("river", &["basin"]),
            feature("station", &["river"]),
        ]);

        let ancestors = cache.feature_ancestors("station");
        assert_eq!(
            ancestors,
            ["river", "basin"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_shared_ancestor_appears_once() {
        // Two networks share one root; the station belongs to both.
        let cache = cache_with_features(vec![
            feature("root", &[]),
            feature("network-a", &["root"]),
            feature("network-b", &["root"]),
            feature("station", &["network-a", "network-b"]),
        ]);

        let ancestors = cache.feature_ancestors("station");
        assert_eq!(ancestors.len(), 3);
        assert!(ancestors.contains("root"));
    }

    #[test]
    fn test_descendant_closure() {
        let cache = cache_with_features(vec![
            feature("basin", &[]),
            feature("river", &["basin"]),
            feature("station", &["river"]),
        ]);

        let descendants = cache.feature_descendants("basin");
        assert_eq!(descendants.len(), 2);
        assert!(descendants.contains("station"));
    }

    #[test]
    fn test_closure_of_unknown_feature_is_empty() {
        let cache = cache_with_features(vec![feature("basin", &[])]);
        assert!(cache.feature_ancestors("nope").is_empty());
    }

    #[test]
    fn test_procedures_for_offering_skips_unknown_offering() {
        let cache = ContentCache::default();
        assert!(cache.procedures_for_offering("ws-2500").is_empty());
    }

    #[test]
    fn test_same_content_ignores_timestamp() {
        let a = cache_with_features(vec![feature("basin", &[])]);
        let mut b = a.clone();
        b.last_updated = None;
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }
}
