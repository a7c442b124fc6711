//! Domain entities of the sensor-metadata graph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::envelope::{SpatialEnvelope, TimePeriod};

/// An observation offering: a published grouping of procedures and the
/// properties they observe, with its temporal and spatial extent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    /// Unique offering identifier.
    pub id: String,

    /// Human-readable name, if the provider supplies one.
    pub name: Option<String>,

    /// Identifiers of procedures contributing to this offering.
    pub procedures: BTreeSet<String>,

    /// Identifiers of observed properties available from this offering.
    pub observable_properties: BTreeSet<String>,

    /// Phenomenon time extent over all observations in the offering.
    pub phenomenon_time: Option<TimePeriod>,

    /// Spatial extent over all sampled features in the offering.
    pub envelope: Option<SpatialEnvelope>,
}

impl Offering {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            procedures: BTreeSet::new(),
            observable_properties: BTreeSet::new(),
            phenomenon_time: None,
            envelope: None,
        }
    }
}

/// A procedure (sensor, sensor system or computation) producing observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    /// Unique procedure identifier.
    pub id: String,

    /// Human-readable name, if the provider supplies one.
    pub name: Option<String>,

    /// Identifiers of offerings this procedure participates in.
    pub offerings: BTreeSet<String>,
}

impl Procedure {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            offerings: BTreeSet::new(),
        }
    }
}

/// A feature of interest: the real-world feature an observation targets.
///
/// Features form a directed acyclic graph via parent/child links (a sampled
/// station may belong to several networks). Links are stored as identifier
/// sets and resolved against the enclosing snapshot, never as owning
/// references between entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureOfInterest {
    /// Unique feature identifier.
    pub id: String,

    /// Human-readable name, if the provider supplies one.
    pub name: Option<String>,

    /// Identifiers of direct parent features.
    pub parents: BTreeSet<String>,

    /// Identifiers of direct child features.
    pub children: BTreeSet<String>,

    /// Identifiers of procedures observing this feature.
    pub procedures: BTreeSet<String>,
}

impl FeatureOfInterest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
            procedures: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offering_new_is_empty() {
        let off = Offering::new("ws-2500");
        assert_eq!(off.id, "ws-2500");
        assert!(off.name.is_none());
        assert!(off.procedures.is_empty());
        assert!(off.phenomenon_time.is_none());
    }

    #[test]
    fn test_feature_links_are_sets() {
        let mut f = FeatureOfInterest::new("station-1");
        f.parents.insert("network-a".to_string());
        f.parents.insert("network-a".to_string());
        assert_eq!(f.parents.len(), 1);
    }
}
