//! Spatial and temporal envelope types for sensor metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Axis-aligned spatial envelope in WGS 84 decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialEnvelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl SpatialEnvelope {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Envelope around a single point.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// Smallest envelope containing both `self` and `other`.
    pub fn union(&self, other: &SpatialEnvelope) -> SpatialEnvelope {
        SpatialEnvelope {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Check whether a point lies inside the envelope (inclusive).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// A closed time period bounding observed phenomenon times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimePeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Period covering a single instant.
    pub fn instant(t: DateTime<Utc>) -> Self {
        Self { start: t, end: t }
    }

    /// Smallest period containing both `self` and `other`.
    pub fn union(&self, other: &TimePeriod) -> TimePeriod {
        TimePeriod {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Check whether an instant falls within the period (inclusive).
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}
