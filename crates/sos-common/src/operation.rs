//! SOS operation tags.

use serde::{Deserialize, Serialize};

/// The SOS operations a deployment may support.
///
/// The set advertised by a running service lives in the content cache and is
/// rebuilt from the backing store together with the entity collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SosOperation {
    GetCapabilities,
    DescribeSensor,
    GetObservation,
    GetObservationById,
    GetFeatureOfInterest,
    GetDataAvailability,
    InsertObservation,
    InsertSensor,
    DeleteSensor,
}

impl SosOperation {
    /// The operation name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            SosOperation::GetCapabilities => "GetCapabilities",
            SosOperation::DescribeSensor => "DescribeSensor",
            SosOperation::GetObservation => "GetObservation",
            SosOperation::GetObservationById => "GetObservationById",
            SosOperation::GetFeatureOfInterest => "GetFeatureOfInterest",
            SosOperation::GetDataAvailability => "GetDataAvailability",
            SosOperation::InsertObservation => "InsertObservation",
            SosOperation::InsertSensor => "InsertSensor",
            SosOperation::DeleteSensor => "DeleteSensor",
        }
    }

    /// Parse a wire-format operation name.
    pub fn parse(s: &str) -> Option<SosOperation> {
        match s {
            "GetCapabilities" => Some(SosOperation::GetCapabilities),
            "DescribeSensor" => Some(SosOperation::DescribeSensor),
            "GetObservation" => Some(SosOperation::GetObservation),
            "GetObservationById" => Some(SosOperation::GetObservationById),
            "GetFeatureOfInterest" => Some(SosOperation::GetFeatureOfInterest),
            "GetDataAvailability" => Some(SosOperation::GetDataAvailability),
            "InsertObservation" => Some(SosOperation::InsertObservation),
            "InsertSensor" => Some(SosOperation::InsertSensor),
            "DeleteSensor" => Some(SosOperation::DeleteSensor),
            _ => None,
        }
    }
}

impl std::fmt::Display for SosOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_parse_round_trip() {
        let ops = [
            SosOperation::GetCapabilities,
            SosOperation::DescribeSensor,
            SosOperation::GetObservation,
            SosOperation::GetFeatureOfInterest,
            SosOperation::InsertObservation,
        ];
        for op in ops {
            assert_eq!(SosOperation::parse(op.name()), Some(op));
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(SosOperation::parse("GetResultTemplate"), None);
    }
}
