//! Domain request and response envelopes.
//!
//! These are the currency between codecs and request handlers: a decoder
//! turns a wire payload into a `SosRequest`, a handler produces a
//! `SosResponse`, an encoder turns it back into bytes. Wire-format details
//! stay inside the codecs.

use serde::{Deserialize, Serialize};

use crate::envelope::{SpatialEnvelope, TimePeriod};
use crate::operation::SosOperation;

/// A decoded SOS request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SosRequest {
    GetCapabilities(GetCapabilitiesRequest),
    DescribeSensor(DescribeSensorRequest),
    GetObservation(GetObservationRequest),
    GetObservationById(GetObservationByIdRequest),
    GetFeatureOfInterest(GetFeatureOfInterestRequest),
}

impl SosRequest {
    /// The operation this request invokes.
    pub fn operation(&self) -> SosOperation {
        match self {
            SosRequest::GetCapabilities(_) => SosOperation::GetCapabilities,
            SosRequest::DescribeSensor(_) => SosOperation::DescribeSensor,
            SosRequest::GetObservation(_) => SosOperation::GetObservation,
            SosRequest::GetObservationById(_) => SosOperation::GetObservationById,
            SosRequest::GetFeatureOfInterest(_) => SosOperation::GetFeatureOfInterest,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetCapabilitiesRequest {
    /// Service versions the client accepts, in preference order.
    pub accept_versions: Vec<String>,
    /// Capabilities sections requested (empty = all).
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribeSensorRequest {
    pub procedure: String,
    /// Requested procedure description format identifier.
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetObservationRequest {
    pub offerings: Vec<String>,
    pub procedures: Vec<String>,
    pub observed_properties: Vec<String>,
    pub features: Vec<String>,
    pub temporal_filter: Option<TimePeriod>,
    pub spatial_filter: Option<SpatialEnvelope>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetObservationByIdRequest {
    pub observation_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetFeatureOfInterestRequest {
    pub features: Vec<String>,
    pub procedures: Vec<String>,
    pub spatial_filter: Option<SpatialEnvelope>,
}

/// A handler result awaiting encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SosResponse {
    /// Service metadata for GetCapabilities.
    Capabilities {
        version: String,
        offerings: Vec<String>,
        operations: Vec<SosOperation>,
    },
    /// Procedure description document for DescribeSensor.
    SensorDescription { procedure: String, document: String },
    /// Observation collection for the Get* observation operations.
    Observations { observation_ids: Vec<String> },
    /// Feature collection for GetFeatureOfInterest.
    Features { feature_ids: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_operation() {
        let req = SosRequest::GetObservation(GetObservationRequest {
            offerings: vec!["ws-2500".to_string()],
            ..Default::default()
        });
        assert_eq!(req.operation(), SosOperation::GetObservation);

        let req = SosRequest::GetCapabilities(GetCapabilitiesRequest::default());
        assert_eq!(req.operation(), SosOperation::GetCapabilities);
    }
}
