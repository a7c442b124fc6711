//! Common types shared across all sensor-sos crates.

pub mod entities;
pub mod envelope;
pub mod error;
pub mod operation;
pub mod request;

pub use entities::{FeatureOfInterest, Offering, Procedure};
pub use envelope::{SpatialEnvelope, TimePeriod};
pub use error::{SosError, SosResult};
pub use operation::SosOperation;
pub use request::{
    DescribeSensorRequest, GetCapabilitiesRequest, GetFeatureOfInterestRequest,
    GetObservationByIdRequest, GetObservationRequest, SosRequest, SosResponse,
};
