//! Error types for sensor-sos services.

use thiserror::Error;

/// Result type alias using SosError.
pub type SosResult<T> = Result<T, SosError>;

/// Primary error type for SOS request handling.
#[derive(Debug, Error)]
pub enum SosError {
    // === Protocol Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Version negotiation failed: {0}")]
    VersionNegotiationFailed(String),

    #[error("Operation not supported: {0}")]
    OperationNotSupported(String),

    #[error("Invalid request payload: {0}")]
    InvalidRequest(String),

    // === Format Errors ===
    #[error("No codec registered for format: {0}")]
    NoCodecForFormat(String),

    #[error("Requested response format not supported: {0}")]
    UnsupportedFormat(String),

    // === Data Errors ===
    #[error("Offering not found: {0}")]
    OfferingNotFound(String),

    #[error("Procedure not found: {0}")]
    ProcedureNotFound(String),

    #[error("Feature of interest not found: {0}")]
    FeatureNotFound(String),

    // === Infrastructure Errors ===
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request timeout")]
    Timeout,
}

impl SosError {
    /// Get the OWS exception code for this error.
    pub fn ows_exception_code(&self) -> &'static str {
        match self {
            SosError::MissingParameter(_) => "MissingParameterValue",
            SosError::InvalidParameter { .. } => "InvalidParameterValue",
            SosError::VersionNegotiationFailed(_) => "VersionNegotiationFailed",
            SosError::OperationNotSupported(_) => "OperationNotSupported",
            SosError::InvalidRequest(_) => "InvalidRequest",
            SosError::NoCodecForFormat(_) | SosError::UnsupportedFormat(_) => "InvalidFormat",
            SosError::OfferingNotFound(_)
            | SosError::ProcedureNotFound(_)
            | SosError::FeatureNotFound(_) => "InvalidParameterValue",
            _ => "NoApplicableCode",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            SosError::MissingParameter(_)
            | SosError::InvalidParameter { .. }
            | SosError::VersionNegotiationFailed(_)
            | SosError::InvalidRequest(_)
            | SosError::UnsupportedFormat(_) => 400,

            SosError::OfferingNotFound(_)
            | SosError::ProcedureNotFound(_)
            | SosError::FeatureNotFound(_) => 404,

            SosError::OperationNotSupported(_) | SosError::NoCodecForFormat(_) => 501,

            SosError::ServiceUnavailable(_) => 503,
            SosError::Timeout => 504,

            _ => 500,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for SosError {
    fn from(err: std::io::Error) -> Self {
        SosError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for SosError {
    fn from(err: serde_json::Error) -> Self {
        SosError::InternalError(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exception_codes() {
        assert_eq!(
            SosError::MissingParameter("service".to_string()).ows_exception_code(),
            "MissingParameterValue"
        );
        assert_eq!(
            SosError::OperationNotSupported("GetResult".to_string()).ows_exception_code(),
            "OperationNotSupported"
        );
        assert_eq!(
            SosError::StorageError("down".to_string()).ows_exception_code(),
            "NoApplicableCode"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SosError::MissingParameter("service".to_string()).http_status_code(),
            400
        );
        assert_eq!(
            SosError::OfferingNotFound("ws-2500".to_string()).http_status_code(),
            404
        );
        assert_eq!(
            SosError::NoCodecForFormat("application/gml+xml".to_string()).http_status_code(),
            501
        );
        assert_eq!(SosError::Timeout.http_status_code(), 504);
    }
}
