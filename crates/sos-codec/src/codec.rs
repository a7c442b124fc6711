//! Codec capability traits.

use bytes::Bytes;
use sos_common::{SosRequest, SosResponse, SosResult};

use crate::key::FormatKey;

/// A decoder capability: turns a wire payload into a domain request.
///
/// Implementations are registered once at startup and shared behind `Arc`;
/// they must not hold per-request state.
pub trait Decoder: Send + Sync + std::fmt::Debug {
    /// The format keys this decoder services.
    fn keys(&self) -> Vec<FormatKey>;

    /// Decode a wire payload into a domain request.
    fn decode(&self, payload: &[u8]) -> SosResult<SosRequest>;
}

/// An encoder capability: turns a handler result into a wire payload.
pub trait Encoder: Send + Sync {
    /// The format keys this encoder services.
    fn keys(&self) -> Vec<FormatKey>;

    /// Encode a domain response into its wire form.
    fn encode(&self, response: &SosResponse) -> SosResult<Bytes>;
}
