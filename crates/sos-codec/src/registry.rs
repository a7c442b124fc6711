//! Codec registry: registration buckets and closest-match resolution.
//!
//! The registry is built once at startup through [`CodecRegistryBuilder`]
//! and frozen by `build()`; afterwards every lookup runs on immutable data
//! with no locking. Registrations are grouped into four buckets by key
//! shape (decoder/encoder x namespace-keyed/operation-keyed) so resolution
//! only ever scans compatible candidates.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use sos_common::SosError;

use crate::codec::{Decoder, Encoder};
use crate::hierarchy::CategoryHierarchy;
use crate::key::FormatKey;

/// Errors raised by codec resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No registration is compatible with the requested key.
    #[error("no codec registered for key: {0}")]
    NoCodecForKey(String),
}

impl From<ResolveError> for SosError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NoCodecForKey(key) => SosError::NoCodecForFormat(key),
        }
    }
}

struct Registration<C: ?Sized> {
    key: FormatKey,
    codec: Arc<C>,
}

/// Accumulates (key, codec) registrations during the startup phase.
///
/// Registration is idempotent: adding a (key, codec) pair that is already
/// present in its bucket is a no-op. The `&mut` receiver confines
/// registration to the startup phase by construction; once `build()` runs,
/// the registry can no longer change.
pub struct CodecRegistryBuilder {
    hierarchy: Arc<CategoryHierarchy>,
    decoders_by_namespace: Vec<Registration<dyn Decoder>>,
    decoders_by_operation: Vec<Registration<dyn Decoder>>,
    encoders_by_namespace: Vec<Registration<dyn Encoder>>,
    encoders_by_operation: Vec<Registration<dyn Encoder>>,
}

impl CodecRegistryBuilder {
    pub fn new(hierarchy: Arc<CategoryHierarchy>) -> Self {
        Self {
            hierarchy,
            decoders_by_namespace: Vec::new(),
            decoders_by_operation: Vec::new(),
            encoders_by_namespace: Vec::new(),
            encoders_by_operation: Vec::new(),
        }
    }

    /// Register a decoder under every key it declares.
    pub fn register_decoder(&mut self, codec: Arc<dyn Decoder>) {
        for key in codec.keys() {
            let bucket = if key.is_operation_keyed() {
                &mut self.decoders_by_operation
            } else {
                &mut self.decoders_by_namespace
            };
            register_into(bucket, key, Arc::clone(&codec));
        }
    }

    /// Register an encoder under every key it declares.
    pub fn register_encoder(&mut self, codec: Arc<dyn Encoder>) {
        for key in codec.keys() {
            let bucket = if key.is_operation_keyed() {
                &mut self.encoders_by_operation
            } else {
                &mut self.encoders_by_namespace
            };
            register_into(bucket, key, Arc::clone(&codec));
        }
    }

    /// Freeze the registry for lock-free lookups.
    pub fn build(self) -> CodecRegistry {
        info!(
            decoders = self.decoders_by_namespace.len() + self.decoders_by_operation.len(),
            encoders = self.encoders_by_namespace.len() + self.encoders_by_operation.len(),
            categories = self.hierarchy.len(),
            "Codec registry built"
        );
        CodecRegistry {
            hierarchy: self.hierarchy,
            decoders_by_namespace: self.decoders_by_namespace,
            decoders_by_operation: self.decoders_by_operation,
            encoders_by_namespace: self.encoders_by_namespace,
            encoders_by_operation: self.encoders_by_operation,
        }
    }
}

fn register_into<C: ?Sized>(bucket: &mut Vec<Registration<C>>, key: FormatKey, codec: Arc<C>) {
    let already = bucket
        .iter()
        .any(|reg| reg.key == key && Arc::ptr_eq(&reg.codec, &codec));
    if already {
        return;
    }
    bucket.push(Registration { key, codec });
}

/// Immutable codec registry resolving requested keys to registrations.
pub struct CodecRegistry {
    hierarchy: Arc<CategoryHierarchy>,
    decoders_by_namespace: Vec<Registration<dyn Decoder>>,
    decoders_by_operation: Vec<Registration<dyn Decoder>>,
    encoders_by_namespace: Vec<Registration<dyn Encoder>>,
    encoders_by_operation: Vec<Registration<dyn Encoder>>,
}

impl CodecRegistry {
    /// The category hierarchy the registry resolves against.
    pub fn hierarchy(&self) -> &CategoryHierarchy {
        &self.hierarchy
    }

    /// Resolve the best decoder for a requested key.
    ///
    /// Scans the bucket matching the key's shape, computing similarity for
    /// every candidate and keeping the minimum distance. When two
    /// candidates tie, the one registered first wins, so resolution is
    /// deterministic across runs.
    pub fn resolve_decoder(&self, key: &FormatKey) -> Result<Arc<dyn Decoder>, ResolveError> {
        let bucket = if key.is_operation_keyed() {
            &self.decoders_by_operation
        } else {
            &self.decoders_by_namespace
        };
        self.resolve_in(bucket, key, "decoder")
    }

    /// Resolve the best encoder for a requested key.
    pub fn resolve_encoder(&self, key: &FormatKey) -> Result<Arc<dyn Encoder>, ResolveError> {
        let bucket = if key.is_operation_keyed() {
            &self.encoders_by_operation
        } else {
            &self.encoders_by_namespace
        };
        self.resolve_in(bucket, key, "encoder")
    }

    /// All keys with a registered decoder, for capabilities advertisement.
    pub fn decoder_keys(&self) -> impl Iterator<Item = &FormatKey> {
        self.decoders_by_namespace
            .iter()
            .map(|r| &r.key)
            .chain(self.decoders_by_operation.iter().map(|r| &r.key))
    }

    /// All keys with a registered encoder.
    pub fn encoder_keys(&self) -> impl Iterator<Item = &FormatKey> {
        self.encoders_by_namespace
            .iter()
            .map(|r| &r.key)
            .chain(self.encoders_by_operation.iter().map(|r| &r.key))
    }

    fn resolve_in<C: ?Sized>(
        &self,
        bucket: &[Registration<C>],
        key: &FormatKey,
        kind: &'static str,
    ) -> Result<Arc<C>, ResolveError> {
        // Buckets preserve registration order, so a strict `<` keeps the
        // first-registered candidate on distance ties.
        let mut best: Option<(u32, &Registration<C>)> = None;
        for reg in bucket {
            if let Some(distance) = key.similarity(&reg.key, &self.hierarchy) {
                if best.as_ref().map_or(true, |(d, _)| distance < *d) {
                    best = Some((distance, reg));
                }
            }
        }

        match best {
            Some((distance, reg)) => {
                debug!(
                    kind,
                    distance,
                    key = %key.describe(&self.hierarchy),
                    matched = %reg.key.describe(&self.hierarchy),
                    "Resolved codec"
                );
                Ok(Arc::clone(&reg.codec))
            }
            None => Err(ResolveError::NoCodecForKey(key.describe(&self.hierarchy))),
        }
    }
}
