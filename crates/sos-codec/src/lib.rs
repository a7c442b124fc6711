//! Format/codec resolution for sensor-sos.
//!
//! Maps an incoming (namespace, payload category, media type, operation)
//! tuple to the single best-matching codec, using a type-hierarchy distance
//! metric over a build-time registered category DAG when no exact match
//! exists.

pub mod codec;
pub mod hierarchy;
pub mod key;
pub mod registry;

pub use codec::{Decoder, Encoder};
pub use hierarchy::{CategoryHierarchy, CategoryHierarchyBuilder, CategoryId};
pub use key::{FormatKey, MediaType, OperationKey, PayloadShape};
pub use registry::{CodecRegistry, CodecRegistryBuilder, ResolveError};
