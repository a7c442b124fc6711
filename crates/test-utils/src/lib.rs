//! Shared test utilities for the sensor-sos workspace.
//!
//! Provides canned backing-store rows for a small but realistic sensor
//! network, plus store doubles for failure injection and timing control.
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod stores;

pub use fixtures::*;
pub use stores::*;
