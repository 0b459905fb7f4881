//! cqlsync-core: the declared side of schema reconciliation.
//!
//! Holds the desired-state model (keyspaces, tables, columns), the
//! connection and retry parameters handed to the probe and reconcilers,
//! identifier validation, and the TOML manifest that ties them together.
//!
//! Nothing in this crate performs I/O against the store.

pub mod config;
pub mod error;
pub mod ident;
pub mod types;

pub use config::Manifest;
pub use error::{ValidationError, ValidationResult};
pub use types::*;
