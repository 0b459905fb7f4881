//! cqlsync-store: everything that talks to the column store.
//!
//! The store is reached through its administrative shell. Each call is one
//! blocking `cqlsh` process; the raw text it prints is scraped for the
//! handful of facts reconciliation needs.
//!
//! # Layers
//!
//! ```text
//! SchemaCatalog (typed: list_keyspaces, describe_keyspace, list_tables, ...)
//!   └── CqlshCatalog
//!         ├── cql::*        statement templates, identifiers checked first
//!         ├── parse::*      tolerant scraping of cqlsh output
//!         └── CommandRunner one statement → (stdout, success, stderr)
//!               ├── CqlshRunner    real subprocess
//!               └── ScriptedRunner canned responses (for testing)
//! ```
//!
//! Nothing here retries. A non-zero exit becomes `StoreError::Connection`
//! and is handed back to the caller untouched.

pub mod catalog;
pub mod cql;
pub mod error;
pub mod parse;
pub mod runner;

pub use catalog::{CqlshCatalog, SchemaCatalog};
pub use error::{StoreError, StoreResult};
pub use runner::{CommandRunner, CqlshRunner, ExecOutput, RecordedCall, ScriptedRunner};
