//! cqlsync-reconcile: declarative keyspace and table reconciliation.
//!
//! Each reconciler reads the live schema through a
//! [`SchemaCatalog`](cqlsync_store::SchemaCatalog), decides the single
//! action that converges it to the declaration, and executes that action.
//! Nothing is cached between calls: every run diffs from scratch, and a
//! second identical run is a no-op.
//!
//! # Components
//!
//! - **`keyspace`**: existence plus replication factor (create, alter, drop)
//! - **`table`**: existence only (create, drop); existing tables are never
//!   structurally diffed
//! - **`outcome`**: the `changed`/`error` report returned for every object
//!
//! There is no locking around the read-then-write sequence, and DDL is
//! never retried or rolled back. Two reconcilers racing on one object can
//! lose an update.

pub mod error;
pub mod keyspace;
pub mod outcome;
pub mod table;

pub use error::{ReconcileError, ReconcileResult};
pub use keyspace::{KeyspacePlan, KeyspaceReconciler, KeyspaceState};
pub use outcome::{Action, ErrorInfo, ErrorKind, ReconcileOutcome};
pub use table::{TablePlan, TableReconciler, TableState};
