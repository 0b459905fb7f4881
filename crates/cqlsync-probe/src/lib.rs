//! cqlsync-probe: wait for a store to answer before touching its schema.
//!
//! # Architecture
//!
//! ```text
//! ConnectionProbe
//!   ├── SchemaCatalog::ping() per attempt
//!   ├── AttemptTracker (attempt count, distinct failure reasons)
//!   └── Sleeper between attempts (fixed delay, no backoff, no jitter)
//! ```
//!
//! A probe ends `Ready` on the first successful round trip, or
//! `Exhausted` once `max_attempts` attempts have failed. The error carries
//! every distinct failure reason seen, so "unreachable" and "reachable but
//! rejecting credentials" can be told apart when both occur.

pub mod probe;
pub mod sleeper;

pub use probe::{AttemptTracker, ConnectionProbe, ProbeError, ProbeReport, ProbeResult, ProbeState};
pub use sleeper::{RecordingSleeper, Sleeper, ThreadSleeper};
