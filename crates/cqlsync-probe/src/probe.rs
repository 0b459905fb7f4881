//! Readiness probe logic.
//!
//! Repeats a trivial round trip against the store until it succeeds or the
//! retry budget runs out, sleeping a fixed delay between attempts.

use std::collections::BTreeSet;

use cqlsync_core::{ConnectionTarget, RetryPolicy};
use cqlsync_store::{SchemaCatalog, StoreError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::sleeper::{Sleeper, ThreadSleeper};

pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Every attempt failed. `errors` holds each distinct reason once.
    #[error("store not ready after {attempts} attempts: {}", .errors.iter().cloned().collect::<Vec<_>>().join("; "))]
    Exhausted {
        attempts: u32,
        errors: BTreeSet<String>,
    },
}

/// Where a probe stands after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    /// Failed so far, attempts remain.
    Retrying,
    /// The store answered.
    Ready,
    /// The attempt budget is spent.
    Exhausted,
}

/// Successful probe summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    /// Attempts made, including the successful one.
    pub attempts: u32,
}

/// Counts attempts and collects distinct failure reasons for one probe.
#[derive(Debug)]
pub struct AttemptTracker {
    max_attempts: u32,
    attempts: u32,
    errors: BTreeSet<String>,
    state: ProbeState,
}

impl AttemptTracker {
    /// A budget of zero is treated as one attempt.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            attempts: 0,
            errors: BTreeSet::new(),
            state: ProbeState::Retrying,
        }
    }

    /// Record one attempt and return the resulting state.
    pub fn record(&mut self, result: Result<(), &StoreError>) -> ProbeState {
        self.attempts += 1;
        match result {
            Ok(()) => {
                self.state = ProbeState::Ready;
            }
            Err(err) => {
                let reason = err.reason();
                if self.errors.insert(reason.clone()) {
                    debug!(attempt = self.attempts, %reason, "new probe failure reason");
                }
                if self.attempts >= self.max_attempts {
                    self.state = ProbeState::Exhausted;
                }
            }
        }
        self.state
    }

    pub fn state(&self) -> ProbeState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn errors(&self) -> &BTreeSet<String> {
        &self.errors
    }

    fn into_error(self) -> ProbeError {
        ProbeError::Exhausted {
            attempts: self.attempts,
            errors: self.errors,
        }
    }
}

/// Blocks until a target answers a trivial query or the policy gives up.
#[derive(Debug, Clone)]
pub struct ConnectionProbe<S = ThreadSleeper> {
    policy: RetryPolicy,
    sleeper: S,
}

impl ConnectionProbe<ThreadSleeper> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, ThreadSleeper)
    }
}

impl<S: Sleeper> ConnectionProbe<S> {
    pub fn with_sleeper(policy: RetryPolicy, sleeper: S) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Attempt a round trip until one succeeds. Sleeps only between
    /// attempts, never after the last one.
    pub fn wait_until_ready<C: SchemaCatalog + ?Sized>(
        &self,
        catalog: &C,
        target: &ConnectionTarget,
    ) -> ProbeResult<ProbeReport> {
        let mut tracker = AttemptTracker::new(self.policy.max_attempts);

        loop {
            let result = catalog.ping(target);
            match tracker.record(result.as_ref().map(|_| ())) {
                ProbeState::Ready => {
                    info!(%target, attempts = tracker.attempts(), "store ready");
                    return Ok(ProbeReport {
                        attempts: tracker.attempts(),
                    });
                }
                ProbeState::Exhausted => {
                    warn!(
                        %target,
                        attempts = tracker.attempts(),
                        distinct_errors = tracker.errors().len(),
                        "store not ready, giving up"
                    );
                    return Err(tracker.into_error());
                }
                ProbeState::Retrying => {
                    if let Err(err) = &result {
                        warn!(
                            %target,
                            attempt = tracker.attempts(),
                            max_attempts = self.policy.max_attempts,
                            error = %err,
                            "probe attempt failed"
                        );
                    }
                    self.sleeper.sleep(self.policy.inter_attempt_delay);
                }
            }
        }
    }
}
