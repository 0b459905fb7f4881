//! Keyspace reconciler: existence and replication factor.
//!
//! ```text
//! DESC KEYSPACES ──► absent ──► desired present ──► CREATE
//!        │                  └─► desired absent  ──► (nothing)
//!        └─────────► present ─► desired absent  ──► DROP
//!                           └─► DESCRIBE KEYSPACE ─► rf matches ──► (nothing)
//!                                                └─► rf differs ──► ALTER
//! ```
//!
//! A create that reports success is trusted; the keyspace is not described
//! again afterwards.

use cqlsync_core::{ConnectionTarget, KeyspaceSpec, ObjectState};
use cqlsync_store::{SchemaCatalog, cql};
use tracing::{debug, info};

use crate::error::ReconcileResult;
use crate::outcome::{Action, ReconcileOutcome};

/// Observed keyspace relative to its declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyspaceState {
    Absent,
    /// Present; replication was not read.
    Present,
    PresentMatching,
    PresentDrifted { replication_factor: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyspacePlan {
    pub state: KeyspaceState,
    pub action: Action,
    pub statement: Option<String>,
}

/// Converges one keyspace per call.
#[derive(Debug)]
pub struct KeyspaceReconciler<'a, C: ?Sized> {
    catalog: &'a C,
    check_mode: bool,
}

impl<'a, C: SchemaCatalog + ?Sized> KeyspaceReconciler<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            check_mode: false,
        }
    }

    /// Plan only; never execute the mutation.
    pub fn check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    /// Inspect the store and choose the converging action. The name is
    /// matched as the store records it, lower-cased.
    pub fn plan(
        &self,
        target: &ConnectionTarget,
        spec: &KeyspaceSpec,
        desired: ObjectState,
    ) -> ReconcileResult<KeyspacePlan> {
        let spec = &spec.folded();
        spec.validate()?;

        let exists = self.catalog.list_keyspaces(target)?.contains(&spec.name);
        let state = if !exists {
            KeyspaceState::Absent
        } else if desired.is_absent() {
            KeyspaceState::Present
        } else {
            let observed = self.catalog.describe_keyspace(target, &spec.name)?;
            match observed.replication_factor {
                Some(rf) if rf != spec.replication_factor => {
                    KeyspaceState::PresentDrifted { replication_factor: rf }
                }
                _ => KeyspaceState::PresentMatching,
            }
        };
        debug!(keyspace = %spec.name, ?state, ?desired, "observed keyspace");

        let (action, statement) = match (desired, state) {
            (ObjectState::Present, KeyspaceState::Absent) => {
                (Action::Create, Some(cql::create_keyspace(spec)?))
            }
            (ObjectState::Present, KeyspaceState::PresentDrifted { replication_factor }) => (
                Action::AlterReplication {
                    from: replication_factor,
                    to: spec.replication_factor,
                },
                Some(cql::alter_keyspace(spec)?),
            ),
            (ObjectState::Present, KeyspaceState::Present | KeyspaceState::PresentMatching) => {
                (Action::Noop, None)
            }
            (ObjectState::Absent, KeyspaceState::Absent) => (Action::Noop, None),
            (ObjectState::Absent, _) => (Action::Drop, Some(cql::drop_keyspace(&spec.name)?)),
        };

        Ok(KeyspacePlan {
            state,
            action,
            statement,
        })
    }

    /// Execute a planned action. Not retried, not rolled back.
    pub fn apply(
        &self,
        target: &ConnectionTarget,
        spec: &KeyspaceSpec,
        action: Action,
    ) -> ReconcileResult<()> {
        let spec = &spec.folded();
        match action {
            Action::Noop => {}
            Action::Create => {
                self.catalog.create_keyspace(target, spec)?;
                info!(keyspace = %spec.name, replication_factor = spec.replication_factor, "keyspace created");
            }
            Action::AlterReplication { from, to } => {
                self.catalog.alter_keyspace(target, spec)?;
                info!(keyspace = %spec.name, from, to, "keyspace replication updated");
            }
            Action::Drop => {
                self.catalog.drop_keyspace(target, &spec.name)?;
                info!(keyspace = %spec.name, "keyspace dropped");
            }
        }
        Ok(())
    }

    /// Plan, then apply unless in check mode.
    pub fn reconcile(
        &self,
        target: &ConnectionTarget,
        spec: &KeyspaceSpec,
        desired: ObjectState,
    ) -> ReconcileOutcome {
        let object = format!("keyspace {}", spec.folded().name);

        let plan = match self.plan(target, spec, desired) {
            Ok(plan) => plan,
            Err(err) => return ReconcileOutcome::from_error(object, None, &err),
        };
        if self.check_mode {
            return ReconcileOutcome::planned(object, plan.action, plan.statement);
        }
        match self.apply(target, spec, plan.action) {
            Ok(()) => ReconcileOutcome::applied(object, plan.action, plan.statement),
            Err(err) => ReconcileOutcome::from_error(object, Some(plan.action), &err),
        }
    }
}
