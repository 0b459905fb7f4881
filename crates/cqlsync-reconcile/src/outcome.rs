//! Per-object reconciliation result.
//!
//! Serializes in the idempotent-automation convention: `changed` says
//! whether the object was (or, in check mode, would be) mutated; `failed`
//! and `msg` describe an error. `changed: false` without an error means the
//! object was already converged.

use serde::Serialize;

use crate::error::ReconcileError;

/// The single mutation chosen for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Noop,
    Create,
    AlterReplication { from: u32, to: u32 },
    Drop,
}

impl Action {
    pub fn is_noop(self) -> bool {
        self == Action::Noop
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    Parse,
    Validation,
    RetryExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub messages: Vec<String>,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, messages: Vec<String>) -> Self {
        Self { kind, messages }
    }
}

impl From<&ReconcileError> for ErrorInfo {
    fn from(err: &ReconcileError) -> Self {
        Self::new(err.kind(), err.messages())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// `keyspace pluto`, `table pluto.events`, `target 10.0.0.5:9042`.
    pub object: String,
    /// `None` when the run failed before an action was chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// The mutation statement, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    pub changed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub check_mode: bool,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl ReconcileOutcome {
    /// An action that was executed (or skipped because it was a no-op).
    pub fn applied(object: String, action: Action, statement: Option<String>) -> Self {
        Self {
            object,
            action: Some(action),
            statement,
            changed: !action.is_noop(),
            check_mode: false,
            failed: false,
            error: None,
        }
    }

    /// An action that was planned but deliberately not executed.
    pub fn planned(object: String, action: Action, statement: Option<String>) -> Self {
        Self {
            check_mode: true,
            ..Self::applied(object, action, statement)
        }
    }

    /// A check that touched nothing, such as a successful probe.
    pub fn unchanged(object: String) -> Self {
        Self {
            object,
            action: None,
            statement: None,
            changed: false,
            check_mode: false,
            failed: false,
            error: None,
        }
    }

    pub fn failed(object: String, action: Option<Action>, error: ErrorInfo) -> Self {
        Self {
            object,
            action,
            statement: None,
            changed: false,
            check_mode: false,
            failed: true,
            error: Some(error),
        }
    }

    pub fn from_error(object: String, action: Option<Action>, err: &ReconcileError) -> Self {
        Self::failed(object, action, ErrorInfo::from(err))
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Human-readable summary.
    pub fn msg(&self) -> String {
        if let Some(error) = &self.error {
            return error.messages.join("; ");
        }
        match (self.action, self.check_mode) {
            (None, _) => "ok".to_string(),
            (Some(Action::Noop), _) => "already converged".to_string(),
            (Some(_), true) => format!("would run: {}", self.statement.as_deref().unwrap_or("")),
            (Some(_), false) => format!("ran: {}", self.statement.as_deref().unwrap_or("")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_is_unchanged_success() {
        let outcome = ReconcileOutcome::applied("keyspace pluto".to_string(), Action::Noop, None);
        assert!(!outcome.changed);
        assert!(outcome.is_ok());
        assert_eq!(outcome.msg(), "already converged");
    }

    #[test]
    fn unchanged_has_no_action() {
        let outcome = ReconcileOutcome::unchanged("target 127.0.0.1:9042".to_string());
        assert!(outcome.is_ok());
        assert_eq!(outcome.msg(), "ok");
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("action").is_none());
    }

    #[test]
    fn planned_reports_would_change() {
        let outcome = ReconcileOutcome::planned(
            "table pluto.events".to_string(),
            Action::Drop,
            Some("DROP TABLE events;".to_string()),
        );
        assert!(outcome.changed);
        assert!(outcome.check_mode);
        assert_eq!(outcome.msg(), "would run: DROP TABLE events;");
    }

    #[test]
    fn failure_is_never_changed() {
        let outcome = ReconcileOutcome::failed(
            "keyspace pluto".to_string(),
            Some(Action::Create),
            ErrorInfo::new(ErrorKind::Connection, vec!["bad return code 1: refused".to_string()]),
        );
        assert!(!outcome.changed);
        assert!(outcome.failed);
        assert_eq!(outcome.msg(), "bad return code 1: refused");
    }

    #[test]
    fn serializes_in_automation_shape() {
        let outcome = ReconcileOutcome::applied(
            "keyspace pluto".to_string(),
            Action::AlterReplication { from: 1, to: 3 },
            Some("ALTER ...".to_string()),
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["changed"], true);
        assert_eq!(json["failed"], false);
        assert_eq!(json["action"]["type"], "alter_replication");
        assert_eq!(json["action"]["to"], 3);
        assert!(json.get("check_mode").is_none());
        assert!(json.get("error").is_none());
    }
}
