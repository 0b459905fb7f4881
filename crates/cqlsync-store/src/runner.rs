//! Statement execution through the cqlsh administrative shell.
//!
//! One call maps to one process:
//!
//! ```text
//! [sudo] cqlsh <host> <port> --cqlversion <v> [-u <user> -p <pass>] [-k <keyspace>] -e "<statement>"
//! ```
//!
//! No retry and no timeout at this layer.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::process::Command;

use cqlsync_core::{ConnectionTarget, Credentials};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Raw result of one shell invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
}

impl ExecOutput {
    pub fn ok(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: String::new(),
            success: true,
            status: Some(0),
        }
    }

    pub fn failed(status: i32, stderr: &str) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.to_string(),
            success: false,
            status: Some(status),
        }
    }

    /// Turn a failed invocation into `StoreError::Connection`, passing
    /// stdout through on success.
    pub fn into_stdout(self) -> StoreResult<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(StoreError::Connection {
                status: self.status,
                stderr: self.stderr,
            })
        }
    }
}

/// Executes a single statement or query against the store.
///
/// `keyspace`, when given, binds the session to that keyspace before the
/// statement runs, so unqualified table names resolve inside it.
pub trait CommandRunner {
    fn execute(
        &self,
        target: &ConnectionTarget,
        statement: &str,
        keyspace: Option<&str>,
    ) -> StoreResult<ExecOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn execute(
        &self,
        target: &ConnectionTarget,
        statement: &str,
        keyspace: Option<&str>,
    ) -> StoreResult<ExecOutput> {
        (**self).execute(target, statement, keyspace)
    }
}

/// Runs statements through a real `cqlsh` process.
#[derive(Debug, Clone)]
pub struct CqlshRunner {
    binary: String,
    sudo: bool,
    credentials: Option<Credentials>,
}

impl Default for CqlshRunner {
    fn default() -> Self {
        Self::new("cqlsh")
    }
}

impl CqlshRunner {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            sudo: false,
            credentials: None,
        }
    }

    /// Launch cqlsh through `sudo`.
    pub fn with_sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Build the process invocation without running it.
    pub fn command(
        &self,
        target: &ConnectionTarget,
        statement: &str,
        keyspace: Option<&str>,
    ) -> Command {
        let mut cmd = if self.sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(&self.binary);
            cmd
        } else {
            Command::new(&self.binary)
        };

        cmd.arg(&target.host)
            .arg(target.port.to_string())
            .arg("--cqlversion")
            .arg(&target.protocol_version);

        if let Some(creds) = &self.credentials {
            cmd.arg("-u").arg(&creds.username).arg("-p").arg(&creds.password);
        }
        if let Some(keyspace) = keyspace {
            cmd.arg("-k").arg(keyspace);
        }
        cmd.arg("-e").arg(statement);
        cmd
    }
}

impl CommandRunner for CqlshRunner {
    fn execute(
        &self,
        target: &ConnectionTarget,
        statement: &str,
        keyspace: Option<&str>,
    ) -> StoreResult<ExecOutput> {
        let mut cmd = self.command(target, statement, keyspace);
        debug!(%target, keyspace, statement, sudo = self.sudo, "running cqlsh");

        let output = cmd.output().map_err(|source| StoreError::Spawn {
            program: self.binary.clone(),
            source,
        })?;

        let result = ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            success: output.status.success(),
            status: output.status.code(),
        };
        if !result.success {
            debug!(status = ?result.status, stderr = %result.stderr.trim(), "cqlsh failed");
        }
        Ok(result)
    }
}

/// One call observed by a [`ScriptedRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub target: ConnectionTarget,
    pub statement: String,
    pub keyspace: Option<String>,
}

/// Canned responses keyed by statement text (for testing).
///
/// Each statement has a queue of responses; the last one repeats once the
/// queue drains. Statements with nothing scripted succeed with empty
/// output. Every call is recorded.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: RefCell<HashMap<String, VecDeque<ExecOutput>>>,
    calls: RefCell<Vec<RecordedCall>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `statement`.
    pub fn respond(&self, statement: &str, output: ExecOutput) -> &Self {
        self.responses
            .borrow_mut()
            .entry(statement.to_string())
            .or_default()
            .push_back(output);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Statements executed so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.statement.clone()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn execute(
        &self,
        target: &ConnectionTarget,
        statement: &str,
        keyspace: Option<&str>,
    ) -> StoreResult<ExecOutput> {
        self.calls.borrow_mut().push(RecordedCall {
            target: target.clone(),
            statement: statement.to_string(),
            keyspace: keyspace.map(str::to_string),
        });

        let mut responses = self.responses.borrow_mut();
        let output = match responses.get_mut(statement) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(output.unwrap_or_else(|| ExecOutput::ok("")))
    }
}
