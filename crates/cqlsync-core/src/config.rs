//! Schema manifest (`cqlsync.toml`) parser.
//!
//! ```toml
//! [target]
//! host = "10.0.0.5"
//! cql_version = "3.4.4"
//!
//! [probe]
//! attempts = 30
//! delay = "1s"
//!
//! [[keyspace]]
//! name = "pluto"
//! replication_factor = 3
//!
//! [[table]]
//! name = "events"
//! keyspace = "pluto"
//! columns = [
//!     { name = "datastream", type = "text" },
//!     { name = "time", type = "timestamp" },
//! ]
//! primary_key = ["datastream", "time"]
//! order_by = ["time"]
//! order_by_direction = "DESC"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::types::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub target: ConnectionTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<Credentials>,
    #[serde(default)]
    pub cqlsh: CqlshConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default, rename = "keyspace")]
    pub keyspaces: Vec<KeyspaceEntry>,
    #[serde(default, rename = "table")]
    pub tables: Vec<TableEntry>,
}

/// How the cqlsh shell is located and launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CqlshConfig {
    pub binary: String,
    /// Run cqlsh through `sudo`.
    pub sudo: bool,
}

impl Default for CqlshConfig {
    fn default() -> Self {
        Self {
            binary: "cqlsh".to_string(),
            sudo: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub enabled: bool,
    pub attempts: u32,
    /// Fixed delay between attempts: "1s", "500ms", "2m".
    pub delay: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            attempts: DEFAULT_PROBE_ATTEMPTS,
            delay: "1s".to_string(),
        }
    }
}

impl ProbeConfig {
    pub fn retry_policy(&self) -> ValidationResult<RetryPolicy> {
        let mut problems = Vec::new();
        if self.attempts < 1 {
            problems.push("probe attempts must be at least 1".to_string());
        }
        let delay = parse_duration(&self.delay);
        if delay.is_none() {
            problems.push(format!("probe delay {:?} is not a duration", self.delay));
        }
        match delay {
            Some(delay) if problems.is_empty() => Ok(RetryPolicy::new(self.attempts, delay)),
            _ => Err(ValidationError::new("probe", problems)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyspaceEntry {
    #[serde(flatten)]
    pub spec: KeyspaceSpec,
    #[serde(default)]
    pub state: ObjectState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    #[serde(flatten)]
    pub spec: TableSpec,
    #[serde(default)]
    pub state: ObjectState,
}

impl Manifest {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest: Manifest = toml::from_str(&content)?;
        Ok(manifest)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every declaration in the manifest, reporting all problems
    /// at once.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut problems = Vec::new();
        if let Err(e) = self.probe.retry_policy() {
            problems.extend(e.problems);
        }
        for entry in &self.keyspaces {
            if let Err(e) = entry.spec.validate() {
                problems.push(e.to_string());
            }
        }
        for entry in &self.tables {
            if let Err(e) = entry.spec.validate() {
                problems.push(e.to_string());
            }
        }
        ValidationError::check("manifest", problems)
    }
}

/// Parse a duration string like "5s", "500ms", "1m". A bare number is
/// taken as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
