//! Desired-state declarations and the observed state they are diffed against.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::ident::{check_identifier, fold_identifier, is_cql_type, is_identifier};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9042;
pub const DEFAULT_CQL_VERSION: &str = "3.4.4";
pub const DEFAULT_PROBE_ATTEMPTS: u32 = 60;
pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_secs(1);

/// One cluster endpoint. Immutable for the duration of a probe or reconcile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    /// Passed to cqlsh as `--cqlversion`.
    #[serde(alias = "cql_version")]
    pub protocol_version: String,
}

impl ConnectionTarget {
    pub fn new(host: &str, port: u16, protocol_version: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            protocol_version: protocol_version.to_string(),
        }
    }
}

impl Default for ConnectionTarget {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, DEFAULT_CQL_VERSION)
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Username/password handed to cqlsh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Bounded retry with a fixed delay. Governs the connection probe only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub inter_attempt_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, inter_attempt_delay: Duration) -> Self {
        Self {
            max_attempts,
            inter_attempt_delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_ATTEMPTS, DEFAULT_PROBE_DELAY)
    }
}

/// Whether a schema object should exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectState {
    #[default]
    Present,
    Absent,
}

impl ObjectState {
    pub fn is_absent(self) -> bool {
        self == ObjectState::Absent
    }
}

impl FromStr for ObjectState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "present" => Ok(ObjectState::Present),
            "absent" => Ok(ObjectState::Absent),
            other => Err(format!("unknown state {other:?}, expected present or absent")),
        }
    }
}

/// Keyspace replication strategy. Only single-datacenter simple
/// replication is managed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicationStrategy {
    #[default]
    #[serde(rename = "simple", alias = "SimpleStrategy")]
    Simple,
}

impl ReplicationStrategy {
    /// The replication class name as it appears in DDL.
    pub fn class_name(self) -> &'static str {
        match self {
            ReplicationStrategy::Simple => "SimpleStrategy",
        }
    }
}

fn default_replication_factor() -> u32 {
    1
}

/// Desired keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyspaceSpec {
    pub name: String,
    #[serde(default)]
    pub replication_strategy: ReplicationStrategy,
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u32,
}

impl KeyspaceSpec {
    pub fn new(name: &str, replication_factor: u32) -> Self {
        Self {
            name: name.to_string(),
            replication_strategy: ReplicationStrategy::Simple,
            replication_factor,
        }
    }

    /// This declaration with its name as the store records it.
    pub fn folded(&self) -> Self {
        Self {
            name: fold_identifier(&self.name),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        let mut problems = Vec::new();
        check_identifier("keyspace", &self.name, &mut problems);
        if self.replication_factor < 1 {
            problems.push("replication_factor must be at least 1".to_string());
        }
        ValidationError::check(format!("keyspace {:?}", self.name), problems)
    }
}

/// One column of a desired table. Both fields are mandatory but kept
/// optional here so a declaration missing either can be reported rather
/// than rejected at parse time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub cql_type: Option<String>,
}

impl ColumnSpec {
    pub fn new(name: &str, cql_type: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            cql_type: Some(cql_type.to_string()),
        }
    }

    fn describe(&self, index: usize) -> String {
        match (&self.name, &self.cql_type) {
            (Some(name), _) => format!("column #{} ({name})", index + 1),
            (None, Some(ty)) => format!("column #{} (type {ty})", index + 1),
            (None, None) => format!("column #{}", index + 1),
        }
    }
}

/// Clustering sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    #[default]
    #[serde(rename = "ASC", alias = "asc")]
    Asc,
    #[serde(rename = "DESC", alias = "desc")]
    Desc,
}

impl OrderDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(OrderDirection::Asc),
            "DESC" => Ok(OrderDirection::Desc),
            other => Err(format!("unknown order direction {other:?}, expected ASC or DESC")),
        }
    }
}

/// Desired table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub keyspace: String,
    pub columns: Vec<ColumnSpec>,
    #[serde(alias = "primary_keys")]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub order_by: Vec<String>,
    #[serde(default)]
    pub order_by_direction: OrderDirection,
}

impl TableSpec {
    /// Names of the columns that declare one, in declared order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| c.name.as_deref())
            .collect()
    }

    /// This declaration with every identifier as the store records it.
    pub fn folded(&self) -> Self {
        let fold_all = |names: &[String]| -> Vec<String> { names.iter().map(|n| fold_identifier(n)).collect() };
        Self {
            name: fold_identifier(&self.name),
            keyspace: fold_identifier(&self.keyspace),
            columns: self
                .columns
                .iter()
                .map(|c| ColumnSpec {
                    name: c.name.as_deref().map(fold_identifier),
                    cql_type: c.cql_type.clone(),
                })
                .collect(),
            primary_key: fold_all(&self.primary_key),
            order_by: fold_all(&self.order_by),
            order_by_direction: self.order_by_direction,
        }
    }

    /// Validate the whole declaration, collecting every problem found.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut problems = Vec::new();
        check_identifier("table", &self.name, &mut problems);
        check_identifier("keyspace", &self.keyspace, &mut problems);

        if self.columns.is_empty() {
            problems.push("at least one column is required".to_string());
        }

        let mut seen = HashSet::new();
        for (index, column) in self.columns.iter().enumerate() {
            let label = column.describe(index);
            match &column.name {
                None => problems.push(format!("'name' missing from {label}")),
                Some(name) if !is_identifier(name) => {
                    problems.push(format!("{label} has an invalid name"));
                }
                Some(name) => {
                    if !seen.insert(name.as_str()) {
                        problems.push(format!("{label} is declared more than once"));
                    }
                }
            }
            match &column.cql_type {
                None => problems.push(format!("'type' missing from {label}")),
                Some(ty) if !is_cql_type(ty) => {
                    problems.push(format!("{label} has an invalid type {ty:?}"));
                }
                Some(_) => {}
            }
        }

        let declared = self.column_names();
        if self.primary_key.is_empty() {
            problems.push("primary_key must name at least one column".to_string());
        }
        let mut pk_seen = HashSet::new();
        for key in &self.primary_key {
            if !declared.contains(&key.as_str()) {
                problems.push(format!("primary key column {key:?} is not a declared column"));
            } else if !pk_seen.insert(key.as_str()) {
                problems.push(format!("primary key column {key:?} is listed more than once"));
            }
        }
        for column in &self.order_by {
            if !declared.contains(&column.as_str()) {
                problems.push(format!("order_by column {column:?} is not a declared column"));
            }
        }

        ValidationError::check(
            format!("table {:?}.{:?}", self.keyspace, self.name),
            problems,
        )
    }
}

/// What the store reports about a keyspace. `replication_factor` stays
/// `None` until the keyspace has been described.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedKeyspace {
    pub exists: bool,
    pub replication_factor: Option<u32>,
}

/// What the store reports about a table. Only existence is observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedTable {
    pub exists: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events_table() -> TableSpec {
        TableSpec {
            name: "events".to_string(),
            keyspace: "pluto".to_string(),
            columns: vec![
                ColumnSpec::new("datastream", "text"),
                ColumnSpec::new("time", "timestamp"),
                ColumnSpec::new("value", "float"),
            ],
            primary_key: vec!["datastream".to_string(), "time".to_string()],
            order_by: vec!["time".to_string()],
            order_by_direction: OrderDirection::Desc,
        }
    }

    #[test]
    fn default_target() {
        let target = ConnectionTarget::default();
        assert_eq!(target.host, "127.0.0.1");
        assert_eq!(target.port, 9042);
        assert_eq!(target.protocol_version, "3.4.4");
        assert_eq!(target.to_string(), "127.0.0.1:9042");
    }

    #[test]
    fn default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 60);
        assert_eq!(policy.inter_attempt_delay, Duration::from_secs(1));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials {
            username: "cassandra".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("cassandra"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn keyspace_requires_positive_replication() {
        let err = KeyspaceSpec::new("pluto", 0).validate().unwrap_err();
        assert_eq!(err.problems, vec!["replication_factor must be at least 1".to_string()]);
        assert!(KeyspaceSpec::new("pluto", 3).validate().is_ok());
    }

    #[test]
    fn keyspace_rejects_unsafe_name() {
        assert!(KeyspaceSpec::new("pluto; DROP", 1).validate().is_err());
    }

    #[test]
    fn valid_table_passes() {
        assert!(events_table().validate().is_ok());
    }

    #[test]
    fn column_validation_is_exhaustive() {
        let mut spec = events_table();
        spec.columns = vec![
            ColumnSpec {
                name: None,
                cql_type: Some("text".to_string()),
            },
            ColumnSpec {
                name: Some("time".to_string()),
                cql_type: None,
            },
        ];
        spec.primary_key = vec!["time".to_string()];

        let err = spec.validate().unwrap_err();
        assert_eq!(
            err.problems,
            vec![
                "'name' missing from column #1 (type text)".to_string(),
                "'type' missing from column #2 (time)".to_string(),
            ]
        );
    }

    #[test]
    fn primary_key_must_reference_columns() {
        let mut spec = events_table();
        spec.primary_key = vec!["datastream".to_string(), "nope".to_string()];
        let err = spec.validate().unwrap_err();
        assert_eq!(err.problems.len(), 1);
        assert!(err.problems[0].contains("\"nope\""));
    }

    #[test]
    fn empty_primary_key_rejected() {
        let mut spec = events_table();
        spec.primary_key.clear();
        spec.order_by.clear();
        let err = spec.validate().unwrap_err();
        assert_eq!(err.problems, vec!["primary_key must name at least one column".to_string()]);
    }

    #[test]
    fn duplicate_columns_rejected() {
        let mut spec = events_table();
        spec.columns.push(ColumnSpec::new("value", "double"));
        let err = spec.validate().unwrap_err();
        assert_eq!(err.problems, vec!["column #4 (value) is declared more than once".to_string()]);
    }

    #[test]
    fn order_by_must_reference_columns() {
        let mut spec = events_table();
        spec.order_by = vec!["when".to_string()];
        assert!(spec.validate().is_err());
    }

    #[test]
    fn folded_keyspace_is_lower_case() {
        let spec = KeyspaceSpec::new("Pluto", 3).folded();
        assert_eq!(spec.name, "pluto");
        assert_eq!(spec.replication_factor, 3);
    }

    #[test]
    fn folded_table_lowers_every_identifier() {
        let mut spec = events_table();
        spec.name = "Events".to_string();
        spec.keyspace = "Pluto".to_string();
        spec.columns[1] = ColumnSpec::new("Time", "timestamp");
        spec.primary_key = vec!["datastream".to_string(), "Time".to_string()];
        spec.order_by = vec!["TIME".to_string()];

        let folded = spec.folded();
        assert_eq!(folded, events_table());
        assert!(folded.validate().is_ok());
    }

    #[test]
    fn columns_differing_only_in_case_collide_once_folded() {
        let mut spec = events_table();
        spec.columns.push(ColumnSpec::new("Value", "double"));
        assert!(spec.validate().is_ok());
        let err = spec.folded().validate().unwrap_err();
        assert_eq!(err.problems, vec!["column #4 (value) is declared more than once".to_string()]);
    }

    #[test]
    fn direction_parsing() {
        assert_eq!("desc".parse::<OrderDirection>(), Ok(OrderDirection::Desc));
        assert_eq!("ASC".parse::<OrderDirection>(), Ok(OrderDirection::Asc));
        assert!("sideways".parse::<OrderDirection>().is_err());
    }

    #[test]
    fn table_spec_from_json_uses_defaults() {
        let spec: TableSpec = serde_json::from_str(
            r#"{"name":"t","keyspace":"k","columns":[{"name":"id","type":"uuid"}],"primary_keys":["id"]}"#,
        )
        .unwrap();
        assert_eq!(spec.order_by_direction, OrderDirection::Asc);
        assert!(spec.order_by.is_empty());
        assert_eq!(spec.primary_key, vec!["id".to_string()]);
    }
}
