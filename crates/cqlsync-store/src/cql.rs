//! CQL statement templates.
//!
//! Every name is checked with [`cqlsync_core::ident`] before it is
//! interpolated; nothing is quoted or escaped.

use cqlsync_core::ident::check_identifier;
use cqlsync_core::{KeyspaceSpec, TableSpec, ValidationError, ValidationResult};

/// Trivial round trip used by the connection probe.
pub const PROBE_QUERY: &str = "SELECT now() FROM system.local;";

pub const LIST_KEYSPACES: &str = "DESC KEYSPACES;";

/// Lists tables of the keyspace the session is bound to.
pub const LIST_TABLES: &str = "DESCRIBE TABLES;";

/// Refuse `name` unless it is a plain identifier.
pub fn check_name(kind: &str, name: &str) -> ValidationResult<()> {
    let mut problems = Vec::new();
    check_identifier(kind, name, &mut problems);
    ValidationError::check(format!("{kind} {name:?}"), problems)
}

pub fn describe_keyspace(name: &str) -> ValidationResult<String> {
    check_name("keyspace", name)?;
    Ok(format!("DESCRIBE KEYSPACE {name};"))
}

pub fn create_keyspace(spec: &KeyspaceSpec) -> ValidationResult<String> {
    spec.validate()?;
    Ok(format!(
        "CREATE KEYSPACE {} WITH replication = {{'class':'{}', 'replication_factor': {}}};",
        spec.name,
        spec.replication_strategy.class_name(),
        spec.replication_factor
    ))
}

pub fn alter_keyspace(spec: &KeyspaceSpec) -> ValidationResult<String> {
    spec.validate()?;
    Ok(format!(
        "ALTER KEYSPACE {} WITH REPLICATION = {{'class': '{}', 'replication_factor': {}}};",
        spec.name,
        spec.replication_strategy.class_name(),
        spec.replication_factor
    ))
}

pub fn drop_keyspace(name: &str) -> ValidationResult<String> {
    check_name("keyspace", name)?;
    Ok(format!("DROP KEYSPACE {name};"))
}

/// `CREATE TABLE` with columns and primary key in declared order, plus a
/// clustering clause when `order_by` is non-empty.
pub fn create_table(spec: &TableSpec) -> ValidationResult<String> {
    spec.validate()?;

    let columns = spec
        .columns
        .iter()
        .filter_map(|c| Some(format!("{} {}", c.name.as_deref()?, c.cql_type.as_deref()?.trim())))
        .collect::<Vec<_>>()
        .join(", ");
    let primary_key = spec.primary_key.join(", ");

    let clustering = if spec.order_by.is_empty() {
        String::new()
    } else {
        let order = spec
            .order_by
            .iter()
            .map(|c| format!("{c} {}", spec.order_by_direction))
            .collect::<Vec<_>>()
            .join(", ");
        format!(" WITH CLUSTERING ORDER BY ({order})")
    };

    Ok(format!(
        "CREATE TABLE {}({columns}, PRIMARY KEY ({primary_key})){clustering};",
        spec.name
    ))
}

/// `DROP TABLE` by bare name; the session must already be bound to the
/// table's keyspace.
pub fn drop_table(name: &str) -> ValidationResult<String> {
    check_name("table", name)?;
    Ok(format!("DROP TABLE {name};"))
}
