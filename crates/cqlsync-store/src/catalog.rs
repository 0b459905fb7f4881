//! Typed schema catalog.
//!
//! Reconcilers only see [`SchemaCatalog`]. [`CqlshCatalog`] implements it
//! by running statements through a [`CommandRunner`] and scraping the text
//! output; a driver-backed implementation can replace it without touching
//! reconciliation logic.

use std::collections::BTreeSet;

use cqlsync_core::{ConnectionTarget, KeyspaceSpec, ObservedKeyspace, TableSpec};

use crate::cql;
use crate::error::StoreResult;
use crate::parse::{parse_keyspace_list, parse_replication_factor, parse_table_list};
use crate::runner::CommandRunner;

/// Schema reads and writes against one store.
pub trait SchemaCatalog {
    /// Trivial round trip; succeeds iff the store answered.
    fn ping(&self, target: &ConnectionTarget) -> StoreResult<()>;

    fn list_keyspaces(&self, target: &ConnectionTarget) -> StoreResult<BTreeSet<String>>;

    /// Describe an existing keyspace, including its replication factor.
    fn describe_keyspace(&self, target: &ConnectionTarget, name: &str) -> StoreResult<ObservedKeyspace>;

    fn list_tables(&self, target: &ConnectionTarget, keyspace: &str) -> StoreResult<BTreeSet<String>>;

    fn create_keyspace(&self, target: &ConnectionTarget, spec: &KeyspaceSpec) -> StoreResult<()>;

    /// Set the replication of an existing keyspace to `spec`'s.
    fn alter_keyspace(&self, target: &ConnectionTarget, spec: &KeyspaceSpec) -> StoreResult<()>;

    fn drop_keyspace(&self, target: &ConnectionTarget, name: &str) -> StoreResult<()>;

    fn create_table(&self, target: &ConnectionTarget, spec: &TableSpec) -> StoreResult<()>;

    fn drop_table(&self, target: &ConnectionTarget, keyspace: &str, name: &str) -> StoreResult<()>;
}

/// [`SchemaCatalog`] over cqlsh text output.
#[derive(Debug, Clone, Default)]
pub struct CqlshCatalog<R> {
    runner: R,
}

impl<R: CommandRunner> CqlshCatalog<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn run(&self, target: &ConnectionTarget, statement: &str, keyspace: Option<&str>) -> StoreResult<String> {
        self.runner.execute(target, statement, keyspace)?.into_stdout()
    }
}

impl<R: CommandRunner> SchemaCatalog for CqlshCatalog<R> {
    fn ping(&self, target: &ConnectionTarget) -> StoreResult<()> {
        self.run(target, cql::PROBE_QUERY, None).map(|_| ())
    }

    fn list_keyspaces(&self, target: &ConnectionTarget) -> StoreResult<BTreeSet<String>> {
        let out = self.run(target, cql::LIST_KEYSPACES, None)?;
        Ok(parse_keyspace_list(&out))
    }

    fn describe_keyspace(&self, target: &ConnectionTarget, name: &str) -> StoreResult<ObservedKeyspace> {
        let out = self.run(target, &cql::describe_keyspace(name)?, None)?;
        let replication_factor = parse_replication_factor(&out)?;
        Ok(ObservedKeyspace {
            exists: true,
            replication_factor: Some(replication_factor),
        })
    }

    fn list_tables(&self, target: &ConnectionTarget, keyspace: &str) -> StoreResult<BTreeSet<String>> {
        cql::check_name("keyspace", keyspace)?;
        let out = self.run(target, cql::LIST_TABLES, Some(keyspace))?;
        Ok(parse_table_list(&out))
    }

    fn create_keyspace(&self, target: &ConnectionTarget, spec: &KeyspaceSpec) -> StoreResult<()> {
        self.run(target, &cql::create_keyspace(spec)?, None).map(|_| ())
    }

    fn alter_keyspace(&self, target: &ConnectionTarget, spec: &KeyspaceSpec) -> StoreResult<()> {
        self.run(target, &cql::alter_keyspace(spec)?, None).map(|_| ())
    }

    fn drop_keyspace(&self, target: &ConnectionTarget, name: &str) -> StoreResult<()> {
        self.run(target, &cql::drop_keyspace(name)?, None).map(|_| ())
    }

    fn create_table(&self, target: &ConnectionTarget, spec: &TableSpec) -> StoreResult<()> {
        self.run(target, &cql::create_table(spec)?, Some(&spec.keyspace)).map(|_| ())
    }

    fn drop_table(&self, target: &ConnectionTarget, keyspace: &str, name: &str) -> StoreResult<()> {
        cql::check_name("keyspace", keyspace)?;
        self.run(target, &cql::drop_table(name)?, Some(keyspace)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::runner::{ExecOutput, ScriptedRunner};

    fn target() -> ConnectionTarget {
        ConnectionTarget::new("10.0.0.5", 9042, "3.4.4")
    }

    #[test]
    fn list_keyspaces_parses_output() {
        let runner = ScriptedRunner::new();
        runner.respond(cql::LIST_KEYSPACES, ExecOutput::ok("system  pluto\n"));
        let catalog = CqlshCatalog::new(&runner);

        let names = catalog.list_keyspaces(&target()).unwrap();
        assert!(names.contains("pluto"));
        assert_eq!(runner.calls()[0].target, target());
    }

    #[test]
    fn failed_query_is_connection_error() {
        let runner = ScriptedRunner::new();
        runner.respond(cql::LIST_KEYSPACES, ExecOutput::failed(1, "Connection refused"));
        let catalog = CqlshCatalog::new(&runner);

        let err = catalog.list_keyspaces(&target()).unwrap_err();
        assert!(matches!(err, StoreError::Connection { .. }));
    }

    #[test]
    fn describe_keyspace_reads_replication_factor() {
        let runner = ScriptedRunner::new();
        runner.respond(
            "DESCRIBE KEYSPACE pluto;",
            ExecOutput::ok("CREATE KEYSPACE pluto WITH replication = {'class': 'SimpleStrategy', 'replication_factor': '2'};"),
        );
        let catalog = CqlshCatalog::new(&runner);

        let observed = catalog.describe_keyspace(&target(), "pluto").unwrap();
        assert_eq!(observed.replication_factor, Some(2));
    }

    #[test]
    fn describe_without_map_is_parse_error() {
        let runner = ScriptedRunner::new();
        runner.respond("DESCRIBE KEYSPACE pluto;", ExecOutput::ok("nothing useful"));
        let catalog = CqlshCatalog::new(&runner);

        let err = catalog.describe_keyspace(&target(), "pluto").unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
    }

    #[test]
    fn table_calls_are_bound_to_keyspace() {
        let runner = ScriptedRunner::new();
        runner.respond(cql::LIST_TABLES, ExecOutput::ok("events\n"));
        let catalog = CqlshCatalog::new(&runner);

        let tables = catalog.list_tables(&target(), "pluto").unwrap();
        assert!(tables.contains("events"));
        catalog.drop_table(&target(), "pluto", "events").unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].keyspace.as_deref(), Some("pluto"));
        assert_eq!(calls[1].statement, "DROP TABLE events;");
        assert_eq!(calls[1].keyspace.as_deref(), Some("pluto"));
    }

    #[test]
    fn unsafe_keyspace_never_reaches_runner() {
        let runner = ScriptedRunner::new();
        let catalog = CqlshCatalog::new(&runner);

        let err = catalog.list_tables(&target(), "pluto -e 'DROP'").unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert!(runner.calls().is_empty());
    }
}
