//! Table reconciler. Only existence is converged; an existing table is never
//! compared column by column.

use cqlsync_core::{ConnectionTarget, ObjectState, ObservedTable, TableSpec};
use cqlsync_store::{SchemaCatalog, cql};
use tracing::{debug, info};

use crate::error::ReconcileResult;
use crate::outcome::{Action, ReconcileOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Absent,
    Present,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    pub state: TableState,
    pub action: Action,
    pub statement: Option<String>,
}

/// Converges one table per call.
#[derive(Debug)]
pub struct TableReconciler<'a, C: ?Sized> {
    catalog: &'a C,
    check_mode: bool,
}

impl<'a, C: SchemaCatalog + ?Sized> TableReconciler<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        Self {
            catalog,
            check_mode: false,
        }
    }

    pub fn check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }

    /// Validate the whole declaration, then look the table up inside its
    /// keyspace. Nothing reaches the store if validation fails. Identifiers
    /// are lower-cased first, as the store records them.
    pub fn plan(
        &self,
        target: &ConnectionTarget,
        spec: &TableSpec,
        desired: ObjectState,
    ) -> ReconcileResult<TablePlan> {
        let spec = &spec.folded();
        spec.validate()?;

        let observed = ObservedTable {
            exists: self
                .catalog
                .list_tables(target, &spec.keyspace)?
                .contains(&spec.name),
        };
        let state = if observed.exists {
            TableState::Present
        } else {
            TableState::Absent
        };
        debug!(keyspace = %spec.keyspace, table = %spec.name, ?state, ?desired, "observed table");

        let (action, statement) = match (desired, state) {
            (ObjectState::Present, TableState::Absent) => {
                (Action::Create, Some(cql::create_table(spec)?))
            }
            (ObjectState::Absent, TableState::Present) => {
                (Action::Drop, Some(cql::drop_table(&spec.name)?))
            }
            _ => (Action::Noop, None),
        };

        Ok(TablePlan {
            state,
            action,
            statement,
        })
    }

    pub fn apply(
        &self,
        target: &ConnectionTarget,
        spec: &TableSpec,
        action: Action,
    ) -> ReconcileResult<()> {
        let spec = &spec.folded();
        match action {
            Action::Create => {
                self.catalog.create_table(target, spec)?;
                info!(keyspace = %spec.keyspace, table = %spec.name, "table created");
            }
            Action::Drop => {
                self.catalog.drop_table(target, &spec.keyspace, &spec.name)?;
                info!(keyspace = %spec.keyspace, table = %spec.name, "table dropped");
            }
            Action::Noop | Action::AlterReplication { .. } => {}
        }
        Ok(())
    }

    pub fn reconcile(
        &self,
        target: &ConnectionTarget,
        spec: &TableSpec,
        desired: ObjectState,
    ) -> ReconcileOutcome {
        let folded = spec.folded();
        let object = format!("table {}.{}", folded.keyspace, folded.name);

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

#[cfg(test)]
mod tests {
    use cqlsync_core::{ColumnSpec, OrderDirection};
    use cqlsync_store::{CqlshCatalog, ExecOutput, ScriptedRunner};

    use super::*;
    use crate::outcome::ErrorKind;

    fn events() -> TableSpec {
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
    fn absent_table_is_created_in_keyspace() {
        let runner = ScriptedRunner::new();
        let catalog = CqlshCatalog::new(&runner);

        let outcome = TableReconciler::new(&catalog).reconcile(
            &ConnectionTarget::default(),
            &events(),
            ObjectState::Present,
        );

        assert!(outcome.changed);
        assert_eq!(outcome.object, "table pluto.events");
        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].statement, cql::LIST_TABLES);
        assert!(calls[1].statement.starts_with("CREATE TABLE events("));
        assert_eq!(calls[1].keyspace.as_deref(), Some("pluto"));
    }

    #[test]
    fn existing_table_is_left_alone() {
        let runner = ScriptedRunner::new();
        runner.respond(cql::LIST_TABLES, ExecOutput::ok("events  readings\n"));
        let catalog = CqlshCatalog::new(&runner);

        let mut drifted = events();
        drifted.columns.push(ColumnSpec::new("unit", "text"));
        let outcome = TableReconciler::new(&catalog).reconcile(
            &ConnectionTarget::default(),
            &drifted,
            ObjectState::Present,
        );

        assert!(!outcome.changed);
        assert_eq!(outcome.action, Some(Action::Noop));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn present_table_is_dropped_by_bare_name() {
        let runner = ScriptedRunner::new();
        runner.respond(cql::LIST_TABLES, ExecOutput::ok("events\n"));
        let catalog = CqlshCatalog::new(&runner);

        let outcome = TableReconciler::new(&catalog).reconcile(
            &ConnectionTarget::default(),
            &events(),
            ObjectState::Absent,
        );

        assert!(outcome.changed);
        let drop = runner.calls().pop().unwrap();
        assert_eq!(drop.statement, "DROP TABLE events;");
        assert_eq!(drop.keyspace.as_deref(), Some("pluto"));
    }

    #[test]
    fn mixed_case_names_match_the_listed_table() {
        let runner = ScriptedRunner::new();
        runner.respond(cql::LIST_TABLES, ExecOutput::ok("events\n"));
        let catalog = CqlshCatalog::new(&runner);

        let mut spec = events();
        spec.name = "Events".to_string();
        spec.keyspace = "Pluto".to_string();
        let outcome = TableReconciler::new(&catalog).reconcile(
            &ConnectionTarget::default(),
            &spec,
            ObjectState::Present,
        );

        assert!(!outcome.changed);
        assert_eq!(outcome.object, "table pluto.events");
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].keyspace.as_deref(), Some("pluto"));
    }

    #[test]
    fn mixed_case_declaration_is_created_lower_cased() {
        let runner = ScriptedRunner::new();
        let catalog = CqlshCatalog::new(&runner);

        let mut spec = events();
        spec.name = "Events".to_string();
        spec.columns[1] = ColumnSpec::new("Time", "timestamp");
        spec.primary_key[1] = "Time".to_string();
        spec.order_by = vec!["TIME".to_string()];
        let outcome = TableReconciler::new(&catalog).reconcile(
            &ConnectionTarget::default(),
            &spec,
            ObjectState::Present,
        );

        assert!(outcome.changed);
        assert_eq!(outcome.statement, Some(cql::create_table(&events()).unwrap()));
    }

    #[test]
    fn absent_table_stays_absent() {
        let runner = ScriptedRunner::new();
        let catalog = CqlshCatalog::new(&runner);

        let plan = TableReconciler::new(&catalog)
            .plan(&ConnectionTarget::default(), &events(), ObjectState::Absent)
            .unwrap();
        assert_eq!(plan.state, TableState::Absent);
        assert_eq!(plan.action, Action::Noop);
    }

    #[test]
    fn every_bad_column_is_reported_before_any_call() {
        let runner = ScriptedRunner::new();
        let catalog = CqlshCatalog::new(&runner);

        let mut spec = events();
        spec.columns[0].cql_type = None;
        spec.columns[2].name = None;
        let outcome = TableReconciler::new(&catalog).reconcile(
            &ConnectionTarget::default(),
            &spec,
            ObjectState::Present,
        );

        let error = outcome.error.unwrap();
        assert_eq!(error.kind, ErrorKind::Validation);
        assert_eq!(
            error.messages,
            vec![
                "'type' missing from column #1 (datastream)".to_string(),
                "'name' missing from column #3 (type float)".to_string(),
            ]
        );
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn failed_create_is_not_retried() {
        let runner = ScriptedRunner::new();
        let create = cql::create_table(&events()).unwrap();
        runner.respond(&create, ExecOutput::failed(2, "InvalidRequest: bad clustering"));
        let catalog = CqlshCatalog::new(&runner);

        let outcome = TableReconciler::new(&catalog).reconcile(
            &ConnectionTarget::default(),
            &events(),
            ObjectState::Present,
        );

        assert!(outcome.failed);
        assert_eq!(outcome.action, Some(Action::Create));
        assert_eq!(
            outcome.error.unwrap().messages,
            vec!["bad return code 2: InvalidRequest: bad clustering".to_string()]
        );
        assert_eq!(runner.calls().len(), 2);
    }
}
