use cqlsync_core::{ColumnSpec, ObjectState, OrderDirection, TableSpec};
use cqlsync_reconcile::TableReconciler;

use super::{ConnectionArgs, catalog_for, finish};

pub fn table(
    connection: &ConnectionArgs,
    spec: &TableSpec,
    state: ObjectState,
    check: bool,
) -> anyhow::Result<()> {
    let manifest = connection.manifest();
    let catalog = catalog_for(&manifest);

    let outcome = TableReconciler::new(&catalog)
        .check_mode(check)
        .reconcile(&manifest.target, spec, state);
    finish(&outcome)
}

pub fn table_spec(
    name: &str,
    keyspace: &str,
    columns: &[String],
    primary_key: Vec<String>,
    order_by: Vec<String>,
    order_by_direction: OrderDirection,
) -> TableSpec {
    TableSpec {
        name: name.to_string(),
        keyspace: keyspace.to_string(),
        columns: columns.iter().map(|c| parse_column(c)).collect(),
        primary_key,
        order_by,
        order_by_direction,
    }
}

/// `name:type`. An empty half is left unset so validation reports it
/// against the column.
pub fn parse_column(raw: &str) -> ColumnSpec {
    let non_empty = |s: &str| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    };
    match raw.split_once(':') {
        Some((name, ty)) => ColumnSpec {
            name: non_empty(name),
            cql_type: non_empty(ty),
        },
        None => ColumnSpec {
            name: non_empty(raw),
            cql_type: None,
        },
    }
}
