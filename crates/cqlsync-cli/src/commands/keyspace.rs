use cqlsync_core::{KeyspaceSpec, ObjectState};
use cqlsync_reconcile::KeyspaceReconciler;

use super::{ConnectionArgs, catalog_for, finish};

pub fn keyspace(
    connection: &ConnectionArgs,
    name: &str,
    replication_factor: u32,
    state: ObjectState,
    check: bool,
) -> anyhow::Result<()> {
    let manifest = connection.manifest();
    let catalog = catalog_for(&manifest);
    let spec = KeyspaceSpec::new(name, replication_factor);

    let outcome = KeyspaceReconciler::new(&catalog)
        .check_mode(check)
        .reconcile(&manifest.target, &spec, state);
    finish(&outcome)
}
