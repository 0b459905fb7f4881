use std::io::Write;
use std::path::Path;

use anyhow::Context;
use cqlsync_core::{Manifest, ObjectState};
use cqlsync_probe::{ConnectionProbe, Sleeper};
use cqlsync_reconcile::{KeyspaceReconciler, ReconcileOutcome, TableReconciler};
use cqlsync_store::SchemaCatalog;
use tracing::info;

use super::probe::wait_for;
use super::{ConnectionArgs, catalog_for, emit};

/// Tally of one manifest run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub changed: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: &ReconcileOutcome) {
        self.total += 1;
        if outcome.changed {
            self.changed += 1;
        }
        if outcome.failed {
            self.failed += 1;
        }
    }
}

fn load(file: &Path) -> anyhow::Result<Manifest> {
    Manifest::from_file(file).with_context(|| format!("failed to load {}", file.display()))
}

pub fn apply(connection: &ConnectionArgs, file: &Path, check: bool) -> anyhow::Result<()> {
    let mut manifest = load(file)?;
    connection.override_manifest(&mut manifest);
    let policy = manifest.probe.retry_policy()?;

    let catalog = catalog_for(&manifest);
    let probe = ConnectionProbe::new(policy);
    let summary = run(&manifest, &catalog, &probe, check, &mut std::io::stdout().lock())?;

    info!(
        target_host = %manifest.target,
        total = summary.total,
        changed = summary.changed,
        failed = summary.failed,
        check,
        "apply finished"
    );
    if summary.failed > 0 {
        anyhow::bail!("{} of {} objects failed", summary.failed, summary.total);
    }
    Ok(())
}

/// Probe once, then converge objects in dependency order: keyspaces to
/// keep, every table, keyspaces to drop. A failed object does not stop the
/// run; a failed probe does.
pub fn run<C, S, W>(
    manifest: &Manifest,
    catalog: &C,
    probe: &ConnectionProbe<S>,
    check: bool,
    out: &mut W,
) -> anyhow::Result<Summary>
where
    C: SchemaCatalog + ?Sized,
    S: Sleeper,
    W: Write,
{
    let target = &manifest.target;
    let mut summary = Summary::default();

    if manifest.probe.enabled {
        let outcome = wait_for(catalog, target, probe);
        emit(out, &outcome)?;
        summary.record(&outcome);
        if outcome.failed {
            return Ok(summary);
        }
    }

    let keyspaces = KeyspaceReconciler::new(catalog).check_mode(check);
    let tables = TableReconciler::new(catalog).check_mode(check);

    let (dropped, kept): (Vec<_>, Vec<_>) = manifest
        .keyspaces
        .iter()
        .partition(|entry| entry.state == ObjectState::Absent);

    for entry in kept {
        let outcome = keyspaces.reconcile(target, &entry.spec, entry.state);
        emit(out, &outcome)?;
        summary.record(&outcome);
    }
    for entry in &manifest.tables {
        let outcome = tables.reconcile(target, &entry.spec, entry.state);
        emit(out, &outcome)?;
        summary.record(&outcome);
    }
    for entry in dropped {
        let outcome = keyspaces.reconcile(target, &entry.spec, entry.state);
        emit(out, &outcome)?;
        summary.record(&outcome);
    }

    Ok(summary)
}

pub fn validate(file: &Path) -> anyhow::Result<()> {
    let manifest = load(file)?;
    manifest.validate()?;
    println!(
        "✓ {} is valid ({} keyspaces, {} tables)",
        file.display(),
        manifest.keyspaces.len(),
        manifest.tables.len()
    );
    Ok(())
}
