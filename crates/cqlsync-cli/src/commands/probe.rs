use cqlsync_core::ConnectionTarget;
use cqlsync_probe::{ConnectionProbe, ProbeError, Sleeper};
use cqlsync_reconcile::{ErrorInfo, ErrorKind, ReconcileOutcome};
use cqlsync_store::SchemaCatalog;

use super::{ConnectionArgs, catalog_for, finish};

pub fn probe(connection: &ConnectionArgs, attempts: u32, delay: &str) -> anyhow::Result<()> {
    let mut manifest = connection.manifest();
    manifest.probe.attempts = attempts;
    manifest.probe.delay = delay.to_string();
    let policy = manifest.probe.retry_policy()?;

    let catalog = catalog_for(&manifest);
    let outcome = wait_for(&catalog, &manifest.target, &ConnectionProbe::new(policy));
    finish(&outcome)
}

/// Run the probe and report it like any other object.
pub fn wait_for<C: SchemaCatalog + ?Sized, S: Sleeper>(
    catalog: &C,
    target: &ConnectionTarget,
    probe: &ConnectionProbe<S>,
) -> ReconcileOutcome {
    let object = format!("target {target}");
    match probe.wait_until_ready(catalog, target) {
        Ok(_) => ReconcileOutcome::unchanged(object),
        Err(ProbeError::Exhausted { errors, .. }) => ReconcileOutcome::failed(
            object,
            None,
            ErrorInfo::new(ErrorKind::RetryExhausted, errors.into_iter().collect()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cqlsync_core::RetryPolicy;
    use cqlsync_probe::RecordingSleeper;
    use cqlsync_store::cql::PROBE_QUERY;
    use cqlsync_store::{CqlshCatalog, ExecOutput, ScriptedRunner};

    use super::*;

    #[test]
    fn exhausted_probe_lists_distinct_errors() {
        let runner = ScriptedRunner::new();
        runner
            .respond(PROBE_QUERY, ExecOutput::failed(1, "Connection refused"))
            .respond(PROBE_QUERY, ExecOutput::failed(1, "AuthenticationFailed"));
        let catalog = CqlshCatalog::new(&runner);
        let probe = ConnectionProbe::with_sleeper(
            RetryPolicy::new(3, Duration::from_millis(10)),
            RecordingSleeper::new(),
        );

        let outcome = wait_for(&catalog, &ConnectionTarget::default(), &probe);

        assert!(outcome.failed);
        assert_eq!(outcome.object, "target 127.0.0.1:9042");
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, ErrorKind::RetryExhausted);
        assert_eq!(
            error.messages,
            vec!["AuthenticationFailed".to_string(), "Connection refused".to_string()]
        );
    }

    #[test]
    fn ready_target_is_unchanged() {
        let runner = ScriptedRunner::new();
        let catalog = CqlshCatalog::new(&runner);
        let probe = ConnectionProbe::with_sleeper(RetryPolicy::default(), RecordingSleeper::new());

        let outcome = wait_for(&catalog, &ConnectionTarget::default(), &probe);
        assert!(outcome.is_ok());
        assert!(!outcome.changed);
    }
}
