pub mod apply;
pub mod keyspace;
pub mod probe;
pub mod table;

use std::io::Write;

use clap::Args;
use cqlsync_core::{Credentials, Manifest};
use cqlsync_reconcile::ReconcileOutcome;
use cqlsync_store::{CqlshCatalog, CqlshRunner};

/// Connection flags shared by every subcommand. Each one overrides the
/// matching manifest field when given.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Cluster host [default: 127.0.0.1]
    #[arg(long, global = true)]
    pub host: Option<String>,
    /// Native protocol port [default: 9042]
    #[arg(long, global = true)]
    pub port: Option<u16>,
    /// Passed to cqlsh as --cqlversion [default: 3.4.4]
    #[arg(long, global = true)]
    pub cql_version: Option<String>,
    /// Path to the cqlsh binary [default: cqlsh]
    #[arg(long, global = true)]
    pub cqlsh: Option<String>,
    /// Run cqlsh through sudo
    #[arg(long, global = true)]
    pub sudo: bool,
    #[arg(short = 'u', long, global = true, requires = "password")]
    pub username: Option<String>,
    #[arg(short = 'p', long, global = true, requires = "username")]
    pub password: Option<String>,
}

impl ConnectionArgs {
    pub fn override_manifest(&self, manifest: &mut Manifest) {
        if let Some(host) = &self.host {
            manifest.target.host = host.clone();
        }
        if let Some(port) = self.port {
            manifest.target.port = port;
        }
        if let Some(version) = &self.cql_version {
            manifest.target.protocol_version = version.clone();
        }
        if let Some(binary) = &self.cqlsh {
            manifest.cqlsh.binary = binary.clone();
        }
        if self.sudo {
            manifest.cqlsh.sudo = true;
        }
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            manifest.auth = Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            });
        }
    }

    /// A manifest holding only defaults plus these flags.
    pub fn manifest(&self) -> Manifest {
        let mut manifest = Manifest::default();
        self.override_manifest(&mut manifest);
        manifest
    }
}

pub fn catalog_for(manifest: &Manifest) -> CqlshCatalog<CqlshRunner> {
    let runner = CqlshRunner::new(&manifest.cqlsh.binary)
        .with_sudo(manifest.cqlsh.sudo)
        .with_credentials(manifest.auth.clone());
    CqlshCatalog::new(runner)
}

/// One JSON line per object, with a human-readable `msg` alongside.
pub fn render(outcome: &ReconcileOutcome) -> anyhow::Result<String> {
    let mut value = serde_json::to_value(outcome)?;
    if let Some(fields) = value.as_object_mut() {
        fields.insert("msg".to_string(), outcome.msg().into());
    }
    Ok(serde_json::to_string(&value)?)
}

pub fn emit(out: &mut impl Write, outcome: &ReconcileOutcome) -> anyhow::Result<()> {
    writeln!(out, "{}", render(outcome)?)?;
    Ok(())
}

/// Print a single-object outcome and turn a failure into a non-zero exit.
pub fn finish(outcome: &ReconcileOutcome) -> anyhow::Result<()> {
    emit(&mut std::io::stdout().lock(), outcome)?;
    if outcome.failed {
        anyhow::bail!("{}: {}", outcome.object, outcome.msg());
    }
    Ok(())
}
