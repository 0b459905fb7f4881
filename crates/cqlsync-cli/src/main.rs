use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use cqlsync_core::{ObjectState, OrderDirection};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::ConnectionArgs;

#[derive(Parser)]
#[command(
    name = "cqlsync",
    about = "cqlsync: declarative keyspace and table management over cqlsh",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Plan against the live schema but execute no mutation
    #[arg(long, global = true)]
    check: bool,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait until the target answers a trivial query
    Probe {
        /// Attempts before giving up
        #[arg(long, default_value_t = cqlsync_core::DEFAULT_PROBE_ATTEMPTS)]
        attempts: u32,
        /// Fixed delay between attempts ("1s", "500ms", "1m")
        #[arg(long, default_value = "1s")]
        delay: String,
    },
    /// Converge one keyspace
    Keyspace {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 1)]
        replication_factor: u32,
        /// present or absent
        #[arg(long, default_value = "present")]
        state: ObjectState,
    },
    /// Converge one table. Existing tables are never altered.
    Table {
        #[arg(long)]
        name: String,
        #[arg(long)]
        keyspace: String,
        /// Column as name:type, repeated in declared order
        #[arg(long = "column", value_name = "NAME:TYPE", required = true)]
        columns: Vec<String>,
        /// Primary key columns, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        primary_key: Vec<String>,
        /// Clustering columns, comma-separated
        #[arg(long, value_delimiter = ',')]
        order_by: Vec<String>,
        /// ASC or DESC, applied to every clustering column
        #[arg(long, default_value = "ASC")]
        order_by_direction: OrderDirection,
        #[arg(long, default_value = "present")]
        state: ObjectState,
    },
    /// Probe, then converge every object in a manifest
    Apply {
        #[arg(short, long, default_value = "cqlsync.toml")]
        file: PathBuf,
    },
    /// Check a manifest without contacting the cluster
    Validate {
        #[arg(short, long, default_value = "cqlsync.toml")]
        file: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,cqlsync={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Probe { attempts, delay } => {
            commands::probe::probe(&cli.connection, attempts, &delay)
        }
        Commands::Keyspace {
            name,
            replication_factor,
            state,
        } => commands::keyspace::keyspace(&cli.connection, &name, replication_factor, state, cli.check),
        Commands::Table {
            name,
            keyspace,
            columns,
            primary_key,
            order_by,
            order_by_direction,
            state,
        } => {
            let spec = commands::table::table_spec(
                &name,
                &keyspace,
                &columns,
                primary_key,
                order_by,
                order_by_direction,
            );
            commands::table::table(&cli.connection, &spec, state, cli.check)
        }
        Commands::Apply { file } => commands::apply::apply(&cli.connection, &file, cli.check),
        Commands::Validate { file } => commands::apply::validate(&file),
    }
}
