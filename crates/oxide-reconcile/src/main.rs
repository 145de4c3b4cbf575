//! oxide-reconcile CLI
//!
//! Command-line tool for checking a database snapshot against its migration
//! history.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use oxide_reconcile::prelude::*;

/// Checks live tables against their migration history.
#[derive(Parser)]
#[command(name = "oxide-reconcile")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Snapshot file with live structures, history and migration changes.
    #[arg(short, long, env = "RECONCILE_SNAPSHOT", default_value = "snapshot.json")]
    snapshot: PathBuf,

    /// Target dialect (mysql, pgsql, sqlite, mssql, oci, cubrid).
    #[arg(short, long, env = "RECONCILE_DIALECT", default_value = "mysql")]
    dialect: Dialect,

    /// Database engine version, e.g. 8.0.17.
    #[arg(short, long, env = "RECONCILE_ENGINE_VERSION")]
    engine_version: Option<EngineVersion>,

    /// Migration search paths (repeatable).
    #[arg(short, long)]
    migration_path: Vec<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Order tables by foreign-key dependency.
    Arrange {
        /// Tables to arrange (all tables of the snapshot if not specified).
        tables: Vec<String>,
    },

    /// Check tables against their migration history.
    Inspect {
        /// Table to inspect (all tables, in dependency order, if not specified).
        table: Option<String>,

        /// Only describe differences, never fail on unsupported operations.
        #[arg(long)]
        show: bool,

        /// Migration to leave out of the history walk (repeatable).
        #[arg(long)]
        skip: Vec<String>,

        /// Print blueprints as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn print_blueprint(blueprint: &Blueprint) {
    if blueprint.needs_start_from_scratch() {
        println!(" [!] {}: no recorded history, start from scratch", blueprint.table_name());
    } else if blueprint.is_pending() {
        println!(" [X] {}: needs update", blueprint.table_name());
        for description in blueprint.descriptions() {
            println!("       - {description}");
        }
    } else {
        println!(" [ ] {}: up to date", blueprint.table_name());
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let snapshot = Snapshot::load(&cli.snapshot)?;
    info!(
        snapshot = %cli.snapshot.display(),
        dialect = %cli.dialect,
        tables = snapshot.structures.len(),
        "Loaded snapshot"
    );

    match cli.command {
        Commands::Arrange { tables } => {
            let tables: Vec<String> = if tables.is_empty() {
                snapshot.table_names().map(str::to_string).collect()
            } else {
                tables
            };
            let arrangement = Arranger::new(&snapshot).arrange(&tables)?;

            println!("\nTable order:");
            println!("{:-<60}", "");
            for (position, table) in arrangement.tables_in_order.iter().enumerate() {
                println!(" {:>3}. {table}", position + 1);
            }
            if !arrangement.postponed.is_empty() {
                println!("\nPostponed foreign keys:");
                println!("{:-<60}", "");
                for reference in &arrangement.postponed {
                    println!(" {} -> {}", reference.table, reference.referenced_table);
                }
            }
            println!();
        }

        Commands::Inspect {
            table,
            show,
            skip,
            json,
        } => {
            let options = ReconcileOptions {
                dialect: cli.dialect,
                engine_version: cli.engine_version,
                only_show: show,
                skip,
                search_paths: cli.migration_path,
            };
            let inspector = Inspector::new(&snapshot, &snapshot, options);

            let blueprints = match table {
                Some(table) => {
                    let live = snapshot
                        .structure_of(&table)?
                        .ok_or(ReconcileError::StructureUnavailable(table))?;
                    vec![inspector.prepare_blueprint(&live)?]
                }
                None => {
                    let tables: Vec<&str> = snapshot.table_names().collect();
                    inspector.inspect_all(&snapshot, &tables)?.blueprints
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&blueprints)?);
            } else {
                println!();
                for blueprint in &blueprints {
                    print_blueprint(blueprint);
                }
                println!();
            }
        }
    }

    Ok(())
}
