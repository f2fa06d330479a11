//! shale-migrate CLI
//!
//! Command-line tool for generating and running schema migrations.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use shale_core::prelude::*;
use shale_migrate::prelude::*;

/// Schema-diff driven, reversible SQLite migrations.
#[derive(Parser)]
#[command(name = "shale-migrate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (SQLite path or connection string).
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:db.sqlite3")]
    database: String,

    /// Migrations directory.
    #[arg(short, long, default_value = "migrations")]
    migrations_dir: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the migrations system (create history table).
    Init,

    /// Show applied and pending migrations.
    Status,

    /// Show the diff between the stored/live schema and a desired schema.
    Plan {
        /// Desired schema as a JSON file.
        #[arg(short, long)]
        schema: PathBuf,
    },

    /// Generate a migration from schema changes and refresh the snapshot.
    Make {
        /// Desired schema as a JSON file.
        #[arg(short, long)]
        schema: PathBuf,

        /// Migration name/description.
        #[arg(short, long)]
        name: String,

        /// Show SQL without writing files (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Apply pending migrations.
    Migrate {
        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },

    /// Roll back the most recently applied migration.
    Rollback {
        /// Show SQL without executing (dry run).
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
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

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&cli.database)
        .await?;

    let snapshots = SnapshotStore::new(&cli.migrations_dir);
    let artifacts = ArtifactStore::new(&cli.migrations_dir);

    match cli.command {
        Commands::Init => {
            let executor = MigrationExecutor::new(pool, SqliteDialect::new());
            executor.init().await?;
            info!("History table created.");
        }

        Commands::Status => {
            let executor = MigrationExecutor::new(pool, SqliteDialect::new());
            executor.init().await?;

            let applied = executor.history().get_applied().await?;
            for migration in &applied {
                println!(
                    " [X] {} ({})",
                    migration.id,
                    migration.applied_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
            let pending = executor.pending(artifacts.load_all()?).await?;
            for migration in &pending {
                println!(" [ ] {}", migration.id);
            }
            if applied.is_empty() && pending.is_empty() {
                info!("No migrations found.");
            }
        }

        Commands::Plan { schema } => {
            let desired = load_schema(&schema)?;
            let current = current_schema(&snapshots, &pool).await?;

            let lines = Changeset::between(current.as_ref(), &desired).summary();
            if lines.is_empty() {
                println!("No changes detected.");
            } else {
                for line in lines {
                    println!("{line}");
                }
            }
        }

        Commands::Make {
            schema,
            name,
            dry_run,
        } => {
            let desired = load_schema(&schema)?;
            let current = current_schema(&snapshots, &pool).await?;

            let mut migration =
                generate(current.as_ref(), &desired, &name, chrono::Utc::now());
            migration.id = MigrationId::new(&name, chrono::Utc::now())
                .after(artifacts.latest_id()?.as_deref())
                .to_string();

            for change in &migration.unsupported {
                warn!("{change}");
            }

            if dry_run {
                println!("Would create migration: {}", migration.id);
                for statement in migration.script(&SqliteDialect::new(), false) {
                    println!("{statement};");
                }
            } else {
                let path = artifacts.save(&migration)?;
                snapshots.save(&desired)?;
                info!("Created migration: {}", path.display());
                if !migration.has_operations() {
                    info!("No changes detected; wrote an empty migration.");
                }
            }
        }

        Commands::Migrate { dry_run } => {
            let executor =
                MigrationExecutor::new(pool, SqliteDialect::new()).dry_run(dry_run);
            executor.init().await?;

            let pending = executor.pending(artifacts.load_all()?).await?;
            if pending.is_empty() {
                info!("Nothing to apply.");
            }
            for migration in &pending {
                let statements = executor.apply(migration).await?;
                if dry_run {
                    println!("-- {}", migration.id);
                    for statement in statements {
                        println!("{statement};");
                    }
                }
            }
        }

        Commands::Rollback { dry_run } => {
            let executor =
                MigrationExecutor::new(pool, SqliteDialect::new()).dry_run(dry_run);
            executor.init().await?;

            match executor.history().get_last_applied().await? {
                None => info!("Nothing to roll back."),
                Some(last) => {
                    let migration = artifacts.load(&last.id)?;
                    let statements = executor.rollback(&migration).await?;
                    if dry_run {
                        for statement in statements {
                            println!("{statement};");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Reads a desired-schema JSON file (the declarative model's output).
fn load_schema(path: &PathBuf) -> anyhow::Result<Schema> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// The "old" schema: the stored snapshot when one exists, otherwise the
/// live database.
async fn current_schema(
    snapshots: &SnapshotStore,
    pool: &sqlx::SqlitePool,
) -> anyhow::Result<Option<Schema>> {
    if let Some(schema) = snapshots.load()? {
        return Ok(Some(schema));
    }
    let live = introspect_schema(pool).await?;
    if live.is_empty() {
        Ok(None)
    } else {
        Ok(Some(live))
    }
}
