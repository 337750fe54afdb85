//! task-relay server binary.
//!
//! Parses the CLI, wires up logging and configuration, and either runs a
//! one-shot admin command or starts the service: open the store, reconcile
//! statistics, start the background scheduler, and wait for ctrl-c.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use task_relay::config::Config;
use task_relay::db::Database;
use task_relay::notify::LogNotifier;
use task_relay::scheduler::Scheduler;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Task circulation service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    log: String,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the service (default if no subcommand given)
    Serve,

    /// Rebuild the statistics table from task rows and exit
    RebuildStats,

    /// Add a user to the directory
    AddUser {
        /// Display name
        name: String,
        /// Unique email address
        email: String,
        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new().create(true).append(true).open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }

    match cli.command {
        Some(Command::RebuildStats) => {
            let db = open_database(&config)?;
            db.rebuild_statistics()?;
            let stats = db.get_statistics()?;
            println!("statistics rebuilt: {} tasks", stats.total);
        }
        Some(Command::AddUser { name, email, admin }) => {
            let db = open_database(&config)?;
            let user = db.create_user(&name, &email, admin)?;
            println!("user {} added: {} <{}>", user.id, user.name, user.email);
        }
        Some(Command::Serve) | None => {
            serve(config).await?;
        }
    }

    Ok(())
}

fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Database::open(&config.database)
}

async fn serve(config: Config) -> Result<()> {
    let db = open_database(&config)?;
    info!(database = %config.database.display(), "task-relay starting");

    // Reconcile aggregates before the first job run.
    db.rebuild_statistics()?;

    let scheduler = Scheduler::new(db, Arc::new(LogNotifier), config.jobs.clone());
    let handle = scheduler.start();

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    handle.stop().await;
    Ok(())
}
