use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod report;

#[derive(Parser)]
#[command(name = "tidemark")]
#[command(about = "Apply and roll back ordered schema migrations", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
pub struct StoreArgs {
    /// Config file (YAML or TOML)
    #[arg(long, global = true, default_value = "tidemark.yml", env = "TIDEMARK_CONFIG")]
    pub config: PathBuf,

    /// SQLite database to migrate
    #[arg(long, global = true, env = "TIDEMARK_DATABASE")]
    pub database: Option<PathBuf>,

    /// Bookkeeping table name
    #[arg(long, global = true)]
    pub table: Option<String>,

    /// Directory holding <name>.up.sql / <name>.down.sql pairs
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply every pending migration
    Migrate,
    /// Undo applied migrations back to a version or a named migration
    Rollback {
        #[command(flatten)]
        target: RollbackTarget,
    },
    /// Show applied and pending migrations
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct RollbackTarget {
    /// Keep migrations up to and including this version (0 removes everything)
    #[arg(long)]
    pub to_version: Option<u32>,

    /// Keep migrations up to and including this one
    #[arg(long)]
    pub to_name: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::resolve_config(&cli.store)?;

    match cli.command {
        Commands::Migrate => commands::migrate(&config)?,
        Commands::Rollback { target } => commands::rollback(&config, &target)?,
        Commands::Status { json } => commands::status(&config, json)?,
    }

    Ok(())
}
