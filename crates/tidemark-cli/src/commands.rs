use anyhow::{Context, Result};
use tidemark_config::{ConfigLoader, MigratorConfig};
use tidemark_db::{Migrator, SqliteAdapter, load_migrations};
use tracing::info;

use crate::report;
use crate::{RollbackTarget, StoreArgs};

/// Load the config file (defaults when absent) and apply command-line overrides.
pub fn resolve_config(args: &StoreArgs) -> Result<MigratorConfig> {
    let mut config = ConfigLoader::load_or_default(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    if let Some(database) = &args.database {
        config.database = database.clone();
    }
    if let Some(table) = &args.table {
        config.table = table.clone();
    }
    if let Some(dir) = &args.dir {
        config.migrations_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn open_migrator(config: &MigratorConfig) -> Result<Migrator<SqliteAdapter>> {
    let adapter = SqliteAdapter::open(&config.database, &config.table)
        .with_context(|| format!("failed to open {}", config.database.display()))?;

    let migrations = load_migrations(&config.migrations_dir).with_context(|| {
        format!(
            "failed to load migrations from {}",
            config.migrations_dir.display()
        )
    })?;
    info!(
        "found {} migrations in {}",
        migrations.len(),
        config.migrations_dir.display()
    );

    let mut migrator = Migrator::new(adapter);
    migrator.register(migrations)?;
    migrator.subscribe(|event| println!("{}", report::event_line(event)));
    Ok(migrator)
}

pub fn migrate(config: &MigratorConfig) -> Result<()> {
    let mut migrator = open_migrator(config)?;
    let version = migrator.migrate().context("migration failed")?;
    println!("database at version {version}");
    Ok(())
}

pub fn rollback(config: &MigratorConfig, target: &RollbackTarget) -> Result<()> {
    let mut migrator = open_migrator(config)?;

    match (&target.to_name, target.to_version) {
        (Some(name), _) => migrator
            .roll_back_to_name(name)
            .with_context(|| format!("rollback to {name} failed"))?,
        (None, Some(version)) => migrator
            .roll_back_to_version(version)
            .with_context(|| format!("rollback to version {version} failed"))?,
        (None, None) => anyhow::bail!("either --to-version or --to-name is required"),
    }

    println!("database at version {}", migrator.current_version()?);
    Ok(())
}

pub fn status(config: &MigratorConfig, json: bool) -> Result<()> {
    let mut migrator = open_migrator(config)?;
    let entries = migrator.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{}", report::status_line(entry));
        }
    }
    Ok(())
}
