use std::collections::{HashMap, HashSet};

use tidemark_common::{Error, Result};
use tracing::{debug, info, warn};

use crate::adapter::MigrationAdapter;
use crate::events::{EventDispatcher, MigrationEvent};
use crate::migrations::{AppliedMigration, Migration, MigrationStatus};

/// Applies registered migrations to a store and rolls them back.
///
/// Migrations are applied in ascending name order regardless of the order
/// they were registered in. Each applied migration gets the next version
/// number, so after `migrate` the store version equals the number of applied
/// migrations. Every `migrate` / rollback call runs as a single transaction:
/// either every step of the batch is committed or none is.
pub struct Migrator<A> {
    adapter: A,
    migrations: Vec<Migration>,
    events: EventDispatcher,
}

impl<A: MigrationAdapter> Migrator<A> {
    pub fn new(adapter: A) -> Self {
        Self {
            adapter,
            migrations: Vec::new(),
            events: EventDispatcher::new(),
        }
    }

    /// Register migrations. Names must be unique across everything registered
    /// so far; on a duplicate nothing from this call is registered.
    pub fn register<I>(&mut self, migrations: I) -> Result<()>
    where
        I: IntoIterator<Item = Migration>,
    {
        let incoming: Vec<Migration> = migrations.into_iter().collect();

        {
            let mut names: HashSet<&str> = self.migrations.iter().map(Migration::name).collect();
            for migration in &incoming {
                if !names.insert(migration.name()) {
                    return Err(Error::DuplicateMigration(migration.name().to_string()));
                }
            }
        }

        self.migrations.extend(incoming);
        self.migrations.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(())
    }

    /// Add a subscriber for applied / rolled-back events.
    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&MigrationEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler);
    }

    /// Registered migrations in the order they are applied.
    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Apply every pending migration and return the resulting store version.
    pub fn migrate(&mut self) -> Result<u32> {
        self.adapter.create_migrations_table()?;
        let applied = self.adapter.applied_migrations()?;
        let applied_names: HashSet<&str> = applied.iter().map(|a| a.name.as_str()).collect();

        let mut version = applied.len() as u32;

        self.adapter.begin()?;

        for migration in &self.migrations {
            let name = migration.name();
            if applied_names.contains(name) {
                debug!("migration {name} already applied, skipping");
                continue;
            }

            version += 1;

            self.adapter
                .execute(migration.up())
                .inspect_err(|e| warn!("migration {name} failed: {e}"))?;

            self.events.dispatch(&MigrationEvent::Applied {
                name: name.to_string(),
                version,
            });

            self.adapter.record_applied(name, version)?;
            info!("applied migration {name} (version {version})");
        }

        self.adapter.commit()?;
        Ok(version)
    }

    /// Undo every applied migration with a version above `target`, most
    /// recent first. A target of 0 also drops the bookkeeping table.
    ///
    /// Every migration to undo must still be registered; otherwise the call
    /// fails with [`Error::UnknownMigration`] before anything is executed.
    pub fn roll_back_to_version(&mut self, target: u32) -> Result<()> {
        let mut applied = self.adapter.applied_migrations()?;
        applied.sort_by(|a, b| b.version.cmp(&a.version));

        let by_name: HashMap<&str, &Migration> = self
            .migrations
            .iter()
            .map(|m| (m.name(), m))
            .collect();

        let mut plan = Vec::new();
        for record in applied.iter().filter(|r| r.version > target) {
            let migration = by_name
                .get(record.name.as_str())
                .ok_or_else(|| Error::UnknownMigration(record.name.clone()))?;
            plan.push(*migration);
        }

        self.adapter.begin()?;

        for migration in plan {
            let name = migration.name();

            self.adapter
                .execute(migration.down())
                .inspect_err(|e| warn!("rollback of {name} failed: {e}"))?;

            self.events.dispatch(&MigrationEvent::RolledBack {
                name: name.to_string(),
            });

            self.adapter.remove_applied(name)?;
            info!("rolled back migration {name}");
        }

        if target == 0 {
            self.adapter.drop_migrations_table()?;
            debug!("dropped bookkeeping table");
        }

        self.adapter.commit()
    }

    /// Roll back to the version at which `name` was applied, keeping `name`
    /// itself applied.
    pub fn roll_back_to_name(&mut self, name: &str) -> Result<()> {
        let applied = self.adapter.applied_migrations()?;
        let record = applied
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::NotFound(format!("migration {name} is not applied")))?;

        self.roll_back_to_version(record.version)
    }

    /// Number of migrations currently applied.
    pub fn current_version(&mut self) -> Result<u32> {
        Ok(self.adapter.applied_migrations()?.len() as u32)
    }

    /// Registered migrations in apply order, each marked pending or applied,
    /// followed by applied records that are no longer registered.
    pub fn status(&mut self) -> Result<Vec<MigrationStatus>> {
        let applied = self.adapter.applied_migrations()?;
        let mut by_name: HashMap<&str, &AppliedMigration> =
            applied.iter().map(|a| (a.name.as_str(), a)).collect();

        let mut report: Vec<MigrationStatus> = self
            .migrations
            .iter()
            .map(|m| match by_name.remove(m.name()) {
                Some(record) => MigrationStatus::Applied {
                    name: record.name.clone(),
                    version: record.version,
                    applied_at: record.applied_at,
                },
                None => MigrationStatus::Pending {
                    name: m.name().to_string(),
                },
            })
            .collect();

        let mut unknown: Vec<&AppliedMigration> = by_name.into_values().collect();
        unknown.sort_by_key(|a| a.version);
        report.extend(unknown.into_iter().map(|a| MigrationStatus::Unknown {
            name: a.name.clone(),
            version: a.version,
            applied_at: a.applied_at,
        }));

        Ok(report)
    }
}
