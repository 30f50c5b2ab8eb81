use std::collections::HashSet;

use chrono::Utc;
use tidemark_common::{Error, Result};
use tracing::{debug, warn};

use crate::adapter::MigrationAdapter;
use crate::migrations::AppliedMigration;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    table_exists: bool,
    records: Vec<AppliedMigration>,
}

/// In-process store with transactional bookkeeping.
///
/// `begin` copies the committed state into a working copy and `commit`
/// publishes it. A working copy that was never committed is thrown away by
/// the next `begin` or by any read outside a transaction. Statements are not
/// interpreted: each one is appended to [`executed`](Self::executed), and
/// statements registered with [`fail_on`](Self::fail_on) return an error.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    committed: MemoryState,
    working: Option<MemoryState>,
    executed: Vec<String>,
    failing: HashSet<String>,
    commits: usize,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `statement` fail whenever it is executed.
    pub fn fail_on(&mut self, statement: impl Into<String>) {
        self.failing.insert(statement.into());
    }

    /// Every statement executed so far, including those of batches that were
    /// never committed.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Number of successful commits.
    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn in_transaction(&self) -> bool {
        self.working.is_some()
    }

    /// Whether the bookkeeping table exists in the committed state.
    pub fn has_migrations_table(&self) -> bool {
        self.committed.table_exists
    }

    fn discard_open_transaction(&mut self) {
        if self.working.take().is_some() {
            warn!("discarding uncommitted migration transaction");
        }
    }

    fn working(&mut self) -> Result<&mut MemoryState> {
        self.working
            .as_mut()
            .ok_or_else(|| Error::Database("no active transaction".into()))
    }
}

impl MigrationAdapter for MemoryAdapter {
    fn create_migrations_table(&mut self) -> Result<()> {
        self.discard_open_transaction();
        self.committed.table_exists = true;
        Ok(())
    }

    fn drop_migrations_table(&mut self) -> Result<()> {
        let state = self.working()?;
        state.table_exists = false;
        state.records.clear();
        Ok(())
    }

    fn applied_migrations(&mut self) -> Result<Vec<AppliedMigration>> {
        self.discard_open_transaction();
        let mut records = self.committed.records.clone();
        records.sort_by_key(|r| r.version);
        Ok(records)
    }

    fn record_applied(&mut self, name: &str, version: u32) -> Result<()> {
        let state = self.working()?;
        if !state.table_exists {
            return Err(Error::Database("no such table: migrations".into()));
        }
        if state.records.iter().any(|r| r.name == name) {
            return Err(Error::Database(format!(
                "migration {name} is already recorded"
            )));
        }
        state.records.push(AppliedMigration {
            name: name.to_string(),
            version,
            applied_at: Utc::now(),
        });
        Ok(())
    }

    fn remove_applied(&mut self, name: &str) -> Result<()> {
        let state = self.working()?;
        state.records.retain(|r| r.name != name);
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.discard_open_transaction();
        self.working = Some(self.committed.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let state = self
            .working
            .take()
            .ok_or_else(|| Error::Database("commit without an active transaction".into()))?;
        self.committed = state;
        self.commits += 1;
        debug!("committed {} migration records", self.committed.records.len());
        Ok(())
    }

    fn execute(&mut self, statement: &str) -> Result<()> {
        self.working()?;
        self.executed.push(statement.to_string());
        if self.failing.contains(statement) {
            return Err(Error::Database(format!("statement failed: {statement}")));
        }
        Ok(())
    }
}
