use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tidemark_common::validation::identifier;
use tidemark_common::{Error, Result};
use tracing::{debug, info, warn};

use crate::adapter::MigrationAdapter;
use crate::migrations::AppliedMigration;

/// SQLite-backed store for migrations and their bookkeeping table.
///
/// Transactions are plain `BEGIN` / `COMMIT`. A transaction left open by a
/// failed batch is rolled back before the next table creation, read or
/// `begin`, and when the adapter is dropped.
///
/// The connection is used as opened: no pragmas are set, so reverse
/// statements see the database's own foreign key setting.
pub struct SqliteAdapter {
    conn: Connection,
    table: String,
}

impl SqliteAdapter {
    pub fn open(db_path: &Path, table: &str) -> Result<Self> {
        info!("opening migration store at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;
        Self::with_connection(conn, table)
    }

    pub fn in_memory(table: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;
        Self::with_connection(conn, table)
    }

    pub fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        validate_table_name(table)?;

        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The bookkeeping table name, quoted for interpolation into SQL.
    fn quoted_table(&self) -> String {
        format!("\"{}\"", self.table)
    }

    /// Whether `name` exists as a table, ignoring any uncommitted batch.
    pub fn table_exists(&mut self, name: &str) -> Result<bool> {
        self.discard_open_transaction()?;
        self.has_table(name)
    }

    fn has_table(&self, name: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                params![name],
                |row| row.get(0),
            )
            .map_err(|e| Error::Database(format!("failed to inspect schema: {e}")))?;
        Ok(count > 0)
    }

    fn discard_open_transaction(&mut self) -> Result<()> {
        if !self.conn.is_autocommit() {
            warn!("rolling back uncommitted migration transaction");
            self.conn
                .execute_batch("ROLLBACK")
                .map_err(|e| Error::Database(format!("failed to roll back: {e}")))?;
        }
        Ok(())
    }

    fn ensure_transaction(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            return Err(Error::Database("no active transaction".into()));
        }
        Ok(())
    }
}

impl MigrationAdapter for SqliteAdapter {
    fn create_migrations_table(&mut self) -> Result<()> {
        self.discard_open_transaction()?;
        self.conn
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    name TEXT PRIMARY KEY,
                    version INTEGER NOT NULL,
                    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
                );",
                self.quoted_table()
            ))
            .map_err(|e| Error::Database(format!("failed to create migrations table: {e}")))?;
        Ok(())
    }

    fn drop_migrations_table(&mut self) -> Result<()> {
        self.ensure_transaction()?;
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {};", self.quoted_table()))
            .map_err(|e| Error::Database(format!("failed to drop migrations table: {e}")))?;
        Ok(())
    }

    fn applied_migrations(&mut self) -> Result<Vec<AppliedMigration>> {
        self.discard_open_transaction()?;
        if !self.has_table(&self.table)? {
            debug!("migrations table {} does not exist yet", self.table);
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT name, version, applied_at FROM {} ORDER BY version ASC",
                self.quoted_table()
            ))
            .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| Error::Database(format!("failed to query migrations: {e}")))?;

        let mut applied = Vec::new();
        for row in rows {
            let (name, version, applied_at) =
                row.map_err(|e| Error::Database(format!("failed to read migration row: {e}")))?;
            let applied_at = parse_datetime(&applied_at).ok_or_else(|| {
                Error::Database(format!(
                    "migration {name} has an unreadable applied_at: {applied_at}"
                ))
            })?;
            applied.push(AppliedMigration {
                name,
                version,
                applied_at,
            });
        }
        Ok(applied)
    }

    fn record_applied(&mut self, name: &str, version: u32) -> Result<()> {
        self.ensure_transaction()?;
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (name, version) VALUES (?1, ?2)",
                    self.quoted_table()
                ),
                params![name, version],
            )
            .map_err(|e| Error::Database(format!("failed to record migration {name}: {e}")))?;
        Ok(())
    }

    fn remove_applied(&mut self, name: &str) -> Result<()> {
        self.ensure_transaction()?;
        self.conn
            .execute(
                &format!("DELETE FROM {} WHERE name = ?1", self.quoted_table()),
                params![name],
            )
            .map_err(|e| Error::Database(format!("failed to remove migration {name}: {e}")))?;
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.discard_open_transaction()?;
        self.conn
            .execute_batch("BEGIN")
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.ensure_transaction()?;
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| Error::Database(format!("failed to commit transaction: {e}")))?;
        Ok(())
    }

    fn execute(&mut self, statement: &str) -> Result<()> {
        self.ensure_transaction()?;
        self.conn
            .execute_batch(statement)
            .map_err(|e| Error::Database(format!("statement failed: {e}")))?;
        Ok(())
    }
}

impl Drop for SqliteAdapter {
    fn drop(&mut self) {
        if let Err(e) = self.discard_open_transaction() {
            warn!("failed to discard open transaction on close: {e}");
        }
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_table_name(name: &str) -> Result<()> {
    identifier(name)
        .map_err(|reason| Error::Config(format!("invalid migrations table name {name:?}: {reason}")))
}

/// Accepts RFC 3339 and SQLite's `datetime('now')` format.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
