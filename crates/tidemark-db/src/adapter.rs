use tidemark_common::Result;

use crate::migrations::AppliedMigration;

/// Persistence capabilities the [`Migrator`](crate::Migrator) needs from a store.
///
/// The migrator brackets every batch with [`begin`](Self::begin) and
/// [`commit`](Self::commit) and never aborts explicitly: if a statement fails
/// it simply returns without committing. Implementations must make sure the
/// effects of an uncommitted transaction never persist.
///
/// Concurrent migrators against the same store are not coordinated; callers
/// serialize them.
pub trait MigrationAdapter {
    /// Create the bookkeeping table. Must succeed when it already exists.
    fn create_migrations_table(&mut self) -> Result<()>;

    fn drop_migrations_table(&mut self) -> Result<()>;

    /// All applied records, ordered by version ascending. Empty when the
    /// bookkeeping table does not exist.
    fn applied_migrations(&mut self) -> Result<Vec<AppliedMigration>>;

    fn record_applied(&mut self, name: &str, version: u32) -> Result<()>;

    fn remove_applied(&mut self, name: &str) -> Result<()>;

    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    /// Run a forward or reverse statement inside the active transaction.
    fn execute(&mut self, statement: &str) -> Result<()>;
}
