pub mod adapter;
pub mod events;
pub mod loader;
pub mod memory;
pub mod migrations;
pub mod migrator;
pub mod sqlite;

pub use adapter::MigrationAdapter;
pub use events::{EventDispatcher, MigrationEvent};
pub use loader::load_migrations;
pub use memory::MemoryAdapter;
pub use migrations::{AppliedMigration, Migration, MigrationStatus};
pub use migrator::Migrator;
pub use sqlite::SqliteAdapter;
