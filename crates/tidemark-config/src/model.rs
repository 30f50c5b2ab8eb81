use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tidemark_common::Result;
use tidemark_common::validation::{Validation, identifier, non_empty};

pub const DEFAULT_DATABASE: &str = "tidemark.db";
pub const DEFAULT_TABLE: &str = "_migrations";
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Where the store lives, which bookkeeping table to use and where migration
/// files are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigratorConfig {
    pub database: PathBuf,
    pub table: String,
    pub migrations_dir: PathBuf,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            table: DEFAULT_TABLE.to_string(),
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
        }
    }
}

impl MigratorConfig {
    /// Check every field and report all failures at once.
    pub fn validate(&self) -> Result<()> {
        Validation::new("config")
            .check("database", non_empty(&self.database.to_string_lossy()))
            .check("table", identifier(&self.table))
            .check(
                "migrations_dir",
                non_empty(&self.migrations_dir.to_string_lossy()),
            )
            .finish()
    }
}
