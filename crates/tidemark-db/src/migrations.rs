use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, reversible change to the store.
///
/// The name is the only identity a migration has: it decides the order in
/// which pending migrations are applied and is what the bookkeeping table
/// records. `up` is executed to apply the change, `down` to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    name: String,
    up: String,
    down: String,
}

impl Migration {
    pub fn new(name: impl Into<String>, up: impl Into<String>, down: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            up: up.into(),
            down: down.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn up(&self) -> &str {
        &self.up
    }

    pub fn down(&self) -> &str {
        &self.down
    }
}

/// One row of the bookkeeping table.
///
/// `version` is the store version right after this migration was applied, so
/// the Nth applied migration carries version N.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub name: String,
    pub version: u32,
    pub applied_at: DateTime<Utc>,
}

/// Reconciliation of one migration between the registered set and the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MigrationStatus {
    Pending {
        name: String,
    },
    Applied {
        name: String,
        version: u32,
        applied_at: DateTime<Utc>,
    },
    /// Recorded in the store but not registered; it cannot be rolled back.
    Unknown {
        name: String,
        version: u32,
        applied_at: DateTime<Utc>,
    },
}

impl MigrationStatus {
    pub fn name(&self) -> &str {
        match self {
            Self::Pending { name } | Self::Applied { name, .. } | Self::Unknown { name, .. } => {
                name
            }
        }
    }

    pub fn version(&self) -> Option<u32> {
        match self {
            Self::Pending { .. } => None,
            Self::Applied { version, .. } | Self::Unknown { version, .. } => Some(*version),
        }
    }
}
