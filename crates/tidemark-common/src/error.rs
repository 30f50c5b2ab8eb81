use thiserror::Error;

use crate::validation::FieldError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),

    /// An applied record names a migration that is no longer registered, so
    /// its reverse statement is unknown.
    #[error("unknown migration: {0} is applied but not registered")]
    UnknownMigration(String),

    #[error("duplicate migration: {0} is registered more than once")]
    DuplicateMigration(String),

    /// Every field check that failed for `resource`.
    #[error("validation failed for {resource}: {}", join_field_errors(.errors))]
    Validation {
        resource: String,
        errors: Vec<FieldError>,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn error_display_includes_context() {
        let e = Error::Config("bad yaml".into());
        assert_eq!(e.to_string(), "configuration error: bad yaml");

        let e = Error::Database("disk full".into());
        assert_eq!(e.to_string(), "database error: disk full");

        let e = Error::NotFound("migration 003_users".into());
        assert_eq!(e.to_string(), "not found: migration 003_users");

        let e = Error::Migration("missing 001_init.down.sql".into());
        assert_eq!(e.to_string(), "migration error: missing 001_init.down.sql");
    }

    #[test]
    fn engine_errors_name_the_migration() {
        let e = Error::UnknownMigration("002_posts".into());
        assert_eq!(
            e.to_string(),
            "unknown migration: 002_posts is applied but not registered"
        );

        let e = Error::DuplicateMigration("001_init".into());
        assert_eq!(
            e.to_string(),
            "duplicate migration: 001_init is registered more than once"
        );
    }
}
