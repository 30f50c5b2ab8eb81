use std::sync::{Arc, Mutex};

use tidemark_common::Error;
use tidemark_db::{
    MemoryAdapter, Migration, MigrationAdapter, MigrationEvent, Migrator, SqliteAdapter,
    load_migrations,
};

/// Three migrations that depend on each other's schema.
fn schema_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            "001_users",
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT NOT NULL);",
            "DROP TABLE users;",
        ),
        Migration::new(
            "002_posts",
            "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id));",
            "DROP TABLE posts;",
        ),
        Migration::new(
            "003_post_index",
            "CREATE INDEX idx_posts_user ON posts(user_id);",
            "DROP INDEX idx_posts_user;",
        ),
    ]
}

fn sqlite_migrator() -> Migrator<SqliteAdapter> {
    let mut migrator = Migrator::new(SqliteAdapter::in_memory("_migrations").unwrap());
    migrator.register(schema_migrations()).unwrap();
    migrator
}

fn applied(migrator: &mut Migrator<SqliteAdapter>) -> Vec<(String, u32)> {
    migrator
        .adapter_mut()
        .applied_migrations()
        .unwrap()
        .into_iter()
        .map(|a| (a.name, a.version))
        .collect()
}

#[test]
fn migrate_from_empty_store_applies_everything() {
    let mut migrator = sqlite_migrator();

    assert_eq!(migrator.migrate().unwrap(), 3);
    assert_eq!(
        applied(&mut migrator),
        vec![
            ("001_users".to_string(), 1),
            ("002_posts".to_string(), 2),
            ("003_post_index".to_string(), 3),
        ]
    );
    assert!(migrator.adapter_mut().table_exists("users").unwrap());
    assert!(migrator.adapter_mut().table_exists("posts").unwrap());
}

#[test]
fn second_migrate_returns_same_version() {
    let mut migrator = sqlite_migrator();
    assert_eq!(migrator.migrate().unwrap(), 3);
    assert_eq!(migrator.migrate().unwrap(), 3);
    assert_eq!(applied(&mut migrator).len(), 3);
}

#[test]
fn registration_order_does_not_matter() {
    let mut reversed = Migrator::new(SqliteAdapter::in_memory("_migrations").unwrap());
    let mut migrations = schema_migrations();
    migrations.reverse();
    reversed.register(migrations).unwrap();

    let mut ordered = sqlite_migrator();

    assert_eq!(reversed.migrate().unwrap(), 3);
    assert_eq!(ordered.migrate().unwrap(), 3);
    assert_eq!(applied(&mut reversed), applied(&mut ordered));
}

#[test]
fn roll_back_to_version_one_keeps_only_the_first() {
    let mut migrator = sqlite_migrator();
    migrator.migrate().unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    {
        let events = Arc::clone(&events);
        migrator.subscribe(move |event| events.lock().unwrap().push(event.clone()));
    }

    migrator.roll_back_to_version(1).unwrap();

    assert_eq!(applied(&mut migrator), vec![("001_users".to_string(), 1)]);
    assert_eq!(
        *events.lock().unwrap(),
        vec![
            MigrationEvent::RolledBack {
                name: "003_post_index".into()
            },
            MigrationEvent::RolledBack {
                name: "002_posts".into()
            },
        ]
    );
    assert!(migrator.adapter_mut().table_exists("users").unwrap());
    assert!(!migrator.adapter_mut().table_exists("posts").unwrap());
}

#[test]
fn roll_back_to_zero_removes_the_bookkeeping_table() {
    let mut migrator = sqlite_migrator();
    migrator.migrate().unwrap();

    migrator.roll_back_to_version(0).unwrap();

    assert!(!migrator.adapter_mut().table_exists("_migrations").unwrap());
    assert!(!migrator.adapter_mut().table_exists("users").unwrap());
    assert_eq!(migrator.current_version().unwrap(), 0);

    // The store can be migrated again from scratch.
    assert_eq!(migrator.migrate().unwrap(), 3);
}

#[test]
fn roll_back_to_unapplied_name_leaves_store_untouched() {
    let mut migrator = sqlite_migrator();
    migrator.migrate().unwrap();

    let err = migrator.roll_back_to_name("999_never").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(applied(&mut migrator).len(), 3);
    assert!(migrator.adapter_mut().table_exists("posts").unwrap());
}

#[test]
fn roll_back_to_name_resolves_its_version() {
    let mut migrator = sqlite_migrator();
    migrator.migrate().unwrap();

    migrator.roll_back_to_name("002_posts").unwrap();

    assert_eq!(
        applied(&mut migrator),
        vec![("001_users".to_string(), 1), ("002_posts".to_string(), 2)]
    );
}

#[test]
fn failure_in_the_middle_applies_nothing() {
    let mut migrator = Migrator::new(SqliteAdapter::in_memory("_migrations").unwrap());
    migrator
        .register([
            Migration::new("001_users", "CREATE TABLE users (id INTEGER);", "DROP TABLE users;"),
            Migration::new("002_broken", "CREATE TABLE (", "SELECT 1;"),
            Migration::new("003_posts", "CREATE TABLE posts (id INTEGER);", "DROP TABLE posts;"),
        ])
        .unwrap();

    let err = migrator.migrate().unwrap_err();
    assert!(matches!(err, Error::Database(_)));

    assert!(applied(&mut migrator).is_empty());
    assert!(!migrator.adapter_mut().table_exists("users").unwrap());
    assert!(!migrator.adapter_mut().table_exists("posts").unwrap());
}

#[test]
fn failure_in_the_middle_applies_nothing_in_memory() {
    let mut migrator = Migrator::new(MemoryAdapter::new());
    migrator.register(schema_migrations()).unwrap();
    migrator
        .adapter_mut()
        .fail_on("CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id));");

    assert!(migrator.migrate().is_err());
    assert_eq!(migrator.current_version().unwrap(), 0);

    let status = migrator.status().unwrap();
    assert!(status.iter().all(|s| s.version().is_none()));
}

#[test]
fn state_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("app.db");

    {
        let mut migrator = Migrator::new(SqliteAdapter::open(&db_path, "schema_log").unwrap());
        migrator.register(schema_migrations()).unwrap();
        assert_eq!(migrator.migrate().unwrap(), 3);
    }

    let mut migrator = Migrator::new(SqliteAdapter::open(&db_path, "schema_log").unwrap());
    migrator.register(schema_migrations()).unwrap();
    assert_eq!(migrator.current_version().unwrap(), 3);
    assert_eq!(migrator.migrate().unwrap(), 3);
}

#[test]
fn migrations_loaded_from_disk_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("001_users.up.sql"),
        "CREATE TABLE users (id INTEGER PRIMARY KEY);",
    )
    .unwrap();
    std::fs::write(dir.path().join("001_users.down.sql"), "DROP TABLE users;").unwrap();

    let mut migrator = Migrator::new(SqliteAdapter::in_memory("_migrations").unwrap());
    migrator.register(load_migrations(dir.path()).unwrap()).unwrap();

    assert_eq!(migrator.migrate().unwrap(), 1);
    assert!(migrator.adapter_mut().table_exists("users").unwrap());
}
