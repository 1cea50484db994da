use rusqlite::Connection;
use securepass_core::db::migrations::latest_version;
use securepass_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().expect("in-memory db should open");

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "credentials");
    assert_index_exists(&conn, "idx_credentials_owner_created");
}

#[test]
fn reopening_credential_store_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("securepass.db");

    let conn_first = open_db(&path).expect("db should open");
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).expect("db should open");
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "credentials");
}

#[test]
fn partially_migrated_store_is_upgraded() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("v1.db");

    let conn = Connection::open(&path).expect("raw connection should open");
    conn.execute_batch(
        "CREATE TABLE credentials (
            id TEXT PRIMARY KEY NOT NULL,
            owner_id TEXT NOT NULL,
            site_name TEXT NOT NULL,
            site_url TEXT,
            login_name TEXT NOT NULL,
            login_email TEXT,
            secret_value TEXT NOT NULL,
            note TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        PRAGMA user_version = 1;",
    )
    .expect("v1 schema should apply");
    drop(conn);

    let conn = open_db(&path).expect("db should open");
    assert_eq!(schema_version(&conn), latest_version());
    assert_index_exists(&conn, "idx_credentials_owner_created");
}

#[test]
fn store_with_newer_schema_version_is_refused() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).expect("raw connection should open");
    conn.execute_batch("PRAGMA user_version = 999;").expect("pragma should apply");
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_rejects_blank_required_columns() {
    let conn = open_db_in_memory().expect("in-memory db should open");

    let result = conn.execute(
        "INSERT INTO credentials (
            id, owner_id, site_name, login_name, secret_value, created_at, updated_at
        ) VALUES ('a', 'b', '  ', 'bob', 'x', 1, 1);",
        [],
    );
    assert!(result.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .expect("user_version should be readable")
}

fn assert_table_exists(conn: &Connection, name: &str) {
    assert_schema_object(conn, "table", name);
}

fn assert_index_exists(conn: &Connection, name: &str) {
    assert_schema_object(conn, "index", name);
}

fn assert_schema_object(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .expect("sqlite_master query should succeed");
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
