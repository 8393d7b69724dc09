use kidledger_core::db::migrations::{current_user_version, latest_version};
use kidledger_core::{open_db, open_db_in_memory, CoreError};
use tempfile::TempDir;

#[test]
fn fresh_database_is_at_latest_version() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());

    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn reopening_a_file_database_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kidledger.db");

    drop(open_db(&path).unwrap());
    let conn = open_db(&path).unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
}

#[test]
fn newer_schema_is_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kidledger.db");
    {
        let conn = open_db(&path).unwrap();
        conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version() + 1))
            .unwrap();
    }

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedSchemaVersion { .. }));
}
