use std::path::Path;
use std::time::{Duration, Instant};

use rusqlite::Connection;
use tracing::{error, info};

use super::migrations::apply_migrations;
use crate::CoreResult;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file and applies all pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> CoreResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    let mut conn = Connection::open(path).inspect_err(|err| {
        error!(path = %path.display(), %err, "failed to open database");
    })?;
    bootstrap_connection(&mut conn)?;
    info!(
        path = %path.display(),
        duration_ms = started_at.elapsed().as_millis() as u64,
        "database ready"
    );
    Ok(conn)
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> CoreResult<Connection> {
    let mut conn = Connection::open_in_memory()?;
    bootstrap_connection(&mut conn)?;
    Ok(conn)
}

fn bootstrap_connection(conn: &mut Connection) -> CoreResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}
