//! SQLite storage bootstrap, schema migrations and transaction helpers.
//!
//! Migration version is tracked via `PRAGMA user_version`. Services must not
//! touch application data before migrations succeed.

pub mod migrations;
mod open;

use rusqlite::{Connection, Transaction, TransactionBehavior};

pub use open::{open_db, open_db_in_memory};

/// Starts a write transaction that takes the database lock up front.
///
/// Check-then-insert sequences run inside one of these so concurrent
/// invocations serialize instead of interleaving.
pub fn immediate(conn: &mut Connection) -> rusqlite::Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
}
