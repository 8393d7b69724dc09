//! SQLite repositories over the rewards tables.
//!
//! Repositories borrow a connection (or a transaction, which derefs to one) and
//! never open transactions themselves; services own the unit of work.
//! Read paths reject invalid persisted values instead of masking them.

mod chore_entry_repo;
mod chore_repo;
mod ledger_repo;
mod pocket_money_repo;
mod reminder_repo;

use std::str::FromStr;

use kidledger_domain::{Money, UnknownVariant};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

pub use chore_entry_repo::SqliteChoreEntryRepository;
pub use chore_repo::SqliteChoreRepository;
pub use ledger_repo::SqliteLedgerRepository;
pub use pocket_money_repo::SqlitePocketMoneyRuleRepository;
pub use reminder_repo::SqliteReminderRepository;

fn conversion_error(
    row: &Row<'_>,
    column: &str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    let index = row.as_ref().column_index(column).unwrap_or_default();
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

pub(crate) fn uuid_col(row: &Row<'_>, column: &str) -> rusqlite::Result<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|err| conversion_error(row, column, err))
}

pub(crate) fn opt_uuid_col(row: &Row<'_>, column: &str) -> rusqlite::Result<Option<Uuid>> {
    let text: Option<String> = row.get(column)?;
    text.map(|text| Uuid::parse_str(&text).map_err(|err| conversion_error(row, column, err)))
        .transpose()
}

pub(crate) fn label_col<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    let text: String = row.get(column)?;
    text.parse().map_err(|err| conversion_error(row, column, err))
}

pub(crate) fn money_col(row: &Row<'_>, column: &str) -> rusqlite::Result<Money> {
    row.get::<_, i64>(column).map(Money::from_cents)
}
