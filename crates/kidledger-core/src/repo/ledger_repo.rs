use chrono::{DateTime, NaiveDate, Utc};
use kidledger_domain::{KidId, LedgerEntry, Money, SourceRef};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{label_col, money_col, opt_uuid_col, uuid_col};
use crate::{CoreError, CoreResult};

const LEDGER_SELECT_SQL: &str = "SELECT
    id,
    kid_id,
    entry_type,
    amount_cents,
    entry_date,
    notes,
    created_by,
    source_type,
    source_id,
    is_deleted,
    created_at,
    updated_at
FROM ledger_entries";

/// Ledger entries keyed by kid, with the source uniqueness rule enforced by SQLite.
pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts an entry. A second live posting for the same source and day
    /// surfaces as [`CoreError::DuplicatePosting`].
    pub fn insert(&self, entry: &LedgerEntry) -> CoreResult<()> {
        let result = self.conn.execute(
            "INSERT INTO ledger_entries (
                id, kid_id, entry_type, amount_cents, entry_date, notes, created_by,
                source_type, source_id, is_deleted, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                entry.id.to_string(),
                entry.kid_id.to_string(),
                entry.entry_type.as_str(),
                entry.amount.cents(),
                entry.entry_date,
                entry.notes,
                entry.created_by.to_string(),
                entry.source.map(|source| source.source_type.as_str()),
                entry.source.map(|source| source.source_id.to_string()),
                entry.is_deleted,
                entry.created_at,
                entry.updated_at,
            ],
        );
        match (result, entry.source) {
            (Ok(_), _) => Ok(()),
            (Err(rusqlite::Error::SqliteFailure(err, _)), Some(source))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(CoreError::DuplicatePosting {
                    kid_id: entry.kid_id,
                    source_type: source.source_type,
                    source_id: source.source_id,
                    entry_date: entry.entry_date,
                })
            }
            (Err(err), _) => Err(err.into()),
        }
    }

    pub fn get(&self, id: Uuid) -> CoreResult<Option<LedgerEntry>> {
        let sql = format!("{LEDGER_SELECT_SQL} WHERE id = ?1");
        let entry = self
            .conn
            .query_row(&sql, [id.to_string()], map_ledger_row)
            .optional()?;
        Ok(entry)
    }

    /// The live entry a source produced on one date, if any.
    pub fn find_active_by_source(
        &self,
        kid_id: KidId,
        source: SourceRef,
        entry_date: NaiveDate,
    ) -> CoreResult<Option<LedgerEntry>> {
        let sql = format!(
            "{LEDGER_SELECT_SQL}
             WHERE kid_id = ?1 AND source_type = ?2 AND source_id = ?3
               AND entry_date = ?4 AND is_deleted = 0"
        );
        let entry = self
            .conn
            .query_row(
                &sql,
                params![
                    kid_id.to_string(),
                    source.source_type.as_str(),
                    source.source_id.to_string(),
                    entry_date
                ],
                map_ledger_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Every live entry a source produced, on any date.
    pub fn find_active_for_source(
        &self,
        kid_id: KidId,
        source: SourceRef,
    ) -> CoreResult<Vec<LedgerEntry>> {
        let sql = format!(
            "{LEDGER_SELECT_SQL}
             WHERE kid_id = ?1 AND source_type = ?2 AND source_id = ?3 AND is_deleted = 0
             ORDER BY entry_date ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                kid_id.to_string(),
                source.source_type.as_str(),
                source.source_id.to_string()
            ],
            map_ledger_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Rewrites the mutable columns of an entry.
    pub fn update(&self, entry: &LedgerEntry) -> CoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE ledger_entries
             SET amount_cents = ?2, entry_date = ?3, notes = ?4, updated_at = ?5
             WHERE id = ?1 AND is_deleted = 0",
            params![
                entry.id.to_string(),
                entry.amount.cents(),
                entry.entry_date,
                entry.notes,
                entry.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::LedgerEntryNotFound(entry.id));
        }
        Ok(())
    }

    /// Marks an entry deleted. Returns false if it was already deleted.
    pub fn soft_delete(&self, id: Uuid, now: DateTime<Utc>) -> CoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE ledger_entries SET is_deleted = 1, updated_at = ?2
             WHERE id = ?1 AND is_deleted = 0",
            params![id.to_string(), now],
        )?;
        Ok(changed > 0)
    }

    /// Sum of live entries for a kid.
    pub fn balance(&self, kid_id: KidId) -> CoreResult<Money> {
        let cents: i64 = self.conn.query_row(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM ledger_entries
             WHERE kid_id = ?1 AND is_deleted = 0",
            [kid_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(Money::from_cents(cents))
    }

    /// Live entries for a kid in an inclusive date range, oldest first.
    pub fn list(
        &self,
        kid_id: KidId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> CoreResult<Vec<LedgerEntry>> {
        let sql = format!(
            "{LEDGER_SELECT_SQL}
             WHERE kid_id = ?1 AND is_deleted = 0
               AND (?2 IS NULL OR entry_date >= ?2)
               AND (?3 IS NULL OR entry_date <= ?3)
             ORDER BY entry_date ASC, created_at ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![kid_id.to_string(), from, to], map_ledger_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn map_ledger_row(row: &Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let source_type: Option<String> = row.get("source_type")?;
    let source = match (source_type, opt_uuid_col(row, "source_id")?) {
        (Some(_), Some(source_id)) => Some(SourceRef {
            source_type: label_col(row, "source_type")?,
            source_id,
        }),
        _ => None,
    };
    Ok(LedgerEntry {
        id: uuid_col(row, "id")?,
        kid_id: uuid_col(row, "kid_id")?,
        entry_type: label_col(row, "entry_type")?,
        amount: money_col(row, "amount_cents")?,
        entry_date: row.get("entry_date")?,
        notes: row.get("notes")?,
        created_by: uuid_col(row, "created_by")?,
        source,
        is_deleted: row.get("is_deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
