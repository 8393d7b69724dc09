use chrono::NaiveDate;
use kidledger_domain::{ChoreEntry, ChoreEntryAudit, KidId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{label_col, money_col, opt_uuid_col, uuid_col};
use crate::{CoreError, CoreResult};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    kid_id,
    chore_id,
    entry_date,
    status,
    chore_type,
    amount_cents,
    notes,
    is_deleted,
    created_by,
    created_at,
    updated_at,
    reviewed_by,
    reviewed_at
FROM chore_entries";

const AUDIT_SELECT_SQL: &str = "SELECT
    id,
    entry_id,
    actor_id,
    action,
    summary,
    before_json,
    after_json,
    created_at
FROM chore_entry_audits";

/// Chore entries plus their append-only audit log.
pub struct SqliteChoreEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChoreEntryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, entry: &ChoreEntry) -> CoreResult<()> {
        self.conn.execute(
            "INSERT INTO chore_entries (
                id, kid_id, chore_id, entry_date, status, chore_type, amount_cents, notes,
                is_deleted, created_by, created_at, updated_at, reviewed_by, reviewed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                entry.id.to_string(),
                entry.kid_id.to_string(),
                entry.chore_id.to_string(),
                entry.entry_date,
                entry.status.as_str(),
                entry.chore_type.as_str(),
                entry.amount.cents(),
                entry.notes,
                entry.is_deleted,
                entry.created_by.to_string(),
                entry.created_at,
                entry.updated_at,
                entry.reviewed_by.map(|id| id.to_string()),
                entry.reviewed_at,
            ],
        )?;
        Ok(())
    }

    /// Loads an entry. Deleted entries are hidden unless `include_deleted`.
    pub fn get(&self, id: Uuid, include_deleted: bool) -> CoreResult<Option<ChoreEntry>> {
        let sql = format!("{ENTRY_SELECT_SQL} WHERE id = ?1 AND (?2 OR is_deleted = 0)");
        let entry = self
            .conn
            .query_row(&sql, params![id.to_string(), include_deleted], map_entry_row)
            .optional()?;
        Ok(entry)
    }

    pub fn update(&self, entry: &ChoreEntry) -> CoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE chore_entries SET
                chore_id = ?2, entry_date = ?3, status = ?4, chore_type = ?5,
                amount_cents = ?6, notes = ?7, is_deleted = ?8, updated_at = ?9,
                reviewed_by = ?10, reviewed_at = ?11
             WHERE id = ?1",
            params![
                entry.id.to_string(),
                entry.chore_id.to_string(),
                entry.entry_date,
                entry.status.as_str(),
                entry.chore_type.as_str(),
                entry.amount.cents(),
                entry.notes,
                entry.is_deleted,
                entry.updated_at,
                entry.reviewed_by.map(|id| id.to_string()),
                entry.reviewed_at,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::EntryNotFound(entry.id));
        }
        Ok(())
    }

    /// Live entries for a kid in an inclusive date range.
    pub fn list_for_kid(
        &self,
        kid_id: KidId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CoreResult<Vec<ChoreEntry>> {
        let sql = format!(
            "{ENTRY_SELECT_SQL}
             WHERE kid_id = ?1 AND is_deleted = 0 AND entry_date >= ?2 AND entry_date <= ?3
             ORDER BY entry_date ASC, created_at ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![kid_id.to_string(), from, to], map_entry_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Chore ids with a live approved entry for the kid on `date`.
    pub fn approved_chore_ids_on(&self, kid_id: KidId, date: NaiveDate) -> CoreResult<Vec<Uuid>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT chore_id FROM chore_entries
             WHERE kid_id = ?1 AND entry_date = ?2 AND status = 'Approved' AND is_deleted = 0",
        )?;
        let rows = stmt.query_map(params![kid_id.to_string(), date], |row| {
            uuid_col(row, "chore_id")
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn insert_audit(&self, audit: &ChoreEntryAudit) -> CoreResult<()> {
        self.conn.execute(
            "INSERT INTO chore_entry_audits (
                id, entry_id, actor_id, action, summary, before_json, after_json, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                audit.id.to_string(),
                audit.entry_id.to_string(),
                audit.actor_id.to_string(),
                audit.action.as_str(),
                audit.summary,
                audit.before,
                audit.after,
                audit.created_at,
            ],
        )?;
        Ok(())
    }

    /// Audit records for an entry, oldest first.
    pub fn list_audits(&self, entry_id: Uuid) -> CoreResult<Vec<ChoreEntryAudit>> {
        let sql = format!("{AUDIT_SELECT_SQL} WHERE entry_id = ?1 ORDER BY created_at ASC, rowid ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([entry_id.to_string()], map_audit_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn map_entry_row(row: &Row<'_>) -> rusqlite::Result<ChoreEntry> {
    Ok(ChoreEntry {
        id: uuid_col(row, "id")?,
        kid_id: uuid_col(row, "kid_id")?,
        chore_id: uuid_col(row, "chore_id")?,
        entry_date: row.get("entry_date")?,
        status: label_col(row, "status")?,
        chore_type: label_col(row, "chore_type")?,
        amount: money_col(row, "amount_cents")?,
        notes: row.get("notes")?,
        is_deleted: row.get("is_deleted")?,
        created_by: uuid_col(row, "created_by")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        reviewed_by: opt_uuid_col(row, "reviewed_by")?,
        reviewed_at: row.get("reviewed_at")?,
    })
}

fn map_audit_row(row: &Row<'_>) -> rusqlite::Result<ChoreEntryAudit> {
    Ok(ChoreEntryAudit {
        id: uuid_col(row, "id")?,
        entry_id: uuid_col(row, "entry_id")?,
        actor_id: uuid_col(row, "actor_id")?,
        action: label_col(row, "action")?,
        summary: row.get("summary")?,
        before: row.get("before_json")?,
        after: row.get("after_json")?,
        created_at: row.get("created_at")?,
    })
}
