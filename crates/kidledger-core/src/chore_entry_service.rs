//! Chore entry workflow: create, edit, delete and review, each mirrored into
//! the ledger and recorded in the audit log within one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use kidledger_domain::{
    Actor, AssignedChore, AuditAction, Chore, ChoreEntry, ChoreEntryAudit, EntryType, KidId,
    LedgerEntry, ReviewDecision, ReviewPolicy, SourceRef,
};

use crate::db::immediate;
use crate::repo::{SqliteChoreEntryRepository, SqliteChoreRepository, SqliteLedgerRepository};
use crate::{Clock, CoreError, CoreResult};

pub const MAX_NOTES_LEN: usize = 500;

/// A kid's claim that a chore was done on a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChoreEntry {
    pub kid_id: KidId,
    pub chore_id: Uuid,
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Fields to change on an existing entry. `None` leaves a field as is;
/// `notes: Some(None)` clears the notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoreEntryChanges {
    #[serde(default)]
    pub chore_id: Option<Uuid>,
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<Option<String>>,
}

pub struct ChoreEntryService;

impl ChoreEntryService {
    pub fn create_entry(
        conn: &mut Connection,
        clock: &dyn Clock,
        new: NewChoreEntry,
        policy: ReviewPolicy,
        actor: Actor,
    ) -> CoreResult<ChoreEntry> {
        if new.kid_id.is_nil() {
            return Err(CoreError::Validation("kid id must not be nil".into()));
        }
        let notes = normalize_notes(new.notes)?;
        let now = clock.now();

        let tx = immediate(conn)?;
        let entry = {
            let chore = ensure_assigned(&tx, new.kid_id, new.chore_id, new.entry_date)?;
            let mut entry = ChoreEntry::new(
                new.kid_id,
                &chore,
                new.entry_date,
                policy.initial_status(),
                actor.user_id,
                now,
            );
            entry.notes = notes;
            SqliteChoreEntryRepository::new(&tx).insert(&entry)?;
            sync_ledger_mirror(&tx, &entry, actor, now)?;
            record_audit(&tx, actor, AuditAction::Created, None, &entry, now)?;
            entry
        };
        tx.commit()?;
        info!(
            kid_id = %entry.kid_id,
            entry_id = %entry.id,
            chore_id = %entry.chore_id,
            status = %entry.status,
            "chore entry created"
        );
        Ok(entry)
    }

    /// Edits chore, date or notes. The resulting chore and date must still be
    /// assigned; snapshots are refreshed when the chore changes.
    pub fn update_entry(
        conn: &mut Connection,
        clock: &dyn Clock,
        entry_id: Uuid,
        changes: ChoreEntryChanges,
        actor: Actor,
    ) -> CoreResult<ChoreEntry> {
        let notes = changes.notes.map(normalize_notes).transpose()?;
        let now = clock.now();

        let tx = immediate(conn)?;
        let entry = {
            let entries = SqliteChoreEntryRepository::new(&tx);
            let before = entries
                .get(entry_id, false)?
                .ok_or(CoreError::EntryNotFound(entry_id))?;
            let mut entry = before.clone();

            let chore_id = changes.chore_id.unwrap_or(entry.chore_id);
            let entry_date = changes.entry_date.unwrap_or(entry.entry_date);
            let chore = ensure_assigned(&tx, entry.kid_id, chore_id, entry_date)?;
            if chore_id != entry.chore_id {
                entry.retarget(&chore);
            }
            entry.entry_date = entry_date;
            if let Some(notes) = notes {
                entry.notes = notes;
            }
            entry.updated_at = now;

            entries.update(&entry)?;
            sync_ledger_mirror(&tx, &entry, actor, now)?;
            record_audit(&tx, actor, AuditAction::Updated, Some(&before), &entry, now)?;
            entry
        };
        tx.commit()?;
        debug!(entry_id = %entry_id, "chore entry updated");
        Ok(entry)
    }

    /// Soft-deletes the entry and its ledger mirror. The entry's chore must
    /// still be assigned on its date.
    pub fn delete_entry(
        conn: &mut Connection,
        clock: &dyn Clock,
        entry_id: Uuid,
        actor: Actor,
    ) -> CoreResult<ChoreEntry> {
        let now = clock.now();
        let tx = immediate(conn)?;
        let entry = {
            let entries = SqliteChoreEntryRepository::new(&tx);
            let before = entries
                .get(entry_id, false)?
                .ok_or(CoreError::EntryNotFound(entry_id))?;
            ensure_assigned(&tx, before.kid_id, before.chore_id, before.entry_date)?;
            let mut entry = before.clone();
            entry.is_deleted = true;
            entry.updated_at = now;

            entries.update(&entry)?;
            sync_ledger_mirror(&tx, &entry, actor, now)?;
            record_audit(&tx, actor, AuditAction::Deleted, Some(&before), &entry, now)?;
            entry
        };
        tx.commit()?;
        info!(entry_id = %entry_id, kid_id = %entry.kid_id, "chore entry deleted");
        Ok(entry)
    }

    /// Guardian decision on a pending entry. Approved and rejected are terminal.
    pub fn review_entry(
        conn: &mut Connection,
        clock: &dyn Clock,
        entry_id: Uuid,
        decision: ReviewDecision,
        actor: Actor,
    ) -> CoreResult<ChoreEntry> {
        let now = clock.now();
        let tx = immediate(conn)?;
        let entry = {
            let entries = SqliteChoreEntryRepository::new(&tx);
            let before = entries
                .get(entry_id, false)?
                .ok_or(CoreError::EntryNotFound(entry_id))?;
            if !before.is_pending() {
                return Err(CoreError::InvalidTransition(format!(
                    "entry {entry_id} is {} and cannot become {}",
                    before.status,
                    decision.status()
                )));
            }
            let mut entry = before.clone();
            entry.status = decision.status();
            entry.reviewed_by = Some(actor.user_id);
            entry.reviewed_at = Some(now);
            entry.updated_at = now;

            let action = match decision {
                ReviewDecision::Approve => AuditAction::Approved,
                ReviewDecision::Reject => AuditAction::Rejected,
            };
            entries.update(&entry)?;
            sync_ledger_mirror(&tx, &entry, actor, now)?;
            record_audit(&tx, actor, action, Some(&before), &entry, now)?;
            entry
        };
        tx.commit()?;
        info!(entry_id = %entry_id, status = %entry.status, "chore entry reviewed");
        Ok(entry)
    }

    pub fn get_entry(conn: &Connection, entry_id: Uuid) -> CoreResult<ChoreEntry> {
        SqliteChoreEntryRepository::new(conn)
            .get(entry_id, true)?
            .ok_or(CoreError::EntryNotFound(entry_id))
    }

    /// Live entries in an inclusive date range.
    pub fn entries_for_kid(
        conn: &Connection,
        kid_id: KidId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> CoreResult<Vec<ChoreEntry>> {
        SqliteChoreEntryRepository::new(conn).list_for_kid(kid_id, from, to)
    }

    /// Every audit record of an entry, oldest first. Includes deleted entries.
    pub fn audit_trail(conn: &Connection, entry_id: Uuid) -> CoreResult<Vec<ChoreEntryAudit>> {
        SqliteChoreEntryRepository::new(conn).list_audits(entry_id)
    }
}

fn normalize_notes(notes: Option<String>) -> CoreResult<Option<String>> {
    let Some(notes) = notes else {
        return Ok(None);
    };
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_NOTES_LEN {
        return Err(CoreError::Validation(format!(
            "notes exceed {MAX_NOTES_LEN} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

/// Loads the chore and checks it and one of its assignments are active on `date`.
fn ensure_assigned(
    conn: &Connection,
    kid_id: KidId,
    chore_id: Uuid,
    date: NaiveDate,
) -> CoreResult<Chore> {
    let chores = SqliteChoreRepository::new(conn);
    let chore = chores
        .get_chore(chore_id)?
        .ok_or(CoreError::ChoreNotFound(chore_id))?;
    let assigned = AssignedChore {
        assignments: chores.assignments_for(chore_id, kid_id)?,
        chore,
    };
    if !assigned.is_required_on(date) {
        return Err(CoreError::NotAssigned {
            kid_id,
            chore_id,
            date,
        });
    }
    Ok(assigned.chore)
}

/// Brings the ledger in line with the entry: one live mirror while it counts,
/// none otherwise.
fn sync_ledger_mirror(
    conn: &Connection,
    entry: &ChoreEntry,
    actor: Actor,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    let ledger = SqliteLedgerRepository::new(conn);
    let source = SourceRef::chore_entry(entry.id);
    let mut existing = ledger.find_active_for_source(entry.kid_id, source)?.into_iter();

    if !entry.mirrors_to_ledger() {
        for mirror in existing {
            ledger.soft_delete(mirror.id, now)?;
            debug!(entry_id = %entry.id, ledger_entry_id = %mirror.id, "ledger mirror removed");
        }
        return Ok(());
    }

    match existing.next() {
        Some(mut mirror) => {
            if mirror.amount != entry.amount || mirror.entry_date != entry.entry_date {
                mirror.amount = entry.amount;
                mirror.entry_date = entry.entry_date;
                mirror.updated_at = now;
                ledger.update(&mirror)?;
            }
        }
        None => {
            let mirror = LedgerEntry::new(
                entry.kid_id,
                EntryType::Chore,
                entry.amount,
                entry.entry_date,
                actor.user_id,
                now,
            )
            .with_source(source)
            .with_notes(entry.notes.clone());
            ledger.insert(&mirror)?;
            debug!(entry_id = %entry.id, ledger_entry_id = %mirror.id, "ledger mirror posted");
        }
    }
    for stray in existing {
        ledger.soft_delete(stray.id, now)?;
    }
    Ok(())
}

fn record_audit(
    conn: &Connection,
    actor: Actor,
    action: AuditAction,
    before: Option<&ChoreEntry>,
    after: &ChoreEntry,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    let summary = match (action, before) {
        (AuditAction::Updated, Some(before)) => {
            format!("Updated: {} -> {}", before.describe(), after.describe())
        }
        _ => format!("{action}: {}", after.describe()),
    };
    let audit = ChoreEntryAudit {
        id: Uuid::new_v4(),
        entry_id: after.id,
        actor_id: actor.user_id,
        action,
        summary,
        before: before.map(serde_json::to_string).transpose()?,
        after: Some(serde_json::to_string(after)?),
        created_at: now,
    };
    SqliteChoreEntryRepository::new(conn).insert_audit(&audit)
}
