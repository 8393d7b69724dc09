//! Ledger Store operations: direct postings, guardian adjustments and balances.

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::{debug, info};
use uuid::Uuid;

use kidledger_domain::{
    starting_balance_delta, withdrawal_amount, Actor, EntryType, KidId, LedgerEntry, Money,
};

use crate::db::immediate;
use crate::repo::SqliteLedgerRepository;
use crate::{Clock, CoreError, CoreResult};

/// A guardian-initiated money movement.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualPosting {
    pub kid_id: KidId,
    pub amount: Money,
    pub entry_date: NaiveDate,
    pub notes: Option<String>,
}

impl ManualPosting {
    pub fn new(kid_id: KidId, amount: Money, entry_date: NaiveDate) -> Self {
        Self {
            kid_id,
            amount,
            entry_date,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

pub struct LedgerService;

impl LedgerService {
    /// Writes one entry. A live entry for the same source and day is a conflict.
    pub fn post(conn: &mut Connection, entry: LedgerEntry) -> CoreResult<LedgerEntry> {
        let tx = immediate(conn)?;
        {
            let repo = SqliteLedgerRepository::new(&tx);
            if let Some(source) = entry.source {
                if repo
                    .find_active_by_source(entry.kid_id, source, entry.entry_date)?
                    .is_some()
                {
                    return Err(CoreError::DuplicatePosting {
                        kid_id: entry.kid_id,
                        source_type: source.source_type,
                        source_id: source.source_id,
                        entry_date: entry.entry_date,
                    });
                }
            }
            repo.insert(&entry)?;
        }
        tx.commit()?;
        debug!(
            kid_id = %entry.kid_id,
            entry_id = %entry.id,
            entry_type = %entry.entry_type,
            amount = %entry.amount,
            "ledger entry posted"
        );
        Ok(entry)
    }

    /// Credits the kid. The stored amount is always positive.
    pub fn deposit(
        conn: &mut Connection,
        clock: &dyn Clock,
        posting: ManualPosting,
        actor: Actor,
    ) -> CoreResult<LedgerEntry> {
        ensure_non_zero(posting.amount)?;
        let entry = manual_entry(EntryType::Deposit, posting.amount.abs(), posting, actor, clock);
        Self::post(conn, entry)
    }

    /// Debits the kid. The stored amount is always negative.
    pub fn withdraw(
        conn: &mut Connection,
        clock: &dyn Clock,
        posting: ManualPosting,
        actor: Actor,
    ) -> CoreResult<LedgerEntry> {
        ensure_non_zero(posting.amount)?;
        let amount = withdrawal_amount(posting.amount);
        let entry = manual_entry(EntryType::Withdrawal, amount, posting, actor, clock);
        Self::post(conn, entry)
    }

    /// Posts the delta that brings the balance to `posting.amount`.
    ///
    /// A zero delta is still recorded.
    pub fn set_starting_balance(
        conn: &mut Connection,
        clock: &dyn Clock,
        posting: ManualPosting,
        actor: Actor,
    ) -> CoreResult<LedgerEntry> {
        let tx = immediate(conn)?;
        let entry = {
            let repo = SqliteLedgerRepository::new(&tx);
            let current = repo.balance(posting.kid_id)?;
            let delta = starting_balance_delta(posting.amount, current);
            let entry = manual_entry(EntryType::StartingBalance, delta, posting, actor, clock);
            repo.insert(&entry)?;
            entry
        };
        tx.commit()?;
        info!(kid_id = %entry.kid_id, delta = %entry.amount, "starting balance set");
        Ok(entry)
    }

    /// Soft-deletes an entry. Returns false when it was already deleted.
    pub fn soft_delete(conn: &mut Connection, clock: &dyn Clock, entry_id: Uuid) -> CoreResult<bool> {
        let tx = immediate(conn)?;
        let deleted = {
            let repo = SqliteLedgerRepository::new(&tx);
            if repo.get(entry_id)?.is_none() {
                return Err(CoreError::LedgerEntryNotFound(entry_id));
            }
            repo.soft_delete(entry_id, clock.now())?
        };
        tx.commit()?;
        Ok(deleted)
    }

    pub fn balance(conn: &Connection, kid_id: KidId) -> CoreResult<Money> {
        SqliteLedgerRepository::new(conn).balance(kid_id)
    }

    /// Live entries between `from` and `to`, both inclusive and optional.
    pub fn entries(
        conn: &Connection,
        kid_id: KidId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> CoreResult<Vec<LedgerEntry>> {
        SqliteLedgerRepository::new(conn).list(kid_id, from, to)
    }
}

fn ensure_non_zero(amount: Money) -> CoreResult<()> {
    if amount.is_zero() {
        return Err(CoreError::Validation("amount must be non-zero".into()));
    }
    Ok(())
}

fn manual_entry(
    entry_type: EntryType,
    amount: Money,
    posting: ManualPosting,
    actor: Actor,
    clock: &dyn Clock,
) -> LedgerEntry {
    LedgerEntry::new(
        posting.kid_id,
        entry_type,
        amount,
        posting.entry_date,
        actor.user_id,
        clock.now(),
    )
    .with_notes(posting.notes)
}
