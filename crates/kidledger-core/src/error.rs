use chrono::NaiveDate;
use kidledger_domain::{
    CalendarError, KidId, MoneyError, ScheduleError, SourceType, UnknownVariant,
};
use thiserror::Error;
use uuid::Uuid;

use crate::notify::DispatchError;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Chore {chore_id} is not assigned to kid {kid_id} on {date}")]
    NotAssigned {
        kid_id: KidId,
        chore_id: Uuid,
        date: NaiveDate,
    },
    #[error("Duplicate posting for {source_type} {source_id} on {entry_date} (kid {kid_id})")]
    DuplicatePosting {
        kid_id: KidId,
        source_type: SourceType,
        source_id: Uuid,
        entry_date: NaiveDate,
    },
    #[error("Misconfigured pocket money rule: {0}")]
    MisconfiguredRule(#[from] ScheduleError),
    #[error("Chore not found: {0}")]
    ChoreNotFound(Uuid),
    #[error("Chore assignment not found: {0}")]
    AssignmentNotFound(Uuid),
    #[error("Chore entry not found: {0}")]
    EntryNotFound(Uuid),
    #[error("Ledger entry not found: {0}")]
    LedgerEntryNotFound(Uuid),
    #[error("Pocket money rule not found: {0}")]
    RuleNotFound(Uuid),
    #[error("No pocket money rule for kid {0}")]
    NoRuleForKid(KidId),
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("Database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid amount: {0}")]
    Money(#[from] MoneyError),
    #[error("Invalid date: {0}")]
    Calendar(#[from] CalendarError),
    #[error("Invalid persisted value: {0}")]
    InvalidData(#[from] UnknownVariant),
}

impl CoreError {
    /// Conflicts a batch job treats as "someone else already did it".
    pub fn is_duplicate(&self) -> bool {
        matches!(self, CoreError::DuplicatePosting { .. })
    }
}
