//! Chore entries (a kid's claim that a chore was done) and their audit trail.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chore::{Chore, ChoreType};
use crate::common::{Identifiable, KidId, UserId};
use crate::money::Money;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntryStatus {
    Pending,
    Approved,
    Rejected,
}

labelled_enum!(EntryStatus, "chore entry status", {
    Pending => "Pending",
    Approved => "Approved",
    Rejected => "Rejected",
});

/// How a newly created entry enters the workflow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReviewPolicy {
    /// Self-logged entries are approved on creation.
    AutoApprove,
    /// The entry waits for a guardian decision.
    RequireReview,
}

impl ReviewPolicy {
    pub fn initial_status(self) -> EntryStatus {
        match self {
            ReviewPolicy::AutoApprove => EntryStatus::Approved,
            ReviewPolicy::RequireReview => EntryStatus::Pending,
        }
    }
}

/// Guardian verdict on a pending entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn status(self) -> EntryStatus {
        match self {
            ReviewDecision::Approve => EntryStatus::Approved,
            ReviewDecision::Reject => EntryStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoreEntry {
    pub id: Uuid,
    pub kid_id: KidId,
    pub chore_id: Uuid,
    pub entry_date: NaiveDate,
    pub status: EntryStatus,
    /// Chore type at creation time; later edits to the chore leave history alone.
    pub chore_type: ChoreType,
    /// Chore amount at creation time.
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl ChoreEntry {
    pub fn new(
        kid_id: KidId,
        chore: &Chore,
        entry_date: NaiveDate,
        status: EntryStatus,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kid_id,
            chore_id: chore.id,
            entry_date,
            status,
            chore_type: chore.chore_type,
            amount: chore.amount,
            notes: None,
            is_deleted: false,
            created_by,
            created_at: now,
            updated_at: now,
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    /// Re-points the entry at another chore, refreshing the snapshots.
    pub fn retarget(&mut self, chore: &Chore) {
        self.chore_id = chore.id;
        self.chore_type = chore.chore_type;
        self.amount = chore.amount;
    }

    pub fn is_approved(&self) -> bool {
        !self.is_deleted && self.status == EntryStatus::Approved
    }

    /// When the entry became approved: the review time, or the creation time
    /// for entries approved on creation. `None` unless currently approved.
    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        if !self.is_approved() {
            return None;
        }
        Some(self.reviewed_at.unwrap_or(self.created_at))
    }

    /// Approved no later than the end of `day` (UTC).
    pub fn was_approved_by(&self, day: NaiveDate) -> bool {
        self.approved_at()
            .is_some_and(|approved_at| approved_at.date_naive() <= day)
    }

    pub fn is_pending(&self) -> bool {
        !self.is_deleted && self.status == EntryStatus::Pending
    }

    /// An entry owns a ledger posting only while approved, live, and worth something.
    pub fn mirrors_to_ledger(&self) -> bool {
        self.is_approved() && !self.amount.is_zero()
    }

    /// One-line description used in audit summaries.
    pub fn describe(&self) -> String {
        format!(
            "{} {} entry on {} for {} [{}]",
            self.status, self.chore_type, self.entry_date, self.amount, self.chore_id
        )
    }
}

impl Identifiable for ChoreEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Approved,
    Rejected,
}

labelled_enum!(AuditAction, "audit action", {
    Created => "Created",
    Updated => "Updated",
    Deleted => "Deleted",
    Approved => "Approved",
    Rejected => "Rejected",
});

/// Append-only record of one change to a chore entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoreEntryAudit {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub actor_id: UserId,
    pub action: AuditAction,
    pub summary: String,
    /// Serialized entry before the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    /// Serialized entry after the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    pub created_at: DateTime<Utc>,
}
