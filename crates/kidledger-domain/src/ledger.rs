//! Ledger entries: the monetary record of a kid's rewards.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Identifiable, KidId, UserId};
use crate::money::Money;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntryType {
    PocketMoney,
    Chore,
    Deposit,
    Withdrawal,
    StartingBalance,
}

labelled_enum!(EntryType, "ledger entry type", {
    PocketMoney => "PocketMoney",
    Chore => "Chore",
    Deposit => "Deposit",
    Withdrawal => "Withdrawal",
    StartingBalance => "StartingBalance",
});

/// Upstream generator of a ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SourceType {
    PocketMoneyRule,
    ChoreEntry,
}

labelled_enum!(SourceType, "ledger source type", {
    PocketMoneyRule => "PocketMoneyRule",
    ChoreEntry => "ChoreEntry",
});

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub source_type: SourceType,
    pub source_id: Uuid,
}

impl SourceRef {
    pub fn pocket_money_rule(rule_id: Uuid) -> Self {
        Self {
            source_type: SourceType::PocketMoneyRule,
            source_id: rule_id,
        }
    }

    pub fn chore_entry(entry_id: Uuid) -> Self {
        Self {
            source_type: SourceType::ChoreEntry,
            source_id: entry_id,
        }
    }
}

/// One monetary event for one kid.
///
/// At most one non-deleted entry exists per `(kid, source, entry_date)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub kid_id: KidId,
    pub entry_type: EntryType,
    pub amount: Money,
    pub entry_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        kid_id: KidId,
        entry_type: EntryType,
        amount: Money,
        entry_date: NaiveDate,
        created_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kid_id,
            entry_type,
            amount,
            entry_date,
            notes: None,
            created_by,
            source: None,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

impl Identifiable for LedgerEntry {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Stored amount for a withdrawal: always negative, whatever sign the caller used.
pub fn withdrawal_amount(requested: Money) -> Money {
    -requested.abs()
}

/// Stored delta for a starting-balance adjustment so the ledger stays additive.
pub fn starting_balance_delta(target: Money, current_balance: Money) -> Money {
    target - current_balance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn withdrawals_are_always_negative() {
        assert_eq!(
            withdrawal_amount(Money::from_cents(500)),
            Money::from_cents(-500)
        );
        assert_eq!(
            withdrawal_amount(Money::from_cents(-500)),
            Money::from_cents(-500)
        );
    }

    #[test]
    fn starting_balance_is_a_delta() {
        assert_eq!(
            starting_balance_delta(Money::from_major(20), Money::from_major(35)),
            Money::from_major(-15)
        );
    }

    #[test]
    fn source_labels_round_trip() {
        assert_eq!(SourceType::ChoreEntry.as_str(), "ChoreEntry");
        assert_eq!(
            "PocketMoneyRule".parse::<SourceType>().unwrap(),
            SourceType::PocketMoneyRule
        );
        assert!("Invoice".parse::<SourceType>().is_err());
    }
}
