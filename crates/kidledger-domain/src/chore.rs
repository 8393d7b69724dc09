//! Chores, assignments, and the activation-window rules that decide what a kid owes on a day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Identifiable, KidId, UserId};
use crate::money::Money;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChoreType {
    Daily,
    Habit,
    Bonus,
}

labelled_enum!(ChoreType, "chore type", {
    Daily => "Daily",
    Habit => "Habit",
    Bonus => "Bonus",
});

/// Whether an `[starts_on, disabled_on]` window covers `date`.
///
/// A disabled record with a disable date stays active up to and including that
/// date, so history before the switch-off is unchanged. A disabled record with
/// no disable date is never active.
pub fn is_active_on_date(
    enabled: bool,
    starts_on: NaiveDate,
    disabled_on: Option<NaiveDate>,
    date: NaiveDate,
) -> bool {
    if date < starts_on {
        return false;
    }
    match disabled_on {
        Some(disabled_on) => date <= disabled_on,
        None => enabled,
    }
}

/// Records with an activation window.
pub trait ActivationWindow {
    fn enabled(&self) -> bool;
    fn starts_on(&self) -> NaiveDate;
    fn disabled_on(&self) -> Option<NaiveDate>;

    fn is_active_on(&self, date: NaiveDate) -> bool {
        is_active_on_date(self.enabled(), self.starts_on(), self.disabled_on(), date)
    }
}

/// A reward-bearing task definition owned by a guardian.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chore {
    pub id: Uuid,
    pub owner_id: UserId,
    pub label: String,
    pub chore_type: ChoreType,
    pub amount: Money,
    pub is_active: bool,
    pub sort_order: i32,
    pub starts_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivationWindow for Chore {
    fn enabled(&self) -> bool {
        self.is_active
    }

    fn starts_on(&self) -> NaiveDate {
        self.starts_on
    }

    fn disabled_on(&self) -> Option<NaiveDate> {
        self.disabled_on
    }
}

impl Identifiable for Chore {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// A (chore, kid) pairing with its own activation window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChoreAssignment {
    pub id: Uuid,
    pub chore_id: Uuid,
    pub kid_id: KidId,
    pub is_enabled: bool,
    pub starts_on: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl ActivationWindow for ChoreAssignment {
    fn enabled(&self) -> bool {
        self.is_enabled
    }

    fn starts_on(&self) -> NaiveDate {
        self.starts_on
    }

    fn disabled_on(&self) -> Option<NaiveDate> {
        self.disabled_on
    }
}

impl Identifiable for ChoreAssignment {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// A chore together with every assignment of it to one kid.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignedChore {
    pub chore: Chore,
    pub assignments: Vec<ChoreAssignment>,
}

impl AssignedChore {
    /// Both the chore and at least one of its assignments are active on `date`.
    pub fn is_required_on(&self, date: NaiveDate) -> bool {
        self.chore.is_active_on(date) && self.assignments.iter().any(|a| a.is_active_on(date))
    }
}

/// Chores of `chore_type` the kid must do on `date`, in display order.
pub fn required_chores(
    assigned: &[AssignedChore],
    date: NaiveDate,
    chore_type: ChoreType,
) -> Vec<&Chore> {
    let mut required: Vec<&Chore> = assigned
        .iter()
        .filter(|item| item.chore.chore_type == chore_type && item.is_required_on(date))
        .map(|item| &item.chore)
        .collect();
    required.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.label.cmp(&b.label))
    });
    required
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn chore(label: &str, chore_type: ChoreType, starts_on: NaiveDate) -> Chore {
        let now = Utc::now();
        Chore {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            label: label.into(),
            chore_type,
            amount: Money::ZERO,
            is_active: true,
            sort_order: 0,
            starts_on,
            disabled_on: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn assignment(chore: &Chore, kid: KidId, starts_on: NaiveDate) -> ChoreAssignment {
        ChoreAssignment {
            id: Uuid::new_v4(),
            chore_id: chore.id,
            kid_id: kid,
            is_enabled: true,
            starts_on,
            disabled_on: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn active_through_the_disable_date_only() {
        let start = date(2025, 3, 1);
        let disabled = Some(date(2025, 3, 10));

        assert!(is_active_on_date(false, start, disabled, date(2025, 3, 10)));
        assert!(!is_active_on_date(false, start, disabled, date(2025, 3, 11)));
        assert!(is_active_on_date(true, start, disabled, date(2025, 3, 10)));
        assert!(!is_active_on_date(true, start, disabled, date(2025, 3, 11)));
    }

    #[test]
    fn inactive_without_disable_date_is_never_active() {
        let start = date(2025, 3, 1);
        assert!(!is_active_on_date(false, start, None, date(2025, 3, 5)));
        assert!(is_active_on_date(true, start, None, date(2025, 3, 5)));
        assert!(!is_active_on_date(true, start, None, date(2025, 2, 28)));
    }

    #[test]
    fn required_chores_need_an_active_assignment() {
        let kid = Uuid::new_v4();
        let start = date(2025, 3, 1);
        let mut beds = chore("Make bed", ChoreType::Daily, start);
        beds.sort_order = 2;
        let mut dishes = chore("Dishes", ChoreType::Daily, start);
        dishes.sort_order = 1;
        let reading = chore("Reading", ChoreType::Habit, start);
        let garden = chore("Garden", ChoreType::Daily, start);

        let late = assignment(&garden, kid, date(2025, 3, 15));

        let assigned = vec![
            AssignedChore {
                assignments: vec![assignment(&beds, kid, start)],
                chore: beds,
            },
            AssignedChore {
                assignments: vec![assignment(&dishes, kid, start)],
                chore: dishes,
            },
            AssignedChore {
                assignments: vec![assignment(&reading, kid, start)],
                chore: reading,
            },
            AssignedChore {
                assignments: vec![late],
                chore: garden,
            },
        ];

        let labels: Vec<_> = required_chores(&assigned, date(2025, 3, 5), ChoreType::Daily)
            .into_iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Dishes", "Make bed"]);

        let labels: Vec<_> = required_chores(&assigned, date(2025, 3, 20), ChoreType::Daily)
            .into_iter()
            .map(|c| c.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Garden", "Dishes", "Make bed"]);
    }

    #[test]
    fn disabled_chore_stops_being_required_after_its_disable_date() {
        let kid = Uuid::new_v4();
        let start = date(2025, 3, 1);
        let mut beds = chore("Make bed", ChoreType::Daily, start);
        beds.is_active = false;
        beds.disabled_on = Some(date(2025, 3, 10));
        let assigned = vec![AssignedChore {
            assignments: vec![assignment(&beds, kid, start)],
            chore: beds,
        }];

        assert_eq!(
            required_chores(&assigned, date(2025, 3, 10), ChoreType::Daily).len(),
            1
        );
        assert!(required_chores(&assigned, date(2025, 3, 11), ChoreType::Daily).is_empty());
    }
}
