//! Day protection and month payout projection.
//!
//! A day is protected when every Daily chore required of the kid that day has an
//! approved entry. Protected days earn the daily slice of the monthly allowance.
//! Days after today are assumed to repeat today's protection status, since their
//! entries do not exist yet.

use std::collections::HashSet;
use std::num::NonZeroU32;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::YearMonth;
use crate::chore::{required_chores, AssignedChore, ChoreType};
use crate::entry::{ChoreEntry, EntryStatus};
use crate::money::Money;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DayPhase {
    Past,
    Today,
    Future,
}

impl DayPhase {
    pub fn of(date: NaiveDate, today: NaiveDate) -> Self {
        if date < today {
            DayPhase::Past
        } else if date == today {
            DayPhase::Today
        } else {
            DayPhase::Future
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayProjection {
    pub date: NaiveDate,
    pub phase: DayPhase,
    /// Protection status used for this day's credit.
    pub protected: bool,
    pub allowance_credit: Money,
    pub bonus_credit: Money,
    /// Running total for the month so far, never below zero.
    pub cumulative: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthSummary {
    pub month: YearMonth,
    pub daily_slice: Money,
    pub missed_days: u32,
    pub approved_bonus_total: Money,
    pub pending_bonus_total: Money,
    pub projected_payout: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthProjection {
    pub days: Vec<DayProjection>,
    pub summary: MonthSummary,
}

/// Everything the projection needs about one kid.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    pub today: NaiveDate,
    pub month: YearMonth,
    pub monthly_allowance: Money,
    pub chores: &'a [AssignedChore],
    pub entries: &'a [ChoreEntry],
}

/// Monthly allowance divided across the days of the month, half-up to the cent.
pub fn daily_slice(monthly_allowance: Money, month: YearMonth) -> Money {
    NonZeroU32::new(month.days())
        .map(|days| monthly_allowance.div_round_half_up(days))
        .unwrap_or(Money::ZERO)
}

/// True when no Daily chore is required on `date`, or all of them are approved.
pub fn is_protected(chores: &[AssignedChore], entries: &[ChoreEntry], date: NaiveDate) -> bool {
    covers_required(chores, entries, date, |entry| entry.is_approved())
}

/// Protection of `date` as it stood at the end of that day: only entries
/// approved by then count.
pub fn was_protected(chores: &[AssignedChore], entries: &[ChoreEntry], date: NaiveDate) -> bool {
    covers_required(chores, entries, date, |entry| entry.was_approved_by(date))
}

fn covers_required(
    chores: &[AssignedChore],
    entries: &[ChoreEntry],
    date: NaiveDate,
    counts: impl Fn(&ChoreEntry) -> bool,
) -> bool {
    let required = required_chores(chores, date, ChoreType::Daily);
    if required.is_empty() {
        return true;
    }
    let approved: HashSet<Uuid> = entries
        .iter()
        .filter(|entry| entry.entry_date == date && counts(*entry))
        .map(|entry| entry.chore_id)
        .collect();
    required.iter().all(|chore| approved.contains(&chore.id))
}

pub fn project_month(input: ProjectionInput<'_>) -> MonthProjection {
    let slice = daily_slice(input.monthly_allowance, input.month);
    let protected_today = is_protected(input.chores, input.entries, input.today);

    let bonus_entries: Vec<&ChoreEntry> = input
        .entries
        .iter()
        .filter(|entry| {
            !entry.is_deleted
                && entry.chore_type == ChoreType::Bonus
                && input.month.contains(entry.entry_date)
        })
        .collect();

    let mut days = Vec::with_capacity(input.month.days() as usize);
    let mut running = Money::ZERO;
    let mut missed_days = 0u32;

    for date in input.month.dates() {
        let phase = DayPhase::of(date, input.today);
        let protected = match phase {
            DayPhase::Past => was_protected(input.chores, input.entries, date),
            DayPhase::Today | DayPhase::Future => protected_today,
        };
        if phase == DayPhase::Past && !protected {
            missed_days += 1;
        }
        let allowance_credit = if protected { slice } else { Money::ZERO };
        let bonus_credit: Money = bonus_entries
            .iter()
            .filter(|entry| entry.entry_date == date && entry.status == EntryStatus::Approved)
            .map(|entry| entry.amount)
            .sum();

        running += allowance_credit + bonus_credit;
        let cumulative = running.max(Money::ZERO);
        days.push(DayProjection {
            date,
            phase,
            protected,
            allowance_credit,
            bonus_credit,
            cumulative,
        });
    }

    let approved_bonus_total = bonus_entries
        .iter()
        .filter(|entry| entry.status == EntryStatus::Approved)
        .map(|entry| entry.amount)
        .sum();
    let pending_bonus_total = bonus_entries
        .iter()
        .filter(|entry| entry.status == EntryStatus::Pending)
        .map(|entry| entry.amount)
        .sum();
    let projected_payout = days
        .last()
        .map(|day| day.cumulative)
        .unwrap_or(Money::ZERO);

    MonthProjection {
        days,
        summary: MonthSummary {
            month: input.month,
            daily_slice: slice,
            missed_days,
            approved_bonus_total,
            pending_bonus_total,
            projected_payout,
        },
    }
}
