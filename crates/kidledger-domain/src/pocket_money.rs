//! Pocket-money rules and due-date computation.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::calendar::{add_days, YearMonth};
use crate::common::{Identifiable, KidId, UserId};
use crate::money::Money;

/// Upper bound on occurrences produced by a single catch-up run.
pub const MAX_CATCH_UP_OCCURRENCES: usize = 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Fortnightly,
    Monthly,
}

labelled_enum!(Frequency, "pocket money frequency", {
    Weekly => "weekly",
    Fortnightly => "fortnightly",
    Monthly => "monthly",
});

/// A rule is missing the day field its frequency needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("{0} rule has no day of week")]
    MissingDayOfWeek(Frequency),
    #[error("monthly rule has no day of month")]
    MissingDayOfMonth,
    #[error("day of month {0} is outside 1..=31")]
    InvalidDayOfMonth(u32),
}

/// The recurring allowance configured for one kid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PocketMoneyRule {
    pub id: Uuid,
    pub kid_id: KidId,
    pub amount: Money,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<Weekday>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    /// Posting cursor: the latest due date already reached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_posted_on: Option<NaiveDate>,
    pub is_active: bool,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PocketMoneyRule {
    /// Date after which due dates are computed.
    pub fn cursor(&self) -> NaiveDate {
        self.last_posted_on.unwrap_or(self.start_date)
    }

    pub fn schedule(&self) -> Result<Schedule, ScheduleError> {
        match self.frequency {
            Frequency::Weekly => self
                .day_of_week
                .map(Schedule::Weekly)
                .ok_or(ScheduleError::MissingDayOfWeek(Frequency::Weekly)),
            Frequency::Fortnightly => {
                let weekday = self
                    .day_of_week
                    .ok_or(ScheduleError::MissingDayOfWeek(Frequency::Fortnightly))?;
                Ok(Schedule::Fortnightly {
                    anchor: roll_forward_to(self.start_date, weekday),
                })
            }
            Frequency::Monthly => {
                let day = self.day_of_month.ok_or(ScheduleError::MissingDayOfMonth)?;
                if !(1..=31).contains(&day) {
                    return Err(ScheduleError::InvalidDayOfMonth(day));
                }
                Ok(Schedule::Monthly(day))
            }
        }
    }

    /// Ordered due dates strictly after the cursor, up to and including `through`.
    pub fn due_dates(&self, through: NaiveDate) -> Result<Vec<NaiveDate>, ScheduleError> {
        if !self.is_active {
            return Ok(Vec::new());
        }
        let schedule = self.schedule()?;
        Ok(schedule.due_between(self.cursor(), through, MAX_CATCH_UP_OCCURRENCES))
    }
}

impl Identifiable for PocketMoneyRule {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// Resolved posting cadence of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Weekly(Weekday),
    Fortnightly { anchor: NaiveDate },
    Monthly(u32),
}

impl Schedule {
    /// First due date strictly after `cursor`.
    pub fn next_after(&self, cursor: NaiveDate) -> Option<NaiveDate> {
        match *self {
            Schedule::Weekly(weekday) => {
                let ahead = days_until(cursor.weekday(), weekday);
                add_days(cursor, if ahead == 0 { 7 } else { ahead })
            }
            Schedule::Fortnightly { anchor } => {
                if cursor < anchor {
                    return Some(anchor);
                }
                let elapsed = (cursor - anchor).num_days() as u64;
                add_days(anchor, (elapsed / 14 + 1) * 14)
            }
            Schedule::Monthly(day) => {
                let month = YearMonth::of(cursor);
                let candidate = month.clamped_day(day)?;
                if candidate > cursor {
                    Some(candidate)
                } else {
                    month.next().clamped_day(day)
                }
            }
        }
    }

    /// Due dates in `(cursor, through]`, capped at `limit` occurrences.
    pub fn due_between(&self, cursor: NaiveDate, through: NaiveDate, limit: usize) -> Vec<NaiveDate> {
        let mut due = Vec::new();
        let mut current = cursor;
        while due.len() < limit {
            match self.next_after(current) {
                Some(next) if next <= through => {
                    due.push(next);
                    current = next;
                }
                _ => break,
            }
        }
        due
    }
}

fn days_until(from: Weekday, to: Weekday) -> u64 {
    let from = from.num_days_from_monday();
    let to = to.num_days_from_monday();
    u64::from((to + 7 - from) % 7)
}

fn roll_forward_to(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    add_days(date, days_until(date.weekday(), weekday)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(frequency: Frequency, start: NaiveDate) -> PocketMoneyRule {
        let now = Utc::now();
        PocketMoneyRule {
            id: Uuid::new_v4(),
            kid_id: Uuid::new_v4(),
            amount: Money::from_major(10),
            frequency,
            day_of_week: None,
            day_of_month: None,
            start_date: start,
            last_posted_on: None,
            is_active: true,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn weekly_skips_the_cursor_weekday() {
        // 2024-01-01 is a Monday.
        let mut weekly = rule(Frequency::Weekly, date(2024, 1, 1));
        weekly.day_of_week = Some(Weekday::Mon);

        assert_eq!(
            weekly.due_dates(date(2024, 1, 10)).unwrap(),
            vec![date(2024, 1, 8)]
        );
        assert_eq!(
            weekly.due_dates(date(2024, 1, 22)).unwrap(),
            vec![date(2024, 1, 8), date(2024, 1, 15), date(2024, 1, 22)]
        );
    }

    #[test]
    fn weekly_resumes_from_last_posted() {
        let mut weekly = rule(Frequency::Weekly, date(2024, 1, 1));
        weekly.day_of_week = Some(Weekday::Fri);
        weekly.last_posted_on = Some(date(2024, 1, 12));

        assert_eq!(
            weekly.due_dates(date(2024, 1, 26)).unwrap(),
            vec![date(2024, 1, 19), date(2024, 1, 26)]
        );
    }

    #[test]
    fn fortnightly_anchors_on_first_matching_weekday() {
        // Start on a Wednesday, pay on Fridays: anchor is 2024-01-05.
        let mut fortnightly = rule(Frequency::Fortnightly, date(2024, 1, 3));
        fortnightly.day_of_week = Some(Weekday::Fri);

        assert_eq!(
            fortnightly.due_dates(date(2024, 2, 2)).unwrap(),
            vec![date(2024, 1, 5), date(2024, 1, 19), date(2024, 2, 2)]
        );

        fortnightly.last_posted_on = Some(date(2024, 1, 25));
        assert_eq!(
            fortnightly.due_dates(date(2024, 2, 20)).unwrap(),
            vec![date(2024, 2, 2), date(2024, 2, 16)]
        );
    }

    #[test]
    fn monthly_clamps_short_months() {
        let mut monthly = rule(Frequency::Monthly, date(2025, 1, 31));
        monthly.day_of_month = Some(31);

        assert_eq!(
            monthly.due_dates(date(2025, 5, 1)).unwrap(),
            vec![date(2025, 2, 28), date(2025, 3, 31), date(2025, 4, 30)]
        );
    }

    #[test]
    fn monthly_day_31_in_thirty_day_month() {
        let mut monthly = rule(Frequency::Monthly, date(2025, 6, 1));
        monthly.day_of_month = Some(31);

        assert_eq!(
            monthly.due_dates(date(2025, 6, 30)).unwrap(),
            vec![date(2025, 6, 30)]
        );
    }

    #[test]
    fn inactive_rules_have_no_due_dates() {
        let mut weekly = rule(Frequency::Weekly, date(2024, 1, 1));
        weekly.day_of_week = Some(Weekday::Mon);
        weekly.is_active = false;

        assert!(weekly.due_dates(date(2024, 3, 1)).unwrap().is_empty());
    }

    #[test]
    fn missing_day_fields_are_misconfiguration() {
        let weekly = rule(Frequency::Weekly, date(2024, 1, 1));
        assert_eq!(
            weekly.due_dates(date(2024, 3, 1)),
            Err(ScheduleError::MissingDayOfWeek(Frequency::Weekly))
        );

        let monthly = rule(Frequency::Monthly, date(2024, 1, 1));
        assert_eq!(
            monthly.due_dates(date(2024, 3, 1)),
            Err(ScheduleError::MissingDayOfMonth)
        );
    }

    #[test]
    fn catch_up_is_capped() {
        let schedule = Schedule::Weekly(Weekday::Mon);
        let due = schedule.due_between(date(2000, 1, 1), date(2100, 1, 1), 5);
        assert_eq!(due.len(), 5);
    }
}
