//! Reminder configuration and the idempotent run log.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chore::ChoreType;
use crate::common::KidId;

pub const DEDUPE_KEY_PREFIX: &str = "kids-reminder";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReminderTrack {
    DailyJobs,
    Habits,
}

labelled_enum!(ReminderTrack, "reminder track", {
    DailyJobs => "daily_jobs",
    Habits => "habits",
});

impl ReminderTrack {
    pub const ALL: [ReminderTrack; 2] = [ReminderTrack::DailyJobs, ReminderTrack::Habits];

    /// Chores this track nags about.
    pub fn chore_type(self) -> ChoreType {
        match self {
            ReminderTrack::DailyJobs => ChoreType::Daily,
            ReminderTrack::Habits => ChoreType::Habit,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackSettings {
    pub enabled: bool,
    pub time: NaiveTime,
}

impl TrackSettings {
    pub fn disabled_at(time: NaiveTime) -> Self {
        Self {
            enabled: false,
            time,
        }
    }

    pub fn enabled_at(time: NaiveTime) -> Self {
        Self {
            enabled: true,
            time,
        }
    }

    /// Configured time truncated to the minute, as stored in the run log.
    pub fn normalized_time(&self) -> String {
        normalize_time(self.time)
    }
}

/// Per-kid reminder configuration; both tracks share one timezone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderSettings {
    pub kid_id: KidId,
    pub daily_jobs: TrackSettings,
    pub habits: TrackSettings,
    /// IANA timezone name, e.g. `Australia/Sydney`.
    pub timezone: String,
    pub updated_at: DateTime<Utc>,
}

impl ReminderSettings {
    pub fn track(&self, track: ReminderTrack) -> &TrackSettings {
        match track {
            ReminderTrack::DailyJobs => &self.daily_jobs,
            ReminderTrack::Habits => &self.habits,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RunStatus {
    Sent,
    Skipped,
    Error,
}

labelled_enum!(RunStatus, "reminder run status", {
    Sent => "sent",
    Skipped => "skipped",
    Error => "error",
});

/// One evaluation of one track for one kid at one local date and time.
///
/// Unique per `(kid_id, run_date, run_time, track)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderRun {
    pub id: Uuid,
    pub kid_id: KidId,
    pub run_date: NaiveDate,
    pub run_time: String,
    pub track: ReminderTrack,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReminderRun {
    pub fn new(
        kid_id: KidId,
        run_date: NaiveDate,
        run_time: impl Into<String>,
        track: ReminderTrack,
        status: RunStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kid_id,
            run_date,
            run_time: run_time.into(),
            track,
            status,
            detail: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// `HH:MM`, dropping seconds.
pub fn normalize_time(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Deterministic key handed to the dispatcher for one run.
pub fn dedupe_key(run_date: NaiveDate, run_time: &str, track: ReminderTrack) -> String {
    format!("{DEDUPE_KEY_PREFIX}:{run_date}:{run_time}:{track}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn times_are_normalized_to_minutes() {
        let time = NaiveTime::from_hms_opt(7, 5, 42).unwrap();
        assert_eq!(normalize_time(time), "07:05");
    }

    #[test]
    fn dedupe_key_is_stable() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 3).unwrap();
        assert_eq!(
            dedupe_key(date, "18:30", ReminderTrack::Habits),
            "kids-reminder:2025-06-03:18:30:habits"
        );
    }

    #[test]
    fn tracks_map_to_chore_types() {
        assert_eq!(ReminderTrack::DailyJobs.chore_type(), ChoreType::Daily);
        assert_eq!(ReminderTrack::Habits.chore_type(), ChoreType::Habit);
        assert_eq!(
            "daily_jobs".parse::<ReminderTrack>().unwrap(),
            ReminderTrack::DailyJobs
        );
    }
}
