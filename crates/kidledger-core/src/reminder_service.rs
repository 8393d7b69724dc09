//! Reminder scheduler: wall-clock matching per kid timezone, an idempotent run
//! log, and dispatch through the [`Notifier`] boundary.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use kidledger_domain::{
    dedupe_key, normalize_time, required_chores, KidId, ReminderRun, ReminderSettings,
    ReminderTrack, RunStatus, TrackSettings,
};

use crate::repo::{SqliteChoreEntryRepository, SqliteChoreRepository, SqliteReminderRepository};
use crate::{Clock, CoreError, CoreResult, Notifier, ReminderNotification};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderSettingsDraft {
    pub daily_jobs: TrackSettings,
    pub habits: TrackSettings,
    pub timezone: String,
}

/// In-app destinations opened from a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderLinks {
    pub daily_jobs: String,
    pub habits: String,
}

impl Default for ReminderLinks {
    fn default() -> Self {
        Self {
            daily_jobs: "/kids/jobs".into(),
            habits: "/kids/habits".into(),
        }
    }
}

impl ReminderLinks {
    pub fn for_track(&self, track: ReminderTrack) -> &str {
        match track {
            ReminderTrack::DailyJobs => &self.daily_jobs,
            ReminderTrack::Habits => &self.habits,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderSweepSummary {
    pub kids_evaluated: usize,
    pub sent: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackOutcome {
    Sent,
    Skipped,
}

pub struct ReminderService;

impl ReminderService {
    pub fn upsert_settings(
        conn: &Connection,
        clock: &dyn Clock,
        kid_id: KidId,
        draft: ReminderSettingsDraft,
    ) -> CoreResult<ReminderSettings> {
        let timezone = draft.timezone.trim();
        parse_timezone(timezone)?;
        let settings = ReminderSettings {
            kid_id,
            daily_jobs: truncate_to_minute(draft.daily_jobs),
            habits: truncate_to_minute(draft.habits),
            timezone: timezone.to_string(),
            updated_at: clock.now(),
        };
        SqliteReminderRepository::new(conn).upsert_settings(&settings)?;
        info!(kid_id = %kid_id, timezone = %settings.timezone, "reminder settings saved");
        Ok(settings)
    }

    pub fn settings_for_kid(conn: &Connection, kid_id: KidId) -> CoreResult<Option<ReminderSettings>> {
        SqliteReminderRepository::new(conn).get_settings(kid_id)
    }

    pub fn runs_for_kid(conn: &Connection, kid_id: KidId) -> CoreResult<Vec<ReminderRun>> {
        SqliteReminderRepository::new(conn).list_runs(kid_id)
    }

    /// Evaluates every kid with an enabled track against the current minute.
    ///
    /// Safe to invoke repeatedly: each `(kid, date, time, track)` is claimed at
    /// most once. Failures are isolated per kid and counted.
    pub fn sweep(
        conn: &Connection,
        clock: &dyn Clock,
        notifier: &dyn Notifier,
        links: &ReminderLinks,
    ) -> CoreResult<ReminderSweepSummary> {
        let all_settings = SqliteReminderRepository::new(conn).list_enabled_settings()?;
        let mut summary = ReminderSweepSummary::default();
        for settings in &all_settings {
            summary.kids_evaluated += 1;
            if let Err(err) = sweep_kid(conn, clock, notifier, links, settings, &mut summary) {
                summary.errors += 1;
                warn!(kid_id = %settings.kid_id, %err, "reminder evaluation failed");
            }
        }
        info!(
            kids = summary.kids_evaluated,
            sent = summary.sent,
            skipped = summary.skipped,
            errors = summary.errors,
            "reminder sweep complete"
        );
        Ok(summary)
    }
}

fn parse_timezone(name: &str) -> CoreResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| CoreError::UnknownTimezone(name.to_string()))
}

fn truncate_to_minute(track: TrackSettings) -> TrackSettings {
    let time = NaiveTime::from_hms_opt(track.time.hour(), track.time.minute(), 0)
        .unwrap_or(track.time);
    TrackSettings { time, ..track }
}

fn sweep_kid(
    conn: &Connection,
    clock: &dyn Clock,
    notifier: &dyn Notifier,
    links: &ReminderLinks,
    settings: &ReminderSettings,
    summary: &mut ReminderSweepSummary,
) -> CoreResult<()> {
    let timezone = parse_timezone(&settings.timezone)?;
    let local = clock.now().with_timezone(&timezone);
    let local_date = local.date_naive();
    let local_time = normalize_time(local.time());

    for track in ReminderTrack::ALL {
        let track_settings = settings.track(track);
        if !track_settings.enabled || track_settings.normalized_time() != local_time {
            continue;
        }
        match evaluate_track(
            conn,
            clock,
            notifier,
            links,
            settings.kid_id,
            track,
            local_date,
            &local_time,
        ) {
            Ok(TrackOutcome::Sent) => summary.sent += 1,
            Ok(TrackOutcome::Skipped) => summary.skipped += 1,
            Err(err) => {
                summary.errors += 1;
                warn!(kid_id = %settings.kid_id, track = %track, %err, "reminder track failed");
            }
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn evaluate_track(
    conn: &Connection,
    clock: &dyn Clock,
    notifier: &dyn Notifier,
    links: &ReminderLinks,
    kid_id: KidId,
    track: ReminderTrack,
    run_date: NaiveDate,
    run_time: &str,
) -> CoreResult<TrackOutcome> {
    let runs = SqliteReminderRepository::new(conn);
    if runs.find_run(kid_id, run_date, run_time, track)?.is_some() {
        debug!(kid_id = %kid_id, track = %track, %run_date, run_time, "reminder already evaluated");
        return Ok(TrackOutcome::Skipped);
    }

    let outstanding = outstanding_chores(conn, kid_id, track, run_date)?;
    let status = if outstanding.is_empty() {
        RunStatus::Skipped
    } else {
        RunStatus::Sent
    };
    let run = ReminderRun::new(kid_id, run_date, run_time, track, status, clock.now());
    if !runs.claim_run(&run)? {
        debug!(kid_id = %kid_id, track = %track, "reminder claimed by another run");
        return Ok(TrackOutcome::Skipped);
    }
    if status == RunStatus::Skipped {
        return Ok(TrackOutcome::Skipped);
    }

    let notification = build_notification(kid_id, track, &outstanding, run_date, run_time, links);
    match notifier.send(&notification) {
        Ok(()) => {
            debug!(kid_id = %kid_id, track = %track, key = %notification.dedupe_key, "reminder sent");
            Ok(TrackOutcome::Sent)
        }
        Err(err) => {
            error!(kid_id = %kid_id, track = %track, %err, "reminder dispatch failed");
            let detail = err.to_string();
            runs.update_run_status(&run, RunStatus::Error, Some(&detail), clock.now())?;
            Err(err.into())
        }
    }
}

/// Labels of required chores for the track without an approved entry on `date`.
fn outstanding_chores(
    conn: &Connection,
    kid_id: KidId,
    track: ReminderTrack,
    date: NaiveDate,
) -> CoreResult<Vec<String>> {
    let assigned = SqliteChoreRepository::new(conn).list_assigned_chores(kid_id)?;
    let done: HashSet<Uuid> = SqliteChoreEntryRepository::new(conn)
        .approved_chore_ids_on(kid_id, date)?
        .into_iter()
        .collect();
    Ok(required_chores(&assigned, date, track.chore_type())
        .into_iter()
        .filter(|chore| !done.contains(&chore.id))
        .map(|chore| chore.label.clone())
        .collect())
}

fn build_notification(
    kid_id: KidId,
    track: ReminderTrack,
    outstanding: &[String],
    run_date: NaiveDate,
    run_time: &str,
    links: &ReminderLinks,
) -> ReminderNotification {
    let count = outstanding.len();
    let (title, noun) = match track {
        ReminderTrack::DailyJobs => ("Daily jobs reminder", "daily job"),
        ReminderTrack::Habits => ("Habits reminder", "habit"),
    };
    let plural = if count == 1 { "" } else { "s" };
    ReminderNotification {
        kid_user_id: kid_id,
        title: title.to_string(),
        body: format!(
            "You have {count} {noun}{plural} left today: {}",
            outstanding.join(", ")
        ),
        kind: track,
        link_url: links.for_track(track).to_string(),
        dedupe_key: dedupe_key(run_date, run_time, track),
    }
}
