use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use kidledger_domain::{
    KidId, ReminderRun, ReminderSettings, ReminderTrack, RunStatus, TrackSettings,
};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{conversion_error, label_col, uuid_col};
use crate::CoreResult;

const SETTINGS_SELECT_SQL: &str = "SELECT
    kid_id,
    daily_jobs_enabled,
    daily_jobs_time,
    habits_enabled,
    habits_time,
    timezone,
    updated_at
FROM reminder_settings";

const RUN_SELECT_SQL: &str = "SELECT
    id,
    kid_id,
    run_date,
    run_time,
    track,
    status,
    detail,
    created_at,
    updated_at
FROM reminder_runs";

/// Reminder settings and the run log that makes sweeps idempotent.
pub struct SqliteReminderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReminderRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn upsert_settings(&self, settings: &ReminderSettings) -> CoreResult<()> {
        self.conn.execute(
            "INSERT INTO reminder_settings (
                kid_id, daily_jobs_enabled, daily_jobs_time, habits_enabled, habits_time,
                timezone, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(kid_id) DO UPDATE SET
                daily_jobs_enabled = excluded.daily_jobs_enabled,
                daily_jobs_time = excluded.daily_jobs_time,
                habits_enabled = excluded.habits_enabled,
                habits_time = excluded.habits_time,
                timezone = excluded.timezone,
                updated_at = excluded.updated_at",
            params![
                settings.kid_id.to_string(),
                settings.daily_jobs.enabled,
                settings.daily_jobs.normalized_time(),
                settings.habits.enabled,
                settings.habits.normalized_time(),
                settings.timezone,
                settings.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_settings(&self, kid_id: KidId) -> CoreResult<Option<ReminderSettings>> {
        let sql = format!("{SETTINGS_SELECT_SQL} WHERE kid_id = ?1");
        let settings = self
            .conn
            .query_row(&sql, [kid_id.to_string()], map_settings_row)
            .optional()?;
        Ok(settings)
    }

    /// Settings of every kid with at least one enabled track.
    pub fn list_enabled_settings(&self) -> CoreResult<Vec<ReminderSettings>> {
        let sql = format!(
            "{SETTINGS_SELECT_SQL}
             WHERE daily_jobs_enabled = 1 OR habits_enabled = 1
             ORDER BY kid_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_settings_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn find_run(
        &self,
        kid_id: KidId,
        run_date: NaiveDate,
        run_time: &str,
        track: ReminderTrack,
    ) -> CoreResult<Option<ReminderRun>> {
        let sql = format!(
            "{RUN_SELECT_SQL}
             WHERE kid_id = ?1 AND run_date = ?2 AND run_time = ?3 AND track = ?4"
        );
        let run = self
            .conn
            .query_row(
                &sql,
                params![kid_id.to_string(), run_date, run_time, track.as_str()],
                map_run_row,
            )
            .optional()?;
        Ok(run)
    }

    /// Inserts the run unless one already exists for its key.
    ///
    /// Returns false when another invocation claimed the slot first.
    pub fn claim_run(&self, run: &ReminderRun) -> CoreResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO reminder_runs (
                id, kid_id, run_date, run_time, track, status, detail, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.id.to_string(),
                run.kid_id.to_string(),
                run.run_date,
                run.run_time,
                run.track.as_str(),
                run.status.as_str(),
                run.detail,
                run.created_at,
                run.updated_at,
            ],
        )?;
        Ok(inserted == 1)
    }

    pub fn update_run_status(
        &self,
        run: &ReminderRun,
        status: RunStatus,
        detail: Option<&str>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.conn.execute(
            "UPDATE reminder_runs SET status = ?2, detail = ?3, updated_at = ?4 WHERE id = ?1",
            params![run.id.to_string(), status.as_str(), detail, now],
        )?;
        Ok(())
    }

    pub fn list_runs(&self, kid_id: KidId) -> CoreResult<Vec<ReminderRun>> {
        let sql = format!(
            "{RUN_SELECT_SQL} WHERE kid_id = ?1 ORDER BY run_date ASC, run_time ASC, track ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([kid_id.to_string()], map_run_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn time_col(row: &Row<'_>, column: &str) -> rusqlite::Result<NaiveTime> {
    let text: String = row.get(column)?;
    NaiveTime::parse_from_str(&text, "%H:%M").map_err(|err| conversion_error(row, column, err))
}

fn map_settings_row(row: &Row<'_>) -> rusqlite::Result<ReminderSettings> {
    Ok(ReminderSettings {
        kid_id: uuid_col(row, "kid_id")?,
        daily_jobs: TrackSettings {
            enabled: row.get("daily_jobs_enabled")?,
            time: time_col(row, "daily_jobs_time")?,
        },
        habits: TrackSettings {
            enabled: row.get("habits_enabled")?,
            time: time_col(row, "habits_time")?,
        },
        timezone: row.get("timezone")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_run_row(row: &Row<'_>) -> rusqlite::Result<ReminderRun> {
    Ok(ReminderRun {
        id: uuid_col(row, "id")?,
        kid_id: uuid_col(row, "kid_id")?,
        run_date: row.get("run_date")?,
        run_time: row.get("run_time")?,
        track: label_col(row, "track")?,
        status: label_col(row, "status")?,
        detail: row.get("detail")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

