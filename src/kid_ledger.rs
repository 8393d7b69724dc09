//! The [`KidLedger`] facade: one connection, one clock, one notifier and the
//! loaded [`Config`], with config-driven defaults applied to core operations.

use std::fs;

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use kidledger_config::Config;
use kidledger_core::{
    open_db, open_db_in_memory, ChoreEntryService, Clock, LedgerService, NewChoreEntry, Notifier,
    PocketMoneyRunSummary, PocketMoneyService, ProjectionService, ReminderLinks, ReminderService,
    ReminderSettingsDraft, ReminderSweepSummary, SystemClock,
};
use kidledger_domain::{
    Actor, ActorRole, ChoreEntry, KidId, LedgerEntry, Money, MonthProjection, ReminderSettings,
    ReviewPolicy, TrackSettings, YearMonth,
};

use crate::errors::KidLedgerResult;
use crate::TracingNotifier;

pub struct KidLedger {
    conn: Connection,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
    config: Config,
}

impl KidLedger {
    /// Opens (creating if needed) the database named by `config`.
    pub fn open(config: Config) -> KidLedgerResult<Self> {
        let path = config.resolve_database_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = open_db(&path)?;
        info!(path = %path.display(), "kidledger opened");
        Ok(Self::from_connection(conn, config))
    }

    pub fn in_memory(config: Config) -> KidLedgerResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?, config))
    }

    fn from_connection(conn: Connection, config: Config) -> Self {
        Self {
            conn,
            clock: Box::new(SystemClock),
            notifier: Box::new(TracingNotifier),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Direct access for operations the facade does not wrap.
    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Review policy for an entry logged by `actor`.
    ///
    /// Guardians never need review; kids follow `entries.auto_approve_kid_entries`.
    pub fn review_policy_for(&self, actor: Actor) -> ReviewPolicy {
        match actor.role {
            ActorRole::Kid if !self.config.entries.auto_approve_kid_entries => {
                ReviewPolicy::RequireReview
            }
            _ => ReviewPolicy::AutoApprove,
        }
    }

    pub fn log_chore(
        &mut self,
        kid_id: KidId,
        chore_id: Uuid,
        entry_date: NaiveDate,
        notes: Option<String>,
        actor: Actor,
    ) -> KidLedgerResult<ChoreEntry> {
        let policy = self.review_policy_for(actor);
        let entry = ChoreEntryService::create_entry(
            &mut self.conn,
            self.clock.as_ref(),
            NewChoreEntry {
                kid_id,
                chore_id,
                entry_date,
                notes,
            },
            policy,
            actor,
        )?;
        Ok(entry)
    }

    /// Catch-up posting for every active rule. Defaults to today.
    pub fn run_pocket_money(
        &mut self,
        through: Option<NaiveDate>,
    ) -> KidLedgerResult<PocketMoneyRunSummary> {
        let through = through.unwrap_or_else(|| self.clock.today());
        let summary = PocketMoneyService::run_all(&mut self.conn, self.clock.as_ref(), through)?;
        Ok(summary)
    }

    pub fn sweep_reminders(&self) -> KidLedgerResult<ReminderSweepSummary> {
        let summary = ReminderService::sweep(
            &self.conn,
            self.clock.as_ref(),
            self.notifier.as_ref(),
            &self.reminder_links(),
        )?;
        Ok(summary)
    }

    /// Saves reminder settings, falling back to the configured default timezone.
    pub fn set_reminders(
        &self,
        kid_id: KidId,
        daily_jobs: TrackSettings,
        habits: TrackSettings,
        timezone: Option<String>,
    ) -> KidLedgerResult<ReminderSettings> {
        let draft = ReminderSettingsDraft {
            daily_jobs,
            habits,
            timezone: timezone.unwrap_or_else(|| self.config.default_timezone.clone()),
        };
        let settings =
            ReminderService::upsert_settings(&self.conn, self.clock.as_ref(), kid_id, draft)?;
        Ok(settings)
    }

    /// Projects `month`, or the current month, using the kid's monthly rule.
    pub fn project_month(
        &self,
        kid_id: KidId,
        month: Option<YearMonth>,
    ) -> KidLedgerResult<MonthProjection> {
        let month = month.unwrap_or_else(|| YearMonth::of(self.clock.today()));
        let projection =
            ProjectionService::project_month(&self.conn, self.clock.as_ref(), kid_id, month, None)?;
        Ok(projection)
    }

    pub fn balance(&self, kid_id: KidId) -> KidLedgerResult<Money> {
        Ok(LedgerService::balance(&self.conn, kid_id)?)
    }

    pub fn ledger_entries(&self, kid_id: KidId) -> KidLedgerResult<Vec<LedgerEntry>> {
        Ok(LedgerService::entries(&self.conn, kid_id, None, None)?)
    }

    fn reminder_links(&self) -> ReminderLinks {
        ReminderLinks {
            daily_jobs: self.config.reminders.daily_jobs_link.clone(),
            habits: self.config.reminders.habits_link.clone(),
        }
    }
}
