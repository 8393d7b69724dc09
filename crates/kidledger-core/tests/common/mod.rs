#![allow(dead_code)]

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use kidledger_core::{
    open_db_in_memory, ChoreDraft, ChoreService, DispatchError, FixedClock, Notifier,
    ReminderNotification,
};
use kidledger_domain::{Actor, Chore, ChoreType, KidId, Money};
use rusqlite::Connection;
use uuid::Uuid;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .expect("valid timestamp")
}

pub fn clock_on(y: i32, m: u32, d: u32) -> FixedClock {
    FixedClock::on(date(y, m, d))
}

pub struct Household {
    pub conn: Connection,
    pub kid: KidId,
    pub guardian: Actor,
}

impl Household {
    pub fn new() -> Self {
        Self {
            conn: open_db_in_memory().expect("open in-memory db"),
            kid: Uuid::new_v4(),
            guardian: Actor::guardian(Uuid::new_v4()),
        }
    }

    pub fn kid_actor(&self) -> Actor {
        Actor::kid(self.kid)
    }

    /// Creates a chore and assigns it to the kid, both starting on `starts_on`.
    pub fn assigned_chore(
        &mut self,
        label: &str,
        chore_type: ChoreType,
        amount: Money,
        starts_on: NaiveDate,
    ) -> Chore {
        let clock = FixedClock::on(starts_on);
        let chore = ChoreService::create_chore(
            &mut self.conn,
            &clock,
            ChoreDraft::new(label, chore_type, starts_on).with_amount(amount),
            self.guardian,
        )
        .expect("create chore");
        ChoreService::assign(&mut self.conn, &clock, chore.id, self.kid, starts_on)
            .expect("assign chore");
        chore
    }
}

/// Notifier that keeps everything it was asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<ReminderNotification>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<ReminderNotification> {
        self.sent.lock().expect("notifier lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, notification: &ReminderNotification) -> Result<(), DispatchError> {
        if self.fail {
            return Err(DispatchError("push gateway unavailable".into()));
        }
        self.sent
            .lock()
            .expect("notifier lock")
            .push(notification.clone());
        Ok(())
    }
}
