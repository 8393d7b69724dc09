use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use kidledger::config::Config;
use kidledger::core::{
    ChoreDraft, ChoreService, DispatchError, FixedClock, Notifier, PocketMoneyService,
    ReminderNotification, RuleDraft,
};
use kidledger::domain::{Actor, ChoreType, EntryStatus, Money, TrackSettings, YearMonth};
use kidledger::{init, KidLedger};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Clone, Default)]
struct SharedNotifier(Arc<Mutex<Vec<ReminderNotification>>>);

impl Notifier for SharedNotifier {
    fn send(&self, notification: &ReminderNotification) -> Result<(), DispatchError> {
        self.0.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[test]
fn kid_entries_follow_the_configured_review_policy() {
    init();
    let mut config = Config::default();
    config.entries.auto_approve_kid_entries = false;
    let mut ledger = KidLedger::in_memory(config)
        .unwrap()
        .with_clock(Box::new(FixedClock::on(date(2025, 6, 2))));
    let kid = Uuid::new_v4();
    let guardian = Actor::guardian(Uuid::new_v4());

    let clock = FixedClock::on(date(2025, 6, 1));
    let chore = ChoreService::create_chore(
        ledger.connection_mut(),
        &clock,
        ChoreDraft::new("Walk the dog", ChoreType::Bonus, date(2025, 6, 1))
            .with_amount(Money::from_major(2)),
        guardian,
    )
    .unwrap();
    ChoreService::assign(ledger.connection_mut(), &clock, chore.id, kid, date(2025, 6, 1)).unwrap();

    let by_kid = ledger
        .log_chore(kid, chore.id, date(2025, 6, 2), None, Actor::kid(kid))
        .unwrap();
    let by_guardian = ledger
        .log_chore(kid, chore.id, date(2025, 6, 1), None, guardian)
        .unwrap();

    assert_eq!(by_kid.status, EntryStatus::Pending);
    assert_eq!(by_guardian.status, EntryStatus::Approved);
    assert_eq!(ledger.balance(kid).unwrap(), Money::from_major(2));
}

#[test]
fn pocket_money_defaults_to_today() {
    let mut ledger = KidLedger::in_memory(Config::default())
        .unwrap()
        .with_clock(Box::new(FixedClock::on(date(2024, 1, 10))));
    let kid = Uuid::new_v4();
    let clock = FixedClock::on(date(2024, 1, 1));
    PocketMoneyService::upsert_rule(
        ledger.connection_mut(),
        &clock,
        kid,
        RuleDraft::weekly(Money::from_major(10), Weekday::Mon, date(2024, 1, 1)),
        Actor::guardian(Uuid::new_v4()),
    )
    .unwrap();

    let summary = ledger.run_pocket_money(None).unwrap();

    assert_eq!(summary.entries_posted, 1);
    assert_eq!(ledger.balance(kid).unwrap(), Money::from_major(10));
    assert_eq!(ledger.ledger_entries(kid).unwrap()[0].entry_date, date(2024, 1, 8));
}

#[test]
fn reminders_use_configured_links_and_timezone() {
    let mut config = Config::default();
    config.default_timezone = "America/New_York".into();
    config.reminders.daily_jobs_link = "/app/jobs".into();
    let notifier = SharedNotifier::default();
    // 22:30 UTC is 18:30 in New York during daylight saving time.
    let now = Utc.with_ymd_and_hms(2025, 6, 3, 22, 30, 0).single().unwrap();
    let mut ledger = KidLedger::in_memory(config)
        .unwrap()
        .with_clock(Box::new(FixedClock::new(now)))
        .with_notifier(Box::new(notifier.clone()));
    let kid = Uuid::new_v4();
    let clock = FixedClock::on(date(2025, 6, 1));
    let chore = ChoreService::create_chore(
        ledger.connection_mut(),
        &clock,
        ChoreDraft::new("Homework", ChoreType::Daily, date(2025, 6, 1)),
        Actor::guardian(Uuid::new_v4()),
    )
    .unwrap();
    ChoreService::assign(ledger.connection_mut(), &clock, chore.id, kid, date(2025, 6, 1)).unwrap();

    let at = NaiveTime::from_hms_opt(18, 30, 0).unwrap();
    let settings = ledger
        .set_reminders(
            kid,
            TrackSettings::enabled_at(at),
            TrackSettings::disabled_at(at),
            None,
        )
        .unwrap();
    assert_eq!(settings.timezone, "America/New_York");

    let summary = ledger.sweep_reminders().unwrap();

    assert_eq!(summary.sent, 1);
    let sent = notifier.0.lock().unwrap().clone();
    assert_eq!(sent[0].link_url, "/app/jobs");
    assert_eq!(sent[0].dedupe_key, "kids-reminder:2025-06-03:18:30:daily_jobs");
}

#[test]
fn projection_defaults_to_current_month() {
    let ledger = KidLedger::in_memory(Config::default())
        .unwrap()
        .with_clock(Box::new(FixedClock::on(date(2025, 2, 14))));

    let projection = ledger.project_month(Uuid::new_v4(), None).unwrap();

    assert_eq!(projection.summary.month, YearMonth::new(2025, 2).unwrap());
    assert_eq!(projection.days.len(), 28);
    assert_eq!(projection.summary.projected_payout, Money::ZERO);
}
