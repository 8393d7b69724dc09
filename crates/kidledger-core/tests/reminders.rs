mod common;

use chrono::NaiveTime;
use common::{at, date, Household, RecordingNotifier};
use kidledger_core::{
    ChoreEntryService, CoreError, FixedClock, NewChoreEntry, ReminderLinks, ReminderService,
    ReminderSettingsDraft,
};
use kidledger_domain::{ChoreType, Money, ReminderTrack, ReviewPolicy, RunStatus, TrackSettings};

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn settings(timezone: &str) -> ReminderSettingsDraft {
    ReminderSettingsDraft {
        daily_jobs: TrackSettings::enabled_at(time(18, 0)),
        habits: TrackSettings::disabled_at(time(19, 0)),
        timezone: timezone.into(),
    }
}

#[test]
fn repeated_sweeps_send_one_notification() {
    let mut home = Household::new();
    home.assigned_chore("Make bed", ChoreType::Daily, Money::ZERO, date(2025, 6, 1));
    // 08:00 UTC is 18:00 in Sydney (AEST, UTC+10).
    let clock = FixedClock::new(at(2025, 6, 3, 8, 0));
    ReminderService::upsert_settings(&home.conn, &clock, home.kid, settings("Australia/Sydney"))
        .unwrap();
    let notifier = RecordingNotifier::default();
    let links = ReminderLinks::default();

    let first = ReminderService::sweep(&home.conn, &clock, &notifier, &links).unwrap();
    let second = ReminderService::sweep(&home.conn, &clock, &notifier, &links).unwrap();

    assert_eq!(first.sent, 1);
    assert_eq!(second.sent, 0);
    assert_eq!(second.skipped, 1);
    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kid_user_id, home.kid);
    assert_eq!(sent[0].kind, ReminderTrack::DailyJobs);
    assert_eq!(sent[0].link_url, "/kids/jobs");
    assert_eq!(sent[0].dedupe_key, "kids-reminder:2025-06-03:18:00:daily_jobs");
    assert!(sent[0].body.contains("Make bed"));

    let runs = ReminderService::runs_for_kid(&home.conn, home.kid).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Sent);
    assert_eq!(runs[0].run_date, date(2025, 6, 3));
    assert_eq!(runs[0].run_time, "18:00");
}

#[test]
fn completed_chores_are_skipped() {
    let mut home = Household::new();
    let chore = home.assigned_chore("Make bed", ChoreType::Daily, Money::ZERO, date(2025, 6, 1));
    let clock = FixedClock::new(at(2025, 6, 3, 18, 0));
    let actor = home.kid_actor();
    ChoreEntryService::create_entry(
        &mut home.conn,
        &clock,
        NewChoreEntry {
            kid_id: home.kid,
            chore_id: chore.id,
            entry_date: date(2025, 6, 3),
            notes: None,
        },
        ReviewPolicy::AutoApprove,
        actor,
    )
    .unwrap();
    ReminderService::upsert_settings(&home.conn, &clock, home.kid, settings("UTC")).unwrap();
    let notifier = RecordingNotifier::default();

    let summary =
        ReminderService::sweep(&home.conn, &clock, &notifier, &ReminderLinks::default()).unwrap();

    assert_eq!(summary.skipped, 1);
    assert!(notifier.sent().is_empty());
    let runs = ReminderService::runs_for_kid(&home.conn, home.kid).unwrap();
    assert_eq!(runs[0].status, RunStatus::Skipped);
}

#[test]
fn other_minutes_do_nothing() {
    let mut home = Household::new();
    home.assigned_chore("Make bed", ChoreType::Daily, Money::ZERO, date(2025, 6, 1));
    let clock = FixedClock::new(at(2025, 6, 3, 18, 1));
    ReminderService::upsert_settings(&home.conn, &clock, home.kid, settings("UTC")).unwrap();
    let notifier = RecordingNotifier::default();

    let summary =
        ReminderService::sweep(&home.conn, &clock, &notifier, &ReminderLinks::default()).unwrap();

    assert_eq!(summary.kids_evaluated, 1);
    assert_eq!(summary.sent + summary.skipped + summary.errors, 0);
    assert!(ReminderService::runs_for_kid(&home.conn, home.kid)
        .unwrap()
        .is_empty());
}

#[test]
fn habits_track_uses_habit_chores() {
    let mut home = Household::new();
    home.assigned_chore("Make bed", ChoreType::Daily, Money::ZERO, date(2025, 6, 1));
    home.assigned_chore("Practice piano", ChoreType::Habit, Money::ZERO, date(2025, 6, 1));
    let clock = FixedClock::new(at(2025, 6, 3, 19, 0));
    let draft = ReminderSettingsDraft {
        daily_jobs: TrackSettings::disabled_at(time(19, 0)),
        habits: TrackSettings::enabled_at(time(19, 0)),
        timezone: "UTC".into(),
    };
    ReminderService::upsert_settings(&home.conn, &clock, home.kid, draft).unwrap();
    let notifier = RecordingNotifier::default();
    let links = ReminderLinks {
        daily_jobs: "/jobs".into(),
        habits: "/habits".into(),
    };

    ReminderService::sweep(&home.conn, &clock, &notifier, &links).unwrap();

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, ReminderTrack::Habits);
    assert_eq!(sent[0].link_url, "/habits");
    assert!(sent[0].body.contains("Practice piano"));
    assert!(!sent[0].body.contains("Make bed"));
}

#[test]
fn dispatch_failure_is_recorded_as_error() {
    let mut home = Household::new();
    home.assigned_chore("Make bed", ChoreType::Daily, Money::ZERO, date(2025, 6, 1));
    let clock = FixedClock::new(at(2025, 6, 3, 18, 0));
    ReminderService::upsert_settings(&home.conn, &clock, home.kid, settings("UTC")).unwrap();
    let notifier = RecordingNotifier::failing();

    let summary =
        ReminderService::sweep(&home.conn, &clock, &notifier, &ReminderLinks::default()).unwrap();
    assert_eq!(summary.errors, 1);

    let runs = ReminderService::runs_for_kid(&home.conn, home.kid).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Error);
    assert!(runs[0]
        .detail
        .as_deref()
        .unwrap()
        .contains("push gateway unavailable"));

    // The failed slot is not retried.
    let retry =
        ReminderService::sweep(&home.conn, &clock, &notifier, &ReminderLinks::default()).unwrap();
    assert_eq!(retry.errors, 0);
    assert_eq!(retry.skipped, 1);
}

#[test]
fn unknown_timezone_is_rejected() {
    let home = Household::new();
    let clock = FixedClock::new(at(2025, 6, 3, 18, 0));
    let err =
        ReminderService::upsert_settings(&home.conn, &clock, home.kid, settings("Mars/Olympus"))
            .unwrap_err();
    assert!(matches!(err, CoreError::UnknownTimezone(_)));
}

#[test]
fn one_bad_kid_does_not_stop_the_sweep() {
    let mut home = Household::new();
    home.assigned_chore("Make bed", ChoreType::Daily, Money::ZERO, date(2025, 6, 1));
    let clock = FixedClock::new(at(2025, 6, 3, 18, 0));
    ReminderService::upsert_settings(&home.conn, &clock, home.kid, settings("UTC")).unwrap();
    home.conn
        .execute(
            "INSERT INTO reminder_settings (
                kid_id, daily_jobs_enabled, daily_jobs_time, habits_enabled, habits_time,
                timezone, updated_at
            ) VALUES ('00000000-0000-0000-0000-00000000000b', 1, '18:00', 0, '19:00',
                      'Nowhere/Special', '2025-06-01 00:00:00+00:00')",
            [],
        )
        .unwrap();
    let notifier = RecordingNotifier::default();

    let summary =
        ReminderService::sweep(&home.conn, &clock, &notifier, &ReminderLinks::default()).unwrap();

    assert_eq!(summary.kids_evaluated, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.sent, 1);
}
