mod common;

use common::{clock_on, date, Household};
use kidledger_core::{Clock, CoreError, LedgerService, ManualPosting};
use kidledger_domain::{EntryType, LedgerEntry, Money, SourceRef};
use uuid::Uuid;

#[test]
fn withdrawals_are_always_stored_negative() {
    let mut home = Household::new();
    let clock = clock_on(2025, 3, 1);

    LedgerService::deposit(
        &mut home.conn,
        &clock,
        ManualPosting::new(home.kid, Money::from_cents(-1500), date(2025, 3, 1)),
        home.guardian,
    )
    .unwrap();
    let withdrawal = LedgerService::withdraw(
        &mut home.conn,
        &clock,
        ManualPosting::new(home.kid, Money::from_cents(400), date(2025, 3, 2))
            .with_notes("Lego"),
        home.guardian,
    )
    .unwrap();

    assert_eq!(withdrawal.amount, Money::from_cents(-400));
    assert_eq!(withdrawal.entry_type, EntryType::Withdrawal);
    assert_eq!(
        LedgerService::balance(&home.conn, home.kid).unwrap(),
        Money::from_cents(1100)
    );
}

#[test]
fn zero_amount_deposit_is_rejected() {
    let mut home = Household::new();
    let err = LedgerService::deposit(
        &mut home.conn,
        &clock_on(2025, 3, 1),
        ManualPosting::new(home.kid, Money::ZERO, date(2025, 3, 1)),
        home.guardian,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[test]
fn starting_balance_posts_the_delta() {
    let mut home = Household::new();
    let clock = clock_on(2025, 3, 1);
    LedgerService::deposit(
        &mut home.conn,
        &clock,
        ManualPosting::new(home.kid, Money::from_major(12), date(2025, 3, 1)),
        home.guardian,
    )
    .unwrap();

    let adjustment = LedgerService::set_starting_balance(
        &mut home.conn,
        &clock,
        ManualPosting::new(home.kid, Money::from_major(20), date(2025, 3, 1)),
        home.guardian,
    )
    .unwrap();

    assert_eq!(adjustment.amount, Money::from_major(8));
    assert_eq!(
        LedgerService::balance(&home.conn, home.kid).unwrap(),
        Money::from_major(20)
    );

    let unchanged = LedgerService::set_starting_balance(
        &mut home.conn,
        &clock,
        ManualPosting::new(home.kid, Money::from_major(20), date(2025, 3, 2)),
        home.guardian,
    )
    .unwrap();
    assert_eq!(unchanged.amount, Money::ZERO);
    assert_eq!(
        LedgerService::entries(&home.conn, home.kid, None, None)
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn second_posting_from_same_source_and_day_conflicts() {
    let mut home = Household::new();
    let clock = clock_on(2025, 3, 1);
    let source = SourceRef::pocket_money_rule(Uuid::new_v4());
    let entry = |amount| {
        LedgerEntry::new(
            home.kid,
            EntryType::PocketMoney,
            amount,
            date(2025, 3, 3),
            home.guardian.user_id,
            clock.now(),
        )
        .with_source(source)
    };

    let first = LedgerService::post(&mut home.conn, entry(Money::from_major(5))).unwrap();
    let err = LedgerService::post(&mut home.conn, entry(Money::from_major(5))).unwrap_err();
    assert!(err.is_duplicate());

    // Once the first is deleted the slot is free again.
    assert!(LedgerService::soft_delete(&mut home.conn, &clock, first.id).unwrap());
    assert!(!LedgerService::soft_delete(&mut home.conn, &clock, first.id).unwrap());
    LedgerService::post(&mut home.conn, entry(Money::from_major(6))).unwrap();
    assert_eq!(
        LedgerService::balance(&home.conn, home.kid).unwrap(),
        Money::from_major(6)
    );
}

#[test]
fn entries_are_filtered_by_date_range() {
    let mut home = Household::new();
    let clock = clock_on(2025, 3, 1);
    for day in [1, 10, 20] {
        LedgerService::deposit(
            &mut home.conn,
            &clock,
            ManualPosting::new(home.kid, Money::from_major(1), date(2025, 3, day)),
            home.guardian,
        )
        .unwrap();
    }

    let entries =
        LedgerService::entries(&home.conn, home.kid, Some(date(2025, 3, 5)), Some(date(2025, 3, 20)))
            .unwrap();
    let days: Vec<_> = entries.iter().map(|entry| entry.entry_date).collect();
    assert_eq!(days, vec![date(2025, 3, 10), date(2025, 3, 20)]);
}

#[test]
fn deleting_unknown_entry_is_not_found() {
    let mut home = Household::new();
    let missing = Uuid::new_v4();
    let err = LedgerService::soft_delete(&mut home.conn, &clock_on(2025, 3, 1), missing).unwrap_err();
    assert!(matches!(err, CoreError::LedgerEntryNotFound(id) if id == missing));
}
