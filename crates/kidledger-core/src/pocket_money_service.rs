//! Pocket-money recurrence engine: rule maintenance and catch-up posting.

use chrono::{NaiveDate, Weekday};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use kidledger_domain::{
    Actor, EntryType, Frequency, KidId, LedgerEntry, Money, PocketMoneyRule, SourceRef,
};

use crate::db::immediate;
use crate::repo::{SqliteLedgerRepository, SqlitePocketMoneyRuleRepository};
use crate::{Clock, CoreError, CoreResult};

/// Guardian-supplied rule fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub amount: Money,
    pub frequency: Frequency,
    #[serde(default)]
    pub day_of_week: Option<Weekday>,
    #[serde(default)]
    pub day_of_month: Option<u32>,
    pub start_date: NaiveDate,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl RuleDraft {
    pub fn weekly(amount: Money, day: Weekday, start_date: NaiveDate) -> Self {
        Self {
            amount,
            frequency: Frequency::Weekly,
            day_of_week: Some(day),
            day_of_month: None,
            start_date,
            is_active: true,
        }
    }

    pub fn fortnightly(amount: Money, day: Weekday, start_date: NaiveDate) -> Self {
        Self {
            frequency: Frequency::Fortnightly,
            ..Self::weekly(amount, day, start_date)
        }
    }

    pub fn monthly(amount: Money, day_of_month: u32, start_date: NaiveDate) -> Self {
        Self {
            amount,
            frequency: Frequency::Monthly,
            day_of_week: None,
            day_of_month: Some(day_of_month),
            start_date,
            is_active: true,
        }
    }

    fn validate(&self) -> CoreResult<()> {
        if self.amount <= Money::ZERO {
            return Err(CoreError::Validation(
                "pocket money amount must be positive".into(),
            ));
        }
        if let Some(day) = self.day_of_month {
            if !(1..=31).contains(&day) {
                return Err(CoreError::Validation(format!(
                    "day of month {day} is outside 1..=31"
                )));
            }
        }
        Ok(())
    }
}

/// Result of running one rule up to a through date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingOutcome {
    pub rule_id: Uuid,
    pub kid_id: KidId,
    /// Due dates found in the window.
    pub due: Vec<NaiveDate>,
    /// Dates that received a new entry.
    pub posted: Vec<NaiveDate>,
    /// Dates that already had an entry from this rule.
    pub already_present: Vec<NaiveDate>,
    /// Cursor after the run.
    pub cursor: Option<NaiveDate>,
}

impl PostingOutcome {
    fn idle(rule: &PocketMoneyRule) -> Self {
        Self {
            rule_id: rule.id,
            kid_id: rule.kid_id,
            due: Vec::new(),
            posted: Vec::new(),
            already_present: Vec::new(),
            cursor: rule.last_posted_on,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PocketMoneyRunSummary {
    pub rules_processed: usize,
    pub entries_posted: usize,
    pub errors: usize,
}

pub struct PocketMoneyService;

impl PocketMoneyService {
    /// Creates the kid's rule or replaces its schedule. The cursor survives edits.
    pub fn upsert_rule(
        conn: &mut Connection,
        clock: &dyn Clock,
        kid_id: KidId,
        draft: RuleDraft,
        actor: Actor,
    ) -> CoreResult<PocketMoneyRule> {
        draft.validate()?;
        let now = clock.now();
        let candidate = PocketMoneyRule {
            id: Uuid::new_v4(),
            kid_id,
            amount: draft.amount,
            frequency: draft.frequency,
            day_of_week: draft.day_of_week,
            day_of_month: draft.day_of_month,
            start_date: draft.start_date,
            last_posted_on: None,
            is_active: draft.is_active,
            created_by: actor.user_id,
            created_at: now,
            updated_at: now,
        };
        if let Err(err) = candidate.schedule() {
            warn!(kid_id = %kid_id, %err, "saving misconfigured pocket money rule");
        }

        let tx = immediate(conn)?;
        let rule = SqlitePocketMoneyRuleRepository::new(&tx).upsert(&candidate)?;
        tx.commit()?;
        info!(
            kid_id = %kid_id,
            rule_id = %rule.id,
            frequency = %rule.frequency,
            amount = %rule.amount,
            "pocket money rule saved"
        );
        Ok(rule)
    }

    pub fn set_rule_active(
        conn: &mut Connection,
        clock: &dyn Clock,
        kid_id: KidId,
        is_active: bool,
    ) -> CoreResult<PocketMoneyRule> {
        let tx = immediate(conn)?;
        let rule = {
            let repo = SqlitePocketMoneyRuleRepository::new(&tx);
            let rule = repo
                .get_for_kid(kid_id)?
                .ok_or(CoreError::NoRuleForKid(kid_id))?;
            repo.set_active(rule.id, is_active, clock.now())?;
            repo.get(rule.id)?.ok_or(CoreError::RuleNotFound(rule.id))?
        };
        tx.commit()?;
        Ok(rule)
    }

    pub fn rule_for_kid(conn: &Connection, kid_id: KidId) -> CoreResult<Option<PocketMoneyRule>> {
        SqlitePocketMoneyRuleRepository::new(conn).get_for_kid(kid_id)
    }

    /// Posts every due date of one rule up to `through` in a single transaction.
    ///
    /// Rerunning the same window posts nothing and leaves the cursor alone.
    /// A concurrent run that wins the race turns this run into a no-op.
    pub fn run_for_rule(
        conn: &mut Connection,
        clock: &dyn Clock,
        rule_id: Uuid,
        through: NaiveDate,
    ) -> CoreResult<PostingOutcome> {
        let tx = immediate(conn)?;
        let outcome = {
            let rules = SqlitePocketMoneyRuleRepository::new(&tx);
            let rule = rules.get(rule_id)?.ok_or(CoreError::RuleNotFound(rule_id))?;
            match post_due_dates(&tx, clock, &rule, through) {
                Ok(outcome) => outcome,
                Err(err) if err.is_duplicate() => {
                    debug!(rule_id = %rule_id, %err, "posting raced with another run");
                    return Ok(PostingOutcome::idle(&rule));
                }
                Err(err) => return Err(err),
            }
        };
        tx.commit()?;
        if !outcome.posted.is_empty() {
            info!(
                rule_id = %outcome.rule_id,
                kid_id = %outcome.kid_id,
                posted = outcome.posted.len(),
                cursor = ?outcome.cursor,
                "pocket money posted"
            );
        }
        Ok(outcome)
    }

    pub fn run_for_kid(
        conn: &mut Connection,
        clock: &dyn Clock,
        kid_id: KidId,
        through: NaiveDate,
    ) -> CoreResult<PostingOutcome> {
        let rule = Self::rule_for_kid(conn, kid_id)?.ok_or(CoreError::NoRuleForKid(kid_id))?;
        Self::run_for_rule(conn, clock, rule.id, through)
    }

    /// Batch catch-up over every active rule. Failures are counted, not raised.
    pub fn run_all(
        conn: &mut Connection,
        clock: &dyn Clock,
        through: NaiveDate,
    ) -> CoreResult<PocketMoneyRunSummary> {
        let rules = SqlitePocketMoneyRuleRepository::new(conn).list_active()?;
        let mut summary = PocketMoneyRunSummary::default();
        for rule in rules {
            summary.rules_processed += 1;
            match Self::run_for_rule(conn, clock, rule.id, through) {
                Ok(outcome) => summary.entries_posted += outcome.posted.len(),
                Err(err) => {
                    summary.errors += 1;
                    warn!(rule_id = %rule.id, kid_id = %rule.kid_id, %err, "pocket money run failed");
                }
            }
        }
        info!(
            through = %through,
            rules = summary.rules_processed,
            posted = summary.entries_posted,
            errors = summary.errors,
            "pocket money catch-up complete"
        );
        Ok(summary)
    }
}

fn post_due_dates(
    conn: &Connection,
    clock: &dyn Clock,
    rule: &PocketMoneyRule,
    through: NaiveDate,
) -> CoreResult<PostingOutcome> {
    let mut outcome = PostingOutcome::idle(rule);
    outcome.due = match rule.due_dates(through) {
        Ok(due) => due,
        Err(err) => {
            warn!(rule_id = %rule.id, kid_id = %rule.kid_id, %err, "misconfigured pocket money rule");
            return Ok(outcome);
        }
    };
    let Some(&latest) = outcome.due.last() else {
        return Ok(outcome);
    };

    let ledger = SqliteLedgerRepository::new(conn);
    let source = SourceRef::pocket_money_rule(rule.id);
    let now = clock.now();
    for &date in &outcome.due {
        if ledger
            .find_active_by_source(rule.kid_id, source, date)?
            .is_some()
        {
            outcome.already_present.push(date);
            continue;
        }
        let entry = LedgerEntry::new(
            rule.kid_id,
            EntryType::PocketMoney,
            rule.amount,
            date,
            rule.created_by,
            now,
        )
        .with_source(source)
        .with_notes(Some(format!("Pocket money ({})", rule.frequency)));
        ledger.insert(&entry)?;
        outcome.posted.push(date);
    }

    SqlitePocketMoneyRuleRepository::new(conn).advance_cursor(rule.id, latest, now)?;
    outcome.cursor = Some(latest);
    Ok(outcome)
}
