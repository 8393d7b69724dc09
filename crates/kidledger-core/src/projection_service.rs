//! Loads a kid's chores, entries and allowance and runs the month projection.

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::debug;

use kidledger_domain::{
    is_protected, project_month, Frequency, KidId, Money, MonthProjection, ProjectionInput,
    YearMonth,
};

use crate::repo::{SqliteChoreEntryRepository, SqliteChoreRepository, SqlitePocketMoneyRuleRepository};
use crate::{Clock, CoreError, CoreResult};

pub struct ProjectionService;

impl ProjectionService {
    /// Projects `month` as seen from the clock's today.
    ///
    /// Without an explicit allowance the kid's active monthly rule amount is used.
    pub fn project_month(
        conn: &Connection,
        clock: &dyn Clock,
        kid_id: KidId,
        month: YearMonth,
        monthly_allowance: Option<Money>,
    ) -> CoreResult<MonthProjection> {
        let today = clock.today();
        let monthly_allowance = match monthly_allowance {
            Some(amount) => amount,
            None => Self::monthly_allowance(conn, kid_id)?,
        };
        let (first, last) = month_bounds(month)?;

        let chores = SqliteChoreRepository::new(conn).list_assigned_chores(kid_id)?;
        let entry_repo = SqliteChoreEntryRepository::new(conn);
        let mut entries = entry_repo.list_for_kid(kid_id, first, last)?;
        // Future days borrow today's status, so today's entries are needed even
        // when projecting another month.
        if !month.contains(today) {
            entries.extend(entry_repo.list_for_kid(kid_id, today, today)?);
        }

        let projection = project_month(ProjectionInput {
            today,
            month,
            monthly_allowance,
            chores: &chores,
            entries: &entries,
        });
        debug!(
            kid_id = %kid_id,
            month = %month,
            missed_days = projection.summary.missed_days,
            payout = %projection.summary.projected_payout,
            "month projected"
        );
        Ok(projection)
    }

    pub fn is_protected(conn: &Connection, kid_id: KidId, date: NaiveDate) -> CoreResult<bool> {
        let chores = SqliteChoreRepository::new(conn).list_assigned_chores(kid_id)?;
        let entries = SqliteChoreEntryRepository::new(conn).list_for_kid(kid_id, date, date)?;
        Ok(is_protected(&chores, &entries, date))
    }

    /// Amount of the kid's active monthly rule, or zero.
    pub fn monthly_allowance(conn: &Connection, kid_id: KidId) -> CoreResult<Money> {
        let rule = SqlitePocketMoneyRuleRepository::new(conn).get_for_kid(kid_id)?;
        Ok(rule
            .filter(|rule| rule.is_active && rule.frequency == Frequency::Monthly)
            .map_or(Money::ZERO, |rule| rule.amount))
    }
}

fn month_bounds(month: YearMonth) -> CoreResult<(NaiveDate, NaiveDate)> {
    match (month.first_day(), month.last_day()) {
        (Some(first), Some(last)) => Ok((first, last)),
        _ => Err(CoreError::Validation(format!("month {month} is out of range"))),
    }
}
