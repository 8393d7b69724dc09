use chrono::{DateTime, NaiveDate, Utc, Weekday};
use kidledger_domain::{KidId, PocketMoneyRule};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{conversion_error, label_col, money_col, uuid_col};
use crate::{CoreError, CoreResult};

const RULE_SELECT_SQL: &str = "SELECT
    id,
    kid_id,
    amount_cents,
    frequency,
    day_of_week,
    day_of_month,
    start_date,
    last_posted_on,
    is_active,
    created_by,
    created_at,
    updated_at
FROM pocket_money_rules";

pub struct SqlitePocketMoneyRuleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePocketMoneyRuleRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, id: Uuid) -> CoreResult<Option<PocketMoneyRule>> {
        let sql = format!("{RULE_SELECT_SQL} WHERE id = ?1");
        let rule = self
            .conn
            .query_row(&sql, [id.to_string()], map_rule_row)
            .optional()?;
        Ok(rule)
    }

    pub fn get_for_kid(&self, kid_id: KidId) -> CoreResult<Option<PocketMoneyRule>> {
        let sql = format!("{RULE_SELECT_SQL} WHERE kid_id = ?1");
        let rule = self
            .conn
            .query_row(&sql, [kid_id.to_string()], map_rule_row)
            .optional()?;
        Ok(rule)
    }

    pub fn list_active(&self) -> CoreResult<Vec<PocketMoneyRule>> {
        let sql = format!("{RULE_SELECT_SQL} WHERE is_active = 1 ORDER BY created_at ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], map_rule_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Inserts the kid's rule or replaces its schedule in place.
    ///
    /// An existing rule keeps its id, creator and posting cursor.
    pub fn upsert(&self, rule: &PocketMoneyRule) -> CoreResult<PocketMoneyRule> {
        self.conn.execute(
            "INSERT INTO pocket_money_rules (
                id, kid_id, amount_cents, frequency, day_of_week, day_of_month,
                start_date, last_posted_on, is_active, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(kid_id) DO UPDATE SET
                amount_cents = excluded.amount_cents,
                frequency = excluded.frequency,
                day_of_week = excluded.day_of_week,
                day_of_month = excluded.day_of_month,
                start_date = excluded.start_date,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at",
            params![
                rule.id.to_string(),
                rule.kid_id.to_string(),
                rule.amount.cents(),
                rule.frequency.as_str(),
                rule.day_of_week.map(|weekday| weekday.to_string()),
                rule.day_of_month,
                rule.start_date,
                rule.last_posted_on,
                rule.is_active,
                rule.created_by.to_string(),
                rule.created_at,
                rule.updated_at,
            ],
        )?;
        self.get_for_kid(rule.kid_id)?
            .ok_or(CoreError::NoRuleForKid(rule.kid_id))
    }

    /// Moves the cursor forward. Never moves it backwards.
    pub fn advance_cursor(
        &self,
        id: Uuid,
        posted_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let changed = self.conn.execute(
            "UPDATE pocket_money_rules SET last_posted_on = ?2, updated_at = ?3
             WHERE id = ?1 AND (last_posted_on IS NULL OR last_posted_on < ?2)",
            params![id.to_string(), posted_on, now],
        )?;
        Ok(changed > 0)
    }

    pub fn set_active(&self, id: Uuid, is_active: bool, now: DateTime<Utc>) -> CoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE pocket_money_rules SET is_active = ?2, updated_at = ?3 WHERE id = ?1",
            params![id.to_string(), is_active, now],
        )?;
        if changed == 0 {
            return Err(CoreError::RuleNotFound(id));
        }
        Ok(())
    }
}

fn map_rule_row(row: &Row<'_>) -> rusqlite::Result<PocketMoneyRule> {
    let day_of_week = row
        .get::<_, Option<String>>("day_of_week")?
        .map(|text| {
            text.parse::<Weekday>()
                .map_err(|err| conversion_error(row, "day_of_week", err))
        })
        .transpose()?;
    Ok(PocketMoneyRule {
        id: uuid_col(row, "id")?,
        kid_id: uuid_col(row, "kid_id")?,
        amount: money_col(row, "amount_cents")?,
        frequency: label_col(row, "frequency")?,
        day_of_week,
        day_of_month: row.get("day_of_month")?,
        start_date: row.get("start_date")?,
        last_posted_on: row.get("last_posted_on")?,
        is_active: row.get("is_active")?,
        created_by: uuid_col(row, "created_by")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
