use std::collections::BTreeMap;

use kidledger_domain::{AssignedChore, Chore, ChoreAssignment, KidId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{label_col, money_col, uuid_col};
use crate::{CoreError, CoreResult};

const CHORE_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    label,
    chore_type,
    amount_cents,
    is_active,
    sort_order,
    starts_on,
    disabled_on,
    created_at,
    updated_at
FROM chores";

const ASSIGNMENT_SELECT_SQL: &str = "SELECT
    id,
    chore_id,
    kid_id,
    is_enabled,
    starts_on,
    disabled_on,
    created_at
FROM chore_assignments";

/// Chores and their per-kid assignments.
pub struct SqliteChoreRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteChoreRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert_chore(&self, chore: &Chore) -> CoreResult<()> {
        self.conn.execute(
            "INSERT INTO chores (
                id, owner_id, label, chore_type, amount_cents, is_active, sort_order,
                starts_on, disabled_on, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                chore.id.to_string(),
                chore.owner_id.to_string(),
                chore.label,
                chore.chore_type.as_str(),
                chore.amount.cents(),
                chore.is_active,
                chore.sort_order,
                chore.starts_on,
                chore.disabled_on,
                chore.created_at,
                chore.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_chore(&self, id: Uuid) -> CoreResult<Option<Chore>> {
        let sql = format!("{CHORE_SELECT_SQL} WHERE id = ?1");
        let chore = self
            .conn
            .query_row(&sql, [id.to_string()], map_chore_row)
            .optional()?;
        Ok(chore)
    }

    pub fn update_chore(&self, chore: &Chore) -> CoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE chores SET
                label = ?2, chore_type = ?3, amount_cents = ?4, is_active = ?5,
                sort_order = ?6, starts_on = ?7, disabled_on = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                chore.id.to_string(),
                chore.label,
                chore.chore_type.as_str(),
                chore.amount.cents(),
                chore.is_active,
                chore.sort_order,
                chore.starts_on,
                chore.disabled_on,
                chore.updated_at,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::ChoreNotFound(chore.id));
        }
        Ok(())
    }

    pub fn insert_assignment(&self, assignment: &ChoreAssignment) -> CoreResult<()> {
        self.conn.execute(
            "INSERT INTO chore_assignments (
                id, chore_id, kid_id, is_enabled, starts_on, disabled_on, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                assignment.id.to_string(),
                assignment.chore_id.to_string(),
                assignment.kid_id.to_string(),
                assignment.is_enabled,
                assignment.starts_on,
                assignment.disabled_on,
                assignment.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_assignment(&self, id: Uuid) -> CoreResult<Option<ChoreAssignment>> {
        let sql = format!("{ASSIGNMENT_SELECT_SQL} WHERE id = ?1");
        let assignment = self
            .conn
            .query_row(&sql, [id.to_string()], map_assignment_row)
            .optional()?;
        Ok(assignment)
    }

    pub fn update_assignment(&self, assignment: &ChoreAssignment) -> CoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE chore_assignments SET is_enabled = ?2, starts_on = ?3, disabled_on = ?4
             WHERE id = ?1",
            params![
                assignment.id.to_string(),
                assignment.is_enabled,
                assignment.starts_on,
                assignment.disabled_on,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::AssignmentNotFound(assignment.id));
        }
        Ok(())
    }

    pub fn assignments_for(&self, chore_id: Uuid, kid_id: KidId) -> CoreResult<Vec<ChoreAssignment>> {
        let sql = format!(
            "{ASSIGNMENT_SELECT_SQL} WHERE chore_id = ?1 AND kid_id = ?2 ORDER BY starts_on ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![chore_id.to_string(), kid_id.to_string()],
            map_assignment_row,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Every chore ever assigned to the kid, grouped with its assignments.
    ///
    /// Inactive windows are included; callers filter by date.
    pub fn list_assigned_chores(&self, kid_id: KidId) -> CoreResult<Vec<AssignedChore>> {
        let sql = format!("{ASSIGNMENT_SELECT_SQL} WHERE kid_id = ?1 ORDER BY starts_on ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let assignments = stmt
            .query_map([kid_id.to_string()], map_assignment_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_chore: BTreeMap<Uuid, Vec<ChoreAssignment>> = BTreeMap::new();
        for assignment in assignments {
            by_chore
                .entry(assignment.chore_id)
                .or_default()
                .push(assignment);
        }

        let mut assigned = Vec::with_capacity(by_chore.len());
        for (chore_id, assignments) in by_chore {
            let chore = self
                .get_chore(chore_id)?
                .ok_or(CoreError::ChoreNotFound(chore_id))?;
            assigned.push(AssignedChore { chore, assignments });
        }
        assigned.sort_by(|a, b| {
            a.chore
                .sort_order
                .cmp(&b.chore.sort_order)
                .then_with(|| a.chore.label.cmp(&b.chore.label))
        });
        Ok(assigned)
    }
}

fn map_chore_row(row: &Row<'_>) -> rusqlite::Result<Chore> {
    Ok(Chore {
        id: uuid_col(row, "id")?,
        owner_id: uuid_col(row, "owner_id")?,
        label: row.get("label")?,
        chore_type: label_col(row, "chore_type")?,
        amount: money_col(row, "amount_cents")?,
        is_active: row.get("is_active")?,
        sort_order: row.get("sort_order")?,
        starts_on: row.get("starts_on")?,
        disabled_on: row.get("disabled_on")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_assignment_row(row: &Row<'_>) -> rusqlite::Result<ChoreAssignment> {
    Ok(ChoreAssignment {
        id: uuid_col(row, "id")?,
        chore_id: uuid_col(row, "chore_id")?,
        kid_id: uuid_col(row, "kid_id")?,
        is_enabled: row.get("is_enabled")?,
        starts_on: row.get("starts_on")?,
        disabled_on: row.get("disabled_on")?,
        created_at: row.get("created_at")?,
    })
}
