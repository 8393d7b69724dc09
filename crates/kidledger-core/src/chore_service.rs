//! Chore lifecycle and the per-day required-chore queries.

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use kidledger_domain::{
    required_chores, Actor, AssignedChore, Chore, ChoreAssignment, ChoreType, KidId, Money,
};

use crate::db::immediate;
use crate::repo::SqliteChoreRepository;
use crate::{Clock, CoreError, CoreResult};

const MAX_LABEL_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoreDraft {
    pub label: String,
    pub chore_type: ChoreType,
    #[serde(default)]
    pub amount: Money,
    #[serde(default)]
    pub sort_order: i32,
    pub starts_on: NaiveDate,
}

impl ChoreDraft {
    pub fn new(label: impl Into<String>, chore_type: ChoreType, starts_on: NaiveDate) -> Self {
        Self {
            label: label.into(),
            chore_type,
            amount: Money::ZERO,
            sort_order: 0,
            starts_on,
        }
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

pub struct ChoreService;

impl ChoreService {
    pub fn create_chore(
        conn: &mut Connection,
        clock: &dyn Clock,
        draft: ChoreDraft,
        actor: Actor,
    ) -> CoreResult<Chore> {
        let label = draft.label.trim();
        if label.is_empty() {
            return Err(CoreError::Validation("chore label must not be empty".into()));
        }
        if label.chars().count() > MAX_LABEL_LEN {
            return Err(CoreError::Validation(format!(
                "chore label exceeds {MAX_LABEL_LEN} characters"
            )));
        }
        let now = clock.now();
        let chore = Chore {
            id: Uuid::new_v4(),
            owner_id: actor.user_id,
            label: label.to_string(),
            chore_type: draft.chore_type,
            amount: draft.amount,
            is_active: true,
            sort_order: draft.sort_order,
            starts_on: draft.starts_on,
            disabled_on: None,
            created_at: now,
            updated_at: now,
        };
        let tx = immediate(conn)?;
        SqliteChoreRepository::new(&tx).insert_chore(&chore)?;
        tx.commit()?;
        info!(chore_id = %chore.id, chore_type = %chore.chore_type, "chore created");
        Ok(chore)
    }

    /// Switches a chore off after `on`. It stays required on `on` itself.
    pub fn disable_chore(
        conn: &mut Connection,
        clock: &dyn Clock,
        chore_id: Uuid,
        on: NaiveDate,
    ) -> CoreResult<Chore> {
        let tx = immediate(conn)?;
        let chore = {
            let repo = SqliteChoreRepository::new(&tx);
            let mut chore = repo
                .get_chore(chore_id)?
                .ok_or(CoreError::ChoreNotFound(chore_id))?;
            ensure_not_before(on, chore.starts_on)?;
            chore.is_active = false;
            chore.disabled_on = Some(on);
            chore.updated_at = clock.now();
            repo.update_chore(&chore)?;
            chore
        };
        tx.commit()?;
        info!(chore_id = %chore_id, disabled_on = %on, "chore disabled");
        Ok(chore)
    }

    pub fn assign(
        conn: &mut Connection,
        clock: &dyn Clock,
        chore_id: Uuid,
        kid_id: KidId,
        starts_on: NaiveDate,
    ) -> CoreResult<ChoreAssignment> {
        if kid_id.is_nil() {
            return Err(CoreError::Validation("kid id must not be nil".into()));
        }
        let tx = immediate(conn)?;
        let assignment = {
            let repo = SqliteChoreRepository::new(&tx);
            repo.get_chore(chore_id)?
                .ok_or(CoreError::ChoreNotFound(chore_id))?;
            let assignment = ChoreAssignment {
                id: Uuid::new_v4(),
                chore_id,
                kid_id,
                is_enabled: true,
                starts_on,
                disabled_on: None,
                created_at: clock.now(),
            };
            repo.insert_assignment(&assignment)?;
            assignment
        };
        tx.commit()?;
        info!(chore_id = %chore_id, kid_id = %kid_id, starts_on = %starts_on, "chore assigned");
        Ok(assignment)
    }

    /// Ends an assignment after `on`.
    pub fn unassign(
        conn: &mut Connection,
        assignment_id: Uuid,
        on: NaiveDate,
    ) -> CoreResult<ChoreAssignment> {
        let tx = immediate(conn)?;
        let assignment = {
            let repo = SqliteChoreRepository::new(&tx);
            let mut assignment = repo
                .get_assignment(assignment_id)?
                .ok_or(CoreError::AssignmentNotFound(assignment_id))?;
            ensure_not_before(on, assignment.starts_on)?;
            assignment.is_enabled = false;
            assignment.disabled_on = Some(on);
            repo.update_assignment(&assignment)?;
            assignment
        };
        tx.commit()?;
        info!(assignment_id = %assignment_id, disabled_on = %on, "chore unassigned");
        Ok(assignment)
    }

    pub fn assigned_chores(conn: &Connection, kid_id: KidId) -> CoreResult<Vec<AssignedChore>> {
        SqliteChoreRepository::new(conn).list_assigned_chores(kid_id)
    }

    /// Chores of one type the kid owes on `date`, in display order.
    pub fn required_chores(
        conn: &Connection,
        kid_id: KidId,
        date: NaiveDate,
        chore_type: ChoreType,
    ) -> CoreResult<Vec<Chore>> {
        let assigned = Self::assigned_chores(conn, kid_id)?;
        Ok(required_chores(&assigned, date, chore_type)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn required_daily_chores(
        conn: &Connection,
        kid_id: KidId,
        date: NaiveDate,
    ) -> CoreResult<Vec<Chore>> {
        Self::required_chores(conn, kid_id, date, ChoreType::Daily)
    }
}

fn ensure_not_before(on: NaiveDate, starts_on: NaiveDate) -> CoreResult<()> {
    if on < starts_on {
        return Err(CoreError::Validation(format!(
            "disable date {on} is before start date {starts_on}"
        )));
    }
    Ok(())
}
