use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, SqlErr, TransactionTrait, prelude::*,
};

use crate::{
    EngineError, ResultEngine, Shift, ShiftParticipant, ShiftStatus, StartShiftCmd,
    shift_participants, shifts,
};

use super::{Engine, with_tx};

impl Engine {
    /// Opens a shift for an active employee.
    ///
    /// The branch defaults to the employee's home branch. An employee can
    /// hold at most one active shift.
    pub async fn start_shift(&self, cmd: StartShiftCmd) -> ResultEngine<Shift> {
        if cmd.initial_cash.is_negative() {
            return Err(EngineError::Validation(
                "initial_cash must be >= 0".to_string(),
            ));
        }
        let employee = self
            .directory
            .active_employee(cmd.employee_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("employee {}", cmd.employee_id)))?;
        let branch_id = cmd.branch_id.or(employee.branch_id).ok_or_else(|| {
            EngineError::Validation(format!(
                "employee {} has no branch; branch_id is required",
                employee.id
            ))
        })?;
        if self.directory.branch(branch_id).await?.is_none() {
            return Err(EngineError::NotFound(format!("branch {branch_id}")));
        }

        let shift = Shift::new(branch_id, employee.id, cmd.initial_cash, cmd.started_at);
        with_tx!(self, |db_tx| {
            let existing = shifts::Entity::find()
                .filter(shifts::Column::EmployeeId.eq(employee.id))
                .filter(shifts::Column::Status.eq(ShiftStatus::Active.as_str()))
                .one(&db_tx)
                .await?;
            if let Some(existing) = existing {
                return Err(EngineError::Conflict(format!(
                    "employee {} already has active shift {}",
                    employee.id, existing.id
                )));
            }
            if let Err(err) = shifts::ActiveModel::from(&shift).insert(&db_tx).await {
                if let Some(SqlErr::UniqueConstraintViolation(_)) = err.sql_err() {
                    return Err(EngineError::Conflict(format!(
                        "employee {} already has an active shift",
                        employee.id
                    )));
                }
                return Err(err.into());
            }
            Ok::<(), EngineError>(())
        })?;

        tracing::info!(
            shift_id = %shift.id,
            branch_id = shift.branch_id,
            employee_id = shift.employee_id,
            "shift started"
        );
        Ok(shift)
    }

    /// Closes a shift and freezes its final balance.
    pub async fn end_shift(&self, shift_id: Uuid, ended_at: DateTime<Utc>) -> ResultEngine<Shift> {
        // Fail fast without queuing behind writers.
        self.shift_model(shift_id).await?;

        let _guard = self.locks.acquire(shift_id).await;
        let shift = with_tx!(self, |db_tx| {
            let model = shifts::Entity::find_by_id(shift_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("shift {shift_id}")))?;
            if model.status != ShiftStatus::Active.as_str() {
                return Err(EngineError::InvalidState(format!(
                    "shift {shift_id} already ended"
                )));
            }
            if ended_at < model.started_at {
                return Err(EngineError::Validation(
                    "ended_at must not precede started_at".to_string(),
                ));
            }

            let final_balance = model.balance().balance;
            let mut active: shifts::ActiveModel = model.into();
            active.status = ActiveValue::Set(ShiftStatus::Ended.as_str().to_string());
            active.ended_at = ActiveValue::Set(Some(ended_at));
            active.final_balance_minor = ActiveValue::Set(Some(final_balance.cents()));
            let model = active.update(&db_tx).await?;
            Shift::try_from(model)
        })?;
        self.locks.forget(shift_id);

        tracing::info!(
            shift_id = %shift_id,
            final_balance = %shift.final_balance.unwrap_or_default(),
            "shift ended"
        );
        Ok(shift)
    }

    /// Adds a co-worker to an active shift. Adding the same employee twice is
    /// a no-op.
    pub async fn add_participant(
        &self,
        shift_id: Uuid,
        employee_id: i64,
        added_at: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let shift = self.shift_model(shift_id).await?;
        if shift.status != ShiftStatus::Active.as_str() {
            return Err(EngineError::InvalidState(format!(
                "shift {shift_id} is not active"
            )));
        }
        if !self.directory.employee_exists(employee_id).await? {
            return Err(EngineError::NotFound(format!("employee {employee_id}")));
        }

        let _guard = self.locks.acquire(shift_id).await;
        with_tx!(self, |db_tx| {
            let shift = shifts::Entity::find_by_id(shift_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("shift {shift_id}")))?;
            if shift.status != ShiftStatus::Active.as_str() {
                return Err(EngineError::InvalidState(format!(
                    "shift {shift_id} is not active"
                )));
            }
            let existing = shift_participants::Entity::find_by_id((shift_id, employee_id))
                .one(&db_tx)
                .await?;
            if existing.is_none() {
                shift_participants::ActiveModel {
                    shift_id: ActiveValue::Set(shift_id),
                    employee_id: ActiveValue::Set(employee_id),
                    added_at: ActiveValue::Set(added_at),
                }
                .insert(&db_tx)
                .await?;
                tracing::info!(shift_id = %shift_id, employee_id, "participant added");
            }
            Ok::<(), EngineError>(())
        })
    }

    /// The employee's active shift, if any.
    pub async fn active_shift(&self, employee_id: i64) -> ResultEngine<Option<Shift>> {
        shifts::Entity::find()
            .filter(shifts::Column::EmployeeId.eq(employee_id))
            .filter(shifts::Column::Status.eq(ShiftStatus::Active.as_str()))
            .one(&self.database)
            .await?
            .map(Shift::try_from)
            .transpose()
    }

    pub async fn shift(&self, shift_id: Uuid) -> ResultEngine<Shift> {
        Shift::try_from(self.shift_model(shift_id).await?)
    }

    /// Co-workers of a shift in the order they joined.
    pub async fn shift_participants(&self, shift_id: Uuid) -> ResultEngine<Vec<ShiftParticipant>> {
        self.shift_model(shift_id).await?;
        let rows = shift_participants::Entity::find()
            .filter(shift_participants::Column::ShiftId.eq(shift_id))
            .order_by_asc(shift_participants::Column::AddedAt)
            .order_by_asc(shift_participants::Column::EmployeeId)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(ShiftParticipant::from).collect())
    }
}
