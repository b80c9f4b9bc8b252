//! Work shifts.
//!
//! A shift is a bounded work session of one employee at one branch, with a
//! starting cash float. Per-kind totals are maintained on the row as
//! transactions complete, and the final balance is frozen when the shift ends.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Balance, EngineError, Money, balances::Totals};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Active,
    Ended,
}

impl ShiftStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl TryFrom<&str> for ShiftStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "active" => Ok(Self::Active),
            "ended" => Ok(Self::Ended),
            other => Err(EngineError::Validation(format!(
                "invalid shift status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: Uuid,
    pub branch_id: i64,
    pub employee_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub initial_cash: Money,
    pub status: ShiftStatus,
    /// Frozen by `end_shift`.
    pub final_balance: Option<Money>,
}

impl Shift {
    pub fn new(
        branch_id: i64,
        employee_id: i64,
        initial_cash: Money,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            branch_id,
            employee_id,
            started_at,
            ended_at: None,
            initial_cash,
            status: ShiftStatus::Active,
            final_balance: None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ShiftStatus::Active
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shifts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub branch_id: i64,
    pub employee_id: i64,
    pub status: String,
    pub started_at: DateTimeUtc,
    pub ended_at: Option<DateTimeUtc>,
    pub initial_cash_minor: i64,
    pub total_purchase_minor: i64,
    pub total_sale_minor: i64,
    pub total_expense_minor: i64,
    pub total_loan_minor: i64,
    pub total_repayment_minor: i64,
    pub total_debt_minor: i64,
    pub final_balance_minor: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::shift_participants::Entity")]
    ShiftParticipants,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::shift_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShiftParticipants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Totals as maintained incrementally on the row.
    pub(crate) fn totals(&self) -> Totals {
        Totals {
            purchase: Money::new(self.total_purchase_minor),
            sale: Money::new(self.total_sale_minor),
            expense: Money::new(self.total_expense_minor),
            loan: Money::new(self.total_loan_minor),
            repayment: Money::new(self.total_repayment_minor),
            debt: Money::new(self.total_debt_minor),
        }
    }

    pub(crate) fn balance(&self) -> Balance {
        self.totals()
            .into_balance(Money::new(self.initial_cash_minor))
    }
}

impl From<&Shift> for ActiveModel {
    fn from(shift: &Shift) -> Self {
        Self {
            id: ActiveValue::Set(shift.id),
            branch_id: ActiveValue::Set(shift.branch_id),
            employee_id: ActiveValue::Set(shift.employee_id),
            status: ActiveValue::Set(shift.status.as_str().to_string()),
            started_at: ActiveValue::Set(shift.started_at),
            ended_at: ActiveValue::Set(shift.ended_at),
            initial_cash_minor: ActiveValue::Set(shift.initial_cash.cents()),
            total_purchase_minor: ActiveValue::Set(0),
            total_sale_minor: ActiveValue::Set(0),
            total_expense_minor: ActiveValue::Set(0),
            total_loan_minor: ActiveValue::Set(0),
            total_repayment_minor: ActiveValue::Set(0),
            total_debt_minor: ActiveValue::Set(0),
            final_balance_minor: ActiveValue::Set(shift.final_balance.map(Money::cents)),
        }
    }
}

impl TryFrom<Model> for Shift {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            branch_id: model.branch_id,
            employee_id: model.employee_id,
            started_at: model.started_at,
            ended_at: model.ended_at,
            initial_cash: Money::new(model.initial_cash_minor),
            status: ShiftStatus::try_from(model.status.as_str())?,
            final_balance: model.final_balance_minor.map(Money::new),
        })
    }
}
