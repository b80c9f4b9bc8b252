//! Transaction primitives.
//!
//! A `Transaction` is a single financial event recorded against a shift.
//! Purchases and sales carry [`TransactionItem`]s; every other kind carries a
//! plain amount.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, TransactionItem};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Purchase,
    Sale,
    Expense,
    Loan,
    Repayment,
    Debt,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 6] = [
        Self::Purchase,
        Self::Sale,
        Self::Expense,
        Self::Loan,
        Self::Repayment,
        Self::Debt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::Expense => "expense",
            Self::Loan => "loan",
            Self::Repayment => "repayment",
            Self::Debt => "debt",
        }
    }

    /// Purchases and sales are recorded with line items.
    #[must_use]
    pub fn is_itemized(self) -> bool {
        matches!(self, Self::Purchase | Self::Sale)
    }

    /// Direction of the effect on shift cash: `+1` money in, `-1` money out,
    /// `0` no cash movement.
    #[must_use]
    pub fn cash_sign(self) -> i64 {
        match self {
            Self::Sale | Self::Repayment => 1,
            Self::Purchase | Self::Expense | Self::Loan => -1,
            Self::Debt => 0,
        }
    }

    /// Direction of the effect on stock: purchases add, sales remove.
    #[must_use]
    pub fn stock_sign(self) -> i64 {
        match self {
            Self::Purchase => 1,
            Self::Sale => -1,
            _ => 0,
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "purchase" => Ok(Self::Purchase),
            "sale" => Ok(Self::Sale),
            "expense" => Ok(Self::Expense),
            "loan" => Ok(Self::Loan),
            "repayment" => Ok(Self::Repayment),
            "debt" => Ok(Self::Debt),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyType {
    Seller,
    Buyer,
    Employee,
    None,
}

impl PartyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seller => "seller",
            Self::Buyer => "buyer",
            Self::Employee => "employee",
            Self::None => "none",
        }
    }
}

impl TryFrom<&str> for PartyType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "seller" => Ok(Self::Seller),
            "buyer" => Ok(Self::Buyer),
            "employee" => Ok(Self::Employee),
            "none" => Ok(Self::None),
            other => Err(EngineError::Validation(format!(
                "invalid party type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Check,
    OnlineTransfer,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Check => "check",
            Self::OnlineTransfer => "online_transfer",
        }
    }
}

impl TryFrom<&str> for PaymentMethod {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "check" => Ok(Self::Check),
            "online_transfer" => Ok(Self::OnlineTransfer),
            other => Err(EngineError::Validation(format!(
                "invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub shift_id: Uuid,
    pub branch_id: i64,
    pub kind: TransactionKind,
    pub party_type: PartyType,
    pub party_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub status: TransactionStatus,
    pub total_amount: Money,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub idempotency_key: Option<String>,
    /// Set on compensating records: the completed transaction being reversed.
    pub reversal_of: Option<i64>,
    pub items: Vec<TransactionItem>,
}

impl Transaction {
    /// `-1` for compensating records, `+1` otherwise.
    #[must_use]
    pub fn effect_sign(&self) -> i64 {
        if self.reversal_of.is_some() { -1 } else { 1 }
    }

    /// Signed contribution of this record to its kind's shift total.
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        Money::new(self.effect_sign() * self.total_amount.cents())
    }

    /// Checks the invariants that must hold before a record may count
    /// towards balances and stock.
    pub(crate) fn ensure_completable(&self) -> ResultEngine<()> {
        if self.kind.is_itemized() {
            if self.items.is_empty() {
                return Err(EngineError::Validation(format!(
                    "{} requires at least one line item",
                    self.kind.as_str()
                )));
            }
            let mut sum = Money::ZERO;
            for item in &self.items {
                item.ensure_completable()?;
                sum = sum
                    .checked_add(item.subtotal)
                    .ok_or_else(|| EngineError::Validation("amount too large".to_string()))?;
            }
            if sum != self.total_amount {
                return Err(EngineError::Validation(format!(
                    "total {} does not match line items {}",
                    self.total_amount, sum
                )));
            }
        } else if !self.total_amount.is_positive() {
            return Err(EngineError::Validation("amount must be > 0".to_string()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub shift_id: Uuid,
    pub branch_id: i64,
    pub kind: String,
    pub party_type: String,
    pub party_id: Option<i64>,
    pub payment_method: String,
    pub status: String,
    pub total_amount_minor: i64,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
    pub cancelled_at: Option<DateTimeUtc>,
    pub idempotency_key: Option<String>,
    pub reversal_of: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transaction_items::Entity")]
    TransactionItems,
    #[sea_orm(
        belongs_to = "super::shifts::Entity",
        from = "Column::ShiftId",
        to = "super::shifts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Shifts,
}

impl Related<super::transaction_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionItems.def()
    }
}

impl Related<super::shifts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shifts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    /// Builds an insertable row; the id is assigned by the database.
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::NotSet,
            shift_id: ActiveValue::Set(tx.shift_id),
            branch_id: ActiveValue::Set(tx.branch_id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            party_type: ActiveValue::Set(tx.party_type.as_str().to_string()),
            party_id: ActiveValue::Set(tx.party_id),
            payment_method: ActiveValue::Set(tx.payment_method.as_str().to_string()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            total_amount_minor: ActiveValue::Set(tx.total_amount.cents()),
            notes: ActiveValue::Set(tx.notes.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            completed_at: ActiveValue::Set(tx.completed_at),
            cancelled_at: ActiveValue::Set(tx.cancelled_at),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
            reversal_of: ActiveValue::Set(tx.reversal_of),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            shift_id: model.shift_id,
            branch_id: model.branch_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            party_type: PartyType::try_from(model.party_type.as_str())?,
            party_id: model.party_id,
            payment_method: PaymentMethod::try_from(model.payment_method.as_str())?,
            status: TransactionStatus::try_from(model.status.as_str())?,
            total_amount: Money::new(model.total_amount_minor),
            notes: model.notes,
            created_at: model.created_at,
            completed_at: model.completed_at,
            cancelled_at: model.cancelled_at,
            idempotency_key: model.idempotency_key,
            reversal_of: model.reversal_of,
            items: Vec::new(),
        })
    }
}
