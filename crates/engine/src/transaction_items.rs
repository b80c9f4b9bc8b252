//! Line items of purchases and sales.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, Quantity, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItem {
    /// Zero until persisted.
    pub id: i64,
    pub item_id: i64,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl TransactionItem {
    /// Builds an item and computes its subtotal.
    ///
    /// Zero values are accepted here since pending records may be partially
    /// filled; negative values never are.
    pub fn priced(item_id: i64, quantity: Quantity, unit_price: Money) -> ResultEngine<Self> {
        if quantity.is_negative() {
            return Err(EngineError::Validation(
                "quantity must not be negative".to_string(),
            ));
        }
        if unit_price.is_negative() {
            return Err(EngineError::Validation(
                "unit_price must not be negative".to_string(),
            ));
        }
        Ok(Self {
            id: 0,
            item_id,
            quantity,
            unit_price,
            subtotal: unit_price.times(quantity)?,
        })
    }

    pub(crate) fn ensure_completable(&self) -> ResultEngine<()> {
        if !self.quantity.is_positive() {
            return Err(EngineError::Validation(format!(
                "item {}: quantity must be > 0",
                self.item_id
            )));
        }
        if !self.unit_price.is_positive() {
            return Err(EngineError::Validation(format!(
                "item {}: unit_price must be > 0",
                self.item_id
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub transaction_id: i64,
    pub item_id: i64,
    pub quantity_milli: i64,
    pub unit_price_minor: i64,
    pub subtotal_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn for_transaction(transaction_id: i64, item: &TransactionItem) -> Self {
        Self {
            id: ActiveValue::NotSet,
            transaction_id: ActiveValue::Set(transaction_id),
            item_id: ActiveValue::Set(item.item_id),
            quantity_milli: ActiveValue::Set(item.quantity.milli()),
            unit_price_minor: ActiveValue::Set(item.unit_price.cents()),
            subtotal_minor: ActiveValue::Set(item.subtotal.cents()),
        }
    }
}

impl From<Model> for TransactionItem {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            item_id: model.item_id,
            quantity: Quantity::from_milli(model.quantity_milli),
            unit_price: Money::new(model.unit_price_minor),
            subtotal: Money::new(model.subtotal_minor),
        }
    }
}
