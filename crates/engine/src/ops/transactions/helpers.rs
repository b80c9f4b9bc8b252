use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, SqlErr, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, LineItemInput, Money, PartyType, PriceScope, ResultEngine,
    ShiftStatus, Transaction, TransactionItem, TransactionKind, daily_changes, shifts,
    transaction_items, transactions, util::local_day,
};

use super::super::Engine;

/// Loads a transaction with its line items in insertion order.
pub(crate) async fn load_transaction<C: ConnectionTrait>(
    db: &C,
    transaction_id: i64,
) -> ResultEngine<Transaction> {
    let model = transactions::Entity::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("transaction {transaction_id}")))?;
    let mut tx = Transaction::try_from(model)?;
    tx.items = transaction_items::Entity::find()
        .filter(transaction_items::Column::TransactionId.eq(transaction_id))
        .order_by_asc(transaction_items::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(TransactionItem::from)
        .collect();
    Ok(tx)
}

pub(super) async fn find_by_key<C: ConnectionTrait>(
    db: &C,
    shift_id: Uuid,
    key: &str,
) -> ResultEngine<Option<Transaction>> {
    let existing = transactions::Entity::find()
        .filter(transactions::Column::ShiftId.eq(shift_id))
        .filter(transactions::Column::IdempotencyKey.eq(key.to_string()))
        .one(db)
        .await?;
    match existing {
        Some(model) => Ok(Some(load_transaction(db, model.id).await?)),
        None => Ok(None),
    }
}

/// Re-reads the shift inside the unit of work and refuses writes once it
/// has ended.
pub(super) async fn require_active_shift<C: ConnectionTrait>(
    db: &C,
    shift_id: Uuid,
) -> ResultEngine<shifts::Model> {
    let shift = shifts::Entity::find_by_id(shift_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("shift {shift_id}")))?;
    if shift.status != ShiftStatus::Active.as_str() {
        return Err(EngineError::InvalidState(format!(
            "shift {shift_id} has ended"
        )));
    }
    Ok(shift)
}

pub(super) async fn reversal_exists<C: ConnectionTrait>(
    db: &C,
    transaction_id: i64,
) -> ResultEngine<bool> {
    Ok(transactions::Entity::find()
        .filter(transactions::Column::ReversalOf.eq(transaction_id))
        .one(db)
        .await?
        .is_some())
}

/// True when a write was rejected by one of the ledger's unique indexes.
pub(super) fn is_unique_violation(err: &EngineError) -> bool {
    matches!(
        err,
        EngineError::Storage(db_err)
            if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    )
}

/// Inserts a transaction row and its items, returning the stored record.
pub(super) async fn insert_transaction<C: ConnectionTrait>(
    db: &C,
    tx: &Transaction,
) -> ResultEngine<Transaction> {
    let model = transactions::ActiveModel::from(tx).insert(db).await?;
    insert_items(db, model.id, &tx.items).await?;
    load_transaction(db, model.id).await
}

pub(super) async fn insert_items<C: ConnectionTrait>(
    db: &C,
    transaction_id: i64,
    items: &[TransactionItem],
) -> ResultEngine<()> {
    for item in items {
        transaction_items::ActiveModel::for_transaction(transaction_id, item)
            .insert(db)
            .await?;
    }
    Ok(())
}

fn total_column(kind: TransactionKind) -> shifts::Column {
    match kind {
        TransactionKind::Purchase => shifts::Column::TotalPurchaseMinor,
        TransactionKind::Sale => shifts::Column::TotalSaleMinor,
        TransactionKind::Expense => shifts::Column::TotalExpenseMinor,
        TransactionKind::Loan => shifts::Column::TotalLoanMinor,
        TransactionKind::Repayment => shifts::Column::TotalRepaymentMinor,
        TransactionKind::Debt => shifts::Column::TotalDebtMinor,
    }
}

/// Applies a newly completed record to the shift totals and, when `zone`
/// is given, to the materialized daily stock changes.
///
/// Both are single atomic increments so concurrent writers never lose
/// updates.
pub(super) async fn apply_effects<C: ConnectionTrait>(
    db: &C,
    tx: &Transaction,
    zone: Option<Tz>,
) -> ResultEngine<()> {
    let column = total_column(tx.kind);
    shifts::Entity::update_many()
        .col_expr(column, Expr::col(column).add(tx.signed_amount().cents()))
        .filter(shifts::Column::Id.eq(tx.shift_id))
        .exec(db)
        .await?;

    if let Some(zone) = zone {
        let sign = tx.kind.stock_sign() * tx.effect_sign();
        if sign != 0 {
            let day = local_day(zone, tx.created_at);
            for item in &tx.items {
                let change = if sign > 0 { item.quantity } else { -item.quantity };
                daily_changes::bump(db, tx.branch_id, item.item_id, day, change).await?;
            }
        }
    }
    Ok(())
}

/// `party_type` and `party_id` must agree, and itemized kinds only deal with
/// their own counterpart.
pub(super) fn check_party_shape(
    kind: TransactionKind,
    party_type: PartyType,
    party_id: Option<i64>,
) -> ResultEngine<()> {
    match (party_type, party_id) {
        (PartyType::None, Some(_)) => {
            return Err(EngineError::Validation(
                "party_id must be empty when party_type is none".to_string(),
            ));
        }
        (PartyType::Seller | PartyType::Buyer | PartyType::Employee, None) => {
            return Err(EngineError::Validation(format!(
                "party_id is required for party_type {}",
                party_type.as_str()
            )));
        }
        _ => {}
    }
    let allowed = match kind {
        TransactionKind::Purchase => matches!(party_type, PartyType::Seller | PartyType::None),
        TransactionKind::Sale => matches!(party_type, PartyType::Buyer | PartyType::None),
        _ => true,
    };
    if !allowed {
        return Err(EngineError::Validation(format!(
            "{} cannot have party_type {}",
            kind.as_str(),
            party_type.as_str()
        )));
    }
    Ok(())
}

/// Sums subtotals, which are already rounded to cents.
pub(super) fn items_total(items: &[TransactionItem]) -> ResultEngine<Money> {
    items.iter().try_fold(Money::ZERO, |acc, item| {
        acc.checked_add(item.subtotal)
            .ok_or_else(|| EngineError::Validation("amount too large".to_string()))
    })
}

impl Engine {
    pub(super) async fn ensure_party_exists(
        &self,
        party_type: PartyType,
        party_id: Option<i64>,
    ) -> ResultEngine<()> {
        let Some(party_id) = party_id else {
            return Ok(());
        };
        if !self.directory.party_exists(party_type, party_id).await? {
            return Err(EngineError::NotFound(format!(
                "{} {party_id}",
                party_type.as_str()
            )));
        }
        Ok(())
    }

    /// Resolves catalog prices and builds line items.
    ///
    /// Every item must be priced in the catalog for the context. Sales to a
    /// buyer use the buyer's price list and fall back to the branch price.
    pub(super) async fn price_items(
        &self,
        kind: TransactionKind,
        branch_id: i64,
        party: (PartyType, Option<i64>),
        inputs: &[LineItemInput],
        at: DateTime<Utc>,
    ) -> ResultEngine<Vec<TransactionItem>> {
        if inputs.is_empty() {
            return Err(EngineError::Validation(format!(
                "{} requires at least one line item",
                kind.as_str()
            )));
        }
        let buyer = match (kind, party) {
            (TransactionKind::Sale, (PartyType::Buyer, Some(buyer_id))) => Some(buyer_id),
            _ => None,
        };

        let mut items = Vec::with_capacity(inputs.len());
        for input in inputs {
            let mut price = None;
            if let Some(buyer_id) = buyer {
                price = self
                    .directory
                    .current_price(PriceScope::Buyer(buyer_id), input.item_id, at)
                    .await?;
            }
            if price.is_none() {
                price = self
                    .directory
                    .current_price(PriceScope::Branch(branch_id), input.item_id, at)
                    .await?;
            }
            let catalog_price = price.ok_or_else(|| {
                EngineError::Validation(format!(
                    "item {} has no current price at branch {branch_id}",
                    input.item_id
                ))
            })?;
            let unit_price = input.unit_price.unwrap_or(catalog_price);
            items.push(TransactionItem::priced(
                input.item_id,
                input.quantity,
                unit_price,
            )?);
        }
        Ok(items)
    }

    /// Zone for daily change bucketing, only needed when the record moves
    /// stock. Cells are maintained in both refresh modes.
    pub(super) async fn effects_zone(
        &self,
        kind: TransactionKind,
        branch_id: i64,
    ) -> ResultEngine<Option<Tz>> {
        if kind.stock_sign() == 0 {
            return Ok(None);
        }
        Ok(Some(self.branch_zone(branch_id).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn party_type_and_id_must_agree() {
        assert!(check_party_shape(TransactionKind::Expense, PartyType::None, None).is_ok());
        assert!(check_party_shape(TransactionKind::Expense, PartyType::None, Some(1)).is_err());
        assert!(check_party_shape(TransactionKind::Loan, PartyType::Employee, None).is_err());
        assert!(check_party_shape(TransactionKind::Loan, PartyType::Employee, Some(2)).is_ok());
    }

    #[test]
    fn purchases_and_sales_restrict_counterparts() {
        assert!(check_party_shape(TransactionKind::Purchase, PartyType::Seller, Some(1)).is_ok());
        assert!(check_party_shape(TransactionKind::Purchase, PartyType::Buyer, Some(1)).is_err());
        assert!(check_party_shape(TransactionKind::Sale, PartyType::Buyer, Some(1)).is_ok());
        assert!(check_party_shape(TransactionKind::Sale, PartyType::Seller, Some(1)).is_err());
    }
}
