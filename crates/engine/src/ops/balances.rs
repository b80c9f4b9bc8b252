use uuid::Uuid;

use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    Balance, EngineError, Money, Reconciliation, ResultEngine, Transaction, TransactionStatus,
    balances::Totals, shifts, transactions,
};

use super::{Engine, with_tx};

async fn shift_row<C: ConnectionTrait>(db: &C, shift_id: Uuid) -> ResultEngine<shifts::Model> {
    shifts::Entity::find_by_id(shift_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::NotFound(format!("shift {shift_id}")))
}

/// Replays completed transactions in `(created_at, id)` order; reversals
/// contribute the negation of their kind.
async fn scan_balance<C: ConnectionTrait>(db: &C, shift: &shifts::Model) -> ResultEngine<Balance> {
    let models: Vec<transactions::Model> = transactions::Entity::find()
        .filter(transactions::Column::ShiftId.eq(shift.id))
        .filter(transactions::Column::Status.eq(TransactionStatus::Completed.as_str()))
        .order_by_asc(transactions::Column::CreatedAt)
        .order_by_asc(transactions::Column::Id)
        .all(db)
        .await?;

    let mut totals = Totals::default();
    for model in models {
        let tx = Transaction::try_from(model)?;
        totals.apply(tx.kind, tx.signed_amount());
    }
    Ok(totals.into_balance(Money::new(shift.initial_cash_minor)))
}

impl Engine {
    /// Shift balance from the incrementally maintained totals.
    pub async fn compute_balance(&self, shift_id: Uuid) -> ResultEngine<Balance> {
        Ok(shift_row(&self.database, shift_id).await?.balance())
    }

    /// Shift balance recomputed from the ledger.
    pub async fn compute_balance_scan(&self, shift_id: Uuid) -> ResultEngine<Balance> {
        let shift = shift_row(&self.database, shift_id).await?;
        scan_balance(&self.database, &shift).await
    }

    /// Compares the incremental totals with a full scan, both read from the
    /// same snapshot.
    pub async fn reconcile_shift(&self, shift_id: Uuid) -> ResultEngine<Reconciliation> {
        let reconciliation = with_tx!(self, |db_tx| {
            let shift = shift_row(&db_tx, shift_id).await?;
            let scan = scan_balance(&db_tx, &shift).await?;
            Ok::<_, EngineError>(Reconciliation::new(shift.balance(), scan))
        })?;
        if !reconciliation.consistent {
            tracing::warn!(
                shift_id = %shift_id,
                incremental = %reconciliation.incremental.balance,
                scan = %reconciliation.scan.balance,
                "shift totals drifted from the ledger"
            );
        }
        Ok(reconciliation)
    }
}
