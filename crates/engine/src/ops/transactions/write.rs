use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CreateTransactionCmd, EngineError, ResultEngine, ReverseTransactionCmd, ShiftStatus,
    Transaction, TransactionItem, TransactionStatus, UpdatePendingCmd, transaction_items,
    transactions, util::normalize_optional_text,
};

use super::super::{Engine, with_tx};
use super::helpers::{
    apply_effects, check_party_shape, find_by_key, insert_items, insert_transaction,
    is_unique_violation, items_total, load_transaction, require_active_shift, reversal_exists,
};

impl Engine {
    /// Records a transaction against an active shift.
    ///
    /// Repeating a create with the same `(shift_id, idempotency_key)` returns
    /// the record stored by the first call.
    pub async fn create_transaction(&self, cmd: CreateTransactionCmd) -> ResultEngine<Transaction> {
        let idempotency_key = normalize_optional_text(cmd.idempotency_key);
        if let Some(key) = idempotency_key.as_deref()
            && let Some(existing) = find_by_key(&self.database, cmd.shift_id, key).await?
        {
            return Ok(existing);
        }

        let shift = self.shift_model(cmd.shift_id).await?;
        if shift.status != ShiftStatus::Active.as_str() {
            return Err(EngineError::InvalidState(format!(
                "shift {} has ended",
                cmd.shift_id
            )));
        }
        check_party_shape(cmd.kind, cmd.party_type, cmd.party_id)?;
        self.ensure_party_exists(cmd.party_type, cmd.party_id)
            .await?;

        let (items, total_amount) = if cmd.kind.is_itemized() {
            if cmd.amount.is_some() {
                return Err(EngineError::Validation(format!(
                    "{} amount is derived from its line items",
                    cmd.kind.as_str()
                )));
            }
            let items = self
                .price_items(
                    cmd.kind,
                    shift.branch_id,
                    (cmd.party_type, cmd.party_id),
                    &cmd.items,
                    cmd.created_at,
                )
                .await?;
            let total = items_total(&items)?;
            (items, total)
        } else {
            if !cmd.items.is_empty() {
                return Err(EngineError::Validation(format!(
                    "{} cannot have line items",
                    cmd.kind.as_str()
                )));
            }
            let amount = cmd.amount.ok_or_else(|| {
                EngineError::Validation(format!("{} requires an amount", cmd.kind.as_str()))
            })?;
            if amount.is_negative() {
                return Err(EngineError::Validation("amount must not be negative".to_string()));
            }
            (Vec::new(), amount)
        };

        let (status, completed_at) = if cmd.complete {
            (TransactionStatus::Completed, Some(cmd.created_at))
        } else {
            (TransactionStatus::Pending, None)
        };
        let tx = Transaction {
            id: 0,
            shift_id: cmd.shift_id,
            branch_id: shift.branch_id,
            kind: cmd.kind,
            party_type: cmd.party_type,
            party_id: cmd.party_id,
            payment_method: cmd.payment_method,
            status,
            total_amount,
            notes: normalize_optional_text(cmd.notes),
            created_at: cmd.created_at,
            completed_at,
            cancelled_at: None,
            idempotency_key,
            reversal_of: None,
            items,
        };
        let zone = if cmd.complete {
            tx.ensure_completable()?;
            self.effects_zone(tx.kind, tx.branch_id).await?
        } else {
            None
        };

        let _guard = self.locks.acquire(tx.shift_id).await;
        let result = with_tx!(self, |db_tx| {
            let existing = match tx.idempotency_key.as_deref() {
                Some(key) => find_by_key(&db_tx, tx.shift_id, key).await?,
                None => None,
            };
            match existing {
                Some(existing) => Ok::<_, EngineError>((existing, false)),
                None => {
                    require_active_shift(&db_tx, tx.shift_id).await?;
                    // A unique violation leaves the block as a value so the
                    // winner's record can be read back below.
                    match insert_transaction(&db_tx, &tx).await {
                        Ok(stored) => {
                            if stored.status == TransactionStatus::Completed {
                                apply_effects(&db_tx, &stored, zone).await?;
                            }
                            Ok((stored, true))
                        }
                        Err(err) => Err(err),
                    }
                }
            }
        });
        let (stored, created) = match result {
            Ok(outcome) => outcome,
            Err(err) if is_unique_violation(&err) => {
                match self
                    .recorded_under_key(tx.shift_id, tx.idempotency_key.as_deref())
                    .await?
                {
                    Some(existing) => (existing, false),
                    None => return Err(err),
                }
            }
            Err(err) => return Err(err),
        };

        if created {
            tracing::info!(
                transaction_id = stored.id,
                shift_id = %stored.shift_id,
                kind = stored.kind.as_str(),
                status = stored.status.as_str(),
                total = %stored.total_amount,
                "transaction recorded"
            );
        }
        Ok(stored)
    }

    /// Edits a pending transaction. Line items, when given, replace the
    /// existing ones and the total is recomputed.
    pub async fn update_pending_transaction(
        &self,
        transaction_id: i64,
        cmd: UpdatePendingCmd,
    ) -> ResultEngine<Transaction> {
        let current = load_transaction(&self.database, transaction_id).await?;
        if current.status != TransactionStatus::Pending {
            return Err(EngineError::InvalidState(format!(
                "transaction {transaction_id} is {}",
                current.status.as_str()
            )));
        }

        let (party_type, party_id) = cmd
            .party
            .unwrap_or((current.party_type, current.party_id));
        check_party_shape(current.kind, party_type, party_id)?;
        if cmd.party.is_some() {
            self.ensure_party_exists(party_type, party_id).await?;
        }

        let mut replacement: Option<Vec<TransactionItem>> = None;
        let mut total_amount = current.total_amount;
        if current.kind.is_itemized() {
            if cmd.amount.is_some() {
                return Err(EngineError::Validation(format!(
                    "{} amount is derived from its line items",
                    current.kind.as_str()
                )));
            }
            if let Some(inputs) = &cmd.items {
                let items = self
                    .price_items(
                        current.kind,
                        current.branch_id,
                        (party_type, party_id),
                        inputs,
                        current.created_at,
                    )
                    .await?;
                total_amount = items_total(&items)?;
                replacement = Some(items);
            }
        } else {
            if cmd.items.as_ref().is_some_and(|items| !items.is_empty()) {
                return Err(EngineError::Validation(format!(
                    "{} cannot have line items",
                    current.kind.as_str()
                )));
            }
            if let Some(amount) = cmd.amount {
                if amount.is_negative() {
                    return Err(EngineError::Validation(
                        "amount must not be negative".to_string(),
                    ));
                }
                total_amount = amount;
            }
        }
        let notes = match cmd.notes {
            Some(notes) => normalize_optional_text(Some(notes)),
            None => current.notes.clone(),
        };
        let payment_method = cmd.payment_method.unwrap_or(current.payment_method);

        let _guard = self.locks.acquire(current.shift_id).await;
        let updated = with_tx!(self, |db_tx| {
            let fresh = load_transaction(&db_tx, transaction_id).await?;
            if fresh.status != TransactionStatus::Pending {
                return Err(EngineError::InvalidState(format!(
                    "transaction {transaction_id} is {}",
                    fresh.status.as_str()
                )));
            }
            require_active_shift(&db_tx, fresh.shift_id).await?;

            transactions::ActiveModel {
                id: ActiveValue::Unchanged(transaction_id),
                party_type: ActiveValue::Set(party_type.as_str().to_string()),
                party_id: ActiveValue::Set(party_id),
                payment_method: ActiveValue::Set(payment_method.as_str().to_string()),
                total_amount_minor: ActiveValue::Set(total_amount.cents()),
                notes: ActiveValue::Set(notes),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;

            if let Some(items) = &replacement {
                transaction_items::Entity::delete_many()
                    .filter(transaction_items::Column::TransactionId.eq(transaction_id))
                    .exec(&db_tx)
                    .await?;
                insert_items(&db_tx, transaction_id, items).await?;
            }
            load_transaction(&db_tx, transaction_id).await
        })?;

        tracing::info!(transaction_id, "pending transaction updated");
        Ok(updated)
    }

    /// Moves a pending transaction to completed and applies it to the shift
    /// totals and daily stock changes in one unit of work.
    ///
    /// Completing an already completed record returns it unchanged.
    pub async fn complete_transaction(
        &self,
        transaction_id: i64,
        completed_at: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let current = load_transaction(&self.database, transaction_id).await?;
        match current.status {
            TransactionStatus::Completed => return Ok(current),
            TransactionStatus::Cancelled => {
                return Err(EngineError::InvalidState(format!(
                    "transaction {transaction_id} is cancelled"
                )));
            }
            TransactionStatus::Pending => {}
        }
        let zone = self.effects_zone(current.kind, current.branch_id).await?;

        let _guard = self.locks.acquire(current.shift_id).await;
        let (tx, completed) = with_tx!(self, |db_tx| {
            let mut tx = load_transaction(&db_tx, transaction_id).await?;
            match tx.status {
                TransactionStatus::Completed => Ok((tx, false)),
                TransactionStatus::Cancelled => Err(EngineError::InvalidState(format!(
                    "transaction {transaction_id} is cancelled"
                ))),
                TransactionStatus::Pending => {
                    require_active_shift(&db_tx, tx.shift_id).await?;
                    tx.ensure_completable()?;

                    transactions::ActiveModel {
                        id: ActiveValue::Unchanged(transaction_id),
                        status: ActiveValue::Set(TransactionStatus::Completed.as_str().to_string()),
                        completed_at: ActiveValue::Set(Some(completed_at)),
                        ..Default::default()
                    }
                    .update(&db_tx)
                    .await?;
                    tx.status = TransactionStatus::Completed;
                    tx.completed_at = Some(completed_at);

                    apply_effects(&db_tx, &tx, zone).await?;
                    Ok((tx, true))
                }
            }
        })?;

        if completed {
            tracing::info!(
                transaction_id,
                shift_id = %tx.shift_id,
                kind = tx.kind.as_str(),
                total = %tx.total_amount,
                "transaction completed"
            );
        }
        Ok(tx)
    }

    /// Cancels a pending transaction. Cancelled records are kept and never
    /// count towards totals.
    pub async fn cancel_transaction(
        &self,
        transaction_id: i64,
        cancelled_at: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let current = load_transaction(&self.database, transaction_id).await?;
        match current.status {
            TransactionStatus::Cancelled => return Ok(current),
            TransactionStatus::Completed => {
                return Err(EngineError::InvalidState(format!(
                    "transaction {transaction_id} is completed; reverse it instead"
                )));
            }
            TransactionStatus::Pending => {}
        }

        let _guard = self.locks.acquire(current.shift_id).await;
        let (tx, cancelled) = with_tx!(self, |db_tx| {
            let mut tx = load_transaction(&db_tx, transaction_id).await?;
            match tx.status {
                TransactionStatus::Cancelled => Ok((tx, false)),
                TransactionStatus::Completed => Err(EngineError::InvalidState(format!(
                    "transaction {transaction_id} is completed; reverse it instead"
                ))),
                TransactionStatus::Pending => {
                    transactions::ActiveModel {
                        id: ActiveValue::Unchanged(transaction_id),
                        status: ActiveValue::Set(TransactionStatus::Cancelled.as_str().to_string()),
                        cancelled_at: ActiveValue::Set(Some(cancelled_at)),
                        ..Default::default()
                    }
                    .update(&db_tx)
                    .await?;
                    tx.status = TransactionStatus::Cancelled;
                    tx.cancelled_at = Some(cancelled_at);
                    Ok((tx, true))
                }
            }
        })?;

        if cancelled {
            tracing::info!(transaction_id, shift_id = %tx.shift_id, "transaction cancelled");
        }
        Ok(tx)
    }

    /// Records a completed compensating transaction for a completed one.
    ///
    /// The reversal copies kind, party and items of the original and
    /// contributes the negation of its effect to balance and stock.
    pub async fn reverse_transaction(
        &self,
        cmd: ReverseTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let original = load_transaction(&self.database, cmd.transaction_id).await?;
        let idempotency_key = normalize_optional_text(cmd.idempotency_key);
        if let Some(key) = idempotency_key.as_deref()
            && let Some(existing) = find_by_key(&self.database, original.shift_id, key).await?
        {
            return Ok(existing);
        }
        ensure_reversible(&original)?;
        if reversal_exists(&self.database, original.id).await? {
            return Err(EngineError::InvalidState(format!(
                "transaction {} is already reversed",
                original.id
            )));
        }
        let shift = self.shift_model(original.shift_id).await?;
        if shift.status != ShiftStatus::Active.as_str() {
            return Err(EngineError::InvalidState(format!(
                "shift {} has ended",
                original.shift_id
            )));
        }
        let zone = self.effects_zone(original.kind, original.branch_id).await?;

        let reversal = Transaction {
            id: 0,
            status: TransactionStatus::Completed,
            notes: normalize_optional_text(cmd.notes),
            created_at: cmd.created_at,
            completed_at: Some(cmd.created_at),
            cancelled_at: None,
            idempotency_key,
            reversal_of: Some(original.id),
            items: original
                .items
                .iter()
                .map(|item| TransactionItem { id: 0, ..item.clone() })
                .collect(),
            ..original.clone()
        };

        let _guard = self.locks.acquire(original.shift_id).await;
        let result = with_tx!(self, |db_tx| {
            let existing = match reversal.idempotency_key.as_deref() {
                Some(key) => find_by_key(&db_tx, reversal.shift_id, key).await?,
                None => None,
            };
            match existing {
                Some(existing) => Ok::<_, EngineError>((existing, false)),
                None => {
                    let fresh = load_transaction(&db_tx, original.id).await?;
                    ensure_reversible(&fresh)?;
                    require_active_shift(&db_tx, fresh.shift_id).await?;
                    match insert_transaction(&db_tx, &reversal).await {
                        Ok(stored) => {
                            apply_effects(&db_tx, &stored, zone).await?;
                            Ok((stored, true))
                        }
                        Err(err) => Err(err),
                    }
                }
            }
        });
        // The key index and the `reversal_of` index both reject a second writer.
        let (stored, created) = match result {
            Ok(outcome) => outcome,
            Err(err) if is_unique_violation(&err) => {
                match self
                    .recorded_under_key(reversal.shift_id, reversal.idempotency_key.as_deref())
                    .await?
                {
                    Some(existing) => (existing, false),
                    None => {
                        return Err(EngineError::InvalidState(format!(
                            "transaction {} is already reversed",
                            original.id
                        )));
                    }
                }
            }
            Err(err) => return Err(err),
        };

        if created {
            tracing::info!(
                transaction_id = stored.id,
                reversal_of = original.id,
                shift_id = %stored.shift_id,
                "transaction reversed"
            );
        }
        Ok(stored)
    }

    /// Record stored under `key` by a writer that won an insert race.
    async fn recorded_under_key(
        &self,
        shift_id: Uuid,
        key: Option<&str>,
    ) -> ResultEngine<Option<Transaction>> {
        match key {
            Some(key) => find_by_key(&self.database, shift_id, key).await,
            None => Ok(None),
        }
    }
}

fn ensure_reversible(tx: &Transaction) -> ResultEngine<()> {
    if tx.status != TransactionStatus::Completed {
        return Err(EngineError::InvalidState(format!(
            "transaction {} is {}; only completed transactions can be reversed",
            tx.id,
            tx.status.as_str()
        )));
    }
    if tx.reversal_of.is_some() {
        return Err(EngineError::InvalidState(format!(
            "transaction {} is itself a reversal",
            tx.id
        )));
    }
    Ok(())
}
