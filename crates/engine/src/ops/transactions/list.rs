use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    EngineError, ResultEngine, Transaction, TransactionItem, TransactionKind, TransactionStatus,
    transaction_items, transactions,
};

use super::super::Engine;

/// Filters for listing the transactions of a shift.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
    /// If present, acts as an allow-list of statuses to return.
    pub statuses: Option<Vec<TransactionStatus>>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(EngineError::Validation(
            "kinds must not be empty".to_string(),
        ));
    }
    if filter.statuses.as_ref().is_some_and(|s| s.is_empty()) {
        return Err(EngineError::Validation(
            "statuses must not be empty".to_string(),
        ));
    }
    Ok(())
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
            self = self.filter(transactions::Column::Kind.is_in(kinds));
        }
        if let Some(statuses) = &filter.statuses {
            let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
            self = self.filter(transactions::Column::Status.is_in(statuses));
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    created_at: DateTime<Utc>,
    transaction_id: i64,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::Validation("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::Validation("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::Validation("invalid transactions cursor".to_string()))
    }
}

impl Engine {
    /// Lists the transactions of a shift with cursor-based pagination.
    ///
    /// Pagination follows ledger replay order `(created_at ASC,
    /// transaction_id ASC)`.
    pub async fn list_shift_transactions(
        &self,
        shift_id: Uuid,
        limit: u64,
        cursor: Option<&str>,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        validate_list_filter(filter)?;
        if limit == 0 {
            return Err(EngineError::Validation("limit must be > 0".to_string()));
        }
        self.shift_model(shift_id).await?;

        let limit_plus_one = limit.saturating_add(1);
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::ShiftId.eq(shift_id))
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transactions::Column::Id)
            .limit(limit_plus_one);

        if let Some(cursor) = cursor {
            let cursor = TransactionsCursor::decode(cursor)?;
            query = query.filter(
                Condition::any()
                    .add(transactions::Column::CreatedAt.gt(cursor.created_at))
                    .add(
                        Condition::all()
                            .add(transactions::Column::CreatedAt.eq(cursor.created_at))
                            .add(transactions::Column::Id.gt(cursor.transaction_id)),
                    ),
            );
        }
        query = query.apply_tx_filters(filter);

        let rows: Vec<transactions::Model> = query.all(&self.database).await?;
        let has_more = rows.len() > limit as usize;

        let mut out: Vec<Transaction> = Vec::with_capacity(rows.len().min(limit as usize));
        for model in rows.into_iter().take(limit as usize) {
            out.push(Transaction::try_from(model)?);
        }

        let ids: Vec<i64> = out.iter().map(|tx| tx.id).collect();
        if !ids.is_empty() {
            let item_models = transaction_items::Entity::find()
                .filter(transaction_items::Column::TransactionId.is_in(ids))
                .order_by_asc(transaction_items::Column::Id)
                .all(&self.database)
                .await?;
            for model in item_models {
                if let Some(tx) = out.iter_mut().find(|tx| tx.id == model.transaction_id) {
                    tx.items.push(TransactionItem::from(model));
                }
            }
        }

        let next_cursor = out.last().map(|tx| TransactionsCursor {
            created_at: tx.created_at,
            transaction_id: tx.id,
        });
        let next_cursor = if has_more {
            next_cursor.map(|c| c.encode()).transpose()?
        } else {
            None
        };

        Ok((out, next_cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_survives_encoding() {
        let cursor = TransactionsCursor {
            created_at: Utc::now(),
            transaction_id: 42,
        };
        let decoded = TransactionsCursor::decode(&cursor.encode().unwrap()).unwrap();
        assert_eq!(decoded.transaction_id, 42);
        assert_eq!(decoded.created_at, cursor.created_at);
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        assert!(matches!(
            TransactionsCursor::decode("not a cursor"),
            Err(EngineError::Validation(_))
        ));
    }
}
