use crate::{ResultEngine, Transaction};

use super::Engine;
use helpers::load_transaction;

mod helpers;
mod list;
mod write;

pub use list::TransactionListFilter;

impl Engine {
    /// Returns a single transaction with its line items.
    pub async fn transaction(&self, transaction_id: i64) -> ResultEngine<Transaction> {
        load_transaction(&self.database, transaction_id).await
    }
}
