use std::{fmt, sync::Arc};

use chrono_tz::Tz;
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::{
    Directory, EngineError, InventoryRefresh, ResultEngine, directory::DbDirectory,
    locks::ShiftLocks,
};

mod balances;
mod inventory;
mod shifts;
mod transactions;

pub use transactions::TransactionListFilter;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

pub struct Engine {
    database: DatabaseConnection,
    directory: Arc<dyn Directory>,
    locks: ShiftLocks,
    inventory_refresh: InventoryRefresh,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("database", &self.database)
            .field("inventory_refresh", &self.inventory_refresh)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    #[must_use]
    pub fn inventory_refresh(&self) -> InventoryRefresh {
        self.inventory_refresh
    }

    /// Plain read of a shift row, outside any DB transaction.
    async fn shift_model(&self, shift_id: Uuid) -> ResultEngine<crate::shifts::Model> {
        crate::shifts::Entity::find_by_id(shift_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("shift {shift_id}")))
    }

    /// Time zone of a branch, used to bucket stock changes by local day.
    async fn branch_zone(&self, branch_id: i64) -> ResultEngine<Tz> {
        self.directory
            .branch(branch_id)
            .await?
            .map(|branch| branch.timezone)
            .ok_or_else(|| EngineError::NotFound(format!("branch {branch_id}")))
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    directory: Option<Arc<dyn Directory>>,
    inventory_refresh: InventoryRefresh,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override master data lookups. Defaults to [`DbDirectory`] on the same
    /// database.
    pub fn directory(mut self, directory: Arc<dyn Directory>) -> EngineBuilder {
        self.directory = Some(directory);
        self
    }

    pub fn inventory_refresh(mut self, mode: InventoryRefresh) -> EngineBuilder {
        self.inventory_refresh = mode;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let directory = match self.directory {
            Some(directory) => directory,
            None => Arc::new(DbDirectory::new(self.database.clone())),
        };
        Ok(Engine {
            database: self.database,
            directory,
            locks: ShiftLocks::default(),
            inventory_refresh: self.inventory_refresh,
        })
    }
}
