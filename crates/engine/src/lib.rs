//! Shift-scoped cash ledger and inventory accumulation engine.
//!
//! The engine owns four concerns:
//!
//! - shifts: start/end lifecycle, co-workers, starting cash
//! - transactions: purchases, sales, expenses, loans, repayments and debts
//!   recorded against an active shift
//! - balances: running cash balance and per-kind totals for a shift
//! - inventory: per branch/item/month carryover, daily deltas and running totals
//!
//! Master data (branches, employees, parties, prices) is consumed through the
//! [`Directory`] traits.

pub use balances::{Balance, Reconciliation};
pub use commands::{
    CreateTransactionCmd, LineItemInput, ReverseTransactionCmd, StartShiftCmd, UpdatePendingCmd,
};
pub use directory::{
    ActiveEmployee, Branch, BranchRegistry, DbDirectory, Directory, EmployeeDirectory,
    PriceCatalog, PriceScope, tables,
};
pub use error::EngineError;
pub use inventory::{InventoryMatrix, InventoryRefresh, ItemInventory};
pub use money::Money;
pub use ops::{Engine, EngineBuilder, TransactionListFilter};
pub use quantity::Quantity;
pub use shift_participants::ShiftParticipant;
pub use shifts::{Shift, ShiftStatus};
pub use transaction_items::TransactionItem;
pub use transactions::{PartyType, PaymentMethod, Transaction, TransactionKind, TransactionStatus};

mod balances;
mod commands;
mod daily_changes;
mod directory;
mod error;
mod inventory;
mod inventory_snapshots;
mod locks;
mod money;
mod ops;
mod quantity;
mod shift_participants;
mod shifts;
mod transaction_items;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
