//! Wire types of the HTTP API.
//!
//! Money and quantities travel as decimal strings (`"1300.00"`, `"2.350"`)
//! so no client ever round-trips them through a float.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod shift {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ShiftStatus {
        Active,
        Ended,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftStart {
        pub employee_id: i64,
        /// Defaults to the employee's home branch.
        pub branch_id: Option<i64>,
        pub initial_cash: String,
        /// Optional: if absent, server uses now().
        pub started_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftEnd {
        /// Optional: if absent, server uses now().
        pub ended_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ParticipantAdd {
        pub employee_id: i64,
        /// Optional: if absent, server uses now().
        pub added_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ParticipantView {
        pub employee_id: i64,
        pub added_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShiftView {
        pub id: Uuid,
        pub branch_id: i64,
        pub employee_id: i64,
        pub status: ShiftStatus,
        pub started_at: DateTime<Utc>,
        pub ended_at: Option<DateTime<Utc>>,
        pub initial_cash: String,
        /// Set once the shift has ended.
        pub final_balance: Option<String>,
        #[serde(default)]
        pub participants: Vec<ParticipantView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ActiveShiftResponse {
        pub shift: Option<ShiftView>,
    }
}

pub mod balance {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BalanceMode {
        /// Maintained totals.
        #[default]
        Incremental,
        /// Full ledger scan.
        Scan,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BalanceQuery {
        pub mode: Option<BalanceMode>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BalanceView {
        pub initial_cash: String,
        pub balance: String,
        pub total_purchase: String,
        pub total_sale: String,
        pub total_expense: String,
        pub total_loan: String,
        pub total_repayment: String,
        pub total_debt: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReconciliationView {
        pub incremental: BalanceView,
        pub scan: BalanceView,
        pub consistent: bool,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Purchase,
        Sale,
        Expense,
        Loan,
        Repayment,
        Debt,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PartyType {
        Seller,
        Buyer,
        Employee,
        None,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum PaymentMethod {
        Cash,
        Check,
        OnlineTransfer,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Pending,
        Completed,
        Cancelled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LineItemNew {
        pub item_id: i64,
        pub quantity: String,
        /// Optional: if absent, the current catalog price is used.
        pub unit_price: Option<String>,
    }

    /// Request body for recording a transaction.
    ///
    /// An `Idempotency-Key` header makes retries safe.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub shift_id: Uuid,
        pub kind: TransactionKind,
        pub party_type: Option<PartyType>,
        pub party_id: Option<i64>,
        pub payment_method: Option<PaymentMethod>,
        /// Required for non-itemized kinds; purchases and sales derive it.
        pub amount: Option<String>,
        #[serde(default)]
        pub items: Vec<LineItemNew>,
        pub notes: Option<String>,
        /// Create directly as completed.
        #[serde(default)]
        pub complete: bool,
        /// Optional: if absent, server uses now().
        pub created_at: Option<DateTime<FixedOffset>>,
    }

    /// Patch for a pending transaction; absent fields are left unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub party_type: Option<PartyType>,
        pub party_id: Option<i64>,
        pub payment_method: Option<PaymentMethod>,
        pub amount: Option<String>,
        /// Replaces every line item when present.
        pub items: Option<Vec<LineItemNew>>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionComplete {
        /// Optional: if absent, server uses now().
        pub completed_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionCancel {
        /// Optional: if absent, server uses now().
        pub cancelled_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionReverse {
        pub notes: Option<String>,
        /// Optional: if absent, server uses now().
        pub created_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LineItemView {
        pub id: i64,
        pub item_id: i64,
        pub quantity: String,
        pub unit_price: String,
        pub subtotal: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: i64,
        pub shift_id: Uuid,
        pub branch_id: i64,
        pub kind: TransactionKind,
        pub party_type: PartyType,
        pub party_id: Option<i64>,
        pub payment_method: PaymentMethod,
        pub status: TransactionStatus,
        pub total_amount: String,
        pub notes: Option<String>,
        pub created_at: DateTime<Utc>,
        pub completed_at: Option<DateTime<Utc>>,
        pub cancelled_at: Option<DateTime<Utc>>,
        /// Set on compensating records.
        pub reversal_of: Option<i64>,
        pub items: Vec<LineItemView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub limit: Option<u64>,
        /// Opaque pagination cursor (base64), from `next_cursor`.
        ///
        /// Oldest → newer pagination.
        pub cursor: Option<String>,
        pub kind: Option<TransactionKind>,
        pub status: Option<TransactionStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page.
        pub next_cursor: Option<String>,
    }
}

pub mod inventory {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InventoryQuery {
        pub month: u32,
        pub year: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ItemInventoryView {
        pub item_id: i64,
        pub previous_month_quantity: String,
        /// One entry per day of the month, day 1 first.
        pub daily_deltas: Vec<String>,
        pub running_series: Vec<String>,
        pub running_total: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct InventoryMatrixView {
        pub branch_id: i64,
        pub year: i32,
        pub month: u32,
        pub days_in_month: u32,
        pub items: Vec<ItemInventoryView>,
    }

    /// Closing quantity of an item for a past month.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SnapshotRecord {
        pub item_id: i64,
        pub month: u32,
        pub year: i32,
        pub quantity: String,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
    }
}
