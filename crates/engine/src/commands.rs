//! Command structs for engine operations.
//!
//! These types group parameters for write operations (start shift,
//! create/update/reverse transaction), keeping call sites readable and
//! avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Money, PartyType, PaymentMethod, Quantity, TransactionKind};

/// Open a shift for an employee.
#[derive(Clone, Debug)]
pub struct StartShiftCmd {
    /// Defaults to the employee's home branch.
    pub branch_id: Option<i64>,
    pub employee_id: i64,
    pub initial_cash: Money,
    pub started_at: DateTime<Utc>,
}

impl StartShiftCmd {
    #[must_use]
    pub fn new(employee_id: i64, initial_cash: Money, started_at: DateTime<Utc>) -> Self {
        Self {
            branch_id: None,
            employee_id,
            initial_cash,
            started_at,
        }
    }

    #[must_use]
    pub fn branch_id(mut self, branch_id: i64) -> Self {
        self.branch_id = Some(branch_id);
        self
    }
}

/// One requested line of a purchase or sale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineItemInput {
    pub item_id: i64,
    pub quantity: Quantity,
    /// Falls back to the catalog price when absent.
    pub unit_price: Option<Money>,
}

impl LineItemInput {
    #[must_use]
    pub fn new(item_id: i64, quantity: Quantity) -> Self {
        Self {
            item_id,
            quantity,
            unit_price: None,
        }
    }

    #[must_use]
    pub fn unit_price(mut self, unit_price: Money) -> Self {
        self.unit_price = Some(unit_price);
        self
    }
}

/// Record a transaction against an active shift.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub shift_id: Uuid,
    pub kind: TransactionKind,
    pub party_type: PartyType,
    pub party_id: Option<i64>,
    pub payment_method: PaymentMethod,
    /// Required for non-itemized kinds, rejected for purchases and sales.
    pub amount: Option<Money>,
    pub items: Vec<LineItemInput>,
    pub notes: Option<String>,
    pub idempotency_key: Option<String>,
    /// Create directly as completed.
    pub complete: bool,
    pub created_at: DateTime<Utc>,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(shift_id: Uuid, kind: TransactionKind, created_at: DateTime<Utc>) -> Self {
        Self {
            shift_id,
            kind,
            party_type: PartyType::None,
            party_id: None,
            payment_method: PaymentMethod::Cash,
            amount: None,
            items: Vec::new(),
            notes: None,
            idempotency_key: None,
            complete: false,
            created_at,
        }
    }

    #[must_use]
    pub fn party(mut self, party_type: PartyType, party_id: i64) -> Self {
        self.party_type = party_type;
        self.party_id = Some(party_id);
        self
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = payment_method;
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn item(mut self, item: LineItemInput) -> Self {
        self.items.push(item);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn completed(mut self) -> Self {
        self.complete = true;
        self
    }
}

/// Patch a pending transaction.
///
/// `None` fields are left untouched. `items`, when set, replaces every line.
#[derive(Clone, Debug, Default)]
pub struct UpdatePendingCmd {
    pub party: Option<(PartyType, Option<i64>)>,
    pub payment_method: Option<PaymentMethod>,
    pub amount: Option<Money>,
    pub items: Option<Vec<LineItemInput>>,
    pub notes: Option<String>,
}

impl UpdatePendingCmd {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn party(mut self, party_type: PartyType, party_id: Option<i64>) -> Self {
        self.party = Some((party_type, party_id));
        self
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method: PaymentMethod) -> Self {
        self.payment_method = Some(payment_method);
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn items(mut self, items: Vec<LineItemInput>) -> Self {
        self.items = Some(items);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Compensate a completed transaction.
#[derive(Clone, Debug)]
pub struct ReverseTransactionCmd {
    pub transaction_id: i64,
    pub notes: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReverseTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            transaction_id,
            notes: None,
            idempotency_key: None,
            created_at,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
