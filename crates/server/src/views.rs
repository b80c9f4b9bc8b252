//! Conversions between engine values and wire types.

use api_types::{
    balance::{BalanceView, ReconciliationView},
    inventory::{InventoryMatrixView, ItemInventoryView},
    shift::{ParticipantView, ShiftStatus as ApiShiftStatus, ShiftView},
    transaction::{
        LineItemNew, LineItemView, PartyType as ApiPartyType, PaymentMethod as ApiPaymentMethod,
        TransactionKind as ApiKind, TransactionStatus as ApiStatus, TransactionView,
    },
};
use chrono::{DateTime, FixedOffset, Utc};
use engine::{
    Balance, InventoryMatrix, LineItemInput, Money, PartyType, PaymentMethod, Quantity,
    Reconciliation, Shift, ShiftParticipant, ShiftStatus, Transaction, TransactionKind,
    TransactionStatus,
};

use crate::ServerError;

pub(crate) fn at_or_now(at: Option<DateTime<FixedOffset>>) -> DateTime<Utc> {
    at.map_or_else(Utc::now, |dt| dt.with_timezone(&Utc))
}

pub(crate) fn parse_money(raw: &str) -> Result<Money, ServerError> {
    Ok(raw.parse::<Money>()?)
}

pub(crate) fn parse_quantity(raw: &str) -> Result<Quantity, ServerError> {
    Ok(raw.parse::<Quantity>()?)
}

pub(crate) fn line_items(items: Vec<LineItemNew>) -> Result<Vec<LineItemInput>, ServerError> {
    items
        .into_iter()
        .map(|item| {
            let mut input = LineItemInput::new(item.item_id, parse_quantity(&item.quantity)?);
            if let Some(price) = item.unit_price.as_deref() {
                input = input.unit_price(parse_money(price)?);
            }
            Ok(input)
        })
        .collect()
}

pub(crate) fn kind_from_api(kind: ApiKind) -> TransactionKind {
    match kind {
        ApiKind::Purchase => TransactionKind::Purchase,
        ApiKind::Sale => TransactionKind::Sale,
        ApiKind::Expense => TransactionKind::Expense,
        ApiKind::Loan => TransactionKind::Loan,
        ApiKind::Repayment => TransactionKind::Repayment,
        ApiKind::Debt => TransactionKind::Debt,
    }
}

fn kind_to_api(kind: TransactionKind) -> ApiKind {
    match kind {
        TransactionKind::Purchase => ApiKind::Purchase,
        TransactionKind::Sale => ApiKind::Sale,
        TransactionKind::Expense => ApiKind::Expense,
        TransactionKind::Loan => ApiKind::Loan,
        TransactionKind::Repayment => ApiKind::Repayment,
        TransactionKind::Debt => ApiKind::Debt,
    }
}

pub(crate) fn party_from_api(party: ApiPartyType) -> PartyType {
    match party {
        ApiPartyType::Seller => PartyType::Seller,
        ApiPartyType::Buyer => PartyType::Buyer,
        ApiPartyType::Employee => PartyType::Employee,
        ApiPartyType::None => PartyType::None,
    }
}

fn party_to_api(party: PartyType) -> ApiPartyType {
    match party {
        PartyType::Seller => ApiPartyType::Seller,
        PartyType::Buyer => ApiPartyType::Buyer,
        PartyType::Employee => ApiPartyType::Employee,
        PartyType::None => ApiPartyType::None,
    }
}

pub(crate) fn method_from_api(method: ApiPaymentMethod) -> PaymentMethod {
    match method {
        ApiPaymentMethod::Cash => PaymentMethod::Cash,
        ApiPaymentMethod::Check => PaymentMethod::Check,
        ApiPaymentMethod::OnlineTransfer => PaymentMethod::OnlineTransfer,
    }
}

fn method_to_api(method: PaymentMethod) -> ApiPaymentMethod {
    match method {
        PaymentMethod::Cash => ApiPaymentMethod::Cash,
        PaymentMethod::Check => ApiPaymentMethod::Check,
        PaymentMethod::OnlineTransfer => ApiPaymentMethod::OnlineTransfer,
    }
}

pub(crate) fn status_from_api(status: ApiStatus) -> TransactionStatus {
    match status {
        ApiStatus::Pending => TransactionStatus::Pending,
        ApiStatus::Completed => TransactionStatus::Completed,
        ApiStatus::Cancelled => TransactionStatus::Cancelled,
    }
}

fn status_to_api(status: TransactionStatus) -> ApiStatus {
    match status {
        TransactionStatus::Pending => ApiStatus::Pending,
        TransactionStatus::Completed => ApiStatus::Completed,
        TransactionStatus::Cancelled => ApiStatus::Cancelled,
    }
}

pub(crate) fn shift_view(shift: Shift, participants: Vec<ShiftParticipant>) -> ShiftView {
    ShiftView {
        id: shift.id,
        branch_id: shift.branch_id,
        employee_id: shift.employee_id,
        status: match shift.status {
            ShiftStatus::Active => ApiShiftStatus::Active,
            ShiftStatus::Ended => ApiShiftStatus::Ended,
        },
        started_at: shift.started_at,
        ended_at: shift.ended_at,
        initial_cash: shift.initial_cash.to_string(),
        final_balance: shift.final_balance.map(|m| m.to_string()),
        participants: participants
            .into_iter()
            .map(|p| ParticipantView {
                employee_id: p.employee_id,
                added_at: p.added_at,
            })
            .collect(),
    }
}

pub(crate) fn balance_view(balance: Balance) -> BalanceView {
    BalanceView {
        initial_cash: balance.initial_cash.to_string(),
        balance: balance.balance.to_string(),
        total_purchase: balance.total_purchase.to_string(),
        total_sale: balance.total_sale.to_string(),
        total_expense: balance.total_expense.to_string(),
        total_loan: balance.total_loan.to_string(),
        total_repayment: balance.total_repayment.to_string(),
        total_debt: balance.total_debt.to_string(),
    }
}

pub(crate) fn reconciliation_view(rec: Reconciliation) -> ReconciliationView {
    ReconciliationView {
        incremental: balance_view(rec.incremental),
        scan: balance_view(rec.scan),
        consistent: rec.consistent,
    }
}

pub(crate) fn transaction_view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        shift_id: tx.shift_id,
        branch_id: tx.branch_id,
        kind: kind_to_api(tx.kind),
        party_type: party_to_api(tx.party_type),
        party_id: tx.party_id,
        payment_method: method_to_api(tx.payment_method),
        status: status_to_api(tx.status),
        total_amount: tx.total_amount.to_string(),
        notes: tx.notes,
        created_at: tx.created_at,
        completed_at: tx.completed_at,
        cancelled_at: tx.cancelled_at,
        reversal_of: tx.reversal_of,
        items: tx
            .items
            .into_iter()
            .map(|item| LineItemView {
                id: item.id,
                item_id: item.item_id,
                quantity: item.quantity.to_string(),
                unit_price: item.unit_price.to_string(),
                subtotal: item.subtotal.to_string(),
            })
            .collect(),
    }
}

pub(crate) fn matrix_view(matrix: InventoryMatrix) -> InventoryMatrixView {
    let strings = |values: Vec<Quantity>| -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    };
    InventoryMatrixView {
        branch_id: matrix.branch_id,
        year: matrix.year,
        month: matrix.month,
        days_in_month: matrix.days_in_month,
        items: matrix
            .items
            .into_values()
            .map(|item| ItemInventoryView {
                item_id: item.item_id,
                previous_month_quantity: item.previous_month_quantity.to_string(),
                daily_deltas: strings(item.daily_deltas),
                running_series: strings(item.running_series),
                running_total: item.running_total.to_string(),
            })
            .collect(),
    }
}
