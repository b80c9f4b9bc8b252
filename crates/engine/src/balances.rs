//! Shift balance arithmetic.
//!
//! `balance = initial_cash + sales + repayments - purchases - expenses - loans`.
//! Debts are tracked for display but do not move shift cash.

use serde::{Deserialize, Serialize};

use crate::{Money, TransactionKind};

/// Cash position of a shift.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub initial_cash: Money,
    pub balance: Money,
    pub total_purchase: Money,
    pub total_sale: Money,
    pub total_expense: Money,
    pub total_loan: Money,
    pub total_repayment: Money,
    pub total_debt: Money,
}

/// Both aggregation paths side by side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub incremental: Balance,
    pub scan: Balance,
    pub consistent: bool,
}

impl Reconciliation {
    pub(crate) fn new(incremental: Balance, scan: Balance) -> Self {
        Self {
            incremental,
            scan,
            consistent: incremental == scan,
        }
    }
}

/// Unsigned per-kind sums.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Totals {
    pub purchase: Money,
    pub sale: Money,
    pub expense: Money,
    pub loan: Money,
    pub repayment: Money,
    pub debt: Money,
}

impl Totals {
    pub(crate) fn slot_mut(&mut self, kind: TransactionKind) -> &mut Money {
        match kind {
            TransactionKind::Purchase => &mut self.purchase,
            TransactionKind::Sale => &mut self.sale,
            TransactionKind::Expense => &mut self.expense,
            TransactionKind::Loan => &mut self.loan,
            TransactionKind::Repayment => &mut self.repayment,
            TransactionKind::Debt => &mut self.debt,
        }
    }

    /// Adds a signed contribution (negative for reversals) to `kind`.
    pub(crate) fn apply(&mut self, kind: TransactionKind, amount: Money) {
        *self.slot_mut(kind) += amount;
    }

    pub(crate) fn into_balance(mut self, initial_cash: Money) -> Balance {
        let balance = TransactionKind::ALL
            .into_iter()
            .fold(initial_cash, |acc, kind| match kind.cash_sign() {
                1 => acc + *self.slot_mut(kind),
                -1 => acc - *self.slot_mut(kind),
                _ => acc,
            });
        Balance {
            initial_cash,
            balance,
            total_purchase: self.purchase,
            total_sale: self.sale,
            total_expense: self.expense,
            total_loan: self.loan,
            total_repayment: self.repayment,
            total_debt: self.debt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_and_purchase_move_cash() {
        let mut totals = Totals::default();
        totals.apply(TransactionKind::Sale, Money::new(50_000));
        totals.apply(TransactionKind::Purchase, Money::new(20_000));
        let balance = totals.into_balance(Money::new(100_000));
        assert_eq!(balance.balance, Money::new(130_000));
        assert_eq!(balance.total_sale, Money::new(50_000));
        assert_eq!(balance.total_purchase, Money::new(20_000));
    }

    #[test]
    fn debt_does_not_move_cash() {
        let mut totals = Totals::default();
        totals.apply(TransactionKind::Debt, Money::new(7_500));
        totals.apply(TransactionKind::Loan, Money::new(1_000));
        totals.apply(TransactionKind::Repayment, Money::new(400));
        totals.apply(TransactionKind::Expense, Money::new(100));
        let balance = totals.into_balance(Money::new(10_000));
        assert_eq!(balance.balance, Money::new(9_300));
        assert_eq!(balance.total_debt, Money::new(7_500));
    }

    #[test]
    fn every_kind_moves_cash_in_its_direction() {
        for kind in TransactionKind::ALL {
            let mut totals = Totals::default();
            totals.apply(kind, Money::new(500));
            let balance = totals.into_balance(Money::new(1_000));
            assert_eq!(
                balance.balance,
                Money::new(1_000 + 500 * kind.cash_sign()),
                "{}",
                kind.as_str()
            );
        }
    }
}
