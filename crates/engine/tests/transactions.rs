mod common;

use std::sync::Arc;

use common::*;
use engine::{
    CreateTransactionCmd, EngineError, LineItemInput, Money, PartyType, PaymentMethod, Quantity,
    ReverseTransactionCmd, TransactionKind, TransactionListFilter, TransactionStatus,
    UpdatePendingCmd,
};

#[tokio::test]
async fn purchase_prices_items_from_the_branch_catalog() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "1000").await;

    let tx = engine
        .create_transaction(
            purchase(&shift, CARTON, 5, at(2026, 4, 1, 1))
                .item(LineItemInput::new(COPPER, Quantity::from_milli(2_350))),
        )
        .await
        .unwrap();

    assert_eq!(tx.status, TransactionStatus::Pending);
    assert_eq!(tx.branch_id, MAIN);
    assert_eq!(tx.items.len(), 2);
    // Branch-specific price wins over the global one.
    assert_eq!(tx.items[0].unit_price, money("4.00"));
    assert_eq!(tx.items[0].subtotal, money("20.00"));
    assert_eq!(tx.items[1].unit_price, money("25.00"));
    assert_eq!(tx.items[1].subtotal, money("58.75"));
    assert_eq!(tx.total_amount, money("78.75"));
    assert!(tx.items.iter().all(|item| item.id > 0));

    let loaded = engine.transaction(tx.id).await.unwrap();
    assert_eq!(loaded, tx);
}

#[tokio::test]
async fn sale_prefers_the_buyer_price() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "0").await;

    let to_buyer = record(
        &engine,
        sale(&shift, COPPER, 2, at(2026, 4, 1, 1)).party(PartyType::Buyer, BUYER),
    )
    .await;
    assert_eq!(to_buyer.items[0].unit_price, money("30.00"));

    let walk_in = record(&engine, sale(&shift, CARTON, 2, at(2026, 4, 1, 2))).await;
    assert_eq!(walk_in.items[0].unit_price, money("4.00"));

    // Explicit prices override the catalog.
    let haggled = record(
        &engine,
        CreateTransactionCmd::new(shift.id, TransactionKind::Sale, at(2026, 4, 1, 3)).item(
            LineItemInput::new(COPPER, qty(1)).unit_price(money("27.10")),
        ),
    )
    .await;
    assert_eq!(haggled.total_amount, money("27.10"));
}

#[tokio::test]
async fn create_validates_shape() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "0").await;
    let t = at(2026, 4, 1, 1);

    let cases = [
        (
            "unpriced item",
            purchase(&shift, UNPRICED, 1, t),
        ),
        (
            "itemized with amount",
            purchase(&shift, COPPER, 1, t).amount(money("1")),
        ),
        (
            "purchase without items",
            CreateTransactionCmd::new(shift.id, TransactionKind::Purchase, t),
        ),
        (
            "expense with items",
            cash_kind(&shift, TransactionKind::Expense, "1", t)
                .item(LineItemInput::new(COPPER, qty(1))),
        ),
        (
            "expense without amount",
            CreateTransactionCmd::new(shift.id, TransactionKind::Expense, t),
        ),
        (
            "negative amount",
            cash_kind(&shift, TransactionKind::Expense, "-1", t),
        ),
        (
            "party type without id",
            {
                let mut cmd = cash_kind(&shift, TransactionKind::Loan, "1", t);
                cmd.party_type = PartyType::Seller;
                cmd
            },
        ),
        (
            "id without party type",
            {
                let mut cmd = cash_kind(&shift, TransactionKind::Loan, "1", t);
                cmd.party_id = Some(SELLER);
                cmd
            },
        ),
        (
            "zero amount completed",
            cash_kind(&shift, TransactionKind::Expense, "0", t).completed(),
        ),
        (
            "zero quantity completed",
            purchase(&shift, COPPER, 0, t).completed(),
        ),
    ];

    for (label, cmd) in cases {
        let err = engine.create_transaction(cmd).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)), "{label}: {err}");
    }

    let balance = engine.compute_balance(shift.id).await.unwrap();
    assert_eq!(balance.balance, Money::ZERO);
}

#[tokio::test]
async fn create_checks_references() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "0").await;
    let t = at(2026, 4, 1, 1);

    let err = engine
        .create_transaction(cash_kind(&shift, TransactionKind::Loan, "5", t).party(PartyType::Seller, 99))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "{err}");

    // A buyer id is not a seller.
    let err = engine
        .create_transaction(
            cash_kind(&shift, TransactionKind::Loan, "5", t).party(PartyType::Seller, BUYER),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "{err}");

    let err = engine
        .create_transaction(
            CreateTransactionCmd::new(uuid::Uuid::new_v4(), TransactionKind::Expense, t)
                .amount(money("5")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "{err}");

    let loan = engine
        .create_transaction(
            cash_kind(&shift, TransactionKind::Loan, "5", t).party(PartyType::Employee, BEN),
        )
        .await
        .unwrap();
    assert_eq!(loan.party_type, PartyType::Employee);
    assert_eq!(loan.party_id, Some(BEN));
}

#[tokio::test]
async fn idempotency_key_returns_the_first_record() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "100").await;
    let cmd = || {
        cash_kind(&shift, TransactionKind::Expense, "10", at(2026, 4, 1, 1))
            .idempotency_key("receipt-17")
            .completed()
    };

    let first = engine.create_transaction(cmd()).await.unwrap();
    let second = engine.create_transaction(cmd()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.idempotency_key.as_deref(), Some("receipt-17"));

    let balance = engine.compute_balance(shift.id).await.unwrap();
    assert_eq!(balance.total_expense, money("10"));
    assert_eq!(balance.balance, money("90"));
}

#[tokio::test]
async fn completing_twice_applies_once() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "100").await;
    let tx = engine
        .create_transaction(sale(&shift, COPPER, 2, at(2026, 4, 1, 1)))
        .await
        .unwrap();

    let done = engine
        .complete_transaction(tx.id, at(2026, 4, 1, 2))
        .await
        .unwrap();
    assert_eq!(done.status, TransactionStatus::Completed);
    assert_eq!(done.completed_at, Some(at(2026, 4, 1, 2)));

    let again = engine
        .complete_transaction(tx.id, at(2026, 4, 1, 3))
        .await
        .unwrap();
    assert_eq!(again, done);

    let balance = engine.compute_balance(shift.id).await.unwrap();
    assert_eq!(balance.total_sale, money("50"));
    assert_eq!(balance.balance, money("150"));
}

#[tokio::test]
async fn pending_values_never_reach_the_totals() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "500").await;

    let draft = engine
        .create_transaction(
            CreateTransactionCmd::new(shift.id, TransactionKind::Purchase, at(2026, 4, 1, 1))
                .party(PartyType::Seller, SELLER)
                .item(LineItemInput::new(COPPER, Quantity::ZERO).unit_price(Money::ZERO)),
        )
        .await
        .unwrap();
    assert_eq!(draft.total_amount, Money::ZERO);

    let err = engine
        .complete_transaction(draft.id, at(2026, 4, 1, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "{err}");
    assert_eq!(
        engine.transaction(draft.id).await.unwrap().status,
        TransactionStatus::Pending
    );

    let edited = engine
        .update_pending_transaction(
            draft.id,
            UpdatePendingCmd::new()
                .items(vec![
                    LineItemInput::new(COPPER, qty(4)),
                    LineItemInput::new(CARTON, qty(10)).unit_price(money("3.50")),
                ])
                .payment_method(PaymentMethod::OnlineTransfer)
                .notes("  weighed twice  "),
        )
        .await
        .unwrap();
    assert_eq!(edited.items.len(), 2);
    assert_eq!(edited.total_amount, money("135.00"));
    assert_eq!(edited.payment_method, PaymentMethod::OnlineTransfer);
    assert_eq!(edited.notes.as_deref(), Some("weighed twice"));
    assert_eq!(
        engine.compute_balance(shift.id).await.unwrap().balance,
        money("500")
    );

    engine
        .complete_transaction(draft.id, at(2026, 4, 1, 3))
        .await
        .unwrap();
    let balance = engine.compute_balance(shift.id).await.unwrap();
    assert_eq!(balance.total_purchase, money("135.00"));
    assert_eq!(balance.balance, money("365.00"));
    assert_eq!(
        engine.compute_balance_scan(shift.id).await.unwrap(),
        balance
    );
}

#[tokio::test]
async fn update_only_touches_pending_records() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "0").await;
    let done = record(
        &engine,
        cash_kind(&shift, TransactionKind::Expense, "3", at(2026, 4, 1, 1)),
    )
    .await;

    let err = engine
        .update_pending_transaction(done.id, UpdatePendingCmd::new().amount(money("4")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let pending = engine
        .create_transaction(cash_kind(&shift, TransactionKind::Expense, "0", at(2026, 4, 1, 2)))
        .await
        .unwrap();
    let err = engine
        .update_pending_transaction(
            pending.id,
            UpdatePendingCmd::new().items(vec![LineItemInput::new(COPPER, qty(1))]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let updated = engine
        .update_pending_transaction(pending.id, UpdatePendingCmd::new().amount(money("6.25")))
        .await
        .unwrap();
    assert_eq!(updated.total_amount, money("6.25"));
    assert_eq!(updated.status, TransactionStatus::Pending);
}

#[tokio::test]
async fn cancel_rules() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "0").await;
    let pending = engine
        .create_transaction(cash_kind(&shift, TransactionKind::Expense, "2", at(2026, 4, 1, 1)))
        .await
        .unwrap();

    let cancelled = engine
        .cancel_transaction(pending.id, at(2026, 4, 1, 2))
        .await
        .unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);
    assert_eq!(cancelled.cancelled_at, Some(at(2026, 4, 1, 2)));

    let again = engine
        .cancel_transaction(pending.id, at(2026, 4, 1, 3))
        .await
        .unwrap();
    assert_eq!(again, cancelled);

    let err = engine
        .complete_transaction(pending.id, at(2026, 4, 1, 4))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let done = record(
        &engine,
        cash_kind(&shift, TransactionKind::Expense, "2", at(2026, 4, 1, 5)),
    )
    .await;
    let err = engine
        .cancel_transaction(done.id, at(2026, 4, 1, 6))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    assert_eq!(
        engine.compute_balance(shift.id).await.unwrap().total_expense,
        money("2")
    );
}

#[tokio::test]
async fn writes_after_end_fail_fast() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "0").await;
    let pending = engine
        .create_transaction(cash_kind(&shift, TransactionKind::Expense, "2", at(2026, 4, 1, 1)))
        .await
        .unwrap();
    engine.end_shift(shift.id, at(2026, 4, 1, 8)).await.unwrap();

    let err = engine
        .create_transaction(cash_kind(&shift, TransactionKind::Expense, "1", at(2026, 4, 1, 9)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let err = engine
        .complete_transaction(pending.id, at(2026, 4, 1, 9))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let err = engine
        .update_pending_transaction(pending.id, UpdatePendingCmd::new().amount(money("3")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    // Leftover drafts can still be discarded.
    let cancelled = engine
        .cancel_transaction(pending.id, at(2026, 4, 1, 9))
        .await
        .unwrap();
    assert_eq!(cancelled.status, TransactionStatus::Cancelled);
}

#[tokio::test]
async fn reversal_negates_the_original() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "1000").await;
    let original = record(&engine, sale(&shift, COPPER, 4, at(2026, 4, 1, 1))).await;
    assert_eq!(
        engine.compute_balance(shift.id).await.unwrap().balance,
        money("1100")
    );

    let reversal = engine
        .reverse_transaction(
            ReverseTransactionCmd::new(original.id, at(2026, 4, 1, 2))
                .notes("wrong scale")
                .idempotency_key("rev-1"),
        )
        .await
        .unwrap();
    assert_eq!(reversal.reversal_of, Some(original.id));
    assert_eq!(reversal.status, TransactionStatus::Completed);
    assert_eq!(reversal.kind, TransactionKind::Sale);
    assert_eq!(reversal.total_amount, original.total_amount);
    assert_eq!(reversal.items.len(), 1);
    assert_eq!(reversal.notes.as_deref(), Some("wrong scale"));

    let balance = engine.compute_balance(shift.id).await.unwrap();
    assert_eq!(balance.balance, money("1000"));
    assert_eq!(balance.total_sale, Money::ZERO);
    assert_eq!(engine.compute_balance_scan(shift.id).await.unwrap(), balance);

    // Same key, same record.
    let retried = engine
        .reverse_transaction(
            ReverseTransactionCmd::new(original.id, at(2026, 4, 1, 3)).idempotency_key("rev-1"),
        )
        .await
        .unwrap();
    assert_eq!(retried.id, reversal.id);

    let err = engine
        .reverse_transaction(ReverseTransactionCmd::new(original.id, at(2026, 4, 1, 4)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)), "already reversed");

    let err = engine
        .reverse_transaction(ReverseTransactionCmd::new(reversal.id, at(2026, 4, 1, 4)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)), "reversal of reversal");

    let pending = engine
        .create_transaction(cash_kind(&shift, TransactionKind::Expense, "1", at(2026, 4, 1, 5)))
        .await
        .unwrap();
    let err = engine
        .reverse_transaction(ReverseTransactionCmd::new(pending.id, at(2026, 4, 1, 6)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)), "pending");
}

#[tokio::test]
async fn listing_pages_in_replay_order() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "100").await;
    for hour in [3, 1, 2] {
        record(
            &engine,
            cash_kind(&shift, TransactionKind::Expense, &hour.to_string(), at(2026, 4, 1, hour)),
        )
        .await;
    }
    engine
        .create_transaction(cash_kind(&shift, TransactionKind::Loan, "1", at(2026, 4, 1, 4)))
        .await
        .unwrap();

    let all = TransactionListFilter::default();
    let (page, cursor) = engine
        .list_shift_transactions(shift.id, 2, None, &all)
        .await
        .unwrap();
    let amounts: Vec<Money> = page.iter().map(|tx| tx.total_amount).collect();
    assert_eq!(amounts, vec![money("1"), money("2")]);
    let cursor = cursor.unwrap();

    let (page, cursor) = engine
        .list_shift_transactions(shift.id, 2, Some(&cursor), &all)
        .await
        .unwrap();
    let amounts: Vec<Money> = page.iter().map(|tx| tx.total_amount).collect();
    assert_eq!(amounts, vec![money("3"), money("1")]);
    assert!(cursor.is_none());

    let pending_only = TransactionListFilter {
        kinds: None,
        statuses: Some(vec![TransactionStatus::Pending]),
    };
    let (page, _) = engine
        .list_shift_transactions(shift.id, 10, None, &pending_only)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].kind, TransactionKind::Loan);

    let err = engine
        .list_shift_transactions(shift.id, 10, Some("not-a-cursor"), &all)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_completions_on_one_shift_are_all_counted() {
    let engine = Arc::new(engine().await);
    let shift = open_shift(&engine, ANA, "1000").await;
    engine
        .add_participant(shift.id, BEN, at(2026, 4, 1, 0))
        .await
        .unwrap();

    let first = engine
        .create_transaction(sale(&shift, COPPER, 2, at(2026, 4, 1, 1)))
        .await
        .unwrap();
    let second = engine
        .create_transaction(sale(&shift, CARTON, 5, at(2026, 4, 1, 1)))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.complete_transaction(first.id, at(2026, 4, 1, 2)).await })
        },
        {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.complete_transaction(second.id, at(2026, 4, 1, 2)).await })
        },
    );
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    let balance = engine.compute_balance(shift.id).await.unwrap();
    assert_eq!(balance.total_sale, money("70.00"));
    assert_eq!(balance.balance, money("1070.00"));
    assert!(engine.reconcile_shift(shift.id).await.unwrap().consistent);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_with_one_key_record_once() {
    let engine = Arc::new(engine().await);
    let shift = open_shift(&engine, ANA, "100").await;

    let mut tasks = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        let cmd = cash_kind(&shift, TransactionKind::Expense, "5", at(2026, 4, 1, 1))
            .idempotency_key("till-slip")
            .completed();
        tasks.push(tokio::spawn(async move { engine.create_transaction(cmd).await }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    assert_eq!(
        engine.compute_balance(shift.id).await.unwrap().balance,
        money("95")
    );
}
