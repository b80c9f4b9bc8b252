mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::Database;

use common::*;
use engine::{
    ActiveEmployee, Branch, BranchRegistry, EmployeeDirectory, Engine, EngineError, Money,
    PartyType, PriceCatalog, PriceScope, ShiftStatus, StartShiftCmd, TransactionKind,
};
use migration::MigratorTrait;

#[tokio::test]
async fn start_shift_defaults_to_home_branch() {
    let engine = engine().await;

    let shift = open_shift(&engine, ANA, "1000.00").await;
    assert_eq!(shift.branch_id, MAIN);
    assert_eq!(shift.employee_id, ANA);
    assert_eq!(shift.status, ShiftStatus::Active);
    assert_eq!(shift.initial_cash, money("1000"));
    assert!(shift.ended_at.is_none());

    let active = engine.active_shift(ANA).await.unwrap().unwrap();
    assert_eq!(active.id, shift.id);
}

#[tokio::test]
async fn explicit_branch_overrides_home_branch() {
    let engine = engine().await;
    let shift = engine
        .start_shift(StartShiftCmd::new(CARA, Money::ZERO, at(2026, 4, 1, 0)).branch_id(NORTH))
        .await
        .unwrap();
    assert_eq!(shift.branch_id, NORTH);
}

#[tokio::test]
async fn second_active_shift_conflicts() {
    let engine = engine().await;
    open_shift(&engine, ANA, "10").await;

    let err = engine
        .start_shift(StartShiftCmd::new(ANA, money("5"), at(2026, 4, 1, 2)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)), "{err}");

    // Other employees are unaffected.
    open_shift(&engine, BEN, "10").await;
}

#[tokio::test]
async fn start_shift_rejects_bad_input() {
    let engine = engine().await;

    let err = engine
        .start_shift(StartShiftCmd::new(ANA, money("-1"), at(2026, 4, 1, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .start_shift(StartShiftCmd::new(DAN, Money::ZERO, at(2026, 4, 1, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "inactive employee");

    let err = engine
        .start_shift(StartShiftCmd::new(99, Money::ZERO, at(2026, 4, 1, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "unknown employee");

    let err = engine
        .start_shift(StartShiftCmd::new(CARA, Money::ZERO, at(2026, 4, 1, 0)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)), "no branch");

    let err = engine
        .start_shift(StartShiftCmd::new(CARA, Money::ZERO, at(2026, 4, 1, 0)).branch_id(99))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)), "unknown branch");
}

#[tokio::test]
async fn end_shift_freezes_final_balance() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "100.00").await;
    record(
        &engine,
        cash_kind(&shift, TransactionKind::Expense, "12.50", at(2026, 4, 1, 3)),
    )
    .await;

    let ended = engine.end_shift(shift.id, at(2026, 4, 1, 10)).await.unwrap();
    assert_eq!(ended.status, ShiftStatus::Ended);
    assert_eq!(ended.ended_at, Some(at(2026, 4, 1, 10)));
    assert_eq!(ended.final_balance, Some(money("87.50")));

    assert!(engine.active_shift(ANA).await.unwrap().is_none());
    let stored = engine.shift(shift.id).await.unwrap();
    assert_eq!(stored, ended);

    // The employee may start again once the previous shift ended.
    engine
        .start_shift(StartShiftCmd::new(ANA, money("87.50"), at(2026, 4, 2, 0)))
        .await
        .unwrap();
}

#[tokio::test]
async fn ending_twice_is_invalid_state() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "0").await;
    engine.end_shift(shift.id, at(2026, 4, 1, 8)).await.unwrap();

    let err = engine
        .end_shift(shift.id, at(2026, 4, 1, 9))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)), "{err}");
}

#[tokio::test]
async fn end_before_start_is_rejected() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "0").await;

    let err = engine
        .end_shift(shift.id, at(2026, 3, 31, 23))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(
        engine.shift(shift.id).await.unwrap().status,
        ShiftStatus::Active
    );
}

#[tokio::test]
async fn end_unknown_shift_is_not_found() {
    let engine = engine().await;
    let err = engine
        .end_shift(uuid::Uuid::new_v4(), at(2026, 4, 1, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn participants_are_added_once() {
    let engine = engine().await;
    let shift = open_shift(&engine, ANA, "0").await;

    engine
        .add_participant(shift.id, BEN, at(2026, 4, 1, 1))
        .await
        .unwrap();
    engine
        .add_participant(shift.id, BEN, at(2026, 4, 1, 2))
        .await
        .unwrap();
    engine
        .add_participant(shift.id, CARA, at(2026, 4, 1, 3))
        .await
        .unwrap();

    let participants = engine.shift_participants(shift.id).await.unwrap();
    let ids: Vec<i64> = participants.iter().map(|p| p.employee_id).collect();
    assert_eq!(ids, vec![BEN, CARA]);
    assert_eq!(participants[0].added_at, at(2026, 4, 1, 1));

    let err = engine
        .add_participant(shift.id, 99, at(2026, 4, 1, 4))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    engine.end_shift(shift.id, at(2026, 4, 1, 5)).await.unwrap();
    let err = engine
        .add_participant(shift.id, EVE, at(2026, 4, 1, 6))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

/// Directory backed by constants instead of tables.
struct FixedDirectory;

#[async_trait]
impl PriceCatalog for FixedDirectory {
    async fn current_price(
        &self,
        _scope: PriceScope,
        _item_id: i64,
        _at: DateTime<Utc>,
    ) -> Result<Option<Money>, EngineError> {
        Ok(Some(Money::new(100)))
    }
}

#[async_trait]
impl EmployeeDirectory for FixedDirectory {
    async fn employee_exists(&self, employee_id: i64) -> Result<bool, EngineError> {
        Ok(employee_id == 7)
    }

    async fn active_employee(
        &self,
        employee_id: i64,
    ) -> Result<Option<ActiveEmployee>, EngineError> {
        Ok((employee_id == 7).then_some(ActiveEmployee {
            id: 7,
            branch_id: Some(5),
        }))
    }

    async fn party_exists(&self, party_type: PartyType, party_id: i64) -> Result<bool, EngineError> {
        Ok(party_type == PartyType::Seller && party_id == 1)
    }
}

#[async_trait]
impl BranchRegistry for FixedDirectory {
    async fn branch(&self, branch_id: i64) -> Result<Option<Branch>, EngineError> {
        Ok((branch_id == 5).then(|| Branch {
            id: 5,
            name: "Depot".to_string(),
            location: None,
            timezone: chrono_tz::Asia::Manila,
        }))
    }
}

#[tokio::test]
async fn custom_directory_replaces_master_tables() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .directory(Arc::new(FixedDirectory))
        .build()
        .await
        .unwrap();

    let shift = engine
        .start_shift(StartShiftCmd::new(7, money("50"), at(2026, 4, 1, 0)))
        .await
        .unwrap();
    assert_eq!(shift.branch_id, 5);

    let tx = record(&engine, purchase(&shift, 42, 3, at(2026, 4, 1, 1))).await;
    assert_eq!(tx.total_amount, money("3.00"));
    assert_eq!(
        engine.compute_balance(shift.id).await.unwrap().balance,
        money("47.00")
    );
}
