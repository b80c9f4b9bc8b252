mod common;

use common::*;
use engine::{
    Engine, EngineError, InventoryMatrix, InventoryRefresh, Quantity, ReverseTransactionCmd,
    StartShiftCmd,
};

fn deltas(matrix: &InventoryMatrix, item_id: i64) -> Vec<i64> {
    matrix.items[&item_id]
        .daily_deltas
        .iter()
        .map(|q| q.milli() / Quantity::SCALE)
        .collect()
}

#[tokio::test]
async fn carryover_plus_daily_movements() {
    let engine = engine().await;
    engine
        .record_previous_period(MAIN, COPPER, 3, 2026, qty(50))
        .await
        .unwrap();
    let shift = open_shift(&engine, ANA, "5000").await;

    // 10:00 and 18:00 in Manila.
    record(&engine, purchase(&shift, COPPER, 20, at(2026, 4, 5, 2))).await;
    record(&engine, sale(&shift, COPPER, 10, at(2026, 4, 10, 10))).await;

    let matrix = engine.get_matrix(MAIN, 4, 2026).await.unwrap();
    assert_eq!(matrix.days_in_month, 30);
    let item = &matrix.items[&COPPER];
    assert_eq!(item.previous_month_quantity, qty(50));
    let mut expected = vec![0; 30];
    expected[4] = 20;
    expected[9] = -10;
    assert_eq!(deltas(&matrix, COPPER), expected);
    assert_eq!(item.running_series[3], qty(50));
    assert_eq!(item.running_series[4], qty(70));
    assert_eq!(item.running_series[29], qty(60));
    assert_eq!(item.running_total, qty(60));
}

#[tokio::test]
async fn eager_cells_match_lazy_scan() {
    let db = seeded_db().await;
    let eager = Engine::builder()
        .database(db.clone())
        .inventory_refresh(InventoryRefresh::Eager)
        .build()
        .await
        .unwrap();
    let lazy = Engine::builder()
        .database(db)
        .inventory_refresh(InventoryRefresh::Lazy)
        .build()
        .await
        .unwrap();

    eager
        .record_previous_period(MAIN, CARTON, 3, 2026, qty(7))
        .await
        .unwrap();
    let shift = open_shift(&eager, ANA, "1000").await;
    for (day, hour) in [(1, 1), (1, 15), (2, 23), (14, 3), (30, 12)] {
        record(&eager, purchase(&shift, CARTON, day + 2, at(2026, 4, day as u32, hour))).await;
        record(&eager, sale(&shift, COPPER, 1, at(2026, 4, day as u32, hour))).await;
    }
    let undone = record(&eager, purchase(&shift, COPPER, 9, at(2026, 4, 20, 5))).await;
    eager
        .reverse_transaction(ReverseTransactionCmd::new(undone.id, at(2026, 4, 21, 5)))
        .await
        .unwrap();
    eager
        .create_transaction(purchase(&shift, CARTON, 100, at(2026, 4, 22, 5)))
        .await
        .unwrap();

    let cells = eager.get_matrix(MAIN, 4, 2026).await.unwrap();
    let scanned = lazy.get_matrix(MAIN, 4, 2026).await.unwrap();
    assert_eq!(cells, scanned);
    assert_eq!(eager.get_matrix_scan(MAIN, 4, 2026).await.unwrap(), cells);

    let carton = &cells.items[&CARTON];
    // 7 + (3 + 3 + 4 + 16 + 32); the pending purchase is ignored.
    assert_eq!(carton.running_total, qty(65));
    let copper = &cells.items[&COPPER];
    assert_eq!(copper.running_total, qty(-5));
    assert_eq!(copper.daily_deltas[19], qty(9));
    assert_eq!(copper.daily_deltas[20], qty(-9));
}

#[tokio::test]
async fn days_follow_the_branch_time_zone() {
    let engine = engine().await;
    let shift = engine
        .start_shift(StartShiftCmd::new(ANA, money("100"), at(2026, 3, 31, 12)))
        .await
        .unwrap();

    // 01:00 on April 1st in Manila, still March 31st in UTC.
    record(&engine, purchase(&shift, CARTON, 3, at(2026, 3, 31, 17))).await;
    // 04:00 on May 1st in Manila.
    record(&engine, purchase(&shift, CARTON, 5, at(2026, 4, 30, 20))).await;

    let march = engine.get_matrix(MAIN, 3, 2026).await.unwrap();
    assert!(march.items.get(&CARTON).is_none());

    let april = engine.get_matrix(MAIN, 4, 2026).await.unwrap();
    assert_eq!(april.items[&CARTON].daily_deltas[0], qty(3));
    assert_eq!(april.items[&CARTON].running_total, qty(3));

    let may = engine.get_matrix(MAIN, 5, 2026).await.unwrap();
    assert_eq!(may.days_in_month, 31);
    assert_eq!(may.items[&CARTON].daily_deltas[0], qty(5));
    assert_eq!(engine.get_matrix_scan(MAIN, 5, 2026).await.unwrap(), may);

    // The UTC branch buckets the same instants by UTC days.
    let north = engine
        .start_shift(StartShiftCmd::new(EVE, money("100"), at(2026, 3, 31, 12)))
        .await
        .unwrap();
    record(&engine, purchase(&north, CARTON, 2, at(2026, 3, 31, 17))).await;
    let north_march = engine.get_matrix(NORTH, 3, 2026).await.unwrap();
    assert_eq!(north_march.items[&CARTON].daily_deltas[30], qty(2));
    assert!(engine.get_matrix(NORTH, 4, 2026).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn january_carries_over_from_december() {
    let engine = engine().await;
    engine
        .record_previous_period(MAIN, COPPER, 12, 2025, qty(12))
        .await
        .unwrap();
    engine
        .record_previous_period(MAIN, COPPER, 1, 2026, qty(99))
        .await
        .unwrap();

    let january = engine.get_matrix(MAIN, 1, 2026).await.unwrap();
    assert_eq!(january.days_in_month, 31);
    assert_eq!(january.items[&COPPER].previous_month_quantity, qty(12));
    assert_eq!(january.items[&COPPER].running_total, qty(12));

    let february = engine.get_matrix(MAIN, 2, 2026).await.unwrap();
    assert_eq!(february.days_in_month, 28);
    assert_eq!(february.items[&COPPER].previous_month_quantity, qty(99));
}

#[tokio::test]
async fn snapshots_are_last_write_wins() {
    let engine = engine().await;
    engine
        .record_previous_period(MAIN, CARTON, 3, 2026, qty(10))
        .await
        .unwrap();
    engine
        .record_previous_period(MAIN, CARTON, 3, 2026, Quantity::from_milli(4_250))
        .await
        .unwrap();

    let april = engine.get_matrix(MAIN, 4, 2026).await.unwrap();
    assert_eq!(
        april.items[&CARTON].previous_month_quantity,
        Quantity::from_milli(4_250)
    );
    assert!(engine.get_matrix(NORTH, 4, 2026).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn inventory_input_is_validated() {
    let engine = engine().await;

    for month in [0, 13] {
        let err = engine
            .record_previous_period(MAIN, CARTON, month, 2026, qty(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)), "month {month}");
        let err = engine.get_matrix(MAIN, month, 2026).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)), "month {month}");
    }

    let err = engine
        .record_previous_period(MAIN, CARTON, 3, 2026, qty(-1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .record_previous_period(99, CARTON, 3, 2026, qty(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    let err = engine.get_matrix(99, 3, 2026).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn switching_from_lazy_to_eager_keeps_earlier_movements() {
    let db = seeded_db().await;
    let lazy = Engine::builder()
        .database(db.clone())
        .inventory_refresh(InventoryRefresh::Lazy)
        .build()
        .await
        .unwrap();
    let shift = open_shift(&lazy, ANA, "5000").await;
    record(&lazy, purchase(&shift, COPPER, 20, at(2026, 4, 5, 2))).await;
    let undone = record(&lazy, purchase(&shift, CARTON, 8, at(2026, 4, 6, 2))).await;

    let eager = Engine::builder()
        .database(db)
        .inventory_refresh(InventoryRefresh::Eager)
        .build()
        .await
        .unwrap();
    eager
        .reverse_transaction(ReverseTransactionCmd::new(undone.id, at(2026, 4, 7, 2)))
        .await
        .unwrap();

    let cells = eager.get_matrix(MAIN, 4, 2026).await.unwrap();
    assert_eq!(cells, eager.get_matrix_scan(MAIN, 4, 2026).await.unwrap());
    assert_eq!(cells.items[&COPPER].running_total, qty(20));
    assert_eq!(cells.items[&CARTON].running_total, qty(0));
}

#[tokio::test]
async fn rebuild_restores_cells_from_the_ledger() {
    let db = seeded_db().await;
    let engine = Engine::builder()
        .database(db.clone())
        .inventory_refresh(InventoryRefresh::Eager)
        .build()
        .await
        .unwrap();
    let shift = open_shift(&engine, ANA, "5000").await;
    record(&engine, purchase(&shift, COPPER, 20, at(2026, 4, 5, 2))).await;
    record(&engine, sale(&shift, COPPER, 10, at(2026, 4, 10, 10))).await;
    record(&engine, purchase(&shift, CARTON, 3, at(2026, 4, 10, 11))).await;

    // Cells lost or edited outside the engine.
    exec(&db, "DELETE FROM inventory_daily_changes WHERE item_id = ?", vec![COPPER.into()]).await;
    exec(
        &db,
        "UPDATE inventory_daily_changes SET change_milli = 99 WHERE item_id = ?",
        vec![CARTON.into()],
    )
    .await;
    let scan = engine.get_matrix_scan(MAIN, 4, 2026).await.unwrap();
    assert_ne!(engine.get_matrix(MAIN, 4, 2026).await.unwrap(), scan);

    let written = engine.rebuild_daily_changes(MAIN, 4, 2026).await.unwrap();
    assert_eq!(written, 3);
    assert_eq!(engine.get_matrix(MAIN, 4, 2026).await.unwrap(), scan);

    assert!(matches!(
        engine.rebuild_daily_changes(MAIN, 13, 2026).await,
        Err(EngineError::Validation(_))
    ));
    assert!(matches!(
        engine.rebuild_daily_changes(99, 4, 2026).await,
        Err(EngineError::NotFound(_))
    ));
}
