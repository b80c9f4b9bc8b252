#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, Value};

use engine::{
    CreateTransactionCmd, Engine, InventoryRefresh, LineItemInput, Money, PartyType, Quantity,
    Shift, StartShiftCmd, Transaction, TransactionKind,
};
use migration::MigratorTrait;

/// Branch in Asia/Manila (UTC+8).
pub const MAIN: i64 = 1;
/// Branch in UTC.
pub const NORTH: i64 = 2;

pub const ANA: i64 = 1;
pub const BEN: i64 = 2;
/// No home branch.
pub const CARA: i64 = 3;
/// Deactivated.
pub const DAN: i64 = 4;
pub const EVE: i64 = 5;

pub const SELLER: i64 = 1;
pub const BUYER: i64 = 2;

/// Global price 25.00, buyer price 30.00.
pub const COPPER: i64 = 10;
/// Global price 3.00, 4.00 at the main branch.
pub const CARTON: i64 = 20;
/// Never priced.
pub const UNPRICED: i64 = 30;

pub async fn exec(db: &DatabaseConnection, sql: &str, values: Vec<Value>) {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        sql,
        values,
    ))
    .await
    .unwrap();
}

pub async fn seeded_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    for (id, name, tz) in [(MAIN, "Main", "Asia/Manila"), (NORTH, "North", "UTC")] {
        exec(
            &db,
            "INSERT INTO branches (id, name, timezone) VALUES (?, ?, ?)",
            vec![id.into(), name.into(), tz.into()],
        )
        .await;
    }
    for (id, name, branch, active) in [
        (ANA, "Ana", Some(MAIN), true),
        (BEN, "Ben", Some(MAIN), true),
        (CARA, "Cara", None, true),
        (DAN, "Dan", Some(MAIN), false),
        (EVE, "Eve", Some(NORTH), true),
    ] {
        exec(
            &db,
            "INSERT INTO employees (id, name, branch_id, active) VALUES (?, ?, ?, ?)",
            vec![id.into(), name.into(), branch.into(), active.into()],
        )
        .await;
    }
    for (id, kind, name) in [(SELLER, "seller", "Scrap Seller"), (BUYER, "buyer", "Mill")] {
        exec(
            &db,
            "INSERT INTO parties (id, kind, name) VALUES (?, ?, ?)",
            vec![id.into(), kind.into(), name.into()],
        )
        .await;
    }
    let since = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    for (item, branch, buyer, price) in [
        (COPPER, None, None, 2500_i64),
        (COPPER, None, Some(BUYER), 3000),
        (CARTON, None, None, 300),
        (CARTON, Some(MAIN), None, 400),
    ] {
        exec(
            &db,
            "INSERT INTO item_prices (item_id, branch_id, buyer_id, price_minor, effective_from) \
             VALUES (?, ?, ?, ?, ?)",
            vec![
                item.into(),
                branch.into(),
                buyer.into(),
                price.into(),
                since.into(),
            ],
        )
        .await;
    }

    db
}

pub async fn engine() -> Engine {
    engine_with(InventoryRefresh::Eager).await
}

pub async fn engine_with(mode: InventoryRefresh) -> Engine {
    Engine::builder()
        .database(seeded_db().await)
        .inventory_refresh(mode)
        .build()
        .await
        .unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn money(raw: &str) -> Money {
    raw.parse().unwrap()
}

pub fn qty(units: i64) -> Quantity {
    Quantity::units(units)
}

pub async fn open_shift(engine: &Engine, employee_id: i64, cash: &str) -> Shift {
    engine
        .start_shift(StartShiftCmd::new(
            employee_id,
            money(cash),
            at(2026, 4, 1, 0),
        ))
        .await
        .unwrap()
}

pub fn purchase(shift: &Shift, item_id: i64, units: i64, at: DateTime<Utc>) -> CreateTransactionCmd {
    CreateTransactionCmd::new(shift.id, TransactionKind::Purchase, at)
        .party(PartyType::Seller, SELLER)
        .item(LineItemInput::new(item_id, qty(units)))
}

pub fn sale(shift: &Shift, item_id: i64, units: i64, at: DateTime<Utc>) -> CreateTransactionCmd {
    CreateTransactionCmd::new(shift.id, TransactionKind::Sale, at)
        .item(LineItemInput::new(item_id, qty(units)))
}

pub fn cash_kind(
    shift: &Shift,
    kind: TransactionKind,
    amount: &str,
    at: DateTime<Utc>,
) -> CreateTransactionCmd {
    CreateTransactionCmd::new(shift.id, kind, at).amount(money(amount))
}

pub async fn record(engine: &Engine, cmd: CreateTransactionCmd) -> Transaction {
    engine.create_transaction(cmd.completed()).await.unwrap()
}
