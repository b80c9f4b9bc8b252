//! Materialized per-day stock changes.
//!
//! One cell per branch, item and local calendar day. Cells are bumped with
//! an atomic upsert so concurrent shifts of a branch never lose updates.

use sea_orm::{ConnectionTrait, Statement, entity::prelude::*};

use crate::{Quantity, ResultEngine};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory_daily_changes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub branch_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub item_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub year: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub month: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub day: i32,
    pub change_milli: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

const BUMP_SQL: &str = "INSERT INTO inventory_daily_changes \
    (branch_id, item_id, year, month, day, change_milli) VALUES (?, ?, ?, ?, ?, ?) \
    ON CONFLICT (branch_id, item_id, year, month, day) \
    DO UPDATE SET change_milli = change_milli + excluded.change_milli";

/// Adds `change` to the cell for `(branch_id, item_id, day)`.
pub(crate) async fn bump<C: ConnectionTrait>(
    db: &C,
    branch_id: i64,
    item_id: i64,
    (year, month, day): (i32, u32, u32),
    change: Quantity,
) -> ResultEngine<()> {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        BUMP_SQL,
        [
            branch_id.into(),
            item_id.into(),
            year.into(),
            month.into(),
            day.into(),
            change.milli().into(),
        ],
    ))
    .await?;
    Ok(())
}
