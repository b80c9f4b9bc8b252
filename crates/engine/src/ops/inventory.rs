use std::collections::BTreeMap;

use chrono_tz::Tz;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::OnConflict,
};

use crate::{
    EngineError, InventoryMatrix, InventoryRefresh, Quantity, ResultEngine, TransactionKind,
    TransactionStatus, daily_changes,
    inventory::MatrixBuilder,
    inventory_snapshots, transaction_items, transactions,
    util::{days_in_month, ensure_month, local_day, month_bounds_utc, previous_period},
};

use super::{Engine, with_tx};

/// One item's stock movement on a local day: `(item_id, day, change)`.
type DayChange = (i64, u32, Quantity);

impl Engine {
    /// Inventory matrix of a branch for one month.
    ///
    /// Daily deltas come from the materialized cells in eager mode and from a
    /// ledger scan in lazy mode.
    pub async fn get_matrix(
        &self,
        branch_id: i64,
        month: u32,
        year: i32,
    ) -> ResultEngine<InventoryMatrix> {
        match self.inventory_refresh {
            InventoryRefresh::Eager => self.build_matrix(branch_id, month, year, false).await,
            InventoryRefresh::Lazy => self.build_matrix(branch_id, month, year, true).await,
        }
    }

    /// Inventory matrix recomputed from completed transactions, regardless of
    /// the refresh mode.
    pub async fn get_matrix_scan(
        &self,
        branch_id: i64,
        month: u32,
        year: i32,
    ) -> ResultEngine<InventoryMatrix> {
        self.build_matrix(branch_id, month, year, true).await
    }

    /// Stores the closing quantity of an item for a month. Last write wins.
    pub async fn record_previous_period(
        &self,
        branch_id: i64,
        item_id: i64,
        month: u32,
        year: i32,
        quantity: Quantity,
    ) -> ResultEngine<()> {
        ensure_month(month)?;
        if quantity.is_negative() {
            return Err(EngineError::Validation(
                "snapshot quantity must not be negative".to_string(),
            ));
        }
        self.branch_zone(branch_id).await?;
        let month_col = period_month(month)?;

        let snapshot = inventory_snapshots::ActiveModel {
            branch_id: ActiveValue::Set(branch_id),
            item_id: ActiveValue::Set(item_id),
            period_year: ActiveValue::Set(year),
            period_month: ActiveValue::Set(month_col),
            quantity_milli: ActiveValue::Set(quantity.milli()),
        };
        inventory_snapshots::Entity::insert(snapshot)
            .on_conflict(
                OnConflict::columns([
                    inventory_snapshots::Column::BranchId,
                    inventory_snapshots::Column::ItemId,
                    inventory_snapshots::Column::PeriodYear,
                    inventory_snapshots::Column::PeriodMonth,
                ])
                .update_column(inventory_snapshots::Column::QuantityMilli)
                .to_owned(),
            )
            .exec_without_returning(&self.database)
            .await?;

        tracing::info!(branch_id, item_id, year, month, quantity = %quantity, "snapshot recorded");
        Ok(())
    }

    /// Replaces the materialized daily changes of a branch month with the
    /// values recomputed from completed transactions. Returns the number of
    /// cells written.
    ///
    /// Repairs cells after the ledger was edited or imported outside the
    /// engine.
    pub async fn rebuild_daily_changes(
        &self,
        branch_id: i64,
        month: u32,
        year: i32,
    ) -> ResultEngine<usize> {
        ensure_month(month)?;
        let zone = self.branch_zone(branch_id).await?;
        let month_col = period_month(month)?;

        let written = with_tx!(self, |db_tx| {
            let mut cells: BTreeMap<(i64, u32), Quantity> = BTreeMap::new();
            for (item_id, day, change) in
                scan_changes(&db_tx, zone, branch_id, month, year).await?
            {
                *cells.entry((item_id, day)).or_insert(Quantity::ZERO) += change;
            }

            daily_changes::Entity::delete_many()
                .filter(daily_changes::Column::BranchId.eq(branch_id))
                .filter(daily_changes::Column::Year.eq(year))
                .filter(daily_changes::Column::Month.eq(month_col))
                .exec(&db_tx)
                .await?;
            for ((item_id, day), change) in &cells {
                daily_changes::bump(&db_tx, branch_id, *item_id, (year, month, *day), *change)
                    .await?;
            }
            Ok::<_, EngineError>(cells.len())
        })?;

        tracing::info!(branch_id, year, month, cells = written, "daily changes rebuilt");
        Ok(written)
    }

    async fn build_matrix(
        &self,
        branch_id: i64,
        month: u32,
        year: i32,
        scan: bool,
    ) -> ResultEngine<InventoryMatrix> {
        ensure_month(month)?;
        let zone = self.branch_zone(branch_id).await?;
        let days = days_in_month(year, month)?;
        let mut builder = MatrixBuilder::new(branch_id, year, month, days);

        let (prev_year, prev_month) = previous_period(year, month);
        let snapshots = inventory_snapshots::Entity::find()
            .filter(inventory_snapshots::Column::BranchId.eq(branch_id))
            .filter(inventory_snapshots::Column::PeriodYear.eq(prev_year))
            .filter(inventory_snapshots::Column::PeriodMonth.eq(period_month(prev_month)?))
            .all(&self.database)
            .await?;
        for snapshot in snapshots {
            builder.previous(snapshot.item_id, Quantity::from_milli(snapshot.quantity_milli));
        }

        if scan {
            for (item_id, day, change) in
                scan_changes(&self.database, zone, branch_id, month, year).await?
            {
                builder.change(item_id, day, change);
            }
        } else {
            let cells = daily_changes::Entity::find()
                .filter(daily_changes::Column::BranchId.eq(branch_id))
                .filter(daily_changes::Column::Year.eq(year))
                .filter(daily_changes::Column::Month.eq(period_month(month)?))
                .order_by_asc(daily_changes::Column::ItemId)
                .order_by_asc(daily_changes::Column::Day)
                .all(&self.database)
                .await?;
            for cell in cells {
                let day = u32::try_from(cell.day).unwrap_or(0);
                builder.change(cell.item_id, day, Quantity::from_milli(cell.change_milli));
            }
        }

        Ok(builder.finish())
    }
}

/// Buckets completed purchase and sale items of a branch month by local day.
async fn scan_changes<C: ConnectionTrait>(
    db: &C,
    zone: Tz,
    branch_id: i64,
    month: u32,
    year: i32,
) -> ResultEngine<Vec<DayChange>> {
    let (start, end) = month_bounds_utc(zone, year, month)?;
    let rows: Vec<(transaction_items::Model, Option<transactions::Model>)> =
        transaction_items::Entity::find()
            .find_also_related(transactions::Entity)
            .filter(transactions::Column::BranchId.eq(branch_id))
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed.as_str()))
            .filter(transactions::Column::Kind.is_in([
                TransactionKind::Purchase.as_str(),
                TransactionKind::Sale.as_str(),
            ]))
            .filter(transactions::Column::CreatedAt.gte(start))
            .filter(transactions::Column::CreatedAt.lt(end))
            .order_by_asc(transactions::Column::CreatedAt)
            .order_by_asc(transaction_items::Column::Id)
            .all(db)
            .await?;

    let mut changes = Vec::with_capacity(rows.len());
    for (item, tx) in rows {
        let Some(tx) = tx else {
            continue;
        };
        let kind = TransactionKind::try_from(tx.kind.as_str())?;
        let sign = kind.stock_sign() * if tx.reversal_of.is_some() { -1 } else { 1 };
        let (_, _, day) = local_day(zone, tx.created_at);
        let quantity = Quantity::from_milli(item.quantity_milli);
        let change = if sign > 0 { quantity } else { -quantity };
        changes.push((item.item_id, day, change));
    }
    Ok(changes)
}

fn period_month(month: u32) -> ResultEngine<i32> {
    i32::try_from(month).map_err(|_| EngineError::Validation(format!("invalid month {month}")))
}
