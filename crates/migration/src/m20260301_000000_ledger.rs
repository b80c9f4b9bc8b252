//! Ledger schema.
//!
//! - `shifts`: work sessions with incrementally maintained totals
//! - `shift_participants`: co-workers of a shift
//! - `transactions`: financial events recorded against a shift
//! - `transaction_items`: line items of purchases and sales
//! - `inventory_snapshots`: closing stock per branch/item/month
//! - `inventory_daily_changes`: materialized per-day stock changes

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Shifts {
    Table,
    Id,
    BranchId,
    EmployeeId,
    Status,
    StartedAt,
    EndedAt,
    InitialCashMinor,
    TotalPurchaseMinor,
    TotalSaleMinor,
    TotalExpenseMinor,
    TotalLoanMinor,
    TotalRepaymentMinor,
    TotalDebtMinor,
    FinalBalanceMinor,
}

#[derive(Iden)]
enum ShiftParticipants {
    Table,
    ShiftId,
    EmployeeId,
    AddedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    ShiftId,
    BranchId,
    Kind,
    PartyType,
    PartyId,
    PaymentMethod,
    Status,
    TotalAmountMinor,
    Notes,
    CreatedAt,
    CompletedAt,
    CancelledAt,
    IdempotencyKey,
    ReversalOf,
}

#[derive(Iden)]
enum TransactionItems {
    Table,
    Id,
    TransactionId,
    ItemId,
    QuantityMilli,
    UnitPriceMinor,
    SubtotalMinor,
}

#[derive(Iden)]
enum InventorySnapshots {
    Table,
    BranchId,
    ItemId,
    PeriodYear,
    PeriodMonth,
    QuantityMilli,
}

#[derive(Iden)]
enum InventoryDailyChanges {
    Table,
    BranchId,
    ItemId,
    Year,
    Month,
    Day,
    ChangeMilli,
}

fn money(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .default(0)
        .to_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Shifts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Shifts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Shifts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Shifts::BranchId).big_integer().not_null())
                    .col(ColumnDef::new(Shifts::EmployeeId).big_integer().not_null())
                    .col(ColumnDef::new(Shifts::Status).string().not_null())
                    .col(
                        ColumnDef::new(Shifts::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Shifts::EndedAt).timestamp_with_time_zone())
                    .col(&mut money(Shifts::InitialCashMinor))
                    .col(&mut money(Shifts::TotalPurchaseMinor))
                    .col(&mut money(Shifts::TotalSaleMinor))
                    .col(&mut money(Shifts::TotalExpenseMinor))
                    .col(&mut money(Shifts::TotalLoanMinor))
                    .col(&mut money(Shifts::TotalRepaymentMinor))
                    .col(&mut money(Shifts::TotalDebtMinor))
                    .col(ColumnDef::new(Shifts::FinalBalanceMinor).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-shifts-employee_id-status")
                    .table(Shifts::Table)
                    .col(Shifts::EmployeeId)
                    .col(Shifts::Status)
                    .to_owned(),
            )
            .await?;

        // One active shift per employee.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"uidx-shifts-employee_id-active\" \
                 ON shifts (employee_id) WHERE status = 'active'",
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Shift participants
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ShiftParticipants::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ShiftParticipants::ShiftId).uuid().not_null())
                    .col(
                        ColumnDef::new(ShiftParticipants::EmployeeId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ShiftParticipants::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ShiftParticipants::ShiftId)
                            .col(ShiftParticipants::EmployeeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-shift_participants-shift_id")
                            .from(ShiftParticipants::Table, ShiftParticipants::ShiftId)
                            .to(Shifts::Table, Shifts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::ShiftId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::BranchId).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::PartyType).string().not_null())
                    .col(ColumnDef::new(Transactions::PartyId).big_integer())
                    .col(ColumnDef::new(Transactions::PaymentMethod).string().not_null())
                    .col(ColumnDef::new(Transactions::Status).string().not_null())
                    .col(&mut money(Transactions::TotalAmountMinor))
                    .col(ColumnDef::new(Transactions::Notes).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::CompletedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Transactions::CancelledAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Transactions::IdempotencyKey).string())
                    .col(ColumnDef::new(Transactions::ReversalOf).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-shift_id")
                            .from(Transactions::Table, Transactions::ShiftId)
                            .to(Shifts::Table, Shifts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-reversal_of")
                            .from(Transactions::Table, Transactions::ReversalOf)
                            .to(Transactions::Table, Transactions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-shift_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::ShiftId)
                    .col(Transactions::CreatedAt)
                    .col(Transactions::Id)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-branch_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::BranchId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-transactions-shift_id-idempotency_key")
                    .table(Transactions::Table)
                    .col(Transactions::ShiftId)
                    .col(Transactions::IdempotencyKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // A completed transaction can be reversed once.
        manager
            .create_index(
                Index::create()
                    .name("uidx-transactions-reversal_of")
                    .table(Transactions::Table)
                    .col(Transactions::ReversalOf)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transaction items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TransactionItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionItems::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionItems::TransactionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionItems::ItemId).big_integer().not_null())
                    .col(
                        ColumnDef::new(TransactionItems::QuantityMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .col(&mut money(TransactionItems::UnitPriceMinor))
                    .col(&mut money(TransactionItems::SubtotalMinor))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transaction_items-transaction_id")
                            .from(TransactionItems::Table, TransactionItems::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transaction_items-transaction_id")
                    .table(TransactionItems::Table)
                    .col(TransactionItems::TransactionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Inventory
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(InventorySnapshots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventorySnapshots::BranchId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventorySnapshots::ItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventorySnapshots::PeriodYear)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventorySnapshots::PeriodMonth)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventorySnapshots::QuantityMilli)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(InventorySnapshots::BranchId)
                            .col(InventorySnapshots::ItemId)
                            .col(InventorySnapshots::PeriodYear)
                            .col(InventorySnapshots::PeriodMonth),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InventoryDailyChanges::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryDailyChanges::BranchId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryDailyChanges::ItemId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InventoryDailyChanges::Year).integer().not_null())
                    .col(ColumnDef::new(InventoryDailyChanges::Month).integer().not_null())
                    .col(ColumnDef::new(InventoryDailyChanges::Day).integer().not_null())
                    .col(
                        ColumnDef::new(InventoryDailyChanges::ChangeMilli)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(InventoryDailyChanges::BranchId)
                            .col(InventoryDailyChanges::ItemId)
                            .col(InventoryDailyChanges::Year)
                            .col(InventoryDailyChanges::Month)
                            .col(InventoryDailyChanges::Day),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryDailyChanges::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InventorySnapshots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ShiftParticipants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shifts::Table).to_owned())
            .await?;
        Ok(())
    }
}
