//! Master data tables read by the default directory.
//!
//! - `branches`: shops with their local time zone
//! - `employees`: staff with an optional home branch
//! - `parties`: sellers and buyers
//! - `item_prices`: price lists by item, optionally scoped to a branch or buyer

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Branches {
    Table,
    Id,
    Name,
    Location,
    Timezone,
}

#[derive(Iden)]
enum Employees {
    Table,
    Id,
    Name,
    BranchId,
    Active,
}

#[derive(Iden)]
enum Parties {
    Table,
    Id,
    Kind,
    Name,
}

#[derive(Iden)]
enum ItemPrices {
    Table,
    Id,
    ItemId,
    BranchId,
    BuyerId,
    PriceMinor,
    EffectiveFrom,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Branches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Branches::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Branches::Name).string().not_null())
                    .col(ColumnDef::new(Branches::Location).string())
                    .col(
                        ColumnDef::new(Branches::Timezone)
                            .string()
                            .not_null()
                            .default("UTC"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employees::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employees::Name).string().not_null())
                    .col(ColumnDef::new(Employees::BranchId).big_integer())
                    .col(
                        ColumnDef::new(Employees::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-employees-branch_id")
                            .from(Employees::Table, Employees::BranchId)
                            .to(Branches::Table, Branches::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Parties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Parties::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Parties::Kind).string().not_null())
                    .col(ColumnDef::new(Parties::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ItemPrices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ItemPrices::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ItemPrices::ItemId).big_integer().not_null())
                    .col(ColumnDef::new(ItemPrices::BranchId).big_integer())
                    .col(ColumnDef::new(ItemPrices::BuyerId).big_integer())
                    .col(ColumnDef::new(ItemPrices::PriceMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(ItemPrices::EffectiveFrom)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-item_prices-item_id-effective_from")
                    .table(ItemPrices::Table)
                    .col(ItemPrices::ItemId)
                    .col(ItemPrices::EffectiveFrom)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemPrices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Parties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Branches::Table).to_owned())
            .await?;
        Ok(())
    }
}
