//! Master data consumed by the engine.
//!
//! Branches, employees, parties and prices are owned by other systems. The
//! engine only reads them through the traits below; [`DbDirectory`] is the
//! default implementation over the collaborator tables in [`tables`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use crate::{Money, PartyType, ResultEngine, util::parse_timezone};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
    /// Local calendar used for inventory day bucketing.
    pub timezone: Tz,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveEmployee {
    pub id: i64,
    pub branch_id: Option<i64>,
}

/// Pricing context of a line item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceScope {
    /// Branch buying/selling price.
    Branch(i64),
    /// Buyer-specific selling price.
    Buyer(i64),
}

#[async_trait]
pub trait PriceCatalog: Send + Sync {
    /// Latest price effective at `at`, if any.
    async fn current_price(
        &self,
        scope: PriceScope,
        item_id: i64,
        at: DateTime<Utc>,
    ) -> ResultEngine<Option<Money>>;
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn employee_exists(&self, employee_id: i64) -> ResultEngine<bool>;

    /// `None` when the employee is unknown or deactivated.
    async fn active_employee(&self, employee_id: i64) -> ResultEngine<Option<ActiveEmployee>>;

    async fn party_exists(&self, party_type: PartyType, party_id: i64) -> ResultEngine<bool>;
}

#[async_trait]
pub trait BranchRegistry: Send + Sync {
    async fn branch(&self, branch_id: i64) -> ResultEngine<Option<Branch>>;
}

/// Everything the engine needs from master data.
pub trait Directory: PriceCatalog + EmployeeDirectory + BranchRegistry {}

impl<T> Directory for T where T: PriceCatalog + EmployeeDirectory + BranchRegistry {}

/// Collaborator tables read by [`DbDirectory`] and written by admin tooling.
pub mod tables {
    pub mod branches {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "branches")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i64,
            pub name: String,
            pub location: Option<String>,
            /// IANA zone name, e.g. `Asia/Manila`.
            pub timezone: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod employees {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "employees")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i64,
            pub name: String,
            pub branch_id: Option<i64>,
            pub active: bool,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod parties {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "parties")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i64,
            /// `seller` or `buyer`.
            pub kind: String,
            pub name: String,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    pub mod item_prices {
        use sea_orm::entity::prelude::*;

        /// A row with neither `branch_id` nor `buyer_id` is a global default.
        #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
        #[sea_orm(table_name = "item_prices")]
        pub struct Model {
            #[sea_orm(primary_key)]
            pub id: i64,
            pub item_id: i64,
            pub branch_id: Option<i64>,
            pub buyer_id: Option<i64>,
            pub price_minor: i64,
            pub effective_from: DateTimeUtc,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }
}

/// [`Directory`] backed by the collaborator tables.
#[derive(Clone, Debug)]
pub struct DbDirectory {
    database: DatabaseConnection,
}

impl DbDirectory {
    #[must_use]
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    async fn latest_price(
        &self,
        scope: Condition,
        item_id: i64,
        at: DateTime<Utc>,
    ) -> ResultEngine<Option<Money>> {
        use tables::item_prices;

        let price: Option<i64> = item_prices::Entity::find()
            .select_only()
            .column(item_prices::Column::PriceMinor)
            .filter(item_prices::Column::ItemId.eq(item_id))
            .filter(item_prices::Column::EffectiveFrom.lte(at))
            .filter(scope)
            .order_by_desc(item_prices::Column::EffectiveFrom)
            .order_by_desc(item_prices::Column::Id)
            .into_tuple()
            .one(&self.database)
            .await?;
        Ok(price.map(Money::new))
    }
}

#[async_trait]
impl PriceCatalog for DbDirectory {
    async fn current_price(
        &self,
        scope: PriceScope,
        item_id: i64,
        at: DateTime<Utc>,
    ) -> ResultEngine<Option<Money>> {
        use tables::item_prices::Column;

        match scope {
            PriceScope::Buyer(buyer_id) => {
                self.latest_price(
                    Condition::all().add(Column::BuyerId.eq(buyer_id)),
                    item_id,
                    at,
                )
                .await
            }
            PriceScope::Branch(branch_id) => {
                let own = self
                    .latest_price(
                        Condition::all()
                            .add(Column::BranchId.eq(branch_id))
                            .add(Column::BuyerId.is_null()),
                        item_id,
                        at,
                    )
                    .await?;
                if own.is_some() {
                    return Ok(own);
                }
                self.latest_price(
                    Condition::all()
                        .add(Column::BranchId.is_null())
                        .add(Column::BuyerId.is_null()),
                    item_id,
                    at,
                )
                .await
            }
        }
    }
}

#[async_trait]
impl EmployeeDirectory for DbDirectory {
    async fn employee_exists(&self, employee_id: i64) -> ResultEngine<bool> {
        Ok(tables::employees::Entity::find_by_id(employee_id)
            .one(&self.database)
            .await?
            .is_some())
    }

    async fn active_employee(&self, employee_id: i64) -> ResultEngine<Option<ActiveEmployee>> {
        let employee = tables::employees::Entity::find_by_id(employee_id)
            .one(&self.database)
            .await?;
        Ok(employee
            .filter(|employee| employee.active)
            .map(|employee| ActiveEmployee {
                id: employee.id,
                branch_id: employee.branch_id,
            }))
    }

    async fn party_exists(&self, party_type: PartyType, party_id: i64) -> ResultEngine<bool> {
        use tables::parties;

        let kind = match party_type {
            PartyType::Employee => return self.employee_exists(party_id).await,
            PartyType::None => return Ok(false),
            PartyType::Seller | PartyType::Buyer => party_type.as_str(),
        };
        Ok(parties::Entity::find_by_id(party_id)
            .filter(parties::Column::Kind.eq(kind))
            .one(&self.database)
            .await?
            .is_some())
    }
}

#[async_trait]
impl BranchRegistry for DbDirectory {
    async fn branch(&self, branch_id: i64) -> ResultEngine<Option<Branch>> {
        let Some(model) = tables::branches::Entity::find_by_id(branch_id)
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some(Branch {
            id: model.id,
            timezone: parse_timezone(&model.timezone)?,
            name: model.name,
            location: model.location,
        }))
    }
}
