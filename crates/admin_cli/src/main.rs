use std::error::Error;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{Engine, Money, Quantity, tables};
use migration::MigratorTrait;
use sea_orm::{ActiveValue, Database, DatabaseConnection, EntityTrait};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "tally_admin")]
#[command(about = "Admin utilities for Tally (bootstrap master data, snapshots, reconciliation, inventory repair)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./tally.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a branch.
    Branch(BranchCreateArgs),
    /// Create an employee.
    Employee(EmployeeCreateArgs),
    /// Create a seller or buyer.
    Party(PartyCreateArgs),
    /// Add a catalog price, effective from a point in time.
    Price(PriceSetArgs),
    /// Record the closing quantity of an item for a month.
    Snapshot(SnapshotArgs),
    /// Compare a shift's maintained totals with a full ledger scan.
    Reconcile(ReconcileArgs),
    /// Recompute a branch month's daily stock changes from the ledger.
    RebuildInventory(RebuildInventoryArgs),
}

#[derive(Args, Debug)]
struct BranchCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    location: Option<String>,
    /// IANA time zone used to bucket inventory days.
    #[arg(long, default_value = "UTC")]
    timezone: String,
}

#[derive(Args, Debug)]
struct EmployeeCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    branch_id: Option<i64>,
    #[arg(long)]
    inactive: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PartyKind {
    Seller,
    Buyer,
}

#[derive(Args, Debug)]
struct PartyCreateArgs {
    #[arg(long, value_enum)]
    kind: PartyKind,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct PriceSetArgs {
    #[arg(long)]
    item_id: i64,
    /// Decimal amount, e.g. `25.50`.
    #[arg(long)]
    price: String,
    #[arg(long, conflicts_with = "buyer_id")]
    branch_id: Option<i64>,
    #[arg(long)]
    buyer_id: Option<i64>,
    /// RFC 3339 timestamp; defaults to now.
    #[arg(long)]
    effective_from: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    #[arg(long)]
    branch_id: i64,
    #[arg(long)]
    item_id: i64,
    #[arg(long)]
    month: u32,
    #[arg(long)]
    year: i32,
    #[arg(long)]
    quantity: String,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    #[arg(long)]
    shift_id: Uuid,
}

#[derive(Args, Debug)]
struct RebuildInventoryArgs {
    #[arg(long)]
    branch_id: i64,
    #[arg(long)]
    month: u32,
    #[arg(long)]
    year: i32,
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;

    match cli.command {
        Command::Branch(args) => {
            if let Err(err) = args.timezone.parse::<chrono_tz::Tz>() {
                eprintln!("invalid timezone {}: {err}", args.timezone);
                std::process::exit(2);
            }
            let branch = tables::branches::ActiveModel {
                name: ActiveValue::Set(args.name.clone()),
                location: ActiveValue::Set(args.location),
                timezone: ActiveValue::Set(args.timezone),
                ..Default::default()
            };
            let res = tables::branches::Entity::insert(branch).exec(&db).await?;
            println!("created branch: {} ({})", args.name, res.last_insert_id);
        }
        Command::Employee(args) => {
            if let Some(branch_id) = args.branch_id
                && tables::branches::Entity::find_by_id(branch_id)
                    .one(&db)
                    .await?
                    .is_none()
            {
                eprintln!("branch not found: {branch_id}");
                std::process::exit(1);
            }
            let employee = tables::employees::ActiveModel {
                name: ActiveValue::Set(args.name.clone()),
                branch_id: ActiveValue::Set(args.branch_id),
                active: ActiveValue::Set(!args.inactive),
                ..Default::default()
            };
            let res = tables::employees::Entity::insert(employee)
                .exec(&db)
                .await?;
            println!("created employee: {} ({})", args.name, res.last_insert_id);
        }
        Command::Party(args) => {
            let kind = match args.kind {
                PartyKind::Seller => "seller",
                PartyKind::Buyer => "buyer",
            };
            let party = tables::parties::ActiveModel {
                kind: ActiveValue::Set(kind.to_string()),
                name: ActiveValue::Set(args.name.clone()),
                ..Default::default()
            };
            let res = tables::parties::Entity::insert(party).exec(&db).await?;
            println!("created {kind}: {} ({})", args.name, res.last_insert_id);
        }
        Command::Price(args) => {
            let price: Money = args.price.parse()?;
            if !price.is_positive() {
                eprintln!("price must be > 0");
                std::process::exit(2);
            }
            let price_row = tables::item_prices::ActiveModel {
                item_id: ActiveValue::Set(args.item_id),
                branch_id: ActiveValue::Set(args.branch_id),
                buyer_id: ActiveValue::Set(args.buyer_id),
                price_minor: ActiveValue::Set(price.cents()),
                effective_from: ActiveValue::Set(args.effective_from.unwrap_or_else(Utc::now)),
                ..Default::default()
            };
            tables::item_prices::Entity::insert(price_row)
                .exec(&db)
                .await?;
            println!("priced item {} at {price}", args.item_id);
        }
        Command::Snapshot(args) => {
            let quantity: Quantity = args.quantity.parse()?;
            let engine = Engine::builder().database(db.clone()).build().await?;
            engine
                .record_previous_period(args.branch_id, args.item_id, args.month, args.year, quantity)
                .await?;
            println!(
                "recorded {quantity} of item {} for {}-{:02}",
                args.item_id, args.year, args.month
            );
        }
        Command::Reconcile(args) => {
            let engine = Engine::builder().database(db.clone()).build().await?;
            let rec = engine.reconcile_shift(args.shift_id).await?;
            println!("incremental balance: {}", rec.incremental.balance);
            println!("scan balance:        {}", rec.scan.balance);
            if !rec.consistent {
                eprintln!("shift {} has drifted", args.shift_id);
                std::process::exit(1);
            }
            println!("consistent");
        }
        Command::RebuildInventory(args) => {
            let engine = Engine::builder().database(db.clone()).build().await?;
            let cells = engine
                .rebuild_daily_changes(args.branch_id, args.month, args.year)
                .await?;
            println!(
                "rebuilt {cells} daily cells for branch {} in {}-{:02}",
                args.branch_id, args.year, args.month
            );
        }
    }

    Ok(())
}
