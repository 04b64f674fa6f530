//! # Demo Store Seeder
//!
//! Populates the database with a small salon + grill catalog, staff and
//! store settings, then rings up one sale through the real checkout.
//!
//! ## Usage
//! ```bash
//! # Seed ./micropos_dev.db for store "store-1"
//! cargo run -p micropos-db --bin seed
//!
//! # Specify database path and store
//! cargo run -p micropos-db --bin seed -- --db ./data/micropos.db --store kanto-1
//!
//! # Skip the sample sale
//! cargo run -p micropos-db --bin seed -- --no-sale
//! ```
//!
//! `MICROPOS_DB_PATH` overrides the default path; `RUST_LOG` controls logging.
//!
//! ## Generated Data
//! - Ingredients and consumables with tracked stock
//! - Menu items that expand into ingredients (burger meal, silog)
//! - Commissionable services that use up supplies (haircut, massage)
//! - Two active staff members and one inactive

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use micropos_checkout::{CartSession, CheckoutConfig, CheckoutService, Payment, TipOutcome, TipPayment};
use micropos_core::stock::format_stock;
use micropos_core::{
    split_evenly, CatalogItem, ComponentRef, ItemType, Money, Staff, StaffRole, Stock, TipMethod,
};
use micropos_db::{Database, DbConfig, StoreSettings};

const DEFAULT_DB_PATH: &str = "./micropos_dev.db";
const DEFAULT_STORE_ID: &str = "store-1";

/// Ingredients and supplies: (id, name, type, stock, cost)
const SUPPLIES: &[(&str, &str, ItemType, i64, f64)] = &[
    ("bun", "Burger Bun", ItemType::Ingredient, 120, 8.0),
    ("patty", "Beef Patty", ItemType::Ingredient, 80, 35.0),
    ("egg", "Egg", ItemType::Ingredient, 90, 9.0),
    ("rice", "Garlic Rice (cup)", ItemType::Ingredient, 200, 6.0),
    ("tapa", "Beef Tapa (serving)", ItemType::Ingredient, 40, 45.0),
    ("wrapper", "Paper Wrapper", ItemType::Consumable, 500, 1.5),
    ("towel", "Disposable Towel", ItemType::Consumable, 60, 4.0),
    ("oil", "Massage Oil (shot)", ItemType::Consumable, 8, 12.0),
];

fn catalog(store_id: &str) -> Vec<CatalogItem> {
    let mut items: Vec<CatalogItem> = SUPPLIES
        .iter()
        .map(|(id, name, item_type, stock, cost)| {
            CatalogItem::new(*id, *item_type, Money::zero())
                .with_name(*name)
                .with_cost(Money::new(*cost))
                .with_stock(Stock::Tracked(*stock))
        })
        .collect();

    items.extend([
        CatalogItem::new("burger-meal", ItemType::Menu, Money::new(149.0))
            .with_name("Burger Meal")
            .with_bundle(vec![ComponentRef::new("bun", 1), ComponentRef::new("patty", 1)])
            .with_consumed(vec![ComponentRef::new("wrapper", 1)]),
        CatalogItem::new("tapsilog", ItemType::Menu, Money::new(129.0))
            .with_name("Tapsilog")
            .with_bundle(vec![
                ComponentRef::new("tapa", 1),
                ComponentRef::new("rice", 1),
                ComponentRef::new("egg", 1),
            ]),
        CatalogItem::new("iced-tea", ItemType::Product, Money::new(35.0))
            .with_name("Iced Tea (bottle)")
            .with_cost(Money::new(18.0))
            .with_stock(Stock::Tracked(48))
            .with_low_stock_threshold(12),
        CatalogItem::new("haircut", ItemType::Service, Money::new(250.0))
            .with_name("Haircut")
            .with_commission(0.2)
            .with_consumed(vec![ComponentRef::new("towel", 1)]),
        CatalogItem::new("massage", ItemType::Service, Money::new(600.0))
            .with_name("Swedish Massage (1h)")
            .with_commission(0.15)
            .with_consumed(vec![ComponentRef::new("oil", 2), ComponentRef::new("towel", 2)]),
    ]);

    items.into_iter().map(|item| item.with_store(store_id)).collect()
}

fn staff(store_id: &str) -> Vec<Staff> {
    [
        ("staff-ana", "Ana Reyes", StaffRole::Therapist, true),
        ("staff-jun", "Jun Dela Cruz", StaffRole::Barber, true),
        ("staff-mila", "Mila Santos", StaffRole::Waiter, false),
    ]
    .into_iter()
    .map(|(id, name, role, is_active)| Staff {
        id: id.to_string(),
        name: name.to_string(),
        role,
        store_ids: vec![store_id.to_string()],
        is_active,
    })
    .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path = env::var("MICROPOS_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let mut store_id = DEFAULT_STORE_ID.to_string();
    let mut sample_sale = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--store" | "-s" => {
                if i + 1 < args.len() {
                    store_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--no-sale" => sample_sale = false,
            "--help" | "-h" => {
                println!("MicroPOS Demo Store Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: {DEFAULT_DB_PATH})");
                println!("  -s, --store <ID>     Store id to seed (default: {DEFAULT_STORE_ID})");
                println!("      --no-sale        Do not ring up the sample sale");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 MicroPOS Demo Store Seeder");
    println!("=============================");
    println!("Database: {db_path}");
    println!("Store:    {store_id}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let config = CheckoutConfig::from_env();

    let existing = db.catalog().list_by_store(&store_id).await?;
    if !existing.is_empty() {
        println!("⚠ Store already has {} catalog items", existing.len());
        println!("  Skipping seed to avoid overwriting stock counts.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    db.settings()
        .upsert(&StoreSettings {
            store_id: store_id.clone(),
            store_name: "Kanto Grill & Salon".to_string(),
            tax_rate: config.default_tax_rate.percent(),
        })
        .await?;

    let items = catalog(&store_id);
    for item in &items {
        db.catalog().upsert(item).await?;
    }
    println!("✓ Seeded {} catalog items", items.len());

    let members = staff(&store_id);
    for member in &members {
        db.staff().upsert(member).await?;
    }
    println!("✓ Seeded {} staff members", members.len());

    if sample_sale {
        ring_up_sample_sale(&db, &store_id, &config).await?;
    }

    println!();
    println!("Inventory:");
    for item in db.catalog().list_by_store(&store_id).await? {
        println!("  {:<24} {:>10}", item.name, format_stock(&item));
    }

    let low = db.catalog().low_stock(&store_id).await?;
    if !low.is_empty() {
        println!();
        println!("⚠ Low stock: {}", low.iter().map(|i| i.name.as_str()).collect::<Vec<_>>().join(", "));
    }

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

/// Rings up a burger meal and a massage, with a tip split between the two
/// active staff members.
async fn ring_up_sample_sale(
    db: &Database,
    store_id: &str,
    config: &CheckoutConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = CheckoutService::new(db.collaborators(), config.clone());

    let catalog = db.catalog();
    let mut session = CartSession::open(&service, store_id).await?;
    session.add_item_by_id(&catalog, "burger-meal", 2).await?;
    session.add_item_by_id(&catalog, "massage", 1).await?;
    session.set_staff(Some("staff-ana".to_string()));

    let tip_total = Money::new(100.0);
    let tip = TipPayment {
        amount: tip_total,
        method: TipMethod::Cash,
        allocations: split_evenly(tip_total, &["staff-ana".to_string(), "staff-jun".to_string()]),
    };

    let total = session.preview().total;
    // Paid with 1,000 bills
    let tendered = Money::from_cents((total.to_cents() + 99_999) / 100_000 * 100_000);
    let receipt = session
        .confirm(&service, Payment::cash_tendered(tendered).with_tip(tip))
        .await?;
    info!(tx_id = %receipt.transaction.id, "Sample sale committed");

    let tx = &receipt.transaction;
    println!();
    println!("✓ Sample sale {}", tx.id);
    println!("  Subtotal    {}", config.format_currency(tx.subtotal));
    println!("  Tax         {}", config.format_currency(tx.tax));
    println!("  Total       {}", config.format_currency(tx.total));
    println!("  Tendered    {}", config.format_currency(tendered));
    println!("  Change      {}", config.format_currency(receipt.change_due));
    println!("  Commission  {}", config.format_currency(tx.commission_total));
    for adjustment in &receipt.stock_delta {
        println!("  Stock       {} -{}", adjustment.item_id, adjustment.quantity);
    }
    match &receipt.tip {
        TipOutcome::Recorded(record) => println!("  Tip         {} ({} shares)", config.format_currency(record.total_tip), record.shares.len()),
        TipOutcome::Failed(reason) => println!("  Tip         not recorded: {reason}"),
        TipOutcome::NotRequested => {}
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise info, with debug for the micropos crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,micropos_checkout=debug,micropos_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
