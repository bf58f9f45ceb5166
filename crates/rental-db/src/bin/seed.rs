//! # Seed Data Generator
//!
//! Populates the database with a demo catalogue for development.
//!
//! ## Usage
//! ```bash
//! # Built-in demo catalogue, database from rental.toml / RENTAL_DB_PATH
//! cargo run -p rental-db --bin seed
//!
//! # Specify database path
//! cargo run -p rental-db --bin seed -- --db ./data/rental.db
//!
//! # Load products from a JSON file instead
//! cargo run -p rental-db --bin seed -- --catalog ./catalog.json
//! ```
//!
//! ## Catalogue File
//! A JSON array of products; `kind` defaults to `"rental"`:
//! ```json
//! [
//!   { "name": "Folding Chair", "category": "Seating", "total_qty": 200, "unit_price_cents": 350 },
//!   { "name": "Napkin Pack", "kind": "sale", "total_qty": 500, "unit_price_cents": 400 },
//!   { "name": "Delivery", "kind": "service", "total_qty": 0, "unit_price_cents": 5000 }
//! ]
//! ```
//!
//! Unless `--no-bookings` is given, one confirmed demo rental with a partial
//! payment is created too.

use chrono::{Days, Utc};
use rental_core::{ItemRequest, Money, NewCustomer, NewProduct, PaymentInput, Product, ProductKind, RentalDraft};
use rental_db::{init_tracing, Database, EngineConfig, ProductRepository};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// (name, category, kind, total_qty, unit price in cents)
const DEMO_PRODUCTS: &[(&str, &str, ProductKind, i64, i64)] = &[
    ("Folding Chair", "Seating", ProductKind::Rental, 200, 350),
    ("Chiavari Chair", "Seating", ProductKind::Rental, 80, 900),
    ("Round Table", "Tables", ProductKind::Rental, 40, 1500),
    ("Banquet Table", "Tables", ProductKind::Rental, 25, 1800),
    ("Tent 10x10", "Tents", ProductKind::Rental, 6, 12000),
    ("Tent 20x40", "Tents", ProductKind::Rental, 2, 45000),
    ("White Tablecloth", "Linen", ProductKind::Rental, 60, 800),
    ("Bounce House", "Inflatables", ProductKind::Rental, 3, 22000),
    ("Napkin Pack", "Supplies", ProductKind::Sale, 500, 400),
    ("Balloon Pack", "Supplies", ProductKind::Sale, 300, 650),
    ("Ice Bag", "Supplies", ProductKind::Sale, 120, 300),
    ("Delivery", "Services", ProductKind::Service, 0, 5000),
    ("Setup & Teardown", "Services", ProductKind::Service, 0, 7500),
];

/// (name, phone)
const DEMO_CUSTOMERS: &[(&str, &str)] = &[
    ("Maria Lopez", "555-0101"),
    ("Sam Carter", "555-0102"),
    ("Greenfield School", "555-0103"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut catalog_path: Option<PathBuf> = None;
    let mut with_bookings = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--catalog" | "-c" => {
                if i + 1 < args.len() {
                    catalog_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--no-bookings" => with_bookings = false,
            "--help" | "-h" => {
                println!("Rental Manager Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (default: from rental.toml)");
                println!("  -c, --catalog <FILE>   JSON product catalogue (default: built-in demo)");
                println!("      --no-bookings      Skip the demo rental");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let mut config = EngineConfig::load(None)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    println!("🌱 Rental Manager Seed Data Generator");
    println!("=====================================");
    println!("Database: {}", config.database.path.display());
    println!();

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = config.connect().await?;
    println!("✓ Connected to database, migrations applied");

    let existing = {
        let mut conn = db.acquire().await?;
        ProductRepository::new(&mut conn).count().await?
    };
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let catalog = match catalog_path {
        Some(path) => {
            let contents = std::fs::read_to_string(&path)?;
            let products: Vec<NewProduct> = serde_json::from_str(&contents)?;
            info!(path = %path.display(), count = products.len(), "Loaded catalogue file");
            products
        }
        None => demo_catalog(),
    };

    let start = std::time::Instant::now();
    let mut products = Vec::with_capacity(catalog.len());
    for input in catalog {
        let name = input.name.clone();
        match db.catalog().add_product(input).await {
            Ok(product) => products.push(product),
            Err(e) => eprintln!("Failed to insert {}: {}", name, e),
        }
    }
    println!("✓ Added {} products in {:?}", products.len(), start.elapsed());

    let mut customers = Vec::with_capacity(DEMO_CUSTOMERS.len());
    for (name, phone) in DEMO_CUSTOMERS {
        let customer = db
            .catalog()
            .add_customer(NewCustomer {
                name: name.to_string(),
                phone: Some(phone.to_string()),
                notes: None,
            })
            .await?;
        customers.push(customer);
    }
    println!("✓ Added {} customers", customers.len());

    if with_bookings {
        if let Some(customer) = customers.first() {
            seed_booking(&db, &customer.id, &products).await?;
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn demo_catalog() -> Vec<NewProduct> {
    DEMO_PRODUCTS
        .iter()
        .map(|(name, category, kind, total_qty, price)| NewProduct {
            name: name.to_string(),
            category: Some(category.to_string()),
            kind: *kind,
            total_qty: *total_qty,
            unit_price_cents: *price,
        })
        .collect()
}

/// One confirmed weekend rental mixing every product kind, half paid.
async fn seed_booking(
    db: &Database,
    customer_id: &str,
    products: &[Product],
) -> Result<(), Box<dyn std::error::Error>> {
    let first_of = |kind: ProductKind| products.iter().find(|p| p.kind == kind);

    let mut items = Vec::new();
    if let Some(chair) = first_of(ProductKind::Rental) {
        items.push(ItemRequest::new(chair.id.clone(), chair.total_qty.min(50), chair.unit_price()));
    }
    if let Some(supply) = first_of(ProductKind::Sale) {
        items.push(ItemRequest::new(supply.id.clone(), supply.total_qty.min(5), supply.unit_price()));
    }
    if let Some(service) = first_of(ProductKind::Service) {
        items.push(ItemRequest::new(service.id.clone(), 1, service.unit_price()));
    }
    items.retain(|item| item.qty > 0);
    if items.is_empty() {
        println!("⚠ No usable products for a demo booking");
        return Ok(());
    }

    let today = Utc::now().date_naive();
    let start = today.checked_add_days(Days::new(14)).unwrap_or(today);
    let end = start.checked_add_days(Days::new(2)).unwrap_or(start);

    let draft = RentalDraft {
        customer_id: customer_id.to_string(),
        event_date: start,
        start_date: Some(start),
        end_date: Some(end),
        address: Some("12 Orchard Lane".to_string()),
        contact_phone: None,
        delivery_required: true,
        items,
        total_override: None,
    };

    let rental = db.rentals().create_draft(draft).await?;
    let rental = db.rentals().confirm(&rental.id).await?;

    let half = Money::from_cents(rental.total_cents / 2);
    if half.is_positive() {
        let mut payment = PaymentInput::new(half);
        payment.method = Some("cash".to_string());
        db.payments().add_payment(&rental.id, payment).await?;
    }

    let (rental, items) = db.rentals().get_rental(&rental.id).await?;
    println!(
        "✓ Demo rental {} [{} → {}): {} lines, total {}, {}",
        rental.id,
        start,
        end,
        items.len(),
        rental.total(),
        rental.payment_status
    );
    Ok(())
}
