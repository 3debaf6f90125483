//! # Seed Data Generator
//!
//! Populates the database with units, item types and items for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p stockroom-db --bin seed
//!
//! # Specify database path
//! cargo run -p stockroom-db --bin seed -- --db ./data/stockroom.db
//!
//! # Record opening stock as the given user (must already exist)
//! cargo run -p stockroom-db --bin seed -- --user admin
//! ```
//!
//! Items start at stock 0. With `--user`, each item also receives an
//! opening "in" transaction so stock and the ledger agree.

use chrono::Utc;
use std::env;
use stockroom_core::requests::{NewItem, NewTransaction};
use stockroom_core::TransactionKind;
use stockroom_db::{Database, DbConfig};

const UNITS: &[&str] = &["pcs", "box", "kg", "liter", "roll"];

/// (type name, [(item name, unit, minimum stock, opening stock)])
const CATALOG: &[(&str, &[(&str, &str, i64, i64)])] = &[
    (
        "Electronics",
        &[
            ("Laptop", "pcs", 5, 12),
            ("Monitor 24\"", "pcs", 3, 2),
            ("USB-C Cable", "pcs", 20, 45),
            ("Barcode Scanner", "pcs", 2, 1),
        ],
    ),
    (
        "Office Supplies",
        &[
            ("A4 Paper", "box", 10, 30),
            ("Ballpoint Pen", "box", 5, 4),
            ("Packing Tape", "roll", 15, 40),
        ],
    ),
    (
        "Cleaning",
        &[
            ("Floor Cleaner", "liter", 8, 6),
            ("Detergent", "kg", 10, 25),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./stockroom_dev.db");
    let mut username: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    username = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: ./stockroom_dev.db)");
                println!("  -u, --user <NAME>   Record opening stock as this user");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockroom Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let actor = match username {
        Some(name) => match db.users().find_by_username(&name).await? {
            Some(user) => Some(user),
            None => {
                println!("⚠ User '{}' not found, items will start at stock 0", name);
                None
            }
        },
        None => None,
    };

    println!();
    println!("Creating units...");
    let mut unit_ids = Vec::new();
    for name in UNITS {
        let unit = db.units().create(name).await?;
        unit_ids.push((*name, unit.id));
    }
    println!("  {} units", unit_ids.len());

    println!("Creating item types and items...");
    let today = Utc::now().date_naive();
    let mut generated = 0;

    for (type_name, items) in CATALOG {
        let item_type = db.item_types().create(type_name).await?;

        for (name, unit, minimum_stock, opening) in items.iter() {
            let Some((_, unit_id)) = unit_ids.iter().find(|(u, _)| u == unit) else {
                eprintln!("Unknown unit {} for {}", unit, name);
                continue;
            };

            let item = db
                .items()
                .create(NewItem {
                    name: name.to_string(),
                    type_id: item_type.id.clone(),
                    unit_id: unit_id.clone(),
                    minimum_stock: *minimum_stock,
                    image: None,
                })
                .await?;

            if let Some(user) = &actor {
                db.transactions()
                    .create(NewTransaction {
                        item_id: item.id.clone(),
                        date: today,
                        quantity: *opening,
                        kind: TransactionKind::In,
                        description: Some("Opening stock".to_string()),
                        user_id: user.id.clone(),
                    })
                    .await?;
            }

            generated += 1;
        }
    }

    println!("  {} items", generated);

    let low = db.items().low_stock().await?;
    println!();
    println!("Low-stock items: {}", low.len());
    for item in low.iter().take(10) {
        println!("  {} ({} / min {})", item.name, item.stock, item.minimum_stock);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
