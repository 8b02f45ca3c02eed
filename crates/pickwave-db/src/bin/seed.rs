//! # Demo Warehouse Generator
//!
//! Populates the database with a small warehouse and draft batches ready to
//! be claimed.
//!
//! ## Usage
//! ```bash
//! # Generate 10 batches (default)
//! cargo run -p pickwave-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p pickwave-db --bin seed -- --batches 50
//!
//! # Specify database path
//! cargo run -p pickwave-db --bin seed -- --db ./data/pickwave.db
//! ```
//!
//! ## Generated Layout
//! ```text
//! WH/STOCK (1)                 WH/OUTPUT (2)
//!   ├── WH/STOCK/A-01 (10)       ├── WH/OUTPUT/BAY-1 (20)
//!   ├── …                        ├── WH/OUTPUT/BAY-2 (21)
//!   └── WH/STOCK/F-01 (15)       └── WH/OUTPUT/BAY-3 (22)
//! ```
//! Products get barcodes `590{id:010}`; every even product also answers to
//! `{barcode}-CASE`. Packages are named `PACK-0001` onward. Each batch holds
//! one to three orders bound for WH/OUTPUT.

use chrono::{Duration, TimeZone, Utc};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pickwave_core::{
    Batch, BatchState, Location, Order, OrderState, Package, Product, Task, TaskState,
};
use pickwave_db::{Database, DbConfig, WarehouseRepository};

const STOCK_ID: i64 = 1;
const OUTPUT_ID: i64 = 2;
const AISLES: &[&str] = &["A", "B", "C", "D", "E", "F"];
const BAYS: i64 = 3;
const PACKAGES: i64 = 20;

const PRODUCTS: &[&str] = &[
    "Desk Lamp",
    "USB Cable",
    "Notebook A5",
    "Stapler",
    "Monitor Arm",
    "Headset",
    "Mouse Pad",
    "Webcam",
    "Paper Tray",
    "Label Printer",
    "Cable Ties",
    "Whiteboard Marker",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pickwave_db=debug,sqlx=warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut batches: i64 = 10;
    let mut db_path = String::from("./pickwave_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--batches" | "-b" => {
                if i + 1 < args.len() {
                    batches = args[i + 1].parse().unwrap_or(10);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Pickwave Demo Warehouse Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --batches <N>  Number of draft batches to generate (default: 10)");
                println!("  -d, --db <PATH>    Database file path (default: ./pickwave_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, batches, "Seeding demo warehouse");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let warehouse = db.warehouse();

    let existing = warehouse.count_batches().await?;
    if existing > 0 {
        warn!(existing, "Database already has batches, skipping seed");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    seed_locations(&warehouse).await?;
    seed_products(&warehouse).await?;
    for id in 1..=PACKAGES {
        warehouse
            .insert_package(&Package {
                id,
                name: format!("PACK-{:04}", id),
            })
            .await?;
    }

    let mut next_order = 1;
    let mut next_task = 1;
    for id in 1..=batches {
        let (orders, tasks) = generate_batch(id, &mut next_order, &mut next_task);
        let batch = Batch {
            id,
            name: format!("BATCH/{:04}", id),
            state: BatchState::Draft,
            owner: None,
        };
        warehouse.insert_batch(&batch, &orders, &tasks).await?;
    }

    info!(
        batches,
        orders = next_order - 1,
        tasks = next_task - 1,
        elapsed = ?start.elapsed(),
        "Seed complete"
    );
    Ok(())
}

async fn seed_locations(warehouse: &WarehouseRepository) -> Result<(), Box<dyn std::error::Error>> {
    let roots = [(STOCK_ID, "WH/STOCK", "LOC-STOCK"), (OUTPUT_ID, "WH/OUTPUT", "LOC-OUTPUT")];
    for (id, name, barcode) in roots {
        warehouse
            .insert_location(&location(id, name, barcode, format!("{}/", id), None))
            .await?;
    }

    for (index, aisle) in AISLES.iter().enumerate() {
        let id = shelf_id(index as i64);
        warehouse
            .insert_location(&location(
                id,
                &format!("WH/STOCK/{}-01", aisle),
                &format!("LOC-{}01", aisle),
                format!("{}/{}/", STOCK_ID, id),
                Some(format!("{:03}", index + 1)),
            ))
            .await?;
    }

    for bay in 1..=BAYS {
        let id = 19 + bay;
        warehouse
            .insert_location(&location(
                id,
                &format!("WH/OUTPUT/BAY-{}", bay),
                &format!("LOC-BAY{}", bay),
                format!("{}/{}/", OUTPUT_ID, id),
                None,
            ))
            .await?;
    }
    Ok(())
}

async fn seed_products(warehouse: &WarehouseRepository) -> Result<(), Box<dyn std::error::Error>> {
    for (index, name) in PRODUCTS.iter().enumerate() {
        let id = index as i64 + 1;
        let barcode = format!("590{:010}", id);
        let alternate_barcodes = if id % 2 == 0 {
            vec![format!("{}-CASE", barcode)]
        } else {
            Vec::new()
        };
        warehouse
            .insert_product(&Product {
                id,
                name: name.to_string(),
                barcode: Some(barcode),
                alternate_barcodes,
            })
            .await?;
    }
    Ok(())
}

fn location(
    id: i64,
    name: &str,
    barcode: &str,
    parent_path: String,
    picking_sequence: Option<String>,
) -> Location {
    Location {
        id,
        name: name.to_string(),
        barcode: Some(barcode.to_string()),
        parent_path,
        picking_sequence,
    }
}

fn shelf_id(index: i64) -> i64 {
    10 + index
}

/// Generates the orders and tasks of one batch, deterministically from ids.
fn generate_batch(batch_id: i64, next_order: &mut i64, next_task: &mut i64) -> (Vec<Order>, Vec<Task>) {
    let base = Utc.with_ymd_and_hms(2024, 1, 8, 8, 0, 0).single().unwrap_or_else(Utc::now);
    let mut orders = Vec::new();
    let mut tasks = Vec::new();

    for _ in 0..1 + batch_id % 3 {
        let order_id = *next_order;
        *next_order += 1;
        let scheduled_date = base + Duration::hours(order_id);
        orders.push(Order {
            id: order_id,
            name: format!("WH/OUT/{:05}", order_id),
            batch_id,
            state: OrderState::Open,
            priority: (order_id % 4 == 0) as i32,
            scheduled_date,
            sequence: order_id,
            destination: OUTPUT_ID,
        });

        for line in 0..1 + order_id % 4 {
            let task_id = *next_task;
            *next_task += 1;
            tasks.push(Task {
                id: task_id,
                order_id,
                product_id: (task_id * 7) % PRODUCTS.len() as i64 + 1,
                requested_quantity: 1 + task_id % 5,
                done_quantity: 0,
                source_location: shelf_id(task_id % AISLES.len() as i64),
                source_package: None,
                expected_destination: OUTPUT_ID,
                actual_destination: None,
                completed: false,
                unloaded: false,
                state: if task_id % 9 == 0 {
                    TaskState::PartiallyAvailable
                } else {
                    TaskState::Assigned
                },
                priority_rank: None,
                sequence: line,
                expected_date: scheduled_date,
                version: 1,
            });
        }
    }

    (orders, tasks)
}
