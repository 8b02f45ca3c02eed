//! Fixtures shared by the repository tests.

use chrono::{TimeZone, Utc};

use pickwave_core::{
    Batch, BatchId, BatchState, Location, LocationId, Order, OrderState, Package, PackageId,
    Product, ProductId, Task, TaskState, WorkerId,
};

use crate::{Database, DbConfig};

pub const WORKER: WorkerId = 7;
pub const BATCH: BatchId = 1;

pub const STOCK: LocationId = 1;
pub const OUTPUT: LocationId = 2;
pub const SHELF: LocationId = 3;
pub const BAY: LocationId = 5;

pub const PRODUCT: ProductId = 1;
pub const PACKAGE: PackageId = 1;

/// In-memory database with a small warehouse and no batches.
pub async fn warehouse_db() -> Database {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    insert_reference_data(&db).await;
    db
}

/// File-backed database, for tests that need more than one connection.
pub async fn file_db(name: &str) -> Database {
    let path = std::env::temp_dir().join(format!("pickwave-{}-{}.db", name, std::process::id()));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }

    let db = Database::new(DbConfig::new(path).max_connections(4)).await.unwrap();
    insert_reference_data(&db).await;
    db
}

async fn insert_reference_data(db: &Database) {
    let warehouse = db.warehouse();
    let locations = [
        (STOCK, "STOCK", "LOC-STOCK", "1/"),
        (OUTPUT, "OUTPUT", "LOC-OUT", "2/"),
        (SHELF, "STOCK/A-01", "LOC-A", "1/3/"),
        (BAY, "OUTPUT/BAY-1", "LOC-BAY1", "2/5/"),
    ];
    for (id, name, barcode, path) in locations {
        warehouse
            .insert_location(&Location {
                id,
                name: name.to_string(),
                barcode: Some(barcode.to_string()),
                parent_path: path.to_string(),
                picking_sequence: None,
            })
            .await
            .unwrap();
    }

    warehouse
        .insert_product(&Product {
            id: PRODUCT,
            name: "Widget".to_string(),
            barcode: Some("A-001".to_string()),
            alternate_barcodes: vec!["A-001-BOX".to_string()],
        })
        .await
        .unwrap();

    warehouse
        .insert_package(&Package {
            id: PACKAGE,
            name: "PACK-0001".to_string(),
        })
        .await
        .unwrap();
}

/// Inserts a batch with one order bound for OUTPUT and one task per
/// quantity, picked from SHELF.
pub async fn insert_batch(
    db: &Database,
    id: BatchId,
    state: BatchState,
    owner: Option<WorkerId>,
    quantities: &[i64],
) {
    let date = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let batch = Batch {
        id,
        name: format!("BATCH/{:04}", id),
        state,
        owner,
    };
    let order = Order {
        id,
        name: format!("OUT/{:04}", id),
        batch_id: id,
        state: OrderState::Open,
        priority: 0,
        scheduled_date: date,
        sequence: 0,
        destination: OUTPUT,
    };
    let tasks: Vec<Task> = quantities
        .iter()
        .enumerate()
        .map(|(i, &quantity)| Task {
            id: id * 100 + i as i64 + 1,
            order_id: id,
            product_id: PRODUCT,
            requested_quantity: quantity,
            done_quantity: 0,
            source_location: SHELF,
            source_package: None,
            expected_destination: OUTPUT,
            actual_destination: None,
            completed: false,
            unloaded: false,
            state: TaskState::Assigned,
            priority_rank: None,
            sequence: i as i64,
            expected_date: date,
            version: 1,
        })
        .collect();

    db.warehouse().insert_batch(&batch, &[order], &tasks).await.unwrap();
}
