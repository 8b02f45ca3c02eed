//! Row types for runtime `query_as` and their conversions into domain types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use pickwave_core::{
    Batch, BatchState, Destination, Location, Order, OrderState, Package, Product, Task, TaskState,
};

/// Columns selected for a batch.
pub(crate) const BATCH_COLUMNS: &str = "id, name, state, owner_id";

#[derive(Debug, FromRow)]
pub(crate) struct BatchRow {
    pub id: i64,
    pub name: String,
    pub state: BatchState,
    pub owner_id: Option<i64>,
}

impl From<BatchRow> for Batch {
    fn from(row: BatchRow) -> Self {
        Batch {
            id: row.id,
            name: row.name,
            state: row.state,
            owner: row.owner_id,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ClaimCandidateRow {
    pub id: i64,
    pub name: String,
    pub state: BatchState,
    pub owner_id: Option<i64>,
    pub workable_tasks: i64,
}

#[derive(Debug, FromRow)]
pub(crate) struct OrderRow {
    pub id: i64,
    pub name: String,
    pub batch_id: i64,
    pub state: OrderState,
    pub priority: i32,
    pub scheduled_date: DateTime<Utc>,
    pub sequence: i64,
    pub destination_id: i64,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            name: row.name,
            batch_id: row.batch_id,
            state: row.state,
            priority: row.priority,
            scheduled_date: row.scheduled_date,
            sequence: row.sequence,
            destination: row.destination_id,
        }
    }
}

/// Columns selected for a task, qualified with the `t` alias.
pub(crate) const TASK_COLUMNS: &str = "t.id, t.order_id, t.product_id, t.requested_quantity, \
     t.done_quantity, t.source_location_id, t.source_package_id, t.expected_destination_id, \
     t.dest_location_id, t.dest_package_id, t.completed, t.unloaded, t.state, t.priority_rank, \
     t.sequence, t.expected_date, t.version";

#[derive(Debug, FromRow)]
pub(crate) struct TaskRow {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub requested_quantity: i64,
    pub done_quantity: i64,
    pub source_location_id: i64,
    pub source_package_id: Option<i64>,
    pub expected_destination_id: i64,
    pub dest_location_id: Option<i64>,
    pub dest_package_id: Option<i64>,
    pub completed: bool,
    pub unloaded: bool,
    pub state: TaskState,
    pub priority_rank: Option<i32>,
    pub sequence: i64,
    pub expected_date: DateTime<Utc>,
    pub version: i64,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let actual_destination = match (row.dest_location_id, row.dest_package_id) {
            (Some(location), _) => Some(Destination::Location(location)),
            (None, Some(package)) => Some(Destination::Package(package)),
            (None, None) => None,
        };
        Task {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            requested_quantity: row.requested_quantity,
            done_quantity: row.done_quantity,
            source_location: row.source_location_id,
            source_package: row.source_package_id,
            expected_destination: row.expected_destination_id,
            actual_destination,
            completed: row.completed,
            unloaded: row.unloaded,
            state: row.state,
            priority_rank: row.priority_rank,
            sequence: row.sequence,
            expected_date: row.expected_date,
            version: row.version,
        }
    }
}

/// Splits a destination into its `(dest_location_id, dest_package_id)` columns.
pub(crate) fn destination_columns(destination: Option<Destination>) -> (Option<i64>, Option<i64>) {
    match destination {
        Some(Destination::Location(id)) => (Some(id), None),
        Some(Destination::Package(id)) => (None, Some(id)),
        None => (None, None),
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    pub id: i64,
    pub name: String,
    pub barcode: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            barcode: row.barcode,
            alternate_barcodes: Vec::new(),
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ProductBarcodeRow {
    pub product_id: i64,
    pub barcode: String,
}

#[derive(Debug, FromRow)]
pub(crate) struct LocationRow {
    pub id: i64,
    pub name: String,
    pub barcode: Option<String>,
    pub parent_path: String,
    pub picking_sequence: Option<String>,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            name: row.name,
            barcode: row.barcode,
            parent_path: row.parent_path,
            picking_sequence: row.picking_sequence,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PackageRow {
    pub id: i64,
    pub name: String,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: row.id,
            name: row.name,
        }
    }
}
