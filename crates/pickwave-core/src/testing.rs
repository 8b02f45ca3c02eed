//! Test fixtures: a small warehouse and a builder for batch graphs.
//!
//! ```text
//! STOCK (1)                      OUTPUT (2)              QUARANTINE (8)
//! ├── STOCK/A-01 (3)             ├── OUTPUT/BAY-1 (5)
//! └── STOCK/B-01 (4) seq "001"   └── OUTPUT/BAY-2 (6)
//! ```

use std::cell::RefCell;

use chrono::{DateTime, TimeZone, Utc};

use crate::graph::BatchGraph;
use crate::ports::{BarcodeResolver, FinalizationError, OrderFinalizer};
use crate::types::{
    Batch, BatchId, BatchState, Location, LocationId, Order, OrderId, OrderState, Package,
    PackageId, Product, ProductId, Task, TaskId, TaskState, WorkerId,
};

pub const WORKER: WorkerId = 7;
pub const BATCH: BatchId = 1;

pub const STOCK: LocationId = 1;
pub const OUTPUT: LocationId = 2;
pub const SHELF_A: LocationId = 3;
pub const SHELF_B: LocationId = 4;
pub const OUTPUT_BAY: LocationId = 5;
pub const OUTPUT_BAY_2: LocationId = 6;
pub const ELSEWHERE: LocationId = 8;

pub const PRODUCT_A: ProductId = 1;
pub const PRODUCT_B: ProductId = 2;

pub const PACKAGE: PackageId = 1;
pub const PACKAGE_2: PackageId = 2;

fn location(id: LocationId, name: &str, barcode: &str, parent_path: &str) -> Location {
    Location {
        id,
        name: name.to_string(),
        barcode: Some(barcode.to_string()),
        parent_path: parent_path.to_string(),
        picking_sequence: None,
    }
}

pub struct GraphBuilder {
    graph: BatchGraph,
    current_order: OrderId,
    next_task_id: TaskId,
    now: DateTime<Utc>,
}

impl GraphBuilder {
    /// Batch 1, in progress for [`WORKER`], with one empty order heading to OUTPUT.
    pub fn new() -> Self {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap();
        let batch = Batch {
            id: BATCH,
            name: "BATCH/0001".to_string(),
            state: BatchState::InProgress,
            owner: Some(WORKER),
        };
        let mut graph = BatchGraph::new(batch, 1);

        graph.insert_location(location(STOCK, "STOCK", "LOC-STOCK", "1/"));
        graph.insert_location(location(OUTPUT, "OUTPUT", "LOC-OUT", "2/"));
        graph.insert_location(location(SHELF_A, "STOCK/A-01", "LOC-A", "1/3/"));
        graph.insert_location(Location {
            picking_sequence: Some("001".to_string()),
            ..location(SHELF_B, "STOCK/B-01", "LOC-B", "1/4/")
        });
        graph.insert_location(location(OUTPUT_BAY, "OUTPUT/BAY-1", "LOC-BAY1", "2/5/"));
        graph.insert_location(location(OUTPUT_BAY_2, "OUTPUT/BAY-2", "LOC-BAY2", "2/6/"));
        graph.insert_location(location(ELSEWHERE, "QUARANTINE", "LOC-QUAR", "8/"));

        graph.insert_product(Product {
            id: PRODUCT_A,
            name: "Widget".to_string(),
            barcode: Some("A-001".to_string()),
            alternate_barcodes: vec!["A-001-BOX".to_string()],
        });
        graph.insert_product(Product {
            id: PRODUCT_B,
            name: "Gadget".to_string(),
            barcode: Some("B-001".to_string()),
            alternate_barcodes: Vec::new(),
        });

        graph.insert_package(Package {
            id: PACKAGE,
            name: "PACK-0001".to_string(),
        });
        graph.insert_package(Package {
            id: PACKAGE_2,
            name: "PACK-0002".to_string(),
        });

        GraphBuilder {
            graph,
            current_order: 0,
            next_task_id: 11,
            now,
        }
        .order_with(|_| {})
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn batch_with(mut self, f: impl FnOnce(&mut Batch)) -> Self {
        f(&mut self.graph.batch);
        self
    }

    /// Adds an order and makes it the target of following `task` calls.
    pub fn order_with(mut self, f: impl FnOnce(&mut Order)) -> Self {
        let id = self.graph.orders.keys().max().copied().unwrap_or(0) + 1;
        let mut order = Order {
            id,
            name: format!("OUT/{:04}", id),
            batch_id: BATCH,
            state: OrderState::Open,
            priority: 0,
            scheduled_date: self.now,
            sequence: 0,
            destination: OUTPUT,
        };
        f(&mut order);
        self.graph.insert_order(order);
        self.current_order = id;
        self
    }

    pub fn task(self, requested: i64) -> Self {
        self.task_with(requested, |_| {})
    }

    pub fn task_with(mut self, requested: i64, f: impl FnOnce(&mut Task)) -> Self {
        let destination = self
            .graph
            .orders
            .get(&self.current_order)
            .map(|order| order.destination)
            .unwrap_or(OUTPUT);
        let mut task = Task {
            id: self.next_task_id,
            order_id: self.current_order,
            product_id: PRODUCT_A,
            requested_quantity: requested,
            done_quantity: 0,
            source_location: SHELF_A,
            source_package: None,
            expected_destination: destination,
            actual_destination: None,
            completed: false,
            unloaded: false,
            state: TaskState::Assigned,
            priority_rank: None,
            sequence: 0,
            expected_date: self.now,
            version: 1,
        };
        f(&mut task);
        self.next_task_id = task.id + 1;
        self.graph.insert_task(task);
        self
    }

    pub fn build(self) -> BatchGraph {
        self.graph
    }
}

/// Resolves against the records already in a graph.
pub struct TestResolver {
    products: Vec<Product>,
    locations: Vec<Location>,
    packages: Vec<Package>,
}

impl TestResolver {
    pub fn from_graph(graph: &BatchGraph) -> Self {
        TestResolver {
            products: graph.products.values().cloned().collect(),
            locations: graph.locations.values().cloned().collect(),
            packages: graph.packages.values().cloned().collect(),
        }
    }
}

impl BarcodeResolver for TestResolver {
    fn resolve_product(&self, barcode: &str) -> Option<Product> {
        self.products.iter().find(|p| p.matches_barcode(barcode)).cloned()
    }

    fn resolve_location(&self, barcode: &str) -> Option<Location> {
        self.locations
            .iter()
            .find(|l| l.barcode.as_deref() == Some(barcode) || l.name == barcode)
            .cloned()
    }

    fn resolve_package(&self, barcode: &str) -> Option<Package> {
        self.packages.iter().find(|p| p.name == barcode).cloned()
    }
}

/// Remembers finalized orders; fails every call while `failure` is set.
#[derive(Default)]
pub struct RecordingFinalizer {
    pub finalized: RefCell<Vec<OrderId>>,
    pub failure: RefCell<Option<String>>,
}

impl RecordingFinalizer {
    pub fn failing(reason: &str) -> Self {
        RecordingFinalizer {
            finalized: RefCell::new(Vec::new()),
            failure: RefCell::new(Some(reason.to_string())),
        }
    }
}

impl OrderFinalizer for RecordingFinalizer {
    fn finalize_order(&self, order: &Order) -> Result<(), FinalizationError> {
        if let Some(reason) = self.failure.borrow().as_ref() {
            return Err(FinalizationError::new(reason.clone()));
        }
        self.finalized.borrow_mut().push(order.id);
        Ok(())
    }
}
