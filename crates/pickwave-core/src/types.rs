//! # Domain Types
//!
//! Core domain records for cluster batch picking.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Batch       │ 1 │     Order       │ 1 │      Task       │       │
//! │  │  ─────────────  │──►│  ─────────────  │──►│  ─────────────  │       │
//! │  │  id, name       │ * │  priority       │ * │  requested/done │       │
//! │  │  state, owner   │   │  destination    │   │  source, dest   │       │
//! │  └─────────────────┘   └─────────────────┘   │  completed      │       │
//! │                                              └────────┬────────┘       │
//! │                                                       │                 │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │    Product      │   │    Location     │   │  Destination    │       │
//! │  │  barcodes       │   │  parent_path    │   │  Location(id)   │       │
//! │  └─────────────────┘   └─────────────────┘   │  Package(id)    │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are referenced by integer ids. The ordering of ids matters: batch
//! claims walk candidates in ascending id order and task ids are the final
//! tie-break when ordering work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::DEFAULT_PRIORITY_RANK;

pub type WorkerId = i64;
pub type BatchId = i64;
pub type OrderId = i64;
pub type TaskId = i64;
pub type ProductId = i64;
pub type LocationId = i64;
pub type PackageId = i64;

// =============================================================================
// Batch
// =============================================================================

/// Lifecycle of a picking batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// Prepared, not yet started by anyone.
    #[default]
    Draft,
    /// Claimed by a worker who is picking it.
    InProgress,
    /// Every destination has been unloaded.
    Done,
}

/// A unit of work grouping one or more orders for a single worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    pub state: BatchState,
    /// The worker currently holding the batch.
    pub owner: Option<WorkerId>,
}

impl Batch {
    /// Returns true if `worker` is picking this batch right now.
    pub fn is_worked_by(&self, worker: WorkerId) -> bool {
        self.state == BatchState::InProgress && self.owner == Some(worker)
    }
}

// =============================================================================
// Order
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    #[default]
    Open,
    /// Finalized in the system of record.
    Done,
}

/// A picking document grouping tasks with a common expected destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: OrderId,
    pub name: String,
    pub batch_id: BatchId,
    pub state: OrderState,
    /// Business priority of the moves; higher is more urgent.
    pub priority: i32,
    #[ts(as = "String")]
    pub scheduled_date: DateTime<Utc>,
    /// Internal sequence number used as an ordering tie-break.
    pub sequence: i64,
    /// Where the picked goods of this order are expected to go.
    pub destination: LocationId,
}

// =============================================================================
// Task
// =============================================================================

/// Reservation state of a task as reported by the stock system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting for stock.
    Confirmed,
    #[default]
    Assigned,
    PartiallyAvailable,
    Done,
    Cancelled,
}

impl TaskState {
    /// Returns true if stock is reserved so the task can be worked.
    pub fn is_workable(&self) -> bool {
        matches!(self, TaskState::Assigned | TaskState::PartiallyAvailable)
    }
}

/// Where a task's goods were actually put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Destination {
    Location(LocationId),
    Package(PackageId),
}

/// The atomic unit of work: one product and quantity to pick and place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Task {
    pub id: TaskId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub requested_quantity: i64,
    pub done_quantity: i64,
    pub source_location: LocationId,
    /// Package the goods are taken from, if any.
    pub source_package: Option<PackageId>,
    pub expected_destination: LocationId,
    pub actual_destination: Option<Destination>,
    pub completed: bool,
    /// Set once the goods have been dropped during the unload phase.
    pub unloaded: bool,
    pub state: TaskState,
    /// Explicit priority; lower is more urgent.
    pub priority_rank: Option<i32>,
    pub sequence: i64,
    #[ts(as = "String")]
    pub expected_date: DateTime<Utc>,
    /// Optimistic concurrency token, bumped on every persisted write.
    pub version: i64,
}

impl Task {
    pub fn priority_rank(&self) -> i32 {
        self.priority_rank.unwrap_or(DEFAULT_PRIORITY_RANK)
    }

    /// Returns true if a prior scan cycle put the goods into a package other
    /// than the one they came from.
    pub fn is_shelved(&self) -> bool {
        match self.actual_destination {
            Some(Destination::Package(package)) => self.source_package != Some(package),
            _ => false,
        }
    }

    /// Returns true if the task no longer blocks batch completion.
    pub fn is_settled(&self) -> bool {
        self.completed || self.state == TaskState::Cancelled
    }

    /// Puts the task back into the pending pool.
    ///
    /// A task closed by finalization becomes workable again.
    pub(crate) fn reset(&mut self) {
        self.done_quantity = 0;
        self.actual_destination = None;
        self.completed = false;
        self.unloaded = false;
        if self.state == TaskState::Done {
            self.state = TaskState::Assigned;
        }
    }
}

// =============================================================================
// Product, Location, Package
// =============================================================================

/// A product identified by one or more barcodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub barcode: Option<String>,
    #[serde(default)]
    pub alternate_barcodes: Vec<String>,
}

impl Product {
    pub fn matches_barcode(&self, barcode: &str) -> bool {
        self.barcode.as_deref() == Some(barcode)
            || self.alternate_barcodes.iter().any(|b| b == barcode)
    }
}

/// A node of the warehouse location tree.
///
/// ## Hierarchy
/// `parent_path` is the materialised path of ids from the root down to and
/// including this location, e.g. `"1/4/9/"` for location 9 under 4 under 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub barcode: Option<String>,
    pub parent_path: String,
    /// Walking order through the warehouse, compared as text.
    pub picking_sequence: Option<String>,
}

impl Location {
    /// Ids along the path from the root to this location.
    pub fn path_ids(&self) -> impl Iterator<Item = LocationId> + '_ {
        self.parent_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .filter_map(|segment| segment.parse().ok())
    }

    /// Returns true if this location is `other` or lies below it.
    pub fn is_sublocation_of(&self, other: &Location) -> bool {
        self.id == other.id || self.path_ids().any(|id| id == other.id)
    }

    pub fn is_sublocation_of_any<'a>(&self, others: impl IntoIterator<Item = &'a Location>) -> bool {
        others.into_iter().any(|other| self.is_sublocation_of(other))
    }

    pub fn picking_sequence(&self) -> &str {
        self.picking_sequence.as_deref().unwrap_or("")
    }
}

/// An opaque container the goods can be dropped into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Package {
    pub id: PackageId,
    pub name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: LocationId, parent_path: &str) -> Location {
        Location {
            id,
            name: format!("LOC-{}", id),
            barcode: None,
            parent_path: parent_path.to_string(),
            picking_sequence: None,
        }
    }

    #[test]
    fn test_sublocation_follows_parent_path() {
        let stock = location(1, "1/");
        let shelf = location(4, "1/4/");
        let bin = location(9, "1/4/9/");
        let other = location(5, "1/5/");

        assert!(bin.is_sublocation_of(&stock));
        assert!(bin.is_sublocation_of(&shelf));
        assert!(bin.is_sublocation_of(&bin));
        assert!(!bin.is_sublocation_of(&other));
        assert!(!stock.is_sublocation_of(&bin));
        assert!(bin.is_sublocation_of_any([&other, &shelf]));
        assert!(!shelf.is_sublocation_of_any([&other, &bin]));
    }

    #[test]
    fn test_product_matches_alternate_barcodes() {
        let product = Product {
            id: 1,
            name: "Widget".to_string(),
            barcode: Some("A-001".to_string()),
            alternate_barcodes: vec!["A-001-BOX".to_string()],
        };
        assert!(product.matches_barcode("A-001"));
        assert!(product.matches_barcode("A-001-BOX"));
        assert!(!product.matches_barcode("B-001"));
    }

    #[test]
    fn test_task_state_workable() {
        assert!(TaskState::Assigned.is_workable());
        assert!(TaskState::PartiallyAvailable.is_workable());
        assert!(!TaskState::Confirmed.is_workable());
        assert!(!TaskState::Done.is_workable());
        assert_eq!(TaskState::default(), TaskState::Assigned);
        assert_eq!(BatchState::default(), BatchState::Draft);
    }

    #[test]
    fn test_destination_wire_shape() {
        let json = serde_json::to_string(&Destination::Package(7)).unwrap();
        assert_eq!(json, r#"{"kind":"package","id":7}"#);
    }
}
