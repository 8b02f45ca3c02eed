//! # Batch Graph
//!
//! The batch together with everything the workflow needs to decide on it:
//! its orders, an arena of tasks indexed by id, and the products, locations
//! and packages those tasks reference.
//!
//! ## Splitting
//! ```text
//! Task #12 (requested 10, placed 4)
//!      │
//!      ▼  split_task(12, 4)
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │ Task #12                 │   │ Task #57 (new id)        │
//! │ requested 4, done 4      │   │ requested 6, done 0      │
//! │ picked portion           │   │ remaining portion        │
//! └──────────────────────────┘   └──────────────────────────┘
//! ```
//! New ids come from a counter seeded above every id the loader saw, so both
//! entries coexist in the arena until the changes are persisted.

use std::collections::{BTreeMap, HashMap};

use crate::types::{
    Batch, Location, LocationId, Order, OrderId, OrderState, Package, PackageId, Product,
    ProductId, Task, TaskId,
};

#[derive(Debug, Clone)]
pub struct BatchGraph {
    pub batch: Batch,
    pub orders: BTreeMap<OrderId, Order>,
    pub tasks: BTreeMap<TaskId, Task>,
    pub products: HashMap<ProductId, Product>,
    pub locations: HashMap<LocationId, Location>,
    pub packages: HashMap<PackageId, Package>,
    next_task_id: TaskId,
}

impl BatchGraph {
    /// Creates an empty graph; split tasks get ids from `next_task_id` up.
    pub fn new(batch: Batch, next_task_id: TaskId) -> Self {
        BatchGraph {
            batch,
            orders: BTreeMap::new(),
            tasks: BTreeMap::new(),
            products: HashMap::new(),
            locations: HashMap::new(),
            packages: HashMap::new(),
            next_task_id,
        }
    }

    pub fn insert_order(&mut self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn insert_task(&mut self, task: Task) {
        self.next_task_id = self.next_task_id.max(task.id + 1);
        self.tasks.insert(task.id, task);
    }

    pub fn insert_product(&mut self, product: Product) {
        self.products.insert(product.id, product);
    }

    pub fn insert_location(&mut self, location: Location) {
        self.locations.insert(location.id, location);
    }

    pub fn insert_package(&mut self, package: Package) {
        self.packages.insert(package.id, package);
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    pub fn order_of(&self, task: &Task) -> Option<&Order> {
        self.orders.get(&task.order_id)
    }

    pub fn product_of(&self, task: &Task) -> Option<&Product> {
        self.products.get(&task.product_id)
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(&id)
    }

    pub fn package(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(&id)
    }

    pub fn tasks_of(&self, order: OrderId) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(move |task| task.order_id == order)
    }

    /// Returns true if no task of the batch is still waiting to be placed.
    pub fn all_tasks_settled(&self) -> bool {
        self.tasks.values().all(Task::is_settled)
    }

    /// Resets a task into the pending pool and reopens its order, so the
    /// order goes through finalization again once the task is placed.
    pub fn reopen_task(&mut self, id: TaskId) -> Option<&Task> {
        let order_id = {
            let task = self.tasks.get_mut(&id)?;
            task.reset();
            task.order_id
        };
        if let Some(order) = self.orders.get_mut(&order_id) {
            order.state = OrderState::Open;
        }
        self.tasks.get(&id)
    }

    /// Splits `quantity` off a task.
    ///
    /// The split task keeps `quantity` as its requested quantity; a new task
    /// carries the remainder with nothing done. Returns the new task's id, or
    /// `None` if there is nothing to split off.
    pub fn split_task(&mut self, id: TaskId, quantity: i64) -> Option<TaskId> {
        let remainder = {
            let task = self.tasks.get_mut(&id)?;
            if quantity <= 0 || quantity >= task.requested_quantity {
                return None;
            }
            let mut remainder = task.clone();
            remainder.requested_quantity = task.requested_quantity - quantity;
            remainder.reset();
            remainder.version = 0;
            task.requested_quantity = quantity;
            remainder
        };

        let new_id = self.next_task_id;
        self.next_task_id += 1;
        self.tasks.insert(new_id, Task { id: new_id, ..remainder });
        Some(new_id)
    }

    /// Lists what changed compared to an earlier snapshot of the same batch.
    pub fn changes_since<'a>(&'a self, before: &BatchGraph) -> GraphChanges<'a> {
        let mut changes = GraphChanges {
            batch: (self.batch != before.batch).then_some(&self.batch),
            ..GraphChanges::default()
        };

        for order in self.orders.values() {
            if before.orders.get(&order.id) != Some(order) {
                changes.orders.push(order);
            }
        }

        for task in self.tasks.values() {
            match before.tasks.get(&task.id) {
                None => changes.inserted_tasks.push(task),
                Some(previous) if previous != task => changes.updated_tasks.push(task),
                Some(_) => {}
            }
        }

        changes
    }
}

/// Records to write back after a workflow operation.
#[derive(Debug, Default)]
pub struct GraphChanges<'a> {
    pub batch: Option<&'a Batch>,
    pub orders: Vec<&'a Order>,
    pub updated_tasks: Vec<&'a Task>,
    pub inserted_tasks: Vec<&'a Task>,
}

impl GraphChanges<'_> {
    pub fn is_empty(&self) -> bool {
        self.batch.is_none()
            && self.orders.is_empty()
            && self.updated_tasks.is_empty()
            && self.inserted_tasks.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{GraphBuilder, OUTPUT_BAY};
    use crate::types::{Destination, TaskState};

    #[test]
    fn test_split_keeps_both_portions() {
        let mut graph = GraphBuilder::new().task(10).build();
        let original = graph.tasks.keys().next().copied().unwrap();

        graph.task_mut(original).unwrap().done_quantity = 4;
        let new_id = graph.split_task(original, 4).unwrap();

        let picked = graph.task(original).unwrap();
        assert_eq!(picked.requested_quantity, 4);
        assert_eq!(picked.done_quantity, 4);

        let remainder = graph.task(new_id).unwrap();
        assert_ne!(new_id, original);
        assert_eq!(remainder.requested_quantity, 6);
        assert_eq!(remainder.done_quantity, 0);
        assert!(!remainder.completed);
        assert_eq!(remainder.order_id, picked.order_id);
    }

    #[test]
    fn test_split_of_finalized_task_leaves_workable_remainder() {
        let mut graph = GraphBuilder::new()
            .task_with(10, |t| t.state = TaskState::Done)
            .build();
        let id = graph.tasks.keys().next().copied().unwrap();

        let new_id = graph.split_task(id, 4).unwrap();
        assert_eq!(graph.task(new_id).unwrap().state, TaskState::Assigned);
        assert_eq!(graph.task(id).unwrap().state, TaskState::Done);
    }

    #[test]
    fn test_reopen_task_reopens_its_order() {
        let mut graph = GraphBuilder::new()
            .order_with(|o| o.state = OrderState::Done)
            .task_with(3, |t| {
                t.done_quantity = 3;
                t.completed = true;
                t.state = TaskState::Done;
                t.actual_destination = Some(Destination::Location(OUTPUT_BAY));
            })
            .build();
        let id = graph.tasks.keys().next().copied().unwrap();

        let task = graph.reopen_task(id).unwrap();
        assert_eq!(task.state, TaskState::Assigned);
        assert_eq!(task.done_quantity, 0);
        assert!(!task.completed);
        let order_id = task.order_id;
        assert_eq!(graph.orders[&order_id].state, OrderState::Open);
        assert!(graph.reopen_task(999).is_none());
    }

    #[test]
    fn test_split_rejects_full_or_empty_quantity() {
        let mut graph = GraphBuilder::new().task(10).build();
        let id = graph.tasks.keys().next().copied().unwrap();

        assert!(graph.split_task(id, 10).is_none());
        assert!(graph.split_task(id, 0).is_none());
        assert!(graph.split_task(999, 1).is_none());
        assert_eq!(graph.tasks.len(), 1);
    }

    #[test]
    fn test_changes_since_detects_updates_and_inserts() {
        let before = GraphBuilder::new().task(10).task(5).build();
        let mut after = before.clone();
        assert!(after.changes_since(&before).is_empty());

        let first = *after.tasks.keys().next().unwrap();
        after.task_mut(first).unwrap().done_quantity = 3;
        after.split_task(first, 3);

        let changes = after.changes_since(&before);
        assert_eq!(changes.updated_tasks.len(), 1);
        assert_eq!(changes.inserted_tasks.len(), 1);
        assert!(changes.batch.is_none());
        assert!(changes.orders.is_empty());
    }
}
