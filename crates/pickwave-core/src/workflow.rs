//! # Scan Workflow
//!
//! The cluster picking state machine. Every operation takes the batch graph
//! explicitly, validates first and only then mutates, so a failed call never
//! leaves a partial change behind.
//!
//! ## Operations
//! ```text
//! ┌──────────────────┬──────────────────────────────────────────────────────┐
//! │ confirm_start    │ next task, or finalize + unload                      │
//! │ scan_product     │ done += 1         (ProductNotFound, QuantityExceeded)│
//! │ set_quantity     │ done = qty        (ProductNotFound, QuantityExceeded)│
//! │ set_destination  │ put back | split + place (LocationNotFound,          │
//! │                  │   DestinationNotAllowed, UnableToPickMore)           │
//! │ cancel_line      │ reset the task                                       │
//! │ prepare_unload   │ like confirm_start; retries finalization             │
//! │ confirm_unload   │ drop the presented destination group                 │
//! └──────────────────┴──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Finished Lines
//! A placed task cannot be counted or placed again (`LineAlreadyPlaced`).
//! Cancelling it or scanning its source location takes it back into the
//! pending pool and reopens its order if that order was already finalized.
//! Goods confirmed during unloading stay where they are (`LineAlreadyUnloaded`).
//!
//! ## Finalization
//! When the last task is placed, each fully picked order is handed to the
//! [`OrderFinalizer`]. A refusal is answered with `ScanProducts` and the
//! literal reason, while the placed tasks stay as they are: the caller keeps
//! the changes and the next `confirm_start`/`prepare_unload` retries only the
//! finalization.

use crate::error::{ErrorKind, PickingResult, ScenarioError};
use crate::graph::BatchGraph;
use crate::ports::{BarcodeResolver, OrderFinalizer, ScanTarget};
use crate::response::{
    BatchData, Message, MessageKind, Response, ResponseData, ScanProductsData, ScenarioState,
    TaskData,
};
use crate::selector;
use crate::types::{Destination, Location, LocationId, ProductId, TaskId, WorkerId};
use crate::unload;
use crate::validation::{check_count, check_placement, normalize_barcode};

/// Rejects a batch the worker is not currently picking.
pub fn ensure_worked_by(graph: &BatchGraph, worker: WorkerId) -> PickingResult<()> {
    if graph.batch.is_worked_by(worker) {
        Ok(())
    } else {
        Err(ScenarioError::batch_not_found())
    }
}

/// Scan context focused on `focus` when it exists, else on the next task.
pub fn scan_data(graph: &BatchGraph, focus: Option<TaskId>) -> ResponseData {
    let task = focus
        .and_then(|id| graph.task(id))
        .or_else(|| selector::next_task(graph))
        .map(|task| TaskData::from_task(graph, task));
    ResponseData::ScanProducts(ScanProductsData {
        batch: BatchData::from_graph(graph),
        task,
        settled_task_count: graph.tasks.values().filter(|t| t.is_settled()).count(),
    })
}

/// Plain facts about a task, copied out so the graph can be mutated later.
struct TaskFacts {
    product_id: ProductId,
    product_name: String,
    requested: i64,
    done: i64,
    source_location: LocationId,
    order_destination: Option<LocationId>,
    completed: bool,
    unloaded: bool,
}

pub struct ClusterPicking<'a> {
    resolver: &'a dyn BarcodeResolver,
    finalizer: &'a dyn OrderFinalizer,
}

impl<'a> ClusterPicking<'a> {
    pub fn new(resolver: &'a dyn BarcodeResolver, finalizer: &'a dyn OrderFinalizer) -> Self {
        ClusterPicking {
            resolver,
            finalizer,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn scan_error(&self, graph: &BatchGraph, kind: ErrorKind, focus: Option<TaskId>) -> ScenarioError {
        ScenarioError::new(kind, ScenarioState::ScanProducts, scan_data(graph, focus))
    }

    fn facts(&self, graph: &BatchGraph, task_id: TaskId) -> PickingResult<TaskFacts> {
        let task = graph
            .task(task_id)
            .ok_or_else(|| self.scan_error(graph, ErrorKind::OperationNotFound, None))?;
        Ok(TaskFacts {
            product_id: task.product_id,
            product_name: graph.product_of(task).map(|p| p.name.clone()).unwrap_or_default(),
            requested: task.requested_quantity,
            done: task.done_quantity,
            source_location: task.source_location,
            order_destination: graph.order_of(task).map(|o| o.destination),
            completed: task.completed,
            unloaded: task.unloaded,
        })
    }

    /// Facts of a task that is still waiting to be counted and placed.
    fn pending_facts(&self, graph: &BatchGraph, task_id: TaskId) -> PickingResult<TaskFacts> {
        let facts = self.facts(graph, task_id)?;
        if facts.completed {
            return Err(self.scan_error(graph, ErrorKind::LineAlreadyPlaced, None));
        }
        Ok(facts)
    }

    /// Dropped goods cannot be taken back into the pending pool.
    fn ensure_not_unloaded(
        &self,
        graph: &BatchGraph,
        task_id: TaskId,
        facts: &TaskFacts,
    ) -> PickingResult<()> {
        if facts.unloaded {
            return Err(self.scan_error(graph, ErrorKind::LineAlreadyUnloaded, Some(task_id)));
        }
        Ok(())
    }

    fn check_product(
        &self,
        graph: &BatchGraph,
        task_id: TaskId,
        facts: &TaskFacts,
        barcode: &str,
    ) -> PickingResult<()> {
        let product = normalize_barcode(barcode).and_then(|b| self.resolver.resolve_product(b));
        match product {
            Some(product) if product.id == facts.product_id => Ok(()),
            _ => Err(self.scan_error(graph, ErrorKind::ProductNotFound, Some(task_id))),
        }
    }

    /// A location is a valid drop when it lies under the order destination
    /// or already holds goods placed during this batch.
    fn location_allowed(&self, graph: &BatchGraph, location: &Location, facts: &TaskFacts) -> bool {
        let under_destination = facts
            .order_destination
            .and_then(|id| graph.location(id))
            .is_some_and(|destination| location.is_sublocation_of(destination));
        let already_used = graph.tasks.values().any(|task| {
            task.completed
                && !task.unloaded
                && task.actual_destination == Some(Destination::Location(location.id))
        });
        under_destination || already_used
    }

    /// Next task if any; otherwise finalize orders and move to unloading.
    fn advance(&self, graph: &mut BatchGraph, message: Option<Message>) -> Response {
        if let Some(task) = selector::next_task(graph) {
            let data = scan_data(graph, Some(task.id));
            return Response::new(ScenarioState::ScanProducts, data).or_message(message);
        }
        match unload::finalize_orders(graph, self.finalizer) {
            Ok(()) => unload::prepare_unload(graph).or_message(message),
            Err(kind) => Response::new(ScenarioState::ScanProducts, scan_data(graph, None))
                .with_message(kind.message()),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub fn confirm_start(&self, graph: &mut BatchGraph) -> PickingResult<Response> {
        Ok(self.advance(graph, None))
    }

    /// Counts one more unit of the task's product.
    pub fn scan_product(
        &self,
        graph: &mut BatchGraph,
        task_id: TaskId,
        barcode: &str,
    ) -> PickingResult<Response> {
        let facts = self.pending_facts(graph, task_id)?;
        self.check_product(graph, task_id, &facts, barcode)?;
        let count = facts.done + 1;
        check_count(count, facts.requested)
            .map_err(|kind| self.scan_error(graph, kind, Some(task_id)))?;

        if let Some(task) = graph.task_mut(task_id) {
            task.done_quantity = count;
        }
        Ok(self.advance(graph, None))
    }

    /// Overwrites the counted quantity of the task.
    pub fn set_quantity(
        &self,
        graph: &mut BatchGraph,
        task_id: TaskId,
        barcode: &str,
        quantity: i64,
    ) -> PickingResult<Response> {
        let facts = self.pending_facts(graph, task_id)?;
        self.check_product(graph, task_id, &facts, barcode)?;
        check_count(quantity, facts.requested)
            .map_err(|kind| self.scan_error(graph, kind, Some(task_id)))?;

        if let Some(task) = graph.task_mut(task_id) {
            task.done_quantity = quantity;
        }
        Ok(self.advance(graph, None))
    }

    /// Places `quantity` of the task at the scanned location or package.
    ///
    /// Scanning the task's own source location puts the goods back instead,
    /// whatever the task's progress, as long as they were not unloaded yet.
    /// Placing less than requested splits the remainder into a new task.
    pub fn set_destination(
        &self,
        graph: &mut BatchGraph,
        task_id: TaskId,
        barcode: &str,
        quantity: i64,
    ) -> PickingResult<Response> {
        let facts = self.facts(graph, task_id)?;
        let target = match normalize_barcode(barcode) {
            Some(barcode) => ScanTarget::resolve(self.resolver, barcode),
            None => ScanTarget::Unresolved,
        };

        let (destination, message) = match target {
            ScanTarget::Unresolved => {
                return Err(self.scan_error(graph, ErrorKind::LocationNotFound, Some(task_id)));
            }
            ScanTarget::Location(location) if location.id == facts.source_location => {
                self.ensure_not_unloaded(graph, task_id, &facts)?;
                graph.reopen_task(task_id);
                let message = Message::success(MessageKind::ReturnedToSource {
                    product: facts.product_name,
                    location: location.name,
                });
                return Ok(self.advance(graph, Some(message)));
            }
            ScanTarget::Location(_) | ScanTarget::Package(_) if facts.completed => {
                return Err(self.scan_error(graph, ErrorKind::LineAlreadyPlaced, None));
            }
            ScanTarget::Location(location) => {
                check_placement(quantity, facts.requested)
                    .map_err(|kind| self.scan_error(graph, kind, Some(task_id)))?;
                if !self.location_allowed(graph, &location, &facts) {
                    return Err(self.scan_error(
                        graph,
                        ErrorKind::DestinationNotAllowed,
                        Some(task_id),
                    ));
                }
                let message = Message::success(MessageKind::ProductPlaced {
                    quantity,
                    product: facts.product_name,
                    destination: location.name.clone(),
                });
                let destination = Destination::Location(location.id);
                graph.insert_location(location);
                (destination, message)
            }
            ScanTarget::Package(package) => {
                check_placement(quantity, facts.requested)
                    .map_err(|kind| self.scan_error(graph, kind, Some(task_id)))?;
                let message = Message::success(MessageKind::ProductPacked {
                    quantity,
                    product: facts.product_name,
                    package: package.name.clone(),
                });
                let destination = Destination::Package(package.id);
                graph.insert_package(package);
                (destination, message)
            }
        };

        graph.split_task(task_id, quantity);
        if let Some(task) = graph.task_mut(task_id) {
            task.done_quantity = quantity;
            task.actual_destination = Some(destination);
            task.completed = true;
        }
        Ok(self.advance(graph, Some(message)))
    }

    /// Puts the task back in the pending pool, heading to its order's
    /// destination again. A finalized order is reopened.
    pub fn cancel_line(&self, graph: &mut BatchGraph, task_id: TaskId) -> PickingResult<Response> {
        let facts = self.facts(graph, task_id)?;
        self.ensure_not_unloaded(graph, task_id, &facts)?;
        graph.reopen_task(task_id);
        if let Some(task) = graph.task_mut(task_id) {
            if let Some(destination) = facts.order_destination {
                task.expected_destination = destination;
            }
        }
        let message = Message::info(MessageKind::LineCancelled {
            product: facts.product_name,
        });
        Ok(self.advance(graph, Some(message)))
    }

    pub fn prepare_unload(&self, graph: &mut BatchGraph) -> PickingResult<Response> {
        Ok(self.advance(graph, None))
    }

    /// Confirms the drop of the destination group currently presented.
    ///
    /// While picking or finalization is unfinished the worker is sent back
    /// to that step instead.
    pub fn confirm_unload(&self, graph: &mut BatchGraph, barcode: &str) -> PickingResult<Response> {
        if selector::next_task(graph).is_some() || unload::awaits_finalization(graph) {
            return Ok(self.advance(graph, None));
        }
        let target = match normalize_barcode(barcode) {
            Some(barcode) => ScanTarget::resolve(self.resolver, barcode),
            None => ScanTarget::Unresolved,
        };
        unload::confirm_unload(graph, target)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
