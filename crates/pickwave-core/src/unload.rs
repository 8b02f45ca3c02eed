//! # Unload Phase
//!
//! Once nothing is left to pick, completed tasks are grouped by where their
//! goods were put and the worker confirms each drop.
//!
//! ## Flow
//! ```text
//!            finalize_orders (all tasks settled)
//!                      │
//!                      ▼
//!               pending_groups
//!        ┌─────────────┼──────────────┐
//!        ▼ 0           ▼ 1            ▼ n > 1
//!   SelectingBatch   UnloadAll      UnloadSingle ──confirm──► next group
//!   NothingToUnload     │                                        │
//!                       └────── confirm last group ◄─────────────┘
//!                                      │
//!                                      ▼
//!                         batch Done, SelectingBatch
//! ```

use crate::error::{ErrorKind, PickingResult, ScenarioError};
use crate::graph::BatchGraph;
use crate::ports::{OrderFinalizer, ScanTarget};
use crate::response::{
    BatchData, DestinationData, Message, MessageKind, Response, ResponseData, ScenarioState,
    TaskData, UnloadData,
};
use crate::types::{BatchState, Destination, OrderState, TaskId, TaskState};

/// Completed tasks sharing one actual destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnloadGroup {
    pub destination: Destination,
    pub task_ids: Vec<TaskId>,
}

/// Groups of tasks still waiting to be unloaded, ordered by their lowest
/// task id.
pub fn pending_groups(graph: &BatchGraph) -> Vec<UnloadGroup> {
    let mut groups: Vec<UnloadGroup> = Vec::new();
    for task in graph.tasks.values() {
        if !task.completed || task.unloaded {
            continue;
        }
        let Some(destination) = task.actual_destination else {
            continue;
        };
        match groups.iter_mut().find(|g| g.destination == destination) {
            Some(group) => group.task_ids.push(task.id),
            None => groups.push(UnloadGroup {
                destination,
                task_ids: vec![task.id],
            }),
        }
    }
    groups
}

/// Returns true if picking is over but some order still waits for the
/// system of record.
pub fn awaits_finalization(graph: &BatchGraph) -> bool {
    graph.all_tasks_settled() && graph.orders.values().any(|o| o.state == OrderState::Open)
}

/// Closes every open order whose tasks are all settled.
///
/// Runs only once no task of the batch is pending. Orders finalized before a
/// failure stay finalized, so a retry only covers the rest.
pub fn finalize_orders(
    graph: &mut BatchGraph,
    finalizer: &dyn OrderFinalizer,
) -> Result<(), ErrorKind> {
    if !graph.all_tasks_settled() {
        return Ok(());
    }

    let open: Vec<_> = graph
        .orders
        .values()
        .filter(|order| order.state == OrderState::Open)
        .cloned()
        .collect();

    for order in open {
        if !graph.tasks_of(order.id).all(|task| task.is_settled()) {
            continue;
        }
        finalizer
            .finalize_order(&order)
            .map_err(|err| ErrorKind::FinalizationFailed {
                order: order.name.clone(),
                reason: err.message,
            })?;

        if let Some(stored) = graph.orders.get_mut(&order.id) {
            stored.state = OrderState::Done;
        }
        for task in graph.tasks.values_mut() {
            if task.order_id == order.id && task.completed {
                task.state = TaskState::Done;
            }
        }
    }
    Ok(())
}

/// `UnloadAll` when every completed task of the batch, unloaded or not,
/// went to the same destination.
fn unload_state(graph: &BatchGraph) -> ScenarioState {
    let mut destinations = graph
        .tasks
        .values()
        .filter(|task| task.completed)
        .filter_map(|task| task.actual_destination);
    let first = destinations.next();
    if first.is_some() && destinations.all(|d| Some(d) == first) {
        ScenarioState::UnloadAll
    } else {
        ScenarioState::UnloadSingle
    }
}

fn unload_data(graph: &BatchGraph, groups: &[UnloadGroup]) -> Option<ResponseData> {
    let group = groups.first()?;
    let tasks = group
        .task_ids
        .iter()
        .filter_map(|id| graph.task(*id))
        .map(|task| TaskData::from_task(graph, task))
        .collect();
    Some(ResponseData::Unload(UnloadData {
        batch: BatchData::from_graph(graph),
        destination: DestinationData::resolve(graph, group.destination),
        tasks,
        remaining_destinations: groups.len(),
    }))
}

/// Presents the first pending destination group.
///
/// When the whole batch went to a single destination the worker confirms
/// everything at once (`UnloadAll`); otherwise destinations are walked one
/// by one (`UnloadSingle`). With nothing to unload the batch is closed when
/// every task is settled.
pub fn prepare_unload(graph: &mut BatchGraph) -> Response {
    let groups = pending_groups(graph);
    match unload_data(graph, &groups) {
        Some(data) => Response::new(unload_state(graph), data),
        None => {
            if graph.all_tasks_settled() {
                graph.batch.state = BatchState::Done;
            }
            Response::new(ScenarioState::SelectingBatch, ResponseData::Empty)
                .with_message(Message::info(MessageKind::NothingToUnload))
        }
    }
}

/// Confirms the drop of the presented group at the scanned target.
///
/// A location matches when it is the group's destination or lies below it;
/// a package must be the destination package itself.
pub fn confirm_unload(graph: &mut BatchGraph, target: ScanTarget) -> PickingResult<Response> {
    let groups = pending_groups(graph);
    let (Some(group), Some(current)) = (groups.first(), unload_data(graph, &groups)) else {
        return Ok(prepare_unload(graph));
    };
    let state = unload_state(graph);
    let fail = |kind| ScenarioError::new(kind, state, current.clone());

    let matches = match (&target, group.destination) {
        (ScanTarget::Unresolved, _) => return Err(fail(ErrorKind::LocationNotFound)),
        (ScanTarget::Location(scanned), Destination::Location(id)) => graph
            .location(id)
            .map_or(scanned.id == id, |expected| scanned.is_sublocation_of(expected)),
        (ScanTarget::Package(scanned), Destination::Package(id)) => scanned.id == id,
        _ => false,
    };
    if !matches {
        return Err(fail(ErrorKind::DestinationNotAllowed));
    }

    for id in &group.task_ids {
        if let Some(task) = graph.task_mut(*id) {
            task.unloaded = true;
        }
    }
    let destination = DestinationData::resolve(graph, group.destination).name;

    let remaining = pending_groups(graph);
    if let Some(data) = unload_data(graph, &remaining) {
        return Ok(Response::new(unload_state(graph), data)
            .with_message(Message::success(MessageKind::UnloadConfirmed { destination })));
    }

    graph.batch.state = BatchState::Done;
    Ok(
        Response::new(ScenarioState::SelectingBatch, ResponseData::Empty).with_message(
            Message::success(MessageKind::BatchCompleted {
                batch: graph.batch.name.clone(),
            }),
        ),
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
