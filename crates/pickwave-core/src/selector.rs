//! # Task Selector
//!
//! Decides which task of a batch the worker should pick next.
//!
//! ## Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sort key (ascending, compared left to right)                           │
//! │                                                                         │
//! │  1. task priority rank              (unset = 10, lower first)           │
//! │  2. source picking sequence, name   (walk the warehouse in order)       │
//! │  3. order move priority             (higher first)                      │
//! │  4. order scheduled date            (earlier first)                     │
//! │  5. order sequence                                                      │
//! │  6. order id                                                            │
//! │  7. task id                         (unique: the order is total)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::cmp::Reverse;

use chrono::{DateTime, Utc};

use crate::graph::BatchGraph;
use crate::types::{Order, OrderId, Task, TaskId};

/// Sort key of an eligible task. Field order is comparison order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TaskSortKey<'a> {
    priority_rank: i32,
    picking_sequence: &'a str,
    location_name: &'a str,
    order_priority: Reverse<i32>,
    scheduled_date: DateTime<Utc>,
    order_sequence: i64,
    order_id: OrderId,
    task_id: TaskId,
}

pub fn sort_key<'a>(graph: &'a BatchGraph, task: &Task, order: &Order) -> TaskSortKey<'a> {
    let source = graph.location(task.source_location);
    TaskSortKey {
        priority_rank: task.priority_rank(),
        picking_sequence: source.map(|l| l.picking_sequence()).unwrap_or(""),
        location_name: source.map(|l| l.name.as_str()).unwrap_or(""),
        order_priority: Reverse(order.priority),
        scheduled_date: order.scheduled_date,
        order_sequence: order.sequence,
        order_id: order.id,
        task_id: task.id,
    }
}

/// Returns the task's order if the task can be worked on now.
///
/// A task is eligible when its stock is reserved, it has not been placed yet,
/// it was not shelved into another package by a previous cycle, and it still
/// heads where its order expects the goods to go.
fn eligible_order<'a>(graph: &'a BatchGraph, task: &Task) -> Option<&'a Order> {
    if !task.state.is_workable() || task.completed || task.is_shelved() {
        return None;
    }
    graph
        .order_of(task)
        .filter(|order| order.destination == task.expected_destination)
}

/// Eligible tasks of the batch, in pick order.
pub fn eligible_tasks(graph: &BatchGraph) -> Vec<&Task> {
    let mut keyed: Vec<(TaskSortKey<'_>, &Task)> = graph
        .tasks
        .values()
        .filter_map(|task| eligible_order(graph, task).map(|order| (sort_key(graph, task, order), task)))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, task)| task).collect()
}

/// The task to work next, or `None` when the batch has nothing left to pick.
pub fn next_task(graph: &BatchGraph) -> Option<&Task> {
    graph
        .tasks
        .values()
        .filter_map(|task| eligible_order(graph, task).map(|order| (sort_key(graph, task, order), task)))
        .min_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, task)| task)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{GraphBuilder, PACKAGE, SHELF_A, SHELF_B};
    use crate::types::{Destination, TaskState};
    use chrono::Duration;

    fn ids(tasks: Vec<&Task>) -> Vec<TaskId> {
        tasks.into_iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_empty_batch_has_no_next_task() {
        let graph = GraphBuilder::new().build();
        assert!(next_task(&graph).is_none());
        assert!(eligible_tasks(&graph).is_empty());
    }

    #[test]
    fn test_priority_rank_wins_over_location() {
        let graph = GraphBuilder::new()
            .task_with(5, |t| t.source_location = SHELF_A)
            .task_with(5, |t| {
                t.source_location = SHELF_B;
                t.priority_rank = Some(1);
            })
            .build();
        let next = next_task(&graph).unwrap();
        assert_eq!(next.source_location, SHELF_B);
    }

    #[test]
    fn test_picking_sequence_then_name() {
        // SHELF_B carries picking sequence "001", SHELF_A none ("")
        let graph = GraphBuilder::new()
            .task_with(1, |t| t.source_location = SHELF_B)
            .task_with(1, |t| t.source_location = SHELF_A)
            .build();
        let order: Vec<_> = eligible_tasks(&graph).iter().map(|t| t.source_location).collect();
        assert_eq!(order, vec![SHELF_A, SHELF_B]);
    }

    #[test]
    fn test_order_priority_date_sequence_and_id() {
        let base = GraphBuilder::new();
        let date = base.now();
        let graph = base
            .order_with(|o| o.priority = 0)
            .task(1)
            .order_with(|o| o.priority = 1)
            .task(1)
            .order_with(|o| {
                o.priority = 1;
                o.scheduled_date = date - Duration::hours(1);
            })
            .task(1)
            .order_with(|o| {
                o.priority = 1;
                o.scheduled_date = date - Duration::hours(1);
                o.sequence = -1;
            })
            .task(1)
            .build();

        let order_ids: Vec<_> = eligible_tasks(&graph).iter().map(|t| t.order_id).collect();
        let mut by_id: Vec<_> = graph.orders.keys().copied().collect();
        by_id.sort();
        // orders were created with ascending ids: 1 (default), 2, 3, 4, 5
        assert_eq!(order_ids, vec![by_id[4], by_id[3], by_id[2], by_id[1]]);
    }

    #[test]
    fn test_task_id_breaks_remaining_ties() {
        let graph = GraphBuilder::new().task(1).task(1).task(1).build();
        let ordered = ids(eligible_tasks(&graph));
        let mut sorted = ordered.clone();
        sorted.sort();
        assert_eq!(ordered, sorted);
        sorted.dedup();
        assert_eq!(sorted.len(), 3);
    }

    #[test]
    fn test_sort_keys_never_tie() {
        let graph = GraphBuilder::new().task(1).task(1).task(2).build();
        let tasks = eligible_tasks(&graph);
        for a in &tasks {
            for b in &tasks {
                if a.id != b.id {
                    let ka = sort_key(&graph, a, graph.order_of(a).unwrap());
                    let kb = sort_key(&graph, b, graph.order_of(b).unwrap());
                    assert_ne!(ka, kb);
                }
            }
        }
    }

    #[test]
    fn test_ineligible_tasks_are_skipped() {
        let graph = GraphBuilder::new()
            .task_with(1, |t| t.state = TaskState::Confirmed)
            .task_with(1, |t| t.completed = true)
            .task_with(1, |t| t.actual_destination = Some(Destination::Package(PACKAGE)))
            .task_with(1, |t| t.expected_destination = SHELF_B)
            .build();
        assert!(next_task(&graph).is_none());
    }

    #[test]
    fn test_task_placed_back_in_its_own_package_stays_eligible() {
        let graph = GraphBuilder::new()
            .task_with(1, |t| {
                t.source_package = Some(PACKAGE);
                t.actual_destination = Some(Destination::Package(PACKAGE));
            })
            .build();
        assert!(next_task(&graph).is_some());
    }
}
