//! # Batch Graph Persistence
//!
//! Loads a batch with everything the workflow touches and writes back what
//! an operation changed.
//!
//! ## Optimistic Task Writes
//! ```text
//! request A                         request B
//! ─────────                         ─────────
//! load task 12 (version 3)          load task 12 (version 3)
//! UPDATE … WHERE id=12 AND version=3
//!   → 1 row, version 4, commit
//!                                   UPDATE … WHERE id=12 AND version=3
//!                                     → 0 rows → DbError::Conflict
//! ```
//! Neither write is silently lost: the second request fails and is retried
//! against fresh state.

use sqlx::SqliteConnection;
use tracing::{debug, warn};

use pickwave_core::{BatchGraph, BatchId, GraphChanges, Task};

use crate::error::{DbError, DbResult};
use crate::repository::barcode::attach_alternate_barcodes;
use crate::repository::rows::{
    destination_columns, BatchRow, LocationRow, OrderRow, PackageRow, ProductRow, TaskRow,
    BATCH_COLUMNS, TASK_COLUMNS,
};

/// Loads the batch graph, or `None` if the batch does not exist.
///
/// Locations are loaded for every id a task or order of the batch
/// references; packages likewise. Split tasks get ids above every task id
/// currently stored.
pub async fn load_graph(
    conn: &mut SqliteConnection,
    batch_id: BatchId,
) -> DbResult<Option<BatchGraph>> {
    let batch = sqlx::query_as::<_, BatchRow>(&format!(
        "SELECT {} FROM batches WHERE id = ?1",
        BATCH_COLUMNS
    ))
    .bind(batch_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(batch) = batch else {
        return Ok(None);
    };

    let next_task_id: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) + 1 FROM tasks")
        .fetch_one(&mut *conn)
        .await?;

    let mut graph = BatchGraph::new(batch.into(), next_task_id);

    let orders = sqlx::query_as::<_, OrderRow>(
        r#"
        SELECT id, name, batch_id, state, priority, scheduled_date, sequence, destination_id
        FROM orders
        WHERE batch_id = ?1
        "#,
    )
    .bind(batch_id)
    .fetch_all(&mut *conn)
    .await?;
    for order in orders {
        graph.insert_order(order.into());
    }

    let tasks = sqlx::query_as::<_, TaskRow>(&format!(
        "SELECT {} FROM tasks t JOIN orders o ON o.id = t.order_id WHERE o.batch_id = ?1",
        TASK_COLUMNS
    ))
    .bind(batch_id)
    .fetch_all(&mut *conn)
    .await?;
    for task in tasks {
        graph.insert_task(task.into());
    }

    let mut products: Vec<_> = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, barcode
        FROM products
        WHERE id IN (
            SELECT t.product_id FROM tasks t
            JOIN orders o ON o.id = t.order_id
            WHERE o.batch_id = ?1
        )
        "#,
    )
    .bind(batch_id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(Into::into)
    .collect();
    attach_alternate_barcodes(&mut *conn, &mut products).await?;
    for product in products {
        graph.insert_product(product);
    }

    let locations = sqlx::query_as::<_, LocationRow>(
        r#"
        WITH batch_tasks AS (
            SELECT t.* FROM tasks t
            JOIN orders o ON o.id = t.order_id
            WHERE o.batch_id = ?1
        )
        SELECT id, name, barcode, parent_path, picking_sequence
        FROM locations
        WHERE id IN (
            SELECT source_location_id FROM batch_tasks
            UNION SELECT expected_destination_id FROM batch_tasks
            UNION SELECT dest_location_id FROM batch_tasks WHERE dest_location_id IS NOT NULL
            UNION SELECT destination_id FROM orders WHERE batch_id = ?1
        )
        "#,
    )
    .bind(batch_id)
    .fetch_all(&mut *conn)
    .await?;
    for location in locations {
        graph.insert_location(location.into());
    }

    let packages = sqlx::query_as::<_, PackageRow>(
        r#"
        WITH batch_tasks AS (
            SELECT t.* FROM tasks t
            JOIN orders o ON o.id = t.order_id
            WHERE o.batch_id = ?1
        )
        SELECT id, name
        FROM packages
        WHERE id IN (
            SELECT source_package_id FROM batch_tasks WHERE source_package_id IS NOT NULL
            UNION SELECT dest_package_id FROM batch_tasks WHERE dest_package_id IS NOT NULL
        )
        "#,
    )
    .bind(batch_id)
    .fetch_all(&mut *conn)
    .await?;
    for package in packages {
        graph.insert_package(package.into());
    }

    debug!(
        batch_id,
        orders = graph.orders.len(),
        tasks = graph.tasks.len(),
        "Loaded batch graph"
    );
    Ok(Some(graph))
}

/// Writes back the changes of one workflow operation.
///
/// ## Errors
/// `DbError::Conflict` if a task was changed by someone else since it was
/// loaded, or a split task id was taken meanwhile. The caller must roll back.
pub async fn save_changes(conn: &mut SqliteConnection, changes: &GraphChanges<'_>) -> DbResult<()> {
    if let Some(batch) = changes.batch {
        sqlx::query("UPDATE batches SET state = ?1, owner_id = ?2 WHERE id = ?3")
            .bind(batch.state)
            .bind(batch.owner)
            .bind(batch.id)
            .execute(&mut *conn)
            .await?;
    }

    for order in &changes.orders {
        sqlx::query("UPDATE orders SET state = ?1 WHERE id = ?2")
            .bind(order.state)
            .bind(order.id)
            .execute(&mut *conn)
            .await?;
    }

    for task in &changes.updated_tasks {
        update_task(&mut *conn, task).await?;
    }

    for task in &changes.inserted_tasks {
        insert_task(&mut *conn, task).await.map_err(|err| match err {
            DbError::UniqueViolation { .. } => DbError::conflict("task", task.id),
            other => other,
        })?;
    }

    debug!(
        updated = changes.updated_tasks.len(),
        inserted = changes.inserted_tasks.len(),
        "Saved batch changes"
    );
    Ok(())
}

async fn update_task(conn: &mut SqliteConnection, task: &Task) -> DbResult<()> {
    let (dest_location, dest_package) = destination_columns(task.actual_destination);
    let result = sqlx::query(
        r#"
        UPDATE tasks SET
            requested_quantity = ?1,
            done_quantity = ?2,
            expected_destination_id = ?3,
            dest_location_id = ?4,
            dest_package_id = ?5,
            completed = ?6,
            unloaded = ?7,
            state = ?8,
            version = version + 1
        WHERE id = ?9 AND version = ?10
        "#,
    )
    .bind(task.requested_quantity)
    .bind(task.done_quantity)
    .bind(task.expected_destination)
    .bind(dest_location)
    .bind(dest_package)
    .bind(task.completed)
    .bind(task.unloaded)
    .bind(task.state)
    .bind(task.id)
    .bind(task.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        warn!(task_id = task.id, version = task.version, "Task changed concurrently");
        return Err(DbError::conflict("task", task.id));
    }
    Ok(())
}

/// Inserts a task with its own id.
pub(crate) async fn insert_task(conn: &mut SqliteConnection, task: &Task) -> DbResult<()> {
    let (dest_location, dest_package) = destination_columns(task.actual_destination);
    sqlx::query(
        r#"
        INSERT INTO tasks (
            id, order_id, product_id, requested_quantity, done_quantity,
            source_location_id, source_package_id, expected_destination_id,
            dest_location_id, dest_package_id, completed, unloaded, state,
            priority_rank, sequence, expected_date, version
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
        "#,
    )
    .bind(task.id)
    .bind(task.order_id)
    .bind(task.product_id)
    .bind(task.requested_quantity)
    .bind(task.done_quantity)
    .bind(task.source_location)
    .bind(task.source_package)
    .bind(task.expected_destination)
    .bind(dest_location)
    .bind(dest_package)
    .bind(task.completed)
    .bind(task.unloaded)
    .bind(task.state)
    .bind(task.priority_rank)
    .bind(task.sequence)
    .bind(task.expected_date)
    .bind(task.version.max(1))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
