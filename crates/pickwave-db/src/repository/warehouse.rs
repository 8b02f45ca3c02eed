//! Warehouse reference data and batch preparation.
//!
//! Batches arrive prepared: something upstream groups orders and reserves
//! stock. This repository is that upstream for the seed tool and the tests.

use sqlx::SqlitePool;
use tracing::debug;

use pickwave_core::{Batch, Location, Order, Package, Product, Task};

use crate::error::DbResult;
use crate::pool::begin_write;
use crate::repository::graph;

/// Inserts locations, products, packages and prepared batches.
#[derive(Debug, Clone)]
pub struct WarehouseRepository {
    pool: SqlitePool,
}

impl WarehouseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WarehouseRepository { pool }
    }

    pub async fn insert_location(&self, location: &Location) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO locations (id, name, barcode, parent_path, picking_sequence)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(location.id)
        .bind(&location.name)
        .bind(&location.barcode)
        .bind(&location.parent_path)
        .bind(&location.picking_sequence)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts a product and its alternate barcodes in one transaction.
    pub async fn insert_product(&self, product: &Product) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        sqlx::query("INSERT INTO products (id, name, barcode) VALUES (?1, ?2, ?3)")
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.barcode)
            .execute(&mut *tx)
            .await?;

        for barcode in &product.alternate_barcodes {
            sqlx::query("INSERT INTO product_barcodes (product_id, barcode) VALUES (?1, ?2)")
                .bind(product.id)
                .bind(barcode)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn insert_package(&self, package: &Package) -> DbResult<()> {
        sqlx::query("INSERT INTO packages (id, name) VALUES (?1, ?2)")
            .bind(package.id)
            .bind(&package.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Inserts a batch with its orders and tasks in one transaction.
    pub async fn insert_batch(&self, batch: &Batch, orders: &[Order], tasks: &[Task]) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        sqlx::query("INSERT INTO batches (id, name, state, owner_id) VALUES (?1, ?2, ?3, ?4)")
            .bind(batch.id)
            .bind(&batch.name)
            .bind(batch.state)
            .bind(batch.owner)
            .execute(&mut *tx)
            .await?;

        for order in orders {
            sqlx::query(
                r#"
                INSERT INTO orders (
                    id, name, batch_id, state, priority, scheduled_date, sequence, destination_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(order.id)
            .bind(&order.name)
            .bind(batch.id)
            .bind(order.state)
            .bind(order.priority)
            .bind(order.scheduled_date)
            .bind(order.sequence)
            .bind(order.destination)
            .execute(&mut *tx)
            .await?;
        }

        for task in tasks {
            graph::insert_task(&mut tx, task).await?;
        }

        tx.commit().await?;
        debug!(
            batch_id = batch.id,
            orders = orders.len(),
            tasks = tasks.len(),
            "Batch inserted"
        );
        Ok(())
    }

    pub async fn count_batches(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM batches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
