//! # Picking Service
//!
//! The operations a scanner calls, one per workflow step.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  scan_product(batch 4, task 12, "A-001")                                │
//! │                                                                         │
//! │  BEGIN IMMEDIATE                 (waits busy_timeout for other writers) │
//! │    barcode::lookup("A-001")      → ScannedBarcode                       │
//! │    graph::load_graph(4)          → before                               │
//! │    ensure_worked_by(worker)      ✗ → BatchNotFound response             │
//! │    ClusterPicking on a clone     ✗ → rule response, ROLLBACK            │
//! │    graph::save_changes(diff)     ✗ Conflict → reload, ConcurrentUpdate  │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  → Response { next_state, data, message }                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every public operation returns a [`Response`]; nothing escapes as an
//! error. Rule violations leave the database untouched.

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use pickwave_core::response::BatchData;
use pickwave_core::workflow::{ensure_worked_by, scan_data};
use pickwave_core::{
    BatchGraph, BatchId, ClusterPicking, Message, MessageKind, MessageType, OrderFinalizer,
    PickingResult, Response, ResponseData, ScenarioError, ScenarioState, TaskId, WorkerId,
};
use pickwave_db::{barcode, graph, Database, DbError, ScannedBarcode};

use crate::config::ServiceConfig;
use crate::error::ServiceResult;

/// Scanner-facing operations for one worker.
#[derive(Clone)]
pub struct PickingService {
    db: Database,
    worker: WorkerId,
    config: ServiceConfig,
    finalizer: Arc<dyn OrderFinalizer + Send + Sync>,
}

impl PickingService {
    pub fn new(
        db: Database,
        worker: WorkerId,
        config: ServiceConfig,
        finalizer: Arc<dyn OrderFinalizer + Send + Sync>,
    ) -> Self {
        PickingService {
            db,
            worker,
            config,
            finalizer,
        }
    }

    /// Opens the database described by `config` and builds the service.
    pub async fn connect(
        config: ServiceConfig,
        worker: WorkerId,
        finalizer: Arc<dyn OrderFinalizer + Send + Sync>,
    ) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(PickingService::new(db, worker, config, finalizer))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Hands the worker a batch: the one in progress, else a fresh claim.
    #[instrument(skip(self), fields(worker_id = self.worker))]
    pub async fn find_batch(&self) -> Response {
        match self.try_find_batch().await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "Batch search failed");
                err.into_response()
            }
        }
    }

    #[instrument(skip(self), fields(worker_id = self.worker))]
    pub async fn confirm_start(&self, batch_id: BatchId) -> Response {
        self.run(batch_id, None, |picking, graph| picking.confirm_start(graph))
            .await
    }

    #[instrument(skip(self), fields(worker_id = self.worker))]
    pub async fn scan_product(&self, batch_id: BatchId, task_id: TaskId, barcode: &str) -> Response {
        self.run(batch_id, Some(barcode), |picking, graph| {
            picking.scan_product(graph, task_id, barcode)
        })
        .await
    }

    #[instrument(skip(self), fields(worker_id = self.worker))]
    pub async fn set_quantity(
        &self,
        batch_id: BatchId,
        task_id: TaskId,
        barcode: &str,
        quantity: i64,
    ) -> Response {
        self.run(batch_id, Some(barcode), |picking, graph| {
            picking.set_quantity(graph, task_id, barcode, quantity)
        })
        .await
    }

    #[instrument(skip(self), fields(worker_id = self.worker))]
    pub async fn set_destination(
        &self,
        batch_id: BatchId,
        task_id: TaskId,
        barcode: &str,
        quantity: i64,
    ) -> Response {
        self.run(batch_id, Some(barcode), |picking, graph| {
            picking.set_destination(graph, task_id, barcode, quantity)
        })
        .await
    }

    #[instrument(skip(self), fields(worker_id = self.worker))]
    pub async fn cancel_line(&self, batch_id: BatchId, task_id: TaskId) -> Response {
        self.run(batch_id, None, |picking, graph| picking.cancel_line(graph, task_id))
            .await
    }

    #[instrument(skip(self), fields(worker_id = self.worker))]
    pub async fn prepare_unload(&self, batch_id: BatchId) -> Response {
        self.run(batch_id, None, |picking, graph| picking.prepare_unload(graph))
            .await
    }

    #[instrument(skip(self), fields(worker_id = self.worker))]
    pub async fn confirm_unload(&self, batch_id: BatchId, barcode: &str) -> Response {
        self.run(batch_id, Some(barcode), |picking, graph| {
            picking.confirm_unload(graph, barcode)
        })
        .await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn try_find_batch(&self) -> ServiceResult<Response> {
        let claimed = self
            .db
            .batches()
            .find_or_claim(self.worker, self.config.claim.max_attempts)
            .await?;

        let Some(batch) = claimed else {
            return Ok(Response::new(ScenarioState::SelectingBatch, ResponseData::Empty)
                .with_message(Message::info(MessageKind::NoBatchAvailable)));
        };

        let graph = self
            .load(batch.id)
            .await?
            .ok_or_else(|| DbError::not_found("batch", batch.id.to_string()))?;

        Ok(Response::new(
            ScenarioState::ConfirmStart,
            ResponseData::Batch(BatchData::from_graph(&graph)),
        ))
    }

    async fn load(&self, batch_id: BatchId) -> ServiceResult<Option<BatchGraph>> {
        let mut conn = self.db.pool().acquire().await.map_err(DbError::from)?;
        Ok(graph::load_graph(&mut conn, batch_id).await?)
    }

    /// Runs one workflow step and turns every outcome into a response.
    async fn run<F>(&self, batch_id: BatchId, scanned: Option<&str>, operation: F) -> Response
    where
        F: FnOnce(&ClusterPicking<'_>, &mut BatchGraph) -> PickingResult<Response>,
    {
        match self.execute(batch_id, scanned, operation).await {
            Ok(response) => response,
            Err(err) if err.is_conflict() => {
                warn!(batch_id, error = %err, "Batch changed underneath the request");
                self.reload_after_conflict(batch_id).await
            }
            Err(err) => {
                error!(batch_id, error = %err, "Operation failed");
                err.into_response()
            }
        }
    }

    async fn execute<F>(
        &self,
        batch_id: BatchId,
        scanned: Option<&str>,
        operation: F,
    ) -> ServiceResult<Response>
    where
        F: FnOnce(&ClusterPicking<'_>, &mut BatchGraph) -> PickingResult<Response>,
    {
        let mut tx = self.db.begin().await?;

        let resolved = match scanned {
            Some(raw) => barcode::lookup(&mut tx, raw).await?,
            None => ScannedBarcode::default(),
        };

        let Some(before) = graph::load_graph(&mut tx, batch_id).await? else {
            debug!(batch_id, "Batch does not exist");
            return Ok(ScenarioError::batch_not_found().into_response());
        };

        let mut after = before.clone();
        let outcome = {
            let picking = ClusterPicking::new(&resolved, &*self.finalizer);
            ensure_worked_by(&before, self.worker).and_then(|()| operation(&picking, &mut after))
        };

        let response = match outcome {
            Ok(response) => response,
            Err(rejected) => {
                debug!(batch_id, kind = %rejected.kind, "Request rejected");
                return Ok(rejected.into_response());
            }
        };

        let changes = after.changes_since(&before);
        if !changes.is_empty() {
            graph::save_changes(&mut tx, &changes).await?;
        }
        tx.commit().await.map_err(DbError::from)?;

        info!(batch_id, next_state = ?response.next_state, "Request applied");
        Ok(response)
    }

    /// Answers a lost write with the state as it is now.
    async fn reload_after_conflict(&self, batch_id: BatchId) -> Response {
        match self.load(batch_id).await {
            Ok(Some(graph)) if graph.batch.is_worked_by(self.worker) => {
                Response::new(ScenarioState::ScanProducts, scan_data(&graph, None)).with_message(
                    Message::new(MessageType::Warning, MessageKind::ConcurrentUpdate),
                )
            }
            Ok(_) => ScenarioError::batch_not_found().into_response(),
            Err(err) => {
                error!(batch_id, error = %err, "Reload after conflict failed");
                err.into_response()
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
