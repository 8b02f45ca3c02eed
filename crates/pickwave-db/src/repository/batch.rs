//! # Batch Repository
//!
//! Finds the batch a worker should pick and claims it atomically.
//!
//! ## Claim Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  attempt n                                                              │
//! │    1. read candidates (unowned drafts + the worker's own batches)       │
//! │    2. decide_claim()  → Resume | Start | Claim | NoWork                 │
//! │    3. conditional UPDATE                                                │
//! │         Claim: … WHERE id = ? AND owner_id IS NULL AND state = 'draft'  │
//! │         Start: … WHERE id = ? AND owner_id = ?  AND state = 'draft'     │
//! │    4. 0 rows or write-lock lost → rollback, attempt n + 1               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Two workers racing for the same draft both pass step 2, but only one
//! UPDATE matches. The loser retries and gets the next batch.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use pickwave_core::claim::{decide_claim, ClaimCandidate, ClaimDecision};
use pickwave_core::{Batch, BatchId, WorkerId};

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::rows::{BatchRow, ClaimCandidateRow, BATCH_COLUMNS};

/// Outcome of one claim attempt.
enum ClaimAttempt {
    Settled(Option<Batch>),
    Lost(BatchId),
}

/// Repository for batch claims and lookups.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Gets a batch by id.
    pub async fn get(&self, id: BatchId) -> DbResult<Option<Batch>> {
        let row = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {} FROM batches WHERE id = ?1",
            BATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Batch::from))
    }

    /// Returns the batch `worker` should pick, claiming or starting it if
    /// needed. `None` means there is nothing to do.
    ///
    /// Calling it again while the batch is in progress returns the same
    /// batch.
    ///
    /// ## Errors
    /// `DbError::Conflict` if every one of `max_attempts` attempts lost a
    /// race to another worker.
    pub async fn find_or_claim(
        &self,
        worker: WorkerId,
        max_attempts: u32,
    ) -> DbResult<Option<Batch>> {
        let attempts = max_attempts.max(1);

        for attempt in 1..=attempts {
            match self.try_find_or_claim(worker).await {
                Ok(ClaimAttempt::Settled(batch)) => return Ok(batch),
                Ok(ClaimAttempt::Lost(batch_id)) => {
                    warn!(worker, batch_id, attempt, "Batch taken by another worker, retrying");
                }
                Err(err) if err.is_retryable() => {
                    warn!(worker, attempt, error = %err, "Claim attempt failed, retrying");
                }
                Err(err) => return Err(err),
            }
        }

        Err(DbError::conflict("batch claim for worker", worker))
    }

    async fn try_find_or_claim(&self, worker: WorkerId) -> DbResult<ClaimAttempt> {
        let mut tx = begin_write(&self.pool).await?;

        let candidates = load_candidates(&mut tx, worker).await?;
        let decision = decide_claim(&candidates, worker);
        debug!(worker, candidates = candidates.len(), ?decision, "Claim decision");

        let won = match decision {
            ClaimDecision::NoWork => {
                tx.rollback().await?;
                info!(worker, "No batch available");
                return Ok(ClaimAttempt::Settled(None));
            }
            ClaimDecision::Resume(_) => true,
            ClaimDecision::Start(id) => start_own_draft(&mut tx, id, worker).await?,
            ClaimDecision::Claim(id) => claim_unowned(&mut tx, id, worker).await?,
        };

        let Some(batch_id) = decision.batch_id() else {
            return Ok(ClaimAttempt::Settled(None));
        };
        if !won {
            tx.rollback().await?;
            return Ok(ClaimAttempt::Lost(batch_id));
        }

        let batch = sqlx::query_as::<_, BatchRow>(&format!(
            "SELECT {} FROM batches WHERE id = ?1",
            BATCH_COLUMNS
        ))
        .bind(batch_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(Batch::from);
        tx.commit().await?;

        info!(worker, batch_id, ?decision, "Batch assigned");
        Ok(ClaimAttempt::Settled(batch))
    }
}

async fn load_candidates(
    conn: &mut SqliteConnection,
    worker: WorkerId,
) -> DbResult<Vec<ClaimCandidate>> {
    let rows = sqlx::query_as::<_, ClaimCandidateRow>(
        r#"
        SELECT b.id, b.name, b.state, b.owner_id,
            EXISTS (
                SELECT 1 FROM tasks t
                JOIN orders o ON o.id = t.order_id
                WHERE o.batch_id = b.id
                  AND t.state IN ('assigned', 'partially_available')
            ) AS workable_tasks
        FROM batches b
        WHERE (b.owner_id IS NULL AND b.state = 'draft')
           OR (b.owner_id = ?1 AND b.state IN ('draft', 'in_progress'))
        ORDER BY b.id
        "#,
    )
    .bind(worker)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ClaimCandidate {
            batch: Batch {
                id: row.id,
                name: row.name,
                state: row.state,
                owner: row.owner_id,
            },
            has_workable_tasks: row.workable_tasks != 0,
        })
        .collect())
}

/// Moves a draft already assigned to `worker` to in progress.
async fn start_own_draft(
    conn: &mut SqliteConnection,
    id: BatchId,
    worker: WorkerId,
) -> DbResult<bool> {
    let result = sqlx::query(
        "UPDATE batches SET state = 'in_progress' WHERE id = ?1 AND owner_id = ?2 AND state = 'draft'",
    )
    .bind(id)
    .bind(worker)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Takes an unowned draft for `worker`. Returns false if someone got there
/// first.
pub(crate) async fn claim_unowned(
    conn: &mut SqliteConnection,
    id: BatchId,
    worker: WorkerId,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE batches SET owner_id = ?1, state = 'in_progress'
        WHERE id = ?2 AND owner_id IS NULL AND state = 'draft'
        "#,
    )
    .bind(worker)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Unit Tests
// =============================================================================
