//! # Batch Claim Decision
//!
//! Pure half of the batch claim service: which batch a worker should get.
//! Persisting the decision atomically is the database layer's job.
//!
//! ## Business Rules (first match wins)
//! ```text
//! a. InProgress batch owned by the worker   → Resume (returned unchanged)
//! b. Draft batch owned by the worker        → Start  (set InProgress)
//! c. Unowned Draft batch, lowest id first   → Claim  (set owner + InProgress)
//! d. Nothing                                → NoWork
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{Batch, BatchId, BatchState, WorkerId};

/// A batch as seen by the claim search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCandidate {
    pub batch: Batch,
    /// At least one task of the batch has reserved stock.
    pub has_workable_tasks: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimDecision {
    Resume(BatchId),
    Start(BatchId),
    Claim(BatchId),
    NoWork,
}

impl ClaimDecision {
    pub fn batch_id(&self) -> Option<BatchId> {
        match self {
            ClaimDecision::Resume(id) | ClaimDecision::Start(id) | ClaimDecision::Claim(id) => {
                Some(*id)
            }
            ClaimDecision::NoWork => None,
        }
    }
}

/// Returns true if `worker` may be handed this batch.
///
/// A batch already in progress is kept even when its tasks drifted out of a
/// workable state, so the worker can recover it.
pub fn is_claim_candidate(candidate: &ClaimCandidate, worker: WorkerId) -> bool {
    let batch = &candidate.batch;
    let reachable = match (batch.owner, batch.state) {
        (None, BatchState::Draft) => true,
        (Some(owner), BatchState::Draft | BatchState::InProgress) => owner == worker,
        _ => false,
    };
    reachable && (batch.state == BatchState::InProgress || candidate.has_workable_tasks)
}

/// Picks the batch to hand to `worker`.
pub fn decide_claim(candidates: &[ClaimCandidate], worker: WorkerId) -> ClaimDecision {
    let mut eligible: Vec<&Batch> = candidates
        .iter()
        .filter(|c| is_claim_candidate(c, worker))
        .map(|c| &c.batch)
        .collect();
    eligible.sort_by_key(|batch| batch.id);

    if let Some(batch) = eligible.iter().find(|b| b.is_worked_by(worker)) {
        return ClaimDecision::Resume(batch.id);
    }
    if let Some(batch) = eligible.iter().find(|b| b.owner == Some(worker)) {
        return ClaimDecision::Start(batch.id);
    }
    match eligible.first() {
        Some(batch) => ClaimDecision::Claim(batch.id),
        None => ClaimDecision::NoWork,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ME: WorkerId = 7;
    const OTHER: WorkerId = 8;

    fn candidate(id: BatchId, state: BatchState, owner: Option<WorkerId>) -> ClaimCandidate {
        ClaimCandidate {
            batch: Batch {
                id,
                name: format!("BATCH/{:04}", id),
                state,
                owner,
            },
            has_workable_tasks: true,
        }
    }

    #[test]
    fn test_no_candidates_means_no_work() {
        assert_eq!(decide_claim(&[], ME), ClaimDecision::NoWork);
    }

    #[test]
    fn test_in_progress_of_worker_comes_first() {
        let candidates = vec![
            candidate(1, BatchState::Draft, None),
            candidate(2, BatchState::Draft, Some(ME)),
            candidate(3, BatchState::InProgress, Some(ME)),
        ];
        assert_eq!(decide_claim(&candidates, ME), ClaimDecision::Resume(3));
    }

    #[test]
    fn test_own_draft_before_unowned() {
        let candidates = vec![
            candidate(1, BatchState::Draft, None),
            candidate(2, BatchState::Draft, Some(ME)),
        ];
        assert_eq!(decide_claim(&candidates, ME), ClaimDecision::Start(2));
    }

    #[test]
    fn test_lowest_unowned_draft_is_claimed() {
        let candidates = vec![
            candidate(9, BatchState::Draft, None),
            candidate(4, BatchState::Draft, None),
            candidate(2, BatchState::InProgress, Some(OTHER)),
            candidate(1, BatchState::Draft, Some(OTHER)),
        ];
        assert_eq!(decide_claim(&candidates, ME), ClaimDecision::Claim(4));
    }

    #[test]
    fn test_batches_without_workable_tasks_are_skipped_unless_in_progress() {
        let mut drifted_draft = candidate(1, BatchState::Draft, None);
        drifted_draft.has_workable_tasks = false;
        assert!(!is_claim_candidate(&drifted_draft, ME));

        let mut drifted_started = candidate(2, BatchState::InProgress, Some(ME));
        drifted_started.has_workable_tasks = false;
        assert!(is_claim_candidate(&drifted_started, ME));

        assert_eq!(
            decide_claim(&[drifted_draft, drifted_started], ME),
            ClaimDecision::Resume(2)
        );
    }

    #[test]
    fn test_done_batches_are_never_candidates() {
        let done = candidate(1, BatchState::Done, Some(ME));
        assert!(!is_claim_candidate(&done, ME));
        assert_eq!(ClaimDecision::NoWork.batch_id(), None);
        assert_eq!(ClaimDecision::Claim(5).batch_id(), Some(5));
    }
}
