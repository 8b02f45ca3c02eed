//! # Error Types
//!
//! Domain rule violations raised by the picking workflow.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  workflow operation                                                     │
//! │      │                                                                  │
//! │      ├── Ok(Response)                    ──► commit, send response      │
//! │      │                                                                  │
//! │      └── Err(ScenarioError)              ──► discard changes,           │
//! │            kind  : what rule was broken       into_response()           │
//! │            state : where the scanner goes                               │
//! │            data  : context for that state                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Every error is recoverable: it always becomes a response
//! 2. Errors carry the state and context to show, never a stack unwind
//! 3. Message text lives in the catalog, errors only name the kind

use thiserror::Error;

use crate::response::{Message, MessageKind, MessageType, Response, ResponseData, ScenarioState};

/// The rule a request broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The batch does not exist or the worker lost it.
    #[error("Batch not found")]
    BatchNotFound,

    /// The task id is stale or unknown in this batch.
    #[error("Operation not found")]
    OperationNotFound,

    /// The barcode resolved to no product or to another product.
    #[error("Product not found")]
    ProductNotFound,

    #[error("Location not found")]
    LocationNotFound,

    /// Counting past the requested quantity.
    #[error("Quantity exceeds the requested {requested}")]
    QuantityExceeded { requested: i64 },

    #[error("Invalid quantity {quantity}")]
    InvalidQuantity { quantity: i64 },

    #[error("Destination not allowed")]
    DestinationNotAllowed,

    /// Counting or placing on a task whose goods are already placed.
    ///
    /// ## When This Occurs
    /// - A scanner retries a request for a line it already finished
    /// - Two screens work the same batch
    #[error("Line already placed")]
    LineAlreadyPlaced,

    /// Cancelling or putting back goods that were already dropped.
    #[error("Line already unloaded")]
    LineAlreadyUnloaded,

    /// Placing more than is still requested on the task.
    #[error("Unable to pick more than {requested}")]
    UnableToPickMore { requested: i64 },

    /// The system of record refused to close an order.
    #[error("Finalization of {order} failed: {reason}")]
    FinalizationFailed { order: String, reason: String },
}

impl ErrorKind {
    pub fn message(&self) -> Message {
        let kind = match self {
            ErrorKind::BatchNotFound => MessageKind::BatchNotFound,
            ErrorKind::OperationNotFound => MessageKind::OperationNotFound,
            ErrorKind::ProductNotFound => MessageKind::ProductNotFound,
            ErrorKind::LocationNotFound => MessageKind::LocationNotFound,
            ErrorKind::QuantityExceeded { requested } => MessageKind::QuantityExceeded {
                requested: *requested,
            },
            ErrorKind::InvalidQuantity { quantity } => MessageKind::InvalidQuantity {
                quantity: *quantity,
            },
            ErrorKind::DestinationNotAllowed => MessageKind::DestinationNotAllowed,
            ErrorKind::LineAlreadyPlaced => MessageKind::LineAlreadyPlaced,
            ErrorKind::LineAlreadyUnloaded => MessageKind::LineAlreadyUnloaded,
            ErrorKind::UnableToPickMore { requested } => MessageKind::UnableToPickMore {
                requested: *requested,
            },
            ErrorKind::FinalizationFailed { order, reason } => {
                return Message::literal(MessageType::Error, format!("{}: {}", order, reason));
            }
        };
        Message::error(kind)
    }
}

/// A rule violation with the state and context to answer with.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct ScenarioError {
    pub kind: ErrorKind,
    pub state: ScenarioState,
    pub data: ResponseData,
}

impl ScenarioError {
    pub fn new(kind: ErrorKind, state: ScenarioState, data: ResponseData) -> Self {
        ScenarioError { kind, state, data }
    }

    /// Sends the worker back to batch selection.
    pub fn batch_not_found() -> Self {
        ScenarioError::new(
            ErrorKind::BatchNotFound,
            ScenarioState::SelectingBatch,
            ResponseData::Empty,
        )
    }

    pub fn into_response(self) -> Response {
        let message = self.kind.message();
        Response::new(self.state, self.data).with_message(message)
    }
}

impl From<ScenarioError> for Response {
    fn from(err: ScenarioError) -> Self {
        err.into_response()
    }
}

/// Convenience type alias for workflow results.
pub type PickingResult<T> = Result<T, ScenarioError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::MessageBody;

    #[test]
    fn test_error_messages() {
        let err = ErrorKind::UnableToPickMore { requested: 6 };
        assert_eq!(err.to_string(), "Unable to pick more than 6");

        let err = ErrorKind::FinalizationFailed {
            order: "OUT/0004".to_string(),
            reason: "carrier missing".to_string(),
        };
        assert_eq!(err.to_string(), "Finalization of OUT/0004 failed: carrier missing");
    }

    #[test]
    fn test_batch_not_found_restarts_selection() {
        let response = ScenarioError::batch_not_found().into_response();
        assert_eq!(response.next_state, ScenarioState::SelectingBatch);
        assert_eq!(response.data, ResponseData::Empty);
        assert_eq!(
            response.message.unwrap().kind(),
            Some(&MessageKind::BatchNotFound)
        );
    }

    #[test]
    fn test_finalization_failure_uses_literal_text() {
        let message = ErrorKind::FinalizationFailed {
            order: "OUT/0004".to_string(),
            reason: "carrier missing".to_string(),
        }
        .message();
        assert_eq!(message.message_type, MessageType::Error);
        assert_eq!(
            message.body,
            MessageBody::Literal("OUT/0004: carrier missing".to_string())
        );
    }
}
