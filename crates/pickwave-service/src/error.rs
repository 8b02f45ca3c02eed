//! # Service Error Types
//!
//! Failures below the picking rules: configuration and storage.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Service Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────────┐          ┌───────────────────────────────────┐ │
//! │  │   Configuration     │          │            Database               │ │
//! │  │                     │          │                                   │ │
//! │  │  InvalidConfig      │          │  Database(DbError)                │ │
//! │  │  ConfigLoadFailed   │          │    Conflict → reload, warn worker │ │
//! │  │                     │          │    others  → ServiceUnavailable   │ │
//! │  └─────────────────────┘          └───────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Picking rule violations are not errors here: the workflow already answers
//! them with a response. A `ServiceError` never leaves an operation either;
//! [`ServiceError::into_response`] turns it into one.

use thiserror::Error;

use pickwave_core::{Message, MessageKind, Response, ResponseData, ScenarioState};
use pickwave_db::DbError;

/// Result type alias for service setup and internals.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A configuration value is out of range.
    #[error("Invalid service configuration: {0}")]
    InvalidConfig(String),

    /// The config file could not be read or parsed.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ServiceError {
    fn from(err: toml::de::Error) -> Self {
        ServiceError::ConfigLoadFailed(err.to_string())
    }
}

impl ServiceError {
    /// Returns true if another request changed the same task first.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Database(DbError::Conflict { .. }))
    }

    /// Answer for a request that could not be carried out at all.
    ///
    /// The scanner goes back to batch selection, which reloads everything.
    pub fn into_response(self) -> Response {
        Response::new(ScenarioState::SelectingBatch, ResponseData::Empty)
            .with_message(Message::error(MessageKind::ServiceUnavailable))
    }
}
