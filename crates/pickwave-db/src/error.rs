//! # Database Error Types
//!
//! ## Who Handles What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error / MigrateError                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ─┬─ Conflict, TransactionFailed, PoolExhausted  (retryable)    │
//! │           │     claim loop retries; service reloads and answers         │
//! │           │     ConcurrentUpdate                                        │
//! │           │                                                             │
//! │           └─ everything else                                            │
//! │                 service logs it and answers ServiceUnavailable          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind as SqlxErrorKind;
use thiserror::Error;

/// SQLite result codes that mean "someone else holds the lock".
///
/// 5 = SQLITE_BUSY, 6 = SQLITE_LOCKED, 517 = SQLITE_BUSY_SNAPSHOT (a WAL
/// reader tried to become a writer after another commit).
const LOCK_CODES: &[&str] = &["5", "6", "517"];

#[derive(Debug, Error)]
pub enum DbError {
    /// A lookup that must find a row found none.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected an insert.
    ///
    /// ## When This Occurs
    /// - Two products share a barcode
    /// - An explicit id is reused
    #[error("Duplicate value for {constraint}")]
    UniqueViolation { constraint: String },

    /// A referenced location, product, order or package does not exist.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A concurrent writer changed the row first.
    ///
    /// ## When This Occurs
    /// - A task UPDATE matched no row because its version moved on
    /// - A split task id was taken by another batch's split
    /// - Every claim attempt lost its race
    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: String, id: String },

    /// The database could not be opened.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A statement failed for a reason other than the ones above.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The write lock could not be taken in time.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn conflict(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::Conflict {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Returns true if running the whole operation again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DbError::Conflict { .. } | DbError::TransactionFailed(_) | DbError::PoolExhausted
        )
    }
}

/// ## Mapping
/// ```text
/// RowNotFound                         → NotFound
/// Database, UNIQUE                    → UniqueViolation
/// Database, FOREIGN KEY               → ForeignKeyViolation
/// Database, code 5 / 6 / 517          → TransactionFailed
/// Database, anything else             → QueryFailed
/// PoolTimedOut                        → PoolExhausted
/// PoolClosed                          → ConnectionFailed
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("row", "query returned nothing"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                let locked = db_err
                    .code()
                    .is_some_and(|code| LOCK_CODES.iter().any(|lock| *lock == code));

                match db_err.kind() {
                    SqlxErrorKind::UniqueViolation => DbError::UniqueViolation {
                        constraint: message
                            .strip_prefix("UNIQUE constraint failed: ")
                            .unwrap_or(&message)
                            .to_string(),
                    },
                    SqlxErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation(message),
                    _ if locked || message.contains("database is locked") => {
                        DbError::TransactionFailed(message)
                    }
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(DbError::conflict("task", 12).is_retryable());
        assert!(DbError::TransactionFailed("database is locked".into()).is_retryable());
        assert!(DbError::PoolExhausted.is_retryable());

        assert!(!DbError::not_found("batch", "3").is_retryable());
        assert!(!DbError::MigrationFailed("bad sql".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            DbError::conflict("task", 12).to_string(),
            "task 12 was modified concurrently"
        );
        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            DbError::from(sqlx::Error::PoolTimedOut),
            DbError::PoolExhausted
        ));
    }

    #[tokio::test]
    async fn test_constraint_errors_are_categorised() {
        let db = crate::testing::warehouse_db().await;

        let duplicate = sqlx::query("INSERT INTO packages (id, name) VALUES (99, 'PACK-0001')")
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(duplicate, DbError::UniqueViolation { .. }));

        let dangling = sqlx::query("INSERT INTO product_barcodes (product_id, barcode) VALUES (404, 'X')")
            .execute(db.pool())
            .await
            .map_err(DbError::from)
            .unwrap_err();
        assert!(matches!(dangling, DbError::ForeignKeyViolation(_)));
    }
}
