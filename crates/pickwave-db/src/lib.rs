//! # pickwave-db: Database Layer for Pickwave
//!
//! SQLite persistence for batches, orders, tasks and warehouse reference
//! data, with sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pickwave Data Flow                               │
//! │                                                                         │
//! │  PickingService::set_destination (pickwave-service)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────────────────────────────┐  │
//! │  │                   pickwave-db (THIS CRATE)                        │  │
//! │  │                                                                   │  │
//! │  │   ┌───────────────┐   ┌──────────────────┐   ┌────────────────┐   │  │
//! │  │   │   Database    │   │   Repositories   │   │   Migrations   │   │  │
//! │  │   │   (pool.rs)   │   │                  │   │   (embedded)   │   │  │
//! │  │   │               │   │ BatchRepository  │   │                │   │  │
//! │  │   │ SqlitePool    │◄──│ graph::load/save │   │ 001_initial_   │   │  │
//! │  │   │ Transactions  │   │ barcode::lookup  │   │   schema.sql   │   │  │
//! │  │   └───────────────┘   └──────────────────┘   └────────────────┘   │  │
//! │  │                                                                   │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────────────────────────────┐  │
//! │  │                     SQLite Database (WAL)                         │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Claims, batch graphs, barcode lookup, reference data
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pickwave_db::{graph, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("pickwave.db")).await?;
//!
//! let batch = db.batches().find_or_claim(worker_id, 5).await?;
//!
//! let mut tx = db.begin().await?;
//! let graph = graph::load_graph(&mut tx, batch_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::barcode::{self, ScannedBarcode};
pub use repository::batch::BatchRepository;
pub use repository::graph;
pub use repository::warehouse::WarehouseRepository;
