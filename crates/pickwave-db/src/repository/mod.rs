//! # Repository Module
//!
//! Database access for Pickwave, grouped by concern.
//!
//! ## Two Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pool-owning repositories (own their transactions)                      │
//! │    BatchRepository       find_or_claim, get                             │
//! │    WarehouseRepository   insert reference data and batches              │
//! │                                                                         │
//! │  Connection functions (run inside the caller's transaction)             │
//! │    graph::load_graph     batch + orders + tasks + referenced records    │
//! │    graph::save_changes   versioned task writes                          │
//! │    barcode::lookup       resolve one scanned string                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A scanner request loads, decides and saves inside one transaction, so the
//! graph functions take a `&mut SqliteConnection` instead of a pool.

pub mod barcode;
pub mod batch;
pub mod graph;
pub mod warehouse;

pub(crate) mod rows;
