//! # pickwave-core: Pure Picking Logic for Pickwave
//!
//! This crate is the **heart** of Pickwave. It holds the cluster batch
//! picking rules as pure functions over an in-memory batch graph, with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pickwave Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Scanner front end                            │   │
//! │  │   Select batch ──► Scan products ──► Set destination ──► Unload │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ RenderedResponse                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 pickwave-service (PickingService)               │   │
//! │  │      find_batch, scan_product, set_destination, etc.            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pickwave-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   claim   │  │ selector  │  │ workflow  │  │  unload   │  │   │
//! │  │   │  decide   │  │ next_task │  │ scan/dest │  │  groups   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  pickwave-db (Database Layer)                   │   │
//! │  │          SQLite queries, migrations, claim, graph load/save     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records (Batch, Order, Task, Location, ...)
//! - [`graph`] - A batch with its orders and a task arena
//! - [`claim`] - Which batch a worker gets
//! - [`selector`] - Which task comes next
//! - [`workflow`] - The scan state machine
//! - [`unload`] - Finalization and the unload phase
//! - [`response`] / [`message`] - What operations answer
//! - [`error`] - Domain rule violations
//! - [`ports`] - Barcode resolution and order finalization traits
//! - [`validation`] - Input checks
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Same graph and inputs, same response
//! 2. **No I/O**: Collaborators come in through [`ports`]
//! 3. **Validate Then Commit**: A failed operation never mutates the graph
//! 4. **Explicit Errors**: Rule violations are values, never panics
//!
//! ## Example Usage
//!
//! ```rust
//! use pickwave_core::claim::{decide_claim, ClaimCandidate, ClaimDecision};
//! use pickwave_core::{Batch, BatchState};
//!
//! let candidates = vec![ClaimCandidate {
//!     batch: Batch { id: 3, name: "BATCH/0003".into(), state: BatchState::Draft, owner: None },
//!     has_workable_tasks: true,
//! }];
//!
//! assert_eq!(decide_claim(&candidates, 7), ClaimDecision::Claim(3));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod claim;
pub mod error;
pub mod graph;
pub mod message;
pub mod ports;
pub mod response;
pub mod selector;
pub mod types;
pub mod unload;
pub mod validation;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ErrorKind, PickingResult, ScenarioError};
pub use graph::{BatchGraph, GraphChanges};
pub use message::{EnglishCatalog, MessageCatalog};
pub use ports::{AcceptingFinalizer, BarcodeResolver, FinalizationError, OrderFinalizer, ScanTarget};
pub use response::{Message, MessageKind, MessageType, RenderedResponse, Response, ResponseData, ScenarioState};
pub use types::*;
pub use workflow::ClusterPicking;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Priority rank of a task that carries none.
///
/// ## Business Reason
/// Explicitly prioritised tasks (rank below 10) are picked first; everything
/// else is walked in warehouse order.
pub const DEFAULT_PRIORITY_RANK: i32 = 10;
