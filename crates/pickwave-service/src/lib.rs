//! # pickwave-service: Scanner Operations for Pickwave
//!
//! The boundary a scanner front end talks to. Each operation loads the
//! batch, lets `pickwave-core` decide, writes the result back and answers
//! with a [`Response`](pickwave_core::Response).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Scanner / UI                                                           │
//! │       │  find_batch, scan_product, set_destination, ...                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────────────────────────────┐  │
//! │  │                pickwave-service (THIS CRATE)                      │  │
//! │  │                                                                   │  │
//! │  │   ServiceConfig ──► PickingService ──► ServiceError → Response    │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! │       │                         │                                       │
//! │       ▼                         ▼                                       │
//! │  pickwave-core             pickwave-db                                  │
//! │  (rules, responses)        (claims, graphs, barcodes)                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use pickwave_core::{AcceptingFinalizer, EnglishCatalog};
//! use pickwave_service::{PickingService, ServiceConfig};
//!
//! let config = ServiceConfig::load(None)?;
//! let service = PickingService::connect(config, worker_id, Arc::new(AcceptingFinalizer)).await?;
//!
//! let response = service.find_batch().await;
//! println!("{}", serde_json::to_string(&response.render(&EnglishCatalog))?);
//! ```

pub mod config;
pub mod error;
pub mod service;

pub use config::{ClaimSettings, DatabaseSettings, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use service::PickingService;
