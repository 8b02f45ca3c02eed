//! # Collaborator Ports
//!
//! What the workflow needs from the outside world, as traits:
//!
//! ```text
//! ┌──────────────────┐     resolve_*      ┌──────────────────────────┐
//! │  ClusterPicking  │ ─────────────────► │  BarcodeResolver         │
//! │                  │                    │  (db lookup, test maps)  │
//! │                  │  finalize_order    ├──────────────────────────┤
//! │                  │ ─────────────────► │  OrderFinalizer          │
//! └──────────────────┘                    │  (system of record)      │
//!                                         └──────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{Location, Order, Package, Product};

/// Maps a scanned string to the record it identifies.
pub trait BarcodeResolver {
    fn resolve_product(&self, barcode: &str) -> Option<Product>;
    fn resolve_location(&self, barcode: &str) -> Option<Location>;
    fn resolve_package(&self, barcode: &str) -> Option<Package>;
}

/// A destination barcode after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    Location(Location),
    Package(Package),
    Unresolved,
}

impl ScanTarget {
    /// Locations win over packages when a barcode names both.
    pub fn resolve(resolver: &dyn BarcodeResolver, barcode: &str) -> Self {
        if let Some(location) = resolver.resolve_location(barcode) {
            return ScanTarget::Location(location);
        }
        match resolver.resolve_package(barcode) {
            Some(package) => ScanTarget::Package(package),
            None => ScanTarget::Unresolved,
        }
    }
}

/// The system of record refused to close an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FinalizationError {
    pub message: String,
}

impl FinalizationError {
    pub fn new(message: impl Into<String>) -> Self {
        FinalizationError {
            message: message.into(),
        }
    }
}

/// Closes fully picked orders in the system of record.
pub trait OrderFinalizer {
    fn finalize_order(&self, order: &Order) -> Result<(), FinalizationError>;
}

/// Finalizer for deployments where closing orders happens elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptingFinalizer;

impl OrderFinalizer for AcceptingFinalizer {
    fn finalize_order(&self, _order: &Order) -> Result<(), FinalizationError> {
        Ok(())
    }
}
