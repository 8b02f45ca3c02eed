//! # Validation Module
//!
//! Input checks shared by the scan workflow operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Scanner front end                                             │
//! │  └── Basic format checks (empty scans, numeric quantity fields)         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Workflow (Rust)                                               │
//! │  └── THIS MODULE: barcode normalisation, quantity rules                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK constraints on quantities                                    │
//! │  └── Version check on every task write                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checks return the [`ErrorKind`] to raise; the caller attaches the state
//! and context.

use crate::error::ErrorKind;

/// Longest barcode accepted from a scanner.
pub const MAX_BARCODE_LENGTH: usize = 128;

/// Trims a raw scan. Empty or oversized input resolves to nothing.
///
/// ## Example
/// ```rust
/// use pickwave_core::validation::normalize_barcode;
///
/// assert_eq!(normalize_barcode("  A-001\n"), Some("A-001"));
/// assert_eq!(normalize_barcode("   "), None);
/// ```
pub fn normalize_barcode(raw: &str) -> Option<&str> {
    let barcode = raw.trim();
    if barcode.is_empty() || barcode.len() > MAX_BARCODE_LENGTH {
        return None;
    }
    Some(barcode)
}

/// Validates a counted quantity against what the task requests.
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed the requested quantity
pub fn check_count(count: i64, requested: i64) -> Result<(), ErrorKind> {
    if count < 0 {
        return Err(ErrorKind::InvalidQuantity { quantity: count });
    }
    if count > requested {
        return Err(ErrorKind::QuantityExceeded { requested });
    }
    Ok(())
}

/// Validates the quantity being placed at a destination.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed the requested quantity; the error carries the
///   quantity still open on the task
pub fn check_placement(quantity: i64, requested: i64) -> Result<(), ErrorKind> {
    if quantity <= 0 {
        return Err(ErrorKind::InvalidQuantity { quantity });
    }
    if quantity > requested {
        return Err(ErrorKind::UnableToPickMore { requested });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_barcode() {
        assert_eq!(normalize_barcode("A-001"), Some("A-001"));
        assert_eq!(normalize_barcode("\tA-001 "), Some("A-001"));
        assert_eq!(normalize_barcode(""), None);
        assert_eq!(normalize_barcode(&"9".repeat(MAX_BARCODE_LENGTH + 1)), None);
    }

    #[test]
    fn test_check_count() {
        assert!(check_count(0, 10).is_ok());
        assert!(check_count(10, 10).is_ok());
        assert_eq!(
            check_count(11, 10),
            Err(ErrorKind::QuantityExceeded { requested: 10 })
        );
        assert_eq!(
            check_count(-1, 10),
            Err(ErrorKind::InvalidQuantity { quantity: -1 })
        );
    }

    #[test]
    fn test_check_placement() {
        assert!(check_placement(1, 10).is_ok());
        assert!(check_placement(10, 10).is_ok());
        assert_eq!(
            check_placement(0, 10),
            Err(ErrorKind::InvalidQuantity { quantity: 0 })
        );
        assert_eq!(
            check_placement(12, 10),
            Err(ErrorKind::UnableToPickMore { requested: 10 })
        );
    }
}
