//! # Error Types
//!
//! Domain-specific error types for cartwheel-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cartwheel-core errors (this file)                                     │
//! │  ├── ErrorKind        - Taxonomy every failure maps onto               │
//! │  ├── CoreError        - Cart rule violations                           │
//! │  ├── StockError       - Inventory state machine conflicts              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cartwheel-store errors (separate crate)                               │
//! │  └── StoreError       - Backend and entity-level failures              │
//! │                                                                         │
//! │  cartwheel-service errors (separate crate)                             │
//! │  └── ServiceError     - What the transport layer sees                  │
//! │                                                                         │
//! │  Flow: ValidationError/StockError → StoreError → ServiceError → kind() │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ProductId;

// =============================================================================
// Error Kind
// =============================================================================

/// The closed set of failure categories exposed to callers.
///
/// The transport layer maps each kind to a status code; nothing below it
/// needs to know how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Cart, product or transaction missing.
    NotFound,
    /// Malformed or out-of-range fields, identifier mismatches.
    InvalidInput,
    /// Operation not allowed in the current state (e.g. empty cart).
    InvalidState,
    /// Not enough available stock to reserve.
    InsufficientInventory,
    /// Not enough reserved stock to ship or release.
    InsufficientReserved,
    /// The payment gateway declined. A business outcome, not a fault.
    PaymentDeclined,
    /// Storage backend fault.
    Internal,
}

// =============================================================================
// Core Error
// =============================================================================

/// Cart rule violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Merging quantities would overflow the quantity type.
    #[error("Quantity overflow for product {product_id}")]
    QuantityOverflow { product_id: ProductId },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Stock Error
// =============================================================================

/// Conflicts raised by the available/reserved state machine.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StockError {
    /// Reserve asked for more than is available.
    ///
    /// ## User Workflow
    /// ```text
    /// reserve(product 5, qty 1)
    ///      │
    ///      ▼
    /// available = 0
    ///      │
    ///      ▼
    /// InsufficientInventory { available: 0, requested: 1 }
    /// ```
    #[error("Insufficient inventory: available {available}, requested {requested}")]
    InsufficientInventory { available: i64, requested: i64 },

    /// Ship or release asked for more than is reserved.
    #[error("Insufficient reserved inventory: reserved {reserved}, requested {requested}")]
    InsufficientReserved { reserved: i64, requested: i64 },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements.
/// Used for early validation before any store is touched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., card number with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two values that must agree do not (e.g., path id vs. body id).
    #[error("{field} mismatch: expected {expected}, got {actual}")]
    Mismatch {
        field: String,
        expected: String,
        actual: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
