//! # Store Error Types
//!
//! Error types shared by every storage backend.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  sqlx::Error / RedisError / serde_json::Error / StockError             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Entity-level kinds + backend faults        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceError (cartwheel-service) ← backend faults become Internal     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ErrorKind → status code (transport, external)                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use cartwheel_core::{CartId, CoreError, ProductId, StockError};
use thiserror::Error;

/// Storage operation errors.
///
/// The first group is backend-independent and carries the most specific
/// kind a store can determine. The second group wraps backend faults.
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // Entity-level
    // -------------------------------------------------------------------------
    /// No cart with this id.
    ///
    /// ## When This Occurs
    /// - Cart never created
    /// - Cart already consumed by a successful checkout
    #[error("Cart not found: {0}")]
    CartNotFound(CartId),

    /// No product (or, for ship/release, no ledger entry) with this id.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// No payment transaction with this id.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Reserve asked for more than is available.
    #[error("Insufficient inventory for product {product_id}: available {available}, requested {requested}")]
    InsufficientInventory {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    /// Ship or release asked for more than is reserved.
    #[error("Insufficient reserved inventory for product {product_id}: reserved {reserved}, requested {requested}")]
    InsufficientReserved {
        product_id: ProductId,
        reserved: i64,
        requested: i64,
    },

    /// Merging a cart line would overflow its quantity.
    #[error("Quantity overflow for product {0}")]
    QuantityOverflow(ProductId),

    // -------------------------------------------------------------------------
    // Backend faults
    // -------------------------------------------------------------------------
    /// Could not open the backend.
    ///
    /// ## When This Occurs
    /// - SQLite file can't be created (permissions, disk full)
    /// - Redis URL malformed or server unreachable at startup
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Schema bootstrap failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Redis command or script failed.
    #[error("Redis error: {0}")]
    Redis(String),

    /// A stored document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal storage error.
    #[error("Internal storage error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Attaches the product id to a state machine conflict.
    pub fn stock(product_id: ProductId, err: StockError) -> Self {
        match err {
            StockError::InsufficientInventory {
                available,
                requested,
            } => StoreError::InsufficientInventory {
                product_id,
                available,
                requested,
            },
            StockError::InsufficientReserved {
                reserved,
                requested,
            } => StoreError::InsufficientReserved {
                product_id,
                reserved,
                requested,
            },
        }
    }

    /// True for faults of the backend itself rather than of the request.
    pub fn is_backend_fault(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectionFailed(_)
                | StoreError::MigrationFailed(_)
                | StoreError::QueryFailed(_)
                | StoreError::PoolExhausted
                | StoreError::Redis(_)
                | StoreError::Serialization(_)
                | StoreError::Internal(_)
        )
    }
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::QuantityOverflow { product_id } => StoreError::QuantityOverflow(product_id),
            CoreError::Validation(e) => StoreError::Internal(e.to_string()),
        }
    }
}

/// Convert sqlx errors to StoreError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → QueryFailed
/// sqlx::Error::PoolTimedOut   → PoolExhausted
/// sqlx::Error::PoolClosed     → ConnectionFailed
/// Other                       → Internal
/// ```
///
/// `RowNotFound` is never relied on: stores use `fetch_optional` and report
/// the entity-specific variant themselves.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => StoreError::QueryFailed(db_err.message().to_string()),

            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,

            sqlx::Error::PoolClosed => StoreError::ConnectionFailed("Pool is closed".to_string()),

            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::MigrationFailed(err.to_string())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() {
            StoreError::ConnectionFailed(err.to_string())
        } else {
            StoreError::Redis(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_error_carries_product() {
        let err = StoreError::stock(
            5,
            StockError::InsufficientInventory {
                available: 0,
                requested: 1,
            },
        );
        assert!(matches!(
            err,
            StoreError::InsufficientInventory {
                product_id: 5,
                available: 0,
                requested: 1
            }
        ));
        assert!(!err.is_backend_fault());
    }

    #[test]
    fn test_backend_faults() {
        assert!(StoreError::PoolExhausted.is_backend_fault());
        assert!(StoreError::Redis("boom".into()).is_backend_fault());
        assert!(!StoreError::CartNotFound(1).is_backend_fault());
    }

    #[test]
    fn test_overflow_from_core() {
        let err: StoreError = CoreError::QuantityOverflow { product_id: 3 }.into();
        assert!(matches!(err, StoreError::QuantityOverflow(3)));
    }
}
