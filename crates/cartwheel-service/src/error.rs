//! # Service Error Type
//!
//! What callers of the services see when an operation fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Cartwheel                              │
//! │                                                                         │
//! │  ValidationError ──► ServiceError::Invalid*  (per operation family)    │
//! │                                                                         │
//! │  StoreError                                                             │
//! │  ├── CartNotFound / ProductNotFound / ...  ──► same-named variant       │
//! │  └── ConnectionFailed / Redis / ...        ──► ServiceError::Internal   │
//! │                                               (details only in logs)    │
//! │                                                                         │
//! │  ServiceError::kind() ──► ErrorKind ──► status code (transport)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use cartwheel_core::{CartId, ErrorKind, ProductId, ValidationError};
use cartwheel_store::StoreError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

const BACKEND_UNAVAILABLE: &str = "storage backend unavailable";

/// Service operation errors. Each maps to exactly one [`ErrorKind`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Cart or customer identifier out of range.
    #[error("Invalid cart request: {0}")]
    InvalidCart(String),

    #[error("Cart not found: {0}")]
    CartNotFound(CartId),

    /// Checkout on a cart with no lines.
    #[error("Cart {0} is empty")]
    EmptyCart(CartId),

    /// Another checkout of the same cart is running in this process.
    #[error("Checkout already in progress for cart {0}")]
    CheckoutInProgress(CartId),

    /// Product record fails validation, or path and body ids disagree.
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Warehouse product id or quantity out of range.
    #[error("Invalid warehouse request: {0}")]
    InvalidWarehouseData(String),

    #[error("Insufficient inventory for product {product_id}: available {available}, requested {requested}")]
    InsufficientInventory {
        product_id: ProductId,
        available: i64,
        requested: i64,
    },

    #[error("Insufficient reserved inventory for product {product_id}: reserved {reserved}, requested {requested}")]
    InsufficientReserved {
        product_id: ProductId,
        reserved: i64,
        requested: i64,
    },

    /// Card number shape or cart id invalid.
    #[error("Invalid payment data: {0}")]
    InvalidPaymentData(String),

    /// The gateway declined. The attempt is recorded under `transaction_id`.
    #[error("Payment declined (transaction {transaction_id})")]
    PaymentDeclined { transaction_id: String },

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Storage fault. The message never carries backend details.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::InvalidCart(_)
            | ServiceError::InvalidProduct(_)
            | ServiceError::InvalidWarehouseData(_)
            | ServiceError::InvalidPaymentData(_) => ErrorKind::InvalidInput,

            ServiceError::CartNotFound(_)
            | ServiceError::ProductNotFound(_)
            | ServiceError::TransactionNotFound(_) => ErrorKind::NotFound,

            ServiceError::EmptyCart(_) | ServiceError::CheckoutInProgress(_) => {
                ErrorKind::InvalidState
            }

            ServiceError::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
            ServiceError::InsufficientReserved { .. } => ErrorKind::InsufficientReserved,
            ServiceError::PaymentDeclined { .. } => ErrorKind::PaymentDeclined,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid_cart(err: ValidationError) -> Self {
        ServiceError::InvalidCart(err.to_string())
    }

    pub(crate) fn invalid_product(err: ValidationError) -> Self {
        ServiceError::InvalidProduct(err.to_string())
    }

    pub(crate) fn invalid_warehouse(err: ValidationError) -> Self {
        ServiceError::InvalidWarehouseData(err.to_string())
    }

    pub(crate) fn invalid_payment(err: ValidationError) -> Self {
        ServiceError::InvalidPaymentData(err.to_string())
    }

    /// Serializable form for the transport layer.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        if err.is_backend_fault() {
            error!(error = %err, "Storage backend fault");
            return ServiceError::Internal(BACKEND_UNAVAILABLE.to_string());
        }

        match err {
            StoreError::CartNotFound(id) => ServiceError::CartNotFound(id),
            StoreError::ProductNotFound(id) => ServiceError::ProductNotFound(id),
            StoreError::TransactionNotFound(id) => ServiceError::TransactionNotFound(id),
            StoreError::InsufficientInventory {
                product_id,
                available,
                requested,
            } => ServiceError::InsufficientInventory {
                product_id,
                available,
                requested,
            },
            StoreError::InsufficientReserved {
                product_id,
                reserved,
                requested,
            } => ServiceError::InsufficientReserved {
                product_id,
                reserved,
                requested,
            },
            StoreError::QuantityOverflow(product_id) => ServiceError::InvalidCart(format!(
                "quantity for product {product_id} would overflow"
            )),
            // Backend faults returned above.
            StoreError::ConnectionFailed(_)
            | StoreError::MigrationFailed(_)
            | StoreError::QueryFailed(_)
            | StoreError::PoolExhausted
            | StoreError::Redis(_)
            | StoreError::Serialization(_)
            | StoreError::Internal(_) => ServiceError::Internal(BACKEND_UNAVAILABLE.to_string()),
        }
    }
}

/// Error as handed to the transport layer.
///
/// ```json
/// { "kind": "not_found", "message": "Cart not found: 42" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_keep_their_kind() {
        let err: ServiceError = StoreError::CartNotFound(4).into();
        assert_eq!(err, ServiceError::CartNotFound(4));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err: ServiceError = StoreError::InsufficientReserved {
            product_id: 5,
            reserved: 100,
            requested: 101,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InsufficientReserved);
    }

    #[test]
    fn test_backend_faults_are_opaque() {
        let err: ServiceError = StoreError::Redis("READONLY You can't write".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.to_string().contains("READONLY"));

        let faults = [
            StoreError::ConnectionFailed("refused".into()),
            StoreError::MigrationFailed("checksum".into()),
            StoreError::QueryFailed("no such table: carts".into()),
            StoreError::PoolExhausted,
            StoreError::Serialization("eof".into()),
            StoreError::Internal("row vanished".into()),
        ];
        for fault in faults {
            assert!(fault.is_backend_fault());
            let err: ServiceError = fault.into();
            assert_eq!(err, ServiceError::Internal(BACKEND_UNAVAILABLE.to_string()));
        }

        let err: ServiceError = StoreError::QuantityOverflow(3).into();
        assert!(matches!(err, ServiceError::InvalidCart(_)));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ServiceError::EmptyCart(1).kind(), ErrorKind::InvalidState);
        assert_eq!(
            ServiceError::CheckoutInProgress(1).kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            ServiceError::PaymentDeclined {
                transaction_id: "txn_1_1".into()
            }
            .kind(),
            ErrorKind::PaymentDeclined
        );
        assert_eq!(
            ServiceError::InvalidWarehouseData("x".into()).kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_body_serialization() {
        let body = ServiceError::CartNotFound(42).body();
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"kind":"not_found","message":"Cart not found: 42"}"#);
    }
}
