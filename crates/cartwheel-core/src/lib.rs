//! # cartwheel-core: Pure Domain Logic for Cartwheel
//!
//! The inventory-and-cart consistency core, without any I/O. Every storage
//! backend and the checkout orchestrator build on the types and rules here.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartwheel Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Transport (HTTP, out of this workspace)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 cartwheel-service (orchestration)               │   │
//! │  │   ProductService  CartService  WarehouseService  Checkout       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cartwheel-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ ErrorKind │  │   rules   │  │   │
//! │  │   │ Cart/Item │  │           │  │ CoreError │  │   checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           cartwheel-store (memory / SQLite / Redis)             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Cart, InventoryRecord, PaymentTransaction)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Error taxonomy and domain errors
//! - [`validation`] - Field validation shared by every service
//!
//! ## Example Usage
//!
//! ```rust
//! use cartwheel_core::{Cart, CartItem, InventoryRecord};
//!
//! let mut cart = Cart::new(1, 7);
//! cart.merge_item(CartItem::new(1, 2)).unwrap();
//! cart.merge_item(CartItem::new(1, 3)).unwrap();
//! assert_eq!(cart.items, vec![CartItem::new(1, 5)]);
//!
//! let mut stock = InventoryRecord::with_initial_stock(5, 100);
//! stock.reserve(100).unwrap();
//! assert!(stock.reserve(1).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, StockError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Available stock a product starts with the first time the ledger sees it.
pub const DEFAULT_INITIAL_STOCK: i64 = 100;

/// Flat charge per cart line used to compute the amount sent for
/// authorization. Pricing is not modelled, so every line costs the same.
pub const FLAT_LINE_CHARGE_CENTS: i64 = 1000;

/// Order identifiers are derived from the cart id by this factor.
pub const ORDER_ID_MULTIPLIER: i64 = 1000;

/// Card references must have at least this many digits.
pub const CARD_NUMBER_MIN_DIGITS: usize = 13;

/// Card references must have at most this many digits.
pub const CARD_NUMBER_MAX_DIGITS: usize = 19;

/// Maximum SKU length in characters.
pub const MAX_SKU_LEN: usize = 100;

/// Maximum manufacturer length in characters.
pub const MAX_MANUFACTURER_LEN: usize = 200;
