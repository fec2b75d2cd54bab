//! # Store Traits
//!
//! The four storage capabilities every backend implements.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Contract, Three Backends                         │
//! │                                                                         │
//! │  cartwheel-service                                                     │
//! │       │                                                                 │
//! │       │  stores.carts.add_item(cart_id, item)                          │
//! │       ▼                                                                 │
//! │  Arc<dyn CartStore>                                                    │
//! │       │                                                                 │
//! │       ├──► memory::MemoryCartStore    (RwLock<HashMap>)                │
//! │       ├──► sqlite::SqliteCartStore    (single-statement upserts)       │
//! │       └──► document::RedisCartStore   (Lua script per mutation)        │
//! │                                                                         │
//! │  Every backend returns owned copies and the same StoreError kinds.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Traits
//!
//! - [`ProductStore`] - Catalog lookups and upserts
//! - [`CartStore`] - Cart lifecycle and item merging
//! - [`WarehouseLedger`] - Available/reserved stock state machine
//! - [`PaymentLedger`] - Append-only record of payment attempts

use async_trait::async_trait;
use cartwheel_core::{
    Cart, CartId, CartItem, CustomerId, InventoryRecord, NewPaymentTransaction,
    PaymentTransaction, Product, ProductId,
};

use crate::error::StoreResult;

/// Product catalog storage.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetches a product. `ProductNotFound` if absent.
    async fn get_by_id(&self, product_id: ProductId) -> StoreResult<Product>;

    /// Inserts or replaces the whole record.
    async fn upsert(&self, product: &Product) -> StoreResult<()>;

    /// Cheap existence check used to gate cart and warehouse operations.
    async fn exists(&self, product_id: ProductId) -> StoreResult<bool>;
}

/// Shopping cart storage.
///
/// ## Invariants
/// - Cart ids are unique and increase monotonically per store instance
/// - At most one line per product; `add_item` sums quantities
/// - Read-modify-write on one cart is serialized
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Creates an empty cart with a freshly allocated id.
    async fn create(&self, customer_id: CustomerId) -> StoreResult<Cart>;

    /// Fetches a snapshot. `CartNotFound` if absent.
    async fn get_by_id(&self, cart_id: CartId) -> StoreResult<Cart>;

    /// Merges the item into the cart (sum on same product, else append).
    async fn add_item(&self, cart_id: CartId, item: CartItem) -> StoreResult<()>;

    /// Removes the cart permanently. `CartNotFound` if absent.
    async fn delete(&self, cart_id: CartId) -> StoreResult<()>;
}

/// Warehouse inventory ledger.
///
/// ## State Machine
/// ```text
/// reserve(q):  available -= q, reserved += q   (fails if available < q)
/// ship(q):     reserved -= q                   (fails if reserved < q)
/// release(q):  reserved -= q, available += q   (fails if reserved < q)
/// ```
///
/// Records are materialized lazily with the ledger's initial stock the
/// first time `get_inventory` or `reserve` touches a product. `ship` and
/// `release` on a product with no record fail `ProductNotFound`.
#[async_trait]
pub trait WarehouseLedger: Send + Sync {
    /// Returns the record, or the default record if none exists yet.
    async fn get_inventory(&self, product_id: ProductId) -> StoreResult<InventoryRecord>;

    async fn reserve(&self, product_id: ProductId, quantity: i64) -> StoreResult<()>;

    async fn ship(&self, product_id: ProductId, quantity: i64) -> StoreResult<()>;

    /// Compensating action for a reservation that will not ship.
    async fn release(&self, product_id: ProductId, quantity: i64) -> StoreResult<()>;
}

/// Append-only record of payment attempts.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Assigns a transaction id and stores the attempt.
    async fn record(&self, draft: NewPaymentTransaction) -> StoreResult<PaymentTransaction>;

    /// Fetches a recorded attempt. `TransactionNotFound` if absent.
    async fn get(&self, transaction_id: &str) -> StoreResult<PaymentTransaction>;
}
