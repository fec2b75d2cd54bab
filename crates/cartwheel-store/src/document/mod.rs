//! # Redis Document Backend
//!
//! Key-value stores on a shared Redis [`ConnectionManager`].
//!
//! ## Key Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Products:<id>          STRING  JSON Product                            │
//! │  Carts:next_id          STRING  INCR counter                            │
//! │  Carts:<id>             STRING  JSON header (id, customer, created_at)  │
//! │  Carts:<id>:items       HASH    product_id → quantity                   │
//! │  Carts:<id>:lines       LIST    product ids in insertion order          │
//! │  Inventory:<id>         HASH    available, reserved                     │
//! │  Payments:next_seq      STRING  INCR counter                            │
//! │  Payments:<txn>         STRING  JSON PaymentTransaction                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multi-key mutations run as Lua scripts, which Redis executes atomically.
//! All keys can carry a namespace prefix so several instances (or test runs)
//! share one server.

use redis::aio::ConnectionManager;
use tracing::info;

use crate::error::{StoreError, StoreResult};

mod cart;
mod payment;
mod product;
mod warehouse;

pub use cart::RedisCartStore;
pub use payment::RedisPaymentLedger;
pub use product::RedisProductStore;
pub use warehouse::RedisWarehouseLedger;

// =============================================================================
// Keys
// =============================================================================

/// Builds namespaced keys.
#[derive(Debug, Clone, Default)]
pub(crate) struct Keys {
    namespace: String,
}

impl Keys {
    fn key(&self, suffix: std::fmt::Arguments<'_>) -> String {
        format!("{}{}", self.namespace, suffix)
    }

    pub(crate) fn product(&self, id: i64) -> String {
        self.key(format_args!("Products:{id}"))
    }

    pub(crate) fn cart_counter(&self) -> String {
        self.key(format_args!("Carts:next_id"))
    }

    pub(crate) fn cart(&self, id: i64) -> String {
        self.key(format_args!("Carts:{id}"))
    }

    pub(crate) fn cart_items(&self, id: i64) -> String {
        self.key(format_args!("Carts:{id}:items"))
    }

    pub(crate) fn cart_lines(&self, id: i64) -> String {
        self.key(format_args!("Carts:{id}:lines"))
    }

    pub(crate) fn inventory(&self, id: i64) -> String {
        self.key(format_args!("Inventory:{id}"))
    }

    pub(crate) fn payment_counter(&self) -> String {
        self.key(format_args!("Payments:next_seq"))
    }

    pub(crate) fn payment(&self, transaction_id: &str) -> String {
        self.key(format_args!("Payments:{transaction_id}"))
    }
}

// =============================================================================
// Document Store
// =============================================================================

/// Redis handle providing store access, the counterpart of
/// [`Database`](crate::Database) for the document backend.
#[derive(Clone)]
pub struct DocumentStore {
    conn: ConnectionManager,
    keys: Keys,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("namespace", &self.keys.namespace)
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Opens a managed connection to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> StoreResult<Self> {
        Self::connect_with_namespace(url, "").await
    }

    /// Like [`connect`](Self::connect), prefixing every key with `namespace`.
    pub async fn connect_with_namespace(url: &str, namespace: &str) -> StoreResult<Self> {
        info!(url = %url, namespace = %namespace, "Connecting to Redis");

        let client =
            redis::Client::open(url).map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        info!("Redis connection established");

        Ok(DocumentStore {
            conn,
            keys: Keys {
                namespace: namespace.to_string(),
            },
        })
    }

    pub fn products(&self) -> RedisProductStore {
        RedisProductStore::new(self.conn.clone(), self.keys.clone())
    }

    pub fn carts(&self) -> RedisCartStore {
        RedisCartStore::new(self.conn.clone(), self.keys.clone())
    }

    /// Returns the warehouse ledger; unseen products start at `initial_stock`.
    pub fn warehouse(&self, initial_stock: i64) -> RedisWarehouseLedger {
        RedisWarehouseLedger::new(self.conn.clone(), self.keys.clone(), initial_stock)
    }

    pub fn payments(&self) -> RedisPaymentLedger {
        RedisPaymentLedger::new(self.conn.clone(), self.keys.clone())
    }

    /// Checks if the server answers PING.
    pub async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }
}
