//! # In-Memory Backend
//!
//! Process-local stores backed by `HashMap`s behind a `tokio::sync::RwLock`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  RwLock<HashMap<Id, Entity>>                                            │
//! │                                                                         │
//! │  get_*      → read lock, clone out      (readers run concurrently)     │
//! │  mutations  → write lock, whole map     (one writer at a time)         │
//! │                                                                         │
//! │  Nothing survives a restart. Used by tests and DB_TYPE=memory.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod payment;
mod product;
mod warehouse;

pub use cart::MemoryCartStore;
pub use payment::MemoryPaymentLedger;
pub use product::MemoryProductStore;
pub use warehouse::MemoryWarehouseLedger;
