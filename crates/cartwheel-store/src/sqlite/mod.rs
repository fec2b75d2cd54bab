//! # SQLite Backend
//!
//! Relational stores sharing one [`SqlitePool`](sqlx::SqlitePool).
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every mutation is a single conditional statement:                     │
//! │                                                                         │
//! │  add_item  INSERT .. WHERE EXISTS(cart) ON CONFLICT DO UPDATE sum      │
//! │  reserve   UPDATE .. WHERE available_stock >= q                        │
//! │  ship      UPDATE .. WHERE reserved_stock  >= q                        │
//! │                                                                         │
//! │  rows_affected == 0 → a follow-up read picks the precise error.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod payment;
mod product;
mod warehouse;

pub use cart::SqliteCartStore;
pub use payment::SqlitePaymentLedger;
pub use product::SqliteProductStore;
pub use warehouse::SqliteWarehouseLedger;
