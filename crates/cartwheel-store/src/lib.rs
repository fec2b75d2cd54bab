//! # cartwheel-store: Storage Layer for Cartwheel
//!
//! Product catalog, cart store, warehouse ledger and payment ledger, each
//! behind an async trait with three interchangeable backends.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cartwheel Data Flow                              │
//! │                                                                         │
//! │  cartwheel-service (CheckoutService::checkout)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  cartwheel-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌───────────────┐    │   │
//! │  │   │  repository   │   │    backend    │   │     error     │    │   │
//! │  │   │  (traits)     │◄──│  StoreConfig  │   │  StoreError   │    │   │
//! │  │   │               │   │  Stores       │   │               │    │   │
//! │  │   └───────┬───────┘   └───────────────┘   └───────────────┘    │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────┴────────┬──────────────────┬──────────────────┐     │   │
//! │  │   │ memory         │ sqlite + pool    │ document         │     │   │
//! │  │   │ RwLock<HashMap>│ SqlitePool, WAL  │ Redis + Lua      │     │   │
//! │  │   └────────────────┴──────────────────┴──────────────────┘     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`repository`] - Store traits
//! - [`memory`] - In-memory backend
//! - [`sqlite`], [`pool`], [`migrations`] - SQLite backend
//! - [`document`] - Redis backend
//! - [`backend`] - Configuration and the [`Stores`] bundle
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cartwheel_store::{StoreConfig, Stores};
//!
//! let config = StoreConfig::from_env()?;
//! let stores = Stores::connect(&config).await?;
//!
//! let cart = stores.carts.create(7).await?;
//! stores.warehouse.reserve(5, 2).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod document;
pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod sqlite;

#[cfg(test)]
mod conformance;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{Backend, ConfigError, StoreConfig, Stores};
pub use document::DocumentStore;
pub use error::{StoreError, StoreResult};
pub use pool::{Database, DbConfig};
pub use repository::{CartStore, PaymentLedger, ProductStore, WarehouseLedger};
