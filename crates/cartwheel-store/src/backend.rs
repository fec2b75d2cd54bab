//! # Backend Selection
//!
//! Chooses the storage technology once, at startup, and hands the rest of
//! the system a [`Stores`] bundle of trait objects.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  env ──► StoreConfig::from_env() ──► Stores::connect(&config)          │
//! │                                            │                            │
//! │           DB_TYPE=memory  ─────────────────┼──► Memory*                 │
//! │           DB_TYPE=sqlite  ── Database ─────┼──► Sqlite*                 │
//! │           DB_TYPE=redis   ── DocumentStore ┴──► Redis*                  │
//! │                                                                         │
//! │  Stores { products, carts, warehouse, payments }: Arc<dyn ..>          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use cartwheel_core::DEFAULT_INITIAL_STOCK;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::DocumentStore;
use crate::error::StoreResult;
use crate::memory::{MemoryCartStore, MemoryPaymentLedger, MemoryProductStore, MemoryWarehouseLedger};
use crate::pool::{Database, DbConfig};
use crate::repository::{CartStore, PaymentLedger, ProductStore, WarehouseLedger};

// =============================================================================
// Configuration
// =============================================================================

/// Storage technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Memory,
    Sqlite,
    Redis,
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "sqlite" => Ok(Backend::Sqlite),
            "redis" => Ok(Backend::Redis),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Memory => "memory",
            Backend::Sqlite => "sqlite",
            Backend::Redis => "redis",
        };
        f.write_str(name)
    }
}

/// Storage configuration.
///
/// Loaded from environment variables with fallback to defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// `DB_TYPE`: memory (default), sqlite or redis
    pub backend: Backend,

    /// `SQLITE_PATH` (default: ./cartwheel.db)
    pub sqlite_path: PathBuf,

    /// `SQLITE_MAX_CONNECTIONS` (default: 5)
    pub sqlite_max_connections: u32,

    /// `REDIS_URL` (default: redis://127.0.0.1:6379)
    pub redis_url: String,

    /// `INITIAL_STOCK`: available stock of a product the ledger has never
    /// seen (default: 100)
    pub initial_stock: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: Backend::Memory,
            sqlite_path: PathBuf::from("./cartwheel.db"),
            sqlite_max_connections: 5,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            initial_stock: DEFAULT_INITIAL_STOCK,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = StoreConfig::default();

        let backend = match lookup("DB_TYPE") {
            Some(raw) => raw.parse()?,
            None => defaults.backend,
        };

        let sqlite_max_connections = match lookup("SQLITE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse()
                .ok()
                .filter(|n: &u32| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue("SQLITE_MAX_CONNECTIONS".to_string()))?,
            None => defaults.sqlite_max_connections,
        };

        let initial_stock = match lookup("INITIAL_STOCK") {
            Some(raw) => raw
                .trim()
                .parse()
                .ok()
                .filter(|n: &i64| *n >= 0)
                .ok_or_else(|| ConfigError::InvalidValue("INITIAL_STOCK".to_string()))?,
            None => defaults.initial_stock,
        };

        Ok(StoreConfig {
            backend,
            sqlite_path: lookup("SQLITE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.sqlite_path),
            sqlite_max_connections,
            redis_url: lookup("REDIS_URL").unwrap_or(defaults.redis_url),
            initial_stock,
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Unknown DB_TYPE '{0}' (expected memory, sqlite or redis)")]
    UnknownBackend(String),
}

// =============================================================================
// Store Bundle
// =============================================================================

/// The four stores, behind trait objects.
#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn ProductStore>,
    pub carts: Arc<dyn CartStore>,
    pub warehouse: Arc<dyn WarehouseLedger>,
    pub payments: Arc<dyn PaymentLedger>,
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

impl Stores {
    /// Fresh in-memory stores with the default initial stock.
    pub fn in_memory() -> Self {
        Self::in_memory_with_stock(DEFAULT_INITIAL_STOCK)
    }

    /// Fresh in-memory stores whose unseen products start at `initial_stock`.
    pub fn in_memory_with_stock(initial_stock: i64) -> Self {
        Stores {
            products: Arc::new(MemoryProductStore::new()),
            carts: Arc::new(MemoryCartStore::new()),
            warehouse: Arc::new(MemoryWarehouseLedger::new(initial_stock)),
            payments: Arc::new(MemoryPaymentLedger::new()),
        }
    }

    /// Stores sharing one SQLite pool.
    pub fn sqlite(db: &Database, initial_stock: i64) -> Self {
        Stores {
            products: Arc::new(db.products()),
            carts: Arc::new(db.carts()),
            warehouse: Arc::new(db.warehouse(initial_stock)),
            payments: Arc::new(db.payments()),
        }
    }

    /// Stores sharing one Redis connection.
    pub fn documents(docs: &DocumentStore, initial_stock: i64) -> Self {
        Stores {
            products: Arc::new(docs.products()),
            carts: Arc::new(docs.carts()),
            warehouse: Arc::new(docs.warehouse(initial_stock)),
            payments: Arc::new(docs.payments()),
        }
    }

    /// Opens the configured backend.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        info!(backend = %config.backend, initial_stock = config.initial_stock, "Opening stores");

        match config.backend {
            Backend::Memory => Ok(Self::in_memory_with_stock(config.initial_stock)),
            Backend::Sqlite => {
                let db_config = DbConfig::new(config.sqlite_path.clone())
                    .max_connections(config.sqlite_max_connections);
                let db = Database::new(db_config).await?;
                Ok(Self::sqlite(&db, config.initial_stock))
            }
            Backend::Redis => {
                let docs = DocumentStore::connect(&config.redis_url).await?;
                Ok(Self::documents(&docs, config.initial_stock))
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
