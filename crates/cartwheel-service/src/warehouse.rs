//! # Warehouse Service
//!
//! Validated access to the warehouse ledger.
//!
//! ## Reservation State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   available ──reserve──► reserved ──ship──► shipped (leaves ledger)    │
//! │       ▲                     │                                           │
//! │       └──────release────────┘                                           │
//! │                                                                         │
//! │   reserve / ship / release require the product in the catalog          │
//! │   get_inventory does not (it only materializes the default record)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use cartwheel_core::validation::{validate_positive_id, validate_quantity};
use cartwheel_core::{InventoryRecord, ProductId};
use cartwheel_store::{ProductStore, WarehouseLedger};

use crate::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct WarehouseService {
    ledger: Arc<dyn WarehouseLedger>,
    products: Arc<dyn ProductStore>,
}

impl WarehouseService {
    pub fn new(ledger: Arc<dyn WarehouseLedger>, products: Arc<dyn ProductStore>) -> Self {
        WarehouseService { ledger, products }
    }

    pub async fn get_inventory(&self, product_id: ProductId) -> ServiceResult<InventoryRecord> {
        validate_positive_id("product_id", product_id).map_err(ServiceError::invalid_warehouse)?;
        Ok(self.ledger.get_inventory(product_id).await?)
    }

    pub async fn reserve(&self, product_id: ProductId, quantity: i64) -> ServiceResult<()> {
        self.check(product_id, quantity).await?;
        Ok(self.ledger.reserve(product_id, quantity).await?)
    }

    pub async fn ship(&self, product_id: ProductId, quantity: i64) -> ServiceResult<()> {
        self.check(product_id, quantity).await?;
        Ok(self.ledger.ship(product_id, quantity).await?)
    }

    pub async fn release(&self, product_id: ProductId, quantity: i64) -> ServiceResult<()> {
        self.check(product_id, quantity).await?;
        Ok(self.ledger.release(product_id, quantity).await?)
    }

    async fn check(&self, product_id: ProductId, quantity: i64) -> ServiceResult<()> {
        validate_positive_id("product_id", product_id).map_err(ServiceError::invalid_warehouse)?;
        validate_quantity(quantity).map_err(ServiceError::invalid_warehouse)?;

        if !self.products.exists(product_id).await? {
            return Err(ServiceError::ProductNotFound(product_id));
        }
        Ok(())
    }
}
