use std::collections::HashMap;

use async_trait::async_trait;
use cartwheel_core::{InventoryRecord, ProductId, StockError, DEFAULT_INITIAL_STOCK};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::WarehouseLedger;

/// In-memory warehouse ledger.
#[derive(Debug)]
pub struct MemoryWarehouseLedger {
    initial_stock: i64,
    records: RwLock<HashMap<ProductId, InventoryRecord>>,
}

impl Default for MemoryWarehouseLedger {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_STOCK)
    }
}

impl MemoryWarehouseLedger {
    /// Creates a ledger whose unseen products start with `initial_stock`.
    pub fn new(initial_stock: i64) -> Self {
        MemoryWarehouseLedger {
            initial_stock,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Applies `op` to an existing record under the write lock.
    async fn mutate_existing(
        &self,
        product_id: ProductId,
        op: impl FnOnce(&mut InventoryRecord) -> Result<(), StockError>,
    ) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&product_id)
            .ok_or(StoreError::ProductNotFound(product_id))?;
        op(record).map_err(|e| StoreError::stock(product_id, e))
    }
}

#[async_trait]
impl WarehouseLedger for MemoryWarehouseLedger {
    async fn get_inventory(&self, product_id: ProductId) -> StoreResult<InventoryRecord> {
        if let Some(record) = self.records.read().await.get(&product_id) {
            return Ok(*record);
        }

        let mut records = self.records.write().await;
        let record = records
            .entry(product_id)
            .or_insert_with(|| InventoryRecord::with_initial_stock(product_id, self.initial_stock));
        Ok(*record)
    }

    async fn reserve(&self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .entry(product_id)
            .or_insert_with(|| InventoryRecord::with_initial_stock(product_id, self.initial_stock));

        record
            .reserve(quantity)
            .map_err(|e| StoreError::stock(product_id, e))?;

        debug!(
            product_id,
            quantity,
            available = record.available_stock,
            reserved = record.reserved_stock,
            "Reserved stock"
        );
        Ok(())
    }

    async fn ship(&self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        self.mutate_existing(product_id, |r| r.ship(quantity)).await?;
        debug!(product_id, quantity, "Shipped stock");
        Ok(())
    }

    async fn release(&self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        self.mutate_existing(product_id, |r| r.release(quantity)).await?;
        debug!(product_id, quantity, "Released stock");
        Ok(())
    }
}
