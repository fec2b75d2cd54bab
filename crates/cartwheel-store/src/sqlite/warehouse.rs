use async_trait::async_trait;
use cartwheel_core::{InventoryRecord, ProductId};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::WarehouseLedger;

/// Warehouse ledger backed by the `inventory` table.
#[derive(Debug, Clone)]
pub struct SqliteWarehouseLedger {
    pool: SqlitePool,
    initial_stock: i64,
}

impl SqliteWarehouseLedger {
    pub fn new(pool: SqlitePool, initial_stock: i64) -> Self {
        SqliteWarehouseLedger {
            pool,
            initial_stock,
        }
    }

    async fn find(&self, product_id: ProductId) -> StoreResult<Option<InventoryRecord>> {
        let record = sqlx::query_as::<_, InventoryRecord>(
            r#"
            SELECT product_id, available_stock, reserved_stock
            FROM inventory
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Creates the default row if the product has none. No-op otherwise.
    async fn materialize(&self, product_id: ProductId) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory (product_id, available_stock, reserved_stock)
            VALUES (?1, ?2, 0)
            ON CONFLICT (product_id) DO NOTHING
            "#,
        )
        .bind(product_id)
        .bind(self.initial_stock)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Moves `quantity` out of reserved, optionally back into available.
    async fn draw_reserved(
        &self,
        product_id: ProductId,
        quantity: i64,
        restock: bool,
    ) -> StoreResult<()> {
        let returned = if restock { quantity } else { 0 };

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET reserved_stock = reserved_stock - ?2,
                available_stock = available_stock + ?3
            WHERE product_id = ?1 AND reserved_stock >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(returned)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let record = self
                .find(product_id)
                .await?
                .ok_or(StoreError::ProductNotFound(product_id))?;
            return Err(StoreError::InsufficientReserved {
                product_id,
                reserved: record.reserved_stock,
                requested: quantity,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl WarehouseLedger for SqliteWarehouseLedger {
    async fn get_inventory(&self, product_id: ProductId) -> StoreResult<InventoryRecord> {
        if let Some(record) = self.find(product_id).await? {
            return Ok(record);
        }

        self.materialize(product_id).await?;
        self.find(product_id)
            .await?
            .ok_or_else(|| StoreError::Internal(format!("inventory row {product_id} vanished")))
    }

    async fn reserve(&self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        self.materialize(product_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET available_stock = available_stock - ?2,
                reserved_stock = reserved_stock + ?2
            WHERE product_id = ?1 AND available_stock >= ?2
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let available = self
                .find(product_id)
                .await?
                .map(|r| r.available_stock)
                .unwrap_or(0);
            return Err(StoreError::InsufficientInventory {
                product_id,
                available,
                requested: quantity,
            });
        }

        debug!(product_id, quantity, "Reserved stock");
        Ok(())
    }

    async fn ship(&self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        self.draw_reserved(product_id, quantity, false).await?;
        debug!(product_id, quantity, "Shipped stock");
        Ok(())
    }

    async fn release(&self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        self.draw_reserved(product_id, quantity, true).await?;
        debug!(product_id, quantity, "Released stock");
        Ok(())
    }
}
