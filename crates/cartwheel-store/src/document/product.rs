use async_trait::async_trait;
use cartwheel_core::{Product, ProductId};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use super::Keys;
use crate::error::{StoreError, StoreResult};
use crate::repository::ProductStore;

/// Product catalog stored as JSON documents.
#[derive(Clone)]
pub struct RedisProductStore {
    conn: ConnectionManager,
    keys: Keys,
}

impl RedisProductStore {
    pub(crate) fn new(conn: ConnectionManager, keys: Keys) -> Self {
        RedisProductStore { conn, keys }
    }
}

#[async_trait]
impl ProductStore for RedisProductStore {
    async fn get_by_id(&self, product_id: ProductId) -> StoreResult<Product> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.keys.product(product_id)).await?;
        let raw = raw.ok_or(StoreError::ProductNotFound(product_id))?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn upsert(&self, product: &Product) -> StoreResult<()> {
        debug!(product_id = product.product_id, sku = %product.sku, "Upserting product");

        let doc = serde_json::to_string(product)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set(self.keys.product(product.product_id), doc).await?;
        Ok(())
    }

    async fn exists(&self, product_id: ProductId) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let found: bool = conn.exists(self.keys.product(product_id)).await?;
        Ok(found)
    }
}
