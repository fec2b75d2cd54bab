use std::collections::HashMap;

use async_trait::async_trait;
use cartwheel_core::{Product, ProductId};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::ProductStore;

/// In-memory product catalog.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn get_by_id(&self, product_id: ProductId) -> StoreResult<Product> {
        let products = self.products.read().await;
        products
            .get(&product_id)
            .cloned()
            .ok_or(StoreError::ProductNotFound(product_id))
    }

    async fn upsert(&self, product: &Product) -> StoreResult<()> {
        debug!(product_id = product.product_id, sku = %product.sku, "Upserting product");
        let mut products = self.products.write().await;
        products.insert(product.product_id, product.clone());
        Ok(())
    }

    async fn exists(&self, product_id: ProductId) -> StoreResult<bool> {
        Ok(self.products.read().await.contains_key(&product_id))
    }
}
