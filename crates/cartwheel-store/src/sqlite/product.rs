use async_trait::async_trait;
use cartwheel_core::{Product, ProductId};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::ProductStore;

/// Product catalog backed by the `products` table.
#[derive(Debug, Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteProductStore { pool }
    }

    /// Counts catalog rows.
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    async fn get_by_id(&self, product_id: ProductId) -> StoreResult<Product> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, sku, manufacturer, category_id, weight, some_other_id
            FROM products
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::ProductNotFound(product_id))
    }

    async fn upsert(&self, product: &Product) -> StoreResult<()> {
        debug!(product_id = product.product_id, sku = %product.sku, "Upserting product");

        sqlx::query(
            r#"
            INSERT INTO products (product_id, sku, manufacturer, category_id, weight, some_other_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (product_id) DO UPDATE SET
                sku = excluded.sku,
                manufacturer = excluded.manufacturer,
                category_id = excluded.category_id,
                weight = excluded.weight,
                some_other_id = excluded.some_other_id
            "#,
        )
        .bind(product.product_id)
        .bind(&product.sku)
        .bind(&product.manufacturer)
        .bind(product.category_id)
        .bind(product.weight)
        .bind(product.some_other_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn exists(&self, product_id: ProductId) -> StoreResult<bool> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE product_id = ?1)")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(found)
    }
}
