use async_trait::async_trait;
use cartwheel_core::{Cart, CartId, CartItem, CustomerId};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::CartStore;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    cart_id: CartId,
    customer_id: CustomerId,
    created_at: DateTime<Utc>,
}

/// Cart store backed by `carts` and `cart_items`.
#[derive(Debug, Clone)]
pub struct SqliteCartStore {
    pool: SqlitePool,
}

impl SqliteCartStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteCartStore { pool }
    }

    async fn cart_exists(&self, cart_id: CartId) -> StoreResult<bool> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM carts WHERE cart_id = ?1)")
                .bind(cart_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(found)
    }
}

#[async_trait]
impl CartStore for SqliteCartStore {
    async fn create(&self, customer_id: CustomerId) -> StoreResult<Cart> {
        let created_at = Utc::now();

        let result = sqlx::query("INSERT INTO carts (customer_id, created_at) VALUES (?1, ?2)")
            .bind(customer_id)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        let cart = Cart {
            cart_id: result.last_insert_rowid(),
            customer_id,
            items: Vec::new(),
            created_at,
        };

        debug!(cart_id = cart.cart_id, customer_id, "Created cart");
        Ok(cart)
    }

    async fn get_by_id(&self, cart_id: CartId) -> StoreResult<Cart> {
        // Header and lines must come from the same snapshot.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CartRow>(
            "SELECT cart_id, customer_id, created_at FROM carts WHERE cart_id = ?1",
        )
        .bind(cart_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::CartNotFound(cart_id))?;

        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT product_id, quantity
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY line_id
            "#,
        )
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Cart {
            cart_id: row.cart_id,
            customer_id: row.customer_id,
            items,
            created_at: row.created_at,
        })
    }

    async fn add_item(&self, cart_id: CartId, item: CartItem) -> StoreResult<()> {
        // Insert-or-sum in one statement; the guard on the update refuses a
        // sum that would leave the i64 range.
        let result = sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity)
            SELECT ?1, ?2, ?3
            WHERE EXISTS (SELECT 1 FROM carts WHERE cart_id = ?1)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET
                quantity = quantity + excluded.quantity
            WHERE quantity <= 9223372036854775807 - excluded.quantity
            "#,
        )
        .bind(cart_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(if self.cart_exists(cart_id).await? {
                StoreError::QuantityOverflow(item.product_id)
            } else {
                StoreError::CartNotFound(cart_id)
            });
        }

        debug!(
            cart_id,
            product_id = item.product_id,
            quantity = item.quantity,
            "Merged cart item"
        );
        Ok(())
    }

    async fn delete(&self, cart_id: CartId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM carts WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::CartNotFound(cart_id));
        }

        debug!(cart_id, "Deleted cart");
        Ok(())
    }
}
