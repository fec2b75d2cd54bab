use std::collections::HashMap;

use async_trait::async_trait;
use cartwheel_core::{Cart, CartId, CartItem, CustomerId};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::repository::CartStore;

#[derive(Debug, Default)]
struct CartMap {
    /// Last id handed out; ids start at 1.
    last_id: CartId,
    carts: HashMap<CartId, Cart>,
}

/// In-memory cart store.
///
/// The id counter lives under the same lock as the map, so allocation and
/// insertion are one step.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    inner: RwLock<CartMap>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn create(&self, customer_id: CustomerId) -> StoreResult<Cart> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;

        let cart = Cart::new(inner.last_id, customer_id);
        inner.carts.insert(cart.cart_id, cart.clone());

        debug!(cart_id = cart.cart_id, customer_id, "Created cart");
        Ok(cart)
    }

    async fn get_by_id(&self, cart_id: CartId) -> StoreResult<Cart> {
        let inner = self.inner.read().await;
        inner
            .carts
            .get(&cart_id)
            .cloned()
            .ok_or(StoreError::CartNotFound(cart_id))
    }

    async fn add_item(&self, cart_id: CartId, item: CartItem) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let cart = inner
            .carts
            .get_mut(&cart_id)
            .ok_or(StoreError::CartNotFound(cart_id))?;

        cart.merge_item(item)?;

        debug!(
            cart_id,
            product_id = item.product_id,
            quantity = item.quantity,
            "Merged cart item"
        );
        Ok(())
    }

    async fn delete(&self, cart_id: CartId) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .carts
            .remove(&cart_id)
            .map(|_| ())
            .ok_or(StoreError::CartNotFound(cart_id))
    }
}
