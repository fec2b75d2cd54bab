//! # Cart Service
//!
//! Cart creation, snapshots and item merging.
//!
//! ```text
//! create(customer) ──► Cart { id, items: [] }
//!        │
//!        ▼
//! add_item(cart, product, qty)   product must exist in the catalog
//!        │                       same product → quantities sum
//!        ▼
//! checkout (see CheckoutService) consumes and deletes the cart
//!                                while it runs, add_item fails CheckoutInProgress
//! ```

use std::sync::Arc;

use cartwheel_core::validation::{validate_positive_id, validate_quantity};
use cartwheel_core::{Cart, CartId, CartItem, CustomerId, ProductId};
use cartwheel_store::{CartStore, ProductStore};
use tracing::debug;

use crate::claims::CartClaims;
use crate::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    products: Arc<dyn ProductStore>,
    claims: CartClaims,
}

impl CartService {
    /// `claims` must be the registry the checkout service uses.
    pub fn new(
        carts: Arc<dyn CartStore>,
        products: Arc<dyn ProductStore>,
        claims: CartClaims,
    ) -> Self {
        CartService {
            carts,
            products,
            claims,
        }
    }

    /// Creates an empty cart and returns its id.
    pub async fn create(&self, customer_id: CustomerId) -> ServiceResult<CartId> {
        validate_positive_id("customer_id", customer_id).map_err(ServiceError::invalid_cart)?;

        let cart = self.carts.create(customer_id).await?;
        Ok(cart.cart_id)
    }

    pub async fn get(&self, cart_id: CartId) -> ServiceResult<Cart> {
        validate_positive_id("cart_id", cart_id).map_err(ServiceError::invalid_cart)?;
        Ok(self.carts.get_by_id(cart_id).await?)
    }

    /// Adds `quantity` of a product, merging with an existing line.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i64,
    ) -> ServiceResult<()> {
        validate_positive_id("cart_id", cart_id).map_err(ServiceError::invalid_cart)?;
        validate_positive_id("product_id", product_id).map_err(ServiceError::invalid_cart)?;
        validate_quantity(quantity).map_err(ServiceError::invalid_cart)?;

        if !self.products.exists(product_id).await? {
            return Err(ServiceError::ProductNotFound(product_id));
        }

        let _claim = self.claims.begin_edit(cart_id)?;
        self.carts
            .add_item(cart_id, CartItem::new(product_id, quantity))
            .await?;

        debug!(cart_id, product_id, quantity, "Item added to cart");
        Ok(())
    }
}
