//! # cartwheel-service: Services and Checkout for Cartwheel
//!
//! Request validation, the per-resource services and the checkout
//! orchestrator. Every service talks to storage through the traits in
//! `cartwheel-store`, so the same code runs against memory, SQLite or Redis.
//!
//! ## Modules
//!
//! - [`product`] - Catalog lookups and upserts
//! - [`cart`] - Cart creation and item merging
//! - [`warehouse`] - Reserve / ship / release with catalog checks
//! - [`payment`] - Card gateway and the payment ledger
//! - [`checkout`] - Cart to order: reserve, authorize, ship, delete
//! - [`claims`] - Per-cart coordination of item edits and checkout
//! - [`error`] - `ServiceError` and its transport-facing kinds
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cartwheel_service::{MockCardGateway, Services};
//! use cartwheel_store::Stores;
//!
//! let services = Services::new(&Stores::in_memory(), Arc::new(MockCardGateway));
//!
//! let cart_id = services.carts.create(7).await?;
//! services.carts.add_item(cart_id, 5, 2).await?;
//! let receipt = services.checkout.checkout(cart_id, "4111111111111111").await?;
//! ```

pub mod cart;
pub mod checkout;
pub mod claims;
pub mod error;
pub mod payment;
pub mod product;
pub mod warehouse;

use std::sync::Arc;

use cartwheel_store::Stores;

pub use cart::CartService;
pub use checkout::{CheckoutReceipt, CheckoutService};
pub use claims::CartClaims;
pub use error::{ErrorBody, ServiceError, ServiceResult};
pub use payment::{CardGateway, MockCardGateway, PaymentService};
pub use product::ProductService;
pub use warehouse::WarehouseService;

/// Every service wired to one set of stores.
#[derive(Clone)]
pub struct Services {
    pub products: ProductService,
    pub carts: CartService,
    pub warehouse: WarehouseService,
    pub payments: PaymentService,
    pub checkout: CheckoutService,
}

impl Services {
    pub fn new(stores: &Stores, gateway: Arc<dyn CardGateway>) -> Self {
        let payments = PaymentService::new(stores.payments.clone(), stores.carts.clone(), gateway);
        let claims = CartClaims::new();

        Services {
            products: ProductService::new(stores.products.clone()),
            carts: CartService::new(stores.carts.clone(), stores.products.clone(), claims.clone()),
            warehouse: WarehouseService::new(stores.warehouse.clone(), stores.products.clone()),
            checkout: CheckoutService::new(
                stores.carts.clone(),
                stores.products.clone(),
                stores.warehouse.clone(),
                payments.clone(),
                claims,
            ),
            payments,
        }
    }
}
