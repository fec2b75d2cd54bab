//! # Checkout Orchestrator
//!
//! Turns a cart into an order: reserve stock, take payment, ship, delete.
//!
//! ## Checkout Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. validate cart id, card shape ─────────── InvalidCart / Payment     │
//! │  2. claim cart (excludes edits, checkouts) ─ CheckoutInProgress        │
//! │  3. load cart ───────────────────────────── CartNotFound               │
//! │  4. non-empty, every product in catalog ──── EmptyCart / ProductNotFound│
//! │  5. reserve each line ──┬─ ok                                          │
//! │                         └─ fail ─► release lines reserved so far       │
//! │  6. authorize payment ──┬─ approved                                    │
//! │                         └─ declined ─► release all ─► PaymentDeclined  │
//! │  7. ship each line                                                     │
//! │  8. delete cart ─► order id = cart id × 1000                           │
//! │                                                                         │
//! │  Any failure before step 8 leaves the cart in place.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No lock spans the stores. Consistency comes from the compensating
//! release and from the per-cart claim shared with [`CartService`]: while a
//! checkout holds it, a second checkout or an item edit of the same cart
//! fails `CheckoutInProgress`, so the lines that are charged and shipped are
//! exactly the lines that are deleted.
//!
//! [`CartService`]: crate::cart::CartService

use std::sync::Arc;

use cartwheel_core::validation::validate_positive_id;
use cartwheel_core::{order_id_for, CartId, CartItem, Money, OrderId};
use cartwheel_store::{CartStore, ProductStore, WarehouseLedger};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::claims::CartClaims;
use crate::error::{ServiceError, ServiceResult};
use crate::payment::PaymentService;

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub order_id: OrderId,
    pub cart_id: CartId,
    pub transaction_id: String,
    pub amount: Money,
}

#[derive(Clone)]
pub struct CheckoutService {
    carts: Arc<dyn CartStore>,
    products: Arc<dyn ProductStore>,
    warehouse: Arc<dyn WarehouseLedger>,
    payments: PaymentService,
    claims: CartClaims,
}

impl CheckoutService {
    pub fn new(
        carts: Arc<dyn CartStore>,
        products: Arc<dyn ProductStore>,
        warehouse: Arc<dyn WarehouseLedger>,
        payments: PaymentService,
        claims: CartClaims,
    ) -> Self {
        CheckoutService {
            carts,
            products,
            warehouse,
            payments,
            claims,
        }
    }

    /// Checks out `cart_id`, charging `card_number`.
    pub async fn checkout(
        &self,
        cart_id: CartId,
        card_number: &str,
    ) -> ServiceResult<CheckoutReceipt> {
        validate_positive_id("cart_id", cart_id).map_err(ServiceError::invalid_cart)?;
        PaymentService::validate(card_number, cart_id)?;

        let _claim = self.claims.begin_checkout(cart_id).await?;

        let cart = self.carts.get_by_id(cart_id).await?;
        if cart.is_empty() {
            return Err(ServiceError::EmptyCart(cart_id));
        }

        for item in &cart.items {
            if !self.products.exists(item.product_id).await? {
                return Err(ServiceError::ProductNotFound(item.product_id));
            }
        }

        let mut reserved: Vec<CartItem> = Vec::with_capacity(cart.items.len());
        for item in &cart.items {
            if let Err(err) = self.warehouse.reserve(item.product_id, item.quantity).await {
                warn!(cart_id, product_id = item.product_id, error = %err, "Reservation failed");
                self.release_all(cart_id, &reserved).await;
                return Err(err.into());
            }
            reserved.push(*item);
        }

        let amount = cart.charge_amount();
        let txn = match self.payments.authorize(card_number, cart_id, amount).await {
            Ok(txn) => txn,
            Err(err) => {
                self.release_all(cart_id, &reserved).await;
                return Err(err);
            }
        };

        if !txn.approved {
            self.release_all(cart_id, &reserved).await;
            return Err(ServiceError::PaymentDeclined {
                transaction_id: txn.transaction_id,
            });
        }

        for item in &cart.items {
            self.warehouse
                .ship(item.product_id, item.quantity)
                .await
                .map_err(|err| {
                    error!(
                        cart_id,
                        transaction_id = %txn.transaction_id,
                        product_id = item.product_id,
                        error = %err,
                        "Shipping failed after payment was approved"
                    );
                    ServiceError::from(err)
                })?;
        }

        self.carts.delete(cart_id).await?;

        let receipt = CheckoutReceipt {
            order_id: order_id_for(cart_id),
            cart_id,
            transaction_id: txn.transaction_id,
            amount,
        };
        info!(
            cart_id,
            order_id = receipt.order_id,
            transaction_id = %receipt.transaction_id,
            lines = cart.item_count(),
            "Checkout complete"
        );
        Ok(receipt)
    }

    /// Compensates reservations in reverse order. A failed release is
    /// logged and the remaining lines are still released.
    async fn release_all(&self, cart_id: CartId, lines: &[CartItem]) {
        for item in lines.iter().rev() {
            if let Err(err) = self.warehouse.release(item.product_id, item.quantity).await {
                error!(
                    cart_id,
                    product_id = item.product_id,
                    quantity = item.quantity,
                    error = %err,
                    "Failed to release reservation"
                );
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartService;
    use crate::payment::{CardGateway, MockCardGateway};
    use async_trait::async_trait;
    use cartwheel_core::{ErrorKind, InventoryRecord, Product, ProductId};
    use cartwheel_store::{Database, DbConfig, Stores};
    use proptest::prelude::*;
    use tokio::sync::Notify;

    const GOOD_CARD: &str = "4111111111111111";
    const DECLINED_CARD: &str = "4111111111111110";

    fn checkout_service(stores: &Stores, gateway: Arc<dyn CardGateway>) -> CheckoutService {
        checkout_sharing(stores, gateway, CartClaims::new())
    }

    fn checkout_sharing(
        stores: &Stores,
        gateway: Arc<dyn CardGateway>,
        claims: CartClaims,
    ) -> CheckoutService {
        let payments = PaymentService::new(stores.payments.clone(), stores.carts.clone(), gateway);
        CheckoutService::new(
            stores.carts.clone(),
            stores.products.clone(),
            stores.warehouse.clone(),
            payments,
            claims,
        )
    }

    async fn seed_products(stores: &Stores, ids: &[ProductId]) {
        for &product_id in ids {
            stores
                .products
                .upsert(&Product {
                    product_id,
                    sku: format!("SKU-{product_id}"),
                    manufacturer: "Acme".to_string(),
                    category_id: 1,
                    weight: 1,
                    some_other_id: 1,
                })
                .await
                .unwrap();
        }
    }

    async fn cart_with(stores: &Stores, lines: &[(ProductId, i64)]) -> CartId {
        let cart = stores.carts.create(7).await.unwrap();
        for &(product_id, quantity) in lines {
            stores
                .carts
                .add_item(cart.cart_id, CartItem::new(product_id, quantity))
                .await
                .unwrap();
        }
        cart.cart_id
    }

    async fn stock(stores: &Stores, product_id: ProductId) -> (i64, i64) {
        let InventoryRecord {
            available_stock,
            reserved_stock,
            ..
        } = stores.warehouse.get_inventory(product_id).await.unwrap();
        (available_stock, reserved_stock)
    }

    #[tokio::test]
    async fn test_successful_checkout() {
        let stores = Stores::in_memory();
        seed_products(&stores, &[1, 2]).await;
        let service = checkout_service(&stores, Arc::new(MockCardGateway));
        let cart_id = cart_with(&stores, &[(1, 5), (2, 1)]).await;

        let receipt = service.checkout(cart_id, GOOD_CARD).await.unwrap();

        assert_eq!(receipt.order_id, cart_id * 1000);
        assert_eq!(receipt.amount, Money::from_cents(2000));
        assert_eq!(stock(&stores, 1).await, (95, 0));
        assert_eq!(stock(&stores, 2).await, (99, 0));

        let txn = stores.payments.get(&receipt.transaction_id).await.unwrap();
        assert!(txn.approved);
    }

    #[tokio::test]
    async fn test_checkout_twice_fails_cart_not_found() {
        let stores = Stores::in_memory();
        seed_products(&stores, &[1]).await;
        let service = checkout_service(&stores, Arc::new(MockCardGateway));
        let cart_id = cart_with(&stores, &[(1, 1)]).await;

        service.checkout(cart_id, GOOD_CARD).await.unwrap();
        assert_eq!(
            service.checkout(cart_id, GOOD_CARD).await,
            Err(ServiceError::CartNotFound(cart_id))
        );
        assert_eq!(stock(&stores, 1).await, (99, 0));
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let stores = Stores::in_memory();
        let service = checkout_service(&stores, Arc::new(MockCardGateway));
        let cart_id = cart_with(&stores, &[]).await;

        let err = service.checkout(cart_id, GOOD_CARD).await.unwrap_err();
        assert_eq!(err, ServiceError::EmptyCart(cart_id));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_side_effect() {
        let stores = Stores::in_memory();
        seed_products(&stores, &[1]).await;
        let service = checkout_service(&stores, Arc::new(MockCardGateway));
        let cart_id = cart_with(&stores, &[(1, 3)]).await;

        assert!(matches!(
            service.checkout(0, GOOD_CARD).await,
            Err(ServiceError::InvalidCart(_))
        ));
        assert!(matches!(
            service.checkout(cart_id, "not-a-card").await,
            Err(ServiceError::InvalidPaymentData(_))
        ));
        assert_eq!(
            service.checkout(cart_id + 1, GOOD_CARD).await,
            Err(ServiceError::CartNotFound(cart_id + 1))
        );

        assert_eq!(stock(&stores, 1).await, (100, 0));
        assert_eq!(stores.carts.get_by_id(cart_id).await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_declined_checkout_leaves_cart_and_stock_untouched() {
        let stores = Stores::in_memory();
        seed_products(&stores, &[1, 2]).await;
        let service = checkout_service(&stores, Arc::new(MockCardGateway));
        let cart_id = cart_with(&stores, &[(1, 4), (2, 6)]).await;
        let before = stores.carts.get_by_id(cart_id).await.unwrap();

        let err = service.checkout(cart_id, DECLINED_CARD).await.unwrap_err();
        let transaction_id = match err {
            ServiceError::PaymentDeclined { transaction_id } => transaction_id,
            other => panic!("expected decline, got {other:?}"),
        };

        assert_eq!(stores.carts.get_by_id(cart_id).await.unwrap(), before);
        assert_eq!(stock(&stores, 1).await, (100, 0));
        assert_eq!(stock(&stores, 2).await, (100, 0));

        let txn = stores.payments.get(&transaction_id).await.unwrap();
        assert!(!txn.approved);
        assert_eq!(txn.cart_id, cart_id);

        // The cart can still be checked out with a working card.
        service.checkout(cart_id, GOOD_CARD).await.unwrap();
    }

    #[tokio::test]
    async fn test_insufficient_inventory_rolls_back_earlier_lines() {
        let stores = Stores::in_memory();
        seed_products(&stores, &[1, 2]).await;
        stores.warehouse.reserve(2, 95).await.unwrap();
        let service = checkout_service(&stores, Arc::new(MockCardGateway));
        let cart_id = cart_with(&stores, &[(1, 10), (2, 6)]).await;

        assert_eq!(
            service.checkout(cart_id, GOOD_CARD).await,
            Err(ServiceError::InsufficientInventory {
                product_id: 2,
                available: 5,
                requested: 6
            })
        );

        assert_eq!(stock(&stores, 1).await, (100, 0));
        assert_eq!(stock(&stores, 2).await, (5, 95));
        assert!(stores.carts.get_by_id(cart_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_product_missing_from_catalog() {
        let stores = Stores::in_memory();
        seed_products(&stores, &[1]).await;
        let service = checkout_service(&stores, Arc::new(MockCardGateway));
        // Lines bypass the cart service's catalog check here.
        let cart_id = cart_with(&stores, &[(1, 1), (9, 1)]).await;

        assert_eq!(
            service.checkout(cart_id, GOOD_CARD).await,
            Err(ServiceError::ProductNotFound(9))
        );
        assert_eq!(stock(&stores, 1).await, (100, 0));
    }

    /// Gateway that parks inside `approve` until told to continue.
    #[derive(Default)]
    struct GatedGateway {
        entered: Notify,
        proceed: Notify,
    }

    #[async_trait]
    impl CardGateway for GatedGateway {
        async fn approve(&self, _card_number: &str, _amount: Money) -> bool {
            self.entered.notify_one();
            self.proceed.notified().await;
            true
        }
    }

    #[tokio::test]
    async fn test_concurrent_checkout_of_same_cart_is_rejected() {
        let stores = Stores::in_memory();
        seed_products(&stores, &[1]).await;
        let gateway = Arc::new(GatedGateway::default());
        let service = checkout_service(&stores, gateway.clone());
        let cart_id = cart_with(&stores, &[(1, 60)]).await;

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.checkout(cart_id, GOOD_CARD).await })
        };
        gateway.entered.notified().await;

        let err = service.checkout(cart_id, GOOD_CARD).await.unwrap_err();
        assert_eq!(err, ServiceError::CheckoutInProgress(cart_id));
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        gateway.proceed.notify_one();
        first.await.unwrap().unwrap();

        assert_eq!(stock(&stores, 1).await, (40, 0));
    }

    #[tokio::test]
    async fn test_item_added_during_checkout_is_rejected() {
        let stores = Stores::in_memory();
        seed_products(&stores, &[1, 2]).await;
        let claims = CartClaims::new();
        let gateway = Arc::new(GatedGateway::default());
        let service = checkout_sharing(&stores, gateway.clone(), claims.clone());
        let carts = CartService::new(stores.carts.clone(), stores.products.clone(), claims);
        let cart_id = cart_with(&stores, &[(1, 1)]).await;

        let first = {
            let service = service.clone();
            tokio::spawn(async move { service.checkout(cart_id, GOOD_CARD).await })
        };
        gateway.entered.notified().await;

        assert_eq!(
            carts.add_item(cart_id, 2, 5).await,
            Err(ServiceError::CheckoutInProgress(cart_id))
        );

        gateway.proceed.notify_one();
        let receipt = first.await.unwrap().unwrap();
        assert_eq!(receipt.amount, Money::from_cents(1000));

        // Nothing of product 2 was reserved or shipped, and later edits
        // see the cart gone rather than landing silently.
        assert_eq!(stock(&stores, 1).await, (99, 0));
        assert_eq!(stock(&stores, 2).await, (100, 0));
        assert_eq!(
            carts.add_item(cart_id, 2, 5).await,
            Err(ServiceError::CartNotFound(cart_id))
        );
    }

    #[tokio::test]
    async fn test_failed_checkout_lets_edits_resume() {
        let stores = Stores::in_memory();
        seed_products(&stores, &[1]).await;
        let claims = CartClaims::new();
        let service = checkout_sharing(&stores, Arc::new(MockCardGateway), claims.clone());
        let carts = CartService::new(stores.carts.clone(), stores.products.clone(), claims);
        let cart_id = cart_with(&stores, &[(1, 2)]).await;

        assert!(matches!(
            service.checkout(cart_id, DECLINED_CARD).await,
            Err(ServiceError::PaymentDeclined { .. })
        ));

        carts.add_item(cart_id, 1, 3).await.unwrap();
        assert_eq!(
            carts.get(cart_id).await.unwrap().items,
            vec![CartItem::new(1, 5)]
        );
    }

    #[tokio::test]
    async fn test_checkout_on_sqlite_backend() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stores = Stores::sqlite(&db, 100);
        seed_products(&stores, &[1, 2]).await;
        let service = checkout_service(&stores, Arc::new(MockCardGateway));
        let cart_id = cart_with(&stores, &[(1, 2), (1, 3), (2, 1)]).await;

        assert!(matches!(
            service.checkout(cart_id, DECLINED_CARD).await,
            Err(ServiceError::PaymentDeclined { .. })
        ));
        assert_eq!(stock(&stores, 1).await, (100, 0));

        let receipt = service.checkout(cart_id, GOOD_CARD).await.unwrap();
        assert_eq!(receipt.order_id, cart_id * 1000);
        assert_eq!(stock(&stores, 1).await, (95, 0));
        assert_eq!(stock(&stores, 2).await, (99, 0));
        assert_eq!(
            service.checkout(cart_id, GOOD_CARD).await,
            Err(ServiceError::CartNotFound(cart_id))
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Property: across any sequence of carts and card outcomes, shipped
        /// stock never exceeds the initial stock and nothing stays reserved.
        #[test]
        fn checkouts_never_oversell(
            orders in prop::collection::vec((1i64..45, any::<bool>()), 1..12)
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let stores = Stores::in_memory();
                seed_products(&stores, &[1]).await;
                let service = checkout_service(&stores, Arc::new(MockCardGateway));
                let mut shipped = 0;

                for (quantity, card_ok) in orders {
                    let cart_id = cart_with(&stores, &[(1, quantity)]).await;
                    let card = if card_ok { GOOD_CARD } else { DECLINED_CARD };

                    match service.checkout(cart_id, card).await {
                        Ok(_) => shipped += quantity,
                        Err(ServiceError::PaymentDeclined { .. }) => assert!(!card_ok),
                        Err(ServiceError::InsufficientInventory { .. }) => {
                            assert!(shipped + quantity > 100)
                        }
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }

                assert!(shipped <= 100);
                assert_eq!(stock(&stores, 1).await, (100 - shipped, 0));
            });
        }
    }
}
