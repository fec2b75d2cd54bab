//! # Domain Types
//!
//! Core domain types used throughout Cartwheel.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Cart       │   │ InventoryRecord │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  product_id     │   │  cart_id        │   │  product_id     │       │
//! │  │  sku            │   │  customer_id    │   │  available      │       │
//! │  │  manufacturer   │   │  items ─────────┼─► │  reserved       │       │
//! │  │  category_id    │   │   (CartItem)    │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  ┌──────────────────────────────────────┐                              │
//! │  │        PaymentTransaction            │                              │
//! │  │  transaction_id = txn_<unix>_<seq>   │                              │
//! │  │  card_reference (masked), cart_id    │                              │
//! │  │  amount_cents, approved, created_at  │                              │
//! │  └──────────────────────────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every identifier is a positive integer except the payment transaction id,
//! which is derived from the authorization time and a per-ledger sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, StockError};
use crate::money::Money;
use crate::{DEFAULT_INITIAL_STOCK, FLAT_LINE_CHARGE_CENTS, ORDER_ID_MULTIPLIER};

/// Product identifier (positive).
pub type ProductId = i64;

/// Cart identifier (positive, assigned by the cart store).
pub type CartId = i64;

/// Customer identifier (positive).
pub type CustomerId = i64;

/// Order identifier returned by a successful checkout.
pub type OrderId = i64;

/// Derives the order id for a checked-out cart.
#[inline]
pub const fn order_id_for(cart_id: CartId) -> OrderId {
    cart_id * ORDER_ID_MULTIPLIER
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// Read-only from the core's point of view; the catalog replaces whole
/// records on upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier.
    pub product_id: ProductId,

    /// Stock Keeping Unit (1-100 characters).
    pub sku: String,

    /// Manufacturer name (1-200 characters).
    pub manufacturer: String,

    /// Category identifier.
    pub category_id: i64,

    /// Shipping weight (non-negative).
    pub weight: i64,

    /// Secondary classification identifier.
    pub some_other_id: i64,
}

// =============================================================================
// Cart Item
// =============================================================================

/// A (product, quantity) line in a cart. Unique per product within a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl CartItem {
    /// Creates a new line item.
    pub const fn new(product_id: ProductId, quantity: i64) -> Self {
        CartItem {
            product_id,
            quantity,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product sums quantity)
/// - Insertion order is kept; it carries no other meaning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub cart_id: CartId,
    pub customer_id: CustomerId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new(cart_id: CartId, customer_id: CustomerId) -> Self {
        Cart {
            cart_id,
            customer_id,
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds an item, or increases the quantity of the existing line for the
    /// same product.
    ///
    /// ## Behavior
    /// ```text
    /// items: [{p1, 2}]
    ///
    /// merge_item({p1, 3}) → [{p1, 5}]          (first match wins)
    /// merge_item({p2, 1}) → [{p1, 5}, {p2, 1}] (appended)
    /// ```
    pub fn merge_item(&mut self, item: CartItem) -> CoreResult<()> {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == item.product_id)
        {
            existing.quantity = existing
                .quantity
                .checked_add(item.quantity)
                .ok_or(CoreError::QuantityOverflow {
                    product_id: item.product_id,
                })?;
            return Ok(());
        }

        self.items.push(item);
        Ok(())
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Amount presented for authorization: a flat charge per line.
    pub fn charge_amount(&self) -> Money {
        Money::from_cents(FLAT_LINE_CHARGE_CENTS).multiply_quantity(self.items.len() as i64)
    }
}

// =============================================================================
// Inventory Record
// =============================================================================

/// Warehouse ledger entry for one product.
///
/// ## Reservation State Machine
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────┐
/// │                                                                     │
/// │   available ──reserve(q)──► reserved ──ship(q)──► (gone)           │
/// │       ▲                        │                                    │
/// │       └──────release(q)────────┘                                    │
/// │                                                                     │
/// │   available >= 0, reserved >= 0 at all times                       │
/// │   available + reserved never grows                                 │
/// └─────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryRecord {
    pub product_id: ProductId,
    pub available_stock: i64,
    pub reserved_stock: i64,
}

impl InventoryRecord {
    /// Record for a product the ledger has never seen.
    pub const fn new(product_id: ProductId) -> Self {
        Self::with_initial_stock(product_id, DEFAULT_INITIAL_STOCK)
    }

    /// Record with a custom starting stock.
    pub const fn with_initial_stock(product_id: ProductId, available: i64) -> Self {
        InventoryRecord {
            product_id,
            available_stock: available,
            reserved_stock: 0,
        }
    }

    /// Total stock physically on hand.
    pub const fn on_hand(&self) -> i64 {
        self.available_stock + self.reserved_stock
    }

    /// Moves `quantity` from available to reserved.
    pub fn reserve(&mut self, quantity: i64) -> Result<(), StockError> {
        if self.available_stock < quantity {
            return Err(StockError::InsufficientInventory {
                available: self.available_stock,
                requested: quantity,
            });
        }

        self.available_stock -= quantity;
        self.reserved_stock += quantity;
        Ok(())
    }

    /// Consumes `quantity` of reserved stock. Available is untouched.
    pub fn ship(&mut self, quantity: i64) -> Result<(), StockError> {
        self.check_reserved(quantity)?;
        self.reserved_stock -= quantity;
        Ok(())
    }

    /// Returns `quantity` of reserved stock to available.
    pub fn release(&mut self, quantity: i64) -> Result<(), StockError> {
        self.check_reserved(quantity)?;
        self.reserved_stock -= quantity;
        self.available_stock += quantity;
        Ok(())
    }

    fn check_reserved(&self, quantity: i64) -> Result<(), StockError> {
        if self.reserved_stock < quantity {
            return Err(StockError::InsufficientReserved {
                reserved: self.reserved_stock,
                requested: quantity,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Payment Transaction
// =============================================================================

/// A recorded payment attempt, approved or declined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PaymentTransaction {
    /// `txn_<unix seconds>_<sequence>`.
    pub transaction_id: String,

    /// Masked card number (last four digits visible).
    pub card_reference: String,

    pub cart_id: CartId,

    /// Amount presented for authorization, in cents.
    pub amount_cents: i64,

    pub approved: bool,

    pub created_at: DateTime<Utc>,
}

impl PaymentTransaction {
    /// Builds a transaction id from the attempt time and ledger sequence.
    pub fn format_id(at: DateTime<Utc>, seq: i64) -> String {
        format!("txn_{}_{}", at.timestamp(), seq)
    }

    /// Returns the amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// A payment attempt before the ledger has assigned its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPaymentTransaction {
    pub card_reference: String,
    pub cart_id: CartId,
    pub amount: Money,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl NewPaymentTransaction {
    /// Finalizes the draft with the id the ledger assigned.
    pub fn into_transaction(self, transaction_id: String) -> PaymentTransaction {
        PaymentTransaction {
            transaction_id,
            card_reference: self.card_reference,
            cart_id: self.cart_id,
            amount_cents: self.amount.cents(),
            approved: self.approved,
            created_at: self.created_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_merge_same_product_sums_quantity() {
        let mut cart = Cart::new(1, 7);

        cart.merge_item(CartItem::new(1, 2)).unwrap();
        cart.merge_item(CartItem::new(1, 3)).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items[0], CartItem::new(1, 5));
    }

    #[test]
    fn test_merge_keeps_insertion_order() {
        let mut cart = Cart::new(1, 7);

        cart.merge_item(CartItem::new(3, 1)).unwrap();
        cart.merge_item(CartItem::new(1, 1)).unwrap();
        cart.merge_item(CartItem::new(3, 4)).unwrap();

        let products: Vec<_> = cart.items.iter().map(|i| i.product_id).collect();
        assert_eq!(products, vec![3, 1]);
        assert_eq!(cart.total_quantity(), 6);
    }

    #[test]
    fn test_merge_overflow_is_rejected() {
        let mut cart = Cart::new(1, 7);
        cart.merge_item(CartItem::new(1, i64::MAX)).unwrap();

        let err = cart.merge_item(CartItem::new(1, 1)).unwrap_err();
        assert_eq!(err, CoreError::QuantityOverflow { product_id: 1 });
        assert_eq!(cart.items[0].quantity, i64::MAX);
    }

    #[test]
    fn test_charge_amount_is_flat_per_line() {
        let mut cart = Cart::new(1, 7);
        assert!(cart.charge_amount().is_zero());

        cart.merge_item(CartItem::new(1, 5)).unwrap();
        cart.merge_item(CartItem::new(2, 1)).unwrap();
        assert_eq!(cart.charge_amount(), Money::from_cents(2000));
    }

    #[test]
    fn test_reserve_until_exhausted() {
        let mut record = InventoryRecord::new(5);

        record.reserve(100).unwrap();
        assert_eq!(record.available_stock, 0);
        assert_eq!(record.reserved_stock, 100);

        assert_eq!(
            record.reserve(1),
            Err(StockError::InsufficientInventory {
                available: 0,
                requested: 1
            })
        );
    }

    #[test]
    fn test_ship_bounded_by_reserved() {
        let mut record = InventoryRecord::new(5);
        record.reserve(100).unwrap();

        assert_eq!(
            record.ship(101),
            Err(StockError::InsufficientReserved {
                reserved: 100,
                requested: 101
            })
        );

        record.ship(40).unwrap();
        assert_eq!(record.available_stock, 0);
        assert_eq!(record.reserved_stock, 60);
    }

    #[test]
    fn test_release_returns_stock() {
        let mut record = InventoryRecord::new(5);
        record.reserve(30).unwrap();
        record.release(30).unwrap();

        assert_eq!(record, InventoryRecord::new(5));
        assert!(record.release(1).is_err());
    }

    #[test]
    fn test_order_id_for() {
        assert_eq!(order_id_for(3), 3000);
    }

    #[test]
    fn test_transaction_id_format() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(PaymentTransaction::format_id(at, 4), "txn_1700000000_4");
    }

    proptest! {
        /// Property: no sequence of reserve/ship/release ever drives a
        /// counter negative or grows on-hand stock.
        #[test]
        fn ledger_counters_stay_in_bounds(
            ops in prop::collection::vec((0u8..3, 1i64..60), 1..40)
        ) {
            let mut record = InventoryRecord::new(1);
            let mut on_hand = record.on_hand();

            for (op, qty) in ops {
                let _ = match op {
                    0 => record.reserve(qty),
                    1 => record.ship(qty),
                    _ => record.release(qty),
                };
                prop_assert!(record.available_stock >= 0);
                prop_assert!(record.reserved_stock >= 0);
                prop_assert!(record.on_hand() <= on_hand);
                on_hand = record.on_hand();
            }
        }

        /// Property: merging any sequence of items leaves one line per product
        /// whose quantity is the sum of everything added for it.
        #[test]
        fn merge_keeps_one_line_per_product(
            adds in prop::collection::vec((1i64..6, 1i64..50), 0..30)
        ) {
            let mut cart = Cart::new(1, 1);
            for (product_id, qty) in &adds {
                cart.merge_item(CartItem::new(*product_id, *qty)).unwrap();
            }

            for item in &cart.items {
                let expected: i64 = adds
                    .iter()
                    .filter(|(p, _)| *p == item.product_id)
                    .map(|(_, q)| q)
                    .sum();
                prop_assert_eq!(item.quantity, expected);
                prop_assert_eq!(
                    cart.items.iter().filter(|i| i.product_id == item.product_id).count(),
                    1
                );
            }
        }
    }
}
