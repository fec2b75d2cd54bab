//! Behaviour every backend must share, run against each of them.

use cartwheel_core::{CartItem, Money, NewPaymentTransaction, Product, ProductId};
use chrono::Utc;

use crate::backend::Stores;
use crate::error::StoreError;

fn product(product_id: ProductId, sku: &str) -> Product {
    Product {
        product_id,
        sku: sku.to_string(),
        manufacturer: "Acme".to_string(),
        category_id: 1,
        weight: 250,
        some_other_id: 9,
    }
}

pub(crate) async fn run_all(stores: &Stores) {
    products(stores).await;
    carts(stores).await;
    warehouse(stores).await;
    concurrent_reservations(stores).await;
    payments(stores).await;
}

async fn products(stores: &Stores) {
    let catalog = &stores.products;

    assert!(matches!(
        catalog.get_by_id(404).await,
        Err(StoreError::ProductNotFound(404))
    ));
    assert!(!catalog.exists(404).await.unwrap());

    catalog.upsert(&product(1, "SKU-1")).await.unwrap();
    assert_eq!(catalog.get_by_id(1).await.unwrap(), product(1, "SKU-1"));
    assert!(catalog.exists(1).await.unwrap());

    catalog.upsert(&product(1, "SKU-1-B")).await.unwrap();
    assert_eq!(catalog.get_by_id(1).await.unwrap().sku, "SKU-1-B");
}

async fn carts(stores: &Stores) {
    let carts = &stores.carts;

    let first = carts.create(7).await.unwrap();
    let fetched = carts.get_by_id(first.cart_id).await.unwrap();
    assert_eq!(fetched.customer_id, 7);
    assert!(fetched.items.is_empty());

    let second = carts.create(7).await.unwrap();
    assert!(second.cart_id > first.cart_id);

    // Merge on the same product, append on a new one, keep insertion order.
    carts.add_item(first.cart_id, CartItem::new(3, 1)).await.unwrap();
    carts.add_item(first.cart_id, CartItem::new(1, 2)).await.unwrap();
    carts.add_item(first.cart_id, CartItem::new(1, 3)).await.unwrap();
    let fetched = carts.get_by_id(first.cart_id).await.unwrap();
    assert_eq!(fetched.items, vec![CartItem::new(3, 1), CartItem::new(1, 5)]);

    // Other carts are untouched.
    assert!(carts.get_by_id(second.cart_id).await.unwrap().items.is_empty());

    assert!(matches!(
        carts.add_item(i64::MAX, CartItem::new(1, 1)).await,
        Err(StoreError::CartNotFound(_))
    ));

    carts.delete(first.cart_id).await.unwrap();
    assert!(matches!(
        carts.get_by_id(first.cart_id).await,
        Err(StoreError::CartNotFound(id)) if id == first.cart_id
    ));
    assert!(matches!(
        carts.delete(first.cart_id).await,
        Err(StoreError::CartNotFound(_))
    ));
    assert!(matches!(
        carts.add_item(first.cart_id, CartItem::new(1, 1)).await,
        Err(StoreError::CartNotFound(_))
    ));

    // Ids are never reused after a delete.
    let third = carts.create(8).await.unwrap();
    assert!(third.cart_id > second.cart_id);
}

async fn warehouse(stores: &Stores) {
    let ledger = &stores.warehouse;

    let fresh = ledger.get_inventory(5).await.unwrap();
    assert_eq!((fresh.available_stock, fresh.reserved_stock), (100, 0));

    ledger.reserve(5, 100).await.unwrap();
    let record = ledger.get_inventory(5).await.unwrap();
    assert_eq!((record.available_stock, record.reserved_stock), (0, 100));

    assert!(matches!(
        ledger.reserve(5, 1).await,
        Err(StoreError::InsufficientInventory {
            product_id: 5,
            available: 0,
            requested: 1
        })
    ));

    assert!(matches!(
        ledger.ship(5, 101).await,
        Err(StoreError::InsufficientReserved {
            product_id: 5,
            reserved: 100,
            requested: 101
        })
    ));

    ledger.ship(5, 40).await.unwrap();
    ledger.release(5, 60).await.unwrap();
    let record = ledger.get_inventory(5).await.unwrap();
    assert_eq!((record.available_stock, record.reserved_stock), (60, 0));

    assert!(matches!(
        ledger.release(5, 1).await,
        Err(StoreError::InsufficientReserved { .. })
    ));

    // Ship and release never materialize a record.
    assert!(matches!(
        ledger.ship(6, 1).await,
        Err(StoreError::ProductNotFound(6))
    ));
    assert!(matches!(
        ledger.release(6, 1).await,
        Err(StoreError::ProductNotFound(6))
    ));

    // Reserve materializes the default record first.
    ledger.reserve(7, 30).await.unwrap();
    let record = ledger.get_inventory(7).await.unwrap();
    assert_eq!((record.available_stock, record.reserved_stock), (70, 30));
}

async fn concurrent_reservations(stores: &Stores) {
    const PRODUCT: ProductId = 11;

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let ledger = stores.warehouse.clone();
            tokio::spawn(async move { ledger.reserve(PRODUCT, 10).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => succeeded += 1,
            Err(StoreError::InsufficientInventory { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 10);
    let record = stores.warehouse.get_inventory(PRODUCT).await.unwrap();
    assert_eq!((record.available_stock, record.reserved_stock), (0, 100));
}

async fn payments(stores: &Stores) {
    let ledger = &stores.payments;

    let draft = |approved| NewPaymentTransaction {
        card_reference: "************1110".to_string(),
        cart_id: 3,
        amount: Money::from_cents(2000),
        approved,
        created_at: Utc::now(),
    };

    let declined = ledger.record(draft(false)).await.unwrap();
    let approved = ledger.record(draft(true)).await.unwrap();

    assert!(declined.transaction_id.starts_with("txn_"));
    assert_ne!(declined.transaction_id, approved.transaction_id);

    let fetched = ledger.get(&declined.transaction_id).await.unwrap();
    assert_eq!(fetched.transaction_id, declined.transaction_id);
    assert!(!fetched.approved);
    assert_eq!(fetched.cart_id, 3);
    assert_eq!(fetched.amount(), Money::from_cents(2000));
    assert_eq!(fetched.card_reference, "************1110");

    assert!(matches!(
        ledger.get("txn_0_0").await,
        Err(StoreError::TransactionNotFound(_))
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStore;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn memory_backend_conforms() {
        run_all(&Stores::in_memory()).await;
    }

    #[tokio::test]
    async fn sqlite_backend_conforms() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        run_all(&Stores::sqlite(&db, 100)).await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn sqlite_file_backend_conforms_with_pool() {
        let path = std::env::temp_dir().join(format!(
            "cartwheel-conformance-{}-{}.db",
            std::process::id(),
            Utc::now().timestamp_micros()
        ));
        let db = Database::new(DbConfig::new(&path).max_connections(5))
            .await
            .unwrap();

        run_all(&Stores::sqlite(&db, 100)).await;

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }

    #[tokio::test]
    #[ignore = "needs a Redis server at REDIS_URL"]
    async fn redis_backend_conforms() {
        let Ok(url) = std::env::var("REDIS_URL") else {
            return;
        };
        let namespace = format!("cartwheel-test:{}:", Utc::now().timestamp_micros());
        let docs = DocumentStore::connect_with_namespace(&url, &namespace)
            .await
            .unwrap();
        assert!(docs.health_check().await);

        run_all(&Stores::documents(&docs, 100)).await;
    }
}
