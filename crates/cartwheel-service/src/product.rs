//! Product catalog lookups and maintenance.

use std::sync::Arc;

use cartwheel_core::validation::{validate_id_match, validate_positive_id, validate_product};
use cartwheel_core::{Product, ProductId};
use cartwheel_store::ProductStore;
use tracing::info;

use crate::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductStore>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductStore>) -> Self {
        ProductService { products }
    }

    pub async fn get(&self, product_id: ProductId) -> ServiceResult<Product> {
        validate_positive_id("product_id", product_id).map_err(ServiceError::invalid_product)?;
        Ok(self.products.get_by_id(product_id).await?)
    }

    /// Replaces the product addressed by `product_id` with `product`.
    ///
    /// The id in the body must match the addressed id.
    pub async fn upsert(&self, product_id: ProductId, product: &Product) -> ServiceResult<()> {
        validate_positive_id("product_id", product_id).map_err(ServiceError::invalid_product)?;
        validate_id_match("product_id", product_id, product.product_id)
            .map_err(ServiceError::invalid_product)?;
        validate_product(product).map_err(ServiceError::invalid_product)?;

        self.products.upsert(product).await?;
        info!(product_id, sku = %product.sku, "Product upserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartwheel_core::ErrorKind;
    use cartwheel_store::Stores;

    fn product(product_id: ProductId) -> Product {
        Product {
            product_id,
            sku: format!("SKU-{product_id}"),
            manufacturer: "Acme".to_string(),
            category_id: 1,
            weight: 10,
            some_other_id: 2,
        }
    }

    #[tokio::test]
    async fn test_upsert_then_get() {
        let service = ProductService::new(Stores::in_memory().products);

        service.upsert(4, &product(4)).await.unwrap();
        assert_eq!(service.get(4).await.unwrap(), product(4));
    }

    #[tokio::test]
    async fn test_get_errors() {
        let service = ProductService::new(Stores::in_memory().products);

        assert_eq!(service.get(9).await, Err(ServiceError::ProductNotFound(9)));
        assert_eq!(service.get(0).await.unwrap_err().kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_upsert_rejects_mismatch_and_invalid_fields() {
        let service = ProductService::new(Stores::in_memory().products);

        let err = service.upsert(4, &product(5)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidProduct(_)));

        let mut bad = product(4);
        bad.manufacturer.clear();
        let err = service.upsert(4, &bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidProduct(_)));

        // Nothing was stored.
        assert_eq!(service.get(4).await, Err(ServiceError::ProductNotFound(4)));
    }
}
