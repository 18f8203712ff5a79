use std::collections::HashMap;

use tokio::sync::RwLock;

use giftmatch_core::catalog::{CatalogError, CatalogStore};
use giftmatch_core::domain::product::{Product, ProductId};

use super::{ProductRepository, RepositoryError};

/// Catalog held in process memory; used by tests and the demo server mode.
#[derive(Default)]
pub struct InMemoryCatalogStore {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryCatalogStore {
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products =
            products.into_iter().map(|product| (product.id.0.clone(), product)).collect();
        Self { products: RwLock::new(products) }
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryCatalogStore {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let mut active: Vec<Product> =
            products.values().filter(|product| product.is_active).cloned().collect();
        active.sort_by(|left, right| left.id.cmp(&right.id));
        Ok(active)
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_active_products(&self) -> Result<Vec<Product>, CatalogError> {
        self.list_active().await.map_err(|error| CatalogError::Unavailable(error.to_string()))
    }
}
