use async_trait::async_trait;
use thiserror::Error;

use giftmatch_core::domain::product::{Product, ProductId};

pub mod memory;
pub mod product;

pub use memory::InMemoryCatalogStore;
pub use product::SqlCatalogStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Write side of the catalog, used by seeding and admin tooling.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError>;
}
