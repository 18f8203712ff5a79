use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::Row;
use tracing::warn;

use giftmatch_core::catalog::{CatalogError, CatalogStore};
use giftmatch_core::domain::product::{MatchFacets, Product, ProductId};
use giftmatch_core::domain::vocabulary::TagSet;

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "id, title, description, price, category, retailer, rating, \
     review_count, features_json, tags_json, facets_json, is_active, priority";

pub struct SqlCatalogStore {
    pool: DbPool,
}

impl SqlCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let price_raw: String = row.try_get("price").map_err(decode_err)?;
    let review_count: i64 = row.try_get("review_count").map_err(decode_err)?;
    let features_json: String = row.try_get("features_json").map_err(decode_err)?;
    let tags_json: String = row.try_get("tags_json").map_err(decode_err)?;
    let facets_json: String = row.try_get("facets_json").map_err(decode_err)?;

    let price = Decimal::from_str(price_raw.trim())
        .map_err(|error| RepositoryError::Decode(format!("product `{id}` price: {error}")))?;
    let review_count = u32::try_from(review_count)
        .map_err(|_| RepositoryError::Decode(format!("product `{id}` review_count out of range")))?;
    let features: Vec<String> = serde_json::from_str(&features_json)
        .map_err(|error| RepositoryError::Decode(format!("product `{id}` features: {error}")))?;
    let tags: TagSet = serde_json::from_str(&tags_json)
        .map_err(|error| RepositoryError::Decode(format!("product `{id}` tags: {error}")))?;
    let facets: MatchFacets = serde_json::from_str(&facets_json)
        .map_err(|error| RepositoryError::Decode(format!("product `{id}` facets: {error}")))?;

    Ok(Product {
        id: ProductId(id),
        title: row.try_get("title").map_err(decode_err)?,
        description: row.try_get("description").map_err(decode_err)?,
        price,
        category: row.try_get("category").map_err(decode_err)?,
        retailer: row.try_get("retailer").map_err(decode_err)?,
        rating: row.try_get("rating").map_err(decode_err)?,
        review_count,
        features,
        tags,
        facets,
        is_active: row.try_get("is_active").map_err(decode_err)?,
        priority: row.try_get("priority").map_err(decode_err)?,
    })
}

#[async_trait::async_trait]
impl ProductRepository for SqlCatalogStore {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let features_json = serde_json::to_string(&product.features).map_err(decode_err)?;
        let tags_json = serde_json::to_string(&product.tags).map_err(decode_err)?;
        let facets_json = serde_json::to_string(&product.facets).map_err(decode_err)?;

        sqlx::query(
            "INSERT INTO product
                (id, title, description, price, category, retailer, rating, review_count,
                 features_json, tags_json, facets_json, is_active, priority)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                price = excluded.price,
                category = excluded.category,
                retailer = excluded.retailer,
                rating = excluded.rating,
                review_count = excluded.review_count,
                features_json = excluded.features_json,
                tags_json = excluded.tags_json,
                facets_json = excluded.facets_json,
                is_active = excluded.is_active,
                priority = excluded.priority,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        )
        .bind(&product.id.0)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(&product.category)
        .bind(&product.retailer)
        .bind(product.rating)
        .bind(i64::from(product.review_count))
        .bind(features_json)
        .bind(tags_json)
        .bind(facets_json)
        .bind(product.is_active)
        .bind(product.priority)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Rows that fail to decode are logged and skipped.
    async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE is_active = 1 ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in &rows {
            match row_to_product(row) {
                Ok(product) => products.push(product),
                Err(error) => {
                    let id = row.try_get::<String, _>("id").unwrap_or_default();
                    warn!(product_id = %id, error = %error, "skipping undecodable catalog row");
                }
            }
        }
        Ok(products)
    }
}

#[async_trait::async_trait]
impl CatalogStore for SqlCatalogStore {
    async fn list_active_products(&self) -> Result<Vec<Product>, CatalogError> {
        self.list_active().await.map_err(|error| match error {
            RepositoryError::Database(error) => CatalogError::Unavailable(error.to_string()),
            RepositoryError::Decode(message) => CatalogError::Decode(message),
        })
    }
}

#[cfg(test)]
mod tests {
    use giftmatch_core::domain::product::{Product, ProductId};
    use rust_decimal::Decimal;

    use super::SqlCatalogStore;
    use crate::migrations::run_pending;
    use crate::repositories::ProductRepository;
    use crate::{connect_with_settings, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrate");
        pool
    }

    fn puzzle() -> Product {
        Product {
            id: ProductId::from("jigsaw"),
            title: "1000 Piece Jigsaw Puzzle".to_string(),
            description: "Landscape puzzle for quiet evenings.".to_string(),
            price: Decimal::new(2450, 2),
            category: "Games".to_string(),
            retailer: "Various Retailers".to_string(),
            rating: 4.3,
            review_count: 812,
            features: vec!["Poster included".to_string()],
            tags: ["puzzles", "relaxation"].into_iter().collect(),
            facets: Default::default(),
            is_active: true,
            priority: 1,
        }
    }

    #[tokio::test]
    async fn save_then_find_preserves_every_field() {
        let store = SqlCatalogStore::new(pool().await);
        let mut product = puzzle();
        product.facets.interests = ["Puzzles"].into_iter().collect();
        product.facets.occasions = ["Just Because"].into_iter().collect();

        store.save(product.clone()).await.expect("save");
        let found = store.find_by_id(&product.id).await.expect("find");

        assert_eq!(found, Some(product));
    }

    #[tokio::test]
    async fn save_upserts_by_id() {
        let store = SqlCatalogStore::new(pool().await);
        store.save(puzzle()).await.expect("save");

        let mut updated = puzzle();
        updated.price = Decimal::new(1999, 2);
        updated.is_active = false;
        store.save(updated).await.expect("upsert");

        let found = store.find_by_id(&ProductId::from("jigsaw")).await.expect("find");
        assert_eq!(found.map(|product| product.price), Some(Decimal::new(1999, 2)));
        assert!(store.list_active().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn list_active_skips_rows_that_fail_to_decode() {
        let pool = pool().await;
        let store = SqlCatalogStore::new(pool.clone());
        store.save(puzzle()).await.expect("save");
        sqlx::query(
            "INSERT INTO product
                (id, title, description, price, category, retailer, rating, review_count,
                 features_json, tags_json, facets_json, is_active, priority)
             VALUES ('broken', 'Broken', '', 'twelve dollars', 'Misc', 'Nowhere', 3.0, 1,
                     '[]', '[]', '{}', 1, 0)",
        )
        .execute(&pool)
        .await
        .expect("insert malformed row");

        let products = store.list_active().await.expect("list");

        let ids: Vec<_> = products.iter().map(|product| product.id.0.as_str()).collect();
        assert_eq!(ids, vec!["jigsaw"]);
    }
}
