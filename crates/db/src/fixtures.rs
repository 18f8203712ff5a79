use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Demo catalog rows and the facts `verify` holds them to.
const SEED_PRODUCTS: &[SeedProductContract] = &[
    SeedProductContract { id: "smart-speaker", category: "Electronics", price: "49.99", is_active: true },
    SeedProductContract {
        id: "smart-speaker-gen1",
        category: "Electronics",
        price: "29.99",
        is_active: false,
    },
    SeedProductContract { id: "e-reader", category: "Electronics", price: "139.99", is_active: true },
    SeedProductContract { id: "air-fryer", category: "Kitchen", price: "119.99", is_active: true },
    SeedProductContract { id: "coffee-maker", category: "Kitchen", price: "89.99", is_active: true },
    SeedProductContract {
        id: "wireless-headphones",
        category: "Electronics",
        price: "149.99",
        is_active: true,
    },
    SeedProductContract { id: "yoga-mat", category: "Fitness", price: "88.00", is_active: true },
    SeedProductContract { id: "skincare-set", category: "Beauty", price: "24.99", is_active: true },
    SeedProductContract {
        id: "essential-oils-diffuser",
        category: "Home",
        price: "39.99",
        is_active: true,
    },
    SeedProductContract { id: "indoor-garden", category: "Home", price: "99.95", is_active: true },
    SeedProductContract { id: "weighted-blanket", category: "Home", price: "49.80", is_active: true },
    SeedProductContract {
        id: "strategy-board-game",
        category: "Games",
        price: "43.97",
        is_active: true,
    },
    SeedProductContract {
        id: "fitness-smartwatch",
        category: "Electronics",
        price: "179.95",
        is_active: true,
    },
];

/// Deterministic demo catalog used by `giftmatch seed`, the CLI smoke tests and local servers.
pub struct CatalogSeedDataset;

impl CatalogSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/catalog_seed.sql");

    pub fn product_ids() -> impl Iterator<Item = &'static str> {
        SEED_PRODUCTS.iter().map(|product| product.id)
    }

    pub fn active_count() -> usize {
        SEED_PRODUCTS.iter().filter(|product| product.is_active).count()
    }

    /// Upserts every seed row. Safe to run repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            products_seeded: SEED_PRODUCTS.len(),
            active_products: Self::active_count(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(SEED_PRODUCTS.len() + 1);

        for product in SEED_PRODUCTS {
            let matches: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM product WHERE id = ?1 AND category = ?2 AND price = ?3 AND is_active = ?4 AND json_valid(facets_json))",
            )
            .bind(product.id)
            .bind(product.category)
            .bind(product.price)
            .bind(product.is_active)
            .fetch_one(pool)
            .await?;
            checks.push((product.id, matches == 1));
        }

        let quoted = sql_array_from_ids(&Self::product_ids().collect::<Vec<_>>());
        let active_seeded: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM product WHERE is_active = 1 AND id IN {quoted}"
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("active-product-count", active_seeded == Self::active_count() as i64));

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes seeded rows; products added by other means are left alone.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let quoted = sql_array_from_ids(&Self::product_ids().collect::<Vec<_>>());
        sqlx::query(&format!("DELETE FROM product WHERE id IN {quoted}")).execute(pool).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedProductContract {
    id: &'static str,
    category: &'static str,
    price: &'static str,
    is_active: bool,
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{}'", id)).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub products_seeded: usize,
    pub active_products: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn migrated_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[test]
    fn sql_fixture_mentions_every_seed_product() {
        for id in CatalogSeedDataset::product_ids() {
            assert!(CatalogSeedDataset::SQL.contains(&format!("'{id}'")), "missing {id}");
        }
    }

    #[tokio::test]
    async fn seed_load_is_verifiable_and_idempotent() {
        let pool = migrated_pool().await;

        let first = CatalogSeedDataset::load(&pool).await.expect("load seed fixtures");
        let first_verification =
            CatalogSeedDataset::verify(&pool).await.expect("verify seed fixtures");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);
        assert_eq!(first.products_seeded, 13);
        assert_eq!(first.active_products, 12);

        CatalogSeedDataset::load(&pool).await.expect("reload seed fixtures");
        let second_verification =
            CatalogSeedDataset::verify(&pool).await.expect("re-verify seed fixtures");
        assert_eq!(first_verification.checks, second_verification.checks);

        let total: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM product")
            .fetch_one(&pool)
            .await
            .expect("count products");
        assert_eq!(total, 13);
    }

    #[tokio::test]
    async fn clean_removes_seeded_rows() {
        let pool = migrated_pool().await;
        CatalogSeedDataset::load(&pool).await.expect("load seed fixtures");

        CatalogSeedDataset::clean(&pool).await.expect("clean");

        let verification = CatalogSeedDataset::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
        assert!(verification.checks.iter().all(|(_, ok)| !ok));
    }
}
