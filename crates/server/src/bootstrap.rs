use std::sync::Arc;

use giftmatch_core::config::AppConfig;
use giftmatch_core::{ApplicationError, SuggestionService};
use giftmatch_db::{connect_from_config, migrations, DbPool, SqlCatalogStore};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: SuggestionService,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("suggestion service could not start: {0}")]
    Service(#[source] ApplicationError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let store = SqlCatalogStore::new(db_pool.clone());
    let service = SuggestionService::new(Arc::new(store), &config.matching)
        .map_err(BootstrapError::Service)?;
    info!(
        event_name = "system.bootstrap.service_ready",
        correlation_id = "bootstrap",
        browse_limit = config.matching.browse_limit,
        max_retries = config.matching.max_retries,
        "suggestion service ready"
    );

    Ok(Application { config, db_pool, service })
}

#[cfg(test)]
mod tests {
    use giftmatch_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use giftmatch_core::BrowseQuery;
    use giftmatch_db::CatalogSeedDataset;

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    fn config(database_url: &str) -> AppConfig {
        let options = LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        };
        AppConfig::load(options).expect("config should load")
    }

    #[tokio::test]
    async fn bootstrap_reports_unreachable_database_files() {
        let result =
            bootstrap_with_config(config("sqlite:///giftmatch-missing-dir/nested/gifts.db")).await;

        assert!(matches!(result, Err(BootstrapError::DatabaseConnect(_))));
    }

    #[tokio::test]
    async fn bootstrap_migrates_and_serves_the_seeded_catalog() {
        let app = bootstrap_with_config(config("sqlite::memory:"))
            .await
            .expect("bootstrap should succeed with an in-memory database");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'product'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("product table should exist after bootstrap");
        assert_eq!(table_count, 1);

        CatalogSeedDataset::load(&app.db_pool).await.expect("seed");
        let products = app.service.browse(&BrowseQuery::default()).await.expect("browse");
        assert_eq!(products.len(), CatalogSeedDataset::active_count());

        app.db_pool.close().await;
    }
}
