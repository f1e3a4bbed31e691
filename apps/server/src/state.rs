//! Application state shared by every handler.

use crate::{
    cache::CatalogCaches,
    conditions::SearchConditions,
    config::Config,
    db::{CatalogStore, MemoryCatalogStore, PostgresCatalogStore},
    services::{CatalogService, IngestService, PolygonSearchEngine},
};
use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub conditions: Arc<SearchConditions>,
    pub caches: Arc<CatalogCaches>,
    pub catalog: Arc<CatalogService>,
    pub ingest: Arc<IngestService>,
    pub polygon: Arc<PolygonSearchEngine>,
    /// `None` when serving from the in-process store.
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Load search conditions, connect to the store and run migrations if configured.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let conditions =
            SearchConditions::load(&config.conditions).context("Failed to load search conditions")?;

        if config.database.in_memory {
            tracing::warn!("Using the in-memory catalog store; data is lost on shutdown");
            return Ok(Self::with_store(
                config,
                conditions,
                Arc::new(MemoryCatalogStore::new()),
            ));
        }

        let pool = PgPoolOptions::new()
            .min_connections(config.database.pool_min_size)
            .max_connections(config.database.pool_max_size)
            .acquire_timeout(Duration::from_secs(config.database.pool_timeout_seconds))
            .connect(&config.database.url)
            .await
            .context("Failed to connect to database")?;

        if config.database.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
        }

        let store = Arc::new(PostgresCatalogStore::new(pool.clone()));
        let mut state = Self::with_store(config, conditions, store);
        state.db_pool = Some(pool);
        Ok(state)
    }

    /// Wire services over an existing store. Caches start empty.
    pub fn with_store(
        config: Config,
        conditions: SearchConditions,
        store: Arc<dyn CatalogStore>,
    ) -> Self {
        let conditions = Arc::new(conditions);
        let caches = Arc::new(CatalogCaches::new(&config.search));

        let catalog = CatalogService::new(
            store.clone(),
            caches.clone(),
            conditions.clone(),
            config.search.clone(),
        );
        let ingest = IngestService::new(store.clone(), caches.clone(), conditions.clone());
        let polygon = PolygonSearchEngine::new(store, caches.clone(), config.search.polygon_limit);

        Self {
            config: Arc::new(config),
            conditions,
            caches,
            catalog: Arc::new(catalog),
            ingest: Arc::new(ingest),
            polygon: Arc::new(polygon),
            db_pool: None,
        }
    }
}
