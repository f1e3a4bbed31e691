//! Services over a throwaway PostgreSQL schema.
//!
//! Only runs when `database.test_database_url` is configured, e.g. through
//! `CATALOG__DATABASE__TEST_DATABASE_URL`. Each test gets its own schema, migrated from
//! scratch and dropped afterwards.

use super::fixtures::{to_csv, FurnitureRow, PropertyRow};
use anyhow::Context as _;
use axum::Router;
use catalog_server::{
    api::create_router, conditions::SearchConditions, db::PostgresCatalogStore, AppState, Config,
};
use futures::FutureExt as _;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Connection as _,
};
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::sync::OnceCell;
use uuid::Uuid;

static BASE_CONFIG: OnceCell<Option<Config>> = OnceCell::const_new();

async fn base_config() -> anyhow::Result<Option<Config>> {
    BASE_CONFIG
        .get_or_try_init(|| async {
            let mut config = Config::load().context("load Config for tests")?;
            let Some(url) = config.database.test_database_url.clone() else {
                return Ok::<_, anyhow::Error>(None);
            };
            config.database.url = url;
            config.database.in_memory = false;
            config.database.pool_min_size = 0;
            config.database.pool_max_size = 5;
            config.database.pool_timeout_seconds = 30;
            Ok(Some(config))
        })
        .await
        .cloned()
}

pub struct PgTestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<PostgresCatalogStore>,
    schema: String,
    admin_database_url: String,
}

impl PgTestApp {
    /// `None` when no test database is configured.
    pub async fn new() -> anyhow::Result<Option<Self>> {
        let Some(config) = base_config().await? else {
            return Ok(None);
        };
        let admin_database_url = config.database.url.clone();

        let schema = format!("test_{}", Uuid::new_v4().simple());
        let mut admin_conn = sqlx::PgConnection::connect(&admin_database_url)
            .await
            .context("connect admin db for schema create")?;
        sqlx::query(&format!(r#"CREATE SCHEMA "{}""#, schema))
            .execute(&mut admin_conn)
            .await
            .context("create test schema")?;
        admin_conn.close().await.context("close admin connection")?;

        let options = PgConnectOptions::from_str(&admin_database_url)
            .context("parse test database URL")?
            .options([("search_path", schema.as_str())]);
        let pool = PgPoolOptions::new()
            .min_connections(config.database.pool_min_size)
            .max_connections(config.database.pool_max_size)
            .acquire_timeout(Duration::from_secs(config.database.pool_timeout_seconds))
            .connect_with(options)
            .await
            .context("connect test schema pool")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("migrate test schema")?;

        let store = Arc::new(PostgresCatalogStore::new(pool.clone()));
        let mut state = AppState::with_store(config, SearchConditions::builtin(), store.clone());
        state.db_pool = Some(pool);
        let router = create_router(state.clone());

        Ok(Some(Self {
            router,
            state,
            store,
            schema,
            admin_database_url,
        }))
    }

    pub async fn cleanup(self) -> anyhow::Result<()> {
        self.store.pool().close().await;

        let mut admin_conn = sqlx::PgConnection::connect(&self.admin_database_url)
            .await
            .context("connect admin db for schema drop")?;
        sqlx::query(&format!(r#"DROP SCHEMA "{}" CASCADE"#, self.schema))
            .execute(&mut admin_conn)
            .await
            .context("drop test schema")?;

        Ok(())
    }

    pub async fn ingest_furniture(&self, rows: &[FurnitureRow]) -> anyhow::Result<usize> {
        let inserted = self
            .state
            .ingest
            .ingest_furniture(to_csv(rows).as_bytes())
            .await?;
        Ok(inserted)
    }

    pub async fn ingest_properties(&self, rows: &[PropertyRow]) -> anyhow::Result<usize> {
        let inserted = self
            .state
            .ingest
            .ingest_properties(to_csv(rows).as_bytes())
            .await?;
        Ok(inserted)
    }

    /// Stock as stored, bypassing every cache.
    pub async fn stock_of(&self, id: i64) -> anyhow::Result<Option<i64>> {
        let stock = sqlx::query_scalar::<_, i64>("SELECT stock FROM furniture WHERE id = $1")
            .bind(id)
            .fetch_optional(self.store.pool())
            .await?;
        Ok(stock)
    }
}

pub async fn with_pg_app<F>(f: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(
        &'a PgTestApp,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = anyhow::Result<()>> + 'a>,
    >,
{
    let Some(app) = PgTestApp::new().await? else {
        eprintln!("database.test_database_url is not set; skipping PostgreSQL test");
        return Ok(());
    };

    let result = std::panic::AssertUnwindSafe(f(&app)).catch_unwind().await;
    let cleanup_result = app.cleanup().await;

    if let Err(e) = cleanup_result {
        eprintln!("test schema cleanup failed: {e:?}");
    }

    match result {
        Ok(r) => r,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
