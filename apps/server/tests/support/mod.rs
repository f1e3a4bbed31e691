pub mod fixtures;
pub mod postgres;

use anyhow::Context as _;
use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use catalog_server::{
    api::create_router, conditions::SearchConditions, db::MemoryCatalogStore, AppState, Config,
};
use std::sync::Arc;
use tower::ServiceExt as _;

pub use fixtures::*;

/// Router and services over an in-process store. Every test gets its own.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryCatalogStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::new_with_config(|_| {})
    }

    pub fn new_with_config(configure: impl FnOnce(&mut Config)) -> Self {
        let mut config = Config::default();
        configure(&mut config);

        let store = Arc::new(MemoryCatalogStore::new());
        let state = AppState::with_store(config, SearchConditions::builtin(), store.clone());
        let router = create_router(state.clone());

        Self {
            router,
            state,
            store,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Bytes>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        self.request_with_content_type(method, path_and_query, body, "application/json")
            .await
    }

    pub async fn request_with_content_type(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<Bytes>,
        content_type: &str,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let request = Request::builder()
            .method(method)
            .uri(path_and_query)
            .header("host", "example.org")
            .header("accept", "application/json")
            .header("content-type", content_type)
            .body(match body {
                Some(bytes) => Body::from(bytes),
                None => Body::empty(),
            })
            .context("build request")?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("dispatch request")?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("read response body")?;

        Ok((status, headers, body))
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
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(actual, expected, "{context}: unexpected status");
}
