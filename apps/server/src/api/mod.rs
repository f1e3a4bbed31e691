//! HTTP surface: `/api` catalog routes plus health, metrics and reset endpoints.

pub mod handlers;
pub mod middleware;
pub mod params;
pub mod routes;

use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;
    let body_limit = DefaultBodyLimit::max(server.max_request_body_size);
    let cors = middleware::cors(&server.cors_origins);

    let api = routes::catalog::catalog_routes();

    // Layers run outermost-last: the request id span wraps metrics and handlers.
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        .route("/initialize", post(handlers::initialize))
        .nest("/api", api)
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::metrics_middleware))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::compression())
        .layer(cors)
        .layer(body_limit)
}
