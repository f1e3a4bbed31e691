//! Request handlers for API endpoints
//!
//! Handlers coordinate between routes and services: they parse path, query and body
//! input into typed parameters, invoke a service and shape the JSON response.

pub mod chair;
pub mod estate;

use crate::{state::AppState, Error, Result};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use prometheus::{Encoder, TextEncoder};
use serde_json::json;

/// Unwrap a JSON body, turning extractor rejections into `BadInput`.
pub(crate) fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|e| Error::BadInput(e.body_text()))
}

/// Unwrap a query string, turning extractor rejections into `BadInput`.
pub(crate) fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(value)| value)
        .map_err(|e| Error::BadInput(e.body_text()))
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "catalog-server"
    }))
}

/// Empty both catalogs before a fresh load.
pub async fn initialize(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.ingest.reset().await?;
    Ok(Json(json!({ "language": "rust" })))
}

/// Prometheus text exposition. Cache size gauges are refreshed on every scrape.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.caches.record_sizes();

    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| Error::Internal(format!("failed to encode metrics: {}", e)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        buffer,
    ))
}
