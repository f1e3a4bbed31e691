//! Furniture handlers

use super::{json_body, query_params};
use crate::{
    api::middleware::RequestId,
    api::params::{parse_id, ChairSearchQuery, EmailBody},
    conditions::FurnitureConditions,
    models::Furniture,
    state::AppState,
    Error, Result,
};
use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct ChairSearchResponse {
    pub count: i64,
    pub chairs: Vec<Furniture>,
}

#[derive(Debug, Serialize)]
pub struct ChairListResponse {
    pub chairs: Vec<Furniture>,
}

pub async fn get_chair(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Furniture>> {
    let id = parse_id(&id)?;
    Ok(Json(state.catalog.furniture_detail(id).await?))
}

/// Bulk insert from a headerless CSV body.
pub async fn post_chairs(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<(StatusCode, Json<JsonValue>)> {
    let inserted = state.ingest.ingest_furniture(&body).await?;
    tracing::info!(request_id = %request_id.0, inserted, "Furniture batch ingested");
    Ok((StatusCode::CREATED, Json(json!({ "inserted": inserted }))))
}

pub async fn search_chairs(
    State(state): State<AppState>,
    query: std::result::Result<Query<ChairSearchQuery>, QueryRejection>,
) -> Result<Json<ChairSearchResponse>> {
    let params = query_params(query)?.into_params()?;
    let page = state.catalog.search_furniture(&params).await?;
    Ok(Json(ChairSearchResponse {
        count: page.count,
        chairs: page.items,
    }))
}

pub async fn low_priced_chairs(State(state): State<AppState>) -> Result<Json<ChairListResponse>> {
    Ok(Json(ChairListResponse {
        chairs: state.catalog.low_priced_furniture().await?,
    }))
}

pub async fn chair_conditions(State(state): State<AppState>) -> Json<FurnitureConditions> {
    Json(state.conditions.furniture.clone())
}

pub async fn buy_chair(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<EmailBody>, JsonRejection>,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    let body = json_body(body)?;
    body.validate()
        .map_err(|e| Error::BadInput(format!("invalid email: {}", e)))?;

    state.catalog.purchase_furniture(id).await?;
    Ok(StatusCode::OK)
}
