//! Property handlers

use super::{json_body, query_params};
use crate::{
    api::middleware::RequestId,
    api::params::{parse_id, EmailBody, EstateSearchQuery, NazotteBody},
    conditions::PropertyConditions,
    models::Property,
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
pub struct EstateSearchResponse {
    pub count: i64,
    pub estates: Vec<Property>,
}

#[derive(Debug, Serialize)]
pub struct EstateListResponse {
    pub estates: Vec<Property>,
}

pub async fn get_estate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Property>> {
    let id = parse_id(&id)?;
    Ok(Json(state.catalog.property_detail(id).await?))
}

/// Bulk insert from a headerless CSV body.
pub async fn post_estates(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Bytes,
) -> Result<(StatusCode, Json<JsonValue>)> {
    let inserted = state.ingest.ingest_properties(&body).await?;
    tracing::info!(request_id = %request_id.0, inserted, "Property batch ingested");
    Ok((StatusCode::CREATED, Json(json!({ "inserted": inserted }))))
}

pub async fn search_estates(
    State(state): State<AppState>,
    query: std::result::Result<Query<EstateSearchQuery>, QueryRejection>,
) -> Result<Json<EstateSearchResponse>> {
    let params = query_params(query)?.into_params()?;
    let page = state.catalog.search_properties(&params).await?;
    Ok(Json(EstateSearchResponse {
        count: page.count,
        estates: page.items,
    }))
}

pub async fn low_priced_estates(
    State(state): State<AppState>,
) -> Result<Json<EstateListResponse>> {
    Ok(Json(EstateListResponse {
        estates: state.catalog.low_priced_properties().await?,
    }))
}

pub async fn estate_conditions(State(state): State<AppState>) -> Json<PropertyConditions> {
    Json(state.conditions.property.clone())
}

pub async fn request_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<EmailBody>, JsonRejection>,
) -> Result<StatusCode> {
    let id = parse_id(&id)?;
    let body = json_body(body)?;
    body.validate()
        .map_err(|e| Error::BadInput(format!("invalid email: {}", e)))?;

    state.catalog.request_property_document(id).await?;
    Ok(StatusCode::OK)
}

/// Properties inside a drawn polygon.
pub async fn nazotte(
    State(state): State<AppState>,
    body: std::result::Result<Json<NazotteBody>, JsonRejection>,
) -> Result<Json<EstateSearchResponse>> {
    let body = json_body(body)?;
    let page = state.polygon.search(body.coordinates).await?;
    Ok(Json(EstateSearchResponse {
        count: page.count,
        estates: page.items,
    }))
}

/// Properties whose door admits the given furniture piece.
pub async fn recommended_estates(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EstateListResponse>> {
    let id = parse_id(&id)?;
    Ok(Json(EstateListResponse {
        estates: state.catalog.recommended_properties(id).await?,
    }))
}
