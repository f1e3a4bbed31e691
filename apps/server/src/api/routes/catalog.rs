//! Catalog API routes
//!
//! Static segments (`search`, `low_priced`, ...) take priority over `:id`.

use crate::api::handlers::{chair, estate};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        // Furniture
        .route("/chair", post(chair::post_chairs))
        .route("/chair/search", get(chair::search_chairs))
        .route("/chair/search/condition", get(chair::chair_conditions))
        .route("/chair/low_priced", get(chair::low_priced_chairs))
        .route("/chair/buy/:id", post(chair::buy_chair))
        .route("/chair/:id", get(chair::get_chair))
        // Properties
        .route("/estate", post(estate::post_estates))
        .route("/estate/search", get(estate::search_estates))
        .route("/estate/search/condition", get(estate::estate_conditions))
        .route("/estate/low_priced", get(estate::low_priced_estates))
        .route("/estate/req_doc/:id", post(estate::request_document))
        .route("/estate/nazotte", post(estate::nazotte))
        .route("/estate/:id", get(estate::get_estate))
        .route(
            "/recommended_estate/:id",
            get(estate::recommended_estates),
        )
}
