//! Metrics collection for the catalog server
//!
//! This module defines and manages Prometheus metrics for HTTP traffic, searches, purchases
//! and the in-process caches.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    register_int_gauge_vec, Histogram, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec,
};

lazy_static! {
    // HTTP Request Metrics

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "catalog_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register HTTP_REQUESTS_TOTAL");

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "catalog_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");

    /// In-flight HTTP requests
    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGaugeVec = register_int_gauge_vec!(
        "catalog_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
        &["method", "path"]
    )
    .expect("Failed to register HTTP_REQUESTS_IN_FLIGHT");

    /// HTTP request body size in bytes
    pub static ref HTTP_REQUEST_SIZE_BYTES: HistogramVec = register_histogram_vec!(
        "catalog_http_request_size_bytes",
        "HTTP request body size in bytes",
        &["method", "path"],
        vec![100.0, 1_000.0, 10_000.0, 100_000.0, 1_000_000.0, 10_000_000.0]
    )
    .expect("Failed to register HTTP_REQUEST_SIZE_BYTES");

    // Catalog Operation Metrics

    /// Searches by catalog and outcome
    pub static ref SEARCH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "catalog_search_total",
        "Total number of filtered searches",
        &["catalog", "status"]
    )
    .expect("Failed to register SEARCH_TOTAL");

    /// Purchase attempts by outcome
    pub static ref PURCHASES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "catalog_purchases_total",
        "Total number of purchase attempts",
        &["status"]
    )
    .expect("Failed to register PURCHASES_TOTAL");

    /// Rows written by ingestion
    pub static ref INGESTED_ROWS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "catalog_ingested_rows_total",
        "Total number of ingested rows",
        &["catalog"]
    )
    .expect("Failed to register INGESTED_ROWS_TOTAL");

    // Cache Metrics

    /// Low-price snapshot events: hit, recompute, invalidate, patch
    pub static ref LOW_PRICE_CACHE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "catalog_low_price_cache_total",
        "Low-price snapshot cache events",
        &["catalog", "outcome"]
    )
    .expect("Failed to register LOW_PRICE_CACHE_TOTAL");

    /// Per-id geo cache lookups: hit or miss
    pub static ref GEO_CACHE_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "catalog_geo_cache_lookups_total",
        "Entity point cache lookups",
        &["outcome"]
    )
    .expect("Failed to register GEO_CACHE_LOOKUPS_TOTAL");

    pub static ref GEO_CACHE_ENTRIES: IntGauge = register_int_gauge!(
        "catalog_geo_cache_entries",
        "Records held by the entity point cache"
    )
    .expect("Failed to register GEO_CACHE_ENTRIES");

    /// Items in the published low-price snapshot, 0 when none is published
    pub static ref LOW_PRICE_SNAPSHOT_ITEMS: IntGaugeVec = register_int_gauge_vec!(
        "catalog_low_price_snapshot_items",
        "Items in the published low-price snapshot",
        &["catalog"]
    )
    .expect("Failed to register LOW_PRICE_SNAPSHOT_ITEMS");

    /// Bounding-box candidates per polygon search
    pub static ref POLYGON_CANDIDATES: Histogram = register_histogram!(
        "catalog_polygon_candidates",
        "Number of bounding-box candidates per polygon search",
        vec![0.0, 1.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0]
    )
    .expect("Failed to register POLYGON_CANDIDATES");
}

/// Path segments that are part of a route; anything else is a parameter.
const STATIC_SEGMENTS: &[&str] = &[
    "api",
    "chair",
    "estate",
    "search",
    "condition",
    "low_priced",
    "buy",
    "req_doc",
    "nazotte",
    "recommended_estate",
    "health",
    "metrics",
];

/// Helper to sanitize path for metrics labels (replace ids, limit cardinality)
pub fn sanitize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }

    let mut out = String::new();
    for segment in trimmed.split('/') {
        out.push('/');
        if STATIC_SEGMENTS.contains(&segment) {
            out.push_str(segment);
        } else {
            out.push_str("{id}");
        }
    }
    out
}
