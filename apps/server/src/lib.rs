//! Catalog search server
//!
//! Filtered, paginated searches over furniture and property catalogs with:
//! - Bucketed range filters precomputed at ingestion
//! - Tag-intersection filters over a normalized tag table
//! - Cached "cheapest available" snapshots kept coherent with purchases and inserts
//! - Map-drawn polygon searches with a per-id record cache
//! - Row-locked purchases

// Allow clippy lints that are acceptable for this codebase
#![allow(
    clippy::type_complexity, // Split lookups return (found, missing) tuples
)]

pub mod api;
pub mod cache;
pub mod conditions;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
