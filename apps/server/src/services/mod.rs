//! Service layer - typed operations over the store and caches

pub mod catalog;
pub mod ingest;
pub mod polygon;

pub use catalog::{CatalogService, FurnitureSearch, PropertySearch, SearchPage};
pub use ingest::IngestService;
pub use polygon::PolygonSearchEngine;
