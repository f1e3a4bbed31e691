//! Core trait for catalog storage backends

use super::query_builder::SearchQuery;
use crate::{
    models::{DoorFit, Furniture, GeoPoint, Property, Tagged},
    Result,
};
use async_trait::async_trait;
use catalog_geo::BoundingBox;

/// Backing-store contract consumed by the search and cache layers.
///
/// Any backend (PostgreSQL, in-memory, ...) can implement this trait. Failures are
/// reported as [`crate::Error::Store`] and never retried here.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Point lookup by id, regardless of stock.
    async fn furniture(&self, id: i64) -> Result<Option<Furniture>>;

    async fn property(&self, id: i64) -> Result<Option<Property>>;

    /// Batch lookup in one round trip. Missing ids are silently skipped; order is unspecified.
    async fn properties_by_ids(&self, ids: &[i64]) -> Result<Vec<Property>>;

    /// Number of furniture pieces matching `query`, ignoring its pagination.
    async fn count_furniture(&self, query: &SearchQuery) -> Result<i64>;

    /// One page of matching furniture, popularity descending, id ascending.
    async fn search_furniture(&self, query: &SearchQuery) -> Result<Vec<Furniture>>;

    async fn count_properties(&self, query: &SearchQuery) -> Result<i64>;

    async fn search_properties(&self, query: &SearchQuery) -> Result<Vec<Property>>;

    /// The `limit` cheapest in-stock pieces, price ascending, id ascending.
    async fn cheapest_furniture(&self, limit: i64) -> Result<Vec<Furniture>>;

    /// The `limit` cheapest properties, rent ascending, id ascending.
    async fn cheapest_properties(&self, limit: i64) -> Result<Vec<Property>>;

    /// Points of every property inside `bbox`, bounds inclusive.
    async fn property_points_within(&self, bbox: &BoundingBox) -> Result<Vec<GeoPoint>>;

    /// Properties whose door admits `fit`, popularity descending, id ascending.
    async fn properties_fitting(&self, fit: &DoorFit, limit: i64) -> Result<Vec<Property>>;

    /// Take one unit of a piece.
    ///
    /// The availability check and the decrement happen under a row lock in a single
    /// transaction; any failure rolls back.
    ///
    /// # Returns
    /// The piece with its post-decrement stock
    ///
    /// # Errors
    /// * `NotFound` - The piece does not exist or is sold out
    async fn purchase_furniture(&self, id: i64) -> Result<Furniture>;

    /// Insert a batch atomically: either every row and tag is written or none.
    ///
    /// # Errors
    /// * `Ingest` - An id already exists
    async fn insert_furniture(&self, items: &[Tagged<Furniture>]) -> Result<()>;

    async fn insert_properties(&self, items: &[Tagged<Property>]) -> Result<()>;

    /// Delete every item and tag of both catalogs in one transaction.
    async fn reset(&self) -> Result<()>;
}
