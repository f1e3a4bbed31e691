//! "Draw a shape on the map" search.
//!
//! Bounding-box prefilter in the store, exact containment in process, hydration through the
//! entity point cache, then ranking and truncation. Points on the polygon boundary are
//! outside. The reported count is the number of items returned, after truncation.

use super::catalog::SearchPage;
use crate::{
    cache::CatalogCaches,
    db::CatalogStore,
    metrics::POLYGON_CANDIDATES,
    models::{popularity_order, Property},
    Result,
};
use catalog_geo::{Coordinate, Polygon};
use std::sync::Arc;

pub struct PolygonSearchEngine {
    store: Arc<dyn CatalogStore>,
    caches: Arc<CatalogCaches>,
    limit: usize,
}

impl PolygonSearchEngine {
    pub fn new(store: Arc<dyn CatalogStore>, caches: Arc<CatalogCaches>, limit: usize) -> Self {
        Self {
            store,
            caches,
            limit,
        }
    }

    #[tracing::instrument(name = "polygon_search", skip_all, fields(vertices = coordinates.len()))]
    pub async fn search(&self, coordinates: Vec<Coordinate>) -> Result<SearchPage<Property>> {
        let polygon = Polygon::new(coordinates)?;

        let candidates = self
            .store
            .property_points_within(&polygon.bounding_box())
            .await?;
        POLYGON_CANDIDATES.observe(candidates.len() as f64);

        let contained: Vec<i64> = candidates
            .iter()
            .filter(|p| polygon.contains(p.coordinate()))
            .map(|p| p.id)
            .collect();
        if contained.is_empty() {
            return Ok(SearchPage::empty());
        }

        let (mut found, missing) = self.caches.points.get_many(&contained);
        if !missing.is_empty() {
            let fetched = self.store.properties_by_ids(&missing).await?;
            self.caches.points.put_many(fetched.iter().cloned());
            found.extend(fetched.into_iter().map(|p| (p.id, p)));
        }

        let mut items: Vec<Property> = contained
            .iter()
            .filter_map(|id| found.remove(id))
            .collect();
        items.sort_by(popularity_order);
        items.truncate(self.limit);

        tracing::debug!(
            candidates = candidates.len(),
            contained = contained.len(),
            fetched = missing.len(),
            returned = items.len(),
            "Polygon search finished"
        );

        Ok(SearchPage {
            count: items.len() as i64,
            items,
        })
    }
}
