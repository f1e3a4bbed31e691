//! In-process caches shared by every request.
//!
//! Constructed once at startup, empty, and handed to the services by `Arc`. Nothing is
//! persisted across restarts.

pub mod entity_points;
pub mod low_price;

pub use entity_points::EntityPointCache;
pub use low_price::{LowPriceCache, LowPriceSnapshot};

use crate::config::SearchConfig;
use crate::metrics::{GEO_CACHE_ENTRIES, LOW_PRICE_SNAPSHOT_ITEMS};
use crate::models::{Catalog, Furniture, Property};

#[derive(Debug)]
pub struct CatalogCaches {
    pub furniture: LowPriceCache<Furniture>,
    pub properties: LowPriceCache<Property>,
    pub points: EntityPointCache,
}

impl CatalogCaches {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            furniture: LowPriceCache::new(config.low_priced_limit),
            properties: LowPriceCache::new(config.low_priced_limit),
            points: EntityPointCache::new(config.geo_cache_capacity),
        }
    }

    /// Forget everything cached. Used after the backing store has been emptied.
    pub fn clear(&self) {
        self.furniture.clear();
        self.properties.clear();
        self.points.clear();
    }

    /// Copy current cache sizes into the gauges. Called before each scrape.
    pub fn record_sizes(&self) {
        GEO_CACHE_ENTRIES.set(self.points.len() as i64);
        for (catalog, items) in [
            (Catalog::Furniture, self.furniture.current().map_or(0, |s| s.len())),
            (Catalog::Property, self.properties.current().map_or(0, |s| s.len())),
        ] {
            LOW_PRICE_SNAPSHOT_ITEMS
                .with_label_values(&[catalog.as_str()])
                .set(items as i64);
        }
    }
}
