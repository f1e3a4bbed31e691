//! Catalog service - detail, search, low-price, purchase and recommendation operations
//!
//! Takes typed, already-parsed inputs; resolves bucket ids and tag names against the search
//! conditions, builds validated queries and keeps the low-price caches coherent with writes.

use crate::{
    cache::CatalogCaches,
    conditions::SearchConditions,
    config::SearchConfig,
    db::{CatalogStore, SearchQuery, SearchQueryBuilder},
    metrics::{PURCHASES_TOTAL, SEARCH_TOTAL},
    models::{Catalog, CategoryField, Furniture, Property, RangeAttribute},
    Error, Result,
};
use serde::Serialize;
use std::sync::Arc;

/// Furniture search filters. At least one must be set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FurnitureSearch {
    pub price_range_id: Option<i64>,
    pub height_range_id: Option<i64>,
    pub width_range_id: Option<i64>,
    pub depth_range_id: Option<i64>,
    pub kind: Option<String>,
    pub color: Option<String>,
    pub features: Vec<String>,
    pub page: i64,
    pub per_page: i64,
}

/// Property search filters. At least one must be set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySearch {
    pub door_height_range_id: Option<i64>,
    pub door_width_range_id: Option<i64>,
    pub rent_range_id: Option<i64>,
    pub features: Vec<String>,
    pub page: i64,
    pub per_page: i64,
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchPage<T> {
    pub count: i64,
    pub items: Vec<T>,
}

impl<T> SearchPage<T> {
    pub fn empty() -> Self {
        Self {
            count: 0,
            items: Vec::new(),
        }
    }
}

pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
    caches: Arc<CatalogCaches>,
    conditions: Arc<SearchConditions>,
    config: SearchConfig,
}

impl CatalogService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        caches: Arc<CatalogCaches>,
        conditions: Arc<SearchConditions>,
        config: SearchConfig,
    ) -> Self {
        Self {
            store,
            caches,
            conditions,
            config,
        }
    }

    pub fn conditions(&self) -> &SearchConditions {
        &self.conditions
    }

    /// A piece that is sold out is reported as not found.
    pub async fn furniture_detail(&self, id: i64) -> Result<Furniture> {
        match self.store.furniture(id).await? {
            Some(item) if item.stock > 0 => Ok(item),
            Some(_) => Err(Error::NotFound(format!("furniture {} is sold out", id))),
            None => Err(Error::NotFound(format!("furniture {} does not exist", id))),
        }
    }

    pub async fn property_detail(&self, id: i64) -> Result<Property> {
        self.store
            .property(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("property {} does not exist", id)))
    }

    pub async fn search_furniture(&self, params: &FurnitureSearch) -> Result<SearchPage<Furniture>> {
        let query = self.furniture_query(params)?;
        let result = self.furniture_page(&query).await;
        record_search(Catalog::Furniture, &result);
        result
    }

    pub async fn search_properties(&self, params: &PropertySearch) -> Result<SearchPage<Property>> {
        let query = self.property_query(params)?;
        let result = self.property_page(&query).await;
        record_search(Catalog::Property, &result);
        result
    }

    async fn furniture_page(&self, query: &SearchQuery) -> Result<SearchPage<Furniture>> {
        let count = self.store.count_furniture(query).await?;
        if count <= query.offset() {
            return Ok(SearchPage {
                count,
                items: Vec::new(),
            });
        }
        let items = self.store.search_furniture(query).await?;
        Ok(SearchPage { count, items })
    }

    async fn property_page(&self, query: &SearchQuery) -> Result<SearchPage<Property>> {
        let count = self.store.count_properties(query).await?;
        if count <= query.offset() {
            return Ok(SearchPage {
                count,
                items: Vec::new(),
            });
        }
        let items = self.store.search_properties(query).await?;
        Ok(SearchPage { count, items })
    }

    pub fn furniture_query(&self, params: &FurnitureSearch) -> Result<SearchQuery> {
        let mut builder = SearchQueryBuilder::new(Catalog::Furniture);
        for (attribute, requested) in [
            (RangeAttribute::Price, params.price_range_id),
            (RangeAttribute::Height, params.height_range_id),
            (RangeAttribute::Width, params.width_range_id),
            (RangeAttribute::Depth, params.depth_range_id),
        ] {
            if let Some(id) = requested {
                let range = self.conditions.range(attribute).resolve(id)?;
                builder = builder.bucket(attribute, range.id);
            }
        }
        if let Some(kind) = &params.kind {
            builder = builder.category(CategoryField::Kind, kind.clone());
        }
        if let Some(color) = &params.color {
            builder = builder.category(CategoryField::Color, color.clone());
        }
        builder
            .tags(self.conditions.tag_ids(Catalog::Furniture, &params.features)?)
            .page(params.page, params.per_page)
            .max_page_size(self.config.max_page_size)
            .build()
    }

    pub fn property_query(&self, params: &PropertySearch) -> Result<SearchQuery> {
        let mut builder = SearchQueryBuilder::new(Catalog::Property);
        for (attribute, requested) in [
            (RangeAttribute::DoorHeight, params.door_height_range_id),
            (RangeAttribute::DoorWidth, params.door_width_range_id),
            (RangeAttribute::Rent, params.rent_range_id),
        ] {
            if let Some(id) = requested {
                let range = self.conditions.range(attribute).resolve(id)?;
                builder = builder.bucket(attribute, range.id);
            }
        }
        builder
            .tags(self.conditions.tag_ids(Catalog::Property, &params.features)?)
            .page(params.page, params.per_page)
            .max_page_size(self.config.max_page_size)
            .build()
    }

    pub async fn low_priced_furniture(&self) -> Result<Vec<Furniture>> {
        let snapshot = self
            .caches
            .furniture
            .get_or_load(|limit| self.store.cheapest_furniture(limit as i64))
            .await?;
        Ok(snapshot.items().to_vec())
    }

    pub async fn low_priced_properties(&self) -> Result<Vec<Property>> {
        let snapshot = self
            .caches
            .properties
            .get_or_load(|limit| self.store.cheapest_properties(limit as i64))
            .await?;
        Ok(snapshot.items().to_vec())
    }

    /// Take one unit, then patch the low-price snapshot.
    pub async fn purchase_furniture(&self, id: i64) -> Result<Furniture> {
        match self.store.purchase_furniture(id).await {
            Ok(item) => {
                self.caches.furniture.on_availability_decrement(id);
                PURCHASES_TOTAL.with_label_values(&["success"]).inc();
                tracing::info!(id, remaining = item.stock, "Furniture purchased");
                Ok(item)
            }
            Err(e) => {
                let status = match &e {
                    Error::NotFound(_) => "unavailable",
                    _ => "error",
                };
                PURCHASES_TOTAL.with_label_values(&[status]).inc();
                Err(e)
            }
        }
    }

    /// Nothing is recorded; the property only has to exist.
    pub async fn request_property_document(&self, id: i64) -> Result<()> {
        self.property_detail(id).await.map(|_| ())
    }

    pub async fn recommended_properties(&self, furniture_id: i64) -> Result<Vec<Property>> {
        let item = self.store.furniture(furniture_id).await?.ok_or_else(|| {
            Error::NotFound(format!("furniture {} does not exist", furniture_id))
        })?;
        self.store
            .properties_fitting(&item.door_fit(), self.config.recommended_limit as i64)
            .await
    }
}

fn record_search<T>(catalog: Catalog, result: &Result<SearchPage<T>>) {
    let status = if result.is_ok() { "success" } else { "error" };
    SEARCH_TOTAL
        .with_label_values(&[catalog.as_str(), status])
        .inc();
}
