//! In-process catalog store.
//!
//! Same filter, ordering, pagination and purchase semantics as the PostgreSQL store. Every
//! trait call counts as one backing-store access, which lets tests assert that a cached
//! path never reaches the store.

use super::query_builder::SearchQuery;
use super::traits::CatalogStore;
use crate::{
    models::{
        popularity_order, price_order, DoorFit, Furniture, GeoPoint, Listing, Property, Tagged,
    },
    Error, Result,
};
use async_trait::async_trait;
use catalog_geo::BoundingBox;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone)]
struct Entry<T> {
    record: T,
    tags: BTreeSet<i64>,
}

type Table<T> = RwLock<BTreeMap<i64, Entry<T>>>;

#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    furniture: Table<Furniture>,
    properties: Table<Property>,
    accesses: AtomicUsize,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trait calls served so far.
    pub fn access_count(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    /// Current stock of a piece, read without counting as an access.
    pub fn stock_of(&self, id: i64) -> Option<i64> {
        self.furniture
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|e| e.record.stock)
    }

    fn touch(&self) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
    }
}

fn get<T: Clone>(table: &Table<T>, id: i64) -> Option<T> {
    table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .map(|e| e.record.clone())
}

fn matching<T: Listing>(table: &Table<T>, query: &SearchQuery) -> Vec<T> {
    let mut hits: Vec<T> = table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .filter(|e| query.matches(&e.record, &e.tags))
        .map(|e| e.record.clone())
        .collect();
    hits.sort_by(popularity_order);
    hits
}

fn page<T: Listing>(table: &Table<T>, query: &SearchQuery) -> Vec<T> {
    let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(query.per_page()).unwrap_or(0);
    matching(table, query)
        .into_iter()
        .skip(offset)
        .take(limit)
        .collect()
}

fn cheapest<T: Listing>(table: &Table<T>, limit: i64) -> Vec<T> {
    let mut items: Vec<T> = table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .filter(|e| e.record.is_available())
        .map(|e| e.record.clone())
        .collect();
    items.sort_by(price_order);
    items.truncate(usize::try_from(limit).unwrap_or(0));
    items
}

fn insert<T: Listing>(table: &Table<T>, items: &[Tagged<T>]) -> Result<()> {
    let mut guard = table.write().unwrap_or_else(PoisonError::into_inner);

    let mut batch_ids = BTreeSet::new();
    for item in items {
        let id = item.record.id();
        if guard.contains_key(&id) || !batch_ids.insert(id) {
            return Err(Error::Ingest(format!("duplicate id: {}", id)));
        }
    }

    for item in items {
        guard.insert(
            item.record.id(),
            Entry {
                record: item.record.clone(),
                tags: item.tag_ids.iter().copied().collect(),
            },
        );
    }
    Ok(())
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn furniture(&self, id: i64) -> Result<Option<Furniture>> {
        self.touch();
        Ok(get(&self.furniture, id))
    }

    async fn property(&self, id: i64) -> Result<Option<Property>> {
        self.touch();
        Ok(get(&self.properties, id))
    }

    async fn properties_by_ids(&self, ids: &[i64]) -> Result<Vec<Property>> {
        self.touch();
        let guard = self.properties.read().unwrap_or_else(PoisonError::into_inner);
        Ok(ids
            .iter()
            .filter_map(|id| guard.get(id).map(|e| e.record.clone()))
            .collect())
    }

    async fn count_furniture(&self, query: &SearchQuery) -> Result<i64> {
        self.touch();
        Ok(matching(&self.furniture, query).len() as i64)
    }

    async fn search_furniture(&self, query: &SearchQuery) -> Result<Vec<Furniture>> {
        self.touch();
        Ok(page(&self.furniture, query))
    }

    async fn count_properties(&self, query: &SearchQuery) -> Result<i64> {
        self.touch();
        Ok(matching(&self.properties, query).len() as i64)
    }

    async fn search_properties(&self, query: &SearchQuery) -> Result<Vec<Property>> {
        self.touch();
        Ok(page(&self.properties, query))
    }

    async fn cheapest_furniture(&self, limit: i64) -> Result<Vec<Furniture>> {
        self.touch();
        Ok(cheapest(&self.furniture, limit))
    }

    async fn cheapest_properties(&self, limit: i64) -> Result<Vec<Property>> {
        self.touch();
        Ok(cheapest(&self.properties, limit))
    }

    async fn property_points_within(&self, bbox: &BoundingBox) -> Result<Vec<GeoPoint>> {
        self.touch();
        Ok(self
            .properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|e| e.record.point())
            .filter(|p| bbox.contains(p.coordinate()))
            .collect())
    }

    async fn properties_fitting(&self, fit: &DoorFit, limit: i64) -> Result<Vec<Property>> {
        self.touch();
        let mut items: Vec<Property> = self
            .properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|e| fit.admits(&e.record))
            .map(|e| e.record.clone())
            .collect();
        items.sort_by(popularity_order);
        items.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(items)
    }

    async fn purchase_furniture(&self, id: i64) -> Result<Furniture> {
        self.touch();
        let mut guard = self.furniture.write().unwrap_or_else(PoisonError::into_inner);
        match guard.get_mut(&id) {
            Some(entry) if entry.record.stock > 0 => {
                entry.record.stock -= 1;
                Ok(entry.record.clone())
            }
            _ => Err(Error::NotFound(format!("furniture {} is not available", id))),
        }
    }

    async fn insert_furniture(&self, items: &[Tagged<Furniture>]) -> Result<()> {
        self.touch();
        insert(&self.furniture, items)
    }

    async fn insert_properties(&self, items: &[Tagged<Property>]) -> Result<()> {
        self.touch();
        insert(&self.properties, items)
    }

    async fn reset(&self) -> Result<()> {
        self.touch();
        let mut furniture = self.furniture.write().unwrap_or_else(PoisonError::into_inner);
        let mut properties = self.properties.write().unwrap_or_else(PoisonError::into_inner);
        furniture.clear();
        properties.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SearchQueryBuilder;
    use crate::models::fixtures::{furniture, property};
    use crate::models::{Catalog, CategoryField};
    use catalog_geo::Coordinate;

    fn tagged<T>(record: T, tags: &[i64]) -> Tagged<T> {
        Tagged {
            record,
            tag_ids: tags.to_vec(),
        }
    }

    #[tokio::test]
    async fn purchase_stops_at_zero() -> anyhow::Result<()> {
        let store = MemoryCatalogStore::new();
        store
            .insert_furniture(&[tagged(furniture(1, 100, 0, 1), &[])])
            .await?;

        let bought = store.purchase_furniture(1).await?;
        assert_eq!(bought.stock, 0);
        assert!(matches!(
            store.purchase_furniture(1).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.purchase_furniture(2).await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(store.stock_of(1), Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_ids_reject_the_whole_batch() -> anyhow::Result<()> {
        let store = MemoryCatalogStore::new();
        let result = store
            .insert_furniture(&[
                tagged(furniture(1, 100, 0, 1), &[]),
                tagged(furniture(1, 200, 0, 1), &[]),
            ])
            .await;
        assert!(matches!(result, Err(Error::Ingest(_))));
        assert_eq!(store.stock_of(1), None);
        Ok(())
    }

    #[tokio::test]
    async fn search_excludes_sold_out_furniture() -> anyhow::Result<()> {
        let store = MemoryCatalogStore::new();
        store
            .insert_furniture(&[
                tagged(furniture(1, 100, 5, 1), &[]),
                tagged(furniture(2, 100, 9, 0), &[]),
            ])
            .await?;

        let query = SearchQueryBuilder::new(Catalog::Furniture)
            .category(CategoryField::Kind, "office")
            .page(0, 10)
            .build()?;
        assert_eq!(store.count_furniture(&query).await?, 1);
        let ids: Vec<i64> = store
            .search_furniture(&query)
            .await?
            .iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec![1]);
        Ok(())
    }

    #[tokio::test]
    async fn bounding_box_is_inclusive() -> anyhow::Result<()> {
        let store = MemoryCatalogStore::new();
        store
            .insert_properties(&[
                tagged(property(1, 0, 0, 0.0, 0.0), &[]),
                tagged(property(2, 0, 0, 10.0, 10.0), &[]),
                tagged(property(3, 0, 0, 10.5, 5.0), &[]),
            ])
            .await?;

        let corners = [Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 10.0)];
        let bbox = BoundingBox::enclosing(&corners).expect("non-empty");
        let mut ids: Vec<i64> = store
            .property_points_within(&bbox)
            .await?
            .iter()
            .map(|p| p.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
        Ok(())
    }

    #[tokio::test]
    async fn reset_empties_both_catalogs() -> anyhow::Result<()> {
        let store = MemoryCatalogStore::new();
        store.insert_furniture(&[tagged(furniture(1, 100, 5, 1), &[1])]).await?;
        store
            .insert_properties(&[tagged(property(1, 100, 0, 0.0, 0.0), &[])])
            .await?;

        store.reset().await?;

        assert!(store.furniture(1).await?.is_none());
        assert!(store.property(1).await?.is_none());
        // ids are free again
        store.insert_furniture(&[tagged(furniture(1, 100, 5, 1), &[])]).await?;
        assert_eq!(store.stock_of(1), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn every_call_counts_as_an_access() -> anyhow::Result<()> {
        let store = MemoryCatalogStore::new();
        store.cheapest_properties(20).await?;
        store.property(1).await?;
        assert_eq!(store.access_count(), 2);
        Ok(())
    }
}
