//! Bulk CSV ingestion.
//!
//! Every row of a batch is parsed, classified into buckets and tag-resolved before the store
//! is touched; one bad row rejects the whole batch. After the insert commits, the low-price
//! cache is told about the new records.

use crate::{
    cache::CatalogCaches,
    conditions::SearchConditions,
    db::CatalogStore,
    metrics::INGESTED_ROWS_TOTAL,
    models::{Catalog, Furniture, Property, RangeAttribute, Tagged},
    Error, Result,
};
use serde::Deserialize;
use std::sync::Arc;

/// `id,name,description,thumbnail,price,height,width,depth,color,features,kind,popularity,stock`
#[derive(Debug, Deserialize)]
struct FurnitureRow {
    id: i64,
    name: String,
    description: String,
    thumbnail: String,
    price: i64,
    height: i64,
    width: i64,
    depth: i64,
    color: String,
    features: String,
    kind: String,
    popularity: i64,
    stock: i64,
}

/// `id,name,description,thumbnail,address,latitude,longitude,rent,door_height,door_width,features,popularity`
#[derive(Debug, Deserialize)]
struct PropertyRow {
    id: i64,
    name: String,
    description: String,
    thumbnail: String,
    address: String,
    latitude: f64,
    longitude: f64,
    rent: i64,
    door_height: i64,
    door_width: i64,
    features: String,
    popularity: i64,
}

pub struct IngestService {
    store: Arc<dyn CatalogStore>,
    caches: Arc<CatalogCaches>,
    conditions: Arc<SearchConditions>,
}

impl IngestService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        caches: Arc<CatalogCaches>,
        conditions: Arc<SearchConditions>,
    ) -> Self {
        Self {
            store,
            caches,
            conditions,
        }
    }

    /// Returns the number of inserted rows.
    pub async fn ingest_furniture(&self, csv: &[u8]) -> Result<usize> {
        let batch = self.parse_furniture(csv)?;
        self.store.insert_furniture(&batch).await?;

        let records: Vec<Furniture> = batch.into_iter().map(|t| t.record).collect();
        self.caches.furniture.on_insert(&records);
        INGESTED_ROWS_TOTAL
            .with_label_values(&[Catalog::Furniture.as_str()])
            .inc_by(records.len() as u64);
        Ok(records.len())
    }

    pub async fn ingest_properties(&self, csv: &[u8]) -> Result<usize> {
        let batch = self.parse_properties(csv)?;
        self.store.insert_properties(&batch).await?;

        let records: Vec<Property> = batch.into_iter().map(|t| t.record).collect();
        self.caches.properties.on_insert(&records);
        INGESTED_ROWS_TOTAL
            .with_label_values(&[Catalog::Property.as_str()])
            .inc_by(records.len() as u64);
        Ok(records.len())
    }

    /// Empty both catalogs, then drop every cached view of them. Loads already in flight
    /// are not published.
    pub async fn reset(&self) -> Result<()> {
        self.store.reset().await?;
        self.caches.clear();
        tracing::info!("Catalogs reset");
        Ok(())
    }

    fn parse_furniture(&self, csv: &[u8]) -> Result<Vec<Tagged<Furniture>>> {
        let c = &self.conditions;
        read_rows::<FurnitureRow>(csv)?
            .into_iter()
            .map(|row| {
                let tag_ids = self.resolve_tags(Catalog::Furniture, row.id, &row.features)?;
                let record = Furniture {
                    price_level: c.classify(RangeAttribute::Price, row.price),
                    height_level: c.classify(RangeAttribute::Height, row.height),
                    width_level: c.classify(RangeAttribute::Width, row.width),
                    depth_level: c.classify(RangeAttribute::Depth, row.depth),
                    id: row.id,
                    name: row.name,
                    description: row.description,
                    thumbnail: row.thumbnail,
                    price: row.price,
                    height: row.height,
                    width: row.width,
                    depth: row.depth,
                    color: row.color,
                    features: row.features,
                    kind: row.kind,
                    popularity: row.popularity,
                    stock: row.stock,
                };
                if record.stock < 0 {
                    return Err(Error::Ingest(format!(
                        "furniture {}: negative stock {}",
                        record.id, record.stock
                    )));
                }
                Ok(Tagged { record, tag_ids })
            })
            .collect()
    }

    fn parse_properties(&self, csv: &[u8]) -> Result<Vec<Tagged<Property>>> {
        let c = &self.conditions;
        read_rows::<PropertyRow>(csv)?
            .into_iter()
            .map(|row| {
                if !(row.latitude.is_finite() && row.longitude.is_finite()) {
                    return Err(Error::Ingest(format!(
                        "property {}: non-finite coordinate",
                        row.id
                    )));
                }
                let tag_ids = self.resolve_tags(Catalog::Property, row.id, &row.features)?;
                Ok(Tagged {
                    record: Property {
                        rent_level: c.classify(RangeAttribute::Rent, row.rent),
                        door_height_level: c.classify(RangeAttribute::DoorHeight, row.door_height),
                        door_width_level: c.classify(RangeAttribute::DoorWidth, row.door_width),
                        id: row.id,
                        name: row.name,
                        description: row.description,
                        thumbnail: row.thumbnail,
                        address: row.address,
                        latitude: row.latitude,
                        longitude: row.longitude,
                        rent: row.rent,
                        door_height: row.door_height,
                        door_width: row.door_width,
                        features: row.features,
                        popularity: row.popularity,
                    },
                    tag_ids,
                })
            })
            .collect()
    }

    /// `features` is a comma-separated list of names from the catalog's vocabulary.
    fn resolve_tags(&self, catalog: Catalog, id: i64, features: &str) -> Result<Vec<i64>> {
        let names: Vec<&str> = split_features(features).collect();
        self.conditions
            .tag_ids(catalog, &names)
            .map_err(|e| Error::Ingest(format!("{} {}: {}", catalog.as_str(), id, e)))
    }
}

pub(crate) fn split_features(features: &str) -> impl Iterator<Item = &str> {
    features.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn read_rows<T: serde::de::DeserializeOwned>(csv: &[u8]) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(csv);
    let rows = reader
        .deserialize::<T>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Err(Error::Ingest("empty batch".into()));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use crate::db::MemoryCatalogStore;

    fn service(store: Arc<MemoryCatalogStore>) -> (IngestService, Arc<CatalogCaches>) {
        let caches = Arc::new(CatalogCaches::new(&SearchConfig::default()));
        let service = IngestService::new(
            store,
            caches.clone(),
            Arc::new(SearchConditions::builtin()),
        );
        (service, caches)
    }

    const CHAIRS: &str = "\
1,Desk chair,comfy,c1.png,4500,95,60,55,black,\"casters,armrests\",office,10,3
2,Stool,tiny,c2.png,1200,45,30,30,white,,stool,4,1
";

    #[tokio::test]
    async fn classifies_buckets_at_write_time() -> anyhow::Result<()> {
        let store = Arc::new(MemoryCatalogStore::new());
        let (service, _) = service(store.clone());

        assert_eq!(service.ingest_furniture(CHAIRS.as_bytes()).await?, 2);

        let chair = store.furniture(1).await?.expect("inserted");
        assert_eq!(chair.price_level, 1);
        assert_eq!(chair.height_level, 1);
        assert_eq!(chair.width_level, 0);
        assert_eq!(chair.stock, 3);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_row_rejects_batch_before_store_access() -> anyhow::Result<()> {
        let store = Arc::new(MemoryCatalogStore::new());
        let (service, _) = service(store.clone());

        let csv = format!("{CHAIRS}3,Broken,x,x,not-a-price,1,1,1,red,,office,1,1\n");
        let err = service.ingest_furniture(csv.as_bytes()).await.unwrap_err();

        assert!(matches!(err, Error::Ingest(_)));
        assert_eq!(store.access_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_feature_is_ingest_error() -> anyhow::Result<()> {
        let store = Arc::new(MemoryCatalogStore::new());
        let (service, _) = service(store.clone());

        let csv = "1,Flat,x,x,Tokyo,35.6,139.7,60000,200,100,\"jacuzzi\",5\n";
        let err = service.ingest_properties(csv.as_bytes()).await.unwrap_err();
        assert!(matches!(err, Error::Ingest(_)));
        Ok(())
    }

    #[tokio::test]
    async fn insert_invalidates_low_price_snapshot() -> anyhow::Result<()> {
        let store = Arc::new(MemoryCatalogStore::new());
        let (service, caches) = service(store.clone());
        service.ingest_furniture(CHAIRS.as_bytes()).await?;

        caches
            .furniture
            .get_or_load(|limit| store.cheapest_furniture(limit as i64))
            .await?;
        assert!(caches.furniture.current().is_some());

        service
            .ingest_furniture(b"3,Cheap,x,x,100,45,30,30,red,,stool,1,1\n")
            .await?;
        assert!(caches.furniture.current().is_none());
        Ok(())
    }

    #[test]
    fn split_features_skips_blanks() {
        let names: Vec<&str> = split_features(" a, ,b,").collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
