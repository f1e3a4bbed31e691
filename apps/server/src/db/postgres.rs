//! PostgreSQL catalog store.

use super::query_builder::{BindValue, SearchQuery};
use super::traits::CatalogStore;
use crate::{
    models::{Catalog, DoorFit, Furniture, GeoPoint, Listing, Property, Tagged},
    Error, Result,
};
use async_trait::async_trait;
use catalog_geo::BoundingBox;
use sqlx::{postgres::PgArguments, query::QueryAs, PgPool, Postgres};
use std::time::Instant;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_page<T>(&self, query: &SearchQuery) -> Result<Vec<T>>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let (sql, bind_values) = query.build_sql();
        let started = Instant::now();
        let rows = bind_all(sqlx::query_as::<_, T>(&sql), bind_values)
            .fetch_all(&self.pool)
            .await?;
        tracing::debug!(
            catalog = query.catalog().as_str(),
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Executed search page query"
        );
        Ok(rows)
    }

    async fn fetch_cheapest<T>(&self, limit: i64) -> Result<Vec<T>>
    where
        T: Listing + for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        Ok(sqlx::query_as::<_, T>(&cheapest_sql(T::CATALOG))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn fetch_count(&self, query: &SearchQuery) -> Result<i64> {
        let (sql, bind_values) = query.build_count_sql();
        let mut count_query = sqlx::query_scalar::<_, i64>(&sql);
        for value in bind_values {
            count_query = match value {
                BindValue::Int(v) => count_query.bind(v),
                BindValue::Text(v) => count_query.bind(v),
                BindValue::IntArray(vs) => count_query.bind(vs),
            };
        }
        Ok(count_query.fetch_one(&self.pool).await?)
    }
}

fn bind_all<'q, T>(
    mut query: QueryAs<'q, Postgres, T, PgArguments>,
    bind_values: Vec<BindValue>,
) -> QueryAs<'q, Postgres, T, PgArguments> {
    for value in bind_values {
        query = match value {
            BindValue::Int(v) => query.bind(v),
            BindValue::Text(v) => query.bind(v),
            BindValue::IntArray(vs) => query.bind(vs),
        };
    }
    query
}

/// Cheapest listable items of `catalog`, price ascending then id ascending.
fn cheapest_sql(catalog: Catalog) -> String {
    let availability = if catalog.requires_stock() {
        " WHERE stock > 0"
    } else {
        ""
    };
    format!(
        "SELECT * FROM {}{} ORDER BY {} ASC, id ASC LIMIT $1",
        catalog.table(),
        availability,
        catalog.price_column()
    )
}

/// Duplicate ids are a rejected batch, not a store failure.
fn map_insert_error(e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            Error::Ingest(format!("duplicate id: {}", db.message()))
        }
        _ => Error::Store(e),
    }
}

/// Flatten `(item_id, tag_id)` pairs into two parallel arrays for UNNEST.
fn tag_columns<T>(items: &[Tagged<T>], id: impl Fn(&T) -> i64) -> (Vec<i64>, Vec<i64>) {
    items
        .iter()
        .flat_map(|item| {
            let item_id = id(&item.record);
            item.tag_ids.iter().map(move |tag| (item_id, *tag))
        })
        .unzip()
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    async fn furniture(&self, id: i64) -> Result<Option<Furniture>> {
        Ok(
            sqlx::query_as::<_, Furniture>("SELECT * FROM furniture WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn property(&self, id: i64) -> Result<Option<Property>> {
        Ok(
            sqlx::query_as::<_, Property>("SELECT * FROM property WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn properties_by_ids(&self, ids: &[i64]) -> Result<Vec<Property>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(
            sqlx::query_as::<_, Property>("SELECT * FROM property WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn count_furniture(&self, query: &SearchQuery) -> Result<i64> {
        self.fetch_count(query).await
    }

    async fn search_furniture(&self, query: &SearchQuery) -> Result<Vec<Furniture>> {
        self.fetch_page(query).await
    }

    async fn count_properties(&self, query: &SearchQuery) -> Result<i64> {
        self.fetch_count(query).await
    }

    async fn search_properties(&self, query: &SearchQuery) -> Result<Vec<Property>> {
        self.fetch_page(query).await
    }

    async fn cheapest_furniture(&self, limit: i64) -> Result<Vec<Furniture>> {
        self.fetch_cheapest(limit).await
    }

    async fn cheapest_properties(&self, limit: i64) -> Result<Vec<Property>> {
        self.fetch_cheapest(limit).await
    }

    async fn property_points_within(&self, bbox: &BoundingBox) -> Result<Vec<GeoPoint>> {
        Ok(sqlx::query_as::<_, GeoPoint>(
            "SELECT id, latitude, longitude FROM property
             WHERE latitude BETWEEN $1 AND $2 AND longitude BETWEEN $3 AND $4",
        )
        .bind(bbox.min.latitude)
        .bind(bbox.max.latitude)
        .bind(bbox.min.longitude)
        .bind(bbox.max.longitude)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn properties_fitting(&self, fit: &DoorFit, limit: i64) -> Result<Vec<Property>> {
        let mut sql = String::from("SELECT * FROM property WHERE ");
        let mut query_args = Vec::with_capacity(fit.pairs.len() * 2);
        for (i, (across, up)) in fit.pairs.iter().enumerate() {
            if i > 0 {
                sql.push_str(" OR ");
            }
            let base = i * 2;
            sql.push_str(&format!(
                "(door_width >= ${} AND door_height >= ${})",
                base + 1,
                base + 2
            ));
            query_args.push(BindValue::Int(*across));
            query_args.push(BindValue::Int(*up));
        }
        query_args.push(BindValue::Int(limit));
        sql.push_str(&format!(
            " ORDER BY popularity DESC, id ASC LIMIT ${}",
            query_args.len()
        ));

        Ok(bind_all(sqlx::query_as::<_, Property>(&sql), query_args)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn purchase_furniture(&self, id: i64) -> Result<Furniture> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_as::<_, Furniture>(
            "SELECT * FROM furniture WHERE id = $1 AND stock > 0 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(mut item) = locked else {
            // dropping `tx` rolls back
            return Err(Error::NotFound(format!("furniture {} is not available", id)));
        };

        sqlx::query("UPDATE furniture SET stock = stock - 1 WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        item.stock -= 1;
        Ok(item)
    }

    async fn insert_furniture(&self, items: &[Tagged<Furniture>]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        macro_rules! column {
            ($field:ident) => {
                items
                    .iter()
                    .map(|i| i.record.$field.clone())
                    .collect::<Vec<_>>()
            };
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO furniture (
                id, name, description, thumbnail, price, height, width, depth, color,
                features, kind, popularity, stock, price_level, height_level, width_level,
                depth_level
             )
             SELECT * FROM UNNEST(
                $1::bigint[], $2::text[], $3::text[], $4::text[], $5::bigint[], $6::bigint[],
                $7::bigint[], $8::bigint[], $9::text[], $10::text[], $11::text[],
                $12::bigint[], $13::bigint[], $14::bigint[], $15::bigint[], $16::bigint[],
                $17::bigint[]
             )",
        )
        .bind(column!(id))
        .bind(column!(name))
        .bind(column!(description))
        .bind(column!(thumbnail))
        .bind(column!(price))
        .bind(column!(height))
        .bind(column!(width))
        .bind(column!(depth))
        .bind(column!(color))
        .bind(column!(features))
        .bind(column!(kind))
        .bind(column!(popularity))
        .bind(column!(stock))
        .bind(column!(price_level))
        .bind(column!(height_level))
        .bind(column!(width_level))
        .bind(column!(depth_level))
        .execute(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        let (item_ids, tag_ids) = tag_columns(items, |f: &Furniture| f.id);
        if !item_ids.is_empty() {
            sqlx::query(
                "INSERT INTO furniture_tag (item_id, tag_id)
                 SELECT * FROM UNNEST($1::bigint[], $2::bigint[])",
            )
            .bind(&item_ids)
            .bind(&tag_ids)
            .execute(&mut *tx)
            .await
            .map_err(map_insert_error)?;
        }

        tx.commit().await?;
        tracing::info!(rows = items.len(), tags = item_ids.len(), "Inserted furniture batch");
        Ok(())
    }

    async fn insert_properties(&self, items: &[Tagged<Property>]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        macro_rules! column {
            ($field:ident) => {
                items
                    .iter()
                    .map(|i| i.record.$field.clone())
                    .collect::<Vec<_>>()
            };
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO property (
                id, name, description, thumbnail, address, latitude, longitude, rent,
                door_height, door_width, features, popularity, rent_level, door_height_level,
                door_width_level
             )
             SELECT * FROM UNNEST(
                $1::bigint[], $2::text[], $3::text[], $4::text[], $5::text[],
                $6::double precision[], $7::double precision[], $8::bigint[], $9::bigint[],
                $10::bigint[], $11::text[], $12::bigint[], $13::bigint[], $14::bigint[],
                $15::bigint[]
             )",
        )
        .bind(column!(id))
        .bind(column!(name))
        .bind(column!(description))
        .bind(column!(thumbnail))
        .bind(column!(address))
        .bind(column!(latitude))
        .bind(column!(longitude))
        .bind(column!(rent))
        .bind(column!(door_height))
        .bind(column!(door_width))
        .bind(column!(features))
        .bind(column!(popularity))
        .bind(column!(rent_level))
        .bind(column!(door_height_level))
        .bind(column!(door_width_level))
        .execute(&mut *tx)
        .await
        .map_err(map_insert_error)?;

        let (item_ids, tag_ids) = tag_columns(items, |p: &Property| p.id);
        if !item_ids.is_empty() {
            sqlx::query(
                "INSERT INTO property_tag (item_id, tag_id)
                 SELECT * FROM UNNEST($1::bigint[], $2::bigint[])",
            )
            .bind(&item_ids)
            .bind(&tag_ids)
            .execute(&mut *tx)
            .await
            .map_err(map_insert_error)?;
        }

        tx.commit().await?;
        tracing::info!(rows = items.len(), tags = item_ids.len(), "Inserted property batch");
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        sqlx::query("TRUNCATE furniture_tag, property_tag, furniture, property")
            .execute(&self.pool)
            .await?;
        tracing::warn!("Catalog store truncated");
        Ok(())
    }
}
