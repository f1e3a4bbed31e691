mod support;

use catalog_geo::Coordinate;
use catalog_server::{
    services::{FurnitureSearch, PropertySearch},
    Error,
};
use std::collections::BTreeSet;
use support::fixtures::{to_csv, FurnitureRow, PropertyRow};
use support::postgres::with_pg_app;

#[tokio::test]
async fn concurrent_buyers_of_the_last_unit() -> anyhow::Result<()> {
    with_pg_app(|app| {
        Box::pin(async move {
            app.ingest_furniture(&[FurnitureRow::new(7).stock(1)]).await?;

            let buyers: Vec<_> = (0..16)
                .map(|_| {
                    let catalog = app.state.catalog.clone();
                    tokio::spawn(async move { catalog.purchase_furniture(7).await })
                })
                .collect();

            let mut sold = 0;
            let mut refused = 0;
            for outcome in futures::future::join_all(buyers).await {
                match outcome? {
                    Ok(item) => {
                        assert_eq!(item.stock, 0);
                        sold += 1;
                    }
                    Err(Error::NotFound(_)) => refused += 1,
                    Err(e) => return Err(e.into()),
                }
            }

            assert_eq!(sold, 1);
            assert_eq!(refused, 15);
            assert_eq!(app.stock_of(7).await?, Some(0));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn feature_filter_requires_every_requested_tag() -> anyhow::Result<()> {
    with_pg_app(|app| {
        Box::pin(async move {
            app.ingest_furniture(&[
                FurnitureRow::new(1).features("reclining,armrests,casters"),
                FurnitureRow::new(2).features("armrests"),
            ])
            .await?;

            let search = |features: &[&str]| FurnitureSearch {
                features: features.iter().map(|f| f.to_string()).collect(),
                page: 0,
                per_page: 20,
                ..Default::default()
            };

            let page = app
                .state
                .catalog
                .search_furniture(&search(&["reclining", "armrests"]))
                .await?;
            assert_eq!(page.count, 1);
            assert_eq!(page.items.iter().map(|f| f.id).collect::<Vec<_>>(), vec![1]);

            let page = app
                .state
                .catalog
                .search_furniture(&search(&["reclining", "headrest"]))
                .await?;
            assert_eq!(page.count, 0);
            assert!(page.items.is_empty());
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn property_pages_are_disjoint_and_share_the_total() -> anyhow::Result<()> {
    with_pg_app(|app| {
        Box::pin(async move {
            let rows: Vec<PropertyRow> = (1..=25)
                .map(|id| PropertyRow::new(id).features("balcony").popularity(id % 7))
                .collect();
            app.ingest_properties(&rows).await?;

            let search = |page| PropertySearch {
                features: vec!["balcony".into()],
                page,
                per_page: 20,
                ..Default::default()
            };
            let first = app.state.catalog.search_properties(&search(0)).await?;
            let second = app.state.catalog.search_properties(&search(1)).await?;

            assert_eq!((first.count, first.items.len()), (25, 20));
            assert_eq!((second.count, second.items.len()), (25, 5));

            let mut ordered = first.items.clone();
            ordered.extend(second.items.clone());
            let all: BTreeSet<i64> = ordered.iter().map(|p| p.id).collect();
            assert_eq!(all, (1..=25).collect::<BTreeSet<i64>>());
            for pair in ordered.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                assert!(
                    a.popularity > b.popularity || (a.popularity == b.popularity && a.id < b.id),
                    "{} before {} breaks popularity order",
                    a.id,
                    b.id
                );
            }
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn duplicate_id_batch_writes_nothing() -> anyhow::Result<()> {
    with_pg_app(|app| {
        Box::pin(async move {
            app.ingest_furniture(&[FurnitureRow::new(10)]).await?;

            let batch = to_csv(&[
                FurnitureRow::new(12).features("casters"),
                FurnitureRow::new(10),
            ]);
            let result = app.state.ingest.ingest_furniture(batch.as_bytes()).await;
            assert!(matches!(result, Err(Error::Ingest(_))), "{result:?}");

            assert_eq!(app.stock_of(12).await?, None);
            let tags: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM furniture_tag WHERE item_id = $1")
                    .bind(12_i64)
                    .fetch_one(app.store.pool())
                    .await?;
            assert_eq!(tags, 0);
            assert_eq!(app.stock_of(10).await?, Some(10));
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn polygon_search_reads_points_from_the_table() -> anyhow::Result<()> {
    with_pg_app(|app| {
        Box::pin(async move {
            app.ingest_properties(&[
                PropertyRow::new(1).at(35.5, 139.5).popularity(1),
                PropertyRow::new(2).at(35.6, 139.6).popularity(5),
                PropertyRow::new(3).at(36.0, 140.0),
                PropertyRow::new(4).at(40.0, 145.0).popularity(9),
            ])
            .await?;

            let page = app
                .state
                .polygon
                .search(vec![
                    Coordinate::new(35.0, 139.0),
                    Coordinate::new(35.0, 140.0),
                    Coordinate::new(36.0, 140.0),
                    Coordinate::new(36.0, 139.0),
                ])
                .await?;

            // 3 sits on a corner: inside the bounding box, outside the polygon
            assert_eq!(page.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 1]);
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn reset_truncates_catalogs_and_caches() -> anyhow::Result<()> {
    with_pg_app(|app| {
        Box::pin(async move {
            app.ingest_furniture(&[FurnitureRow::new(1).price(100), FurnitureRow::new(2)])
                .await?;
            let cheapest = app.state.catalog.low_priced_furniture().await?;
            assert_eq!(cheapest.iter().map(|f| f.id).collect::<Vec<_>>(), vec![1, 2]);

            app.state.ingest.reset().await?;

            assert!(app.state.caches.furniture.current().is_none());
            assert!(app.state.catalog.low_priced_furniture().await?.is_empty());
            assert_eq!(app.stock_of(1).await?, None);

            app.ingest_furniture(&[FurnitureRow::new(1)]).await?;
            assert_eq!(app.stock_of(1).await?, Some(10));
            Ok(())
        })
    })
    .await
}
