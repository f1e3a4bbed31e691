use super::listing::{Catalog, CategoryField, Listing, RangeAttribute};
use catalog_geo::Coordinate;
use serde::Serialize;

/// A rental property. Always listable: there is no stock.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub thumbnail: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rent: i64,
    pub door_height: i64,
    pub door_width: i64,
    pub features: String,
    #[serde(skip)]
    pub popularity: i64,
    #[serde(skip)]
    pub rent_level: i64,
    #[serde(skip)]
    pub door_height_level: i64,
    #[serde(skip)]
    pub door_width_level: i64,
}

impl Property {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            id: self.id,
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

impl Listing for Property {
    const CATALOG: Catalog = Catalog::Property;

    fn id(&self) -> i64 {
        self.id
    }

    fn price(&self) -> i64 {
        self.rent
    }

    fn popularity(&self) -> i64 {
        self.popularity
    }

    fn stock(&self) -> Option<i64> {
        None
    }

    fn stock_mut(&mut self) -> Option<&mut i64> {
        None
    }

    fn bucket(&self, attribute: RangeAttribute) -> Option<i64> {
        match attribute {
            RangeAttribute::Rent => Some(self.rent_level),
            RangeAttribute::DoorHeight => Some(self.door_height_level),
            RangeAttribute::DoorWidth => Some(self.door_width_level),
            _ => None,
        }
    }

    fn category(&self, _field: CategoryField) -> Option<&str> {
        None
    }
}

/// Minimal projection used for bounding-box prefiltering. Coordinates never change after
/// a property is created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, sqlx::FromRow)]
pub struct GeoPoint {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
