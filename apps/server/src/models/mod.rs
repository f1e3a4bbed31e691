//! Catalog records and the traits the search and cache layers use over them.

pub mod furniture;
pub mod listing;
pub mod property;

pub use furniture::{DoorFit, Furniture};
pub use listing::{
    popularity_order, price_order, Catalog, CategoryField, Listing, RangeAttribute, Tagged,
};
pub use property::{GeoPoint, Property};

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn furniture(id: i64, price: i64, popularity: i64, stock: i64) -> Furniture {
        Furniture {
            id,
            name: format!("chair-{id}"),
            description: String::new(),
            thumbnail: String::new(),
            price,
            height: 100,
            width: 60,
            depth: 50,
            color: "black".into(),
            features: String::new(),
            kind: "office".into(),
            popularity,
            stock,
            price_level: 0,
            height_level: 0,
            width_level: 0,
            depth_level: 0,
        }
    }

    pub fn property(id: i64, rent: i64, popularity: i64, lat: f64, lon: f64) -> Property {
        Property {
            id,
            name: format!("estate-{id}"),
            description: String::new(),
            thumbnail: String::new(),
            address: String::new(),
            latitude: lat,
            longitude: lon,
            rent,
            door_height: 100,
            door_width: 100,
            features: String::new(),
            popularity,
            rent_level: 0,
            door_height_level: 0,
            door_width_level: 0,
        }
    }
}
