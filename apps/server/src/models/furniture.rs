use super::listing::{Catalog, CategoryField, Listing, RangeAttribute};
use super::property::Property;
use serde::Serialize;

/// A furniture piece. Bucket ids are computed at ingestion and never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Furniture {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub thumbnail: String,
    pub price: i64,
    pub height: i64,
    pub width: i64,
    pub depth: i64,
    pub color: String,
    pub features: String,
    pub kind: String,
    #[serde(skip)]
    pub popularity: i64,
    #[serde(skip)]
    pub stock: i64,
    #[serde(skip)]
    pub price_level: i64,
    #[serde(skip)]
    pub height_level: i64,
    #[serde(skip)]
    pub width_level: i64,
    #[serde(skip)]
    pub depth_level: i64,
}

impl Furniture {
    /// Door sizes that let this piece through in some orientation.
    pub fn door_fit(&self) -> DoorFit {
        DoorFit::for_dimensions(self.width, self.height, self.depth)
    }
}

impl Listing for Furniture {
    const CATALOG: Catalog = Catalog::Furniture;

    fn id(&self) -> i64 {
        self.id
    }

    fn price(&self) -> i64 {
        self.price
    }

    fn popularity(&self) -> i64 {
        self.popularity
    }

    fn stock(&self) -> Option<i64> {
        Some(self.stock)
    }

    fn stock_mut(&mut self) -> Option<&mut i64> {
        Some(&mut self.stock)
    }

    fn bucket(&self, attribute: RangeAttribute) -> Option<i64> {
        match attribute {
            RangeAttribute::Price => Some(self.price_level),
            RangeAttribute::Height => Some(self.height_level),
            RangeAttribute::Width => Some(self.width_level),
            RangeAttribute::Depth => Some(self.depth_level),
            _ => None,
        }
    }

    fn category(&self, field: CategoryField) -> Option<&str> {
        match field {
            CategoryField::Kind => Some(&self.kind),
            CategoryField::Color => Some(&self.color),
        }
    }
}

/// Every ordered pair of two distinct dimensions `(across, up)` of a piece.
///
/// A door admits the piece when `door_width >= across && door_height >= up` for any pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorFit {
    pub pairs: [(i64, i64); 6],
}

impl DoorFit {
    pub fn for_dimensions(width: i64, height: i64, depth: i64) -> Self {
        let (w, h, d) = (width, height, depth);
        Self {
            pairs: [(w, h), (w, d), (h, w), (h, d), (d, w), (d, h)],
        }
    }

    pub fn admits(&self, property: &Property) -> bool {
        self.pairs
            .iter()
            .any(|&(a, b)| property.door_width >= a && property.door_height >= b)
    }
}
