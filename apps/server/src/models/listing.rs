//! Shared shape of the two catalogs: identity, ordering keys, buckets and stock.

use serde::Serialize;
use std::cmp::Ordering;

/// The two searchable catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Catalog {
    Furniture,
    Property,
}

impl Catalog {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Furniture => "furniture",
            Self::Property => "property",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Self::Furniture => "furniture",
            Self::Property => "property",
        }
    }

    /// Normalized item -> tag table used for tag-intersection searches.
    pub fn tag_table(&self) -> &'static str {
        match self {
            Self::Furniture => "furniture_tag",
            Self::Property => "property_tag",
        }
    }

    pub fn price_column(&self) -> &'static str {
        match self {
            Self::Furniture => "price",
            Self::Property => "rent",
        }
    }

    /// Furniture is only listable while in stock; properties are always listable.
    pub fn requires_stock(&self) -> bool {
        matches!(self, Self::Furniture)
    }
}

/// Numeric attribute classified into buckets at ingestion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeAttribute {
    Price,
    Height,
    Width,
    Depth,
    Rent,
    DoorHeight,
    DoorWidth,
}

impl RangeAttribute {
    pub fn catalog(&self) -> Catalog {
        match self {
            Self::Price | Self::Height | Self::Width | Self::Depth => Catalog::Furniture,
            Self::Rent | Self::DoorHeight | Self::DoorWidth => Catalog::Property,
        }
    }

    pub fn level_column(&self) -> &'static str {
        match self {
            Self::Price => "price_level",
            Self::Height => "height_level",
            Self::Width => "width_level",
            Self::Depth => "depth_level",
            Self::Rent => "rent_level",
            Self::DoorHeight => "door_height_level",
            Self::DoorWidth => "door_width_level",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Height => "height",
            Self::Width => "width",
            Self::Depth => "depth",
            Self::Rent => "rent",
            Self::DoorHeight => "doorHeight",
            Self::DoorWidth => "doorWidth",
        }
    }
}

/// Categorical field filtered by plain equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryField {
    Kind,
    Color,
}

impl CategoryField {
    pub fn catalog(&self) -> Catalog {
        Catalog::Furniture
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::Color => "color",
        }
    }
}

/// A record of either catalog, as seen by the search and cache layers.
pub trait Listing: Clone + Send + Sync + 'static {
    const CATALOG: Catalog;

    fn id(&self) -> i64;

    /// Price or rent; the low-price snapshot key.
    fn price(&self) -> i64;

    fn popularity(&self) -> i64;

    /// Remaining units, `None` for catalogs without a stock concept.
    fn stock(&self) -> Option<i64>;

    fn stock_mut(&mut self) -> Option<&mut i64>;

    /// Stored bucket id, `None` when the attribute belongs to the other catalog.
    fn bucket(&self, attribute: RangeAttribute) -> Option<i64>;

    fn category(&self, field: CategoryField) -> Option<&str>;

    fn is_available(&self) -> bool {
        self.stock().map_or(true, |s| s > 0)
    }
}

/// Listing order: popularity descending, id ascending.
pub fn popularity_order<T: Listing>(a: &T, b: &T) -> Ordering {
    b.popularity()
        .cmp(&a.popularity())
        .then_with(|| a.id().cmp(&b.id()))
}

/// Low-price order: price ascending, id ascending.
pub fn price_order<T: Listing>(a: &T, b: &T) -> Ordering {
    a.price().cmp(&b.price()).then_with(|| a.id().cmp(&b.id()))
}

/// A record together with its resolved tag ids, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    pub record: T,
    pub tag_ids: Vec<i64>,
}
