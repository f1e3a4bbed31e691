//! Request parameter parsing.
//!
//! Query strings and path segments arrive as text; anything non-numeric where a number is
//! expected is `BadInput`. Empty values are treated as absent.

use crate::{
    services::{FurnitureSearch, PropertySearch},
    Error, Result,
};
use catalog_geo::Coordinate;
use serde::Deserialize;
use validator::Validate;

pub fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| Error::BadInput(format!("invalid id '{}'", raw)))
}

fn optional_int(name: &str, raw: Option<String>) -> Result<Option<i64>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| Error::BadInput(format!("{} must be an integer, got '{}'", name, v))),
    }
}

fn required_int(name: &str, raw: Option<String>) -> Result<i64> {
    optional_int(name, raw)?.ok_or_else(|| Error::BadInput(format!("{} is required", name)))
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|v| !v.is_empty())
}

fn feature_list(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        crate::services::ingest::split_features(&v)
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChairSearchQuery {
    pub price_range_id: Option<String>,
    pub height_range_id: Option<String>,
    pub width_range_id: Option<String>,
    pub depth_range_id: Option<String>,
    pub kind: Option<String>,
    pub color: Option<String>,
    pub features: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl ChairSearchQuery {
    pub fn into_params(self) -> Result<FurnitureSearch> {
        Ok(FurnitureSearch {
            price_range_id: optional_int("priceRangeId", self.price_range_id)?,
            height_range_id: optional_int("heightRangeId", self.height_range_id)?,
            width_range_id: optional_int("widthRangeId", self.width_range_id)?,
            depth_range_id: optional_int("depthRangeId", self.depth_range_id)?,
            kind: non_empty(self.kind),
            color: non_empty(self.color),
            features: feature_list(self.features),
            page: required_int("page", self.page)?,
            per_page: required_int("perPage", self.per_page)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstateSearchQuery {
    pub door_height_range_id: Option<String>,
    pub door_width_range_id: Option<String>,
    pub rent_range_id: Option<String>,
    pub features: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl EstateSearchQuery {
    pub fn into_params(self) -> Result<PropertySearch> {
        Ok(PropertySearch {
            door_height_range_id: optional_int("doorHeightRangeId", self.door_height_range_id)?,
            door_width_range_id: optional_int("doorWidthRangeId", self.door_width_range_id)?,
            rent_range_id: optional_int("rentRangeId", self.rent_range_id)?,
            features: feature_list(self.features),
            page: required_int("page", self.page)?,
            per_page: required_int("perPage", self.per_page)?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailBody {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NazotteBody {
    pub coordinates: Vec<Coordinate>,
}
