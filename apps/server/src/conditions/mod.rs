//! Search conditions: the bucket ranges and vocabularies each catalog is searched by.
//!
//! Loaded once at startup, either from the built-in defaults or from JSON files, and
//! immutable afterwards. The same structures are served verbatim to clients.

mod ranges;

pub use ranges::{ListCondition, Range, RangeCondition, OPEN_BOUND, UNCLASSIFIED};

use crate::config::ConditionsConfig;
use crate::error::{Error, Result};
use crate::models::{Catalog, RangeAttribute};
use anyhow::Context;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FurnitureConditions {
    pub width: RangeCondition,
    pub height: RangeCondition,
    pub depth: RangeCondition,
    pub price: RangeCondition,
    pub color: ListCondition,
    pub feature: ListCondition,
    pub kind: ListCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyConditions {
    pub door_width: RangeCondition,
    pub door_height: RangeCondition,
    pub rent: RangeCondition,
    pub feature: ListCondition,
}

impl FurnitureConditions {
    pub fn builtin() -> Self {
        Self {
            width: dimension_ranges(),
            height: dimension_ranges(),
            depth: dimension_ranges(),
            price: RangeCondition::from_cuts("", "円", &[3000, 6000, 9000, 12000, 15000]),
            color: ListCondition::new([
                "black", "white", "red", "blue", "green", "yellow", "brown", "gray", "beige",
                "pink", "purple", "orange", "navy", "ivory",
            ]),
            feature: ListCondition::new([
                "reclining",
                "armrests",
                "casters",
                "headrest",
                "footrest",
                "height-adjustable",
                "foldable",
                "stackable",
                "swivel",
                "mesh-back",
                "lumbar-support",
                "washable-cover",
                "cushioned",
                "for-kids",
                "solid-wood",
            ]),
            kind: ListCondition::new(["gaming", "office", "dining", "stool", "sofa", "bench"]),
        }
    }
}

impl PropertyConditions {
    pub fn builtin() -> Self {
        Self {
            door_width: dimension_ranges(),
            door_height: dimension_ranges(),
            rent: RangeCondition::from_cuts("", "円", &[50000, 100000, 150000]),
            feature: ListCondition::new([
                "bath-toilet-separate",
                "auto-lock",
                "balcony",
                "pets-allowed",
                "elevator",
                "parking",
                "bicycle-parking",
                "delivery-box",
                "walk-in-closet",
                "floor-heating",
                "furnished",
                "internet-included",
                "corner-room",
                "south-facing",
                "new-construction",
                "near-station",
            ]),
        }
    }
}

fn dimension_ranges() -> RangeCondition {
    RangeCondition::from_cuts("", "cm", &[80, 110, 150])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchConditions {
    pub furniture: FurnitureConditions,
    pub property: PropertyConditions,
}

impl SearchConditions {
    pub fn builtin() -> Self {
        Self {
            furniture: FurnitureConditions::builtin(),
            property: PropertyConditions::builtin(),
        }
    }

    /// Load from the configured JSON files, falling back to built-ins per catalog.
    pub fn load(config: &ConditionsConfig) -> anyhow::Result<Self> {
        let furniture = match &config.furniture_path {
            Some(path) => read_json::<FurnitureConditions>(path)?,
            None => FurnitureConditions::builtin(),
        };
        let property = match &config.property_path {
            Some(path) => read_json::<PropertyConditions>(path)?,
            None => PropertyConditions::builtin(),
        };
        let conditions = Self {
            furniture,
            property,
        };
        conditions.validate().map_err(|e| anyhow::anyhow!(e))?;
        tracing::info!(
            furniture_custom = config.furniture_path.is_some(),
            property_custom = config.property_path.is_some(),
            "Loaded search conditions"
        );
        Ok(conditions)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        let attributes = [
            RangeAttribute::Price,
            RangeAttribute::Height,
            RangeAttribute::Width,
            RangeAttribute::Depth,
            RangeAttribute::Rent,
            RangeAttribute::DoorHeight,
            RangeAttribute::DoorWidth,
        ];
        for attribute in attributes {
            self.range(attribute).validate().map_err(|e| {
                format!(
                    "{} {}: {}",
                    attribute.catalog().as_str(),
                    attribute.as_str(),
                    e
                )
            })?;
        }
        Ok(())
    }

    pub fn range(&self, attribute: RangeAttribute) -> &RangeCondition {
        match attribute {
            RangeAttribute::Price => &self.furniture.price,
            RangeAttribute::Height => &self.furniture.height,
            RangeAttribute::Width => &self.furniture.width,
            RangeAttribute::Depth => &self.furniture.depth,
            RangeAttribute::Rent => &self.property.rent,
            RangeAttribute::DoorHeight => &self.property.door_height,
            RangeAttribute::DoorWidth => &self.property.door_width,
        }
    }

    pub fn classify(&self, attribute: RangeAttribute, value: i64) -> i64 {
        self.range(attribute).classify(value)
    }

    pub fn features(&self, catalog: Catalog) -> &ListCondition {
        match catalog {
            Catalog::Furniture => &self.furniture.feature,
            Catalog::Property => &self.property.feature,
        }
    }

    /// Map feature names to tag ids, sorted and deduplicated.
    pub fn tag_ids<S: AsRef<str>>(&self, catalog: Catalog, names: &[S]) -> Result<Vec<i64>> {
        let vocabulary = self.features(catalog);
        let mut ids = names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                vocabulary.position(name).ok_or_else(|| {
                    Error::BadInput(format!("unknown {} feature '{}'", catalog.as_str(), name))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read conditions file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse conditions file {}", path.display()))
}
