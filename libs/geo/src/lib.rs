#![forbid(unsafe_code)]
//! Planar geometry for "draw a shape on the map" searches.
//!
//! Coordinates are treated as points on a plane (latitude on the x axis, longitude on the
//! y axis). That is accurate enough for city-sized shapes, which is what the search UI lets a
//! user draw.

mod coordinate;
mod error;
mod polygon;

pub use coordinate::{BoundingBox, Coordinate};
pub use error::{Error, Result};
pub use polygon::Polygon;
