use serde::{Deserialize, Serialize};

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Closed, axis-aligned rectangle.
///
/// `min` holds the smallest latitude and longitude seen, `max` the largest. Both edges are
/// inclusive, so a box built from a polygon's vertices is a superset of the polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl BoundingBox {
    /// Smallest box enclosing every coordinate, or `None` for an empty slice.
    pub fn enclosing(coordinates: &[Coordinate]) -> Option<Self> {
        let (first, rest) = coordinates.split_first()?;
        let mut bbox = Self {
            min: *first,
            max: *first,
        };
        for c in rest {
            bbox.min.latitude = bbox.min.latitude.min(c.latitude);
            bbox.min.longitude = bbox.min.longitude.min(c.longitude);
            bbox.max.latitude = bbox.max.latitude.max(c.latitude);
            bbox.max.longitude = bbox.max.longitude.max(c.longitude);
        }
        Some(bbox)
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point.latitude >= self.min.latitude
            && point.latitude <= self.max.latitude
            && point.longitude >= self.min.longitude
            && point.longitude <= self.max.longitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enclosing_tracks_extremes_independently() {
        let bbox = BoundingBox::enclosing(&[
            Coordinate::new(35.5, 139.9),
            Coordinate::new(35.9, 139.2),
            Coordinate::new(35.7, 139.6),
        ])
        .unwrap();

        assert_eq!(bbox.min, Coordinate::new(35.5, 139.2));
        assert_eq!(bbox.max, Coordinate::new(35.9, 139.9));
    }

    #[test]
    fn enclosing_empty_is_none() {
        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn contains_is_inclusive_on_every_edge() {
        let bbox =
            BoundingBox::enclosing(&[Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 10.0)])
                .unwrap();

        assert!(bbox.contains(Coordinate::new(0.0, 0.0)));
        assert!(bbox.contains(Coordinate::new(10.0, 10.0)));
        assert!(bbox.contains(Coordinate::new(0.0, 7.5)));
        assert!(!bbox.contains(Coordinate::new(10.000001, 5.0)));
        assert!(!bbox.contains(Coordinate::new(5.0, -0.1)));
    }

    #[test]
    fn coordinate_deserializes_from_request_shape() {
        let c: Coordinate =
            serde_json::from_str(r#"{"latitude": 35.6, "longitude": 139.7}"#).unwrap();
        assert_eq!(c, Coordinate::new(35.6, 139.7));
    }
}
