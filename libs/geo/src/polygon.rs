use crate::coordinate::{BoundingBox, Coordinate};
use crate::error::{Error, Result};

/// Closed polygon; the last vertex connects back to the first.
///
/// Containment uses the crossing-number rule. Points lying exactly on an edge or a vertex
/// (in `f64` arithmetic) are reported as **outside**, so a point shared by two adjacent
/// shapes never matches both.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Coordinate>,
    bbox: BoundingBox,
}

impl Polygon {
    pub fn new(vertices: Vec<Coordinate>) -> Result<Self> {
        if let Some((index, c)) = vertices.iter().enumerate().find(|(_, c)| !c.is_finite()) {
            return Err(Error::NonFinite {
                index,
                latitude: c.latitude,
                longitude: c.longitude,
            });
        }
        let bbox = BoundingBox::enclosing(&vertices).ok_or(Error::EmptyPolygon)?;
        Ok(Self { vertices, bbox })
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        if !self.bbox.contains(point) || self.on_boundary(point) {
            return false;
        }

        let (px, py) = (point.latitude, point.longitude);
        let mut inside = false;
        for (a, b) in self.edges() {
            let (ax, ay) = (a.latitude, a.longitude);
            let (bx, by) = (b.latitude, b.longitude);
            // Half-open on y so a ray through a vertex is counted once.
            if (ay > py) != (by > py) {
                let x_cross = (bx - ax) * (py - ay) / (by - ay) + ax;
                if px < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// True when the point lies on an edge or coincides with a vertex.
    pub fn on_boundary(&self, point: Coordinate) -> bool {
        self.edges().any(|(a, b)| on_segment(a, b, point))
    }

    fn edges(&self) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }
}

fn on_segment(a: Coordinate, b: Coordinate, p: Coordinate) -> bool {
    let cross = (b.latitude - a.latitude) * (p.longitude - a.longitude)
        - (b.longitude - a.longitude) * (p.latitude - a.latitude);
    if cross != 0.0 {
        return false;
    }
    p.latitude >= a.latitude.min(b.latitude)
        && p.latitude <= a.latitude.max(b.latitude)
        && p.longitude >= a.longitude.min(b.longitude)
        && p.longitude <= a.longitude.max(b.longitude)
}
