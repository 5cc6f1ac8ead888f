//! WGS84 geometry values.

use geo::BoundingRect;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A longitude/latitude pair in WGS84.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude.
    pub x: f64,
    /// Latitude.
    pub y: f64,
}

impl Coordinate {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Coordinate> for geo::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        Self { x: c.x, y: c.y }
    }
}

/// An axis-aligned WGS84 rectangle, used as a spatial filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western edge (minimum longitude).
    pub min_x: f64,
    /// Southern edge (minimum latitude).
    pub min_y: f64,
    /// Eastern edge (maximum longitude).
    pub max_x: f64,
    /// Northern edge (maximum latitude).
    pub max_y: f64,
}

impl BoundingBox {
    /// Creates a bounding box from its edges.
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Whether the box covers no area (or holds non-finite edges).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let edges = [self.min_x, self.min_y, self.max_x, self.max_y];
        edges.iter().any(|v| !v.is_finite()) || self.max_x <= self.min_x || self.max_y <= self.min_y
    }

    /// Whether every edge of `other` lies within `tolerance` degrees of ours.
    #[must_use]
    pub fn equals_with_tolerance(&self, other: &Self, tolerance: f64) -> bool {
        (self.min_x - other.min_x).abs() <= tolerance
            && (self.min_y - other.min_y).abs() <= tolerance
            && (self.max_x - other.max_x).abs() <= tolerance
            && (self.max_y - other.max_y).abs() <= tolerance
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            f64::midpoint(self.min_x, self.max_x),
            f64::midpoint(self.min_y, self.max_y),
        )
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = String;

    /// Parses `min_x,min_y,max_x,max_y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid bounding box '{s}': {e}"))?;

        match parts.as_slice() {
            [min_x, min_y, max_x, max_y] => Ok(Self::new(*min_x, *min_y, *max_x, *max_y)),
            _ => Err(format!(
                "invalid bounding box '{s}': expected min_x,min_y,max_x,max_y"
            )),
        }
    }
}

/// Geometry type discriminant, used for bucket routing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
pub enum GeometryKind {
    /// A single location.
    Point,
    /// An area bounded by one exterior ring.
    Polygon,
}

/// A polygon reduced to its exterior ring.
///
/// Interior rings are discarded when the polygon is parsed. The ring is
/// closed (first vertex repeated last) unless it has fewer than two vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    exterior: Vec<Coordinate>,
}

impl Polygon {
    /// Wraps an already-closed exterior ring.
    ///
    /// Use the geometry builder to close rings that may be open.
    #[must_use]
    pub const fn from_closed_ring(exterior: Vec<Coordinate>) -> Self {
        Self { exterior }
    }

    /// The exterior ring vertices, including the closing vertex.
    #[must_use]
    pub fn boundary(&self) -> &[Coordinate] {
        &self.exterior
    }

    /// Whether the ring is too short to bound an area.
    ///
    /// A closed triangle needs four vertices.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.exterior.len() < 4
    }
}

/// A WGS84 geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// A single location.
    Point(Coordinate),
    /// An area.
    Polygon(Polygon),
}

impl Geometry {
    /// Shorthand for a point geometry.
    #[must_use]
    pub const fn point(x: f64, y: f64) -> Self {
        Self::Point(Coordinate::new(x, y))
    }

    /// Returns the geometry's kind.
    #[must_use]
    pub const fn kind(&self) -> GeometryKind {
        match self {
            Self::Point(_) => GeometryKind::Point,
            Self::Polygon(_) => GeometryKind::Polygon,
        }
    }

    /// Bounding box of the geometry, or `None` for an empty polygon.
    ///
    /// A point yields a zero-area box.
    #[must_use]
    pub fn extent(&self) -> Option<BoundingBox> {
        geo::Geometry::from(self).bounding_rect().map(|rect| {
            BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
        })
    }
}

impl From<&Geometry> for geo::Geometry<f64> {
    fn from(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Point(c) => Self::Point(geo::Point::new(c.x, c.y)),
            Geometry::Polygon(polygon) => {
                let ring: Vec<geo::Coord<f64>> =
                    polygon.boundary().iter().copied().map(Into::into).collect();
                Self::Polygon(geo::Polygon::new(geo::LineString::new(ring), vec![]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::from_closed_ring(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(2.0, 0.0),
            Coordinate::new(2.0, 1.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ])
    }

    #[test]
    fn polygon_extent() {
        let extent = Geometry::Polygon(square()).extent().unwrap();
        assert_eq!(extent, BoundingBox::new(0.0, 0.0, 2.0, 1.0));
        assert_eq!(extent.center(), Coordinate::new(1.0, 0.5));
    }

    #[test]
    fn point_extent_is_zero_area() {
        let extent = Geometry::point(10.0, 20.0).extent().unwrap();
        assert_eq!(extent, BoundingBox::new(10.0, 20.0, 10.0, 20.0));
        assert!(extent.is_empty());
    }

    #[test]
    fn empty_polygon_has_no_extent() {
        let empty = Geometry::Polygon(Polygon::from_closed_ring(vec![]));
        assert!(empty.extent().is_none());
        assert_eq!(empty.kind(), GeometryKind::Polygon);
    }

    #[test]
    fn degenerate_detection() {
        assert!(!square().is_degenerate());
        let line = Polygon::from_closed_ring(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ]);
        assert!(line.is_degenerate());
    }

    #[test]
    fn bbox_tolerance() {
        let a = BoundingBox::new(7.0, 50.0, 7.2, 50.1);
        let b = BoundingBox::new(7.005, 50.004, 7.199, 50.1);
        let c = BoundingBox::new(7.05, 50.0, 7.2, 50.1);
        assert!(a.equals_with_tolerance(&b, 0.01));
        assert!(!a.equals_with_tolerance(&c, 0.01));
    }

    #[test]
    fn bbox_emptiness() {
        assert!(!BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_empty());
        assert!(BoundingBox::new(1.0, 0.0, 0.0, 1.0).is_empty());
        assert!(BoundingBox::new(0.0, 0.0, f64::NAN, 1.0).is_empty());
    }

    #[test]
    fn parses_bbox() {
        let bbox: BoundingBox = "7.0, 50.0, 7.2, 50.1".parse().unwrap();
        assert_eq!(bbox, BoundingBox::new(7.0, 50.0, 7.2, 50.1));
        assert!("7.0,50.0".parse::<BoundingBox>().is_err());
        assert!("a,b,c,d".parse::<BoundingBox>().is_err());
    }

    #[test]
    fn geometry_kind_display() {
        assert_eq!(GeometryKind::Point.to_string(), "Point");
        assert_eq!("Polygon".parse::<GeometryKind>().unwrap(), GeometryKind::Polygon);
    }
}
