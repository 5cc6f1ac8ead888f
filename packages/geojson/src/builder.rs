//! Geometry construction from raw coordinates.
//!
//! No minimum vertex count is enforced here: an empty or single-vertex ring
//! yields a degenerate polygon. Callers that care apply
//! [`DegeneratePolicy`](geoint_feature_models::DegeneratePolicy).

use geoint_feature_models::{Coordinate, Geometry, Polygon};

/// Builds a point geometry.
#[must_use]
pub const fn build_point(x: f64, y: f64) -> Geometry {
    Geometry::point(x, y)
}

/// Builds a polygon geometry from an exterior ring, closing it if needed.
#[must_use]
pub fn build_polygon(ring: Vec<Coordinate>) -> Geometry {
    Geometry::Polygon(polygon_from_ring(ring))
}

/// Closes `ring` and wraps it as a [`Polygon`].
#[must_use]
pub fn polygon_from_ring(ring: Vec<Coordinate>) -> Polygon {
    Polygon::from_closed_ring(close_ring(ring))
}

/// Repeats the first vertex at the end unless the ring is already closed.
///
/// `GeoJSON` requires closed rings but plenty of producers omit the last
/// vertex.
#[must_use]
pub fn close_ring(mut ring: Vec<Coordinate>) -> Vec<Coordinate> {
    if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}
