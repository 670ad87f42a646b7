//! Intersection and containment predicates for 2D vertex-mesh geometry.
//!
//! These helpers back element division (line/edge intersection) and overlap repair
//! (point-in-polygon, closest point on an edge). Like the rest of the geometry kernel
//! they are pure functions over [`Point2`] values.

#![forbid(unsafe_code)]

use crate::geometry::point::Point2;

/// Tolerance used to reject (near-)parallel line/segment configurations.
pub const PARALLEL_TOLERANCE: f64 = 1e-12;

/// Intersection of the infinite line `origin + t * direction` with the segment `[a, b]`.
///
/// Returns the segment parameter `s ∈ [0, 1]` of the crossing (`a + s (b - a)`), or `None`
/// if the line misses the segment or runs parallel to it.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::geometry::point::Point;
/// use vertex_mesh::geometry::predicates::line_segment_intersection;
///
/// let s = line_segment_intersection(
///     Point::new([0.5, 0.5]),
///     Point::new([0.0, 1.0]),
///     Point::new([0.0, 0.0]),
///     Point::new([1.0, 0.0]),
/// );
/// assert_eq!(s, Some(0.5));
/// ```
#[must_use]
pub fn line_segment_intersection(
    origin: Point2,
    direction: Point2,
    a: Point2,
    b: Point2,
) -> Option<f64> {
    let edge = b - a;
    let denom = edge.cross(&direction);
    let scale = direction.norm() * edge.norm();
    if denom.abs() <= PARALLEL_TOLERANCE * scale {
        return None;
    }
    // origin + t d = a + s e  =>  s = ((origin - a) x d) / (e x d)
    let s = (origin - a).cross(&direction) / denom;
    (0.0..=1.0).contains(&s).then_some(s)
}

/// Closest point to `p` on the segment `[a, b]`, with its clamped segment parameter.
#[must_use]
pub fn closest_point_on_segment(p: Point2, a: Point2, b: Point2) -> (Point2, f64) {
    let edge = b - a;
    let length_squared = edge.norm_squared();
    if length_squared == 0.0 {
        return (a, 0.0);
    }
    let s = ((p - a).dot(&edge) / length_squared).clamp(0.0, 1.0);
    (a + edge * s, s)
}

/// Even-odd point-in-polygon test.
///
/// Points exactly on the boundary may be classified either way.
#[must_use]
pub fn point_in_polygon(p: Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y() > p.y()) != (pj.y() > p.y()) {
            let x_cross = (pj.x() - pi.x()) * (p.y() - pi.y()) / (pj.y() - pi.y()) + pi.x();
            if p.x() < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new([x, y])
    }

    #[test]
    fn line_hits_segment_interior() {
        let s = line_segment_intersection(p(0.0, 0.0), p(1.0, 1.0), p(2.0, 0.0), p(0.0, 2.0));
        assert_relative_eq!(s.unwrap(), 0.5);
    }

    #[test]
    fn line_missing_segment_returns_none() {
        assert!(
            line_segment_intersection(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 2.0)).is_none()
        );
    }

    #[test]
    fn parallel_line_returns_none() {
        assert!(
            line_segment_intersection(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)).is_none()
        );
    }

    #[test]
    fn closest_point_clamps_to_endpoints() {
        let (q, s) = closest_point_on_segment(p(-1.0, 1.0), p(0.0, 0.0), p(2.0, 0.0));
        assert_eq!(q, p(0.0, 0.0));
        assert_eq!(s, 0.0);

        let (q, s) = closest_point_on_segment(p(1.5, 3.0), p(0.0, 0.0), p(2.0, 0.0));
        assert_relative_eq!(q.x(), 1.5);
        assert_relative_eq!(q.y(), 0.0);
        assert_relative_eq!(s, 0.75);
    }

    #[test]
    fn point_in_convex_and_concave_polygons() {
        let square = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        assert!(point_in_polygon(p(0.5, 0.5), &square));
        assert!(!point_in_polygon(p(1.5, 0.5), &square));

        // L-shape: the notch at the top right is outside.
        let ell = [
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
        ];
        assert!(point_in_polygon(p(0.5, 1.5), &ell));
        assert!(!point_in_polygon(p(1.5, 1.5), &ell));
    }
}
