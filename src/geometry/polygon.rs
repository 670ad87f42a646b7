//! Geometric measures of simple polygons given as ordered node loops.
//!
//! Every function in this module is pure: it reads an ordered, cyclic slice of
//! [`Point2`] locations and returns a measure. Loops are expected to be simple
//! (non-self-intersecting) with at least three distinct vertices; degenerate input is a
//! caller precondition and is not checked here.
//!
//! # Orientation
//!
//! [`signed_area`] is positive for counter-clockwise loops. The moment functions
//! normalise by the orientation so that a loop and its reverse give the same
//! [`SecondMoments`]. The gradient functions assume the counter-clockwise convention
//! used by vertex meshes.
//!
//! # Examples
//!
//! ```rust
//! use vertex_mesh::geometry::point::Point;
//! use vertex_mesh::geometry::polygon::{centroid, perimeter, signed_area};
//!
//! let square = [
//!     Point::new([0.0, 0.0]),
//!     Point::new([1.0, 0.0]),
//!     Point::new([1.0, 1.0]),
//!     Point::new([0.0, 1.0]),
//! ];
//! assert_eq!(signed_area(&square), 1.0);
//! assert_eq!(perimeter(&square), 4.0);
//! assert_eq!(centroid(&square).coords(), &[0.5, 0.5]);
//! ```

#![forbid(unsafe_code)]

use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

use crate::geometry::point::Point2;

/// Relative tolerance below which the two principal moments are treated as equal.
pub const ISOTROPY_TOLERANCE: f64 = 1e-10;

/// Iterate over `(current, next)` pairs of a cyclic loop.
#[inline]
fn cyclic_pairs(points: &[Point2]) -> impl Iterator<Item = (&Point2, &Point2)> {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .take(points.len())
}

/// Signed area of a polygon by the shoelace formula.
///
/// Positive for counter-clockwise loops, negative for clockwise loops.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    0.5 * cyclic_pairs(points).map(|(p, q)| p.cross(q)).sum::<f64>()
}

/// Sum of the lengths of the loop's edges, including the closing edge.
#[must_use]
pub fn perimeter(points: &[Point2]) -> f64 {
    cyclic_pairs(points).map(|(p, q)| p.distance(q)).sum()
}

/// Lengths of each edge `(i, i + 1)` of the loop, in loop order.
#[must_use]
pub fn edge_lengths(points: &[Point2]) -> Vec<f64> {
    cyclic_pairs(points).map(|(p, q)| p.distance(q)).collect()
}

/// Area-weighted centroid of a polygon.
///
/// This is the centre of mass of the enclosed region, not the average of the vertex
/// locations; the two differ for irregular polygons.
///
/// The formula is evaluated relative to the first vertex to limit cancellation for
/// polygons far from the origin.
#[must_use]
pub fn centroid(points: &[Point2]) -> Point2 {
    let Some(&origin) = points.first() else {
        return Point2::origin();
    };
    let mut twice_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (p, q) in cyclic_pairs(points) {
        let p = *p - origin;
        let q = *q - origin;
        let cross = p.cross(&q);
        twice_area += cross;
        cx += (p.x() + q.x()) * cross;
        cy += (p.y() + q.y()) * cross;
    }
    let scale = (3.0 * twice_area).recip();
    origin + Point2::new([cx * scale, cy * scale])
}

/// Second moments of area of a polygon about its centroid.
///
/// `ixx = ∫ y² dA`, `iyy = ∫ x² dA` and `ixy = ∫ x y dA`, with coordinates measured
/// from the centroid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecondMoments {
    /// Moment about the x-axis, `∫ y² dA`.
    pub ixx: f64,
    /// Moment about the y-axis, `∫ x² dA`.
    pub iyy: f64,
    /// Product moment, `∫ x y dA`.
    pub ixy: f64,
}

impl SecondMoments {
    /// The inertia tensor `[[ixx, -ixy], [-ixy, iyy]]`.
    #[must_use]
    pub fn inertia_tensor(&self) -> Matrix2<f64> {
        Matrix2::new(self.ixx, -self.ixy, -self.ixy, self.iyy)
    }

    /// Principal values `(largest, smallest)` of the inertia tensor.
    #[must_use]
    pub fn principal_values(&self) -> (f64, f64) {
        let mean = 0.5 * (self.ixx + self.iyy);
        let radius = (0.5 * (self.ixx - self.iyy)).hypot(self.ixy);
        (mean + radius, mean - radius)
    }

    /// Returns `true` when both principal values coincide (within
    /// [`ISOTROPY_TOLERANCE`] relative to their sum), so no axis is preferred.
    #[must_use]
    pub fn is_isotropic(&self) -> bool {
        let (major, minor) = self.principal_values();
        (major - minor).abs() <= ISOTROPY_TOLERANCE * (major + minor).abs()
    }
}

/// Second moments of area about the centroid, independent of loop orientation.
#[must_use]
pub fn second_moments(points: &[Point2]) -> SecondMoments {
    let c = centroid(points);
    let mut ixx = 0.0;
    let mut iyy = 0.0;
    let mut ixy = 0.0;
    for (p, q) in cyclic_pairs(points) {
        let p = *p - c;
        let q = *q - c;
        let cross = p.cross(&q);
        ixx += cross * (p.y() * p.y() + p.y() * q.y() + q.y() * q.y());
        iyy += cross * (p.x() * p.x() + p.x() * q.x() + q.x() * q.x());
        ixy += cross * (p.x() * q.y() + 2.0 * p.x() * p.y() + 2.0 * q.x() * q.y() + q.x() * p.y());
    }
    let sign = if signed_area(points) < 0.0 { -1.0 } else { 1.0 };
    SecondMoments {
        ixx: sign * ixx / 12.0,
        iyy: sign * iyy / 12.0,
        ixy: sign * ixy / 24.0,
    }
}

/// Unit short axis of a polygon with the given moments.
///
/// The short axis is the eigenvector of the inertia tensor belonging to its larger
/// eigenvalue; it is perpendicular to the long axis along which the polygon extends.
/// Returns `None` for an isotropic polygon (for example a square or a regular hexagon),
/// where every direction is a principal direction; callers pick a fallback.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::geometry::point::Point;
/// use vertex_mesh::geometry::polygon::{principal_short_axis, second_moments};
///
/// // A 2 x 1 rectangle is long in x, so its short axis is along y.
/// let rectangle = [
///     Point::new([0.0, 0.0]),
///     Point::new([2.0, 0.0]),
///     Point::new([2.0, 1.0]),
///     Point::new([0.0, 1.0]),
/// ];
/// let axis = principal_short_axis(&second_moments(&rectangle)).unwrap();
/// assert!(axis.x().abs() < 1e-12);
/// assert!((axis.y().abs() - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn principal_short_axis(moments: &SecondMoments) -> Option<Point2> {
    if moments.is_isotropic() {
        return None;
    }
    let eigen = moments.inertia_tensor().symmetric_eigen();
    let major = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
        0
    } else {
        1
    };
    let v = eigen.eigenvectors.column(major);
    Point2::new([v[0], v[1]]).normalized()
}

/// Elongation shape factor `sqrt(λ_max / λ_min)` of the inertia tensor.
///
/// Equal to 1 for isotropic polygons and grows as the polygon is stretched.
#[must_use]
pub fn elongation_shape_factor(moments: &SecondMoments) -> f64 {
    let (major, minor) = moments.principal_values();
    (major / minor).sqrt()
}

/// Gradient of the signed area with respect to the location of loop vertex `i`.
///
/// # Panics
///
/// Panics if `i` is out of bounds.
#[must_use]
pub fn area_gradient(points: &[Point2], i: usize) -> Point2 {
    let n = points.len();
    let prev = points[(i + n - 1) % n];
    let next = points[(i + 1) % n];
    Point2::new([0.5 * (next.y() - prev.y()), 0.5 * (prev.x() - next.x())])
}

/// Gradient of the perimeter with respect to the location of loop vertex `i`.
///
/// This is the sum of the unit vectors pointing into vertex `i` along its two edges.
///
/// # Panics
///
/// Panics if `i` is out of bounds.
#[must_use]
pub fn perimeter_gradient(points: &[Point2], i: usize) -> Point2 {
    let n = points.len();
    let here = points[i];
    let prev = points[(i + n - 1) % n];
    let next = points[(i + 1) % n];
    let from_prev = (here - prev).normalized().unwrap_or_default();
    let from_next = (here - next).normalized().unwrap_or_default();
    from_prev + from_next
}
