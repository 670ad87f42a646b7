//! Node locations in D-dimensional Euclidean space.
//!
//! [`Point`] is a thin, `Copy` wrapper around a `[f64; D]` coordinate array with the
//! handful of vector operations the mesh engine needs (differences, scaling, norms,
//! midpoints). Vertex meshes in this crate are two-dimensional, so most call sites use
//! `Point<2>`, but the type itself is dimension-generic.
//!
//! # Serialization
//!
//! Points serialize as a fixed-length tuple of coordinates. Non-finite coordinates are
//! written as `null` for JSON compatibility and read back as `NaN`.

#![forbid(unsafe_code)]

use serde::de::{Error, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

// =============================================================================
// POINT STRUCT DEFINITION
// =============================================================================

/// A location in D-dimensional space with `f64` coordinates.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::geometry::point::Point;
///
/// let a = Point::new([0.0, 0.0]);
/// let b = Point::new([3.0, 4.0]);
/// assert_eq!(a.distance(&b), 5.0);
/// assert_eq!(a.midpoint(&b).coords(), &[1.5, 2.0]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<const D: usize> {
    coords: [f64; D],
}

/// Two-dimensional point, the location type of every vertex mesh node.
pub type Point2 = Point<2>;

// =============================================================================
// PUBLIC API
// =============================================================================

impl<const D: usize> Point<D> {
    /// Creates a point from its coordinates.
    #[inline]
    #[must_use]
    pub const fn new(coords: [f64; D]) -> Self {
        Self { coords }
    }

    /// The origin.
    #[inline]
    #[must_use]
    pub const fn origin() -> Self {
        Self { coords: [0.0; D] }
    }

    /// Borrow the coordinate array.
    #[inline]
    #[must_use]
    pub const fn coords(&self) -> &[f64; D] {
        &self.coords
    }

    /// Coordinate `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= D`.
    #[inline]
    #[must_use]
    pub const fn coord(&self, i: usize) -> f64 {
        self.coords[i]
    }

    /// Dot product with another point treated as a vector.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Squared Euclidean norm.
    #[inline]
    #[must_use]
    pub fn norm_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm.
    #[inline]
    #[must_use]
    pub fn norm(&self) -> f64 {
        if D == 2 {
            self.coords[0].hypot(self.coords[1])
        } else {
            self.norm_squared().sqrt()
        }
    }

    /// Euclidean distance between two points.
    #[inline]
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (*other - *self).norm()
    }

    /// Midpoint of the segment joining two points.
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        (*self + *other) * 0.5
    }

    /// Unit vector in the direction of `self`, or `None` for a zero-length vector.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        let norm = self.norm();
        (norm > 0.0 && norm.is_finite()).then(|| *self * norm.recip())
    }

    /// Returns `true` if every coordinate is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.coords.iter().all(|c| c.is_finite())
    }
}

impl Point<2> {
    /// The vector rotated a quarter turn counter-clockwise: `(x, y) -> (-y, x)`.
    #[inline]
    #[must_use]
    pub const fn perpendicular(&self) -> Self {
        Self::new([-self.coords[1], self.coords[0]])
    }

    /// z-component of the 2D cross product `self × other`.
    #[inline]
    #[must_use]
    pub const fn cross(&self, other: &Self) -> f64 {
        self.coords[0] * other.coords[1] - self.coords[1] * other.coords[0]
    }

    /// x-coordinate.
    #[inline]
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.coords[0]
    }

    /// y-coordinate.
    #[inline]
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.coords[1]
    }
}

impl<const D: usize> Default for Point<D> {
    fn default() -> Self {
        Self::origin()
    }
}

impl<const D: usize> From<[f64; D]> for Point<D> {
    #[inline]
    fn from(coords: [f64; D]) -> Self {
        Self::new(coords)
    }
}

impl<const D: usize> From<Point<D>> for [f64; D] {
    #[inline]
    fn from(point: Point<D>) -> Self {
        point.coords
    }
}

// =============================================================================
// ARITHMETIC
// =============================================================================

impl<const D: usize> Add for Point<D> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<const D: usize> AddAssign for Point<D> {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.coords.iter_mut().zip(rhs.coords) {
            *a += b;
        }
    }
}

impl<const D: usize> Sub for Point<D> {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        for (a, b) in self.coords.iter_mut().zip(rhs.coords) {
            *a -= b;
        }
        self
    }
}

impl<const D: usize> Mul<f64> for Point<D> {
    type Output = Self;

    fn mul(mut self, rhs: f64) -> Self {
        for a in &mut self.coords {
            *a *= rhs;
        }
        self
    }
}

impl<const D: usize> Neg for Point<D> {
    type Output = Self;

    fn neg(self) -> Self {
        self * -1.0
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

impl<const D: usize> Serialize for Point<D> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tuple = serializer.serialize_tuple(D)?;
        for coord in &self.coords {
            if coord.is_finite() {
                tuple.serialize_element(coord)?;
            } else {
                // JSON has no NaN/Infinity literals
                tuple.serialize_element(&Option::<f64>::None)?;
            }
        }
        tuple.end()
    }
}

impl<'de, const D: usize> Deserialize<'de> for Point<D> {
    fn deserialize<DE>(deserializer: DE) -> Result<Self, DE::Error>
    where
        DE: serde::Deserializer<'de>,
    {
        struct CoordsVisitor<const D: usize>;

        impl<'de, const D: usize> Visitor<'de> for CoordsVisitor<D> {
            type Value = Point<D>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_fmt(format_args!("an array of {D} coordinates"))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut coords = [0.0; D];
                for (i, slot) in coords.iter_mut().enumerate() {
                    let value: Option<f64> = seq
                        .next_element()?
                        .ok_or_else(|| Error::invalid_length(i, &self))?;
                    *slot = value.unwrap_or(f64::NAN);
                }
                Ok(Point::new(coords))
            }
        }

        deserializer.deserialize_tuple(D, CoordsVisitor::<D>)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vector_arithmetic() {
        let a = Point::new([1.0, 2.0]);
        let b = Point::new([4.0, 6.0]);

        assert_eq!((b - a).coords(), &[3.0, 4.0]);
        assert_eq!((a + b).coords(), &[5.0, 8.0]);
        assert_eq!((a * 2.0).coords(), &[2.0, 4.0]);
        assert_eq!((-a).coords(), &[-1.0, -2.0]);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_relative_eq!(a.dot(&b), 16.0);
    }

    #[test]
    fn perpendicular_is_ccw_quarter_turn() {
        let v = Point::new([1.0, 0.0]);
        let p = v.perpendicular();
        assert_eq!(p.coords(), &[0.0, 1.0]);
        assert_relative_eq!(v.cross(&p), 1.0);
        assert_relative_eq!(v.dot(&p), 0.0);
    }

    #[test]
    fn normalized_rejects_zero_vector() {
        assert!(Point::<2>::origin().normalized().is_none());
        let unit = Point::new([0.0, -3.0]).normalized().unwrap();
        assert_relative_eq!(unit.norm(), 1.0);
        assert_relative_eq!(unit.y(), -1.0);
    }

    #[test]
    fn three_dimensional_norm() {
        let p = Point::new([1.0, 2.0, 2.0]);
        assert_relative_eq!(p.norm(), 3.0);
    }

    #[test]
    fn json_roundtrip_preserves_coordinates() {
        let p = Point::new([0.25, -1.5]);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[0.25,-1.5]");
        let back: Point<2> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn json_null_reads_back_as_nan() {
        let back: Point<2> = serde_json::from_str("[1.0,null]").unwrap();
        assert!(back.y().is_nan());
        assert!(!back.is_finite());
    }

    #[test]
    fn json_wrong_length_is_rejected() {
        let result: Result<Point<2>, _> = serde_json::from_str("[1.0]");
        assert!(result.is_err());
    }
}
