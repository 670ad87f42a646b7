//! Canonical edge identifiers.
//!
//! Edges are not stored explicitly in a vertex mesh; they are implied by consecutive
//! node pairs in element loops. [`EdgeKey`] names an undirected edge by its two node
//! indices so that `(a, b)` and `(b, a)` compare equal. Because the endpoints are plain
//! node indices, ordering edge keys orders edges by node index, which is the visiting
//! order of the remesh passes.

use serde::{Deserialize, Serialize};

/// Canonical identifier for an undirected mesh edge.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::edge::EdgeKey;
///
/// let edge = EdgeKey::new(7, 2);
/// assert_eq!(edge.endpoints(), (2, 7));
/// assert_eq!(edge, EdgeKey::new(2, 7));
/// assert!(edge.contains(7));
/// assert_eq!(edge.other(2), Some(7));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    v0: usize,
    v1: usize,
}

impl EdgeKey {
    /// Creates a canonical edge key with `v0 <= v1`.
    #[inline]
    #[must_use]
    pub const fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }

    /// Smaller node index.
    #[inline]
    #[must_use]
    pub const fn v0(self) -> usize {
        self.v0
    }

    /// Larger node index.
    #[inline]
    #[must_use]
    pub const fn v1(self) -> usize {
        self.v1
    }

    /// Both endpoints, smaller first.
    #[inline]
    #[must_use]
    pub const fn endpoints(self) -> (usize, usize) {
        (self.v0, self.v1)
    }

    /// Returns `true` if `node` is an endpoint.
    #[inline]
    #[must_use]
    pub const fn contains(self, node: usize) -> bool {
        self.v0 == node || self.v1 == node
    }

    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    #[inline]
    #[must_use]
    pub const fn other(self, node: usize) -> Option<usize> {
        if self.v0 == node {
            Some(self.v1)
        } else if self.v1 == node {
            Some(self.v0)
        } else {
            None
        }
    }
}

impl From<(usize, usize)> for EdgeKey {
    #[inline]
    fn from((a, b): (usize, usize)) -> Self {
        Self::new(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn edge_key_is_canonical() {
        let e1 = EdgeKey::new(3, 1);
        let e2 = EdgeKey::new(1, 3);
        assert_eq!(e1, e2);
        assert!(e1.v0() <= e1.v1());
        assert_eq!(EdgeKey::from((3, 1)), e1);
    }

    #[test]
    fn edge_keys_order_by_node_index() {
        let edges: BTreeSet<_> = [(4, 2), (0, 9), (2, 3), (1, 0)]
            .into_iter()
            .map(EdgeKey::from)
            .collect();
        let ordered: Vec<_> = edges.into_iter().map(EdgeKey::endpoints).collect();
        assert_eq!(ordered, vec![(0, 1), (0, 9), (2, 3), (2, 4)]);
    }

    #[test]
    fn other_endpoint() {
        let e = EdgeKey::new(5, 8);
        assert_eq!(e.other(5), Some(8));
        assert_eq!(e.other(8), Some(5));
        assert_eq!(e.other(6), None);
        assert!(!e.contains(6));
    }
}
