//! Vertex-mesh nodes.
//!
//! A [`Node`] is a cell junction: a point in the plane shared by the boundary loops of
//! up to three elements. Nodes are owned by the [`VertexMesh`](crate::core::vertex_mesh::VertexMesh)
//! arena and referenced everywhere else by index. Each node keeps a sorted back-reference
//! list of the elements whose loops contain it; the mesh keeps that list in sync with the
//! element loops during every topological operation.
//!
//! # Lifecycle
//!
//! Nodes removed by a merge or swap are not dropped immediately. They are tombstoned
//! ([`EntityState::Deleted`]) and only physically removed (and the survivors renumbered)
//! when the mesh is compacted.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use super::collections::{ElementIndexBuffer, sorted_insert, sorted_remove};
use crate::geometry::point::Point2;

/// Lifecycle state of a node or element in the mesh arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityState {
    /// Live entity, visible to iterators and queries.
    #[default]
    Active,
    /// Tombstoned entity awaiting compaction.
    Deleted,
}

/// A node of a 2D vertex mesh.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::node::Node;
/// use vertex_mesh::geometry::point::Point;
///
/// let node = Node::new(0, Point::new([0.5, 1.0]), true);
/// assert_eq!(node.index(), 0);
/// assert!(node.is_boundary());
/// assert!(node.containing_elements().is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    index: usize,
    location: Point2,
    is_boundary: bool,
    /// Rebuilt from element loops on load.
    #[serde(skip)]
    containing_elements: ElementIndexBuffer,
    #[serde(default)]
    state: EntityState,
}

impl Node {
    /// Creates an active node that is not yet part of any element.
    #[must_use]
    pub fn new(index: usize, location: Point2, is_boundary: bool) -> Self {
        Self {
            index,
            location,
            is_boundary,
            containing_elements: ElementIndexBuffer::new(),
            state: EntityState::Active,
        }
    }

    /// Index of this node in the mesh.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Current location.
    #[inline]
    #[must_use]
    pub const fn location(&self) -> Point2 {
        self.location
    }

    /// Whether the node lies on the outer perimeter of the cell sheet.
    #[inline]
    #[must_use]
    pub const fn is_boundary(&self) -> bool {
        self.is_boundary
    }

    /// Sorted indices of the elements whose loops contain this node.
    #[inline]
    #[must_use]
    pub fn containing_elements(&self) -> &[usize] {
        &self.containing_elements
    }

    /// Number of elements containing this node.
    #[inline]
    #[must_use]
    pub fn num_containing_elements(&self) -> usize {
        self.containing_elements.len()
    }

    /// Returns `true` if the node is contained in element `element`.
    #[inline]
    #[must_use]
    pub fn is_in_element(&self, element: usize) -> bool {
        self.containing_elements.binary_search(&element).is_ok()
    }

    /// Lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> EntityState {
        self.state
    }

    /// Returns `true` once the node has been tombstoned.
    #[inline]
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.state == EntityState::Deleted
    }

    pub(crate) const fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) const fn set_location(&mut self, location: Point2) {
        self.location = location;
    }

    pub(crate) const fn set_boundary(&mut self, is_boundary: bool) {
        self.is_boundary = is_boundary;
    }

    pub(crate) fn add_element(&mut self, element: usize) -> bool {
        sorted_insert(&mut self.containing_elements, element)
    }

    pub(crate) fn remove_element(&mut self, element: usize) -> bool {
        sorted_remove(&mut self.containing_elements, element)
    }

    pub(crate) fn clear_elements(&mut self) {
        self.containing_elements.clear();
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.state = EntityState::Deleted;
        self.containing_elements.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_elements_stay_sorted() {
        let mut node = Node::new(4, Point2::new([0.0, 0.0]), false);
        node.add_element(7);
        node.add_element(2);
        node.add_element(5);
        assert_eq!(node.containing_elements(), &[2, 5, 7]);
        assert!(node.is_in_element(5));
        assert!(!node.is_in_element(3));

        assert!(node.remove_element(5));
        assert_eq!(node.num_containing_elements(), 2);
    }

    #[test]
    fn mark_deleted_clears_back_references() {
        let mut node = Node::new(0, Point2::new([1.0, 1.0]), true);
        node.add_element(0);
        node.mark_deleted();
        assert!(node.is_deleted());
        assert_eq!(node.state(), EntityState::Deleted);
        assert!(node.containing_elements().is_empty());
    }

    #[test]
    fn serialization_skips_back_references() {
        let mut node = Node::new(2, Point2::new([0.5, -0.5]), true);
        node.add_element(9);
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("containing_elements"));
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index(), 2);
        assert_eq!(back.location(), node.location());
        assert!(back.is_boundary());
        assert!(back.containing_elements().is_empty());
        assert!(!back.is_deleted());
    }
}
