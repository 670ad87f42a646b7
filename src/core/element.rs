//! Vertex-mesh elements (cells).
//!
//! A [`VertexElement`] is one cell of the sheet: an ordered, cyclic loop of node indices
//! describing its boundary polygon, counter-clockwise by convention. Elements only hold
//! node *indices*; locations and back-references live on the nodes in the mesh arena.
//!
//! Loop editing methods are crate-private so that every change to a loop goes through
//! [`VertexMesh`](crate::core::vertex_mesh::VertexMesh), which keeps node back-references
//! consistent.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use super::node::EntityState;

/// A polygonal cell of a 2D vertex mesh.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::element::VertexElement;
///
/// let element = VertexElement::new(0, vec![3, 4, 5, 6]);
/// assert_eq!(element.num_nodes(), 4);
/// assert_eq!(element.node_local_index(5), Some(2));
/// assert_eq!(element.next_node(6), Some(3));
/// assert_eq!(element.previous_node(3), Some(6));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexElement {
    index: usize,
    nodes: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attribute: Option<f64>,
    #[serde(default)]
    state: EntityState,
}

impl VertexElement {
    /// Creates an active element with the given node loop.
    #[must_use]
    pub const fn new(index: usize, nodes: Vec<usize>) -> Self {
        Self {
            index,
            nodes,
            attribute: None,
            state: EntityState::Active,
        }
    }

    /// Sets the scalar attribute (region tag) of the element.
    #[must_use]
    pub fn with_attribute(mut self, attribute: f64) -> Self {
        self.attribute = Some(attribute);
        self
    }

    /// Index of this element in the mesh.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Node indices in loop order.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    /// Number of nodes in the loop.
    #[inline]
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Global index of the node at loop position `local`, wrapping around the loop.
    ///
    /// # Panics
    ///
    /// Panics if the loop is empty.
    #[inline]
    #[must_use]
    pub fn node(&self, local: usize) -> usize {
        self.nodes[local % self.nodes.len()]
    }

    /// Loop position of global node `node`, if it belongs to this element.
    #[must_use]
    pub fn node_local_index(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }

    /// Returns `true` if `node` appears in the loop.
    #[inline]
    #[must_use]
    pub fn contains_node(&self, node: usize) -> bool {
        self.nodes.contains(&node)
    }

    /// The node following `node` in loop order.
    #[must_use]
    pub fn next_node(&self, node: usize) -> Option<usize> {
        self.node_local_index(node).map(|i| self.node(i + 1))
    }

    /// The node preceding `node` in loop order.
    #[must_use]
    pub fn previous_node(&self, node: usize) -> Option<usize> {
        let n = self.nodes.len();
        self.node_local_index(node).map(|i| self.node(i + n - 1))
    }

    /// Returns `true` if `a` and `b` are consecutive in the loop, in either order.
    #[must_use]
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.next_node(a) == Some(b) || self.next_node(b) == Some(a)
    }

    /// Iterator over the loop's directed edges `(node, next)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.nodes.len()).map(|i| (self.nodes[i], self.node(i + 1)))
    }

    /// Returns `true` for a three-sided element.
    #[inline]
    #[must_use]
    pub fn is_triangle(&self) -> bool {
        self.nodes.len() == 3
    }

    /// Optional scalar attribute (region tag).
    #[inline]
    #[must_use]
    pub const fn attribute(&self) -> Option<f64> {
        self.attribute
    }

    /// Sets or clears the scalar attribute.
    pub const fn set_attribute(&mut self, attribute: Option<f64>) {
        self.attribute = attribute;
    }

    /// Lifecycle state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> EntityState {
        self.state
    }

    /// Returns `true` once the element has been tombstoned.
    #[inline]
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.state == EntityState::Deleted
    }

    pub(crate) const fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<usize> {
        &mut self.nodes
    }

    /// Inserts `node` directly after the existing node `after`. Returns `false` if
    /// `after` is not in the loop.
    pub(crate) fn insert_node_after(&mut self, after: usize, node: usize) -> bool {
        match self.node_local_index(after) {
            Some(i) => {
                self.nodes.insert(i + 1, node);
                true
            }
            None => false,
        }
    }

    /// Inserts `node` directly before the existing node `before`.
    pub(crate) fn insert_node_before(&mut self, before: usize, node: usize) -> bool {
        match self.node_local_index(before) {
            Some(i) => {
                self.nodes.insert(i, node);
                true
            }
            None => false,
        }
    }

    /// Removes `node` from the loop. Returns `false` if it was absent.
    pub(crate) fn remove_node(&mut self, node: usize) -> bool {
        match self.node_local_index(node) {
            Some(i) => {
                self.nodes.remove(i);
                true
            }
            None => false,
        }
    }

    /// Replaces every occurrence of `old` with `new`.
    pub(crate) fn replace_node(&mut self, old: usize, new: usize) {
        for n in &mut self.nodes {
            if *n == old {
                *n = new;
            }
        }
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.state = EntityState::Deleted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_navigation_wraps() {
        let element = VertexElement::new(1, vec![10, 11, 12]);
        assert_eq!(element.node(3), 10);
        assert_eq!(element.next_node(12), Some(10));
        assert_eq!(element.previous_node(10), Some(12));
        assert_eq!(element.next_node(99), None);
        assert!(element.has_edge(12, 10));
        assert!(element.has_edge(10, 12));
        assert!(element.is_triangle());
        let edges: Vec<_> = element.edges().collect();
        assert_eq!(edges, vec![(10, 11), (11, 12), (12, 10)]);
    }

    #[test]
    fn loop_editing() {
        let mut element = VertexElement::new(0, vec![0, 1, 2, 3]);
        assert!(element.insert_node_after(1, 7));
        assert_eq!(element.nodes(), &[0, 1, 7, 2, 3]);
        assert!(element.insert_node_before(0, 8));
        assert_eq!(element.nodes(), &[8, 0, 1, 7, 2, 3]);
        assert!(element.remove_node(1));
        assert!(!element.remove_node(1));
        element.replace_node(7, 9);
        assert_eq!(element.nodes(), &[8, 0, 9, 2, 3]);
        assert!(element.insert_node_after(3, 4));
        assert_eq!(element.nodes(), &[8, 0, 9, 2, 3, 4]);
    }

    #[test]
    fn attribute_roundtrips_through_json() {
        let element = VertexElement::new(3, vec![0, 1, 2]).with_attribute(2.0);
        let json = serde_json::to_string(&element).unwrap();
        let back: VertexElement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, element);
        assert_eq!(back.attribute(), Some(2.0));

        let plain = VertexElement::new(4, vec![0, 1, 2]);
        let json = serde_json::to_string(&plain).unwrap();
        assert!(!json.contains("attribute"));
    }
}
