//! The vertex-mesh store.
//!
//! [`VertexMesh`] owns every [`Node`] and [`VertexElement`] of a 2D cell sheet in two
//! index-addressed arenas. Elements refer to nodes by index and every node keeps the
//! sorted list of elements that contain it; all topological edits go through the mesh so
//! that the two directions stay consistent.
//!
//! Removed nodes and elements are tombstoned rather than dropped, which keeps indices
//! stable while a remesh is in progress. [`VertexMesh::compact`] (run at the end of every
//! [`VertexMesh::remesh`](crate::core::algorithms::remesh)) physically removes them and
//! renumbers the survivors.
//!
//! # Examples
//!
//! ```rust
//! use vertex_mesh::core::config::RemeshConfig;
//! use vertex_mesh::core::vertex_mesh::VertexMesh;
//! use vertex_mesh::geometry::point::Point;
//!
//! // Two unit squares side by side.
//! let points = [
//!     Point::new([0.0, 0.0]),
//!     Point::new([1.0, 0.0]),
//!     Point::new([2.0, 0.0]),
//!     Point::new([2.0, 1.0]),
//!     Point::new([1.0, 1.0]),
//!     Point::new([0.0, 1.0]),
//! ];
//! let mesh = VertexMesh::from_loops(
//!     &points,
//!     vec![vec![0, 1, 4, 5], vec![1, 2, 3, 4]],
//!     RemeshConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(mesh.num_nodes(), 6);
//! assert_eq!(mesh.num_elements(), 2);
//! assert_eq!(mesh.element_area(0), Some(1.0));
//! assert_eq!(mesh.neighbouring_element_indices(0), Some(vec![1]));
//! assert!(mesh.validate().is_ok());
//! ```

#![forbid(unsafe_code)]

// =============================================================================
// IMPORTS
// =============================================================================

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::collections::{
    ElementIndexBuffer, FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
};
use super::config::{ConfigError, RemeshConfig};
use super::edge::EdgeKey;
use super::element::VertexElement;
use super::index_map::{ElementMap, IndexMap, NodeMap};
use super::node::Node;
use crate::geometry::point::Point2;
use crate::geometry::polygon::{
    SecondMoments, area_gradient, centroid, edge_lengths, elongation_shape_factor, perimeter,
    perimeter_gradient, principal_short_axis, second_moments, signed_area,
};

/// Locations of an element's loop, inline for elements of up to eight sides.
pub type ElementPointBuffer = SmallBuffer<Point2, 8>;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// The two kinds of entity stored in a mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A [`Node`].
    Node,
    /// A [`VertexElement`].
    Element,
}

/// Lookup of a node or element that is out of range or tombstoned.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::vertex_mesh::MeshAccessError;
///
/// let err = MeshAccessError::UnknownNode { node: 7 };
/// assert_eq!(err.to_string(), "Node 7 does not exist or has been deleted");
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeshAccessError {
    /// No live node has this index.
    #[error("Node {node} does not exist or has been deleted")]
    UnknownNode {
        /// Requested node index.
        node: usize,
    },
    /// No live element has this index.
    #[error("Element {element} does not exist or has been deleted")]
    UnknownElement {
        /// Requested element index.
        element: usize,
    },
}

/// Structural inconsistencies detected by [`VertexMesh::validate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MeshValidationError {
    /// An arena slot carries a different index than its position.
    #[error("{entity:?} stored at position {position} carries index {found}")]
    IndexMismatch {
        /// Which arena.
        entity: EntityKind,
        /// Position in the arena.
        position: usize,
        /// Index stored on the entity.
        found: usize,
    },
    /// A node sits in more than three elements.
    #[error("Node {node} is contained in {num_elements} elements; at most 3 are allowed")]
    NodeValenceExceeded {
        /// Offending node.
        node: usize,
        /// Number of containing elements.
        num_elements: usize,
    },
    /// A live element has fewer than three nodes.
    #[error("Element {element} has {num_nodes} nodes; at least 3 are required")]
    TooFewNodes {
        /// Offending element.
        element: usize,
        /// Loop length.
        num_nodes: usize,
    },
    /// A node appears twice in one loop.
    #[error("Element {element} lists node {node} more than once")]
    DuplicateNode {
        /// Offending element.
        element: usize,
        /// Repeated node.
        node: usize,
    },
    /// A loop references a node that is missing or deleted.
    #[error("Element {element} references missing or deleted node {node}")]
    DanglingNode {
        /// Offending element.
        element: usize,
        /// Referenced node.
        node: usize,
    },
    /// A node lists an element whose loop does not contain it.
    #[error("Node {node} lists element {element}, whose loop does not contain it")]
    StaleBackReference {
        /// Offending node.
        node: usize,
        /// Listed element.
        element: usize,
    },
    /// A loop contains a node that does not list the element.
    #[error("Element {element} contains node {node}, which does not list it")]
    MissingBackReference {
        /// Node in the loop.
        node: usize,
        /// Element owning the loop.
        element: usize,
    },
}

/// Errors raised while building a [`VertexMesh`].
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum MeshConstructionError {
    /// The supplied configuration is inconsistent.
    #[error("Invalid remesh configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// A node location has a NaN or infinite coordinate.
    #[error("Node {node} has a non-finite location")]
    NonFiniteLocation {
        /// Offending node.
        node: usize,
    },
    /// The assembled mesh failed validation.
    #[error("Mesh failed validation during construction: {0}")]
    Validation(#[from] MeshValidationError),
}

// =============================================================================
// MESH STORE
// =============================================================================

/// A 2D vertex-based polygonal mesh.
#[derive(Clone, Debug)]
pub struct VertexMesh {
    nodes: Vec<Node>,
    elements: Vec<VertexElement>,
    config: RemeshConfig,
    rng: StdRng,
}

impl VertexMesh {
    /// Builds a mesh from node and element records.
    ///
    /// Each record's index must equal its position in the input vector. Containing-element
    /// back-references are rebuilt from the element loops, so any already present on the
    /// nodes are discarded. Tombstoned records are accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MeshConstructionError`] if the configuration is invalid, a node location
    /// is not finite, or the assembled mesh fails [`VertexMesh::validate`].
    pub fn new(
        mut nodes: Vec<Node>,
        elements: Vec<VertexElement>,
        config: RemeshConfig,
    ) -> Result<Self, MeshConstructionError> {
        config.validate()?;
        if let Some(node) = nodes
            .iter()
            .find(|n| !n.is_deleted() && !n.location().is_finite())
        {
            return Err(MeshConstructionError::NonFiniteLocation { node: node.index() });
        }

        for node in &mut nodes {
            node.clear_elements();
        }
        for element in elements.iter().filter(|e| !e.is_deleted()) {
            for &n in element.nodes() {
                if let Some(node) = nodes.get_mut(n) {
                    node.add_element(element.index());
                }
            }
        }

        let rng = StdRng::seed_from_u64(config.short_axis_seed);
        let mesh = Self {
            nodes,
            elements,
            config,
            rng,
        };
        mesh.validate()?;
        tracing::debug!(
            "[mesh] built mesh with {} nodes and {} elements",
            mesh.num_nodes(),
            mesh.num_elements()
        );
        Ok(mesh)
    }

    /// Builds a mesh from point locations and element loops, inferring boundary flags.
    ///
    /// A node is flagged as boundary when it lies on an edge used by exactly one loop.
    ///
    /// # Errors
    ///
    /// Same as [`VertexMesh::new`].
    pub fn from_loops(
        points: &[Point2],
        loops: Vec<Vec<usize>>,
        config: RemeshConfig,
    ) -> Result<Self, MeshConstructionError> {
        let mut edge_counts: FastHashMap<EdgeKey, usize> =
            fast_hash_map_with_capacity(points.len() * 2);
        for nodes in &loops {
            for (i, &a) in nodes.iter().enumerate() {
                let b = nodes[(i + 1) % nodes.len()];
                *edge_counts.entry(EdgeKey::new(a, b)).or_insert(0) += 1;
            }
        }
        let mut is_boundary = vec![false; points.len()];
        for (edge, count) in edge_counts {
            if count == 1 {
                for n in [edge.v0(), edge.v1()] {
                    if let Some(flag) = is_boundary.get_mut(n) {
                        *flag = true;
                    }
                }
            }
        }

        let nodes = points
            .iter()
            .zip(is_boundary)
            .enumerate()
            .map(|(i, (&p, b))| Node::new(i, p, b))
            .collect();
        let elements = loops
            .into_iter()
            .enumerate()
            .map(|(i, l)| VertexElement::new(i, l))
            .collect();
        Self::new(nodes, elements, config)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// The live node with this index.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index).filter(|n| !n.is_deleted())
    }

    /// The live element with this index.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<&VertexElement> {
        self.elements.get(index).filter(|e| !e.is_deleted())
    }

    /// Iterator over live nodes in index order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.is_deleted())
    }

    /// Iterator over live elements in index order.
    pub fn elements(&self) -> impl Iterator<Item = &VertexElement> {
        self.elements.iter().filter(|e| !e.is_deleted())
    }

    /// Number of live nodes.
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes().count()
    }

    /// Number of live elements.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.elements().count()
    }

    /// Number of node slots, tombstones included.
    #[inline]
    #[must_use]
    pub fn num_all_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of element slots, tombstones included.
    #[inline]
    #[must_use]
    pub fn num_all_elements(&self) -> usize {
        self.elements.len()
    }

    /// Location of a live node.
    #[must_use]
    pub fn node_location(&self, node: usize) -> Option<Point2> {
        self.node(node).map(Node::location)
    }

    /// Moves a live node.
    ///
    /// # Errors
    ///
    /// Returns [`MeshAccessError::UnknownNode`] if the node is missing or deleted.
    pub fn set_node_location(
        &mut self,
        node: usize,
        location: Point2,
    ) -> Result<(), MeshAccessError> {
        self.active_node(node)?;
        self.nodes[node].set_location(location);
        Ok(())
    }

    /// Sets or clears the attribute (region tag) of a live element.
    ///
    /// # Errors
    ///
    /// Returns [`MeshAccessError::UnknownElement`] if the element is missing or deleted.
    pub fn set_element_attribute(
        &mut self,
        element: usize,
        attribute: Option<f64>,
    ) -> Result<(), MeshAccessError> {
        self.active_element(element)?;
        self.elements[element].set_attribute(attribute);
        Ok(())
    }

    // =========================================================================
    // CONFIGURATION
    // =========================================================================

    /// The remeshing configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &RemeshConfig {
        &self.config
    }

    /// Replaces the configuration and reseeds the short-axis generator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] and leaves the mesh unchanged if `config` is invalid.
    pub fn set_config(&mut self, config: RemeshConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.rng = StdRng::seed_from_u64(config.short_axis_seed);
        self.config = config;
        Ok(())
    }

    fn update_config(&mut self, update: impl FnOnce(&mut RemeshConfig)) -> Result<(), ConfigError> {
        let mut config = self.config.clone();
        update(&mut config);
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Minimum edge length before a merge or T1 swap.
    #[inline]
    #[must_use]
    pub const fn cell_rearrangement_threshold(&self) -> f64 {
        self.config.cell_rearrangement_threshold
    }

    /// Sets the minimum edge length before a merge or T1 swap.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the resulting configuration is invalid.
    pub fn set_cell_rearrangement_threshold(&mut self, value: f64) -> Result<(), ConfigError> {
        self.update_config(|c| c.cell_rearrangement_threshold = value)
    }

    /// Ratio of the post-T1 edge length to the rearrangement threshold.
    #[inline]
    #[must_use]
    pub const fn cell_rearrangement_ratio(&self) -> f64 {
        self.config.cell_rearrangement_ratio
    }

    /// Sets the post-T1 edge length ratio.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the resulting configuration is invalid.
    pub fn set_cell_rearrangement_ratio(&mut self, value: f64) -> Result<(), ConfigError> {
        self.update_config(|c| c.cell_rearrangement_ratio = value)
    }

    /// Area below which a triangular element is removed.
    #[inline]
    #[must_use]
    pub const fn t2_threshold(&self) -> f64 {
        self.config.t2_threshold
    }

    /// Sets the T2 area threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the resulting configuration is invalid.
    pub fn set_t2_threshold(&mut self, value: f64) -> Result<(), ConfigError> {
        self.update_config(|c| c.t2_threshold = value)
    }

    /// Edge length above which an edge is divided.
    #[inline]
    #[must_use]
    pub const fn edge_division_threshold(&self) -> f64 {
        self.config.edge_division_threshold
    }

    /// Sets the edge division threshold.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the resulting configuration is invalid.
    pub fn set_edge_division_threshold(&mut self, value: f64) -> Result<(), ConfigError> {
        self.update_config(|c| c.edge_division_threshold = value)
    }

    /// Whether remeshing repairs boundary nodes that overlap other elements.
    #[inline]
    #[must_use]
    pub const fn check_for_intersections(&self) -> bool {
        self.config.check_for_intersections
    }

    /// Enables or disables the overlap repair pass.
    pub const fn set_check_for_intersections(&mut self, enabled: bool) {
        self.config.check_for_intersections = enabled;
    }

    // =========================================================================
    // GEOMETRY QUERIES
    // =========================================================================

    /// Locations of an element's nodes in loop order.
    #[must_use]
    pub fn element_locations(&self, element: usize) -> Option<ElementPointBuffer> {
        let element = self.element(element)?;
        Some(
            element
                .nodes()
                .iter()
                .map(|&n| self.nodes[n].location())
                .collect(),
        )
    }

    /// Signed area of an element (positive for counter-clockwise loops).
    #[must_use]
    pub fn element_area(&self, element: usize) -> Option<f64> {
        self.element_locations(element).map(|p| signed_area(&p))
    }

    /// Perimeter of an element.
    #[must_use]
    pub fn element_perimeter(&self, element: usize) -> Option<f64> {
        self.element_locations(element).map(|p| perimeter(&p))
    }

    /// Area-weighted centroid of an element.
    #[must_use]
    pub fn element_centroid(&self, element: usize) -> Option<Point2> {
        self.element_locations(element).map(|p| centroid(&p))
    }

    /// Second moments of area of an element about its centroid.
    #[must_use]
    pub fn element_second_moments(&self, element: usize) -> Option<SecondMoments> {
        self.element_locations(element).map(|p| second_moments(&p))
    }

    /// Unit short axis of an element.
    ///
    /// For an isotropic element there is no preferred direction; a unit vector at an
    /// angle drawn from the mesh's seeded generator is returned instead.
    pub fn element_short_axis(&mut self, element: usize) -> Option<Point2> {
        let moments = self.element_second_moments(element)?;
        if let Some(axis) = principal_short_axis(&moments) {
            return Some(axis);
        }
        let theta = self.rng.random_range(0.0..PI);
        tracing::debug!(
            "[mesh] element {element} is isotropic; using random short axis angle {theta}"
        );
        Some(Point2::new([theta.cos(), theta.sin()]))
    }

    /// Elongation shape factor of an element (1 for isotropic shapes).
    #[must_use]
    pub fn element_elongation_shape_factor(&self, element: usize) -> Option<f64> {
        self.element_second_moments(element)
            .map(|m| elongation_shape_factor(&m))
    }

    /// Gradient of an element's area with respect to the node at loop position `local`.
    #[must_use]
    pub fn element_area_gradient(&self, element: usize, local: usize) -> Option<Point2> {
        let points = self.element_locations(element)?;
        (local < points.len()).then(|| area_gradient(&points, local))
    }

    /// Gradient of an element's perimeter with respect to the node at loop position `local`.
    #[must_use]
    pub fn element_perimeter_gradient(&self, element: usize, local: usize) -> Option<Point2> {
        let points = self.element_locations(element)?;
        (local < points.len()).then(|| perimeter_gradient(&points, local))
    }

    /// Edge lengths of an element; entry `i` is the edge from local node `i` to `i + 1`.
    #[must_use]
    pub fn element_edge_lengths(&self, element: usize) -> Option<Vec<f64>> {
        self.element_locations(element).map(|p| edge_lengths(&p))
    }

    /// Distance between two live nodes.
    #[must_use]
    pub fn distance_between_nodes(&self, a: usize, b: usize) -> Option<f64> {
        Some(self.node_location(a)?.distance(&self.node_location(b)?))
    }

    /// Sum of the signed areas of all live elements.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        self.elements()
            .filter_map(|e| self.element_area(e.index()))
            .sum()
    }

    // =========================================================================
    // TOPOLOGY QUERIES
    // =========================================================================

    /// Loop position of `node` within `element`.
    #[must_use]
    pub fn node_local_index(&self, element: usize, node: usize) -> Option<usize> {
        self.element(element)?.node_local_index(node)
    }

    /// Elements containing both `a` and `b`, sorted.
    #[must_use]
    pub fn shared_elements(&self, a: usize, b: usize) -> ElementIndexBuffer {
        let (Some(na), Some(nb)) = (self.node(a), self.node(b)) else {
            return ElementIndexBuffer::new();
        };
        na.containing_elements()
            .iter()
            .copied()
            .filter(|&e| nb.is_in_element(e))
            .collect()
    }

    /// Sorted union of the elements containing `a` or `b`.
    #[must_use]
    pub fn union_of_containing_elements(&self, a: usize, b: usize) -> ElementIndexBuffer {
        let mut union = ElementIndexBuffer::new();
        for n in [a, b] {
            if let Some(node) = self.node(n) {
                union.extend_from_slice(node.containing_elements());
            }
        }
        union.sort_unstable();
        union.dedup();
        union
    }

    /// Elements whose loops contain `a` and `b` as consecutive nodes.
    #[must_use]
    pub fn elements_containing_edge(&self, a: usize, b: usize) -> ElementIndexBuffer {
        self.shared_elements(a, b)
            .into_iter()
            .filter(|&e| self.elements[e].has_edge(a, b))
            .collect()
    }

    /// Nodes joined to `node` by an edge, sorted.
    #[must_use]
    pub fn neighbouring_node_indices(&self, node: usize) -> Option<Vec<usize>> {
        let n = self.node(node)?;
        let mut neighbours: Vec<usize> = n
            .containing_elements()
            .iter()
            .flat_map(|&e| {
                let element = &self.elements[e];
                [element.previous_node(node), element.next_node(node)]
            })
            .flatten()
            .collect();
        neighbours.sort_unstable();
        neighbours.dedup();
        Some(neighbours)
    }

    /// Elements sharing at least one node with `element`, sorted.
    #[must_use]
    pub fn neighbouring_element_indices(&self, element: usize) -> Option<Vec<usize>> {
        let e = self.element(element)?;
        let neighbours: FastHashSet<usize> = e
            .nodes()
            .iter()
            .flat_map(|&n| self.nodes[n].containing_elements().iter().copied())
            .filter(|&other| other != element)
            .collect();
        let mut neighbours: Vec<usize> = neighbours.into_iter().collect();
        neighbours.sort_unstable();
        Some(neighbours)
    }

    /// All distinct edges of live elements, sorted.
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeKey> {
        let mut edges: Vec<EdgeKey> = self
            .elements()
            .flat_map(|e| e.edges().map(EdgeKey::from))
            .collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Checks index bookkeeping, loop well-formedness, back-references and valence.
    ///
    /// # Errors
    ///
    /// Returns the first [`MeshValidationError`] found.
    pub fn validate(&self) -> Result<(), MeshValidationError> {
        for (position, node) in self.nodes.iter().enumerate() {
            if node.index() != position {
                return Err(MeshValidationError::IndexMismatch {
                    entity: EntityKind::Node,
                    position,
                    found: node.index(),
                });
            }
            for &element in node.containing_elements() {
                if !self
                    .element(element)
                    .is_some_and(|e| e.contains_node(position))
                {
                    return Err(MeshValidationError::StaleBackReference {
                        node: position,
                        element,
                    });
                }
            }
            if node.num_containing_elements() > 3 {
                return Err(MeshValidationError::NodeValenceExceeded {
                    node: position,
                    num_elements: node.num_containing_elements(),
                });
            }
        }

        for (position, element) in self.elements.iter().enumerate() {
            if element.index() != position {
                return Err(MeshValidationError::IndexMismatch {
                    entity: EntityKind::Element,
                    position,
                    found: element.index(),
                });
            }
            if element.is_deleted() {
                continue;
            }
            if element.num_nodes() < 3 {
                return Err(MeshValidationError::TooFewNodes {
                    element: position,
                    num_nodes: element.num_nodes(),
                });
            }
            let mut seen = FastHashSet::default();
            for &n in element.nodes() {
                if !seen.insert(n) {
                    return Err(MeshValidationError::DuplicateNode {
                        element: position,
                        node: n,
                    });
                }
                let Some(node) = self.node(n) else {
                    return Err(MeshValidationError::DanglingNode {
                        element: position,
                        node: n,
                    });
                };
                if !node.is_in_element(position) {
                    return Err(MeshValidationError::MissingBackReference {
                        node: n,
                        element: position,
                    });
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // COMPACTION
    // =========================================================================

    /// Removes tombstoned nodes and elements and renumbers the survivors from zero,
    /// preserving relative order.
    ///
    /// Returns the node and element translation tables.
    pub fn compact(&mut self) -> (NodeMap, ElementMap) {
        let mut node_map = IndexMap::identity(self.nodes.len());
        let mut next = 0;
        for (old, node) in self.nodes.iter().enumerate() {
            if node.is_deleted() {
                node_map.set_deleted(old);
            } else {
                node_map.set_new_index(old, next);
                next += 1;
            }
        }

        let mut element_map = IndexMap::identity(self.elements.len());
        let mut next = 0;
        for (old, element) in self.elements.iter().enumerate() {
            if element.is_deleted() {
                element_map.set_deleted(old);
            } else {
                element_map.set_new_index(old, next);
                next += 1;
            }
        }

        if node_map.num_deleted() == 0 && element_map.num_deleted() == 0 {
            return (node_map, element_map);
        }

        self.nodes.retain(|n| !n.is_deleted());
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.set_index(i);
            node.clear_elements();
        }
        self.elements.retain(|e| !e.is_deleted());
        for (i, element) in self.elements.iter_mut().enumerate() {
            element.set_index(i);
            let renumbered: Vec<usize> = element
                .nodes()
                .iter()
                .filter_map(|&n| node_map.new_index(n))
                .collect();
            debug_assert_eq!(renumbered.len(), element.num_nodes());
            *element.nodes_mut() = renumbered;
            for &n in element.nodes() {
                self.nodes[n].add_element(i);
            }
        }

        tracing::debug!(
            "[mesh] compacted: removed {} nodes and {} elements",
            node_map.num_deleted(),
            element_map.num_deleted()
        );
        (node_map, element_map)
    }

    // =========================================================================
    // CRATE-INTERNAL SURGERY
    // =========================================================================

    pub(crate) fn active_node(&self, node: usize) -> Result<&Node, MeshAccessError> {
        self.node(node)
            .ok_or(MeshAccessError::UnknownNode { node })
    }

    pub(crate) fn active_element(
        &self,
        element: usize,
    ) -> Result<&VertexElement, MeshAccessError> {
        self.element(element)
            .ok_or(MeshAccessError::UnknownElement { element })
    }

    pub(crate) fn node_mut(&mut self, node: usize) -> &mut Node {
        &mut self.nodes[node]
    }

    /// Appends a node that belongs to no element yet.
    pub(crate) fn push_node(&mut self, location: Point2, is_boundary: bool) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::new(index, location, is_boundary));
        index
    }

    /// Appends an element and registers it with its nodes.
    pub(crate) fn push_element(&mut self, nodes: Vec<usize>, attribute: Option<f64>) -> usize {
        let index = self.elements.len();
        for &n in &nodes {
            self.nodes[n].add_element(index);
        }
        let mut element = VertexElement::new(index, nodes);
        element.set_attribute(attribute);
        self.elements.push(element);
        index
    }

    /// Inserts `node` after `after` in `element`'s loop.
    pub(crate) fn insert_node_after(&mut self, element: usize, after: usize, node: usize) {
        if self.elements[element].insert_node_after(after, node) {
            self.nodes[node].add_element(element);
        }
    }

    /// Inserts `node` before `before` in `element`'s loop.
    pub(crate) fn insert_node_before(&mut self, element: usize, before: usize, node: usize) {
        if self.elements[element].insert_node_before(before, node) {
            self.nodes[node].add_element(element);
        }
    }

    /// Removes `node` from `element`'s loop.
    pub(crate) fn remove_node_from_element(&mut self, element: usize, node: usize) {
        if self.elements[element].remove_node(node) {
            self.nodes[node].remove_element(element);
        }
    }

    /// Replaces `old` by `new` in `element`'s loop.
    pub(crate) fn replace_node_in_element(&mut self, element: usize, old: usize, new: usize) {
        self.elements[element].replace_node(old, new);
        self.nodes[old].remove_element(element);
        self.nodes[new].add_element(element);
    }

    /// Rewrites `element`'s loop wholesale.
    pub(crate) fn set_element_nodes(&mut self, element: usize, nodes: Vec<usize>) {
        let old = std::mem::take(self.elements[element].nodes_mut());
        for n in old {
            self.nodes[n].remove_element(element);
        }
        for &n in &nodes {
            self.nodes[n].add_element(element);
        }
        *self.elements[element].nodes_mut() = nodes;
    }

    /// Tombstones an element and drops it from its nodes' back-references.
    pub(crate) fn delete_element(&mut self, element: usize) {
        let nodes = std::mem::take(self.elements[element].nodes_mut());
        for n in nodes {
            self.nodes[n].remove_element(element);
        }
        self.elements[element].mark_deleted();
    }

    /// Tombstones a node.
    pub(crate) fn delete_node(&mut self, node: usize) {
        self.nodes[node].mark_deleted();
    }

    /// Recomputes a live node's boundary flag: a node is on the boundary when one of
    /// its edges belongs to a single element.
    pub(crate) fn refresh_boundary_flag(&mut self, node: usize) {
        let Some(n) = self.node(node) else {
            return;
        };
        let on_boundary = n.containing_elements().iter().any(|&e| {
            let element = &self.elements[e];
            [element.previous_node(node), element.next_node(node)]
                .into_iter()
                .flatten()
                .any(|other| self.elements_containing_edge(node, other).len() == 1)
        });
        self.nodes[node].set_boundary(on_boundary);
    }
}

// =============================================================================
// TRAIT IMPLEMENTATIONS
// =============================================================================

/// Equality of stored entities and configuration; generator state is ignored.
impl PartialEq for VertexMesh {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.elements == other.elements && self.config == other.config
    }
}

impl Serialize for VertexMesh {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("VertexMesh", 3)?;
        state.serialize_field("nodes", &self.nodes)?;
        state.serialize_field("elements", &self.elements)?;
        state.serialize_field("config", &self.config)?;
        state.end()
    }
}

/// Back-references are rebuilt and the short-axis generator is reseeded from the config.
impl<'de> Deserialize<'de> for VertexMesh {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct MeshRecord {
            nodes: Vec<Node>,
            elements: Vec<VertexElement>,
            #[serde(default)]
            config: RemeshConfig,
        }

        let record = MeshRecord::deserialize(deserializer)?;
        Self::new(record.nodes, record.elements, record.config).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// TESTS
// =============================================================================
