//! Local topological rearrangements of a vertex mesh.
//!
//! This module implements the junction-remodelling moves of the vertex model:
//!
//! - **node merge**: two nodes joined by a short edge collapse into one;
//! - **T1 swap**: a short edge shared by up to two cells is rotated by 90° so that the
//!   cells that previously touched only at its endpoints now share it;
//! - **T2 swap**: a vanishing triangular cell is removed and its three nodes collapse to
//!   one;
//! - **T3 (overlap) repair**: a boundary node that has entered a neighbouring cell is
//!   moved onto that cell's nearest edge and inserted into its loop.
//!
//! [`identify_swap_type`] is the entry point for short edges: it classifies the edge with
//! [`classify_short_edge`] and then executes the chosen move.
//!
//! All moves assume counter-clockwise element loops.
//!
//! # References
//! - Nagai, T. & Honda, H. "A dynamic cell model for the formation of epithelial tissues."
//!   Philosophical Magazine B 81.7 (2001): 699-719
//! - Fletcher, A. G., et al. "Implementing vertex dynamics models of cell populations in
//!   biology within a consistent computational framework." Progress in Biophysics and
//!   Molecular Biology 113.2 (2013): 299-326

#![forbid(unsafe_code)]

use thiserror::Error;

use crate::core::collections::{ElementIndexBuffer, SmallBuffer};
use crate::core::vertex_mesh::{MeshAccessError, VertexMesh};
use crate::geometry::point::Point2;
use crate::geometry::predicates::{closest_point_on_segment, point_in_polygon};

/// Largest number of elements a node may belong to.
pub const MAX_NODE_VALENCE: usize = 3;

// =============================================================================
// TYPES
// =============================================================================

/// The rearrangement chosen for a short edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapType {
    /// Collapse the edge into a single node.
    NodeMerge,
    /// Rotate the edge by 90°.
    T1Swap,
}

/// Result of [`identify_swap_type`].
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::algorithms::rearrangements::{SwapOutcome, SwapType};
/// use vertex_mesh::core::collections::ElementIndexBuffer;
/// use vertex_mesh::geometry::point::Point;
///
/// let outcome = SwapOutcome {
///     swap_type: SwapType::T1Swap,
///     location: Point::new([0.0, 0.0]),
///     deleted_elements: ElementIndexBuffer::new(),
/// };
/// assert!(outcome.deleted_elements.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SwapOutcome {
    /// Move that was executed.
    pub swap_type: SwapType,
    /// Midpoint of the edge before the move.
    pub location: Point2,
    /// Elements removed because the move left them with fewer than three nodes.
    pub deleted_elements: ElementIndexBuffer,
}

/// Errors raised by rearrangement moves.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::algorithms::rearrangements::RearrangementError;
///
/// let err = RearrangementError::NotNeighbours { a: 3, b: 9 };
/// assert!(err.to_string().contains("not neighbours"));
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RearrangementError {
    /// A node or element index is unknown.
    #[error(transparent)]
    Access(#[from] MeshAccessError),
    /// The two nodes share no element.
    #[error("Nodes {a} and {b} cannot be merged since they are not neighbours")]
    NotNeighbours {
        /// First node.
        a: usize,
        /// Second node.
        b: usize,
    },
    /// The two nodes share an element but are not consecutive in any loop.
    #[error("Nodes {a} and {b} are not joined by an edge")]
    NotAnEdge {
        /// First node.
        a: usize,
        /// Second node.
        b: usize,
    },
    /// A boundary node may only be merged with another boundary node.
    #[error("Cannot merge boundary node {boundary} with interior node {interior}")]
    BoundaryMismatch {
        /// The boundary node.
        boundary: usize,
        /// The interior node.
        interior: usize,
    },
    /// A node is, or would become, part of more than three elements.
    #[error("Node {node} is contained in {num_elements} elements; at most 3 are allowed")]
    NodeValenceExceeded {
        /// Offending node.
        node: usize,
        /// Number of containing elements.
        num_elements: usize,
    },
    /// The two nodes of a T1 swap are at the same location.
    #[error("Nodes {a} and {b} coincide; the T1 swap direction is undefined")]
    CoincidentNodes {
        /// First node.
        a: usize,
        /// Second node.
        b: usize,
    },
    /// A T1 swap would leave a triangular element with two nodes.
    #[error("T1 swap on an edge of triangular element {element} is not supported")]
    T1OnTriangle {
        /// The triangular element.
        element: usize,
    },
    /// A T2 swap was requested for an element that is not a triangle.
    #[error("T2 swap requires a triangular element; element {element} has {num_nodes} nodes")]
    NotATriangle {
        /// Offending element.
        element: usize,
        /// Its loop length.
        num_nodes: usize,
    },
    /// A T2 swap next to another triangle.
    #[error(
        "T2 swap on element {element} next to triangular element {neighbour}: dealing with this has not been implemented"
    )]
    TriangularNeighbour {
        /// Element being removed.
        element: usize,
        /// The triangular neighbour.
        neighbour: usize,
    },
    /// Overlap repair was requested for a node that is not on the boundary.
    #[error("Node {node} is not a boundary node")]
    NotABoundaryNode {
        /// Offending node.
        node: usize,
    },
    /// Overlap repair was requested for a node already in the element.
    #[error("Node {node} already belongs to element {element}")]
    AlreadyInElement {
        /// Offending node.
        node: usize,
        /// Target element.
        element: usize,
    },
}

fn check_valence(mesh: &VertexMesh, node: usize) -> Result<usize, RearrangementError> {
    let num_elements = mesh.active_node(node)?.num_containing_elements();
    if num_elements > MAX_NODE_VALENCE {
        return Err(RearrangementError::NodeValenceExceeded { node, num_elements });
    }
    Ok(num_elements)
}

/// Refuses a move that would leave `node` in more than three elements.
const fn check_resulting_valence(
    node: usize,
    num_elements: usize,
) -> Result<(), RearrangementError> {
    if num_elements > MAX_NODE_VALENCE {
        return Err(RearrangementError::NodeValenceExceeded { node, num_elements });
    }
    Ok(())
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Decides whether the short edge `(a, b)` should be merged or T1-swapped.
///
/// A T1 swap is chosen when both nodes sit in at least two elements and the union of
/// their containing elements has three or four members; otherwise the nodes are merged.
///
/// # Errors
///
/// - [`RearrangementError::NodeValenceExceeded`] if either node is in more than three
///   elements;
/// - [`RearrangementError::NotNeighbours`] if the nodes share no element;
/// - [`RearrangementError::NotAnEdge`] if they share an element but are not consecutive;
/// - [`RearrangementError::BoundaryMismatch`] if a merge is chosen for a boundary node and
///   an interior node.
pub fn classify_short_edge(
    mesh: &VertexMesh,
    a: usize,
    b: usize,
) -> Result<SwapType, RearrangementError> {
    let valence_a = check_valence(mesh, a)?;
    let valence_b = check_valence(mesh, b)?;

    if mesh.shared_elements(a, b).is_empty() {
        return Err(RearrangementError::NotNeighbours { a, b });
    }
    if mesh.elements_containing_edge(a, b).is_empty() {
        return Err(RearrangementError::NotAnEdge { a, b });
    }

    let union = mesh.union_of_containing_elements(a, b).len();
    if valence_a >= 2 && valence_b >= 2 && (3..=4).contains(&union) {
        return Ok(SwapType::T1Swap);
    }

    let a_boundary = mesh.active_node(a)?.is_boundary();
    let b_boundary = mesh.active_node(b)?.is_boundary();
    match (a_boundary, b_boundary) {
        (true, false) => Err(RearrangementError::BoundaryMismatch {
            boundary: a,
            interior: b,
        }),
        (false, true) => Err(RearrangementError::BoundaryMismatch {
            boundary: b,
            interior: a,
        }),
        _ => Ok(SwapType::NodeMerge),
    }
}

/// Classifies the short edge `(a, b)` and executes the chosen move.
///
/// # Errors
///
/// Returns the errors of [`classify_short_edge`], [`perform_node_merge`] or
/// [`perform_t1_swap`].
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::algorithms::rearrangements::{RearrangementError, identify_swap_type};
/// use vertex_mesh::core::config::RemeshConfig;
/// use vertex_mesh::core::vertex_mesh::VertexMesh;
/// use vertex_mesh::geometry::point::Point;
///
/// let points = [
///     Point::new([0.0, 0.0]),
///     Point::new([1.0, 0.0]),
///     Point::new([0.0, 1.0]),
///     Point::new([5.0, 5.0]),
///     Point::new([6.0, 5.0]),
///     Point::new([5.0, 6.0]),
/// ];
/// let mut mesh = VertexMesh::from_loops(
///     &points,
///     vec![vec![0, 1, 2], vec![3, 4, 5]],
///     RemeshConfig::default(),
/// )
/// .unwrap();
///
/// let err = identify_swap_type(&mut mesh, 0, 3).unwrap_err();
/// assert_eq!(err, RearrangementError::NotNeighbours { a: 0, b: 3 });
/// ```
pub fn identify_swap_type(
    mesh: &mut VertexMesh,
    a: usize,
    b: usize,
) -> Result<SwapOutcome, RearrangementError> {
    let swap_type = classify_short_edge(mesh, a, b)?;
    let location = mesh
        .active_node(a)?
        .location()
        .midpoint(&mesh.active_node(b)?.location());

    let deleted_elements = match swap_type {
        SwapType::NodeMerge => perform_node_merge(mesh, a, b)?,
        SwapType::T1Swap => {
            perform_t1_swap(mesh, a, b)?;
            ElementIndexBuffer::new()
        }
    };
    Ok(SwapOutcome {
        swap_type,
        location,
        deleted_elements,
    })
}

// =============================================================================
// NODE MERGE
// =============================================================================

/// Merges node `a` into node `b`.
///
/// `b` keeps its location. `a` is removed from every element that also contains `b` and
/// replaced by `b` in every other element. Elements left with fewer than three nodes are
/// deleted; nodes no longer in any element are tombstoned, `a` included.
///
/// Returns the indices of the deleted elements.
///
/// # Errors
///
/// - [`RearrangementError::Access`] if either node is unknown;
/// - [`RearrangementError::NotNeighbours`] if the nodes share no element;
/// - [`RearrangementError::NodeValenceExceeded`] if `b` would end up in more than three
///   elements. The mesh is not modified in that case.
pub fn perform_node_merge(
    mesh: &mut VertexMesh,
    a: usize,
    b: usize,
) -> Result<ElementIndexBuffer, RearrangementError> {
    let containing_a: ElementIndexBuffer = mesh.active_node(a)?.containing_elements().into();
    mesh.active_node(b)?;
    let shared = mesh.shared_elements(a, b);
    if shared.is_empty() {
        return Err(RearrangementError::NotNeighbours { a, b });
    }

    // Shared triangles collapse to two nodes and are deleted; every other element of
    // either node ends up containing `b`.
    let mut collapsing = 0;
    for &e in &shared {
        if mesh.active_element(e)?.is_triangle() {
            collapsing += 1;
        }
    }
    check_resulting_valence(
        b,
        mesh.union_of_containing_elements(a, b).len() - collapsing,
    )?;

    for &e in &containing_a {
        if mesh.active_element(e)?.contains_node(b) {
            mesh.remove_node_from_element(e, a);
        } else {
            mesh.replace_node_in_element(e, a, b);
        }
    }

    let mut deleted = ElementIndexBuffer::new();
    let mut touched: SmallBuffer<usize, 8> = SmallBuffer::new();
    touched.push(b);
    for &e in &containing_a {
        let element = mesh.active_element(e)?;
        if element.num_nodes() < 3 {
            touched.extend_from_slice(element.nodes());
            mesh.delete_element(e);
            deleted.push(e);
        }
    }

    mesh.delete_node(a);
    for &n in &touched {
        if mesh.node(n).is_some_and(|node| node.num_containing_elements() == 0) {
            mesh.delete_node(n);
        } else {
            mesh.refresh_boundary_flag(n);
        }
    }

    tracing::debug!(
        "[rearrange] merged node {a} into node {b}; deleted elements {:?}",
        deleted.as_slice()
    );
    Ok(deleted)
}

// =============================================================================
// T1 SWAP
// =============================================================================

/// Rotates the edge `(a, b)` by 90° about its midpoint.
///
/// The nodes are placed on the perpendicular bisector of the old edge, each
/// `t1_new_edge_length / 2` from the midpoint. Elements that contained the edge keep
/// only the endpoint on their side; elements that touched only one endpoint gain the
/// other and now share the new edge. Node and element counts are unchanged.
///
/// # Errors
///
/// - [`RearrangementError::NodeValenceExceeded`] if either node is, or would end up, in
///   more than three elements (a boundary edge at a notch, for example);
/// - [`RearrangementError::NotAnEdge`] if `(a, b)` is not an edge;
/// - [`RearrangementError::T1OnTriangle`] if an element containing the edge is a triangle;
/// - [`RearrangementError::CoincidentNodes`] if the nodes coincide.
pub fn perform_t1_swap(
    mesh: &mut VertexMesh,
    a: usize,
    b: usize,
) -> Result<(), RearrangementError> {
    check_valence(mesh, a)?;
    check_valence(mesh, b)?;

    let shared = mesh.shared_elements(a, b);
    let mut forward = ElementIndexBuffer::new();
    let mut backward = ElementIndexBuffer::new();
    for &e in &shared {
        let element = mesh.active_element(e)?;
        if element.next_node(a) == Some(b) {
            forward.push(e);
        } else if element.next_node(b) == Some(a) {
            backward.push(e);
        }
        if element.is_triangle() {
            return Err(RearrangementError::T1OnTriangle { element: e });
        }
    }
    if forward.is_empty() && backward.is_empty() {
        return Err(RearrangementError::NotAnEdge { a, b });
    }

    let pa = mesh.active_node(a)?.location();
    let pb = mesh.active_node(b)?.location();
    let Some(direction) = (pb - pa).perpendicular().normalized() else {
        return Err(RearrangementError::CoincidentNodes { a, b });
    };
    let midpoint = pa.midpoint(&pb);
    let half_length = 0.5 * mesh.config().t1_new_edge_length();

    let in_any = |mesh: &VertexMesh, node: Option<usize>, elements: &[usize]| {
        node.and_then(|n| mesh.node(n))
            .is_some_and(|n| elements.iter().any(|&e| n.is_in_element(e)))
    };

    // Decide insertions before editing any loop.
    let mut a_only: SmallBuffer<(usize, bool), 2> = SmallBuffer::new();
    for &e in mesh.active_node(a)?.containing_elements() {
        if !shared.contains(&e) {
            let after = in_any(mesh, mesh.active_element(e)?.next_node(a), &backward);
            a_only.push((e, after));
        }
    }
    let mut b_only: SmallBuffer<(usize, bool), 2> = SmallBuffer::new();
    for &e in mesh.active_node(b)?.containing_elements() {
        if !shared.contains(&e) {
            let after = in_any(mesh, mesh.active_element(e)?.next_node(b), &forward);
            b_only.push((e, after));
        }
    }

    // Backward elements drop `a` and forward elements drop `b`; the elements touching only
    // the other endpoint gain it.
    check_resulting_valence(
        a,
        mesh.active_node(a)?.num_containing_elements() - backward.len() + b_only.len(),
    )?;
    check_resulting_valence(
        b,
        mesh.active_node(b)?.num_containing_elements() - forward.len() + a_only.len(),
    )?;

    for &e in &forward {
        mesh.remove_node_from_element(e, b);
    }
    for &e in &backward {
        mesh.remove_node_from_element(e, a);
    }
    for &(e, after) in &a_only {
        if after {
            mesh.insert_node_after(e, a, b);
        } else {
            mesh.insert_node_before(e, a, b);
        }
    }
    for &(e, after) in &b_only {
        if after {
            mesh.insert_node_after(e, b, a);
        } else {
            mesh.insert_node_before(e, b, a);
        }
    }

    mesh.node_mut(a).set_location(midpoint + direction * half_length);
    mesh.node_mut(b).set_location(midpoint - direction * half_length);
    mesh.refresh_boundary_flag(a);
    mesh.refresh_boundary_flag(b);

    tracing::debug!(
        "[rearrange] T1 swap on edge ({a}, {b}) at ({:.6}, {:.6})",
        midpoint.x(),
        midpoint.y()
    );
    Ok(())
}

// =============================================================================
// T2 SWAP
// =============================================================================

/// Removes the triangular element `element`, collapsing its three nodes to a new node at
/// its centroid.
///
/// Every neighbouring element has the triangle's nodes in its loop replaced by the new
/// node. The new node is on the boundary if any of the removed nodes was. Returns the
/// index of the new node.
///
/// # Errors
///
/// - [`RearrangementError::NotATriangle`] if the element does not have three nodes;
/// - [`RearrangementError::TriangularNeighbour`] if any element sharing a node with it is
///   also a triangle.
pub fn perform_t2_swap(mesh: &mut VertexMesh, element: usize) -> Result<usize, RearrangementError> {
    let triangle = mesh.active_element(element)?;
    if !triangle.is_triangle() {
        return Err(RearrangementError::NotATriangle {
            element,
            num_nodes: triangle.num_nodes(),
        });
    }
    let corners: SmallBuffer<usize, 3> = triangle.nodes().into();

    let mut neighbours = ElementIndexBuffer::new();
    for &n in &corners {
        for &e in mesh.active_node(n)?.containing_elements() {
            if e != element && !neighbours.contains(&e) {
                neighbours.push(e);
            }
        }
    }
    neighbours.sort_unstable();
    for &e in &neighbours {
        if mesh.active_element(e)?.is_triangle() {
            return Err(RearrangementError::TriangularNeighbour {
                element,
                neighbour: e,
            });
        }
    }

    let Some(location) = mesh.element_centroid(element) else {
        return Err(MeshAccessError::UnknownElement { element }.into());
    };
    let is_boundary = corners
        .iter()
        .any(|&n| mesh.node(n).is_some_and(|node| node.is_boundary()));
    let new_node = mesh.push_node(location, is_boundary);

    for &e in &neighbours {
        let mut placed = false;
        let mut nodes = Vec::with_capacity(mesh.active_element(e)?.num_nodes());
        for &n in mesh.active_element(e)?.nodes() {
            if corners.contains(&n) {
                if !placed {
                    nodes.push(new_node);
                    placed = true;
                }
            } else {
                nodes.push(n);
            }
        }
        mesh.set_element_nodes(e, nodes);
    }

    mesh.delete_element(element);
    for &n in &corners {
        mesh.delete_node(n);
    }

    tracing::debug!(
        "[rearrange] T2 swap removed element {element}; new node {new_node} at ({:.6}, {:.6})",
        location.x(),
        location.y()
    );
    Ok(new_node)
}

// =============================================================================
// OVERLAP (T3) REPAIR
// =============================================================================

/// Returns `true` if `point` lies inside `element`.
///
/// # Errors
///
/// Returns [`MeshAccessError::UnknownElement`] if the element is unknown.
pub fn element_includes_point(
    mesh: &VertexMesh,
    point: Point2,
    element: usize,
) -> Result<bool, MeshAccessError> {
    let points = mesh
        .element_locations(element)
        .ok_or(MeshAccessError::UnknownElement { element })?;
    Ok(point_in_polygon(point, &points))
}

/// Moves a boundary node that lies inside `element` onto the element's closest edge and
/// inserts it into every loop containing that edge.
///
/// Returns the edge `(start, end)` the node was placed on, in the element's loop order.
///
/// # Errors
///
/// - [`RearrangementError::NotABoundaryNode`] if the node is interior;
/// - [`RearrangementError::AlreadyInElement`] if the node is already in `element`;
/// - [`RearrangementError::NodeValenceExceeded`] if the insertion would put the node in
///   more than three elements.
pub fn move_overlapping_node_onto_edge(
    mesh: &mut VertexMesh,
    node: usize,
    element: usize,
) -> Result<(usize, usize), RearrangementError> {
    let n = mesh.active_node(node)?;
    if !n.is_boundary() {
        return Err(RearrangementError::NotABoundaryNode { node });
    }
    let location = n.location();
    let valence = n.num_containing_elements();
    let target = mesh.active_element(element)?;
    if target.contains_node(node) {
        return Err(RearrangementError::AlreadyInElement { node, element });
    }

    let mut best: Option<(usize, usize, Point2, f64)> = None;
    for (start, end) in target.edges() {
        let (Some(p), Some(q)) = (mesh.node_location(start), mesh.node_location(end)) else {
            continue;
        };
        let (closest, _) = closest_point_on_segment(location, p, q);
        let distance = closest.distance(&location);
        if best.is_none_or(|(_, _, _, d)| distance < d) {
            best = Some((start, end, closest, distance));
        }
    }
    let Some((start, end, closest, _)) = best else {
        return Err(MeshAccessError::UnknownElement { element }.into());
    };

    let edge_elements = mesh.elements_containing_edge(start, end);
    let num_elements = valence + edge_elements.len();
    if num_elements > MAX_NODE_VALENCE {
        return Err(RearrangementError::NodeValenceExceeded { node, num_elements });
    }

    for &e in &edge_elements {
        if mesh.active_element(e)?.next_node(start) == Some(end) {
            mesh.insert_node_after(e, start, node);
        } else {
            mesh.insert_node_after(e, end, node);
        }
    }
    mesh.node_mut(node).set_location(closest);
    mesh.refresh_boundary_flag(node);

    tracing::debug!(
        "[rearrange] moved overlapping node {node} onto edge ({start}, {end}) of element {element}"
    );
    Ok((start, end))
}
