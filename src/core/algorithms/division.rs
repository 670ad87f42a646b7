//! Edge and element division.
//!
//! Dividing an edge inserts a node into every loop that contains the edge, so both cells
//! on either side see it. Dividing an element splits its loop into two loops that share
//! one new edge; the original element keeps its index and the second half is appended.
//!
//! Axis-based division intersects a line through the element centroid with the element
//! boundary, inserts the two crossing points with [`divide_edge_at`] and then splits the
//! element between them. Crossing points are kept at least
//! [`RemeshConfig::division_node_clearance`](crate::core::config::RemeshConfig::division_node_clearance)
//! away from existing nodes so the new edges are not immediately rearranged away.

#![forbid(unsafe_code)]

use thiserror::Error;

use crate::core::algorithms::rearrangements::MAX_NODE_VALENCE;
use crate::core::vertex_mesh::{MeshAccessError, VertexMesh};
use crate::geometry::point::Point2;
use crate::geometry::polygon::centroid;
use crate::geometry::predicates::line_segment_intersection;

/// Errors raised by edge and element division.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DivisionError {
    /// A node or element index is unknown.
    #[error(transparent)]
    Access(#[from] MeshAccessError),
    /// The two nodes are not consecutive in any loop.
    #[error("Nodes {a} and {b} are not joined by an edge")]
    NotAnEdge {
        /// First node.
        a: usize,
        /// Second node.
        b: usize,
    },
    /// A local node index is past the end of the loop.
    #[error("Local index {local} is out of range for element {element} with {num_nodes} nodes")]
    LocalIndexOutOfRange {
        /// Element being divided.
        element: usize,
        /// Requested local index.
        local: usize,
        /// Loop length.
        num_nodes: usize,
    },
    /// The two split nodes coincide or are neighbours in the loop.
    #[error("Cannot divide element {element} between adjacent local nodes {first} and {second}")]
    AdjacentSplitNodes {
        /// Element being divided.
        element: usize,
        /// First local index.
        first: usize,
        /// Second local index.
        second: usize,
    },
    /// A split node already sits in three elements.
    #[error("Dividing would put node {node} in {num_elements} elements")]
    NodeValenceExceeded {
        /// Offending node.
        node: usize,
        /// Resulting number of containing elements.
        num_elements: usize,
    },
    /// The division axis is zero or not finite.
    #[error("Division axis for element {element} is degenerate")]
    DegenerateAxis {
        /// Element being divided.
        element: usize,
    },
    /// The division line does not cross the element boundary twice.
    #[error("Division line does not cross the boundary of element {element} twice")]
    NoAxisIntersection {
        /// Element being divided.
        element: usize,
    },
}

// =============================================================================
// EDGE DIVISION
// =============================================================================

/// Divides the edge `(a, b)` at its midpoint.
///
/// Returns the index of the new node.
///
/// # Errors
///
/// Same as [`divide_edge_at`].
pub fn divide_edge(mesh: &mut VertexMesh, a: usize, b: usize) -> Result<usize, DivisionError> {
    let pa = mesh.active_node(a)?.location();
    let pb = mesh.active_node(b)?.location();
    divide_edge_at(mesh, a, b, pa.midpoint(&pb))
}

/// Inserts a new node at `location` between `a` and `b` in every loop containing the edge.
///
/// The new node is on the boundary exactly when the edge belongs to a single element.
///
/// # Errors
///
/// Returns [`DivisionError::Access`] for unknown nodes or [`DivisionError::NotAnEdge`] if
/// `(a, b)` is not an edge.
pub fn divide_edge_at(
    mesh: &mut VertexMesh,
    a: usize,
    b: usize,
    location: Point2,
) -> Result<usize, DivisionError> {
    mesh.active_node(a)?;
    mesh.active_node(b)?;
    let elements = mesh.elements_containing_edge(a, b);
    if elements.is_empty() {
        return Err(DivisionError::NotAnEdge { a, b });
    }

    let new_node = mesh.push_node(location, elements.len() == 1);
    for &e in &elements {
        if mesh.active_element(e)?.next_node(a) == Some(b) {
            mesh.insert_node_after(e, a, new_node);
        } else {
            mesh.insert_node_after(e, b, new_node);
        }
    }

    tracing::debug!(
        "[divide] edge ({a}, {b}) divided by node {new_node} in elements {:?}",
        elements.as_slice()
    );
    Ok(new_node)
}

// =============================================================================
// ELEMENT DIVISION
// =============================================================================

/// Splits `element` along the chord joining its nodes at loop positions `first` and
/// `second`.
///
/// The original element keeps one half and its index; the other half becomes a new
/// element with the same attribute, whose index is returned. With
/// `place_original_below` the original keeps the half with the lower centroid; otherwise
/// it keeps the half running from `first` to `second` in loop order.
///
/// # Errors
///
/// - [`DivisionError::LocalIndexOutOfRange`] for an invalid local index;
/// - [`DivisionError::AdjacentSplitNodes`] if the two nodes coincide or are neighbours;
/// - [`DivisionError::NodeValenceExceeded`] if a split node is already in three elements.
pub fn divide_element_along_nodes(
    mesh: &mut VertexMesh,
    element: usize,
    first: usize,
    second: usize,
    place_original_below: bool,
) -> Result<usize, DivisionError> {
    let target = mesh.active_element(element)?;
    let n = target.num_nodes();
    for local in [first, second] {
        if local >= n {
            return Err(DivisionError::LocalIndexOutOfRange {
                element,
                local,
                num_nodes: n,
            });
        }
    }
    let (lo, hi) = (first.min(second), first.max(second));
    let gap = hi - lo;
    if gap <= 1 || gap == n - 1 {
        return Err(DivisionError::AdjacentSplitNodes {
            element,
            first,
            second,
        });
    }

    for local in [lo, hi] {
        let node = target.node(local);
        let num_elements = mesh.active_node(node)?.num_containing_elements() + 1;
        if num_elements > MAX_NODE_VALENCE {
            return Err(DivisionError::NodeValenceExceeded { node, num_elements });
        }
    }

    let nodes = target.nodes();
    let mut kept: Vec<usize> = nodes[lo..=hi].to_vec();
    let mut split: Vec<usize> = nodes[hi..].iter().chain(&nodes[..=lo]).copied().collect();
    if first > second {
        std::mem::swap(&mut kept, &mut split);
    }
    let attribute = target.attribute();

    if place_original_below {
        let locate = |loop_nodes: &[usize]| -> Vec<Point2> {
            loop_nodes
                .iter()
                .filter_map(|&n| mesh.node_location(n))
                .collect()
        };
        if centroid(&locate(&split)).y() < centroid(&locate(&kept)).y() {
            std::mem::swap(&mut kept, &mut split);
        }
    }

    mesh.set_element_nodes(element, kept);
    let new_element = mesh.push_element(split, attribute);

    tracing::debug!(
        "[divide] element {element} divided between local nodes {first} and {second}; new element {new_element}"
    );
    Ok(new_element)
}

/// Splits `element` along the line through its centroid in direction `axis`.
///
/// Returns the index of the new element.
///
/// # Errors
///
/// - [`DivisionError::DegenerateAxis`] if `axis` has zero length or is not finite;
/// - [`DivisionError::NoAxisIntersection`] if the line does not cross the boundary on
///   both sides of the centroid;
/// - any error of [`divide_element_along_nodes`].
pub fn divide_element_along_axis(
    mesh: &mut VertexMesh,
    element: usize,
    axis: Point2,
    place_original_below: bool,
) -> Result<usize, DivisionError> {
    let Some(direction) = axis.normalized() else {
        return Err(DivisionError::DegenerateAxis { element });
    };
    let points = mesh
        .element_locations(element)
        .ok_or(MeshAccessError::UnknownElement { element })?;
    let origin = centroid(&points);
    let loop_nodes = mesh.active_element(element)?.nodes().to_vec();
    let n = loop_nodes.len();

    // Closest crossing on each side of the centroid: (local edge, segment parameter, t).
    let mut ahead: Option<(usize, f64, f64)> = None;
    let mut behind: Option<(usize, f64, f64)> = None;
    for k in 0..n {
        let (p, q) = (points[k], points[(k + 1) % n]);
        let Some(s) = line_segment_intersection(origin, direction, p, q) else {
            continue;
        };
        // A crossing through a vertex is counted on the edge that starts there.
        if s >= 1.0 {
            continue;
        }
        let t = (p + (q - p) * s - origin).dot(&direction);
        if t > 0.0 && ahead.is_none_or(|(_, _, best)| t < best) {
            ahead = Some((k, s, t));
        } else if t < 0.0 && behind.is_none_or(|(_, _, best)| t > best) {
            behind = Some((k, s, t));
        }
    }
    let (Some(ahead), Some(behind)) = (ahead, behind) else {
        return Err(DivisionError::NoAxisIntersection { element });
    };

    let clearance = mesh.config().division_node_clearance();
    let mut new_nodes = [0_usize; 2];
    for (slot, (k, s, _)) in [behind, ahead].into_iter().enumerate() {
        let (a, b) = (loop_nodes[k], loop_nodes[(k + 1) % n]);
        let (p, q) = (points[k], points[(k + 1) % n]);
        let length = p.distance(&q);
        let adjusted = if 2.0 * clearance >= length {
            0.5
        } else {
            s.clamp(clearance / length, 1.0 - clearance / length)
        };
        if (adjusted - s).abs() > f64::EPSILON {
            tracing::warn!(
                "[divide] division node on edge ({a}, {b}) of element {element} moved from s={s:.6} to s={adjusted:.6}"
            );
        }
        new_nodes[slot] = divide_edge_at(mesh, a, b, p + (q - p) * adjusted)?;
    }

    let (Some(first), Some(second)) = (
        mesh.node_local_index(element, new_nodes[0]),
        mesh.node_local_index(element, new_nodes[1]),
    ) else {
        return Err(MeshAccessError::UnknownElement { element }.into());
    };
    divide_element_along_nodes(mesh, element, first, second, place_original_below)
}

/// Splits `element` along its short axis through the centroid.
///
/// # Errors
///
/// Same as [`divide_element_along_axis`].
pub fn divide_element_along_short_axis(
    mesh: &mut VertexMesh,
    element: usize,
    place_original_below: bool,
) -> Result<usize, DivisionError> {
    let axis = mesh
        .element_short_axis(element)
        .ok_or(MeshAccessError::UnknownElement { element })?;
    divide_element_along_axis(mesh, element, axis, place_original_below)
}

// =============================================================================
// MESH CONVENIENCE METHODS
// =============================================================================

impl VertexMesh {
    /// Divides the edge `(a, b)` at its midpoint. See [`divide_edge`].
    ///
    /// # Errors
    ///
    /// Same as [`divide_edge`].
    pub fn divide_edge(&mut self, a: usize, b: usize) -> Result<usize, DivisionError> {
        divide_edge(self, a, b)
    }

    /// Splits an element between two of its nodes. See [`divide_element_along_nodes`].
    ///
    /// # Errors
    ///
    /// Same as [`divide_element_along_nodes`].
    pub fn divide_element_along_nodes(
        &mut self,
        element: usize,
        first: usize,
        second: usize,
        place_original_below: bool,
    ) -> Result<usize, DivisionError> {
        divide_element_along_nodes(self, element, first, second, place_original_below)
    }

    /// Splits an element along a given axis. See [`divide_element_along_axis`].
    ///
    /// # Errors
    ///
    /// Same as [`divide_element_along_axis`].
    pub fn divide_element_along_axis(
        &mut self,
        element: usize,
        axis: Point2,
        place_original_below: bool,
    ) -> Result<usize, DivisionError> {
        divide_element_along_axis(self, element, axis, place_original_below)
    }

    /// Splits an element along its short axis. See [`divide_element_along_short_axis`].
    ///
    /// # Errors
    ///
    /// Same as [`divide_element_along_short_axis`].
    pub fn divide_element_along_short_axis(
        &mut self,
        element: usize,
        place_original_below: bool,
    ) -> Result<usize, DivisionError> {
        divide_element_along_short_axis(self, element, place_original_below)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RemeshConfig;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new([x, y])
    }

    fn two_squares() -> VertexMesh {
        let points = [
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(0.0, 1.0),
        ];
        VertexMesh::from_loops(
            &points,
            vec![vec![0, 1, 4, 5], vec![1, 2, 3, 4]],
            RemeshConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn divide_shared_edge_updates_both_elements() {
        let mut mesh = two_squares();
        let m = mesh.divide_edge(1, 4).unwrap();
        assert_eq!(m, 6);
        assert_eq!(mesh.element(0).unwrap().nodes(), &[0, 1, 6, 4, 5]);
        assert_eq!(mesh.element(1).unwrap().nodes(), &[1, 2, 3, 4, 6]);
        assert_eq!(mesh.node_location(m), Some(p(1.0, 0.5)));
        assert!(!mesh.node(m).unwrap().is_boundary());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn divide_boundary_edge_creates_boundary_node() {
        let mut mesh = two_squares();
        let m = divide_edge(&mut mesh, 5, 0).unwrap();
        assert_eq!(mesh.element(0).unwrap().nodes(), &[0, 1, 4, 5, 6]);
        assert!(mesh.node(m).unwrap().is_boundary());
        assert_eq!(
            divide_edge(&mut mesh, 0, 4),
            Err(DivisionError::NotAnEdge { a: 0, b: 4 })
        );
    }

    #[test]
    fn divide_element_along_nodes_splits_loop() {
        let points = [
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(0.0, 1.0),
        ];
        let mut mesh = VertexMesh::from_loops(
            &points,
            vec![vec![0, 1, 2, 3, 4, 5]],
            RemeshConfig::default(),
        )
        .unwrap();
        mesh.set_element_attribute(0, Some(3.0)).unwrap();

        let new_element = mesh.divide_element_along_nodes(0, 1, 4, false).unwrap();
        assert_eq!(new_element, 1);
        assert_eq!(mesh.element(0).unwrap().nodes(), &[1, 2, 3, 4]);
        assert_eq!(mesh.element(1).unwrap().nodes(), &[4, 5, 0, 1]);
        assert_eq!(mesh.element(1).unwrap().attribute(), Some(3.0));
        assert_relative_eq!(mesh.element_area(0).unwrap(), 1.0);
        assert_relative_eq!(mesh.element_area(1).unwrap(), 1.0);
        assert_eq!(mesh.node(1).unwrap().containing_elements(), &[0, 1]);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn divide_element_along_nodes_rejects_bad_indices() {
        let mut mesh = two_squares();
        assert!(matches!(
            mesh.divide_element_along_nodes(0, 0, 1, false),
            Err(DivisionError::AdjacentSplitNodes { .. })
        ));
        assert!(matches!(
            mesh.divide_element_along_nodes(0, 0, 3, false),
            Err(DivisionError::AdjacentSplitNodes { .. })
        ));
        assert!(matches!(
            mesh.divide_element_along_nodes(0, 2, 2, false),
            Err(DivisionError::AdjacentSplitNodes { .. })
        ));
        assert_eq!(
            mesh.divide_element_along_nodes(0, 0, 4, false),
            Err(DivisionError::LocalIndexOutOfRange {
                element: 0,
                local: 4,
                num_nodes: 4
            })
        );
        assert_eq!(
            mesh.divide_element_along_nodes(9, 0, 2, false),
            Err(DivisionError::Access(MeshAccessError::UnknownElement {
                element: 9
            }))
        );
    }

    #[test]
    fn place_original_below_keeps_lower_half() {
        let points = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 2.0), p(0.0, 2.0)];
        let mut mesh =
            VertexMesh::from_loops(&points, vec![vec![0, 1, 2, 3]], RemeshConfig::default())
                .unwrap();
        let new_element = mesh
            .divide_element_along_axis(0, p(1.0, 0.0), true)
            .unwrap();
        assert!(
            mesh.element_centroid(0).unwrap().y() < mesh.element_centroid(new_element).unwrap().y()
        );
    }

    #[test]
    fn short_axis_division_of_tall_rectangle() {
        let points = [p(0.0, 0.0), p(1.0, 0.0), p(1.0, 2.0), p(0.0, 2.0)];
        let mut mesh =
            VertexMesh::from_loops(&points, vec![vec![0, 1, 2, 3]], RemeshConfig::default())
                .unwrap();
        let new_element = mesh.divide_element_along_short_axis(0, false).unwrap();
        assert_eq!(mesh.num_elements(), 2);
        assert_eq!(mesh.num_nodes(), 6);
        assert_relative_eq!(mesh.element_area(0).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.element_area(new_element).unwrap(), 1.0, epsilon = 1e-12);
        for n in [4, 5] {
            let location = mesh.node_location(n).unwrap();
            assert_relative_eq!(location.y(), 1.0, epsilon = 1e-12);
            assert!(mesh.node(n).unwrap().is_boundary());
        }
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn crossing_near_a_node_is_moved_clear() {
        // The horizontal line through the centroid passes 0.005 above node 4.
        let points = [
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(1.0, 0.995),
            p(1.0, 2.0),
            p(0.0, 2.0),
        ];
        let mut mesh =
            VertexMesh::from_loops(&points, vec![vec![0, 1, 2, 3, 4]], RemeshConfig::default())
                .unwrap();
        let centroid_y = mesh.element_centroid(0).unwrap().y();
        assert!((centroid_y - 1.0).abs() < 1e-12);
        mesh.divide_element_along_axis(0, p(1.0, 0.0), false)
            .unwrap();
        let clearance = mesh.config().division_node_clearance();
        // Node 5 is inserted on the left edge, node 6 on the right.
        assert_eq!(mesh.node_location(5), Some(p(0.0, 1.0)));
        let right = mesh.node_location(6).unwrap();
        assert_relative_eq!(right.x(), 1.0);
        assert_relative_eq!(right.y(), 0.995 + clearance, epsilon = 1e-12);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn degenerate_axis_is_rejected() {
        let mut mesh = two_squares();
        assert_eq!(
            mesh.divide_element_along_axis(0, p(0.0, 0.0), false),
            Err(DivisionError::DegenerateAxis { element: 0 })
        );
    }
}
