//! Worklist-driven remeshing.
//!
//! [`VertexMesh::remesh`] restores local consistency after nodes have moved. It runs a
//! fixed sequence of passes, each driven by a FIFO worklist with de-duplication:
//!
//! 1. **short edges**: every edge shorter than the rearrangement threshold is merged or
//!    T1-swapped (see [`identify_swap_type`]); edges around the touched nodes are re-queued
//!    until a fixed point is reached;
//! 2. **T2**: triangular elements whose area is below the T2 threshold are removed;
//! 3. **overlap** (only with `check_for_intersections`): boundary nodes that have entered
//!    another element are moved onto its boundary;
//! 4. **edge growth**: edges longer than the division threshold are halved;
//! 5. **compaction**: tombstones are removed and survivors renumbered.
//!
//! Each pass is bounded by `max_operations_per_pass`; exceeding the bound aborts the
//! remesh with [`RemeshError::OperationLimitExceeded`].
//!
//! # Examples
//!
//! ```rust
//! use vertex_mesh::core::config::RemeshConfig;
//! use vertex_mesh::geometry::util::honeycomb_mesh;
//!
//! let mut mesh = honeycomb_mesh(5, 3, RemeshConfig::default()).unwrap();
//! let report = mesh.remesh().unwrap();
//! assert_eq!(report.stats.total_operations(), 0);
//! assert!(report.node_map.is_identity());
//! assert_eq!(mesh.num_elements(), 15);
//! ```

#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::algorithms::division::{DivisionError, divide_edge};
use crate::core::algorithms::rearrangements::{
    RearrangementError, SwapType, element_includes_point, identify_swap_type,
    move_overlapping_node_onto_edge, perform_t2_swap,
};
use crate::core::collections::FastHashSet;
use crate::core::edge::EdgeKey;
use crate::core::index_map::{ElementMap, NodeMap};
use crate::core::vertex_mesh::{MeshValidationError, VertexMesh};
use crate::geometry::point::Point2;

/// Edges within this relative distance of the rearrangement threshold are not short, so a
/// freshly swapped edge of exactly threshold length is left alone.
const SHORT_EDGE_RELATIVE_TOLERANCE: f64 = 1.0e-9;

/// The passes of a remesh, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemeshPass {
    /// Node merges and T1 swaps on short edges.
    ShortEdges,
    /// Removal of small triangular elements.
    T2Swaps,
    /// Repair of boundary nodes overlapping other elements.
    Overlaps,
    /// Division of long edges.
    EdgeDivision,
}

impl fmt::Display for RemeshPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ShortEdges => "short-edge",
            Self::T2Swaps => "T2",
            Self::Overlaps => "overlap",
            Self::EdgeDivision => "edge-division",
        };
        f.write_str(name)
    }
}

/// Counters and event locations gathered during one remesh.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::algorithms::remesh::RemeshStats;
///
/// let stats = RemeshStats::default();
/// assert_eq!(stats.total_operations(), 0);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RemeshStats {
    /// Edges popped from the short-edge worklist.
    pub edges_checked: usize,
    /// Node merges performed.
    pub node_merges: usize,
    /// T1 swaps performed.
    pub t1_swaps: usize,
    /// T2 swaps performed.
    pub t2_swaps: usize,
    /// Overlapping boundary nodes repaired.
    pub t3_swaps: usize,
    /// Edges divided for exceeding the division threshold.
    pub edge_divisions: usize,
    /// Largest worklist length observed.
    pub max_queue_len: usize,
    /// Edge midpoints at which T1 swaps happened.
    pub t1_locations: Vec<Point2>,
    /// Centroids of the elements removed by T2 swaps.
    pub t2_locations: Vec<Point2>,
}

impl RemeshStats {
    /// Total number of topology-changing operations.
    #[must_use]
    pub const fn total_operations(&self) -> usize {
        self.node_merges + self.t1_swaps + self.t2_swaps + self.t3_swaps + self.edge_divisions
    }
}

/// Result of a successful remesh.
#[derive(Clone, Debug, PartialEq)]
pub struct RemeshReport {
    /// Old-to-new node indices.
    pub node_map: NodeMap,
    /// Old-to-new element indices.
    pub element_map: ElementMap,
    /// What the remesh did.
    pub stats: RemeshStats,
}

/// Errors that abort a remesh.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemeshError {
    /// The mesh failed validation before the passes or after compaction.
    #[error("Mesh failed validation during remeshing: {0}")]
    InvalidMesh(#[from] MeshValidationError),
    /// A rearrangement failed.
    #[error(transparent)]
    Rearrangement(#[from] RearrangementError),
    /// An edge division failed.
    #[error(transparent)]
    Division(#[from] DivisionError),
    /// A pass did not reach a fixed point within the operation budget.
    #[error("Remesh {pass} pass exceeded {limit} operations")]
    OperationLimitExceeded {
        /// The pass that ran away.
        pass: RemeshPass,
        /// Budget in force.
        limit: usize,
    },
}

/// Operation budget shared by the steps of one pass.
struct PassBudget {
    pass: RemeshPass,
    limit: usize,
    used: usize,
}

impl PassBudget {
    const fn new(pass: RemeshPass, limit: usize) -> Self {
        Self {
            pass,
            limit,
            used: 0,
        }
    }

    fn spend(&mut self) -> Result<(), RemeshError> {
        self.used += 1;
        if self.used > self.limit {
            return Err(RemeshError::OperationLimitExceeded {
                pass: self.pass,
                limit: self.limit,
            });
        }
        Ok(())
    }
}

/// FIFO worklist that ignores items already waiting in it.
struct Worklist<T> {
    queue: VecDeque<T>,
    queued: FastHashSet<T>,
}

impl<T: Copy + Eq + std::hash::Hash> Worklist<T> {
    fn new(items: impl IntoIterator<Item = T>) -> Self {
        let mut worklist = Self {
            queue: VecDeque::new(),
            queued: FastHashSet::default(),
        };
        for item in items {
            worklist.push(item);
        }
        worklist
    }

    fn push(&mut self, item: T) {
        if self.queued.insert(item) {
            self.queue.push_back(item);
        }
    }

    fn pop(&mut self) -> Option<T> {
        let item = self.queue.pop_front()?;
        self.queued.remove(&item);
        Some(item)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

fn enqueue_edges_around(mesh: &VertexMesh, node: usize, worklist: &mut Worklist<EdgeKey>) {
    if let Some(neighbours) = mesh.neighbouring_node_indices(node) {
        for other in neighbours {
            worklist.push(EdgeKey::new(node, other));
        }
    }
}

// =============================================================================
// PASSES
// =============================================================================

fn short_edge_pass(mesh: &mut VertexMesh, stats: &mut RemeshStats) -> Result<(), RemeshError> {
    let threshold = mesh.cell_rearrangement_threshold();
    let mut budget = PassBudget::new(RemeshPass::ShortEdges, mesh.config().max_operations_per_pass);
    let mut worklist = Worklist::new(mesh.edges());
    stats.max_queue_len = stats.max_queue_len.max(worklist.len());

    while let Some(edge) = worklist.pop() {
        stats.edges_checked += 1;
        let (a, b) = edge.endpoints();
        let Some(length) = mesh.distance_between_nodes(a, b) else {
            tracing::trace!("[remesh] skip edge ({a}, {b}): endpoint deleted");
            continue;
        };
        if length >= threshold * (1.0 - SHORT_EDGE_RELATIVE_TOLERANCE) {
            continue;
        }
        if mesh.elements_containing_edge(a, b).is_empty() {
            tracing::trace!("[remesh] skip edge ({a}, {b}): no longer an edge");
            continue;
        }

        budget.spend()?;
        let outcome = identify_swap_type(mesh, a, b)?;
        match outcome.swap_type {
            SwapType::NodeMerge => stats.node_merges += 1,
            SwapType::T1Swap => {
                stats.t1_swaps += 1;
                stats.t1_locations.push(outcome.location);
            }
        }

        for n in [a, b] {
            enqueue_edges_around(mesh, n, &mut worklist);
        }
        stats.max_queue_len = stats.max_queue_len.max(worklist.len());
    }
    Ok(())
}

fn t2_pass(mesh: &mut VertexMesh, stats: &mut RemeshStats) -> Result<(), RemeshError> {
    let threshold = mesh.t2_threshold();
    let mut budget = PassBudget::new(RemeshPass::T2Swaps, mesh.config().max_operations_per_pass);
    let mut worklist = Worklist::new(
        mesh.elements()
            .filter(|e| e.is_triangle())
            .map(|e| e.index())
            .collect::<Vec<_>>(),
    );

    while let Some(element) = worklist.pop() {
        let Some(area) = mesh.element_area(element) else {
            continue;
        };
        if mesh.element(element).is_none_or(|e| !e.is_triangle()) || area >= threshold {
            continue;
        }
        let Some(location) = mesh.element_centroid(element) else {
            continue;
        };

        budget.spend()?;
        let new_node = perform_t2_swap(mesh, element)?;
        stats.t2_swaps += 1;
        stats.t2_locations.push(location);
        if let Some(node) = mesh.node(new_node) {
            for &e in node.containing_elements() {
                worklist.push(e);
            }
        }
    }
    Ok(())
}

fn overlap_pass(mesh: &mut VertexMesh, stats: &mut RemeshStats) -> Result<(), RemeshError> {
    let mut budget = PassBudget::new(RemeshPass::Overlaps, mesh.config().max_operations_per_pass);
    let boundary_nodes: Vec<usize> = mesh
        .nodes()
        .filter(|n| n.is_boundary())
        .map(|n| n.index())
        .collect();

    for node in boundary_nodes {
        let Some(location) = mesh.node_location(node) else {
            continue;
        };
        let candidates: Vec<usize> = mesh
            .elements()
            .filter(|e| !e.contains_node(node))
            .map(|e| e.index())
            .collect();
        for element in candidates {
            if !element_includes_point(mesh, location, element).map_err(RearrangementError::from)? {
                continue;
            }
            budget.spend()?;
            move_overlapping_node_onto_edge(mesh, node, element)?;
            stats.t3_swaps += 1;
            break;
        }
    }
    Ok(())
}

fn edge_division_pass(mesh: &mut VertexMesh, stats: &mut RemeshStats) -> Result<(), RemeshError> {
    let threshold = mesh.edge_division_threshold();
    let mut budget = PassBudget::new(
        RemeshPass::EdgeDivision,
        mesh.config().max_operations_per_pass,
    );
    let mut worklist = Worklist::new(mesh.edges());

    while let Some(edge) = worklist.pop() {
        let (a, b) = edge.endpoints();
        let Some(length) = mesh.distance_between_nodes(a, b) else {
            continue;
        };
        if length <= threshold {
            continue;
        }
        budget.spend()?;
        let midpoint = divide_edge(mesh, a, b)?;
        stats.edge_divisions += 1;
        worklist.push(EdgeKey::new(a, midpoint));
        worklist.push(EdgeKey::new(midpoint, b));
    }
    Ok(())
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

impl VertexMesh {
    /// Rearranges the mesh until no edge is shorter than the rearrangement threshold, no
    /// triangle is smaller than the T2 threshold and no edge is longer than the division
    /// threshold, then compacts it.
    ///
    /// Returns the old-to-new index maps together with statistics.
    ///
    /// # Errors
    ///
    /// - [`RemeshError::InvalidMesh`] if the mesh fails validation beforehand (a node in
    ///   more than three elements, for example) or after compaction;
    /// - [`RemeshError::Rearrangement`] or [`RemeshError::Division`] if an operation fails,
    ///   including a short edge on a triangle or a small triangle next to another triangle;
    /// - [`RemeshError::OperationLimitExceeded`] if a pass does not converge.
    ///
    /// There is no rollback. The failing operation itself leaves the mesh untouched, but
    /// operations completed earlier in the call stay applied and their tombstones are not
    /// compacted.
    pub fn remesh(&mut self) -> Result<RemeshReport, RemeshError> {
        self.validate()?;
        let mut stats = RemeshStats::default();

        short_edge_pass(self, &mut stats)?;
        t2_pass(self, &mut stats)?;
        if self.check_for_intersections() {
            overlap_pass(self, &mut stats)?;
        }
        edge_division_pass(self, &mut stats)?;

        let (node_map, element_map) = self.compact();
        self.validate()?;

        tracing::info!(
            "[remesh] done: merges={} t1={} t2={} t3={} divisions={} edges_checked={} nodes={} elements={}",
            stats.node_merges,
            stats.t1_swaps,
            stats.t2_swaps,
            stats.t3_swaps,
            stats.edge_divisions,
            stats.edges_checked,
            self.num_nodes(),
            self.num_elements()
        );
        Ok(RemeshReport {
            node_map,
            element_map,
            stats,
        })
    }
}
