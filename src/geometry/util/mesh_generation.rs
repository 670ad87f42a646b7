//! Honeycomb mesh generation.
//!
//! Builds regular hexagonal sheets of [`VertexMesh`] elements, the usual starting state
//! for a vertex-model simulation, plus a seeded jittered variant for stress tests.

#![forbid(unsafe_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::collections::{FastHashMap, fast_hash_map_with_capacity};
use crate::core::config::RemeshConfig;
use crate::core::vertex_mesh::{MeshConstructionError, VertexMesh};
use crate::geometry::point::Point2;

/// Coordinates are bucketed at this resolution when shared hexagon corners are merged.
const VERTEX_DEDUP_SCALE: f64 = 1.0e6;

/// Builds a `num_across × num_up` sheet of regular pointy-top hexagons.
///
/// Hexagon centres are one unit apart within a row; odd rows are shifted half a unit to
/// the right so the rows interlock. Element loops are counter-clockwise and shared
/// corners become shared nodes. Elements are numbered row by row from the bottom left.
///
/// A zero dimension yields an empty mesh.
///
/// # Errors
///
/// Returns [`MeshConstructionError`] if `config` is invalid.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::config::RemeshConfig;
/// use vertex_mesh::geometry::util::honeycomb_mesh;
///
/// let mesh = honeycomb_mesh(3, 3, RemeshConfig::default()).unwrap();
/// assert_eq!(mesh.num_elements(), 9);
/// assert_eq!(mesh.num_nodes(), 30);
/// assert!(mesh.elements().all(|e| e.num_nodes() == 6));
/// ```
pub fn honeycomb_mesh(
    num_across: usize,
    num_up: usize,
    config: RemeshConfig,
) -> Result<VertexMesh, MeshConstructionError> {
    let radius = 1.0 / 3.0_f64.sqrt();
    let row_spacing = 1.5 * radius;
    let corner_offsets: [Point2; 6] = std::array::from_fn(|k| {
        #[expect(clippy::cast_precision_loss, reason = "k < 6")]
        let theta = (60.0 * k as f64 + 30.0).to_radians();
        Point2::new([radius * theta.cos(), radius * theta.sin()])
    });

    let mut points: Vec<Point2> = Vec::new();
    let mut lookup: FastHashMap<(i64, i64), usize> =
        fast_hash_map_with_capacity(2 * (num_across + 1) * (num_up + 1));
    let mut loops = Vec::with_capacity(num_across * num_up);

    for row in 0..num_up {
        for column in 0..num_across {
            #[expect(clippy::cast_precision_loss, reason = "mesh dimensions are small")]
            let centre = Point2::new([
                column as f64 + if row % 2 == 1 { 0.5 } else { 0.0 },
                row as f64 * row_spacing,
            ]);
            let nodes: Vec<usize> = corner_offsets
                .iter()
                .map(|offset| {
                    let corner = centre + *offset;
                    *lookup.entry(dedup_key(corner)).or_insert_with(|| {
                        points.push(corner);
                        points.len() - 1
                    })
                })
                .collect();
            loops.push(nodes);
        }
    }

    let mesh = VertexMesh::from_loops(&points, loops, config)?;
    tracing::debug!(
        "[mesh] generated {num_across}x{num_up} honeycomb: {} nodes, {} elements",
        mesh.num_nodes(),
        mesh.num_elements()
    );
    Ok(mesh)
}

/// Builds a honeycomb and displaces every node by a uniform offset in
/// `[-amplitude, amplitude)` along each axis, reproducibly for a given `seed`.
///
/// Amplitudes well below half the edge length (about 0.29) keep every element simple.
///
/// # Errors
///
/// Returns [`MeshConstructionError`] if `config` is invalid or a jittered node location is
/// not finite.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::config::RemeshConfig;
/// use vertex_mesh::geometry::util::jittered_honeycomb_mesh;
///
/// let a = jittered_honeycomb_mesh(4, 4, 0.05, 7, RemeshConfig::default()).unwrap();
/// let b = jittered_honeycomb_mesh(4, 4, 0.05, 7, RemeshConfig::default()).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn jittered_honeycomb_mesh(
    num_across: usize,
    num_up: usize,
    amplitude: f64,
    seed: u64,
    config: RemeshConfig,
) -> Result<VertexMesh, MeshConstructionError> {
    let mut mesh = honeycomb_mesh(num_across, num_up, config)?;
    if amplitude <= 0.0 {
        return Ok(mesh);
    }
    let mut rng = StdRng::seed_from_u64(seed);
    for node in 0..mesh.num_all_nodes() {
        let Some(location) = mesh.node_location(node) else {
            continue;
        };
        let offset = Point2::new([
            rng.random_range(-amplitude..amplitude),
            rng.random_range(-amplitude..amplitude),
        ]);
        let moved = location + offset;
        if !moved.is_finite() {
            return Err(MeshConstructionError::NonFiniteLocation { node });
        }
        mesh.set_node_location(node, moved)
            .map_err(|_| MeshConstructionError::NonFiniteLocation { node })?;
    }
    Ok(mesh)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "honeycomb coordinates are far inside the i64 range once scaled"
)]
fn dedup_key(p: Point2) -> (i64, i64) {
    (
        (p.x() * VERTEX_DEDUP_SCALE).round() as i64,
        (p.y() * VERTEX_DEDUP_SCALE).round() as i64,
    )
}
