//! # vertex-mesh
//!
//! A dynamic, two-dimensional, vertex-based polygonal mesh for cell-sheet simulations.
//!
//! Each element of a [`VertexMesh`](core::vertex_mesh::VertexMesh) is a simple polygon given by
//! an ordered, counter-clockwise loop of nodes; neighbouring elements share nodes and edges.
//! As a simulation moves nodes, the mesh keeps itself consistent through local topological
//! rearrangements:
//!
//! - **node merges** and **T1 swaps** on edges that become too short;
//! - **T2 swaps** that remove vanishing triangular elements;
//! - **T3 swaps** that pull a boundary node back out of an element it has entered;
//! - **edge** and **element division**.
//!
//! # Basic Usage
//!
//! ```rust
//! use vertex_mesh::prelude::*;
//!
//! let mut mesh = honeycomb_mesh(5, 3, RemeshConfig::default()).unwrap();
//! assert_eq!(mesh.num_elements(), 15);
//! assert_eq!(mesh.num_nodes(), 46);
//!
//! // Divide the first cell across its short axis.
//! let new_element = mesh.divide_element_along_short_axis(0, false).unwrap();
//! assert_eq!(new_element, 15);
//! assert!(mesh.validate().is_ok());
//!
//! // Nothing is short or small, so remeshing only compacts.
//! let report = mesh.remesh().unwrap();
//! assert_eq!(report.stats.total_operations(), 0);
//! assert_eq!(mesh.num_elements(), 16);
//! ```
//!
//! # Rearranging a short edge
//!
//! ```rust
//! use vertex_mesh::prelude::*;
//!
//! let points = [
//!     Point2::new([-0.002, 0.0]),
//!     Point2::new([0.002, 0.0]),
//!     Point2::new([1.0, 1.0]),
//!     Point2::new([-1.0, 1.0]),
//!     Point2::new([-1.0, -1.0]),
//!     Point2::new([1.0, -1.0]),
//!     Point2::new([-2.0, 0.0]),
//!     Point2::new([2.0, 0.0]),
//! ];
//! let loops = vec![
//!     vec![0, 1, 2, 3],
//!     vec![1, 0, 4, 5],
//!     vec![4, 0, 3, 6],
//!     vec![1, 5, 7, 2],
//! ];
//! let mut mesh = VertexMesh::from_loops(&points, loops, RemeshConfig::default()).unwrap();
//!
//! let outcome = identify_swap_type(&mut mesh, 0, 1).unwrap();
//! assert_eq!(outcome.swap_type, SwapType::T1Swap);
//! // The top and bottom elements lost a node; the side elements gained one.
//! assert_eq!(mesh.element(0).unwrap().num_nodes(), 3);
//! assert_eq!(mesh.element(2).unwrap().num_nodes(), 5);
//! ```
//!
//! # Mesh Invariants
//!
//! [`VertexMesh::validate`](core::vertex_mesh::VertexMesh::validate) checks the structural
//! invariants that every public operation preserves:
//!
//! - every live node belongs to between one and three live elements;
//! - every live element has at least three distinct live nodes;
//! - node back-references and element loops agree in both directions;
//! - each record's index equals its position in storage.
//!
//! Deleted nodes and elements are tombstoned until
//! [`VertexMesh::compact`](core::vertex_mesh::VertexMesh::compact) (or a
//! [`remesh`](core::vertex_mesh::VertexMesh::remesh)) renumbers the survivors and returns
//! old-to-new [`IndexMap`](core::index_map::IndexMap)s.
//!
//! # Logging
//!
//! Operations emit [`tracing`](https://docs.rs/tracing) events: `debug!` for each
//! rearrangement, `warn!` when a division point is nudged,
//! and one `info!` summary per remesh. Install any `tracing` subscriber to see them.

#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// The `core` module contains the mesh data structure, its configuration, and the
/// topological operations that act on it.
pub mod core {
    /// Topological operations on a [`VertexMesh`](vertex_mesh::VertexMesh)
    pub mod algorithms {
        /// Edge and element division
        pub mod division;
        /// Node merges and T1, T2, and T3 swaps
        pub mod rearrangements;
        /// Worklist-driven remeshing
        pub mod remesh;
        pub use division::*;
        pub use rearrangements::*;
        pub use remesh::*;
    }
    /// Hash maps and small buffers used throughout the mesh
    pub mod collections;
    pub mod config;
    pub mod edge;
    pub mod element;
    pub mod index_map;
    pub mod node;
    pub mod vertex_mesh;
    // Re-export the `core` modules.
    pub use config::*;
    pub use edge::*;
    pub use element::*;
    pub use index_map::*;
    pub use node::*;
    pub use vertex_mesh::*;
    // Note: collections module not re-exported here to avoid namespace pollution
}

/// Contains the 2D point type, polygon measures, and geometric predicates used by the mesh.
pub mod geometry {
    pub mod point;
    /// Area, perimeter, centroid, moments, and gradients of simple polygons
    pub mod polygon;
    pub mod predicates;
    /// Mesh generators
    pub mod util;
    pub use point::*;
    pub use polygon::*;
    pub use predicates::*;
    pub use util::*;
}

/// A prelude module that re-exports commonly used types.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    pub use crate::core::{
        algorithms::{division::*, rearrangements::*, remesh::*},
        config::*,
        edge::*,
        element::*,
        index_map::*,
        node::*,
        vertex_mesh::*,
    };

    pub use crate::core::collections::{
        ElementIndexBuffer, FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    pub use crate::geometry::{point::*, polygon::*, predicates::*, util::*};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            algorithms::remesh::{RemeshError, RemeshReport},
            config::RemeshConfig,
            element::VertexElement,
            index_map::IndexMap,
            node::Node,
            vertex_mesh::VertexMesh,
        },
        geometry::point::Point2,
        is_normal,
    };

    // =============================================================================
    // TYPE SAFETY TESTS
    // =============================================================================

    #[test]
    fn normal_types() {
        assert!(is_normal::<Point2>());
        assert!(is_normal::<Node>());
        assert!(is_normal::<VertexElement>());
        assert!(is_normal::<VertexMesh>());
        assert!(is_normal::<RemeshConfig>());
        assert!(is_normal::<IndexMap>());
        assert!(is_normal::<RemeshReport>());
        assert!(is_normal::<RemeshError>());
    }

    #[test]
    fn prelude_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<EdgeKey, usize> = fast_hash_map_with_capacity(4);
        map.insert(EdgeKey::new(3, 1), 7);
        assert_eq!(map.get(&EdgeKey::new(1, 3)), Some(&7));

        let square = [
            Point2::new([0.0, 0.0]),
            Point2::new([1.0, 0.0]),
            Point2::new([1.0, 1.0]),
            Point2::new([0.0, 1.0]),
        ];
        assert!((signed_area(&square) - 1.0).abs() < 1e-12);
    }
}
