//! Integration tests for T1 and T2 swaps on small sheets.
//!
//! Rearrangements of interior nodes must not change the area covered by the sheet, must
//! keep every node in at most three elements, and must leave a mesh that validates.

use approx::assert_relative_eq;
use vertex_mesh::prelude::*;

fn p(x: f64, y: f64) -> Point2 {
    Point2::new([x, y])
}

fn total_loop_length(mesh: &VertexMesh) -> usize {
    mesh.elements().map(VertexElement::num_nodes).sum()
}

/// Pulls the two endpoints of an edge to within `gap` of each other about its midpoint.
fn shrink_edge(mesh: &mut VertexMesh, a: usize, b: usize, gap: f64) {
    let pa = mesh.node_location(a).unwrap();
    let pb = mesh.node_location(b).unwrap();
    let mid = pa.midpoint(&pb);
    let dir = (pb - pa).normalized().unwrap();
    mesh.set_node_location(a, mid - dir * (0.5 * gap)).unwrap();
    mesh.set_node_location(b, mid + dir * (0.5 * gap)).unwrap();
}

#[test]
fn t1_swap_in_honeycomb_preserves_invariants() {
    let mut mesh = honeycomb_mesh(3, 3, RemeshConfig::default()).unwrap();
    let centre = mesh.element(4).unwrap();
    let (a, b) = (centre.node(0), centre.node(1));
    assert!(!mesh.node(a).unwrap().is_boundary());
    assert!(!mesh.node(b).unwrap().is_boundary());

    shrink_edge(&mut mesh, a, b, 0.004);
    let area_before = mesh.total_area();
    let loops_before = total_loop_length(&mesh);
    let old_shared = mesh.shared_elements(a, b);
    assert_eq!(old_shared.len(), 2);

    let outcome = identify_swap_type(&mut mesh, a, b).unwrap();
    assert_eq!(outcome.swap_type, SwapType::T1Swap);
    assert!(outcome.deleted_elements.is_empty());

    assert!(mesh.validate().is_ok());
    assert_eq!(mesh.num_elements(), 9);
    assert_eq!(mesh.num_nodes(), 30);
    assert_eq!(total_loop_length(&mesh), loops_before);
    assert_relative_eq!(mesh.total_area(), area_before, epsilon = 1e-9);
    assert_relative_eq!(
        mesh.distance_between_nodes(a, b).unwrap(),
        mesh.config().t1_new_edge_length(),
        epsilon = 1e-12
    );

    // The edge now separates the two elements that previously met only at its ends.
    let new_shared = mesh.shared_elements(a, b);
    assert_eq!(new_shared.len(), 2);
    assert!(new_shared.iter().all(|e| !old_shared.contains(e)));
    assert_eq!(mesh.element(4).unwrap().num_nodes(), 5);
    for node in mesh.nodes() {
        assert!(node.num_containing_elements() <= 3);
    }
}

#[test]
fn t2_swap_preserves_sheet_area() {
    let r = 0.05;
    let s = 3.0_f64.sqrt() / 2.0;
    let points = [
        p(r, 0.0),
        p(-0.5 * r, s * r),
        p(-0.5 * r, -s * r),
        p(2.0, 0.0),
        p(-1.0, 2.0 * s),
        p(-1.0, -2.0 * s),
    ];
    let mut mesh = VertexMesh::from_loops(
        &points,
        vec![
            vec![0, 1, 2],
            vec![1, 0, 3, 4],
            vec![2, 1, 4, 5],
            vec![0, 2, 5, 3],
        ],
        RemeshConfig::default(),
    )
    .unwrap();
    let area_before = mesh.total_area();
    let centroid_before = mesh.element_centroid(0).unwrap();

    let new_node = perform_t2_swap(&mut mesh, 0).unwrap();

    assert!(mesh.validate().is_ok());
    assert!(mesh.element(0).is_none());
    assert_eq!(mesh.num_elements(), 3);
    assert_eq!(mesh.num_nodes(), 4);
    assert_relative_eq!(mesh.total_area(), area_before, epsilon = 1e-12);
    let location = mesh.node_location(new_node).unwrap();
    assert_relative_eq!(location.x(), centroid_before.x(), epsilon = 1e-12);
    assert_relative_eq!(location.y(), centroid_before.y(), epsilon = 1e-12);
    assert_eq!(mesh.node(new_node).unwrap().num_containing_elements(), 3);
    // Each neighbour traded two corners of the triangle for the new node.
    for element in mesh.elements() {
        assert!(element.contains_node(new_node));
        assert_eq!(element.num_nodes(), 3);
    }
}

#[test]
fn swapping_distant_nodes_is_refused() {
    let mut mesh = honeycomb_mesh(3, 3, RemeshConfig::default()).unwrap();
    let a = mesh.element(0).unwrap().node(0);
    let b = mesh.element(8).unwrap().node(3);
    let before = mesh.clone();

    let err = identify_swap_type(&mut mesh, a, b).unwrap_err();
    assert_eq!(err, RearrangementError::NotNeighbours { a, b });
    assert!(err.to_string().contains("not neighbours"));
    assert_eq!(mesh, before);
}

#[test]
fn merge_on_sheet_boundary_removes_node() {
    let mut mesh = honeycomb_mesh(2, 1, RemeshConfig::default()).unwrap();
    // The top and bottom corners of the first hexagon that are not shared.
    let hexagon = mesh.element(0).unwrap();
    let (a, b) = (hexagon.node(2), hexagon.node(3));
    assert!(mesh.node(a).unwrap().is_boundary());
    assert!(mesh.node(b).unwrap().is_boundary());
    shrink_edge(&mut mesh, a, b, 0.004);

    let outcome = identify_swap_type(&mut mesh, a, b).unwrap();
    assert_eq!(outcome.swap_type, SwapType::NodeMerge);
    assert!(mesh.node(a).is_none());
    assert_eq!(mesh.element(0).unwrap().num_nodes(), 5);
    assert!(mesh.validate().is_ok());

    let (node_map, element_map) = mesh.compact();
    assert_eq!(node_map.num_deleted(), 1);
    assert!(element_map.is_identity());
    assert_eq!(mesh.num_all_nodes(), 9);
}

/// Four elements around a notch in the sheet boundary. The short edge (0, 1) belongs only
/// to element 0; node 0 also sits in elements 1 and 2. With `split_right` the element to
/// the right of node 1 is split in two, so node 1 sits in three elements as well.
fn boundary_notch(split_right: bool) -> VertexMesh {
    let mut points = vec![
        p(0.0, 0.0),
        p(0.005, 0.0),
        p(1.0, 1.0),
        p(-0.5, 1.0),
        p(-1.5, 0.5),
        p(-1.0, 0.0),
        p(-1.0, -1.0),
        p(-0.3, -1.0),
        p(0.5, -1.0),
        p(2.0, -1.0),
        p(2.0, 1.0),
    ];
    let mut loops = vec![vec![0, 1, 2, 3], vec![0, 3, 4, 5], vec![0, 5, 6, 7]];
    if split_right {
        points.push(p(2.0, 0.0));
        loops.push(vec![1, 8, 9, 11]);
        loops.push(vec![1, 11, 10, 2]);
    } else {
        loops.push(vec![1, 8, 9, 10, 2]);
    }
    VertexMesh::from_loops(&points, loops, RemeshConfig::default()).unwrap()
}

#[test]
fn t1_at_boundary_notch_is_refused() {
    let mut mesh = boundary_notch(false);
    assert!(mesh.validate().is_ok());
    assert!(mesh.node(0).unwrap().is_boundary());
    assert_eq!(mesh.elements_containing_edge(0, 1).len(), 1);
    assert_eq!(classify_short_edge(&mesh, 0, 1), Ok(SwapType::T1Swap));
    let before = mesh.clone();

    assert_eq!(
        identify_swap_type(&mut mesh, 0, 1).unwrap_err(),
        RearrangementError::NodeValenceExceeded {
            node: 0,
            num_elements: 4
        }
    );
    assert_eq!(mesh, before);
    assert!(mesh.validate().is_ok());
}

#[test]
fn merge_at_boundary_notch_is_refused() {
    let mut mesh = boundary_notch(true);
    assert!(mesh.validate().is_ok());
    assert_eq!(mesh.node(1).unwrap().num_containing_elements(), 3);
    assert_eq!(mesh.union_of_containing_elements(0, 1).len(), 5);
    let before = mesh.clone();

    assert_eq!(
        identify_swap_type(&mut mesh, 0, 1).unwrap_err(),
        RearrangementError::NodeValenceExceeded {
            node: 1,
            num_elements: 5
        }
    );
    assert_eq!(mesh, before);

    assert!(matches!(
        mesh.remesh(),
        Err(RemeshError::Rearrangement(
            RearrangementError::NodeValenceExceeded { node: 1, .. }
        ))
    ));
}
