//! End-to-end remeshing and serialization tests on honeycomb sheets.

use approx::assert_relative_eq;
use vertex_mesh::prelude::*;

#[test]
fn remeshing_a_relaxed_honeycomb_changes_nothing() {
    let mut mesh = honeycomb_mesh(5, 3, RemeshConfig::default()).unwrap();
    let before = mesh.clone();

    let report = mesh.remesh().unwrap();
    assert_eq!(report.stats.total_operations(), 0);
    assert!(report.stats.edges_checked > 0);
    assert!(report.node_map.is_identity());
    assert!(report.element_map.is_identity());
    assert_eq!(report.node_map.len(), 46);
    assert_eq!(report.element_map.len(), 15);
    assert_eq!(mesh.num_elements(), 15);
    assert_eq!(mesh.num_nodes(), 46);
    assert_eq!(mesh, before);
}

#[test]
fn remesh_resolves_a_short_interior_edge() {
    let mut mesh = honeycomb_mesh(3, 3, RemeshConfig::default()).unwrap();
    let centre = mesh.element(4).unwrap();
    let (a, b) = (centre.node(3), centre.node(4));
    let pa = mesh.node_location(a).unwrap();
    let pb = mesh.node_location(b).unwrap();
    let mid = pa.midpoint(&pb);
    let dir = (pb - pa).normalized().unwrap();
    mesh.set_node_location(a, mid - dir * 0.002).unwrap();
    mesh.set_node_location(b, mid + dir * 0.002).unwrap();
    let area = mesh.total_area();

    let report = mesh.remesh().unwrap();
    assert_eq!(report.stats.t1_swaps, 1);
    assert_eq!(report.stats.total_operations(), 1);
    assert_eq!(report.stats.t1_locations.len(), 1);
    assert_relative_eq!(report.stats.t1_locations[0].x(), mid.x(), epsilon = 1e-12);
    assert_relative_eq!(report.stats.t1_locations[0].y(), mid.y(), epsilon = 1e-12);
    assert!(report.node_map.is_identity());
    assert!(mesh.validate().is_ok());
    assert_relative_eq!(mesh.total_area(), area, epsilon = 1e-9);

    let threshold = mesh.cell_rearrangement_threshold();
    for edge in mesh.edges() {
        let (u, v) = edge.endpoints();
        // The swapped edge is exactly the threshold long, up to rounding.
        assert!(mesh.distance_between_nodes(u, v).unwrap() >= threshold * (1.0 - 1e-9));
    }
}

#[test]
fn remesh_divides_long_boundary_edges() {
    let config = RemeshConfigBuilder::default()
        .edge_division_threshold(0.5)
        .build()
        .unwrap();
    let mut mesh = honeycomb_mesh(2, 2, config).unwrap();
    let area = mesh.total_area();

    let report = mesh.remesh().unwrap();
    // Every hexagon side is 1/sqrt(3) ~ 0.577 long, so each edge is halved once.
    let num_edges = honeycomb_mesh(2, 2, RemeshConfig::default())
        .unwrap()
        .edges()
        .len();
    assert_eq!(report.stats.edge_divisions, num_edges);
    assert_eq!(mesh.num_nodes(), 16 + num_edges);
    assert!(mesh.validate().is_ok());
    assert_relative_eq!(mesh.total_area(), area, epsilon = 1e-9);
    assert!(mesh.elements().all(|e| e.num_nodes() == 12));
}

#[test]
fn jittered_sheet_survives_remesh() {
    let mut mesh = jittered_honeycomb_mesh(6, 6, 0.05, 42, RemeshConfig::default()).unwrap();
    let area = mesh.total_area();
    let report = mesh.remesh().unwrap();
    assert!(mesh.validate().is_ok());
    assert_eq!(mesh.num_elements(), 36);
    assert_eq!(report.stats.t2_swaps, 0);
    assert_relative_eq!(mesh.total_area(), area, epsilon = 1e-9);
}

#[test]
fn mesh_json_roundtrip() {
    let mut mesh = honeycomb_mesh(3, 2, RemeshConfig::default()).unwrap();
    mesh.set_element_attribute(2, Some(1.5)).unwrap();
    mesh.divide_element_along_axis(0, Point2::new([0.0, 1.0]), false)
        .unwrap();

    let json = serde_json::to_string(&mesh).unwrap();
    let back: VertexMesh = serde_json::from_str(&json).unwrap();
    assert_eq!(back, mesh);
    assert_eq!(back.element(2).unwrap().attribute(), Some(1.5));
    assert_eq!(back.num_elements(), 7);
    assert!(back.validate().is_ok());
}

#[test]
fn mesh_json_roundtrip_keeps_tombstones() {
    let mut mesh = honeycomb_mesh(2, 1, RemeshConfig::default()).unwrap();
    let hexagon = mesh.element(0).unwrap();
    let (a, b) = (hexagon.node(2), hexagon.node(3));
    perform_node_merge(&mut mesh, a, b).unwrap();

    let json = serde_json::to_string(&mesh).unwrap();
    let back: VertexMesh = serde_json::from_str(&json).unwrap();
    assert_eq!(back, mesh);
    assert!(back.node(a).is_none());
    assert_eq!(back.num_all_nodes(), 10);
    assert_eq!(back.num_nodes(), 9);
}

#[test]
fn invalid_json_is_rejected() {
    // Element 0 names a node that does not exist.
    let json = r#"{
        "nodes": [
            {"index": 0, "location": [0.0, 0.0], "is_boundary": true},
            {"index": 1, "location": [1.0, 0.0], "is_boundary": true},
            {"index": 2, "location": [0.0, 1.0], "is_boundary": true}
        ],
        "elements": [{"index": 0, "nodes": [0, 1, 7]}]
    }"#;
    assert!(serde_json::from_str::<VertexMesh>(json).is_err());
}
