//! Saved graphs reload to the same structure and cook to the same geometry

use sopgraph::file_manager::{load_graph, save_graph, SaveData};
use sopgraph::{NodeGraph, NodeGraphEngine, NodeRegistry};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("sopgraph-{}-{}.json", name, std::process::id()))
}

fn build() -> (NodeGraph, usize) {
    let mut graph = NodeGraph::default();
    let sphere = graph.create_node("Sphere").unwrap();
    let grid = graph.create_node("Grid").unwrap();
    let scatter = graph.create_node("Scatter").unwrap();
    let xform = graph.create_node("Transform").unwrap();
    let merge = graph.create_node("Merge").unwrap();
    let wrangle = graph.create_node("Wrangle").unwrap();

    graph.set_parameter(sphere, "rings", 8i64).unwrap();
    graph.set_parameter(scatter, "seed", 1234i64).unwrap();
    graph.set_parameter(xform, "rotate_y", 45.0).unwrap();
    graph.set_parameter(wrangle, "expression", "Py = Py * 2; weight = ptnum / numpt").unwrap();
    graph.set_title(wrangle, "stretch").unwrap();

    graph.connect(scatter, 0, grid, 0).unwrap();
    graph.connect(xform, 0, sphere, 0).unwrap();
    graph.connect(merge, 0, xform, 0).unwrap();
    graph.connect(merge, 1, scatter, 0).unwrap();
    graph.connect(wrangle, 0, merge, 0).unwrap();
    (graph, wrangle)
}

#[test]
fn test_round_trip_cooks_identical_geometry() {
    let (graph, output) = build();
    let path = temp_path("round-trip");
    save_graph(&path, &graph).unwrap();
    let loaded = load_graph(&path, NodeRegistry::global()).unwrap();
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded.node_ids(), graph.node_ids());
    assert_eq!(loaded.connections(), graph.connections());
    assert_eq!(loaded.node(output).unwrap().title(), "stretch");

    let original = NodeGraphEngine::new().cook(&graph, output).unwrap();
    let restored = NodeGraphEngine::new().cook(&loaded, output).unwrap();
    assert_eq!(original, restored);
    assert!(restored.point_attribute("weight").is_some());
}

#[test]
fn test_save_file_layout() {
    let (graph, _) = build();
    let data = SaveData::from_graph(&graph, "layout");
    let json: serde_json::Value = serde_json::to_value(&data).unwrap();

    assert_eq!(json["version"], "1.0");
    assert!(json["metadata"]["created"].is_string());
    assert!(json["metadata"]["creator"].as_str().unwrap().starts_with("sopgraph"));
    let nodes = json["graph"]["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 6);
    assert_eq!(nodes[0]["node_type"], "Sphere");
}

#[test]
fn test_missing_file_is_persistence_error() {
    let err = load_graph(&temp_path("does-not-exist"), NodeRegistry::global()).unwrap_err();
    assert!(err.to_string().contains("persistence"));
}
