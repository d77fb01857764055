//! End-to-end behaviour of the graph, registry and cook engine

use glam::Vec3;
use sopgraph::error::{ConfigurationError, EvaluationError, SopError, SystemError, TopologyError};
use sopgraph::nodes::{
    CookContext, InputConfig, NodeCategory, NodeMetadata, NodeRegistry, NodeRegistryBuilder, SopOperator,
};
use sopgraph::{EngineConfig, Geometry, NodeGraph, NodeGraphEngine, NodeState, NodeType, ParameterValue};
use std::sync::Arc;

fn sequential() -> NodeGraphEngine {
    NodeGraphEngine::with_config(EngineConfig {
        parallel_branches: false,
        ..EngineConfig::default()
    })
}

#[test]
fn test_builtin_catalog_order() {
    let names: Vec<&str> = NodeRegistry::global()
        .type_catalog()
        .iter()
        .map(|info| info.type_id.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Sphere", "Box", "Grid", "Transform", "Smooth", "Scatter", "Wrangle", "Null", "Merge", "Boolean"]
    );
}

#[test]
fn test_unknown_type_is_rejected() {
    let mut graph = NodeGraph::default();
    assert!(matches!(
        graph.create_node("Teapot"),
        Err(SopError::System(SystemError::UnknownNodeType(_)))
    ));
    assert!(graph.is_empty());
}

#[test]
fn test_set_then_get_parameter() {
    let mut graph = NodeGraph::default();
    let sphere = graph.create_node("Sphere").unwrap();
    graph.set_parameter(sphere, "radius", 3.5).unwrap();
    assert_eq!(graph.get_parameter(sphere, "radius").unwrap(), ParameterValue::Float(3.5));
    graph.set_parameter(sphere, "segments", 12i64).unwrap();
    assert_eq!(graph.get_parameter(sphere, "segments").unwrap(), ParameterValue::Int(12));
}

#[test]
fn test_invalid_set_leaves_value_and_state_unchanged() {
    let mut graph = NodeGraph::default();
    let sphere = graph.create_node("Sphere").unwrap();
    let engine = sequential();
    engine.cook(&graph, sphere).unwrap();
    let generation = graph.node(sphere).unwrap().generation();

    let out_of_range = graph.set_parameter(sphere, "radius", 1000.0).unwrap_err();
    assert!(matches!(
        out_of_range,
        SopError::Configuration(ConfigurationError::OutOfRange { .. })
    ));
    let wrong_kind = graph.set_parameter(sphere, "radius", "big").unwrap_err();
    assert!(matches!(
        wrong_kind,
        SopError::Configuration(ConfigurationError::TypeMismatch { .. })
    ));
    let unknown = graph.set_parameter(sphere, "colour", 1.0).unwrap_err();
    assert!(matches!(
        unknown,
        SopError::Configuration(ConfigurationError::UnknownParameter { .. })
    ));

    assert_eq!(graph.get_parameter(sphere, "radius").unwrap(), ParameterValue::Float(1.0));
    assert_eq!(graph.node(sphere).unwrap().generation(), generation);
    assert_eq!(engine.node_state(&graph, sphere).unwrap(), NodeState::Clean);
}

#[test]
fn test_choice_parameter_rejects_unknown_option() {
    let mut graph = NodeGraph::default();
    let boolean = graph.create_node("Boolean").unwrap();
    assert!(matches!(
        graph.set_parameter(boolean, "operation", 3i64),
        Err(SopError::Configuration(ConfigurationError::InvalidOption { .. }))
    ));
    graph.set_parameter(boolean, "operation", 2i64).unwrap();
}

#[test]
fn test_second_cook_is_cache_hit() {
    let mut graph = NodeGraph::default();
    let sphere = graph.create_node("Sphere").unwrap();
    let xform = graph.create_node("Transform").unwrap();
    graph.connect(xform, 0, sphere, 0).unwrap();
    let engine = sequential();

    let first = engine.cook(&graph, xform).unwrap();
    let second = engine.cook(&graph, xform).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(graph.node(sphere).unwrap().cook_count(), 1);
    assert_eq!(graph.node(xform).unwrap().cook_count(), 1);
}

#[test]
fn test_dirtying_touches_exactly_downstream_closure() {
    let mut graph = NodeGraph::default();
    let grid = graph.create_node("Grid").unwrap();
    let sphere = graph.create_node("Sphere").unwrap();
    let xform = graph.create_node("Transform").unwrap();
    let merge = graph.create_node("Merge").unwrap();
    let null = graph.create_node("Null").unwrap();
    graph.connect(xform, 0, sphere, 0).unwrap();
    graph.connect(merge, 0, xform, 0).unwrap();
    graph.connect(merge, 1, grid, 0).unwrap();
    graph.connect(null, 0, merge, 0).unwrap();

    let engine = sequential();
    engine.cook(&graph, null).unwrap();
    assert_eq!(engine.stats(&graph).clean_nodes, 5);

    graph.set_parameter(xform, "translate_x", 1.0).unwrap();
    for (id, expected) in [
        (grid, NodeState::Clean),
        (sphere, NodeState::Clean),
        (xform, NodeState::Dirty),
        (merge, NodeState::Dirty),
        (null, NodeState::Dirty),
    ] {
        assert_eq!(engine.node_state(&graph, id).unwrap(), expected, "node {}", id);
    }

    engine.cook(&graph, null).unwrap();
    assert_eq!(graph.node(sphere).unwrap().cook_count(), 1);
    assert_eq!(graph.node(xform).unwrap().cook_count(), 2);
}

#[test]
fn test_connection_changes_dirty_exactly_downstream_closure() {
    let mut graph = NodeGraph::default();
    let grid = graph.create_node("Grid").unwrap();
    let sphere = graph.create_node("Sphere").unwrap();
    let xform = graph.create_node("Transform").unwrap();
    let merge = graph.create_node("Merge").unwrap();
    let null = graph.create_node("Null").unwrap();
    graph.connect(xform, 0, sphere, 0).unwrap();
    graph.connect(merge, 0, xform, 0).unwrap();
    graph.connect(merge, 1, grid, 0).unwrap();
    graph.connect(null, 0, merge, 0).unwrap();

    let engine = sequential();
    let assert_states = |graph: &NodeGraph, expected: [(usize, NodeState); 5]| {
        for (id, state) in expected {
            assert_eq!(engine.node_state(graph, id).unwrap(), state, "node {}", id);
        }
    };

    engine.cook(&graph, null).unwrap();
    graph.disconnect(merge, 1).unwrap();
    assert_states(
        &graph,
        [
            (grid, NodeState::Clean),
            (sphere, NodeState::Clean),
            (xform, NodeState::Clean),
            (merge, NodeState::Dirty),
            (null, NodeState::Dirty),
        ],
    );

    engine.cook(&graph, null).unwrap();
    graph.connect(xform, 0, grid, 0).unwrap();
    assert_states(
        &graph,
        [
            (grid, NodeState::Clean),
            (sphere, NodeState::Clean),
            (xform, NodeState::Dirty),
            (merge, NodeState::Dirty),
            (null, NodeState::Dirty),
        ],
    );

    engine.cook(&graph, null).unwrap();
    assert_eq!(graph.node(grid).unwrap().cook_count(), 1);
    assert_eq!(graph.node(sphere).unwrap().cook_count(), 1);
    assert_eq!(graph.node(xform).unwrap().cook_count(), 2);
    assert_eq!(graph.node(merge).unwrap().cook_count(), 3);
}

#[test]
fn test_writing_same_value_keeps_cache() {
    let mut graph = NodeGraph::default();
    let sphere = graph.create_node("Sphere").unwrap();
    let engine = sequential();
    engine.cook(&graph, sphere).unwrap();
    graph.set_parameter(sphere, "radius", 1.0).unwrap();
    assert_eq!(engine.node_state(&graph, sphere).unwrap(), NodeState::Clean);
}

#[test]
fn test_cycle_rejection_leaves_graph_unchanged() {
    let mut graph = NodeGraph::default();
    let sphere = graph.create_node("Sphere").unwrap();
    let a = graph.create_node("Transform").unwrap();
    let b = graph.create_node("Transform").unwrap();
    graph.connect(a, 0, sphere, 0).unwrap();
    graph.connect(b, 0, a, 0).unwrap();
    let before = graph.connections();
    let generation = graph.node(a).unwrap().generation();

    let err = graph.connect(a, 0, b, 0).unwrap_err();
    assert!(matches!(err, SopError::Topology(TopologyError::CycleDetected { .. })));
    let self_loop = graph.connect(b, 0, b, 0).unwrap_err();
    assert!(matches!(self_loop, SopError::Topology(TopologyError::CycleDetected { .. })));

    assert_eq!(graph.connections(), before);
    assert_eq!(graph.node(a).unwrap().generation(), generation);
    assert_eq!(graph.topological_order().unwrap(), vec![sphere, a, b]);
}

#[test]
fn test_generator_accepts_no_inputs() {
    let mut graph = NodeGraph::default();
    let a = graph.create_node("Sphere").unwrap();
    let b = graph.create_node("Box").unwrap();
    assert!(matches!(
        graph.connect(a, 0, b, 0),
        Err(SopError::Topology(TopologyError::SlotOutOfRange { .. }))
    ));
}

fn bounded_join_registry() -> Arc<NodeRegistry> {
    let mut builder = NodeRegistryBuilder::with_builtins().unwrap();
    builder
        .register_with(
            NodeMetadata::new(NodeType::new("Join4"), "Join 4", NodeCategory::utility(), "joins up to four")
                .with_inputs(InputConfig::multiple(2, Some(4), 2)),
            || {
                Arc::new(|ctx: &CookContext<'_>| -> Result<Geometry, EvaluationError> {
                    let mut out = Geometry::new();
                    for g in ctx.connected_inputs() {
                        out.append(g).map_err(EvaluationError::InvalidGeometry)?;
                    }
                    Ok(out)
                }) as Arc<dyn SopOperator>
            },
        )
        .unwrap();
    Arc::new(builder.build())
}

#[test]
fn test_bounded_multiple_input_arity() {
    let mut graph = NodeGraph::new(bounded_join_registry());
    let join = graph.create_node("Join4").unwrap();
    assert_eq!(graph.node(join).unwrap().inputs().len(), 2);

    let sources: Vec<_> = (0..5).map(|_| graph.create_node("Grid").unwrap()).collect();
    graph.connect(join, 0, sources[0], 0).unwrap();

    let engine = sequential();
    let err = engine.cook(&graph, join).unwrap_err();
    assert!(matches!(
        err,
        SopError::Topology(TopologyError::InsufficientInputs { connected: 1, required: 2, .. })
    ));

    for slot in 1..4 {
        graph.connect(join, slot, sources[slot], 0).unwrap();
    }
    let fifth = graph.connect(join, 4, sources[4], 0).unwrap_err();
    assert!(matches!(
        fifth,
        SopError::Topology(TopologyError::SlotOutOfRange { slot: 4, max: Some(4), .. })
    ));
    assert_eq!(graph.node(join).unwrap().connected_inputs(), 4);

    let merged = engine.cook(&graph, join).unwrap();
    assert_eq!(merged.primitive_count(), 4 * 100);
}

#[test]
fn test_diamond_cooks_shared_upstream_once() {
    let mut graph = NodeGraph::default();
    let a = graph.create_node("Sphere").unwrap();
    let b = graph.create_node("Transform").unwrap();
    let c = graph.create_node("Transform").unwrap();
    let d = graph.create_node("Merge").unwrap();
    graph.connect(b, 0, a, 0).unwrap();
    graph.connect(c, 0, a, 0).unwrap();
    graph.connect(d, 0, b, 0).unwrap();
    graph.connect(d, 1, c, 0).unwrap();
    graph.set_parameter(c, "translate_x", 5.0).unwrap();

    let engine = NodeGraphEngine::new();
    let merged = engine.cook(&graph, d).unwrap();
    assert_eq!(graph.node(a).unwrap().cook_count(), 1);
    let sphere = graph.node(a).unwrap().cached_geometry().unwrap();
    assert_eq!(merged.point_count(), sphere.point_count() * 2);
}

#[test]
fn test_sphere_transform_scenario() {
    let mut graph = NodeGraph::default();
    let sphere = graph.create_node("Sphere").unwrap();
    let xform = graph.create_node("Transform").unwrap();
    graph.set_parameter(sphere, "radius", 2.0).unwrap();
    graph.set_parameter(xform, "translate_y", 3.0).unwrap();
    graph.connect(xform, 0, sphere, 0).unwrap();

    let engine = sequential();
    let moved = engine.cook(&graph, xform).unwrap();
    let bounds = moved.bounds().unwrap();
    assert!((bounds.center() - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-4);
    assert!((bounds.size().y - 4.0).abs() < 1e-4);

    graph.disconnect(xform, 0).unwrap();
    assert_eq!(engine.node_state(&graph, xform).unwrap(), NodeState::Dirty);
    let err = engine.cook(&graph, xform).unwrap_err();
    assert!(matches!(
        err,
        SopError::Topology(TopologyError::InsufficientInputs { connected: 0, required: 1, .. })
    ));
    assert!(graph.node(xform).unwrap().cached_geometry().is_none());
}

#[test]
fn test_kernel_failure_keeps_sibling_caches() {
    let mut graph = NodeGraph::default();
    let open = graph.create_node("Grid").unwrap();
    let closed = graph.create_node("Sphere").unwrap();
    let boolean = graph.create_node("Boolean").unwrap();
    graph.connect(boolean, 0, open, 0).unwrap();
    graph.connect(boolean, 1, closed, 0).unwrap();

    let engine = sequential();
    let err = engine.cook(&graph, boolean).unwrap_err();
    assert_eq!(err.failing_node(), Some(boolean));
    assert!(matches!(
        err,
        SopError::Evaluation { error: EvaluationError::InvalidGeometry(_), .. }
    ));

    assert_eq!(engine.node_state(&graph, open).unwrap(), NodeState::Clean);
    assert_eq!(engine.node_state(&graph, closed).unwrap(), NodeState::Clean);
    assert_eq!(engine.node_state(&graph, boolean).unwrap(), NodeState::Dirty);
    assert!(engine.last_error(&graph, boolean).unwrap().is_some());
    assert_eq!(engine.stats(&graph).error_nodes, 1);
}

#[test]
fn test_boolean_of_disjoint_boxes() {
    let mut graph = NodeGraph::default();
    let a = graph.create_node("Box").unwrap();
    let b = graph.create_node("Box").unwrap();
    let moved = graph.create_node("Transform").unwrap();
    let boolean = graph.create_node("Boolean").unwrap();
    graph.set_parameter(moved, "translate_x", 10.0).unwrap();
    graph.connect(moved, 0, b, 0).unwrap();
    graph.connect(boolean, 0, a, 0).unwrap();
    graph.connect(boolean, 1, moved, 0).unwrap();

    let engine = sequential();
    let union = engine.cook(&graph, boolean).unwrap();
    assert_eq!(union.primitive_count(), 12);

    graph.set_parameter(boolean, "operation", 1i64).unwrap();
    let intersection = engine.cook(&graph, boolean).unwrap();
    assert_eq!(intersection.primitive_count(), 0);
}

#[test]
fn test_wrangle_and_scatter_pipeline() {
    let mut graph = NodeGraph::default();
    let grid = graph.create_node("Grid").unwrap();
    let scatter = graph.create_node("Scatter").unwrap();
    let wrangle = graph.create_node("Wrangle").unwrap();
    graph.set_parameter(scatter, "point_count", 25i64).unwrap();
    graph
        .set_parameter(wrangle, "expression", "Py = ch_value1 + ptnum * 0")
        .unwrap();
    graph.set_parameter(wrangle, "value1", 2.5).unwrap();
    graph.connect(scatter, 0, grid, 0).unwrap();
    graph.connect(wrangle, 0, scatter, 0).unwrap();

    let engine = sequential();
    let lifted = engine.cook(&graph, wrangle).unwrap();
    assert_eq!(lifted.point_count(), 25);
    assert!(lifted.points().iter().all(|p| (p.y - 2.5).abs() < 1e-6));

    graph.set_parameter(wrangle, "expression", "Py = missing").unwrap();
    match engine.cook(&graph, wrangle).unwrap_err() {
        SopError::Evaluation {
            node,
            error: EvaluationError::Expression { expression, position, message },
        } => {
            assert_eq!(node, wrangle);
            assert_eq!(expression, "Py = missing");
            assert_eq!(position, 5);
            assert!(message.contains("missing"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(graph.node(scatter).unwrap().cook_count(), 1);
}

#[test]
fn test_panicking_operator_is_isolated() {
    let mut builder = NodeRegistryBuilder::with_builtins().unwrap();
    builder
        .register_with(
            NodeMetadata::new(NodeType::new("Faulty"), "Faulty", NodeCategory::utility(), "panics")
                .with_inputs(InputConfig::single()),
            || {
                Arc::new(|_: &CookContext<'_>| -> Result<Geometry, EvaluationError> {
                    panic!("index out of bounds")
                }) as Arc<dyn SopOperator>
            },
        )
        .unwrap();
    let mut graph = NodeGraph::new(Arc::new(builder.build()));
    let sphere = graph.create_node("Sphere").unwrap();
    let faulty = graph.create_node("Faulty").unwrap();
    graph.connect(faulty, 0, sphere, 0).unwrap();

    let engine = sequential();
    match engine.cook(&graph, faulty).unwrap_err() {
        SopError::Evaluation { node, error: EvaluationError::OperationFailed(message) } => {
            assert_eq!(node, faulty);
            assert!(message.contains("panicked"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(engine.node_state(&graph, sphere).unwrap(), NodeState::Clean);
}

#[test]
fn test_remove_node_clears_references() {
    let mut graph = NodeGraph::default();
    let sphere = graph.create_node("Sphere").unwrap();
    let xform = graph.create_node("Transform").unwrap();
    graph.connect(xform, 0, sphere, 0).unwrap();
    graph.remove_node(sphere).unwrap();
    assert!(graph.connections().is_empty());
    assert!(graph.node(xform).unwrap().input(0).is_none());
    assert!(matches!(
        graph.node(sphere),
        Err(SopError::System(SystemError::UnknownNode(_)))
    ));
}
