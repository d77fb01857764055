//! sopgraph core library
//!
//! A procedural geometry node graph: typed node registry, validated
//! parameters, an acyclic dependency graph with generation-based dirty
//! tracking, and a memoizing cook engine that hands mesh work to pluggable
//! geometry and expression kernels.
//!
//! ```
//! use sopgraph::{NodeGraph, NodeGraphEngine, ParameterValue};
//!
//! let mut graph = NodeGraph::default();
//! let sphere = graph.create_node("Sphere").unwrap();
//! let xform = graph.create_node("Transform").unwrap();
//! graph.set_parameter(xform, "translate_y", ParameterValue::Float(2.0)).unwrap();
//! graph.connect(xform, 0, sphere, 0).unwrap();
//!
//! let engine = NodeGraphEngine::new();
//! let geometry = engine.cook(&graph, xform).unwrap();
//! assert!(geometry.point_count() > 0);
//! ```

// Public modules
pub mod config;
pub mod constants;
pub mod error;
pub mod file_manager;
pub mod geometry;
pub mod kernels;
pub mod nodes;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{ConfigurationError, EvaluationError, SopError, SopResult, SystemError, TopologyError};
pub use geometry::{AttributeData, Geometry, Primitive};
pub use kernels::{BooleanOperation, ExpressionEvaluator, GeometryKernel, Kernels};
pub use nodes::{
    InputConfig, Node, NodeGraph, NodeGraphEngine, NodeId, NodeRegistry, NodeState, NodeType,
    ParameterValue, SharedGraph,
};
