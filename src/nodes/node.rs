//! Node types and core node functionality

use super::cache::CookCell;
use super::execution_engine::NodeState;
use super::factory::NodeMetadata;
use super::interface::SopOperator;
use super::parameters::{ParameterSet, ParameterValue};
use super::port::{InputConfig, InputSlot};
use crate::error::SopError;
use crate::geometry::Geometry;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Unique identifier for a node
pub type NodeId = usize;

/// Stable identifier of a registered node type, e.g. `"Sphere"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeType(&'static str);

impl NodeType {
    pub const SPHERE: NodeType = NodeType("Sphere");
    pub const BOX: NodeType = NodeType("Box");
    pub const GRID: NodeType = NodeType("Grid");
    pub const TRANSFORM: NodeType = NodeType("Transform");
    pub const SMOOTH: NodeType = NodeType("Smooth");
    pub const SCATTER: NodeType = NodeType("Scatter");
    pub const WRANGLE: NodeType = NodeType("Wrangle");
    pub const NULL: NodeType = NodeType("Null");
    pub const MERGE: NodeType = NodeType("Merge");
    pub const BOOLEAN: NodeType = NodeType("Boolean");

    pub const fn new(id: &'static str) -> Self {
        NodeType(id)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl PartialEq<str> for NodeType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A node instance inside a graph
///
/// Nodes are created by the registry and owned by a [`NodeGraph`]. All
/// mutation goes through the graph so that dirty state can be propagated;
/// the node itself only exposes read access.
///
/// [`NodeGraph`]: super::graph::NodeGraph
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) title: String,
    pub(crate) parameters: ParameterSet,
    pub(crate) inputs: Vec<Option<InputSlot>>,
    /// Bumped whenever this node or anything upstream of it changes
    pub(crate) generation: u64,
    pub(crate) operator: Arc<dyn SopOperator>,
    pub(crate) metadata: Arc<NodeMetadata>,
    pub(crate) cook: Arc<CookCell>,
}

impl Node {
    /// Creates a node with default parameters and `min` empty input slots
    pub fn new(id: NodeId, metadata: Arc<NodeMetadata>, operator: Arc<dyn SopOperator>) -> Self {
        let slots = metadata.input_config.min;
        Self {
            id,
            title: metadata.display_name.to_string(),
            parameters: ParameterSet::from_defaults(metadata.clone()),
            inputs: vec![None; slots],
            generation: 1,
            operator,
            metadata,
            cook: Arc::new(CookCell::new()),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.metadata.node_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    pub fn input_config(&self) -> InputConfig {
        self.metadata.input_config
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Result<&ParameterValue, SopError> {
        Ok(self.parameters.get(name)?)
    }

    /// Every input slot, connected or not
    pub fn inputs(&self) -> &[Option<InputSlot>] {
        &self.inputs
    }

    pub fn input(&self, slot: usize) -> Option<InputSlot> {
        self.inputs.get(slot).copied().flatten()
    }

    /// Number of slots that hold a connection
    pub fn connected_inputs(&self) -> usize {
        self.inputs.iter().filter(|s| s.is_some()).count()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> NodeState {
        self.cook.state(self.generation)
    }

    pub fn is_clean(&self) -> bool {
        self.state() == NodeState::Clean
    }

    /// Successful cooks performed for this node
    pub fn cook_count(&self) -> u64 {
        self.cook.cook_count()
    }

    /// Error from the most recent cook attempt, cleared by a successful cook
    pub fn last_error(&self) -> Option<SopError> {
        self.cook.last_error()
    }

    /// The cached geometry, if it is still valid
    pub fn cached_geometry(&self) -> Option<Arc<Geometry>> {
        self.cook.cached(self.generation)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.generation += 1;
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("node_type", &self.metadata.node_type)
            .field("title", &self.title)
            .field("inputs", &self.inputs)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
