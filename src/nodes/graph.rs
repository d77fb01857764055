//! Node graph data structures and operations
//!
//! The graph owns every node and is the only place connections and
//! parameters are mutated. Each mutation bumps the generation of the node
//! it touches and of everything downstream, which is how cached results
//! become stale. The graph is kept acyclic at all times: a connection that
//! would close a cycle is rejected before anything is stored.

use super::factory::NodeRegistry;
use super::node::{Node, NodeId};
use super::parameters::ParameterValue;
use super::port::{InputSlot, OutputIndex};
use crate::error::{SopResult, SystemError, TopologyError};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

/// Represents a connection from an upstream output into an input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Connection {
    pub from_node: NodeId,
    pub from_output: OutputIndex,
    pub to_node: NodeId,
    pub to_slot: usize,
}

impl Connection {
    pub fn new(from_node: NodeId, from_output: OutputIndex, to_node: NodeId, to_slot: usize) -> Self {
        Self {
            from_node,
            from_output,
            to_node,
            to_slot,
        }
    }
}

/// A graph containing nodes and their connections
pub struct NodeGraph {
    nodes: BTreeMap<NodeId, Node>,
    next_node_id: NodeId,
    registry: Arc<NodeRegistry>,
}

impl NodeGraph {
    /// Creates a new empty graph instantiating types from `registry`
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_node_id: 1,
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Create a node of `type_name` with default parameters
    pub fn create_node(&mut self, type_name: &str) -> SopResult<NodeId> {
        let node = self.registry.create(type_name)?;
        Ok(self.add_node(node))
    }

    /// Adds a node to the graph and returns its ID
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        let id = self.next_node_id;
        node.id = id;
        self.nodes.insert(id, node);
        self.next_node_id += 1;
        id
    }

    /// Adds a node under a specific id, used when restoring a saved graph
    pub(crate) fn add_node_with_id(&mut self, id: NodeId, mut node: Node) -> NodeId {
        node.id = id;
        self.nodes.insert(id, node);
        if id >= self.next_node_id {
            self.next_node_id = id + 1;
        }
        id
    }

    pub fn node(&self, id: NodeId) -> SopResult<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| SystemError::UnknownNode(id).into())
    }

    fn node_mut(&mut self, id: NodeId) -> SopResult<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| SystemError::UnknownNode(id).into())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> SopResult<()> {
        self.node_mut(id)?.title = title.into();
        Ok(())
    }

    /// Validate and store a parameter value, dirtying the node and everything downstream
    ///
    /// Writing the value a parameter already holds is a no-op.
    pub fn set_parameter(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<ParameterValue>,
    ) -> SopResult<()> {
        let changed = self.node_mut(id)?.parameters.set(name, value.into())?;
        if changed {
            self.mark_dirty(id);
        }
        Ok(())
    }

    pub fn get_parameter(&self, id: NodeId, name: &str) -> SopResult<ParameterValue> {
        Ok(self.node(id)?.parameters.get(name)?.clone())
    }

    /// Connect `upstream`'s output into `slot` of `node`
    ///
    /// Every check runs before anything is stored, so a rejected call leaves
    /// the graph untouched. Connecting a `Multiple` input past its current
    /// slot count grows the slot list.
    pub fn connect(
        &mut self,
        node: NodeId,
        slot: usize,
        upstream: NodeId,
        output: OutputIndex,
    ) -> SopResult<()> {
        let config = self.node(node)?.input_config();
        self.node(upstream)?;

        if !config.accepts_slot(slot) {
            return Err(TopologyError::SlotOutOfRange {
                node,
                slot,
                max: Some(config.slot_limit()),
            }
            .into());
        }
        // Every node type has a single geometry output
        if output != 0 {
            return Err(TopologyError::SlotOutOfRange {
                node: upstream,
                slot: output,
                max: Some(1),
            }
            .into());
        }
        if upstream == node || self.downstream_of(node).contains(&upstream) {
            return Err(TopologyError::CycleDetected { node, upstream }.into());
        }

        let target = self.node_mut(node)?;
        let wanted = Some(InputSlot::new(upstream, output));
        if target.inputs.get(slot).copied().flatten() == wanted {
            return Ok(());
        }
        if target.inputs.len() <= slot {
            target.inputs.resize(slot + 1, None);
        }
        target.inputs[slot] = wanted;
        self.mark_dirty(node);
        Ok(())
    }

    /// Clear a slot. Clearing an empty slot is a no-op.
    pub fn disconnect(&mut self, node: NodeId, slot: usize) -> SopResult<()> {
        let target = self.node_mut(node)?;
        let config = target.input_config();
        if !config.accepts_slot(slot) {
            return Err(TopologyError::SlotOutOfRange {
                node,
                slot,
                max: Some(config.slot_limit()),
            }
            .into());
        }
        let cleared = target
            .inputs
            .get_mut(slot)
            .and_then(Option::take)
            .is_some();
        if cleared {
            self.mark_dirty(node);
        }
        Ok(())
    }

    /// Remove a node along with every connection that references it
    pub fn remove_node(&mut self, id: NodeId) -> SopResult<Node> {
        self.node(id)?;
        let downstream = self.downstream_of(id);
        let removed = self
            .nodes
            .remove(&id)
            .ok_or(SystemError::UnknownNode(id))?;
        removed.cook.invalidate();

        for node in self.nodes.values_mut() {
            for entry in node.inputs.iter_mut() {
                if matches!(entry, Some(s) if s.node == id) {
                    *entry = None;
                }
            }
        }
        for node_id in downstream {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.mark_dirty();
            }
        }
        Ok(removed)
    }

    /// Every connection, ordered by destination node and slot
    pub fn connections(&self) -> Vec<Connection> {
        let mut result = Vec::new();
        for node in self.nodes.values() {
            for (slot, input) in node.inputs.iter().enumerate() {
                if let Some(input) = input {
                    result.push(Connection::new(input.node, input.output, node.id, slot));
                }
            }
        }
        result
    }

    /// Nodes that read from `id`, directly or transitively (excluding `id`)
    pub fn downstream_of(&self, id: NodeId) -> BTreeSet<NodeId> {
        let mut consumers: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for connection in self.connections() {
            consumers
                .entry(connection.from_node)
                .or_default()
                .push(connection.to_node);
        }

        let mut seen = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for &next in consumers.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
                if next != id && seen.insert(next) {
                    stack.push(next);
                }
            }
        }
        seen
    }

    /// Nodes `id` reads from, directly or transitively (excluding `id`)
    pub fn upstream_of(&self, id: NodeId) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            for input in node.inputs.iter().flatten() {
                if input.node != id && seen.insert(input.node) {
                    stack.push(input.node);
                }
            }
        }
        seen
    }

    /// Kahn's algorithm; ties are broken by lowest node id
    pub fn topological_order(&self) -> SopResult<Vec<NodeId>> {
        let mut in_degree: BTreeMap<NodeId, usize> = self.nodes.keys().map(|&id| (id, 0)).collect();
        let mut consumers: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for connection in self.connections() {
            consumers
                .entry(connection.from_node)
                .or_default()
                .push(connection.to_node);
            *in_degree.entry(connection.to_node).or_insert(0) += 1;
        }

        let mut ready: BTreeSet<NodeId> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(id) = ready.pop_first() {
            order.push(id);
            for &next in consumers.get(&id).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(degree) = in_degree.get_mut(&next) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(next);
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            let stuck = in_degree
                .iter()
                .find(|(_, &d)| d > 0)
                .map(|(&id, _)| id)
                .unwrap_or_default();
            return Err(TopologyError::CycleDetected {
                node: stuck,
                upstream: stuck,
            }
            .into());
        }
        Ok(order)
    }

    /// Check that enough inputs are connected for `id` to cook
    pub fn validate_for_cook(&self, id: NodeId) -> SopResult<()> {
        let node = self.node(id)?;
        let connected = node.connected_inputs();
        let required = node.input_config().required;
        if connected < required {
            return Err(TopologyError::InsufficientInputs {
                node: id,
                connected,
                required,
            }
            .into());
        }
        Ok(())
    }

    /// Force `id` and everything downstream of it to recook
    pub fn mark_dirty(&mut self, id: NodeId) {
        let mut affected = self.downstream_of(id);
        affected.insert(id);
        for node_id in affected {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.mark_dirty();
            }
        }
    }

    /// Upstream closure of `id` plus `id`, in breadth-first order from `id`
    pub(crate) fn cook_closure(&self, id: NodeId) -> SopResult<Vec<NodeId>> {
        self.node(id)?;
        let mut seen = BTreeSet::from([id]);
        let mut queue = VecDeque::from([id]);
        let mut order = Vec::new();
        while let Some(current) = queue.pop_front() {
            order.push(current);
            let node = self.node(current)?;
            for input in node.inputs.iter().flatten() {
                if seen.insert(input.node) {
                    queue.push_back(input.node);
                }
            }
        }
        Ok(order)
    }
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new(NodeRegistry::global())
    }
}

impl std::fmt::Debug for NodeGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeGraph")
            .field("nodes", &self.nodes)
            .field("next_node_id", &self.next_node_id)
            .finish()
    }
}

/// A graph that can be edited from one thread while other threads cook it
///
/// Cooks hold the read lock only while taking their snapshot, so edits are
/// never blocked by a long-running operator.
#[derive(Clone, Default)]
pub struct SharedGraph {
    inner: Arc<RwLock<NodeGraph>>,
}

impl SharedGraph {
    pub fn new(graph: NodeGraph) -> Self {
        Self {
            inner: Arc::new(RwLock::new(graph)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, NodeGraph> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, NodeGraph> {
        self.inner.write()
    }
}
