//! Input arity declarations and connection slots

use super::node::NodeId;
use crate::constants::graph::MAX_INPUT_SLOTS;
use serde::{Deserialize, Serialize};

/// Index of an output on an upstream node
pub type OutputIndex = usize;

/// How many inputs a node type accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Generator, accepts no connections
    None,
    /// Exactly one geometry input
    Single,
    /// A variable number of geometry inputs
    Multiple,
}

/// Connection arity for a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputConfig {
    pub kind: InputKind,
    /// Slots every instance starts with
    pub min: usize,
    /// Upper bound on slots, `None` is unbounded
    pub max: Option<usize>,
    /// Connected slots needed before the node can cook
    pub required: usize,
}

impl InputConfig {
    /// No inputs at all
    pub const fn none() -> Self {
        Self { kind: InputKind::None, min: 0, max: Some(0), required: 0 }
    }

    /// One mandatory input
    pub const fn single() -> Self {
        Self { kind: InputKind::Single, min: 1, max: Some(1), required: 1 }
    }

    /// Variable input count
    pub const fn multiple(min: usize, max: Option<usize>, required: usize) -> Self {
        Self { kind: InputKind::Multiple, min, max, required }
    }

    /// Number of addressable slots; unbounded inputs are capped
    pub fn slot_limit(&self) -> usize {
        match self.kind {
            InputKind::None => 0,
            _ => self.max.unwrap_or(MAX_INPUT_SLOTS),
        }
    }

    /// Whether `slot` is addressable under this config
    pub fn accepts_slot(&self, slot: usize) -> bool {
        slot < self.slot_limit()
    }
}

/// Upstream reference held by an input slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputSlot {
    pub node: NodeId,
    pub output: OutputIndex,
}

impl InputSlot {
    pub fn new(node: NodeId, output: OutputIndex) -> Self {
        Self { node, output }
    }
}
