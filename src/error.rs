//! Error taxonomy for the SOP engine
//!
//! Errors fall into four families. Configuration and topology errors are
//! raised synchronously by the mutating call and never leave partial state
//! behind. Evaluation errors are raised by a cook and are attributed to the
//! node whose operator failed. System errors cover lookups that reference
//! things which do not exist.

use crate::nodes::{NodeId, ParameterKind};
use thiserror::Error;

/// Rejected parameter writes and lookups
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("parameter '{parameter}' expects {expected}, got {got}")]
    TypeMismatch {
        parameter: String,
        expected: ParameterKind,
        got: ParameterKind,
    },

    #[error("parameter '{parameter}' value {value} is outside [{min}, {max}]")]
    OutOfRange {
        parameter: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("parameter '{parameter}' does not accept '{value}' (options: {})", options.join(", "))]
    InvalidOption {
        parameter: String,
        value: String,
        options: Vec<String>,
    },

    #[error("node type '{node_type}' has no parameter '{parameter}'")]
    UnknownParameter { node_type: String, parameter: String },
}

/// Violations of graph shape: cycles and arity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("connecting node {upstream} into node {node} would create a cycle")]
    CycleDetected { node: NodeId, upstream: NodeId },

    #[error("node {node} has no input slot {slot} (max {max:?})")]
    SlotOutOfRange {
        node: NodeId,
        slot: usize,
        max: Option<usize>,
    },

    #[error("node {node} has {connected} connected inputs, {required} required")]
    InsufficientInputs {
        node: NodeId,
        connected: usize,
        required: usize,
    },
}

/// Failures of a node's compute behavior or of the kernels it calls
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error("expression error at offset {position} in `{expression}`: {message}")]
    Expression {
        expression: String,
        position: usize,
        message: String,
    },
}

/// Lookups of unregistered types or missing nodes, and environment failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemError {
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),

    #[error("node type '{0}' is already registered")]
    DuplicateNodeType(String),

    #[error("unknown node id {0}")]
    UnknownNode(NodeId),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("configuration file error: {0}")]
    Config(String),
}

/// Top-level error returned by every fallible engine operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SopError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error("node {node} failed to cook: {error}")]
    Evaluation {
        node: NodeId,
        #[source]
        error: EvaluationError,
    },

    #[error(transparent)]
    System(#[from] SystemError),
}

impl SopError {
    /// Wrap an evaluation failure with the node it belongs to
    pub fn evaluation(node: NodeId, error: EvaluationError) -> Self {
        SopError::Evaluation { node, error }
    }

    /// The node an evaluation failure is attributed to, if any
    pub fn failing_node(&self) -> Option<NodeId> {
        match self {
            SopError::Evaluation { node, .. } => Some(*node),
            _ => None,
        }
    }
}

pub type SopResult<T> = Result<T, SopError>;
