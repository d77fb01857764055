//! Node system - core data structures and the built-in SOP node types

// Core node system modules
pub mod cache;
pub mod defaults;
pub mod execution_engine;
pub mod factory;
pub mod graph;
pub mod interface;
pub mod node;
pub mod parameters;
pub mod port;

// Built-in geometry operators
pub mod three_d;

// Re-export core types
pub use graph::{Connection, NodeGraph, SharedGraph};
pub use node::{Node, NodeId, NodeType};
pub use port::{InputConfig, InputKind, InputSlot, OutputIndex};

// Re-export parameter types
pub use parameters::{ParameterDescriptor, ParameterKind, ParameterRange, ParameterSet, ParameterValue};

// Re-export factory types
pub use factory::{NodeCategory, NodeFactory, NodeMetadata, NodeRegistry, NodeRegistryBuilder, NodeTypeInfo};

// Re-export interface types
pub use interface::{CookContext, SopOperator};

// Re-export execution engine types
pub use cache::CacheStatistics;
pub use execution_engine::{CookPlan, ExecutionStats, NodeGraphEngine, NodeState};
