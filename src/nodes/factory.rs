//! Node factory system with self-registration and rich metadata

use crate::error::{SopResult, SystemError};
use crate::nodes::interface::SopOperator;
use crate::nodes::parameters::ParameterDescriptor;
use crate::nodes::port::InputConfig;
use crate::nodes::{Node, NodeType};
use log::debug;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Hierarchical category system for organizing nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeCategory {
    path: Vec<String>,
}

impl NodeCategory {
    /// Create a new category from path components
    pub fn new(path: &[&str]) -> Self {
        Self {
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Get the category name (last component)
    pub fn name(&self) -> &str {
        self.path.last().map(|s| s.as_str()).unwrap_or("")
    }

    pub fn display_string(&self) -> String {
        self.path.join(" > ")
    }

    pub fn generator() -> Self {
        Self::new(&["Geometry", "Generators"])
    }

    pub fn modifier() -> Self {
        Self::new(&["Geometry", "Modifiers"])
    }

    pub fn utility() -> Self {
        Self::new(&["Utility"])
    }
}

impl fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

/// Rich metadata for nodes - the single source of truth for a node type
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub node_type: NodeType,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Schema version of the parameter set
    pub version: u32,
    pub category: NodeCategory,
    pub tags: Vec<&'static str>,
    /// Declaration order is preserved everywhere
    pub parameters: Vec<ParameterDescriptor>,
    pub input_config: InputConfig,
}

impl NodeMetadata {
    /// Create a generator with no parameters; use the builder methods to fill in the rest
    pub fn new(
        node_type: NodeType,
        display_name: &'static str,
        category: NodeCategory,
        description: &'static str,
    ) -> Self {
        Self {
            node_type,
            display_name,
            description,
            version: 1,
            category,
            tags: vec![],
            parameters: vec![],
            input_config: InputConfig::none(),
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<ParameterDescriptor>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_inputs(mut self, input_config: InputConfig) -> Self {
        self.input_config = input_config;
        self
    }

    pub fn with_tags(mut self, tags: Vec<&'static str>) -> Self {
        self.tags = tags;
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Node factory trait: static metadata plus a default-constructed operator
pub trait NodeFactory: SopOperator + Default + 'static {
    fn metadata() -> NodeMetadata
    where
        Self: Sized;
}

/// Builds a fresh operator instance for a node
type OperatorConstructor = Arc<dyn Fn() -> Arc<dyn SopOperator> + Send + Sync>;

struct RegisteredType {
    metadata: Arc<NodeMetadata>,
    constructor: OperatorConstructor,
}

/// Catalog record describing one node type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeTypeInfo {
    pub type_id: NodeType,
    pub display_name: &'static str,
    pub category: String,
    pub description: &'static str,
    pub version: u32,
}

/// Collects registrations before they are frozen into a [`NodeRegistry`]
#[derive(Default)]
pub struct NodeRegistryBuilder {
    types: Vec<RegisteredType>,
    index: HashMap<&'static str, usize>,
}

impl NodeRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the built-in node types
    pub fn with_builtins() -> SopResult<Self> {
        let mut builder = Self::new();
        crate::nodes::three_d::register_builtins(&mut builder)?;
        Ok(builder)
    }

    /// Register a node factory
    pub fn register<T: NodeFactory>(&mut self) -> SopResult<&mut Self> {
        self.register_with(T::metadata(), || Arc::new(T::default()) as Arc<dyn SopOperator>)
    }

    /// Register metadata with an explicit operator constructor
    pub fn register_with<F>(&mut self, metadata: NodeMetadata, constructor: F) -> SopResult<&mut Self>
    where
        F: Fn() -> Arc<dyn SopOperator> + Send + Sync + 'static,
    {
        let type_id = metadata.node_type.as_str();
        if self.index.contains_key(type_id) {
            return Err(SystemError::DuplicateNodeType(type_id.to_string()).into());
        }
        debug!("Registering node type {} ({})", type_id, metadata.category);
        self.index.insert(type_id, self.types.len());
        self.types.push(RegisteredType {
            metadata: Arc::new(metadata),
            constructor: Arc::new(constructor),
        });
        Ok(self)
    }

    pub fn build(self) -> NodeRegistry {
        NodeRegistry {
            types: self.types,
            index: self.index,
        }
    }
}

static GLOBAL_REGISTRY: Lazy<Arc<NodeRegistry>> = Lazy::new(|| {
    let builder = NodeRegistryBuilder::with_builtins().unwrap_or_else(|err| {
        log::error!("Built-in node registration failed: {}", err);
        NodeRegistryBuilder::new()
    });
    Arc::new(builder.build())
});

/// Immutable set of node types a graph can instantiate
pub struct NodeRegistry {
    types: Vec<RegisteredType>,
    index: HashMap<&'static str, usize>,
}

impl NodeRegistry {
    /// Process-wide registry of the built-in node types
    pub fn global() -> Arc<NodeRegistry> {
        GLOBAL_REGISTRY.clone()
    }

    fn lookup(&self, type_name: &str) -> SopResult<&RegisteredType> {
        self.index
            .get(type_name)
            .map(|&i| &self.types[i])
            .ok_or_else(|| SystemError::UnknownNodeType(type_name.to_string()).into())
    }

    /// Map a persisted type name back to its registered type
    pub fn resolve(&self, type_name: &str) -> SopResult<NodeType> {
        Ok(self.lookup(type_name)?.metadata.node_type)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.index.contains_key(type_name)
    }

    pub fn metadata(&self, type_name: &str) -> SopResult<Arc<NodeMetadata>> {
        Ok(self.lookup(type_name)?.metadata.clone())
    }

    /// Create a detached node with default parameters; the graph assigns its id
    pub fn create(&self, type_name: &str) -> SopResult<Node> {
        let registered = self.lookup(type_name)?;
        Ok(Node::new(0, registered.metadata.clone(), (registered.constructor)()))
    }

    /// Metadata of every type in registration order
    pub fn list_types(&self) -> Vec<Arc<NodeMetadata>> {
        self.types.iter().map(|t| t.metadata.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn type_catalog(&self) -> Vec<NodeTypeInfo> {
        self.types
            .iter()
            .map(|t| NodeTypeInfo {
                type_id: t.metadata.node_type,
                display_name: t.metadata.display_name,
                category: t.metadata.category.display_string(),
                description: t.metadata.description,
                version: t.metadata.version,
            })
            .collect()
    }

    /// Parameter descriptors of one type in declaration order
    pub fn parameter_catalog(&self, type_name: &str) -> SopResult<Vec<ParameterDescriptor>> {
        Ok(self.lookup(type_name)?.metadata.parameters.clone())
    }

    /// Types grouped by category, in first-registration order
    pub fn categories(&self) -> Vec<(NodeCategory, Vec<NodeType>)> {
        let mut grouped: Vec<(NodeCategory, Vec<NodeType>)> = Vec::new();
        for t in &self.types {
            match grouped.iter_mut().find(|(c, _)| *c == t.metadata.category) {
                Some((_, members)) => members.push(t.metadata.node_type),
                None => grouped.push((t.metadata.category.clone(), vec![t.metadata.node_type])),
            }
        }
        grouped
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("types", &self.types.iter().map(|t| t.metadata.node_type).collect::<Vec<_>>())
            .finish()
    }
}
