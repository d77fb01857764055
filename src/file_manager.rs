//! Saving and loading node graphs
//!
//! Graphs are stored as pretty-printed JSON. Loading rebuilds nodes under
//! their saved ids with the saved parameter values and connections, so a
//! loaded graph cooks to the same geometry as the one that was saved.

use crate::constants::persistence::{CREATOR, FORMAT_VERSION};
use crate::error::{SopResult, SystemError};
use crate::nodes::{InputSlot, NodeGraph, NodeId, NodeRegistry, ParameterValue};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Save file data structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: String,
    pub metadata: SaveMetadata,
    pub graph: GraphData,
}

/// Metadata for save files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub created: String,  // RFC 3339 timestamp
    pub modified: String, // RFC 3339 timestamp
    pub creator: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<NodeData>,
}

/// One persisted node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub id: NodeId,
    pub node_type: String,
    pub title: String,
    /// Only values are stored; descriptors come from the registry on load
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterValue>,
    #[serde(default)]
    pub inputs: Vec<Option<InputSlot>>,
}

impl SaveData {
    /// Capture the current state of `graph`
    pub fn from_graph(graph: &NodeGraph, description: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let nodes = graph
            .nodes()
            .map(|node| NodeData {
                id: node.id(),
                node_type: node.node_type().to_string(),
                title: node.title().to_string(),
                parameters: node
                    .parameters()
                    .iter()
                    .map(|(descriptor, value)| (descriptor.name.to_string(), value.clone()))
                    .collect(),
                inputs: node.inputs().to_vec(),
            })
            .collect();

        Self {
            version: FORMAT_VERSION.to_string(),
            metadata: SaveMetadata {
                created: now.clone(),
                modified: now,
                creator: CREATOR.to_string(),
                description: description.into(),
            },
            graph: GraphData { nodes },
        }
    }

    /// Rebuild a graph, resolving node types through `registry`
    pub fn into_graph(self, registry: Arc<NodeRegistry>) -> SopResult<NodeGraph> {
        check_version(&self.version)?;

        let mut graph = NodeGraph::new(registry.clone());
        for data in &self.graph.nodes {
            if graph.contains(data.id) {
                return Err(SystemError::Persistence(format!("duplicate node id {}", data.id)).into());
            }
            let mut node = registry.create(&data.node_type)?;
            node.title = data.title.clone();
            for (name, value) in &data.parameters {
                node.parameters.set(name, value.clone())?;
            }
            graph.add_node_with_id(data.id, node);
        }

        // Connections go in only once every node exists
        for data in &self.graph.nodes {
            for (slot, input) in data.inputs.iter().enumerate() {
                if let Some(input) = input {
                    graph.connect(data.id, slot, input.node, input.output)?;
                }
            }
        }

        debug!("Restored {} nodes", graph.len());
        Ok(graph)
    }
}

fn check_version(version: &str) -> SopResult<()> {
    let major = |v: &str| v.split('.').next().map(str::to_string);
    if major(version) != major(FORMAT_VERSION) {
        return Err(SystemError::Persistence(format!(
            "unsupported save format version {} (expected {})",
            version, FORMAT_VERSION
        ))
        .into());
    }
    Ok(())
}

/// Serialize `graph` to a JSON string
pub fn graph_to_json(graph: &NodeGraph) -> SopResult<String> {
    serde_json::to_string_pretty(&SaveData::from_graph(graph, ""))
        .map_err(|e| SystemError::Persistence(format!("Failed to serialize save data: {}", e)).into())
}

/// Parse a graph from a JSON string
pub fn graph_from_json(text: &str, registry: Arc<NodeRegistry>) -> SopResult<NodeGraph> {
    let save_data: SaveData = serde_json::from_str(text)
        .map_err(|e| SystemError::Persistence(format!("Failed to parse save file: {}", e)))?;
    save_data.into_graph(registry)
}

/// Save the graph to a file
pub fn save_graph(path: &Path, graph: &NodeGraph) -> SopResult<()> {
    let json_content = graph_to_json(graph)?;
    std::fs::write(path, json_content)
        .map_err(|e| SystemError::Persistence(format!("Failed to write {}: {}", path.display(), e)))?;
    info!("Saved {} nodes to {}", graph.len(), path.display());
    Ok(())
}

/// Load a graph from a file
pub fn load_graph(path: &Path, registry: Arc<NodeRegistry>) -> SopResult<NodeGraph> {
    let file_content = std::fs::read_to_string(path)
        .map_err(|e| SystemError::Persistence(format!("Failed to read {}: {}", path.display(), e)))?;
    let graph = graph_from_json(&file_content, registry)?;
    info!("Loaded {} nodes from {}", graph.len(), path.display());
    Ok(graph)
}
