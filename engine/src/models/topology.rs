//! Resource topology models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A node in the topology graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyNode {
    /// Deterministic node ID derived from the entity's type and name
    pub id: String,

    /// Node type (e.g., "vpc", "subnet", "load-balancer")
    #[serde(rename = "type")]
    pub node_type: String,

    /// Display name
    pub name: String,

    /// Node details
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyEdge {
    pub source: String,
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Resource topology graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub nodes: Vec<TopologyNode>,
    pub edges: Vec<TopologyEdge>,
}

impl Topology {
    /// Find a node by ID
    pub fn node(&self, id: &str) -> Option<&TopologyNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes of a given type
    pub fn nodes_of_type<'a>(&'a self, node_type: &'a str) -> impl Iterator<Item = &'a TopologyNode> {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }

    /// Edges leaving a node
    pub fn edges_from<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a TopologyEdge> {
        self.edges.iter().filter(move |e| e.source == source)
    }
}
