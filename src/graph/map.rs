//! Map snapshot: the raw node and edge lists fed into the engine

use super::edge::Edge;
use super::node::Node;
use crate::error::{MapError, MapResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// One snapshot of the organisational map.
///
/// Every derived structure (adjacency, metrics, layout) is recomputed from a
/// fresh snapshot; nothing is updated incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl MapData {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        MapData { nodes, edges }
    }

    pub fn from_json_str(json: &str) -> MapResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> MapResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Id -> node map for repeated lookups
    pub fn node_lookup(&self) -> HashMap<&str, &Node> {
        self.nodes.iter().map(|n| (n.id.as_str(), n)).collect()
    }

    /// Reject snapshots where two nodes share an id.
    ///
    /// Dangling edges are not an error here; the adjacency builder drops them.
    pub fn validate(&self) -> MapResult<()> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(MapError::DuplicateNodeId(node.id.clone()));
            }
        }
        Ok(())
    }
}
