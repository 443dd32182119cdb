//! Edge implementation for the living map

use super::types::EdgeType;
use serde::{Deserialize, Serialize};

/// A relationship between two nodes.
///
/// Direction is kept for rendering only; analytics treat every edge as
/// undirected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub source: String,

    pub target: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<EdgeType>,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Edge {
            id: None,
            source: source.into(),
            target: target.into(),
            edge_type: None,
        }
    }

    pub fn with_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_type = Some(edge_type);
        self
    }

    /// Check if this edge touches the given node
    pub fn connects(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_deserialize() {
        let edge: Edge =
            serde_json::from_str(r#"{"source": "u1", "target": "t1", "type": "member-of"}"#).unwrap();
        assert_eq!(edge.edge_type, Some(EdgeType::MemberOf));
        assert!(edge.connects("t1"));
        assert!(!edge.connects("t2"));
    }

    #[test]
    fn test_edge_type_optional() {
        let edge: Edge = serde_json::from_str(r#"{"source": "a", "target": "b"}"#).unwrap();
        assert_eq!(edge.edge_type, None);
        assert_eq!(edge, Edge::new("a", "b"));
    }
}
