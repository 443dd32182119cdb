//! Node implementation for the living map

use super::types::NodeType;
use serde::{Deserialize, Serialize};

/// An entity on the map (user, team, project, ...)
///
/// Identity is the `id`. `data` is an opaque payload owned by the caller and
/// passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: NodeType, label: impl Into<String>) -> Self {
        Node {
            id: id.into(),
            node_type,
            label: label.into(),
            data: serde_json::Value::Null,
            x: None,
            y: None,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Current position, if both coordinates are set and finite
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x, y)),
            _ => None,
        }
    }

    /// Label for display, falling back to the id
    pub fn display_name(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_deserialize_minimal() {
        let node: Node = serde_json::from_str(r#"{"id": "u1", "type": "user"}"#).unwrap();
        assert_eq!(node.id, "u1");
        assert_eq!(node.node_type, NodeType::User);
        assert!(node.label.is_empty());
        assert!(node.data.is_null());
        assert_eq!(node.position(), None);
        assert_eq!(node.display_name(), "u1");
    }

    #[test]
    fn test_position_requires_finite_coordinates() {
        let node = Node::new("t1", NodeType::Team, "Platform").with_position(1.0, 2.0);
        assert_eq!(node.position(), Some((1.0, 2.0)));

        let broken = Node::new("t2", NodeType::Team, "Infra").with_position(f64::NAN, 2.0);
        assert_eq!(broken.position(), None);
    }

    #[test]
    fn test_serialize_skips_missing_position() {
        let json = serde_json::to_value(Node::new("g1", NodeType::Goal, "Grow")).unwrap();
        assert_eq!(json["type"], "goal");
        assert!(json.get("x").is_none());
    }
}
