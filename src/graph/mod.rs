//! Living map data model
//!
//! Nodes carry a fixed entity type and an opaque payload; edges carry an
//! optional relationship type. A [`MapData`] snapshot is the sole input to
//! the analytics and layout pipelines.

pub mod edge;
pub mod map;
pub mod node;
pub mod types;

// Re-export main types
pub use edge::Edge;
pub use map::MapData;
pub use node::Node;
pub use types::{EdgeType, NodeType};
