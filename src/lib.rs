//! Living Map
//!
//! Graph analytics and layout engine for an organisational "living map":
//! users, teams, projects, goals and the relationships between them.
//!
//! # Architecture
//!
//! - `graph`: the snapshot data model (`MapData`, `Node`, `Edge`)
//! - `algo`: adapter from a snapshot to the dense `GraphView` used by the
//!   `livingmap-graph-algorithms` crate
//! - `analytics`: centrality, communities, bottlenecks and collaboration
//!   opportunities folded into `GraphMetrics`
//! - `layout`: circular, grid, radial, cluster and ForceAtlas2 placement
//!   with a fail-soft grid fallback
//! - `offload`: size-based dispatch to a background executor
//!
//! Every computation starts from a fresh snapshot; nothing is updated
//! incrementally and inputs are never mutated.
//!
//! ## Example Usage
//!
//! ```rust
//! use livingmap::{calculate_all_metrics, apply_layout, AnalyticsConfig, Layout, LayoutStrategy};
//! use livingmap::{Edge, MapData, Node, NodeType};
//!
//! let data = MapData::new(
//!     vec![
//!         Node::new("hub", NodeType::Team, "Platform"),
//!         Node::new("ada", NodeType::User, "Ada"),
//!         Node::new("grace", NodeType::User, "Grace"),
//!     ],
//!     vec![Edge::new("ada", "hub"), Edge::new("grace", "hub")],
//! );
//!
//! let metrics = calculate_all_metrics(&data, &AnalyticsConfig::default()).unwrap();
//! assert_eq!(metrics.nodes["hub"].degree_centrality, 1.0);
//!
//! let positioned = apply_layout(&data, &Layout::from_strategy(LayoutStrategy::Radial, 7));
//! assert!(positioned.iter().all(|n| n.position().is_some()));
//! ```

#![warn(clippy::all)]

pub mod algo;
pub mod analytics;
pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod offload;

// Re-export main types for convenience
pub use graph::{Edge, EdgeType, MapData, Node, NodeType};

pub use error::{MapError, MapResult};

pub use config::{AnalyticsConfig, EngineConfig, LayoutConfig, OffloadConfig};

pub use analytics::{
    calculate_all_metrics, calculate_all_metrics_or_default, calculate_metric, Cluster,
    CollaborationOpportunity, GraphMetrics, MetricKind, NodeMetrics,
};

pub use layout::{apply_layout, try_layout, Layout, LayoutStrategy, Position};

pub use offload::{
    BackgroundWorker, Dispatcher, OffloadRequest, OffloadResponse, OffloadTask, TaskExecutor,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.3.0");
    }
}
