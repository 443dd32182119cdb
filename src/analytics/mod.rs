//! Analytics pipeline
//!
//! Centrality, communities and structural heuristics folded into a single
//! [`GraphMetrics`] per snapshot.

pub mod heuristics;
pub mod metrics;

pub use heuristics::{find_bottlenecks, find_collaboration_opportunities, CollaborationOpportunity};
pub use metrics::{
    calculate_all_metrics, calculate_all_metrics_or_default, calculate_metric, Cluster,
    GraphMetrics, MetricKind, NodeMetrics,
};
