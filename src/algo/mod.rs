//! Graph algorithms module
//!
//! Algorithms are implemented in the `livingmap-graph-algorithms` crate.
//! This module provides the integration/adapter layer from [`MapData`].

use crate::graph::MapData;
use livingmap_graph_algorithms::{AdjacencyList, GraphView};
use tracing::debug;

// Re-export algorithms
pub use livingmap_graph_algorithms::{
    betweenness_centrality, closeness_centrality, clustering_coefficient, degree_centrality,
    eigenvector_centrality, louvain, EigenvectorConfig, LouvainConfig, LouvainResult,
};

/// Build the undirected adjacency list for a snapshot.
///
/// Edges referencing unknown node ids are dropped.
pub fn build_adjacency(data: &MapData) -> AdjacencyList {
    let adjacency = livingmap_graph_algorithms::build_adjacency(
        data.nodes.iter().map(|n| n.id.as_str()),
        data.edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str())),
    );

    let kept: usize = adjacency.values().map(Vec::len).sum::<usize>() / 2;
    let dropped = data.edges.len().saturating_sub(kept);
    if dropped > 0 {
        debug!("Dropped {} edge(s) referencing unknown nodes", dropped);
    }

    adjacency
}

/// Build a GraphView from the snapshot for algorithm execution
pub fn build_view(data: &MapData) -> GraphView {
    GraphView::from_adjacency_list(&build_adjacency(data))
}
