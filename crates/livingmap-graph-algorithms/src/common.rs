//! Shared utilities for graph algorithms
//!
//! Provides the raw adjacency list built from a node/edge snapshot and a
//! read-only, dense view of the same topology for algorithm execution.

use indexmap::IndexMap;
use std::collections::HashMap;

/// Node identifier as supplied by the caller
pub type NodeId = String;

/// Node id -> neighbour ids, one entry per incident edge, in node input order.
///
/// Duplicate entries are kept when the snapshot carries parallel edges.
pub type AdjacencyList = IndexMap<NodeId, Vec<NodeId>>;

/// Build an undirected adjacency list.
///
/// Every node gets an entry (possibly empty). Edges whose source or target is
/// not in `node_ids` are dropped; the node set is authoritative.
pub fn build_adjacency<'a, N, E>(node_ids: N, edges: E) -> AdjacencyList
where
    N: IntoIterator<Item = &'a str>,
    E: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut adjacency: AdjacencyList = node_ids
        .into_iter()
        .map(|id| (id.to_string(), Vec::new()))
        .collect();

    for (source, target) in edges {
        if !adjacency.contains_key(source) || !adjacency.contains_key(target) {
            continue;
        }
        if let Some(list) = adjacency.get_mut(source) {
            list.push(target.to_string());
        }
        if let Some(list) = adjacency.get_mut(target) {
            list.push(source.to_string());
        }
    }

    adjacency
}

/// A dense, integer-indexed, undirected view of the graph topology using
/// Compressed Sparse Row (CSR) format.
///
/// Neighbour runs are sorted and de-duplicated and self-loops are removed,
/// so every algorithm sees a simple graph regardless of how many parallel
/// edges the snapshot carried.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,
    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbour indices
    pub targets: Vec<usize>,
}

impl GraphView {
    /// Get the number of distinct neighbours of a node (by index)
    pub fn degree(&self, idx: usize) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Get the neighbours of a node, sorted ascending
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        let start = self.offsets[idx];
        let end = self.offsets[idx + 1];
        &self.targets[start..end]
    }

    /// Whether `u` and `v` are directly connected
    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.neighbors(u).binary_search(&v).is_ok()
    }

    /// Number of distinct undirected edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    pub fn node_id(&self, idx: usize) -> &str {
        &self.index_to_node[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_to_index.get(id).copied()
    }

    /// Map an index-aligned score vector back to node ids, in index order
    pub fn to_node_map(&self, values: &[f64]) -> IndexMap<NodeId, f64> {
        self.index_to_node
            .iter()
            .cloned()
            .zip(values.iter().copied())
            .collect()
    }

    /// Create a GraphView from an adjacency list
    pub fn from_adjacency_list(adjacency: &AdjacencyList) -> Self {
        let node_count = adjacency.len();
        let mut index_to_node = Vec::with_capacity(node_count);
        let mut node_to_index = HashMap::with_capacity(node_count);

        for (idx, node_id) in adjacency.keys().enumerate() {
            index_to_node.push(node_id.clone());
            node_to_index.insert(node_id.clone(), idx);
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();
        offsets.push(0);

        for (u_idx, neighbors) in adjacency.values().enumerate() {
            let mut run: Vec<usize> = neighbors
                .iter()
                .filter_map(|id| node_to_index.get(id).copied())
                .filter(|&v_idx| v_idx != u_idx)
                .collect();
            run.sort_unstable();
            run.dedup();
            targets.extend(run);
            offsets.push(targets.len());
        }

        GraphView {
            node_count,
            index_to_node,
            node_to_index,
            offsets,
            targets,
        }
    }

    /// Helper to create a GraphView straight from node ids and edge pairs
    pub fn from_edges<'a, N, E>(node_ids: N, edges: E) -> Self
    where
        N: IntoIterator<Item = &'a str>,
        E: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Self::from_adjacency_list(&build_adjacency(node_ids, edges))
    }
}
