//! Community detection algorithms
//!
//! Louvain-style modularity optimisation. Each level runs local moving until
//! no node can improve modularity, then the communities are collapsed into
//! super-nodes and the process repeats on the coarsened graph.
//!
//! Node visiting order and candidate communities are processed in ascending
//! index order, and a node only leaves its community on a strict gain, so the
//! partition is fully deterministic for a given view.

use super::common::GraphView;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Louvain configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct LouvainConfig {
    /// Local-moving passes per level
    pub max_passes: usize,
    /// Coarsening levels
    pub max_levels: usize,
    /// A move must beat staying put by more than this
    pub min_gain: f64,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            max_passes: 20,
            max_levels: 10,
            min_gain: 1e-10,
        }
    }
}

/// Result of Louvain detection
#[derive(Debug, Clone)]
pub struct LouvainResult {
    /// Community of each node (by index), numbered 0.. in order of first appearance
    pub assignment: Vec<usize>,
    /// Number of communities
    pub community_count: usize,
    /// Modularity of the final partition
    pub modularity: f64,
    /// Coarsening levels that changed the partition
    pub levels: usize,
}

impl LouvainResult {
    /// Node indices grouped by community id
    pub fn communities(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.community_count];
        for (node, &community) in self.assignment.iter().enumerate() {
            groups[community].push(node);
        }
        groups
    }
}

/// Weighted undirected graph used between coarsening levels.
struct WeightedGraph {
    /// Neighbour -> weight; every edge is stored from both ends
    adjacency: Vec<Vec<(usize, f64)>>,
    /// Weight of internal edges collapsed into each super-node
    self_loops: Vec<f64>,
    /// Sum of all edge weights (m)
    total_weight: f64,
}

impl WeightedGraph {
    fn from_view(view: &GraphView) -> Self {
        let adjacency = (0..view.node_count)
            .map(|u| view.neighbors(u).iter().map(|&v| (v, 1.0)).collect())
            .collect();

        Self {
            adjacency,
            self_loops: vec![0.0; view.node_count],
            total_weight: view.edge_count() as f64,
        }
    }

    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Weighted degree; a self-loop counts twice
    fn strength(&self, u: usize) -> f64 {
        self.adjacency[u].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[u]
    }

    /// Greedy local moving. Returns the community of each node and whether
    /// anything moved.
    fn local_moving(&self, config: &LouvainConfig) -> (Vec<usize>, bool) {
        let n = self.node_count();
        let two_m = 2.0 * self.total_weight;
        let strength: Vec<f64> = (0..n).map(|u| self.strength(u)).collect();

        let mut community: Vec<usize> = (0..n).collect();
        let mut totals = strength.clone();

        let mut links = vec![0.0; n];
        let mut touched: Vec<usize> = Vec::new();
        let mut moved_any = false;

        for _ in 0..config.max_passes {
            let mut moves = 0;

            for u in 0..n {
                let current = community[u];
                let k_u = strength[u];

                for &(v, w) in &self.adjacency[u] {
                    let c = community[v];
                    if links[c] == 0.0 {
                        touched.push(c);
                    }
                    links[c] += w;
                }
                touched.sort_unstable();
                touched.dedup();

                totals[current] -= k_u;

                let mut best = current;
                let mut best_gain = gain(links[current], totals[current], k_u, two_m);
                for &c in &touched {
                    if c == current {
                        continue;
                    }
                    let candidate = gain(links[c], totals[c], k_u, two_m);
                    if candidate > best_gain + config.min_gain {
                        best = c;
                        best_gain = candidate;
                    }
                }

                totals[best] += k_u;
                community[u] = best;
                if best != current {
                    moves += 1;
                }

                for &c in &touched {
                    links[c] = 0.0;
                }
                links[current] = 0.0;
                touched.clear();
            }

            if moves == 0 {
                break;
            }
            moved_any = true;
        }

        (community, moved_any)
    }

    /// Collapse communities (already renumbered 0..count) into super-nodes.
    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut merged: Vec<HashMap<usize, f64>> = vec![HashMap::new(); count];
        let mut self_loops = vec![0.0; count];

        for (u, neighbors) in self.adjacency.iter().enumerate() {
            let cu = community[u];
            self_loops[cu] += self.self_loops[u];
            for &(v, w) in neighbors {
                let cv = community[v];
                if cu == cv {
                    // seen from both endpoints
                    self_loops[cu] += w / 2.0;
                } else {
                    *merged[cu].entry(cv).or_insert(0.0) += w;
                }
            }
        }

        let adjacency = merged
            .into_iter()
            .map(|links| {
                let mut row: Vec<(usize, f64)> = links.into_iter().collect();
                row.sort_unstable_by_key(|&(v, _)| v);
                row
            })
            .collect();

        Self {
            adjacency,
            self_loops,
            total_weight: self.total_weight,
        }
    }
}

/// Modularity gain (up to a constant factor) of inserting a node with
/// strength `k_u` into a community it shares `links` weight with.
fn gain(links: f64, community_total: f64, k_u: f64, two_m: f64) -> f64 {
    links - community_total * k_u / two_m
}

/// Renumber labels 0.. in order of first appearance.
fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let renumbered = labels
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect();
    (renumbered, mapping.len())
}

/// Louvain community detection.
///
/// Every node ends up in exactly one community. Isolated nodes (and every
/// node of an edgeless graph) form singleton communities.
pub fn louvain(view: &GraphView, config: &LouvainConfig) -> LouvainResult {
    let n = view.node_count;
    let mut membership: Vec<usize> = (0..n).collect();
    let mut graph = WeightedGraph::from_view(view);
    let mut levels = 0;

    if graph.total_weight > 0.0 {
        for _ in 0..config.max_levels {
            let (community, moved) = graph.local_moving(config);
            if !moved {
                break;
            }

            let (community, count) = renumber(&community);
            for m in membership.iter_mut() {
                *m = community[*m];
            }
            levels += 1;

            if count == graph.node_count() {
                break;
            }
            graph = graph.aggregate(&community, count);
        }
    }

    let (assignment, community_count) = renumber(&membership);
    let modularity = modularity(view, &assignment);

    LouvainResult {
        assignment,
        community_count,
        modularity,
        levels,
    }
}

/// Newman modularity of a partition: `sum_c [L_c / m - (d_c / 2m)^2]`.
///
/// Returns 0 for edgeless graphs.
pub fn modularity(view: &GraphView, assignment: &[usize]) -> f64 {
    let m = view.edge_count() as f64;
    if m == 0.0 {
        return 0.0;
    }

    let mut internal: HashMap<usize, f64> = HashMap::new();
    let mut degree_sum: HashMap<usize, f64> = HashMap::new();

    for u in 0..view.node_count {
        let cu = assignment[u];
        *degree_sum.entry(cu).or_insert(0.0) += view.degree(u) as f64;
        for &v in view.neighbors(u) {
            if v > u && assignment[v] == cu {
                *internal.entry(cu).or_insert(0.0) += 1.0;
            }
        }
    }

    degree_sum
        .iter()
        .map(|(c, &d)| {
            let l = internal.get(c).copied().unwrap_or(0.0);
            l / m - (d / (2.0 * m)).powi(2)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_EDGES: [(&str, &str); 0] = [];

    fn two_triangles() -> GraphView {
        GraphView::from_edges(
            ["a", "b", "c", "x", "y", "z"],
            [("a", "b"), ("b", "c"), ("c", "a"), ("x", "y"), ("y", "z"), ("z", "x")],
        )
    }

    fn ring_of_cliques(cliques: usize, size: usize) -> GraphView {
        let ids: Vec<String> = (0..cliques * size).map(|i| format!("n{}", i)).collect();
        let mut edges = Vec::new();
        for c in 0..cliques {
            let base = c * size;
            for i in 0..size {
                for j in (i + 1)..size {
                    edges.push((ids[base + i].as_str(), ids[base + j].as_str()));
                }
            }
            let next = ((c + 1) % cliques) * size;
            edges.push((ids[base + size - 1].as_str(), ids[next].as_str()));
        }
        GraphView::from_edges(ids.iter().map(String::as_str), edges)
    }

    #[test]
    fn test_two_triangles() {
        let view = two_triangles();
        let result = louvain(&view, &LouvainConfig::default());

        assert_eq!(result.community_count, 2);
        let groups = result.communities();
        assert_eq!(groups[0], vec![0, 1, 2]);
        assert_eq!(groups[1], vec![3, 4, 5]);
        assert!((result.modularity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ring_of_cliques() {
        let view = ring_of_cliques(4, 4);
        let result = louvain(&view, &LouvainConfig::default());

        assert_eq!(result.community_count, 4);
        for (c, group) in result.communities().iter().enumerate() {
            let expected: Vec<usize> = (c * 4..c * 4 + 4).collect();
            assert_eq!(group, &expected);
        }
    }

    #[test]
    fn test_partition_covers_every_node_once() {
        let view = ring_of_cliques(5, 3);
        let result = louvain(&view, &LouvainConfig::default());

        assert_eq!(result.assignment.len(), view.node_count);
        let mut seen: Vec<usize> = result.communities().into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..view.node_count).collect::<Vec<_>>());
        assert!(result.assignment.iter().all(|&c| c < result.community_count));
    }

    #[test]
    fn test_edgeless_graph_is_singletons() {
        let view = GraphView::from_edges(["a", "b", "c"], NO_EDGES);
        let result = louvain(&view, &LouvainConfig::default());
        assert_eq!(result.assignment, vec![0, 1, 2]);
        assert_eq!(result.modularity, 0.0);
        assert_eq!(result.levels, 0);
    }

    #[test]
    fn test_isolated_node_keeps_own_community() {
        let view = GraphView::from_edges(
            ["a", "b", "c", "solo"],
            [("a", "b"), ("b", "c"), ("c", "a")],
        );
        let result = louvain(&view, &LouvainConfig::default());
        assert_eq!(result.community_count, 2);
        assert_eq!(result.assignment[3], 1);
    }

    #[test]
    fn test_gain_prefers_denser_community() {
        // joining a community linked by 2 edges beats one linked by 1 at equal totals
        assert!(gain(2.0, 6.0, 2.0, 12.0) > gain(1.0, 6.0, 2.0, 12.0));
        // a heavier community costs more to join
        assert!(gain(1.0, 2.0, 2.0, 12.0) > gain(1.0, 10.0, 2.0, 12.0));
    }

    #[test]
    fn test_modularity_singletons_is_negative() {
        let view = two_triangles();
        let q = modularity(&view, &[0, 1, 2, 3, 4, 5]);
        assert!(q < 0.0);
    }

    #[test]
    fn test_deterministic() {
        let view = ring_of_cliques(6, 4);
        let a = louvain(&view, &LouvainConfig::default());
        let b = louvain(&view, &LouvainConfig::default());
        assert_eq!(a.assignment, b.assignment);
    }
}
