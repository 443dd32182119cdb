//! Node centrality measures
//!
//! Every function returns an index-aligned `Vec<f64>`; use
//! [`GraphView::to_node_map`] to key the values by node id.
//!
//! Betweenness is computed by brute force: one BFS per source, then for every
//! target the union of all shortest-path predecessor chains is walked. That is
//! `O(N^2 * (V + E))` in the worst case, which is fine for graphs of a few
//! thousand nodes and is the known ceiling of this module.

use super::common::GraphView;
use super::pathfinding::{bfs_distances, ShortestPathDag};
use super::topology::local_triangle_counts;
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Degree centrality: `degree / (N - 1)`, all zero when `N <= 1`.
pub fn degree_centrality(view: &GraphView) -> Vec<f64> {
    let n = view.node_count;
    if n <= 1 {
        return vec![0.0; n];
    }

    let denom = (n - 1) as f64;
    (0..n).map(|i| view.degree(i) as f64 / denom).collect()
}

/// Betweenness centrality.
///
/// For every unordered pair `(s, t)` each node strictly inside any shortest
/// `s`-`t` path is counted once. Counts are normalised by
/// `(N - 1)(N - 2) / 2`; graphs with `N <= 2` yield all zeros.
pub fn betweenness_centrality(view: &GraphView) -> Vec<f64> {
    let n = view.node_count;
    if n <= 2 {
        return vec![0.0; n];
    }

    let counts: Vec<u64> = (0..n)
        .into_par_iter()
        .fold(
            || vec![0u64; n],
            |mut acc, s| {
                let dag = ShortestPathDag::from_source(view, s);
                let mut marks = vec![false; n];
                let mut touched = Vec::new();

                for t in (s + 1)..n {
                    dag.collect_intermediates(t, &mut marks, &mut touched);
                    for &v in &touched {
                        acc[v] += 1;
                        marks[v] = false;
                    }
                    touched.clear();
                }
                acc
            },
        )
        .reduce(
            || vec![0u64; n],
            |mut left, right| {
                for (l, r) in left.iter_mut().zip(right) {
                    *l += r;
                }
                left
            },
        );

    let pairs = ((n - 1) * (n - 2)) as f64 / 2.0;
    counts.into_iter().map(|c| c as f64 / pairs).collect()
}

/// Closeness centrality: `reachable / sum(distances)` over the node's own
/// component. Isolated nodes score 0.
pub fn closeness_centrality(view: &GraphView) -> Vec<f64> {
    (0..view.node_count)
        .into_par_iter()
        .map(|source| {
            let (reachable, total) = bfs_distances(view, source)
                .into_iter()
                .flatten()
                .filter(|&d| d > 0)
                .fold((0usize, 0usize), |(count, sum), d| (count + 1, sum + d));

            if reachable == 0 || total == 0 {
                0.0
            } else {
                reachable as f64 / total as f64
            }
        })
        .collect()
}

/// Local clustering coefficient: connected neighbour pairs over `k(k-1)/2`.
/// Nodes with fewer than two neighbours score 0.
pub fn clustering_coefficient(view: &GraphView) -> Vec<f64> {
    local_triangle_counts(view)
        .into_iter()
        .enumerate()
        .map(|(idx, triangles)| {
            let k = view.degree(idx);
            if k < 2 {
                return 0.0;
            }
            let possible = (k * (k - 1)) as f64 / 2.0;
            triangles as f64 / possible
        })
        .collect()
}

/// Power iteration configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct EigenvectorConfig {
    /// Upper bound on iterations
    pub max_iterations: usize,
    /// Stop once the mean absolute change per node drops below this
    pub tolerance: f64,
}

impl Default for EigenvectorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Eigenvector centrality by power iteration with L2 renormalisation.
///
/// Approximate: bipartite or disconnected graphs may not converge within the
/// iteration budget. Edgeless graphs yield all zeros.
pub fn eigenvector_centrality(view: &GraphView, config: &EigenvectorConfig) -> Vec<f64> {
    let n = view.node_count;
    if n == 0 {
        return Vec::new();
    }

    let mut scores = vec![1.0 / (n as f64).sqrt(); n];
    let mut next = vec![0.0; n];

    for _ in 0..config.max_iterations {
        for (i, slot) in next.iter_mut().enumerate() {
            *slot = view.neighbors(i).iter().map(|&j| scores[j]).sum();
        }

        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            return vec![0.0; n];
        }

        let mut total_diff = 0.0;
        for (score, raw) in scores.iter_mut().zip(&next) {
            let value = raw / norm;
            total_diff += (value - *score).abs();
            *score = value;
        }

        if total_diff < config.tolerance * n as f64 {
            break;
        }
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;
    const NO_EDGES: [(&str, &str); 0] = [];

    fn star() -> GraphView {
        GraphView::from_edges(
            ["hub", "a", "b", "c", "d"],
            [("hub", "a"), ("hub", "b"), ("hub", "c"), ("hub", "d")],
        )
    }

    fn complete(n: usize) -> GraphView {
        let ids: Vec<String> = (0..n).map(|i| format!("n{}", i)).collect();
        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                edges.push((ids[i].as_str(), ids[j].as_str()));
            }
        }
        GraphView::from_edges(ids.iter().map(String::as_str), edges)
    }

    #[test]
    fn test_degree_star() {
        let degree = degree_centrality(&star());
        assert!((degree[0] - 1.0).abs() < EPS);
        for leaf in &degree[1..] {
            assert!((leaf - 0.25).abs() < EPS);
        }
    }

    #[test]
    fn test_degree_degenerate() {
        let single = GraphView::from_edges(["only"], NO_EDGES);
        assert_eq!(degree_centrality(&single), vec![0.0]);
        let empty = GraphView::from_edges(Vec::<&str>::new(), NO_EDGES);
        assert!(degree_centrality(&empty).is_empty());
    }

    #[test]
    fn test_betweenness_star() {
        let betweenness = betweenness_centrality(&star());
        assert!((betweenness[0] - 1.0).abs() < EPS);
        for leaf in &betweenness[1..] {
            assert_eq!(*leaf, 0.0);
        }
    }

    #[test]
    fn test_betweenness_path_counts_each_pair_once() {
        // a - b - c - d : b sits on (a,c) and (a,d); c on (a,d) and (b,d)
        let view = GraphView::from_edges(
            ["a", "b", "c", "d"],
            [("a", "b"), ("b", "c"), ("c", "d")],
        );
        let betweenness = betweenness_centrality(&view);
        let norm = 3.0; // (4-1)(4-2)/2
        assert!((betweenness[1] - 2.0 / norm).abs() < EPS);
        assert!((betweenness[2] - 2.0 / norm).abs() < EPS);
        assert_eq!(betweenness[0], 0.0);
    }

    #[test]
    fn test_betweenness_small_graphs_are_zero() {
        let pair = GraphView::from_edges(["a", "b"], [("a", "b")]);
        assert_eq!(betweenness_centrality(&pair), vec![0.0, 0.0]);
    }

    #[test]
    fn test_closeness_disconnected() {
        // component 1: a - b - c, component 2: x - y
        let view = GraphView::from_edges(
            ["a", "b", "c", "x", "y", "lonely"],
            [("a", "b"), ("b", "c"), ("x", "y")],
        );
        let closeness = closeness_centrality(&view);

        assert!((closeness[0] - 2.0 / 3.0).abs() < EPS);
        assert!((closeness[1] - 1.0).abs() < EPS);
        assert!((closeness[3] - 1.0).abs() < EPS);
        assert_eq!(closeness[5], 0.0);
        assert!(closeness.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_clustering_complete_graph() {
        let clustering = clustering_coefficient(&complete(5));
        assert!(clustering.iter().all(|&c| (c - 1.0).abs() < EPS));
    }

    #[test]
    fn test_clustering_star_is_zero() {
        assert!(clustering_coefficient(&star()).iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_eigenvector_complete_graph_is_uniform() {
        let scores = eigenvector_centrality(&complete(4), &EigenvectorConfig::default());
        for s in &scores {
            assert!((s - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_eigenvector_edgeless() {
        let view = GraphView::from_edges(["a", "b"], NO_EDGES);
        let scores = eigenvector_centrality(&view, &EigenvectorConfig::default());
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn test_eigenvector_hub_dominates() {
        // star plus one leaf-leaf edge to break bipartiteness
        let view = GraphView::from_edges(
            ["hub", "a", "b", "c", "d"],
            [("hub", "a"), ("hub", "b"), ("hub", "c"), ("hub", "d"), ("a", "b")],
        );
        let scores = eigenvector_centrality(&view, &EigenvectorConfig::default());
        let max = scores.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(scores[0], max);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }
}
