//! Graph topology analysis algorithms
//!
//! Triangle counting, used by the clustering coefficient.

use super::common::GraphView;

/// Number of triangles each node participates in.
///
/// For every node `u`, counts neighbour pairs `(v, w)` with `v < w` that are
/// themselves adjacent.
pub fn local_triangle_counts(view: &GraphView) -> Vec<usize> {
    (0..view.node_count)
        .map(|u| {
            let neighbors = view.neighbors(u);
            let mut count = 0;
            for (i, &v) in neighbors.iter().enumerate() {
                for &w in &neighbors[i + 1..] {
                    if view.has_edge(v, w) {
                        count += 1;
                    }
                }
            }
            count
        })
        .collect()
}
