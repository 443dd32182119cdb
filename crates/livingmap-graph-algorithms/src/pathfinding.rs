//! Unweighted shortest-path helpers
//!
//! Everything here is breadth-first search over the undirected view. Nodes
//! outside the source's component are reported as unreachable (`None`), never
//! as an infinite distance.

use super::common::GraphView;
use std::collections::VecDeque;

/// BFS layering from a single source with every shortest-path predecessor kept.
#[derive(Debug, Clone)]
pub struct ShortestPathDag {
    pub source: usize,
    /// Hop distance from `source`; `None` when unreachable
    pub distances: Vec<Option<usize>>,
    /// For each node, all neighbours one layer closer to `source`
    pub predecessors: Vec<Vec<usize>>,
}

impl ShortestPathDag {
    pub fn from_source(view: &GraphView, source: usize) -> Self {
        let n = view.node_count;
        let mut distances = vec![None; n];
        let mut predecessors = vec![Vec::new(); n];
        let mut queue = VecDeque::new();

        distances[source] = Some(0);
        queue.push_back(source);

        while let Some(current) = queue.pop_front() {
            let next_dist = distances[current].map(|d| d + 1);
            for &next in view.neighbors(current) {
                match distances[next] {
                    None => {
                        distances[next] = next_dist;
                        predecessors[next].push(current);
                        queue.push_back(next);
                    }
                    Some(d) if Some(d) == next_dist => {
                        predecessors[next].push(current);
                    }
                    _ => {}
                }
            }
        }

        Self {
            source,
            distances,
            predecessors,
        }
    }

    /// Mark every intermediate node on any shortest path from `source` to
    /// `target` (both endpoints excluded). Returns the number marked.
    ///
    /// `marks` is scratch space of length `node_count`, reset by the caller
    /// via the returned `touched` list.
    pub fn collect_intermediates(
        &self,
        target: usize,
        marks: &mut [bool],
        touched: &mut Vec<usize>,
    ) -> usize {
        if target == self.source || self.distances[target].is_none() {
            return 0;
        }

        let mut stack = vec![target];
        let mut count = 0;
        while let Some(node) = stack.pop() {
            for &pred in &self.predecessors[node] {
                if pred == self.source || marks[pred] {
                    continue;
                }
                marks[pred] = true;
                touched.push(pred);
                count += 1;
                stack.push(pred);
            }
        }
        count
    }
}

/// Hop distances from `source` to every node (`None` = unreachable).
pub fn bfs_distances(view: &GraphView, source: usize) -> Vec<Option<usize>> {
    let mut distances = vec![None; view.node_count];
    let mut queue = VecDeque::new();

    distances[source] = Some(0);
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        let next_dist = distances[current].map(|d| d + 1);
        for &next in view.neighbors(current) {
            if distances[next].is_none() {
                distances[next] = next_dist;
                queue.push_back(next);
            }
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> GraphView {
        // a - b - d
        //  \- c -/
        GraphView::from_edges(
            ["a", "b", "c", "d", "e"],
            [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        )
    }

    #[test]
    fn test_bfs_distances() {
        let view = diamond();
        let dist = bfs_distances(&view, 0);
        assert_eq!(dist, vec![Some(0), Some(1), Some(1), Some(2), None]);
    }

    #[test]
    fn test_intermediates_union_all_paths() {
        let view = diamond();
        let dag = ShortestPathDag::from_source(&view, 0);
        let intermediates = |target: usize| {
            let mut marks = vec![false; view.node_count];
            let mut touched = Vec::new();
            dag.collect_intermediates(target, &mut marks, &mut touched);
            touched.sort_unstable();
            touched
        };
        assert_eq!(intermediates(3), vec![1, 2]);
        assert!(intermediates(1).is_empty());
        assert!(intermediates(4).is_empty());
    }

    #[test]
    fn test_dag_predecessors() {
        let view = diamond();
        let dag = ShortestPathDag::from_source(&view, 0);
        assert_eq!(dag.predecessors[3], vec![1, 2]);
        assert!(dag.predecessors[0].is_empty());
    }
}
