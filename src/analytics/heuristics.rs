//! Structural heuristics built on centrality and adjacency
//!
//! - Bottlenecks: nodes that carry many shortest paths relative to how many
//!   direct connections they have.
//! - Collaboration opportunities: same-type node pairs that are not directly
//!   connected but share neighbours, boosted when Louvain put them in the
//!   same community.

use crate::graph::{MapData, Node};
use livingmap_graph_algorithms::GraphView;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Weight of neighbour overlap (Jaccard) in the collaboration score
const OVERLAP_WEIGHT: f64 = 0.7;
/// Bonus for pairs inside the same community
const COMMUNITY_BONUS: f64 = 0.3;
/// Shared neighbours named in a reason string
const REASON_NAMES: usize = 3;

/// A suggested pairing of two unconnected nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationOpportunity {
    pub node_ids: [String; 2],
    pub score: f64,
    pub reason: String,
}

/// Rank nodes by betweenness over degree centrality.
///
/// Only nodes whose betweenness is positive and at least the graph mean are
/// considered. Ties fall back to raw betweenness, then input order.
pub fn find_bottlenecks(
    view: &GraphView,
    degree: &[f64],
    betweenness: &[f64],
    limit: usize,
) -> Vec<String> {
    let n = view.node_count;
    if n <= 2 || limit == 0 {
        return Vec::new();
    }

    let mean = betweenness.iter().sum::<f64>() / n as f64;

    let mut candidates: Vec<(usize, f64)> = (0..n)
        .filter(|&i| betweenness[i] > 0.0 && betweenness[i] >= mean && degree[i] > 0.0)
        .map(|i| (i, betweenness[i] / degree[i]))
        .collect();

    candidates.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then_with(|| betweenness[b.0].total_cmp(&betweenness[a.0]))
            .then_with(|| a.0.cmp(&b.0))
    });

    candidates
        .into_iter()
        .take(limit)
        .map(|(i, _)| view.node_id(i).to_string())
        .collect()
}

/// Score unconnected same-type pairs that share a neighbour or a community.
///
/// `community` is the Louvain assignment aligned with `view`. Pairs linked
/// only by their community score the bare community bonus, so they rank
/// below any same-community pair with shared neighbours.
pub fn find_collaboration_opportunities(
    data: &MapData,
    view: &GraphView,
    community: &[usize],
    limit: usize,
) -> Vec<CollaborationOpportunity> {
    let n = view.node_count;
    if n < 3 || limit == 0 {
        return Vec::new();
    }

    let lookup = data.node_lookup();
    let node_types: Vec<_> = view
        .index_to_node
        .iter()
        .map(|id| lookup.get(id.as_str()).map(|node| node.node_type))
        .collect();

    let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, &c) in community.iter().enumerate().take(n) {
        members.entry(c).or_default().push(idx);
    }

    let mut shared = vec![0usize; n];
    let mut touched = Vec::new();
    let mut candidates: Vec<(usize, usize, usize, f64)> = Vec::new();

    for u in 0..n {
        for &w in view.neighbors(u) {
            for &v in view.neighbors(w) {
                if v <= u || view.has_edge(u, v) || node_types[u] != node_types[v] {
                    continue;
                }
                if shared[v] == 0 {
                    touched.push(v);
                }
                shared[v] += 1;
            }
        }

        for &v in members.get(&community[u]).map(Vec::as_slice).unwrap_or(&[]) {
            if v <= u || shared[v] > 0 || view.has_edge(u, v) || node_types[u] != node_types[v] {
                continue;
            }
            candidates.push((u, v, 0, COMMUNITY_BONUS));
        }

        for &v in &touched {
            let common = shared[v];
            let union = view.degree(u) + view.degree(v) - common;
            let jaccard = common as f64 / union as f64;
            let bonus = if community[u] == community[v] {
                COMMUNITY_BONUS
            } else {
                0.0
            };
            candidates.push((u, v, common, OVERLAP_WEIGHT * jaccard + bonus));
            shared[v] = 0;
        }
        touched.clear();
    }

    candidates.sort_by(|a, b| {
        b.3.total_cmp(&a.3)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| (a.0, a.1).cmp(&(b.0, b.1)))
    });
    candidates.truncate(limit);

    candidates
        .into_iter()
        .map(|(u, v, common, score)| CollaborationOpportunity {
            node_ids: [view.node_id(u).to_string(), view.node_id(v).to_string()],
            score,
            reason: describe_pair(&lookup, view, u, v, common, community[u] == community[v]),
        })
        .collect()
}

fn describe_pair(
    lookup: &HashMap<&str, &Node>,
    view: &GraphView,
    u: usize,
    v: usize,
    common: usize,
    same_community: bool,
) -> String {
    if common == 0 {
        return "Belong to the same community without a shared connection yet".to_string();
    }

    let names: Vec<&str> = shared_neighbors(view, u, v)
        .into_iter()
        .take(REASON_NAMES)
        .map(|idx| {
            let id = view.node_id(idx);
            lookup.get(id).map(|node| node.display_name()).unwrap_or(id)
        })
        .collect();

    let mut listed = names.join(", ");
    if common > names.len() {
        listed.push_str(&format!(" and {} more", common - names.len()));
    }

    let plural = if common == 1 { "" } else { "s" };
    if same_community {
        format!(
            "Share {} connection{} ({}) and belong to the same community",
            common, plural, listed
        )
    } else {
        format!(
            "Share {} connection{} ({}) across different communities",
            common, plural, listed
        )
    }
}

/// Intersection of two sorted neighbour runs
fn shared_neighbors(view: &GraphView, u: usize, v: usize) -> Vec<usize> {
    let (a, b) = (view.neighbors(u), view.neighbors(v));
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
