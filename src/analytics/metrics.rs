//! Metrics aggregation
//!
//! Runs every centrality measure, Louvain and the structural heuristics over
//! one snapshot and folds the results into a single [`GraphMetrics`].

use super::heuristics::{find_bottlenecks, find_collaboration_opportunities, CollaborationOpportunity};
use crate::algo::{
    betweenness_centrality, build_view, closeness_centrality, clustering_coefficient,
    degree_centrality, eigenvector_centrality, louvain, LouvainResult,
};
use crate::config::AnalyticsConfig;
use crate::error::MapResult;
use crate::graph::MapData;
use indexmap::IndexMap;
use livingmap_graph_algorithms::GraphView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Per-node structural scores, each normalised to `[0, 1]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetrics {
    pub degree_centrality: f64,
    pub betweenness_centrality: f64,
    pub closeness_centrality: f64,
    pub clustering_coefficient: f64,
    pub eigenvector_centrality: f64,
}

impl NodeMetrics {
    /// Mean of the four centrality measures, used to rank `mostCentralNodes`
    pub fn composite_centrality(&self) -> f64 {
        (self.degree_centrality
            + self.betweenness_centrality
            + self.closeness_centrality
            + self.eigenvector_centrality)
            / 4.0
    }
}

/// One detected community
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    /// Members in snapshot order
    pub node_ids: Vec<String>,
    /// Internal edge density; 0 for singletons
    pub score: f64,
}

/// Everything the rendering layer needs for analytics overlays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetrics {
    pub nodes: IndexMap<String, NodeMetrics>,
    pub clusters: Vec<Cluster>,
    pub most_central_nodes: Vec<String>,
    pub most_connected_clusters: Vec<String>,
    pub bottlenecks: Vec<String>,
    pub collaboration_opportunities: Vec<CollaborationOpportunity>,
    /// Modularity of `clusters`
    #[serde(default)]
    pub modularity: f64,
    /// Set when the pipeline failed and this value is the empty fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A single metric that can be computed on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    Degree,
    Betweenness,
    Closeness,
    Clustering,
    Eigenvector,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Degree => "degree",
            MetricKind::Betweenness => "betweenness",
            MetricKind::Closeness => "closeness",
            MetricKind::Clustering => "clustering",
            MetricKind::Eigenvector => "eigenvector",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "degree" => Ok(MetricKind::Degree),
            "betweenness" => Ok(MetricKind::Betweenness),
            "closeness" => Ok(MetricKind::Closeness),
            "clustering" => Ok(MetricKind::Clustering),
            "eigenvector" => Ok(MetricKind::Eigenvector),
            other => Err(format!("unknown metric: {}", other)),
        }
    }
}

/// Compute the full metrics set for a snapshot.
pub fn calculate_all_metrics(data: &MapData, config: &AnalyticsConfig) -> MapResult<GraphMetrics> {
    data.validate()?;
    let started = Instant::now();
    let view = build_view(data);

    debug!(
        "Calculating metrics for {} nodes, {} edges",
        view.node_count,
        view.edge_count()
    );

    let degree = degree_centrality(&view);
    let betweenness = betweenness_centrality(&view);
    let closeness = closeness_centrality(&view);
    let clustering = clustering_coefficient(&view);
    let eigenvector = eigenvector_centrality(&view, &config.eigenvector);

    let nodes: IndexMap<String, NodeMetrics> = view
        .index_to_node
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let metrics = NodeMetrics {
                degree_centrality: degree[i],
                betweenness_centrality: betweenness[i],
                closeness_centrality: closeness[i],
                clustering_coefficient: clustering[i],
                eigenvector_centrality: eigenvector[i],
            };
            (id.clone(), metrics)
        })
        .collect();

    let communities = louvain(&view, &config.louvain);
    let clusters = build_clusters(&view, &communities);

    let metrics = GraphMetrics {
        most_central_nodes: rank_central_nodes(&nodes, config.top_central_nodes),
        most_connected_clusters: rank_clusters(&clusters, config.top_clusters),
        bottlenecks: find_bottlenecks(&view, &degree, &betweenness, config.max_bottlenecks),
        collaboration_opportunities: find_collaboration_opportunities(
            data,
            &view,
            &communities.assignment,
            config.max_collaboration_opportunities,
        ),
        modularity: communities.modularity,
        nodes,
        clusters,
        error: None,
    };

    info!(
        "Metrics ready: {} nodes, {} clusters, {} bottlenecks in {:?}",
        metrics.nodes.len(),
        metrics.clusters.len(),
        metrics.bottlenecks.len(),
        started.elapsed()
    );

    Ok(metrics)
}

/// Fail-soft variant: on error, returns empty metrics with `error` set.
pub fn calculate_all_metrics_or_default(data: &MapData, config: &AnalyticsConfig) -> GraphMetrics {
    match calculate_all_metrics(data, config) {
        Ok(metrics) => metrics,
        Err(e) => {
            warn!("Metrics calculation failed, returning empty metrics: {}", e);
            GraphMetrics {
                error: Some(e.to_string()),
                ..GraphMetrics::default()
            }
        }
    }
}

/// Compute one metric, keyed by node id in snapshot order.
pub fn calculate_metric(
    data: &MapData,
    kind: MetricKind,
    config: &AnalyticsConfig,
) -> MapResult<IndexMap<String, f64>> {
    data.validate()?;
    let view = build_view(data);

    let values = match kind {
        MetricKind::Degree => degree_centrality(&view),
        MetricKind::Betweenness => betweenness_centrality(&view),
        MetricKind::Closeness => closeness_centrality(&view),
        MetricKind::Clustering => clustering_coefficient(&view),
        MetricKind::Eigenvector => eigenvector_centrality(&view, &config.eigenvector),
    };

    Ok(view.to_node_map(&values))
}

fn build_clusters(view: &GraphView, communities: &LouvainResult) -> Vec<Cluster> {
    let mut internal_edges = vec![0usize; communities.community_count];
    for u in 0..view.node_count {
        let cu = communities.assignment[u];
        internal_edges[cu] += view
            .neighbors(u)
            .iter()
            .filter(|&&v| v > u && communities.assignment[v] == cu)
            .count();
    }

    communities
        .communities()
        .into_iter()
        .enumerate()
        .map(|(cid, members)| {
            let size = members.len();
            let score = if size < 2 {
                0.0
            } else {
                internal_edges[cid] as f64 / ((size * (size - 1)) as f64 / 2.0)
            };
            Cluster {
                id: format!("cluster-{}", cid),
                node_ids: members
                    .into_iter()
                    .map(|idx| view.node_id(idx).to_string())
                    .collect(),
                score,
            }
        })
        .collect()
}

fn rank_central_nodes(nodes: &IndexMap<String, NodeMetrics>, limit: usize) -> Vec<String> {
    let mut ranked: Vec<(usize, &String, f64)> = nodes
        .iter()
        .enumerate()
        .map(|(i, (id, m))| (i, id, m.composite_centrality()))
        .collect();
    ranked.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(_, id, _)| id.clone()).collect()
}

/// Multi-node clusters by density, then size, then id order
fn rank_clusters(clusters: &[Cluster], limit: usize) -> Vec<String> {
    let mut ranked: Vec<(usize, &Cluster)> = clusters
        .iter()
        .enumerate()
        .filter(|(_, c)| c.node_ids.len() > 1)
        .collect();
    ranked.sort_by(|a, b| {
        b.1.score
            .total_cmp(&a.1.score)
            .then_with(|| b.1.node_ids.len().cmp(&a.1.node_ids.len()))
            .then_with(|| a.0.cmp(&b.0))
    });
    ranked.into_iter().take(limit).map(|(_, c)| c.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node, NodeType};

    fn star() -> MapData {
        let mut nodes = vec![Node::new("hub", NodeType::Team, "Hub")];
        let mut edges = Vec::new();
        for leaf in ["l1", "l2", "l3", "l4"] {
            nodes.push(Node::new(leaf, NodeType::User, leaf));
            edges.push(Edge::new("hub", leaf));
        }
        MapData::new(nodes, edges)
    }

    #[test]
    fn test_star_summary() {
        let metrics = calculate_all_metrics(&star(), &AnalyticsConfig::default()).unwrap();

        assert_eq!(metrics.nodes.len(), 5);
        assert_eq!(metrics.most_central_nodes[0], "hub");
        assert_eq!(metrics.bottlenecks, vec!["hub"]);
        assert!(metrics.error.is_none());

        let cluster_members: usize = metrics.clusters.iter().map(|c| c.node_ids.len()).sum();
        assert_eq!(cluster_members, 5);
    }

    #[test]
    fn test_empty_graph() {
        let metrics = calculate_all_metrics(&MapData::default(), &AnalyticsConfig::default()).unwrap();
        assert!(metrics.nodes.is_empty());
        assert!(metrics.clusters.is_empty());
        assert!(metrics.most_central_nodes.is_empty());
    }

    #[test]
    fn test_duplicate_ids_fail_soft() {
        let data = MapData::new(
            vec![
                Node::new("a", NodeType::User, "A"),
                Node::new("a", NodeType::User, "A again"),
            ],
            Vec::new(),
        );
        assert!(calculate_all_metrics(&data, &AnalyticsConfig::default()).is_err());

        let metrics = calculate_all_metrics_or_default(&data, &AnalyticsConfig::default());
        assert!(metrics.nodes.is_empty());
        assert_eq!(metrics.error.as_deref(), Some("Duplicate node id: a"));
    }

    #[test]
    fn test_calculate_single_metric() {
        let values = calculate_metric(&star(), MetricKind::Degree, &AnalyticsConfig::default()).unwrap();
        assert_eq!(values.keys().next().map(String::as_str), Some("hub"));
        assert!((values["hub"] - 1.0).abs() < 1e-9);
        assert!((values["l3"] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_metric_kind_parse() {
        assert_eq!("Betweenness".parse::<MetricKind>(), Ok(MetricKind::Betweenness));
        assert!("pagerank".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_cluster_score_and_ranking() {
        // dense triangle + sparse path of three
        let data = MapData::new(
            ["a", "b", "c", "p", "q", "r"]
                .iter()
                .map(|id| Node::new(*id, NodeType::Team, *id))
                .collect(),
            vec![
                Edge::new("a", "b"),
                Edge::new("b", "c"),
                Edge::new("c", "a"),
                Edge::new("p", "q"),
                Edge::new("q", "r"),
            ],
        );
        let metrics = calculate_all_metrics(&data, &AnalyticsConfig::default()).unwrap();

        assert_eq!(metrics.clusters.len(), 2);
        assert!((metrics.clusters[0].score - 1.0).abs() < 1e-9);
        assert!((metrics.clusters[1].score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.most_connected_clusters, vec!["cluster-0", "cluster-1"]);
    }

    #[test]
    fn test_serialized_field_names() {
        let metrics = calculate_all_metrics(&star(), &AnalyticsConfig::default()).unwrap();
        let json = serde_json::to_value(&metrics).unwrap();

        assert!(json["nodes"]["hub"]["degreeCentrality"].is_number());
        assert!(json["mostCentralNodes"].is_array());
        assert!(json["collaborationOpportunities"].is_array());
        assert!(json.get("error").is_none());
    }
}
