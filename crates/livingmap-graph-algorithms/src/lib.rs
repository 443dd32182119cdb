pub mod common;
pub mod centrality;
pub mod community;
pub mod pathfinding;
pub mod topology;

pub use common::{build_adjacency, AdjacencyList, GraphView, NodeId};
pub use centrality::{
    betweenness_centrality, closeness_centrality, clustering_coefficient, degree_centrality,
    eigenvector_centrality, EigenvectorConfig,
};
pub use community::{louvain, modularity, LouvainConfig, LouvainResult};
pub use pathfinding::{bfs_distances, ShortestPathDag};
pub use topology::local_triangle_counts;
