//! Layout engine
//!
//! Each strategy is a pure function from a [`LayoutGraph`] and its options
//! to one [`Position`] per node. [`apply_layout`] wraps the strategies in a
//! fail-soft pipeline: any error (bad options, a diverging simulation,
//! malformed snapshot) is logged and replaced by a deterministic grid, so
//! every node always comes back with finite coordinates.

pub mod circular;
pub mod cluster;
pub mod force;
pub mod grid;
pub mod quadtree;
pub mod radial;

pub use circular::CircularOptions;
pub use cluster::ClusterOptions;
pub use force::{ForceAtlas2Settings, ForceDirectedOptions};
pub use grid::GridOptions;
pub use radial::RadialOptions;

use crate::algo::build_view;
use crate::error::{MapError, MapResult};
use crate::graph::{MapData, Node, NodeType};
use livingmap_graph_algorithms::GraphView;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, warn};

/// π(3 − √5): successive points rotated by this angle never line up
pub const GOLDEN_ANGLE: f64 = PI * 0.763_932_022_500_210_3;

/// A point on the layout plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Position::new(self.x + dx, self.y + dy)
    }

    /// Point at `radius` and `angle` around `self`
    pub fn polar(&self, radius: f64, angle: f64) -> Self {
        self.offset(radius * angle.cos(), radius * angle.sin())
    }
}

/// Layout strategy names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutStrategy {
    Circular,
    Grid,
    Radial,
    Cluster,
    #[serde(alias = "forceDirected", alias = "force-atlas2")]
    ForceDirected,
}

impl LayoutStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutStrategy::Circular => "circular",
            LayoutStrategy::Grid => "grid",
            LayoutStrategy::Radial => "radial",
            LayoutStrategy::Cluster => "cluster",
            LayoutStrategy::ForceDirected => "force-directed",
        }
    }
}

impl fmt::Display for LayoutStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LayoutStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "circular" => Ok(LayoutStrategy::Circular),
            "grid" => Ok(LayoutStrategy::Grid),
            "radial" => Ok(LayoutStrategy::Radial),
            "cluster" => Ok(LayoutStrategy::Cluster),
            "force-directed" | "forcedirected" | "force" | "force-atlas2" => {
                Ok(LayoutStrategy::ForceDirected)
            }
            other => Err(format!("unknown layout strategy: {}", other)),
        }
    }
}

/// A strategy together with its options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum Layout {
    Circular(CircularOptions),
    Grid(GridOptions),
    Radial(RadialOptions),
    Cluster(ClusterOptions),
    ForceDirected(ForceDirectedOptions),
}

impl Layout {
    /// Strategy with default options and the given jitter/simulation seed
    pub fn from_strategy(strategy: LayoutStrategy, seed: u64) -> Self {
        match strategy {
            LayoutStrategy::Circular => Layout::Circular(CircularOptions {
                seed,
                ..CircularOptions::default()
            }),
            LayoutStrategy::Grid => Layout::Grid(GridOptions::default()),
            LayoutStrategy::Radial => Layout::Radial(RadialOptions::default()),
            LayoutStrategy::Cluster => Layout::Cluster(ClusterOptions {
                seed,
                ..ClusterOptions::default()
            }),
            LayoutStrategy::ForceDirected => Layout::ForceDirected(ForceDirectedOptions {
                seed,
                ..ForceDirectedOptions::default()
            }),
        }
    }

    pub fn strategy(&self) -> LayoutStrategy {
        match self {
            Layout::Circular(_) => LayoutStrategy::Circular,
            Layout::Grid(_) => LayoutStrategy::Grid,
            Layout::Radial(_) => LayoutStrategy::Radial,
            Layout::Cluster(_) => LayoutStrategy::Cluster,
            Layout::ForceDirected(_) => LayoutStrategy::ForceDirected,
        }
    }

    /// Cap simulation work for a degraded retry. Non-iterative strategies
    /// are returned unchanged.
    pub fn reduced_fidelity(self, max_iterations: usize, node_count: usize) -> Self {
        match self {
            Layout::ForceDirected(mut options) => {
                let current = options.effective_iterations(node_count);
                options.iterations = Some(current.min(max_iterations));
                Layout::ForceDirected(options)
            }
            other => other,
        }
    }
}

/// What a strategy sees: the nodes (types, seed positions) and the
/// undirected topology, aligned by index.
pub struct LayoutGraph<'a> {
    pub nodes: &'a [Node],
    pub view: GraphView,
}

impl<'a> LayoutGraph<'a> {
    pub fn new(data: &'a MapData) -> MapResult<Self> {
        data.validate()?;
        Ok(LayoutGraph {
            nodes: &data.nodes,
            view: build_view(data),
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node indices grouped by type, in [`NodeType::ALL`] order, skipping
    /// empty groups. Members keep snapshot order.
    pub fn groups_by_type(&self) -> Vec<(NodeType, Vec<usize>)> {
        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); NodeType::ALL.len()];
        for (idx, node) in self.nodes.iter().enumerate() {
            groups[node.node_type.ordinal()].push(idx);
        }
        NodeType::ALL
            .iter()
            .zip(groups)
            .filter(|(_, members)| !members.is_empty())
            .map(|(t, members)| (*t, members))
            .collect()
    }
}

/// Run a layout, propagating any failure.
pub fn try_layout(data: &MapData, layout: &Layout) -> MapResult<Vec<Node>> {
    let started = Instant::now();
    let graph = LayoutGraph::new(data)?;

    let positions = match layout {
        Layout::Circular(options) => circular::layout(&graph, options)?,
        Layout::Grid(options) => grid::layout(&graph, options)?,
        Layout::Radial(options) => radial::layout(&graph, options)?,
        Layout::Cluster(options) => cluster::layout(&graph, options)?,
        Layout::ForceDirected(options) => force::layout(&graph, options)?,
    };

    ensure_finite(&graph, &positions)?;
    debug!(
        "{} layout placed {} nodes in {:?}",
        layout.strategy(),
        positions.len(),
        started.elapsed()
    );

    Ok(with_positions(&data.nodes, &positions))
}

/// Run a layout; on any error fall back to a deterministic grid.
pub fn apply_layout(data: &MapData, layout: &Layout) -> Vec<Node> {
    match try_layout(data, layout) {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!(
                "{} layout failed, falling back to grid: {}",
                layout.strategy(),
                e
            );
            fallback_layout(data)
        }
    }
}

/// Deterministic grid placement for every node in the snapshot
pub fn fallback_layout(data: &MapData) -> Vec<Node> {
    with_positions(&data.nodes, &grid::fallback(data.nodes.len()))
}

fn ensure_finite(graph: &LayoutGraph<'_>, positions: &[Position]) -> MapResult<()> {
    if positions.len() != graph.node_count() {
        return Err(MapError::InvalidLayoutOption(format!(
            "layout returned {} positions for {} nodes",
            positions.len(),
            graph.node_count()
        )));
    }
    match positions.iter().position(|p| !p.is_finite()) {
        Some(idx) => Err(MapError::NonFinitePosition(graph.nodes[idx].id.clone())),
        None => Ok(()),
    }
}

fn with_positions(nodes: &[Node], positions: &[Position]) -> Vec<Node> {
    nodes
        .iter()
        .zip(positions)
        .map(|(node, p)| node.clone().with_position(p.x, p.y))
        .collect()
}

/// Seeded uniform jitter in `[-amount, amount]` on both axes
pub(crate) struct Jitter {
    rng: StdRng,
    amount: f64,
}

impl Jitter {
    pub(crate) fn new(seed: u64, amount: f64) -> Self {
        Jitter {
            rng: StdRng::seed_from_u64(seed),
            amount,
        }
    }

    pub(crate) fn apply(&mut self, p: Position) -> Position {
        if self.amount <= 0.0 {
            return p;
        }
        let dx = self.rng.gen_range(-self.amount..=self.amount);
        let dy = self.rng.gen_range(-self.amount..=self.amount);
        p.offset(dx, dy)
    }
}

pub(crate) fn require_positive(name: &str, value: f64) -> MapResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MapError::InvalidLayoutOption(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}

pub(crate) fn require_non_negative(name: &str, value: f64) -> MapResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MapError::InvalidLayoutOption(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )))
    }
}
