//! ForceAtlas2 force-directed layout
//!
//! Per iteration every node accumulates three forces:
//!
//! - repulsion from every other node, `k_r * m_i * m_j / d` with
//!   `m = 1 + degree` (exact pairwise, or Barnes–Hut approximated);
//! - attraction along each edge, linear or `ln(1 + d)`;
//! - gravity toward the origin, constant or distance-proportional.
//!
//! Displacement is damped per node by its swing (how much the force changed
//! direction since the previous step) against its traction (how consistent
//! it stayed), then divided by `slow_down` and clamped.

use super::quadtree::{QuadTree, Repulsion};
use super::{require_non_negative, require_positive, Jitter, LayoutGraph, Position};
use crate::error::{MapError, MapResult};
use livingmap_graph_algorithms::GraphView;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::TAU;
use tracing::debug;

/// Simulation tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceAtlas2Settings {
    pub gravity: f64,
    pub strong_gravity_mode: bool,
    /// Repulsion coefficient `k_r`
    pub scaling_ratio: f64,
    pub lin_log_mode: bool,
    /// Treat nodes as discs of `node_size` radius and push overlaps apart
    pub adjust_sizes: bool,
    pub node_size: f64,
    pub barnes_hut_optimize: bool,
    pub barnes_hut_theta: f64,
    pub slow_down: f64,
    /// Per-step displacement cap
    pub max_displacement: f64,
}

impl Default for ForceAtlas2Settings {
    fn default() -> Self {
        Self {
            gravity: 1.0,
            strong_gravity_mode: false,
            scaling_ratio: 2.0,
            lin_log_mode: false,
            adjust_sizes: false,
            node_size: 10.0,
            barnes_hut_optimize: false,
            barnes_hut_theta: 0.5,
            slow_down: 1.0,
            max_displacement: 100.0,
        }
    }
}

impl ForceAtlas2Settings {
    /// Settings scaled to the graph size: Barnes–Hut and a coarser theta
    /// for large graphs, overlap prevention only while it stays affordable.
    pub fn infer(node_count: usize) -> Self {
        let n = node_count.max(1);
        Self {
            gravity: 0.05,
            strong_gravity_mode: true,
            scaling_ratio: 10.0,
            adjust_sizes: n <= 1000,
            barnes_hut_optimize: n > 500,
            barnes_hut_theta: if n > 2000 { 1.0 } else { 0.5 },
            slow_down: 1.0 + (n as f64).ln(),
            ..Self::default()
        }
    }

    /// Iteration budget for a graph of `node_count` nodes
    pub fn iterations_for(node_count: usize) -> usize {
        match node_count {
            0..=50 => 500,
            51..=200 => 300,
            201..=500 => 150,
            501..=2000 => 80,
            _ => 40,
        }
    }

    fn repulsion_kernel(&self) -> Repulsion {
        let kernel = Repulsion::new(self.scaling_ratio);
        if self.adjust_sizes {
            kernel.with_node_size(self.node_size)
        } else {
            kernel
        }
    }

    fn validate(&self) -> MapResult<()> {
        require_non_negative("gravity", self.gravity)?;
        require_positive("scalingRatio", self.scaling_ratio)?;
        require_non_negative("nodeSize", self.node_size)?;
        require_positive("barnesHutTheta", self.barnes_hut_theta)?;
        require_positive("slowDown", self.slow_down)?;
        require_positive("maxDisplacement", self.max_displacement)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceDirectedOptions {
    /// Inferred from node count when unset
    pub iterations: Option<usize>,
    /// Inferred from node count when unset
    pub settings: Option<ForceAtlas2Settings>,
    /// Seeds the initial circle for nodes without a position
    pub seed: u64,
}

impl Default for ForceDirectedOptions {
    fn default() -> Self {
        Self {
            iterations: None,
            settings: None,
            seed: 42,
        }
    }
}

impl ForceDirectedOptions {
    pub fn effective_iterations(&self, node_count: usize) -> usize {
        self.iterations
            .unwrap_or_else(|| ForceAtlas2Settings::iterations_for(node_count))
    }

    pub fn effective_settings(&self, node_count: usize) -> ForceAtlas2Settings {
        self.settings
            .clone()
            .unwrap_or_else(|| ForceAtlas2Settings::infer(node_count))
    }
}

pub fn layout(
    graph: &LayoutGraph<'_>,
    options: &ForceDirectedOptions,
) -> MapResult<Vec<Position>> {
    let n = graph.node_count();
    let settings = options.effective_settings(n);
    settings.validate()?;
    let iterations = options.effective_iterations(n);

    let initial = initial_positions(graph, options.seed);
    if n <= 1 || iterations == 0 {
        return Ok(initial);
    }

    let mut sim = Simulation::new(&graph.view, initial, &settings);
    for iteration in 0..iterations {
        sim.step();
        if let Some(idx) = sim.positions.iter().position(|p| !p.is_finite()) {
            debug!("force layout diverged at iteration {}", iteration);
            return Err(MapError::NonFinitePosition(graph.nodes[idx].id.clone()));
        }
    }
    debug!(
        "force layout ran {} iterations over {} nodes (barnes-hut: {})",
        iterations, n, settings.barnes_hut_optimize
    );

    Ok(sim.positions)
}

/// Caller-supplied positions where present, otherwise a jittered circle.
///
/// Coincident seeds feel no force at all, so a position already taken by
/// an earlier node is nudged until it is free.
fn initial_positions(graph: &LayoutGraph<'_>, seed: u64) -> Vec<Position> {
    let n = graph.node_count();
    let radius = 10.0 * (n as f64).sqrt();
    let mut jitter = Jitter::new(seed, 1.0);
    let mut taken = HashSet::with_capacity(n);

    let mut positions = Vec::with_capacity(n);
    for (i, node) in graph.nodes.iter().enumerate() {
        let mut p = match node.position() {
            Some((x, y)) => Position::new(x, y),
            None => jitter.apply(Position::default().polar(radius, TAU * i as f64 / n as f64)),
        };
        while !taken.insert((p.x.to_bits(), p.y.to_bits())) {
            p = jitter.apply(p);
        }
        positions.push(p);
    }
    positions
}

struct Simulation<'a> {
    view: &'a GraphView,
    settings: &'a ForceAtlas2Settings,
    positions: Vec<Position>,
    masses: Vec<f64>,
    forces: Vec<(f64, f64)>,
    previous: Vec<(f64, f64)>,
    convergence: Vec<f64>,
}

impl<'a> Simulation<'a> {
    fn new(
        view: &'a GraphView,
        positions: Vec<Position>,
        settings: &'a ForceAtlas2Settings,
    ) -> Self {
        let n = positions.len();
        Simulation {
            view,
            settings,
            masses: (0..n).map(|i| 1.0 + view.degree(i) as f64).collect(),
            forces: vec![(0.0, 0.0); n],
            previous: vec![(0.0, 0.0); n],
            convergence: vec![1.0; n],
            positions,
        }
    }

    fn step(&mut self) {
        std::mem::swap(&mut self.previous, &mut self.forces);
        self.forces = self.repulsion();
        self.apply_gravity();
        self.apply_attraction();
        self.move_nodes();
    }

    fn repulsion(&self) -> Vec<(f64, f64)> {
        let n = self.positions.len();
        let s = self.settings;
        let kernel = s.repulsion_kernel();
        if s.barnes_hut_optimize {
            let tree = QuadTree::build(&self.positions, &self.masses);
            return (0..n)
                .into_par_iter()
                .map(|i| {
                    tree.repulsion(
                        i,
                        self.positions[i],
                        self.masses[i],
                        s.barnes_hut_theta,
                        &kernel,
                    )
                })
                .collect();
        }

        (0..n)
            .into_par_iter()
            .map(|i| {
                let p = self.positions[i];
                let (mut fx, mut fy) = (0.0, 0.0);
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let dx = p.x - self.positions[j].x;
                    let dy = p.y - self.positions[j].y;
                    let d2 = dx * dx + dy * dy;
                    if d2 == 0.0 {
                        continue;
                    }
                    let factor = kernel.factor(self.masses[i], self.masses[j], d2);
                    fx += dx * factor;
                    fy += dy * factor;
                }
                (fx, fy)
            })
            .collect()
    }

    fn apply_gravity(&mut self) {
        let s = self.settings;
        for (i, p) in self.positions.iter().enumerate() {
            let d = (p.x * p.x + p.y * p.y).sqrt();
            if d == 0.0 {
                continue;
            }
            let factor = if s.strong_gravity_mode {
                self.masses[i] * s.gravity
            } else {
                self.masses[i] * s.gravity / d
            };
            self.forces[i].0 -= p.x * factor;
            self.forces[i].1 -= p.y * factor;
        }
    }

    fn apply_attraction(&mut self) {
        let (s, view) = (self.settings, self.view);
        for u in 0..self.positions.len() {
            for &v in view.neighbors(u) {
                if v <= u {
                    continue;
                }
                let dx = self.positions[u].x - self.positions[v].x;
                let dy = self.positions[u].y - self.positions[v].y;
                let mut distance = (dx * dx + dy * dy).sqrt();
                if s.adjust_sizes {
                    distance -= 2.0 * s.node_size;
                    if distance <= 0.0 {
                        continue;
                    }
                }
                let factor = if s.lin_log_mode {
                    if distance == 0.0 {
                        continue;
                    }
                    -(1.0 + distance).ln() / distance
                } else {
                    -1.0
                };
                self.forces[u].0 += dx * factor;
                self.forces[u].1 += dy * factor;
                self.forces[v].0 -= dx * factor;
                self.forces[v].1 -= dy * factor;
            }
        }
    }

    fn move_nodes(&mut self) {
        let s = self.settings;
        for i in 0..self.positions.len() {
            let (fx, fy) = self.forces[i];
            let (ox, oy) = self.previous[i];

            let swinging = self.masses[i] * ((ox - fx).powi(2) + (oy - fy).powi(2)).sqrt();
            let traction = ((ox + fx).powi(2) + (oy + fy).powi(2)).sqrt() / 2.0;
            let speed = self.convergence[i] * (1.0 + traction).ln() / (1.0 + swinging.sqrt());
            self.convergence[i] =
                (speed * (fx * fx + fy * fy) / (1.0 + swinging.sqrt())).sqrt().min(1.0);

            let mut mx = fx * speed / s.slow_down;
            let mut my = fy * speed / s.slow_down;
            let len = (mx * mx + my * my).sqrt();
            if len > s.max_displacement {
                let scale = s.max_displacement / len;
                mx *= scale;
                my *= scale;
            }
            self.positions[i] = self.positions[i].offset(mx, my);
        }
    }
}
