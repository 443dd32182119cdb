//! Radial layout: concentric rings around a single centre node.
//!
//! Nodes are ordered by type tier (position in `center_types`, unlisted types
//! last), then by degree, then snapshot order. Ring 0 holds one node; ring
//! `k` has radius `k * ring_spacing` and as many slots as fit at
//! `min_node_spacing` arc length. A new tier always starts on a fresh ring.

use super::{require_positive, LayoutGraph, Position};
use crate::error::MapResult;
use crate::graph::NodeType;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Slots on the innermost ring regardless of spacing
const MIN_RING_SLOTS: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadialOptions {
    pub ring_spacing: f64,
    pub min_node_spacing: f64,
    /// Types pulled toward the centre, highest priority first
    pub center_types: Vec<NodeType>,
}

impl Default for RadialOptions {
    fn default() -> Self {
        Self {
            ring_spacing: 120.0,
            min_node_spacing: 60.0,
            center_types: Vec::new(),
        }
    }
}

impl RadialOptions {
    fn tier(&self, node_type: NodeType) -> usize {
        self.center_types
            .iter()
            .position(|t| *t == node_type)
            .unwrap_or(self.center_types.len())
    }

    fn ring_capacity(&self, ring: usize) -> usize {
        let circumference = TAU * ring as f64 * self.ring_spacing;
        ((circumference / self.min_node_spacing).floor() as usize).max(MIN_RING_SLOTS)
    }
}

pub fn layout(graph: &LayoutGraph<'_>, options: &RadialOptions) -> MapResult<Vec<Position>> {
    require_positive("ringSpacing", options.ring_spacing)?;
    require_positive("minNodeSpacing", options.min_node_spacing)?;

    let n = graph.node_count();
    if n == 0 {
        return Ok(Vec::new());
    }

    let tiers: Vec<usize> = graph
        .nodes
        .iter()
        .map(|node| options.tier(node.node_type))
        .collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        tiers[a]
            .cmp(&tiers[b])
            .then_with(|| graph.view.degree(b).cmp(&graph.view.degree(a)))
            .then_with(|| a.cmp(&b))
    });

    // rings[k] = node indices on ring k
    let mut rings: Vec<Vec<usize>> = vec![vec![order[0]]];
    let mut current_tier = tiers[order[0]];
    for &idx in &order[1..] {
        let ring = rings.len() - 1;
        let full = ring == 0 || rings[ring].len() >= options.ring_capacity(ring);
        if full || tiers[idx] != current_tier {
            rings.push(Vec::new());
        }
        current_tier = tiers[idx];
        if let Some(last) = rings.last_mut() {
            last.push(idx);
        }
    }

    let origin = Position::default();
    let mut positions = vec![origin; n];
    for (k, members) in rings.iter().enumerate() {
        let radius = k as f64 * options.ring_spacing;
        // stagger alternate rings by half a slot
        let phase = if k % 2 == 0 { 0.0 } else { 0.5 };
        for (j, &idx) in members.iter().enumerate() {
            let angle = TAU * (j as f64 + phase) / members.len() as f64;
            positions[idx] = origin.polar(radius, angle);
        }
    }

    Ok(positions)
}
