//! Circular layout
//!
//! Nodes sit on one circle whose radius grows with √n. With `group_by_type`
//! each node type gets a contiguous arc proportional to its size, and the
//! radius inside an arc is modulated by the golden angle so long arcs of
//! same-type nodes don't read as a single line.

use super::{require_non_negative, require_positive, Jitter, LayoutGraph, Position};
use crate::error::MapResult;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Relative radius swing inside a type arc
const ARC_MODULATION: f64 = 0.08;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CircularOptions {
    /// Fixed radius; derived from node count when unset
    pub radius: Option<f64>,
    pub min_radius: f64,
    /// Radius per √node when derived
    pub radius_scale: f64,
    pub group_by_type: bool,
    /// Uniform noise added to each coordinate
    pub jitter: f64,
    pub seed: u64,
}

impl Default for CircularOptions {
    fn default() -> Self {
        Self {
            radius: None,
            min_radius: 150.0,
            radius_scale: 60.0,
            group_by_type: true,
            jitter: 0.0,
            seed: 42,
        }
    }
}

impl CircularOptions {
    fn validate(&self) -> MapResult<()> {
        if let Some(radius) = self.radius {
            require_positive("radius", radius)?;
        }
        require_positive("minRadius", self.min_radius)?;
        require_positive("radiusScale", self.radius_scale)?;
        require_non_negative("jitter", self.jitter)
    }

    pub fn radius_for(&self, node_count: usize) -> f64 {
        self.radius
            .unwrap_or_else(|| self.min_radius.max((node_count as f64).sqrt() * self.radius_scale))
    }
}

pub fn layout(graph: &LayoutGraph<'_>, options: &CircularOptions) -> MapResult<Vec<Position>> {
    options.validate()?;

    let n = graph.node_count();
    let origin = Position::default();
    match n {
        0 => return Ok(Vec::new()),
        1 => return Ok(vec![origin]),
        _ => {}
    }

    let radius = options.radius_for(n);
    let mut positions = vec![origin; n];

    if options.group_by_type {
        let mut start = 0.0;
        for (_, members) in graph.groups_by_type() {
            let arc = TAU * members.len() as f64 / n as f64;
            for (j, &idx) in members.iter().enumerate() {
                let angle = start + arc * (j as f64 + 0.5) / members.len() as f64;
                let swing = 1.0 + ARC_MODULATION * (j as f64 * super::GOLDEN_ANGLE).sin();
                positions[idx] = origin.polar(radius * swing, angle);
            }
            start += arc;
        }
    } else {
        for (idx, slot) in positions.iter_mut().enumerate() {
            *slot = origin.polar(radius, TAU * idx as f64 / n as f64);
        }
    }

    let mut jitter = Jitter::new(options.seed, options.jitter);
    Ok(positions.into_iter().map(|p| jitter.apply(p)).collect())
}
