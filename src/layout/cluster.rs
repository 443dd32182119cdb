//! Cluster layout: one centre per node type, members on a golden-angle
//! spiral around it.

use super::{require_non_negative, require_positive, Jitter, LayoutGraph, Position, GOLDEN_ANGLE};
use crate::error::{MapError, MapResult};
use crate::graph::NodeType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::TAU;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterOptions {
    /// Explicit centres; unlisted types go on a ring of `center_radius`
    pub centers: HashMap<NodeType, Position>,
    pub center_radius: f64,
    /// Spiral step: the i-th member sits `spacing * √i` from its centre
    pub spacing: f64,
    pub jitter: f64,
    pub seed: u64,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            centers: HashMap::new(),
            center_radius: 500.0,
            spacing: 40.0,
            jitter: 8.0,
            seed: 42,
        }
    }
}

impl ClusterOptions {
    pub fn center_of(&self, node_type: NodeType) -> Position {
        match self.centers.get(&node_type) {
            Some(center) => *center,
            None => {
                let angle = TAU * node_type.ordinal() as f64 / NodeType::ALL.len() as f64;
                Position::default().polar(self.center_radius, angle)
            }
        }
    }
}

pub fn layout(graph: &LayoutGraph<'_>, options: &ClusterOptions) -> MapResult<Vec<Position>> {
    require_non_negative("centerRadius", options.center_radius)?;
    require_positive("spacing", options.spacing)?;
    require_non_negative("jitter", options.jitter)?;
    for (node_type, center) in &options.centers {
        if !center.is_finite() {
            return Err(MapError::InvalidLayoutOption(format!(
                "center for {} is not finite",
                node_type
            )));
        }
    }

    let mut positions = vec![Position::default(); graph.node_count()];
    let mut jitter = Jitter::new(options.seed, options.jitter);
    for (node_type, members) in graph.groups_by_type() {
        let center = options.center_of(node_type);
        for (i, &idx) in members.iter().enumerate() {
            let r = options.spacing * (i as f64).sqrt();
            positions[idx] = jitter.apply(center.polar(r, i as f64 * GOLDEN_ANGLE));
        }
    }

    Ok(positions)
}
