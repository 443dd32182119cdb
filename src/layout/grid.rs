//! Grid layout, also the fail-soft fallback for every other strategy

use super::{require_positive, LayoutGraph, Position};
use crate::error::{MapError, MapResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridOptions {
    /// Distance between neighbouring cells
    pub spacing: f64,
    /// One sub-grid per node type, laid out left to right
    pub group_by_type: bool,
    /// Empty columns between type sub-grids
    pub group_gap: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            spacing: 100.0,
            group_by_type: false,
            group_gap: 1,
        }
    }
}

pub fn layout(graph: &LayoutGraph<'_>, options: &GridOptions) -> MapResult<Vec<Position>> {
    require_positive("spacing", options.spacing)?;
    if options.group_gap > 64 {
        return Err(MapError::InvalidLayoutOption(format!(
            "groupGap must be at most 64, got {}",
            options.group_gap
        )));
    }

    let n = graph.node_count();
    if !options.group_by_type {
        return Ok(square_grid(n, options.spacing));
    }

    let mut positions = vec![Position::default(); n];
    let mut column_offset = 0usize;
    let mut max_rows = 0usize;
    for (_, members) in graph.groups_by_type() {
        let cols = columns_for(members.len());
        for (j, &idx) in members.iter().enumerate() {
            let col = column_offset + j % cols;
            let row = j / cols;
            positions[idx] = Position::new(col as f64 * options.spacing, row as f64 * options.spacing);
        }
        max_rows = max_rows.max(members.len().div_ceil(cols));
        column_offset += cols + options.group_gap;
    }

    let width = column_offset.saturating_sub(options.group_gap + 1) as f64 * options.spacing;
    let height = max_rows.saturating_sub(1) as f64 * options.spacing;
    Ok(positions
        .into_iter()
        .map(|p| p.offset(-width / 2.0, -height / 2.0))
        .collect())
}

/// Default grid over `n` nodes. Never fails.
pub fn fallback(n: usize) -> Vec<Position> {
    square_grid(n, GridOptions::default().spacing)
}

/// ⌈√n⌉ columns, row-major, centred on the origin
fn square_grid(n: usize, spacing: f64) -> Vec<Position> {
    if n == 0 {
        return Vec::new();
    }
    let cols = columns_for(n);
    let rows = n.div_ceil(cols);
    let half_w = (cols - 1) as f64 * spacing / 2.0;
    let half_h = (rows - 1) as f64 * spacing / 2.0;

    (0..n)
        .map(|i| {
            Position::new(
                (i % cols) as f64 * spacing - half_w,
                (i / cols) as f64 * spacing - half_h,
            )
        })
        .collect()
}

fn columns_for(n: usize) -> usize {
    ((n as f64).sqrt().ceil() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MapData, Node, NodeType};

    #[test]
    fn test_square_grid_shape() {
        let positions = fallback(10);
        assert_eq!(positions.len(), 10);
        // 4 columns, 3 rows, centred
        assert_eq!(positions[0], Position::new(-150.0, -100.0));
        assert_eq!(positions[3], Position::new(150.0, -100.0));
        assert_eq!(positions[4], Position::new(-150.0, 0.0));
        assert_eq!(positions[9], Position::new(-50.0, 100.0));
    }

    #[test]
    fn test_grid_positions_are_distinct() {
        let positions = fallback(50);
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                assert_ne!(positions[i], positions[j]);
            }
        }
    }

    #[test]
    fn test_empty_and_single() {
        assert!(fallback(0).is_empty());
        assert_eq!(fallback(1), vec![Position::default()]);
    }

    #[test]
    fn test_grouped_subgrids_do_not_overlap() {
        let mut nodes: Vec<Node> = (0..4)
            .map(|i| Node::new(format!("u{}", i), NodeType::User, ""))
            .collect();
        nodes.push(Node::new("t0", NodeType::Team, ""));
        let data = MapData::new(nodes, Vec::new());
        let graph = LayoutGraph::new(&data).unwrap();
        let options = GridOptions {
            group_by_type: true,
            ..GridOptions::default()
        };
        let positions = layout(&graph, &options).unwrap();

        // users fill a 2x2 block, the team sits one gap column to the right
        let max_user_x = positions[..4].iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert!(positions[4].x - max_user_x >= 2.0 * options.spacing - 1e-9);
    }

    #[test]
    fn test_rejects_bad_spacing() {
        let data = MapData::default();
        let graph = LayoutGraph::new(&data).unwrap();
        let options = GridOptions {
            spacing: f64::NAN,
            ..GridOptions::default()
        };
        assert!(layout(&graph, &options).is_err());
    }
}
