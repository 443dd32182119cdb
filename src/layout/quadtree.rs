//! Barnes–Hut quadtree for approximate n-body repulsion.
//!
//! Cells live in one arena `Vec`; children are referenced by index. A cell
//! is either a leaf (zero or one body, or several coincident bodies merged
//! at [`MAX_DEPTH`]) or an internal node with exactly four children.

use super::Position;
use std::f64::consts::SQRT_2;

/// Subdivision stops here; deeper bodies are merged into the leaf
const MAX_DEPTH: usize = 24;

/// Repulsion multiplier for overlapping nodes
const OVERLAP_REPULSION: f64 = 100.0;

/// Pairwise repulsion kernel, shared by the exact and Barnes–Hut passes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Repulsion {
    pub coefficient: f64,
    /// Node radius when overlap prevention is on
    pub node_size: Option<f64>,
}

impl Repulsion {
    pub fn new(coefficient: f64) -> Self {
        Repulsion {
            coefficient,
            node_size: None,
        }
    }

    pub fn with_node_size(mut self, node_size: f64) -> Self {
        self.node_size = Some(node_size);
        self
    }

    /// Multiplier for the offset vector between two masses `d2` apart.
    ///
    /// With a node size the distance is measured between disc edges, and
    /// overlapping discs are pushed apart `OVERLAP_REPULSION` times harder.
    pub fn factor(&self, m1: f64, m2: f64, d2: f64) -> f64 {
        let mm = self.coefficient * m1 * m2;
        match self.node_size {
            Some(size) => {
                let gap = d2.sqrt() - 2.0 * size;
                if gap > 0.0 {
                    mm / (gap * gap)
                } else {
                    OVERLAP_REPULSION * mm
                }
            }
            None => mm / d2,
        }
    }

    /// Could a cell of `size` whose centre of mass is `d2` away hold a
    /// body overlapping ours?
    fn may_overlap(&self, size: f64, d2: f64) -> bool {
        match self.node_size {
            Some(node_size) => d2.sqrt() - size * SQRT_2 < 2.0 * node_size,
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
struct Cell {
    min_x: f64,
    min_y: f64,
    size: f64,
    mass: f64,
    com_x: f64,
    com_y: f64,
    body: Option<usize>,
    children: Option<[usize; 4]>,
}

impl Cell {
    fn empty(min_x: f64, min_y: f64, size: f64) -> Self {
        Cell {
            min_x,
            min_y,
            size,
            mass: 0.0,
            com_x: 0.0,
            com_y: 0.0,
            body: None,
            children: None,
        }
    }

    fn absorb(&mut self, p: Position, mass: f64) {
        let total = self.mass + mass;
        self.com_x = (self.com_x * self.mass + p.x * mass) / total;
        self.com_y = (self.com_y * self.mass + p.y * mass) / total;
        self.mass = total;
    }

    fn quadrant(&self, p: Position) -> usize {
        let half = self.size / 2.0;
        let right = p.x >= self.min_x + half;
        let below = p.y >= self.min_y + half;
        right as usize + 2 * below as usize
    }
}

#[derive(Debug, Clone)]
pub struct QuadTree {
    cells: Vec<Cell>,
}

impl QuadTree {
    /// Build over `positions` weighted by `masses` (same length, masses > 0)
    pub fn build(positions: &[Position], masses: &[f64]) -> Self {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in positions {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if positions.is_empty() {
            (min_x, min_y, max_x, max_y) = (0.0, 0.0, 0.0, 0.0);
        }
        // pad so bodies on the max edge still fall inside
        let size = (max_x - min_x).max(max_y - min_y) + 1.0;

        let mut tree = QuadTree {
            cells: Vec::with_capacity(positions.len() * 2 + 1),
        };
        tree.cells.push(Cell::empty(min_x, min_y, size));
        for (body, (&p, &m)) in positions.iter().zip(masses).enumerate() {
            tree.insert(body, p, m);
        }
        tree
    }

    pub fn total_mass(&self) -> f64 {
        self.cells[0].mass
    }

    fn insert(&mut self, body: usize, p: Position, mass: f64) {
        let mut idx = 0;
        let mut depth = 0;
        loop {
            if let Some(children) = self.cells[idx].children {
                self.cells[idx].absorb(p, mass);
                idx = children[self.cells[idx].quadrant(p)];
                depth += 1;
                continue;
            }

            if self.cells[idx].mass == 0.0 {
                let cell = &mut self.cells[idx];
                cell.body = Some(body);
                cell.absorb(p, mass);
                return;
            }

            if depth >= MAX_DEPTH {
                self.cells[idx].absorb(p, mass);
                return;
            }

            // occupied leaf: push the resident down one level, then retry
            let resident = self.cells[idx].clone();
            let children = self.subdivide(idx);
            let resident_pos = Position::new(resident.com_x, resident.com_y);
            let quadrant = self.cells[idx].quadrant(resident_pos);
            let child = &mut self.cells[children[quadrant]];
            child.body = resident.body;
            child.mass = resident.mass;
            child.com_x = resident.com_x;
            child.com_y = resident.com_y;
        }
    }

    fn subdivide(&mut self, idx: usize) -> [usize; 4] {
        let (min_x, min_y, half) = {
            let cell = &self.cells[idx];
            (cell.min_x, cell.min_y, cell.size / 2.0)
        };
        let first = self.cells.len();
        self.cells.push(Cell::empty(min_x, min_y, half));
        self.cells.push(Cell::empty(min_x + half, min_y, half));
        self.cells.push(Cell::empty(min_x, min_y + half, half));
        self.cells.push(Cell::empty(min_x + half, min_y + half, half));

        let children = [first, first + 1, first + 2, first + 3];
        let cell = &mut self.cells[idx];
        cell.children = Some(children);
        cell.body = None;
        children
    }

    /// Repulsive force on `body` at `p`, pointing away from each
    /// (aggregated) mass.
    ///
    /// A cell is treated as a single mass when `size / d < theta`, unless
    /// overlap prevention is on and one of its bodies could be touching `p`.
    pub fn repulsion(
        &self,
        body: usize,
        p: Position,
        mass: f64,
        theta: f64,
        kernel: &Repulsion,
    ) -> (f64, f64) {
        let (mut fx, mut fy) = (0.0, 0.0);
        let mut stack = vec![0usize];

        while let Some(idx) = stack.pop() {
            let cell = &self.cells[idx];
            if cell.mass == 0.0 {
                continue;
            }
            if cell.children.is_none() && cell.body == Some(body) && cell.mass <= mass {
                continue;
            }

            let dx = p.x - cell.com_x;
            let dy = p.y - cell.com_y;
            let d2 = dx * dx + dy * dy;

            let open = cell.size * cell.size >= theta * theta * d2
                || kernel.may_overlap(cell.size, d2);
            match cell.children {
                Some(children) if open => {
                    stack.extend_from_slice(&children);
                }
                _ => {
                    if d2 > 0.0 {
                        let factor = kernel.factor(mass, cell.mass, d2);
                        fx += dx * factor;
                        fy += dy * factor;
                    }
                }
            }
        }

        (fx, fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(positions: &[Position], masses: &[f64], i: usize) -> (f64, f64) {
        let (mut fx, mut fy) = (0.0, 0.0);
        for j in 0..positions.len() {
            if j == i {
                continue;
            }
            let dx = positions[i].x - positions[j].x;
            let dy = positions[i].y - positions[j].y;
            let d2 = dx * dx + dy * dy;
            let factor = masses[i] * masses[j] / d2;
            fx += dx * factor;
            fy += dy * factor;
        }
        (fx, fy)
    }

    #[test]
    fn test_mass_is_conserved() {
        let positions: Vec<Position> = (0..50)
            .map(|i| Position::new((i % 7) as f64 * 13.0, (i / 7) as f64 * 5.0))
            .collect();
        let masses: Vec<f64> = (0..50).map(|i| 1.0 + (i % 3) as f64).collect();
        let tree = QuadTree::build(&positions, &masses);
        assert!((tree.total_mass() - masses.iter().sum::<f64>()).abs() < 1e-9);
    }

    #[test]
    fn test_theta_zero_matches_exact() {
        let positions = vec![
            Position::new(0.0, 0.0),
            Position::new(10.0, 0.0),
            Position::new(0.0, 10.0),
            Position::new(-7.0, 3.0),
            Position::new(25.0, -12.0),
        ];
        let masses = vec![1.0, 2.0, 1.0, 3.0, 1.0];
        let tree = QuadTree::build(&positions, &masses);

        for i in 0..positions.len() {
            let (ax, ay) = tree.repulsion(i, positions[i], masses[i], 0.0, &Repulsion::new(1.0));
            let (ex, ey) = exact(&positions, &masses, i);
            assert!((ax - ex).abs() < 1e-9, "fx mismatch for {}", i);
            assert!((ay - ey).abs() < 1e-9, "fy mismatch for {}", i);
        }
    }

    #[test]
    fn test_approximation_is_close() {
        let positions: Vec<Position> = (0..200)
            .map(|i| {
                let a = i as f64 * 0.37;
                Position::new(a.cos() * (10.0 + i as f64), a.sin() * (10.0 + i as f64))
            })
            .collect();
        let masses = vec![1.0; 200];
        let tree = QuadTree::build(&positions, &masses);

        // outermost body: contributions point the same way and don't cancel
        let (ax, ay) = tree.repulsion(199, positions[199], 1.0, 0.5, &Repulsion::new(1.0));
        let (ex, ey) = exact(&positions, &masses, 199);
        let err = ((ax - ex).powi(2) + (ay - ey).powi(2)).sqrt();
        let norm = (ex * ex + ey * ey).sqrt();
        assert!(err / norm < 0.1);
    }

    #[test]
    fn test_coincident_bodies_terminate() {
        let positions = vec![Position::new(1.0, 1.0); 10];
        let masses = vec![1.0; 10];
        let tree = QuadTree::build(&positions, &masses);
        assert_eq!(tree.total_mass(), 10.0);
        // coincident masses exert no force
        assert_eq!(tree.repulsion(3, positions[3], 1.0, 0.5, &Repulsion::new(1.0)), (0.0, 0.0));
    }

    #[test]
    fn test_overlapping_bodies_use_overlap_kernel() {
        // a and b overlap (d = 15 < 2 * 10); c is far away
        let positions = vec![
            Position::new(0.0, 0.0),
            Position::new(15.0, 0.0),
            Position::new(500.0, 500.0),
        ];
        let masses = vec![1.0, 2.0, 1.0];
        let tree = QuadTree::build(&positions, &masses);
        let kernel = Repulsion::new(1.0).with_node_size(10.0);

        // at this theta the root alone would pass for one far-away mass
        let (fx, _) = tree.repulsion(0, positions[0], 1.0, 10.0, &kernel);
        let from_b = -15.0 * OVERLAP_REPULSION * 2.0;
        assert!(fx <= from_b, "overlap push missing: {}", fx);

        let plain = tree.repulsion(0, positions[0], 1.0, 0.0, &Repulsion::new(1.0));
        assert!(plain.0 > from_b);
    }

    #[test]
    fn test_kernel_factor() {
        let plain = Repulsion::new(2.0);
        assert_eq!(plain.factor(1.0, 3.0, 4.0), 1.5);

        let sized = Repulsion::new(2.0).with_node_size(1.0);
        // d = 4, gap = 2
        assert_eq!(sized.factor(1.0, 3.0, 16.0), 1.5);
        // d = 1, overlapping
        assert_eq!(sized.factor(1.0, 3.0, 1.0), OVERLAP_REPULSION * 6.0);
    }

    #[test]
    fn test_empty_tree() {
        let tree = QuadTree::build(&[], &[]);
        assert_eq!(tree.cells.len(), 1);
        assert_eq!(tree.total_mass(), 0.0);
    }
}
