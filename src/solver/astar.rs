use grid_util::point::Point;

use crate::solver::{manhattan_distance, GridSolver};
use crate::STEP_COST;

#[derive(Clone, Debug)]
pub struct AstarSolver {
    /// Scales the heuristic. Values above 1.0 give weighted A*, which expands fewer cells but may
    /// return longer paths.
    pub heuristic_factor: f32,
}

impl Default for AstarSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AstarSolver {
    pub fn new() -> AstarSolver {
        AstarSolver {
            heuristic_factor: 1.0,
        }
    }
}

impl GridSolver for AstarSolver {
    /// The Manhattan distance times the heuristic factor.
    fn heuristic(&self, p1: &Point, p2: &Point) -> i32 {
        ((manhattan_distance(p1, p2) * STEP_COST) as f32 * self.heuristic_factor) as i32
    }
}
