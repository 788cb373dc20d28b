use grid_util::point::Point;

use crate::solver::GridSolver;

/// A* without a heuristic. Expands cells in order of distance only.
#[derive(Clone, Debug, Default)]
pub struct DijkstraSolver;

impl GridSolver for DijkstraSolver {
    fn heuristic(&self, _: &Point, _: &Point) -> i32 {
        0
    }
}
