use crate::astar::FxIndexMap;
use crate::observer::StepObserver;
use crate::pathing_grid::{CellState, PathingGrid};
use grid_util::point::Point;

/// Walks a search result backward from a goal.
pub trait Backtrack {
    /// The cells from `goal` back to the origin of the walk, goal first.
    fn backtrack(&self, goal: Point) -> Vec<Point>;
}

/// The outcome of one single-pair search: every reached cell mapped to the cell it was reached
/// from with the best known cost. The source has no entry.
#[derive(Clone, Debug, PartialEq)]
pub struct PredecessorMap {
    source: Point,
    target: Point,
    cost: i32,
    came_from: FxIndexMap<Point, Point>,
}

impl PredecessorMap {
    pub fn new(
        source: Point,
        target: Point,
        cost: i32,
        came_from: FxIndexMap<Point, Point>,
    ) -> PredecessorMap {
        PredecessorMap {
            source,
            target,
            cost,
            came_from,
        }
    }
    pub fn source(&self) -> Point {
        self.source
    }
    pub fn target(&self) -> Point {
        self.target
    }
    /// The g-score of the target, i.e. the number of steps of the path.
    pub fn cost(&self) -> i32 {
        self.cost
    }
    pub fn predecessor(&self, point: &Point) -> Option<Point> {
        self.came_from.get(point).copied()
    }
    /// Entries in the order the search first reached them.
    pub fn iter(&self) -> impl Iterator<Item = (&Point, &Point)> {
        self.came_from.iter()
    }
    pub fn len(&self) -> usize {
        self.came_from.len()
    }
    pub fn is_empty(&self) -> bool {
        self.came_from.is_empty()
    }
    /// The path from source to target.
    pub fn path(&self) -> Vec<Point> {
        let mut path = self.backtrack(self.target);
        path.reverse();
        path
    }
}

impl Backtrack for PredecessorMap {
    fn backtrack(&self, goal: Point) -> Vec<Point> {
        // Predecessors are only assigned on strict g-score improvement, so the chain is acyclic.
        std::iter::successors(Some(goal), |p| self.predecessor(p)).collect()
    }
}

/// The legs of a waypoint route in visiting order. Leg `i + 1` starts where leg `i` ends, so
/// walking the legs back to back from the final target retraces the whole route, even where
/// legs cross or share cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StitchedPredecessors {
    pub segments: Vec<PredecessorMap>,
}

impl StitchedPredecessors {
    pub fn new(segments: Vec<PredecessorMap>) -> StitchedPredecessors {
        StitchedPredecessors { segments }
    }
    /// Total number of steps over all legs.
    pub fn cost(&self) -> i32 {
        self.segments.iter().map(PredecessorMap::cost).sum()
    }
}

impl Backtrack for StitchedPredecessors {
    fn backtrack(&self, goal: Point) -> Vec<Point> {
        let mut cells: Vec<Point> = Vec::new();
        let mut cursor = goal;
        for segment in self.segments.iter().rev() {
            // Each leg starts with the stop the previous walk ended on.
            let skip = usize::from(!cells.is_empty());
            cells.extend(segment.backtrack(cursor).into_iter().skip(skip));
            cursor = segment.source();
        }
        if cells.is_empty() {
            cells.push(goal);
        }
        cells
    }
}

/// Walks `predecessors` back from `goal`, marking every cell on the way that is not a start, end
/// or waypoint as [CellState::Path] and calling the observer once per step. Returns the route
/// from its origin to `goal`.
///
/// The map must connect its origin to `goal`; otherwise the walk simply stops early.
pub fn reconstruct<B, O>(
    grid: &mut PathingGrid,
    predecessors: &B,
    goal: Point,
    observer: &mut O,
) -> Vec<Point>
where
    B: Backtrack + ?Sized,
    O: StepObserver + ?Sized,
{
    let mut route = predecessors.backtrack(goal);
    for &cell in route.iter().skip(1) {
        grid.mark(cell, CellState::Path);
        observer.step(grid);
    }
    route.reverse();
    route
}
