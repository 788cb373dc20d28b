use crate::astar::{SearchContext, SearchEvent, SearchOutcome};
use crate::error::{RouteError, RouteResult};
use crate::observer::StepObserver;
use crate::pathing_grid::{CellState, PathingGrid};
use crate::reconstruct::PredecessorMap;
use crate::{N_SMALLVEC_SIZE, STEP_COST};
use grid_util::point::Point;
use log::{debug, warn};
use smallvec::SmallVec;
use std::ops::ControlFlow;

pub mod astar;
pub mod dijkstra;

/// Manhattan distance between two cells, the exact step count on an empty 4-connected grid.
pub fn manhattan_distance(p1: &Point, p2: &Point) -> i32 {
    p1.manhattan_distance(p2)
}

pub trait GridSolver {
    /// Estimated cost of moving from `p1` to `p2`. Must not overestimate for optimal results.
    fn heuristic(&self, p1: &Point, p2: &Point) -> i32;

    /// Exact cost of a step between two adjacent cells.
    fn cost(&self, p1: &Point, p2: &Point) -> i32 {
        manhattan_distance(p1, p2) * STEP_COST
    }

    /// Sum of the step costs along a path.
    fn get_path_cost(&self, path: &[Point]) -> i32 {
        path.windows(2).map(|w| self.cost(&w[0], &w[1])).sum()
    }

    /// Finds a shortest path from `source` to `target`. Cells entering the frontier are marked
    /// [CellState::Frontier] and expanded cells [CellState::Visited]; the observer is told after
    /// every expansion and polled for cancellation before every iteration.
    ///
    /// Stale neighbour lists are refreshed first.
    fn search<O>(
        &self,
        grid: &mut PathingGrid,
        source: Point,
        target: Point,
        observer: &mut O,
    ) -> RouteResult<PredecessorMap>
    where
        O: StepObserver + ?Sized,
    {
        grid.update();
        if !grid.can_move_to(source) || !grid.can_move_to(target) {
            debug!("{:?} or {:?} is blocked or outside the grid", source, target);
            return Err(RouteError::Unreachable {
                from: source,
                to: target,
            });
        }
        let mut ctx: SearchContext<Point, i32> = SearchContext::new();
        let outcome = ctx.astar(
            grid,
            &source,
            &target,
            |grid, node| {
                grid.neighbours(*node)
                    .into_iter()
                    .map(|n| (n, self.cost(node, &n)))
                    .collect::<SmallVec<[_; N_SMALLVEC_SIZE]>>()
            },
            |point, goal| self.heuristic(point, goal),
            |grid, event| {
                match event {
                    SearchEvent::Poll => {
                        if observer.cancelled() {
                            return ControlFlow::Break(());
                        }
                    }
                    SearchEvent::Discovered(p) => grid.mark(*p, CellState::Frontier),
                    SearchEvent::Expanded(p) => {
                        grid.mark(*p, CellState::Visited);
                        observer.step(grid);
                    }
                }
                ControlFlow::Continue(())
            },
        );
        match outcome {
            SearchOutcome::Found(cost) => {
                debug!("Found path from {:?} to {:?} of cost {}", source, target, cost);
                Ok(PredecessorMap::new(
                    source,
                    target,
                    cost,
                    ctx.take_predecessors(),
                ))
            }
            SearchOutcome::Exhausted => {
                if grid.reachable(&source, &target) {
                    warn!(
                        "{:?} and {:?} share a component but the frontier emptied",
                        source, target
                    );
                } else {
                    debug!("{:?} is not reachable from {:?}", target, source);
                }
                Err(RouteError::Unreachable {
                    from: source,
                    to: target,
                })
            }
            SearchOutcome::Cancelled => {
                debug!("Search from {:?} to {:?} was cancelled", source, target);
                Err(RouteError::Cancelled)
            }
        }
    }

    /// Runs [search](Self::search) and returns the path from `source` to `target` without
    /// painting it.
    fn get_path_single_goal<O>(
        &self,
        grid: &mut PathingGrid,
        source: Point,
        target: Point,
        observer: &mut O,
    ) -> RouteResult<Vec<Point>>
    where
        O: StepObserver + ?Sized,
    {
        self.search(grid, source, target, observer)
            .map(|predecessors| predecessors.path())
    }
}
