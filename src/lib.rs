//! # grid_routing
//!
//! Shortest routes on a uniform-cost, 4-connected grid. Single pairs of cells are connected with
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) using the
//! [Manhattan distance](https://en.wikipedia.org/wiki/Taxicab_geometry) as heuristic and
//! first-in-first-out tie-breaking between equal estimates, so that identical inputs always
//! give identical paths. Routes through a set of mandatory waypoints are found by trying every
//! visiting order, or with the
//! [Held–Karp](https://en.wikipedia.org/wiki/Held%E2%80%93Karp_algorithm) dynamic program once
//! there are many waypoints.
//!
//! Searches run synchronously on the caller's thread and report progress to a
//! [StepObserver](observer::StepObserver), which is also polled for cancellation.
//!
//! Cells are addressed with [Point](grid_util::point::Point), using `x` as the row and `y` as the
//! column.
pub mod astar;
pub mod error;
pub mod layout;
pub mod observer;
pub mod pathing_grid;
pub mod reconstruct;
pub mod route;
pub mod solver;

pub use error::{GridError, RouteError, RouteResult};
pub use observer::{Cancellable, CancellationToken, NoopObserver, StepCounter, StepObserver};
pub use pathing_grid::{CellState, PathingGrid};
pub use reconstruct::{reconstruct, Backtrack, PredecessorMap, StitchedPredecessors};
pub use route::{OrderingStrategy, Route, RouterConfig, WaypointRouter};
pub use solver::{astar::AstarSolver, dijkstra::DijkstraSolver, GridSolver};

/// Cost of a single step between adjacent cells.
pub const STEP_COST: i32 = 1;
/// Inline capacity for neighbour lists; a cell has at most four.
pub const N_SMALLVEC_SIZE: usize = 4;

/// Routes from the grid's start through all of its waypoints to its end using A* and the
/// default [RouterConfig]. The winning route is painted onto the grid.
pub fn find_route<O>(grid: &mut PathingGrid, observer: &mut O) -> RouteResult<Route>
where
    O: StepObserver + ?Sized,
{
    let start = grid.start();
    let end = grid.end();
    let waypoints = grid.waypoints().to_vec();
    WaypointRouter::new(AstarSolver::new()).route(grid, start, end, &waypoints, observer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_util::point::Point;

    #[test]
    fn routes_grid_markers() {
        let mut grid: PathingGrid = "
            S....
            .....
            .....
            .....
            W...E
        "
        .parse()
        .unwrap();
        let route = find_route(&mut grid, &mut NoopObserver).unwrap();
        assert_eq!(route.length, 8);
        assert_eq!(route.order, vec![Point::new(4, 0)]);
        assert_eq!(route.cells.first(), Some(&Point::new(0, 0)));
        assert_eq!(route.cells.last(), Some(&Point::new(4, 4)));
    }

    #[test]
    fn missing_end_is_no_valid_route() {
        let mut grid: PathingGrid = "S..".parse().unwrap();
        assert_eq!(
            find_route(&mut grid, &mut NoopObserver).unwrap_err(),
            RouteError::NoValidRoute
        );
    }
}
