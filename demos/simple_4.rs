use grid_routing::{AstarSolver, GridSolver, NoopObserver, PathingGrid};
use grid_util::point::Point;

// In this example a path is found on a 3x3 grid with shape
//  ___
// |S  |
// | # |
// |  E|
//  ___
// where
// - # marks an obstacle
// - S marks the start
// - E marks the end
//
// Moves are only allowed between orthogonal neighbours.

fn main() {
    let mut pathing_grid = PathingGrid::square(3, false).unwrap();
    pathing_grid.set_blocked(Point::new(1, 1), true).unwrap();
    println!("{}", pathing_grid);
    let start = Point::new(0, 0);
    let end = Point::new(2, 2);
    let path = AstarSolver::new()
        .get_path_single_goal(&mut pathing_grid, start, end, &mut NoopObserver)
        .unwrap();
    println!("Path:");
    for p in path {
        println!("{:?}", p);
    }
}
