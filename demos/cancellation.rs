use grid_routing::{
    AstarSolver, Cancellable, CancellationToken, PathingGrid, StepObserver, WaypointRouter,
};
use grid_util::point::Point;

// A host that stops a search part way, here after a fixed number of expansions. The token can
// equally be cancelled from another thread.

struct CancelAfter {
    token: CancellationToken,
    remaining: usize,
}

impl StepObserver for CancelAfter {
    fn step(&mut self, _grid: &PathingGrid) {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.token.cancel();
        }
    }
}

fn main() {
    const N: usize = 40;
    let mut pathing_grid = PathingGrid::square(N, false).unwrap();
    let token = CancellationToken::new();
    let mut observer = Cancellable::new(
        CancelAfter {
            token: token.clone(),
            remaining: 100,
        },
        token.clone(),
    );
    let router = WaypointRouter::new(AstarSolver::new());
    let result = router.route(
        &mut pathing_grid,
        Some(Point::new(0, 0)),
        Some(Point::new(N as i32 - 1, N as i32 - 1)),
        &[Point::new(N as i32 - 1, 0)],
        &mut observer,
    );
    println!("{:?}", result.map(|route| route.length));
    println!("{}", pathing_grid);

    token.reset();
    let mut redraws = 0;
    let result = router.route(
        &mut pathing_grid,
        Some(Point::new(0, 0)),
        Some(Point::new(N as i32 - 1, N as i32 - 1)),
        &[Point::new(N as i32 - 1, 0)],
        &mut |_: &PathingGrid| redraws += 1,
    );
    println!("{:?} after {} redraws", result.map(|route| route.length), redraws);
}
