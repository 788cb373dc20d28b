use grid_routing::{find_route, PathingGrid, StepCounter};

// The start must visit both waypoints (W) before reaching the end. The visiting order is chosen
// to minimise the total number of steps, and the route is painted onto the grid with `*`.

fn main() {
    let mut pathing_grid: PathingGrid = "
        S.....#...
        .####.#.W.
        .#....#...
        .#.####.#.
        ...W......
        ####.####.
        .........E
    "
    .parse()
    .unwrap();
    println!("{}", pathing_grid);
    let mut counter = StepCounter::default();
    match find_route(&mut pathing_grid, &mut counter) {
        Ok(route) => {
            println!("{}", pathing_grid);
            println!(
                "Route of {} steps, waypoints visited in order {:?}",
                route.length, route.order
            );
            println!("Observer was notified {} times", counter.steps);
        }
        Err(e) => println!("{}", e),
    }
}
