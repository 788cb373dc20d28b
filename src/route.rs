//! Routes from a start to an end through an unordered set of mandatory waypoints.
//!
//! Every leg between two stops is a single-pair search; the optimizer only decides the order in
//! which the waypoints are visited. Small waypoint sets are solved by trying every permutation,
//! larger ones with the Held–Karp dynamic program, which needs `O(2^K·K^2)` leg lookups instead
//! of `O(K!·K)`. Both pick the same order: among equally short routes, the one that comes first
//! in lexicographic order of the input waypoint sequence.

use crate::error::{RouteError, RouteResult};
use crate::observer::StepObserver;
use crate::pathing_grid::PathingGrid;
use crate::reconstruct::{reconstruct, PredecessorMap, StitchedPredecessors};
use crate::solver::GridSolver;
use fxhash::FxHashMap;
use grid_util::point::Point;
use itertools::Itertools;
use log::{debug, info};

/// Waypoint count from which [OrderingStrategy::Auto] switches to Held–Karp.
pub const HELD_KARP_THRESHOLD: usize = 8;
/// Largest number of waypoints a route may have. Held–Karp keeps `2^K·K` partial costs.
pub const MAX_WAYPOINTS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderingStrategy {
    /// Tries all `K!` orders in lexicographic order of the input sequence and keeps the first
    /// strictly shortest one.
    Permutations,
    /// Dynamic programming over subsets of waypoints. Picks the same order as
    /// [Permutations](Self::Permutations), ties included.
    HeldKarp,
    /// [Permutations](Self::Permutations) below `held_karp_from` waypoints, Held–Karp from there on.
    Auto { held_karp_from: usize },
}

impl Default for OrderingStrategy {
    fn default() -> Self {
        OrderingStrategy::Auto {
            held_karp_from: HELD_KARP_THRESHOLD,
        }
    }
}

impl OrderingStrategy {
    fn use_held_karp(self, waypoints: usize) -> bool {
        match self {
            OrderingStrategy::Permutations => false,
            OrderingStrategy::HeldKarp => true,
            OrderingStrategy::Auto { held_karp_from } => waypoints >= held_karp_from,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouterConfig {
    pub strategy: OrderingStrategy,
    /// Reject a route up front when some stop lies in a different connected component than the
    /// start, instead of discovering it through failed searches.
    pub prune_unreachable: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            strategy: OrderingStrategy::default(),
            prune_unreachable: true,
        }
    }
}

/// A complete route through all stops.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    /// Every cell from start to end; cells may repeat when legs overlap.
    pub cells: Vec<Point>,
    /// Number of steps.
    pub length: i32,
    /// The waypoints in visiting order.
    pub order: Vec<Point>,
    pub predecessors: StitchedPredecessors,
}

/// Memoised leg searches between stops, indexed by position in the stop list
/// `[start, waypoints.., end]`.
struct LegTable {
    stops: Vec<Point>,
    legs: FxHashMap<(usize, usize), Option<PredecessorMap>>,
}

impl LegTable {
    fn new(stops: Vec<Point>) -> LegTable {
        LegTable {
            stops,
            legs: FxHashMap::default(),
        }
    }

    /// Length of the leg between two stops, [None] if no path exists. Searches run once per
    /// ordered pair; a cancellation aborts immediately.
    fn cost<S, O>(
        &mut self,
        solver: &S,
        grid: &mut PathingGrid,
        observer: &mut O,
        from: usize,
        to: usize,
    ) -> RouteResult<Option<i32>>
    where
        S: GridSolver + ?Sized,
        O: StepObserver + ?Sized,
    {
        if let Some(leg) = self.legs.get(&(from, to)) {
            return Ok(leg.as_ref().map(PredecessorMap::cost));
        }
        let leg = match solver.search(grid, self.stops[from], self.stops[to], observer) {
            Ok(predecessors) => Some(predecessors),
            Err(RouteError::Unreachable { .. }) => None,
            Err(e) => return Err(e),
        };
        let cost = leg.as_ref().map(PredecessorMap::cost);
        self.legs.insert((from, to), leg);
        Ok(cost)
    }

    /// Total length of visiting the stops in `sequence`, [None] if some leg is unreachable.
    fn total<S, O>(
        &mut self,
        solver: &S,
        grid: &mut PathingGrid,
        observer: &mut O,
        sequence: &[usize],
    ) -> RouteResult<Option<i32>>
    where
        S: GridSolver + ?Sized,
        O: StepObserver + ?Sized,
    {
        let mut total = 0;
        for w in sequence.windows(2) {
            match self.cost(solver, grid, observer, w[0], w[1])? {
                Some(cost) => total += cost,
                None => return Ok(None),
            }
        }
        Ok(Some(total))
    }

    /// The already searched legs along `sequence`, in order.
    fn stitch(&self, sequence: &[usize]) -> StitchedPredecessors {
        StitchedPredecessors::new(
            sequence
                .windows(2)
                .filter_map(|w| self.legs.get(&(w[0], w[1])).cloned().flatten())
                .collect(),
        )
    }
}

/// Finds the shortest route from a start through every waypoint to an end.
#[derive(Clone, Debug, Default)]
pub struct WaypointRouter<S> {
    pub solver: S,
    pub config: RouterConfig,
}

impl<S: GridSolver> WaypointRouter<S> {
    pub fn new(solver: S) -> WaypointRouter<S> {
        WaypointRouter {
            solver,
            config: RouterConfig::default(),
        }
    }

    pub fn with_config(solver: S, config: RouterConfig) -> WaypointRouter<S> {
        WaypointRouter { solver, config }
    }

    /// Finds the best visiting order, then paints the winning route onto the grid. Marks from
    /// earlier searches are cleared first.
    ///
    /// Fails with [RouteError::NoValidRoute] if the start or end is missing or no order reaches
    /// every stop, with [RouteError::TooManyWaypoints] beyond [MAX_WAYPOINTS], and with
    /// [RouteError::Cancelled] as soon as the observer asks to stop.
    pub fn route<O>(
        &self,
        grid: &mut PathingGrid,
        start: Option<Point>,
        end: Option<Point>,
        waypoints: &[Point],
        observer: &mut O,
    ) -> RouteResult<Route>
    where
        O: StepObserver + ?Sized,
    {
        let (Some(start), Some(end)) = (start, end) else {
            info!("Start or end is not set, no route to compute");
            return Err(RouteError::NoValidRoute);
        };
        let (predecessors, length, order) = self.plan(grid, start, end, waypoints, observer)?;
        let cells = reconstruct(grid, &predecessors, end, observer);
        info!(
            "Route of length {} through {} waypoints found",
            length,
            order.len()
        );
        Ok(Route {
            cells,
            length,
            order,
            predecessors,
        })
    }

    /// The search and ordering part of [route](Self::route), without reconstruction.
    pub fn plan<O>(
        &self,
        grid: &mut PathingGrid,
        start: Point,
        end: Point,
        waypoints: &[Point],
        observer: &mut O,
    ) -> RouteResult<(StitchedPredecessors, i32, Vec<Point>)>
    where
        O: StepObserver + ?Sized,
    {
        if waypoints.len() > MAX_WAYPOINTS {
            info!(
                "Refusing to order {} waypoints, at most {} are supported",
                waypoints.len(),
                MAX_WAYPOINTS
            );
            return Err(RouteError::TooManyWaypoints {
                count: waypoints.len(),
                max: MAX_WAYPOINTS,
            });
        }
        grid.update();
        grid.clear_marks();

        if waypoints.is_empty() {
            return match self.solver.search(grid, start, end, observer) {
                Ok(predecessors) => {
                    let length = predecessors.cost();
                    Ok((StitchedPredecessors::new(vec![predecessors]), length, vec![]))
                }
                Err(RouteError::Unreachable { .. }) => Err(RouteError::NoValidRoute),
                Err(e) => Err(e),
            };
        }

        if self.config.prune_unreachable {
            let stops = waypoints.iter().chain(std::iter::once(&end));
            for stop in stops {
                if grid.unreachable(&start, stop) {
                    info!("{:?} is not reachable from {:?}", stop, start);
                    return Err(RouteError::NoValidRoute);
                }
            }
        }

        let k = waypoints.len();
        let stops = std::iter::once(start)
            .chain(waypoints.iter().copied())
            .chain(std::iter::once(end))
            .collect();
        let mut legs = LegTable::new(stops);
        let best = if self.config.strategy.use_held_karp(k) {
            debug!("Ordering {} waypoints with Held-Karp", k);
            self.order_held_karp(&mut legs, grid, observer, k)?
        } else {
            debug!("Ordering {} waypoints by trying all permutations", k);
            self.order_permutations(&mut legs, grid, observer, k)?
        };
        let Some((length, sequence)) = best else {
            info!("No ordering of {} waypoints reaches every stop", k);
            return Err(RouteError::NoValidRoute);
        };
        let order = sequence[1..=k]
            .iter()
            .map(|&stop| legs.stops[stop])
            .collect();
        Ok((legs.stitch(&sequence), length, order))
    }

    /// Returns the shortest valid stop sequence `[0, .., k + 1]` and its length.
    fn order_permutations<O>(
        &self,
        legs: &mut LegTable,
        grid: &mut PathingGrid,
        observer: &mut O,
        k: usize,
    ) -> RouteResult<Option<(i32, Vec<usize>)>>
    where
        O: StepObserver + ?Sized,
    {
        let mut best: Option<(i32, Vec<usize>)> = None;
        for permutation in (1..=k).permutations(k) {
            let sequence: Vec<usize> = std::iter::once(0)
                .chain(permutation)
                .chain(std::iter::once(k + 1))
                .collect();
            match legs.total(&self.solver, grid, observer, &sequence)? {
                Some(total) if best.as_ref().map_or(true, |(b, _)| total < *b) => {
                    debug!("New best ordering {:?} of length {}", sequence, total);
                    best = Some((total, sequence));
                }
                Some(_) => {}
                None => debug!("Ordering {:?} has an unreachable leg", sequence),
            }
        }
        Ok(best)
    }

    /// Held–Karp over subsets of waypoints, run from the end backward. `rest[mask][last]` is the
    /// length of the shortest walk that starts on waypoint `last`, having visited exactly the
    /// waypoints in `mask`, and reaches the end through all the others. The order is then read
    /// off from the start, taking the lowest-numbered waypoint that stays on an optimal route at
    /// every step, which yields the lexicographically first optimal sequence.
    fn order_held_karp<O>(
        &self,
        legs: &mut LegTable,
        grid: &mut PathingGrid,
        observer: &mut O,
        k: usize,
    ) -> RouteResult<Option<(i32, Vec<usize>)>>
    where
        O: StepObserver + ?Sized,
    {
        let full = (1usize << k) - 1;
        let mut rest: Vec<Vec<Option<i32>>> = vec![vec![None; k]; full + 1];

        for last in 0..k {
            rest[full][last] = legs.cost(&self.solver, grid, observer, last + 1, k + 1)?;
        }
        for mask in (1..full).rev() {
            for last in (0..k).filter(|&last| mask & (1 << last) != 0) {
                let mut best: Option<i32> = None;
                for next in (0..k).filter(|&next| mask & (1 << next) == 0) {
                    let Some(tail) = rest[mask | (1 << next)][next] else {
                        continue;
                    };
                    let Some(step) = legs.cost(&self.solver, grid, observer, last + 1, next + 1)?
                    else {
                        continue;
                    };
                    if best.map_or(true, |b| step + tail < b) {
                        best = Some(step + tail);
                    }
                }
                rest[mask][last] = best;
            }
        }

        let mut length: Option<i32> = None;
        for first in 0..k {
            let Some(tail) = rest[1usize << first][first] else {
                continue;
            };
            if let Some(step) = legs.cost(&self.solver, grid, observer, 0, first + 1)? {
                if length.map_or(true, |l| step + tail < l) {
                    length = Some(step + tail);
                }
            }
        }
        let Some(length) = length else {
            return Ok(None);
        };

        let mut sequence = Vec::with_capacity(k + 2);
        sequence.push(0);
        let (mut current, mut mask, mut remaining) = (0, 0usize, length);
        while mask != full {
            let mut chosen = None;
            for next in (0..k).filter(|&next| mask & (1 << next) == 0) {
                let Some(tail) = rest[mask | (1 << next)][next] else {
                    continue;
                };
                // Every leg on an optimal route has been searched already.
                if let Some(step) = legs.cost(&self.solver, grid, observer, current, next + 1)? {
                    if step + tail == remaining {
                        chosen = Some((next, tail));
                        break;
                    }
                }
            }
            let Some((next, tail)) = chosen else {
                return Ok(None);
            };
            sequence.push(next + 1);
            current = next + 1;
            mask |= 1 << next;
            remaining = tail;
        }
        sequence.push(k + 1);
        Ok(Some((length, sequence)))
    }
}
