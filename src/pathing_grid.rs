use crate::error::GridError;
use crate::N_SMALLVEC_SIZE;
use core::fmt;
use grid_util::grid::{Grid, SimpleGrid};
use grid_util::point::Point;
use log::info;
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;
use std::str::FromStr;

/// Classification of a single cell. The variants are mutually exclusive; writing a new state
/// replaces the old one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellState {
    #[default]
    Navigable,
    Barrier,
    Start,
    End,
    Waypoint,
    /// Temporarily placed in the frontier by a running search.
    Frontier,
    /// Temporarily marked as expanded by a running search.
    Visited,
    /// Part of the last reconstructed route.
    Path,
}

impl CellState {
    pub fn is_barrier(self) -> bool {
        self == CellState::Barrier
    }
    /// Start, end and waypoint cells, which searches and reconstruction never repaint.
    pub fn is_marker(self) -> bool {
        matches!(self, CellState::Start | CellState::End | CellState::Waypoint)
    }
    /// Cells that only carry observation marks and may be repainted freely.
    pub fn is_plain(self) -> bool {
        matches!(
            self,
            CellState::Navigable | CellState::Frontier | CellState::Visited | CellState::Path
        )
    }
    fn symbol(self) -> char {
        match self {
            CellState::Navigable => '.',
            CellState::Barrier => '#',
            CellState::Start => 'S',
            CellState::End => 'E',
            CellState::Waypoint => 'W',
            CellState::Frontier => 'o',
            CellState::Visited => 'x',
            CellState::Path => '*',
        }
    }
}

/// Offsets of the 4-neighbourhood in the order down, up, right, left. Bit `i` of a neighbour mask
/// refers to `NEUMANN_OFFSETS[i]`.
const NEUMANN_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// [PathingGrid] holds the classification of every cell in a [SimpleGrid], together with a
/// cached mask of navigable 4-neighbours per cell and the connected components of the navigable
/// cells, kept in a [UnionFind] structure. Points are addressed with `x` as the row and `y` as the
/// column, so the grid's width is the number of rows.
///
/// Barrier edits only flag the caches as dirty; [update](Self::update) brings them back in line
/// and is run by every search before it starts.
#[derive(Clone, Debug)]
pub struct PathingGrid {
    grid: SimpleGrid<CellState>,
    neighbours: SimpleGrid<u8>,
    start: Option<Point>,
    end: Option<Point>,
    waypoints: Vec<Point>,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
    pub neighbours_dirty: bool,
}

impl PathingGrid {
    /// Creates a grid in which every cell is a barrier if `blocked` is set, navigable otherwise.
    pub fn new(rows: usize, cols: usize, blocked: bool) -> Result<PathingGrid, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::EmptyGrid { rows, cols });
        }
        let state = if blocked {
            CellState::Barrier
        } else {
            CellState::Navigable
        };
        let mut grid = PathingGrid {
            grid: SimpleGrid::new(rows, cols, state),
            neighbours: SimpleGrid::new(rows, cols, 0),
            start: None,
            end: None,
            waypoints: Vec::new(),
            components: UnionFind::new(rows * cols),
            components_dirty: false,
            neighbours_dirty: false,
        };
        grid.update_neighbours();
        grid.generate_components();
        Ok(grid)
    }

    pub fn square(n: usize, blocked: bool) -> Result<PathingGrid, GridError> {
        PathingGrid::new(n, n, blocked)
    }

    pub fn rows(&self) -> usize {
        self.grid.width()
    }
    pub fn cols(&self) -> usize {
        self.grid.height()
    }
    pub fn in_bounds(&self, point: Point) -> bool {
        self.grid.point_in_bounds(point)
    }
    fn checked_ix(&self, point: Point) -> Result<usize, GridError> {
        if self.in_bounds(point) {
            Ok(self.grid.get_ix_point(&point))
        } else {
            Err(GridError::OutOfBounds(point))
        }
    }

    /// The state of a cell, [None] when out of bounds.
    pub fn state(&self, point: Point) -> Option<CellState> {
        self.in_bounds(point).then(|| self.grid.get_point(point))
    }
    /// Whether a search may step onto the cell.
    pub fn can_move_to(&self, point: Point) -> bool {
        self.state(point).is_some_and(|s| !s.is_barrier())
    }
    pub fn start(&self) -> Option<Point> {
        self.start
    }
    pub fn end(&self) -> Option<Point> {
        self.end
    }
    /// Waypoints in the order they were placed.
    pub fn waypoints(&self) -> &[Point] {
        &self.waypoints
    }
    /// Iterates over all cells row by row.
    pub fn cells(&self) -> impl Iterator<Item = (Point, CellState)> + '_ {
        (0..self.rows() as i32)
            .flat_map(move |x| (0..self.cols() as i32).map(move |y| Point::new(x, y)))
            .map(move |p| (p, self.grid.get_point(p)))
    }

    /// The cached navigable neighbours of a cell in the order down, up, right, left. Only valid
    /// after [update](Self::update) if barriers changed since the last refresh.
    pub fn neighbours(&self, point: Point) -> SmallVec<[Point; N_SMALLVEC_SIZE]> {
        if !self.in_bounds(point) {
            return SmallVec::new();
        }
        let mask = self.neighbours.get_point(point);
        NEUMANN_OFFSETS
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1u8 << *i) != 0)
            .map(|(_, (dx, dy))| Point::new(point.x + dx, point.y + dy))
            .collect()
    }

    /// Fresh computation of the navigable 4-neighbourhood, clamped at the grid edge.
    pub fn neighborhood_points(&self, point: Point) -> SmallVec<[Point; N_SMALLVEC_SIZE]> {
        NEUMANN_OFFSETS
            .iter()
            .map(|(dx, dy)| Point::new(point.x + dx, point.y + dy))
            .filter(|p| self.can_move_to(*p))
            .collect()
    }

    /// Bitmask of the navigable neighbours of a cell, indexed like [NEUMANN_OFFSETS].
    fn neighbour_mask(&self, point: Point) -> u8 {
        NEUMANN_OFFSETS
            .iter()
            .enumerate()
            .filter(|(_, (dx, dy))| self.can_move_to(Point::new(point.x + dx, point.y + dy)))
            .fold(0u8, |mask, (i, _)| mask | (1u8 << i))
    }

    /// Recomputes the neighbour mask of every cell.
    pub fn update_neighbours(&mut self) {
        for x in 0..self.rows() as i32 {
            for y in 0..self.cols() as i32 {
                let point = Point::new(x, y);
                let mask = self.neighbour_mask(point);
                self.neighbours.set_point(point, mask);
            }
        }
        self.neighbours_dirty = false;
    }

    /// Regenerates neighbour lists and components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.neighbours_dirty {
            self.update_neighbours();
        }
        if self.components_dirty {
            info!("Components are dirty: regenerating components");
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up navigable grid neighbours to the same
    /// components.
    pub fn generate_components(&mut self) {
        self.components = UnionFind::new(self.rows() * self.cols());
        self.components_dirty = false;
        for x in 0..self.rows() as i32 {
            for y in 0..self.cols() as i32 {
                let point = Point::new(x, y);
                if !self.can_move_to(point) {
                    continue;
                }
                let parent_ix = self.grid.get_ix_point(&point);
                // Down and right suffice, the other two directions are covered from the other side.
                for p in [Point::new(x + 1, y), Point::new(x, y + 1)] {
                    if self.can_move_to(p) {
                        let ix = self.grid.get_ix_point(&p);
                        self.components.union(parent_ix, ix);
                    }
                }
            }
        }
    }

    /// Retrieves the component id a given [Point] belongs to.
    pub fn get_component(&self, point: &Point) -> Option<usize> {
        self.in_bounds(*point)
            .then(|| self.components.find(self.grid.get_ix_point(point)))
    }

    /// Checks if start and goal are on the same component. Stale until [update](Self::update)
    /// when barriers were added since the last refresh.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }

    /// Checks if start and goal are not on the same component.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        if self.can_move_to(*start) && self.can_move_to(*goal) {
            !self
                .components
                .equiv(self.grid.get_ix_point(start), self.grid.get_ix_point(goal))
        } else {
            true
        }
    }

    /// Writes a state and keeps the caches and start/end/waypoint references consistent.
    fn write(&mut self, point: Point, state: CellState) -> Result<(), GridError> {
        let ix = self.checked_ix(point)?;
        let previous = self.grid.get_point(point);
        if previous == state {
            return Ok(());
        }
        match previous {
            CellState::Start => self.start = None,
            CellState::End => self.end = None,
            CellState::Waypoint => self.waypoints.retain(|w| *w != point),
            _ => {}
        }
        self.grid.set_point(point, state);
        if previous.is_barrier() != state.is_barrier() {
            self.neighbours_dirty = true;
            if state.is_barrier() {
                // Blocking may split a component, which a union-find cannot undo.
                self.components_dirty = true;
            } else {
                for n in self.neighborhood_points(point) {
                    let n_ix = self.grid.get_ix_point(&n);
                    self.components.union(ix, n_ix);
                }
            }
        }
        Ok(())
    }

    /// Places or removes a barrier. A start, end or waypoint on the cell is removed.
    pub fn set_blocked(&mut self, point: Point, blocked: bool) -> Result<(), GridError> {
        let state = if blocked {
            CellState::Barrier
        } else {
            CellState::Navigable
        };
        if !blocked && self.state(point).is_some_and(|s| !s.is_barrier()) {
            // Unblocking an unblocked cell leaves markers in place.
            return self.checked_ix(point).map(|_| ());
        }
        self.write(point, state)
    }

    /// Moves the start to `point`, replacing whatever the cell held.
    pub fn set_start(&mut self, point: Point) -> Result<(), GridError> {
        self.checked_ix(point)?;
        if let Some(old) = self.start.filter(|old| *old != point) {
            self.write(old, CellState::Navigable)?;
        }
        self.write(point, CellState::Start)?;
        self.start = Some(point);
        Ok(())
    }

    /// Moves the end to `point`, replacing whatever the cell held.
    pub fn set_end(&mut self, point: Point) -> Result<(), GridError> {
        self.checked_ix(point)?;
        if let Some(old) = self.end.filter(|old| *old != point) {
            self.write(old, CellState::Navigable)?;
        }
        self.write(point, CellState::End)?;
        self.end = Some(point);
        Ok(())
    }

    /// Appends a mandatory waypoint. Placing a waypoint twice on the same cell is a no-op.
    pub fn add_waypoint(&mut self, point: Point) -> Result<(), GridError> {
        if self.state(point) == Some(CellState::Waypoint) {
            return Ok(());
        }
        self.write(point, CellState::Waypoint)?;
        self.waypoints.push(point);
        Ok(())
    }

    /// Removes a waypoint, leaving a navigable cell. Returns whether a waypoint was there.
    pub fn remove_waypoint(&mut self, point: Point) -> Result<bool, GridError> {
        self.checked_ix(point)?;
        if self.grid.get_point(point) != CellState::Waypoint {
            return Ok(false);
        }
        self.write(point, CellState::Navigable)?;
        Ok(true)
    }

    /// Turns any cell back into a plain navigable cell.
    pub fn reset(&mut self, point: Point) -> Result<(), GridError> {
        self.write(point, CellState::Navigable)
    }

    /// Clears the frontier, visited and path marks left by searches and reconstruction.
    pub fn clear_marks(&mut self) {
        for state in self.grid.values.iter_mut() {
            if state.is_plain() {
                *state = CellState::Navigable;
            }
        }
    }

    /// Paints an observation mark onto a plain cell; markers and barriers are left alone.
    pub(crate) fn mark(&mut self, point: Point, state: CellState) {
        debug_assert!(state.is_plain());
        if self.state(point).is_some_and(CellState::is_plain) {
            self.grid.set_point(point, state);
        }
    }
}

impl fmt::Display for PathingGrid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for x in 0..self.rows() as i32 {
            let line: String = (0..self.cols() as i32)
                .map(|y| self.grid.get_point(Point::new(x, y)).symbol())
                .collect();
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Parses one row per line using `.` for navigable cells, `#` for barriers and `S`, `E`, `W` for
/// the start, end and waypoints. Waypoints are added in reading order.
impl FromStr for PathingGrid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let rows = lines.len();
        let cols = lines.first().map_or(0, |l| l.chars().count());
        if lines.iter().any(|l| l.chars().count() != cols) {
            return Err(GridError::Ragged);
        }
        let mut grid = PathingGrid::new(rows, cols, false)?;
        for (row, line) in lines.iter().enumerate() {
            for (col, c) in line.chars().enumerate() {
                let p = Point::new(row as i32, col as i32);
                match c {
                    '.' => {}
                    '#' => grid.set_blocked(p, true)?,
                    'S' => grid.set_start(p)?,
                    'E' => grid.set_end(p)?,
                    'W' => grid.add_waypoint(p)?,
                    found => return Err(GridError::Parse { row, col, found }),
                }
            }
        }
        grid.update();
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert_eq!(
            PathingGrid::new(0, 3, false).unwrap_err(),
            GridError::EmptyGrid { rows: 0, cols: 3 }
        );
    }

    #[test]
    fn neighbour_order_is_down_up_right_left() {
        let grid = PathingGrid::square(3, false).unwrap();
        assert_eq!(
            grid.neighbours(p(1, 1)).as_slice(),
            &[p(2, 1), p(0, 1), p(1, 2), p(1, 0)]
        );
    }

    #[test]
    fn neighbours_are_clamped_at_edges() {
        let grid = PathingGrid::square(3, false).unwrap();
        assert_eq!(grid.neighbours(p(0, 0)).as_slice(), &[p(1, 0), p(0, 1)]);
        assert_eq!(grid.neighbours(p(2, 2)).as_slice(), &[p(1, 2), p(2, 1)]);
        assert!(grid.neighbours(p(5, 5)).is_empty());
    }

    #[test]
    fn barrier_edits_refresh_on_update() {
        let mut grid = PathingGrid::square(3, false).unwrap();
        grid.set_blocked(p(2, 1), true).unwrap();
        assert!(grid.neighbours_dirty);
        // Stale until refreshed.
        assert_eq!(grid.neighbours(p(1, 1)).len(), 4);
        grid.update();
        assert!(!grid.neighbours_dirty);
        assert_eq!(
            grid.neighbours(p(1, 1)).as_slice(),
            &[p(0, 1), p(1, 2), p(1, 0)]
        );
    }

    #[test]
    fn non_square_grid_layout() {
        // Two rows, four columns: the grid's width runs along x, i.e. over the rows.
        let text = "S..#\n.#.E\n";
        let mut grid: PathingGrid = text.parse().unwrap();
        assert_eq!((grid.rows(), grid.cols()), (2, 4));
        assert_eq!(grid.to_string(), text);
        assert_eq!(grid.state(p(1, 3)), Some(CellState::End));
        assert_eq!(grid.state(p(3, 1)), None);
        assert_eq!(grid.neighbours(p(0, 2)).as_slice(), &[p(1, 2), p(0, 1)]);
        assert_eq!(grid.neighbours(p(1, 3)).as_slice(), &[p(1, 2)]);
        assert_eq!(grid.cells().nth(4), Some((p(1, 0), CellState::Navigable)));
        assert!(grid.reachable(&p(0, 0), &p(1, 3)));
        grid.set_blocked(p(1, 2), true).unwrap();
        grid.update();
        assert!(grid.unreachable(&p(0, 0), &p(1, 3)));
        assert_eq!(
            grid.get_component(&p(1, 3)),
            Some(grid.components.find(1 + 3 * grid.rows()))
        );
    }

    /// Tests whether points are correctly mapped to different connected components
    #[test]
    fn test_component_generation() {
        // |.#.|
        // |.#.|
        let mut grid: PathingGrid = "
            .#.
            .#.
        "
        .parse()
        .unwrap();
        grid.generate_components();
        assert!(grid.reachable(&p(0, 0), &p(1, 0)));
        assert!(grid.unreachable(&p(0, 0), &p(0, 2)));
        assert!(grid.unreachable(&p(0, 0), &p(0, 1)));
        assert_ne!(grid.get_component(&p(0, 0)), grid.get_component(&p(1, 2)));
    }

    #[test]
    fn blocking_splits_components_after_update() {
        let mut grid = PathingGrid::new(1, 3, false).unwrap();
        assert!(grid.reachable(&p(0, 0), &p(0, 2)));
        grid.set_blocked(p(0, 1), true).unwrap();
        assert!(grid.components_dirty);
        grid.update();
        assert!(grid.unreachable(&p(0, 0), &p(0, 2)));
        grid.set_blocked(p(0, 1), false).unwrap();
        // Unblocking joins components right away.
        assert!(!grid.components_dirty);
        assert!(grid.reachable(&p(0, 0), &p(0, 2)));
    }

    #[test]
    fn markers_are_last_write_wins() {
        let mut grid = PathingGrid::square(3, false).unwrap();
        grid.set_start(p(0, 0)).unwrap();
        grid.set_end(p(2, 2)).unwrap();
        grid.add_waypoint(p(1, 1)).unwrap();
        grid.add_waypoint(p(0, 2)).unwrap();
        assert_eq!(grid.waypoints(), &[p(1, 1), p(0, 2)]);

        // The start moves onto a waypoint, which is dropped.
        grid.set_start(p(1, 1)).unwrap();
        assert_eq!(grid.start(), Some(p(1, 1)));
        assert_eq!(grid.state(p(0, 0)), Some(CellState::Navigable));
        assert_eq!(grid.waypoints(), &[p(0, 2)]);

        // A barrier over the end removes the end.
        grid.set_blocked(p(2, 2), true).unwrap();
        assert_eq!(grid.end(), None);
        assert_eq!(grid.state(p(2, 2)), Some(CellState::Barrier));

        // A waypoint over a barrier unblocks it.
        grid.add_waypoint(p(2, 2)).unwrap();
        grid.update();
        assert!(grid.can_move_to(p(2, 2)));
        assert_eq!(grid.waypoints(), &[p(0, 2), p(2, 2)]);

        assert!(grid.remove_waypoint(p(0, 2)).unwrap());
        assert!(!grid.remove_waypoint(p(0, 2)).unwrap());
        assert_eq!(grid.waypoints(), &[p(2, 2)]);
    }

    #[test]
    fn out_of_bounds_edits_fail() {
        let mut grid = PathingGrid::square(2, false).unwrap();
        assert_eq!(
            grid.set_start(p(2, 0)),
            Err(GridError::OutOfBounds(p(2, 0)))
        );
        assert_eq!(
            grid.set_blocked(p(-1, 0), true),
            Err(GridError::OutOfBounds(p(-1, 0)))
        );
        assert_eq!(grid.state(p(0, 2)), None);
    }

    #[test]
    fn clear_marks_keeps_markers_and_barriers() {
        let mut grid: PathingGrid = "S#E".parse().unwrap();
        grid.mark(p(0, 0), CellState::Path);
        grid.mark(p(0, 1), CellState::Path);
        assert_eq!(grid.state(p(0, 0)), Some(CellState::Start));
        assert_eq!(grid.state(p(0, 1)), Some(CellState::Barrier));

        let mut grid = PathingGrid::new(1, 3, false).unwrap();
        grid.mark(p(0, 0), CellState::Frontier);
        grid.mark(p(0, 1), CellState::Visited);
        grid.mark(p(0, 2), CellState::Path);
        assert_eq!(grid.to_string(), "ox*\n");
        grid.clear_marks();
        assert_eq!(grid.to_string(), "...\n");
    }

    #[test]
    fn parses_and_displays() {
        let text = "S.#\n.W.\n#.E\n";
        let grid: PathingGrid = text.parse().unwrap();
        assert_eq!(grid.start(), Some(p(0, 0)));
        assert_eq!(grid.end(), Some(p(2, 2)));
        assert_eq!(grid.waypoints(), &[p(1, 1)]);
        assert_eq!(grid.to_string(), text);
        assert_eq!("..\n.".parse::<PathingGrid>().unwrap_err(), GridError::Ragged);
        assert_eq!(
            "..\n.?".parse::<PathingGrid>().unwrap_err(),
            GridError::Parse {
                row: 1,
                col: 1,
                found: '?'
            }
        );
        assert_eq!(
            "".parse::<PathingGrid>().unwrap_err(),
            GridError::EmptyGrid { rows: 0, cols: 0 }
        );
    }
}
