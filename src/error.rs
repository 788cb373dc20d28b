//! Error types for grid editing and route planning.

use grid_util::point::Point;
use thiserror::Error;

/// Terminal outcomes of a search or route that did not produce a path.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    /// No barrier-respecting path connects the two cells.
    #[error("no path exists from {from:?} to {to:?}")]
    Unreachable { from: Point, to: Point },

    /// No ordering of the waypoints gives a route whose every leg is reachable,
    /// or the start or end is missing.
    #[error("no valid route visits every waypoint")]
    NoValidRoute,

    /// More waypoints than any ordering strategy can handle, see
    /// [MAX_WAYPOINTS](crate::route::MAX_WAYPOINTS).
    #[error("{count} waypoints exceed the supported maximum of {max}")]
    TooManyWaypoints { count: usize, max: usize },

    /// The host asked the search to stop.
    #[error("search was cancelled")]
    Cancelled,
}

/// Errors raised while building or editing a [PathingGrid](crate::pathing_grid::PathingGrid).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be non-zero, got {rows}x{cols}")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("cell {0:?} lies outside the grid")]
    OutOfBounds(Point),

    #[error("unexpected character {found:?} at row {row}, column {col}")]
    Parse { row: usize, col: usize, found: char },

    #[error("grid rows have inconsistent lengths")]
    Ragged,
}

pub type RouteResult<T> = std::result::Result<T, RouteError>;
