//! Progress reporting and cooperative cancellation.
//!
//! The searches call [StepObserver::step] after every bounded unit of work (one cell expansion,
//! one reconstruction step) and poll [StepObserver::cancelled] at the top of every search
//! iteration. There is no other suspension point.

use crate::pathing_grid::PathingGrid;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait StepObserver {
    /// Called once per unit of work with the grid in its current, partially marked state.
    fn step(&mut self, grid: &PathingGrid);

    /// Polled before every search iteration; returning `true` aborts with
    /// [RouteError::Cancelled](crate::error::RouteError::Cancelled).
    fn cancelled(&mut self) -> bool {
        false
    }
}

impl<F> StepObserver for F
where
    F: FnMut(&PathingGrid),
{
    fn step(&mut self, grid: &PathingGrid) {
        self(grid)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl StepObserver for NoopObserver {
    fn step(&mut self, _grid: &PathingGrid) {}
}

/// Counts steps, mostly useful in tests and benchmarks.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepCounter {
    pub steps: usize,
}

impl StepObserver for StepCounter {
    fn step(&mut self, _grid: &PathingGrid) {
        self.steps += 1;
    }
}

/// A flag the host can raise to stop a running search. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Pairs an observer with a [CancellationToken]. The observer's own
/// [cancelled](StepObserver::cancelled) answer is honoured as well.
#[derive(Clone, Debug)]
pub struct Cancellable<O> {
    pub observer: O,
    pub token: CancellationToken,
}

impl<O: StepObserver> Cancellable<O> {
    pub fn new(observer: O, token: CancellationToken) -> Cancellable<O> {
        Cancellable { observer, token }
    }
}

impl<O: StepObserver> StepObserver for Cancellable<O> {
    fn step(&mut self, grid: &PathingGrid) {
        self.observer.step(grid);
    }
    fn cancelled(&mut self) -> bool {
        self.token.is_cancelled() || self.observer.cancelled()
    }
}
