//! This module implements the frontier and score bookkeeping of A* in a form that is generic over
//! the node and cost types. Successor generation, the heuristic and observation are supplied as
//! closures that receive the search space explicitly, so a caller can both read its grid while
//! expanding and mark it while observing.

use fxhash::{FxBuildHasher, FxHashMap, FxHashSet};
use indexmap::IndexMap;
use num_traits::{Bounded, Zero};

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;
use std::ops::ControlFlow;

pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

struct FrontierEntry<N, C> {
    estimated_cost: C,
    sequence: u64,
    node: N,
}

impl<N, C: PartialEq> Eq for FrontierEntry<N, C> {}

impl<N, C: PartialEq> PartialEq for FrontierEntry<N, C> {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_cost.eq(&other.estimated_cost) && self.sequence == other.sequence
    }
}

impl<N, C: Ord> PartialOrd for FrontierEntry<N, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<N, C: Ord> Ord for FrontierEntry<N, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: the smallest estimate wins, and among equal estimates the
        // entry that was inserted first.
        match other.estimated_cost.cmp(&self.estimated_cost) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            s => s,
        }
    }
}

/// Notifications handed to the observer closure of [SearchContext::astar].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchEvent<'a, N> {
    /// Top of an iteration, before the frontier is popped. Answering [ControlFlow::Break]
    /// cancels the search.
    Poll,
    /// A node received a better g-score and was (re)inserted into the frontier.
    Discovered(&'a N),
    /// All successors of a node have been processed.
    Expanded(&'a N),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchOutcome<C> {
    /// The target was popped from the frontier with the given g-score.
    Found(C),
    /// The frontier emptied before the target was reached.
    Exhausted,
    Cancelled,
}

/// Buffers for a single A* search. Everything is cleared when a new search starts, so scores and
/// predecessors never leak between invocations.
pub struct SearchContext<N, C> {
    frontier: BinaryHeap<FrontierEntry<N, C>>,
    open: FxHashSet<N>,
    g_score: FxHashMap<N, C>,
    f_score: FxHashMap<N, C>,
    came_from: FxIndexMap<N, N>,
    sequence: u64,
}

impl<N, C> Default for SearchContext<N, C>
where
    N: Eq + Hash + Clone,
    C: Zero + Bounded + Ord + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<N, C> SearchContext<N, C>
where
    N: Eq + Hash + Clone,
    C: Zero + Bounded + Ord + Copy,
{
    pub fn new() -> SearchContext<N, C> {
        SearchContext {
            frontier: BinaryHeap::new(),
            open: FxHashSet::default(),
            g_score: FxHashMap::default(),
            f_score: FxHashMap::default(),
            came_from: FxIndexMap::default(),
            sequence: 0,
        }
    }

    fn clear(&mut self) {
        self.frontier.clear();
        self.open.clear();
        self.g_score.clear();
        self.f_score.clear();
        self.came_from.clear();
        self.sequence = 0;
    }

    /// Best known cost from the search source, [Bounded::max_value] if unvisited.
    pub fn g_score(&self, node: &N) -> C {
        self.g_score.get(node).copied().unwrap_or_else(C::max_value)
    }

    /// g-score plus heuristic estimate, [Bounded::max_value] if unvisited.
    pub fn f_score(&self, node: &N) -> C {
        self.f_score.get(node).copied().unwrap_or_else(C::max_value)
    }

    pub fn predecessors(&self) -> &FxIndexMap<N, N> {
        &self.came_from
    }

    /// Hands out the predecessor map of the last search, leaving an empty one behind.
    pub fn take_predecessors(&mut self) -> FxIndexMap<N, N> {
        std::mem::take(&mut self.came_from)
    }

    fn push(&mut self, node: N, estimated_cost: C) {
        self.sequence += 1;
        self.open.insert(node.clone());
        self.frontier.push(FrontierEntry {
            estimated_cost,
            sequence: self.sequence,
            node,
        });
    }

    pub fn astar<G, FN, IN, FH, FO>(
        &mut self,
        space: &mut G,
        start: &N,
        target: &N,
        mut successors: FN,
        mut heuristic: FH,
        mut observe: FO,
    ) -> SearchOutcome<C>
    where
        FN: FnMut(&G, &N) -> IN,
        IN: IntoIterator<Item = (N, C)>,
        FH: FnMut(&N, &N) -> C,
        FO: FnMut(&mut G, SearchEvent<'_, N>) -> ControlFlow<()>,
    {
        self.clear();
        let h = heuristic(start, target);
        self.g_score.insert(start.clone(), C::zero());
        self.f_score.insert(start.clone(), h);
        self.push(start.clone(), h);

        loop {
            if observe(&mut *space, SearchEvent::Poll).is_break() {
                return SearchOutcome::Cancelled;
            }
            let Some(FrontierEntry {
                estimated_cost,
                node,
                ..
            }) = self.frontier.pop()
            else {
                return SearchOutcome::Exhausted;
            };
            // A node is pushed again whenever its score improves, so older entries for it are
            // skipped here instead of being removed from the heap.
            if !self.open.contains(&node) || estimated_cost > self.f_score(&node) {
                continue;
            }
            self.open.remove(&node);
            if node == *target {
                return SearchOutcome::Found(self.g_score(&node));
            }

            let cost = self.g_score(&node);
            for (successor, move_cost) in successors(&*space, &node) {
                let new_cost = cost + move_cost;
                if new_cost < self.g_score(&successor) {
                    let estimate = new_cost + heuristic(&successor, target);
                    self.came_from.insert(successor.clone(), node.clone());
                    self.g_score.insert(successor.clone(), new_cost);
                    self.f_score.insert(successor.clone(), estimate);
                    let _ = observe(&mut *space, SearchEvent::Discovered(&successor));
                    self.push(successor, estimate);
                }
            }
            let _ = observe(&mut *space, SearchEvent::Expanded(&node));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Weighted edges of a small directed graph on usize nodes.
    fn edges(node: &usize) -> Vec<(usize, i32)> {
        match node {
            0 => vec![(1, 1), (2, 4)],
            1 => vec![(2, 1), (3, 5)],
            2 => vec![(3, 1)],
            _ => vec![],
        }
    }

    #[test]
    fn frontier_breaks_ties_by_insertion() {
        let mut heap = BinaryHeap::new();
        for (sequence, node) in [(1, 'a'), (2, 'b'), (3, 'c')] {
            heap.push(FrontierEntry {
                estimated_cost: 5,
                sequence,
                node,
            });
        }
        heap.push(FrontierEntry {
            estimated_cost: 7,
            sequence: 0,
            node: 'z',
        });
        let order: Vec<char> = std::iter::from_fn(|| heap.pop().map(|e| e.node)).collect();
        assert_eq!(order, vec!['a', 'b', 'c', 'z']);
    }

    #[test]
    fn finds_cheapest_chain() {
        let mut ctx: SearchContext<usize, i32> = SearchContext::new();
        let outcome = ctx.astar(
            &mut (),
            &0,
            &3,
            |_, n| edges(n),
            |_, _| 0,
            |_, _| ControlFlow::Continue(()),
        );
        assert_eq!(outcome, SearchOutcome::Found(3));
        assert_eq!(ctx.predecessors().get(&3), Some(&2));
        assert_eq!(ctx.predecessors().get(&2), Some(&1));
        assert_eq!(ctx.predecessors().get(&1), Some(&0));
        assert!(ctx.predecessors().get(&0).is_none());
    }

    #[test]
    fn unvisited_scores_are_infinite() {
        let mut ctx: SearchContext<usize, i32> = SearchContext::new();
        let outcome = ctx.astar(
            &mut (),
            &3,
            &0,
            |_, n| edges(n),
            |_, _| 0,
            |_, _| ControlFlow::Continue(()),
        );
        assert_eq!(outcome, SearchOutcome::Exhausted);
        assert_eq!(ctx.g_score(&3), 0);
        assert_eq!(ctx.g_score(&0), i32::MAX);
        assert_eq!(ctx.f_score(&1), i32::MAX);
    }

    #[test]
    fn cancel_before_first_pop() {
        let mut ctx: SearchContext<usize, i32> = SearchContext::new();
        let mut expanded = 0;
        let outcome = ctx.astar(
            &mut expanded,
            &0,
            &3,
            |_, n| edges(n),
            |_, _| 0,
            |expanded, event| match event {
                SearchEvent::Poll => ControlFlow::Break(()),
                _ => {
                    *expanded += 1;
                    ControlFlow::Continue(())
                }
            },
        );
        assert_eq!(outcome, SearchOutcome::Cancelled);
        assert_eq!(expanded, 0);
        assert!(ctx.predecessors().is_empty());
    }

    #[test]
    fn start_equals_target() {
        let mut ctx: SearchContext<usize, i32> = SearchContext::new();
        let outcome = ctx.astar(
            &mut (),
            &2,
            &2,
            |_, n| edges(n),
            |_, _| 0,
            |_, _| ControlFlow::Continue(()),
        );
        assert_eq!(outcome, SearchOutcome::Found(0));
        assert!(ctx.take_predecessors().is_empty());
    }
}
