use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use corridor_core::Point;
use log::debug;
use lru::LruCache;

use crate::solver::LcdField;

/// Hit/miss counters of a [`SurfaceCache`].
///
/// `misses` equals the number of solver invocations the cache performed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

type Slot = Arc<OnceLock<Arc<LcdField>>>;

/// Bounded, coalescing cache of solved accumulated-cost surfaces keyed by
/// source cell.
///
/// Requests for a cached source return the shared surface without
/// re-solving. Concurrent requests for the same uncached source coalesce:
/// only the first runs the solve closure, the rest block on the same slot
/// and share its result. Least-recently-used entries are evicted once
/// capacity is reached, bounding memory to `capacity` live surfaces plus
/// whatever requesters still hold.
pub struct SurfaceCache {
    slots: Mutex<LruCache<Point, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SurfaceCache {
    /// Create a cache holding at most `capacity` surfaces.
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        let Some(capacity) = NonZeroUsize::new(capacity) else {
            panic!("surface cache capacity must be at least 1");
        };
        Self {
            slots: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the surface for `source`, solving it at most once.
    ///
    /// The closure runs only when `source` has no live cache entry; other
    /// requesters for the same source wait for that single result. An
    /// entry evicted while still being solved stays valid for the
    /// requesters already holding its slot.
    pub fn get_or_solve(&self, source: Point, solve: impl FnOnce() -> LcdField) -> Arc<LcdField> {
        let (slot, fresh) = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            match slots.get(&source) {
                Some(slot) => (Arc::clone(slot), false),
                None => {
                    let slot: Slot = Arc::new(OnceLock::new());
                    slots.put(source, Arc::clone(&slot));
                    (slot, true)
                }
            }
        };
        if fresh {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("surface cache miss for source {source}");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        Arc::clone(slot.get_or_init(|| Arc::new(solve())))
    }

    /// Number of surfaces currently cached.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::LcdSolver;
    use corridor_core::{CostGrid, GridTransform, Range, Reachability, ScalarField};
    use std::sync::atomic::AtomicUsize;

    fn test_grid() -> CostGrid {
        CostGrid::new(
            ScalarField::new_filled(Range::new(0, 0, 6, 6), 1.0),
            Reachability::OPEN,
            GridTransform {
                origin_x: 0.0,
                origin_y: 0.0,
                cell_width: 1.0,
                cell_height: -1.0,
            },
        )
    }

    #[test]
    fn repeated_requests_solve_once() {
        let grid = test_grid();
        let cache = SurfaceCache::new(2);
        let mut solver = LcdSolver::new(grid.bounds());
        let source = Point::new(1, 1);

        let solves = AtomicUsize::new(0);
        for _ in 0..3 {
            let surface = cache.get_or_solve(source, || {
                solves.fetch_add(1, Ordering::Relaxed);
                solver.solve(&grid, &[source])
            });
            assert_eq!(surface.cost(source), 0.0);
        }
        assert_eq!(solves.load(Ordering::Relaxed), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 1 });
    }

    #[test]
    fn distinct_sources_solve_separately() {
        let grid = test_grid();
        let cache = SurfaceCache::new(2);
        let mut solver = LcdSolver::new(grid.bounds());

        let a = cache.get_or_solve(Point::new(0, 0), || solver.solve(&grid, &[Point::new(0, 0)]));
        let b = cache.get_or_solve(Point::new(5, 5), || solver.solve(&grid, &[Point::new(5, 5)]));
        assert_eq!(a.cost(Point::new(5, 5)), 10.0);
        assert_eq!(b.cost(Point::new(0, 0)), 10.0);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn capacity_evicts_least_recently_used() {
        let grid = test_grid();
        let cache = SurfaceCache::new(1);
        let mut solver = LcdSolver::new(grid.bounds());
        let first = Point::new(0, 0);
        let second = Point::new(5, 5);

        cache.get_or_solve(first, || solver.solve(&grid, &[first]));
        cache.get_or_solve(second, || solver.solve(&grid, &[second]));
        assert_eq!(cache.len(), 1);
        // The first source was evicted, so it solves again.
        cache.get_or_solve(first, || solver.solve(&grid, &[first]));
        assert_eq!(cache.stats().misses, 3);
    }

    #[test]
    fn concurrent_requests_coalesce_into_one_solve() {
        let grid = test_grid();
        let cache = SurfaceCache::new(2);
        let source = Point::new(2, 3);
        let solves = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let mut solver = LcdSolver::new(grid.bounds());
                    let surface = cache.get_or_solve(source, || {
                        solves.fetch_add(1, Ordering::Relaxed);
                        solver.solve(&grid, &[source])
                    });
                    assert_eq!(surface.cost(source), 0.0);
                });
            }
        });

        assert_eq!(solves.load(Ordering::Relaxed), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 8);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn zero_capacity_panics() {
        SurfaceCache::new(0);
    }
}
