//! The batch orchestrator.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use corridor_core::{CostGrid, ScalarField};
use corridor_lcd::{BenefitParams, LcdField, LcdSolver, SurfaceCache, disk_minimum, evaluate};
use corridor_raster::write_grid;
use corridor_store::{BenefitResult, FeaturePair, PairStore};
use log::{debug, info, warn};

use crate::config::BatchConfig;

/// Nodata marker used for exported debug grids.
const DEBUG_NODATA: f64 = -9999.0;

/// Tallies of one batch run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pairs evaluated and persisted.
    pub processed: usize,
    /// Pairs skipped before evaluation (endpoint off-grid or blocked).
    pub skipped: usize,
    /// Pairs whose result failed to persist.
    pub row_errors: usize,
    /// Solver invocations actually performed (cache misses).
    pub lcd_solves: u64,
}

enum Outcome {
    Processed,
    Skipped,
    RowFailed,
}

/// Process every feature pair of `store` against `grid`.
///
/// Pairs arrive ordered by first endpoint, so consecutive pairs tend to
/// hit the surface cache. Each pair persists exactly one result; a row
/// that fails to persist is logged and the run continues. With
/// `config.jobs > 1` the pair list is split into contiguous chunks
/// across scoped worker threads, all sharing the coalescing cache.
pub fn run_batch<S: PairStore + Sync>(
    config: &BatchConfig,
    grid: &CostGrid,
    store: &S,
) -> RunSummary {
    let pairs = store.pairs();
    let cache = SurfaceCache::new(config.cache_capacity);
    let params = BenefitParams {
        radius: config.radius,
        min_improvement: config.min_improvement,
    };

    if let Some(dir) = &config.debug_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            warn!("cannot create debug directory {}: {e}", dir.display());
        }
    }

    info!(
        "processing {} feature pairs (radius {}, {} worker{})",
        pairs.len(),
        config.radius,
        config.jobs,
        if config.jobs == 1 { "" } else { "s" },
    );

    let processed = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);
    let row_errors = AtomicUsize::new(0);
    let tally = |outcome: Outcome| {
        let counter = match outcome {
            Outcome::Processed => &processed,
            Outcome::Skipped => &skipped,
            Outcome::RowFailed => &row_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    };

    let jobs = config.jobs.min(pairs.len()).max(1);
    if jobs == 1 {
        let mut solver = LcdSolver::new(grid.bounds());
        for pair in &pairs {
            tally(process_pair(config, grid, &params, &cache, &mut solver, store, pair));
        }
    } else {
        let chunk = pairs.len().div_ceil(jobs);
        let cache = &cache;
        let tally = &tally;
        std::thread::scope(|s| {
            for block in pairs.chunks(chunk) {
                s.spawn(move || {
                    let mut solver = LcdSolver::new(grid.bounds());
                    for pair in block {
                        tally(process_pair(config, grid, &params, cache, &mut solver, store, pair));
                    }
                });
            }
        });
    }

    let summary = RunSummary {
        processed: processed.into_inner(),
        skipped: skipped.into_inner(),
        row_errors: row_errors.into_inner(),
        lcd_solves: cache.stats().misses,
    };
    info!(
        "batch complete: {} processed, {} skipped, {} row errors, {} lcd solves",
        summary.processed, summary.skipped, summary.row_errors, summary.lcd_solves,
    );
    summary
}

fn process_pair<S: PairStore>(
    config: &BatchConfig,
    grid: &CostGrid,
    params: &BenefitParams,
    cache: &SurfaceCache,
    solver: &mut LcdSolver,
    store: &S,
    pair: &FeaturePair,
) -> Outcome {
    let a = grid.to_cell(pair.ax, pair.ay);
    let b = grid.to_cell(pair.bx, pair.by);

    if !grid.bounds().contains(a) || !grid.bounds().contains(b) {
        warn!("pair {}: endpoint outside the grid extent, skipping", pair.id);
        return Outcome::Skipped;
    }
    if config.skip_blocked
        && (grid.reachable_cost(a).is_none() || grid.reachable_cost(b).is_none())
    {
        debug!("pair {}: endpoint on a blocked cell, skipping", pair.id);
        return Outcome::Skipped;
    }

    let surface_a = cache.get_or_solve(a, || solver.solve(grid, &[a]));
    let surface_b = cache.get_or_solve(b, || solver.solve(grid, &[b]));
    let filtered_a = disk_minimum(surface_a.field(), config.radius);
    let filtered_b = disk_minimum(surface_b.field(), config.radius);

    let score = evaluate(
        surface_a.field(),
        surface_b.field(),
        &filtered_a,
        &filtered_b,
        params,
    );
    if score.is_none() {
        debug!("pair {}: endpoints share no reachable cell", pair.id);
    }

    let result = BenefitResult {
        id: pair.id.clone(),
        existing: score.map(|s| s.existing),
        improved: score.map(|s| s.improved),
        benefit: score.map(|s| s.benefit),
    };
    let outcome = match store.update(&result) {
        Ok(()) => Outcome::Processed,
        Err(e) => {
            warn!("pair {}: {e}", pair.id);
            Outcome::RowFailed
        }
    };

    // Diagnostics only; export failures never affect the run.
    if let Some(dir) = &config.debug_dir {
        export_debug(dir, &pair.id, grid, &surface_a, &surface_b, &filtered_a, &filtered_b);
    }
    outcome
}

fn export_debug(
    dir: &Path,
    id: &str,
    grid: &CostGrid,
    a: &LcdField,
    b: &LcdField,
    filtered_a: &ScalarField,
    filtered_b: &ScalarField,
) {
    let grids: [(&str, &ScalarField); 4] = [
        ("lcd-a", a.field()),
        ("lcd-b", b.field()),
        ("min-a", filtered_a),
        ("min-b", filtered_b),
    ];
    for (tag, field) in grids {
        let path = dir.join(format!("{id}-{tag}.asc"));
        if let Err(e) = write_grid(&path, field, grid.transform(), DEBUG_NODATA) {
            warn!("pair {id}: failed to export {}: {e}", path.display());
        }
    }
}
