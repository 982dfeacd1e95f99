use std::path::PathBuf;

use anyhow::{Context, ensure};
use clap::{Args, Parser, Subcommand};
use corridor_core::{CostGrid, Reachability};
use corridor_lcd::{
    BenefitParams, LcdSolver, benefit_field, disk_minimum, existing_min_cost, improved_min_cost,
};
use corridor_raster::{read_grid, write_grid};
use corridor_store::JsonlStore;
use tcbarriers::config::BatchConfig;
use tcbarriers::runner::run_batch;

/// Nodata marker for rasters written by the CLI.
const NODATA: f64 = -9999.0;

#[derive(Parser)]
#[command(name = "tcbarriers")]
#[command(about = "Least-cost corridor benefit analysis", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a least-cost-distance surface from a start coordinate
    Surface(SurfaceArgs),

    /// Score per-cell crossing benefit from two precomputed surfaces
    Benefit(BenefitArgs),

    /// Evaluate crossing benefit for a batch of feature pairs
    Batch(BatchArgs),
}

#[derive(Args)]
struct SurfaceArgs {
    /// Input cost raster
    #[arg(short, long)]
    input: PathBuf,

    /// X coordinate of the start point, in the raster's reference system
    #[arg(short)]
    x: f64,

    /// Y coordinate of the start point
    #[arg(short)]
    y: f64,

    /// Path to save the accumulated-cost raster to
    #[arg(short, long)]
    output: PathBuf,

    /// Treat cells with cost at or above this value as barriers
    #[arg(long)]
    barrier: Option<f64>,
}

#[derive(Args)]
struct BenefitArgs {
    /// First accumulated-cost raster
    #[arg(long)]
    c1: PathBuf,

    /// Second accumulated-cost raster
    #[arg(long)]
    c2: PathBuf,

    /// Crossing search radius, as a number of cells
    #[arg(short, long)]
    radius: u32,

    /// Minimum improvement threshold
    #[arg(short, long)]
    improve: Option<f64>,

    /// Path to save the benefit raster to
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args)]
struct BatchArgs {
    /// Input cost raster
    #[arg(short, long)]
    input: PathBuf,

    /// Feature-pair store, one JSON record per line
    #[arg(short, long)]
    pairs: PathBuf,

    /// Crossing search radius, as a number of cells
    #[arg(short, long)]
    radius: u32,

    /// Minimum improvement threshold
    #[arg(long)]
    improve: Option<f64>,

    /// Treat cells with cost at or above this value as barriers
    #[arg(long)]
    barrier: Option<f64>,

    /// Only process pairs whose id contains this substring
    #[arg(long)]
    filter: Option<String>,

    /// Skip pairs with an endpoint on a blocked cell
    #[arg(long)]
    skip_blocked: bool,

    /// Directory for per-pair debug grids
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Number of accumulated-cost surfaces kept cached
    #[arg(long, default_value_t = 2)]
    cache_capacity: usize,

    /// Worker threads
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match cli.command {
        Commands::Surface(args) => cmd_surface(args),
        Commands::Benefit(args) => cmd_benefit(args),
        Commands::Batch(args) => cmd_batch(args),
    }
}

fn cmd_surface(args: SurfaceArgs) -> anyhow::Result<()> {
    let asc = read_grid(&args.input)
        .with_context(|| format!("reading cost raster {}", args.input.display()))?;
    let reach = Reachability {
        barrier: args.barrier,
        nodata: asc.nodata,
    };
    let grid = CostGrid::new(asc.field, reach, asc.transform);

    let start = grid.to_cell(args.x, args.y);
    ensure!(
        grid.bounds().contains(start),
        "start coordinate ({}, {}) lies outside the raster extent",
        args.x,
        args.y,
    );

    let mut solver = LcdSolver::new(grid.bounds());
    let lcd = solver.solve(&grid, &[start]);
    write_grid(&args.output, lcd.field(), grid.transform(), NODATA)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}

fn cmd_benefit(args: BenefitArgs) -> anyhow::Result<()> {
    ensure!(args.radius > 0, "radius must be a positive number of cells");
    if let Some(t) = args.improve {
        ensure!(t >= 0.0, "improvement threshold must be non-negative");
    }

    let c1 = read_grid(&args.c1)
        .with_context(|| format!("reading cost surface {}", args.c1.display()))?;
    let c2 = read_grid(&args.c2)
        .with_context(|| format!("reading cost surface {}", args.c2.display()))?;
    let a = c1.field_masking_nodata();
    let b = c2.field_masking_nodata();
    ensure!(
        a.bounds() == b.bounds(),
        "input surfaces have different dimensions ({}x{} vs {}x{})",
        a.width(),
        a.height(),
        b.width(),
        b.height(),
    );

    let filtered_a = disk_minimum(&a, args.radius);
    let filtered_b = disk_minimum(&b, args.radius);
    println!("minimum existing cost: {}", existing_min_cost(&a, &b));
    println!(
        "minimum improved cost: {}",
        improved_min_cost(&filtered_a, &filtered_b, args.radius),
    );

    let params = BenefitParams {
        radius: args.radius,
        min_improvement: args.improve,
    };
    let out = benefit_field(&a, &b, &filtered_a, &filtered_b, &params);
    write_grid(&args.output, &out, &c1.transform, NODATA)
        .with_context(|| format!("writing {}", args.output.display()))?;
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let config = BatchConfig {
        cost_path: args.input,
        pairs_path: args.pairs,
        radius: args.radius,
        min_improvement: args.improve,
        barrier: args.barrier,
        filter: args.filter,
        skip_blocked: args.skip_blocked,
        debug_dir: args.debug_dir,
        cache_capacity: args.cache_capacity,
        jobs: args.jobs,
    };
    config.validate()?;

    let asc = read_grid(&config.cost_path)
        .with_context(|| format!("reading cost raster {}", config.cost_path.display()))?;
    let reach = Reachability {
        barrier: config.barrier,
        nodata: asc.nodata,
    };
    let grid = CostGrid::new(asc.field, reach, asc.transform);

    let mut store = JsonlStore::open(&config.pairs_path)
        .with_context(|| format!("opening pair store {}", config.pairs_path.display()))?;
    if let Some(needle) = config.filter.clone() {
        store = store.with_filter(move |p| p.id.contains(&needle));
    }

    let summary = run_batch(&config, &grid, &store);
    println!(
        "{} pairs processed, {} skipped, {} row errors",
        summary.processed, summary.skipped, summary.row_errors,
    );
    Ok(())
}
