//! Least-cost-distance analysis over weighted grids.
//!
//! This crate implements the algorithmic core of corridor benefit
//! analysis:
//!
//! - **LCD solver** ([`LcdSolver`]) — multi-source accumulated-cost
//!   surfaces over 4-connected cells
//! - **Neighborhood minimum filter** ([`disk_minimum`]) — disk-footprint
//!   sliding minimum with edge clamping
//! - **Benefit evaluator** ([`evaluate`], [`benefit_field`]) — combines
//!   two LCD surfaces and their filtered counterparts into a crossing
//!   benefit score
//! - **Surface cache** ([`SurfaceCache`]) — bounded, coalescing cache of
//!   solved surfaces keyed by source cell
//!
//! The solver operates through the [`CostSurface`] trait so that tests
//! and alternative grid representations can plug in without depending on
//! raster plumbing.

mod benefit;
mod cache;
mod filter;
mod solver;
mod traits;

pub use benefit::{
    Benefit, BenefitParams, benefit_field, evaluate, existing_min_cost, improved_min_cost,
};
pub use cache::{CacheStats, SurfaceCache};
pub use filter::disk_minimum;
pub use solver::{LcdField, LcdSolver, UNREACHABLE};
pub use traits::CostSurface;
