//! Crossing-benefit analysis for terrain cost barriers.
//!
//! Ties the workspace together: a validated run configuration
//! ([`config::BatchConfig`]) and the batch orchestrator
//! ([`runner::run_batch`]) that walks an ordered sequence of feature
//! pairs, solves and caches accumulated-cost surfaces per endpoint,
//! scores the crossing benefit and writes one result per pair back to
//! the store.

pub mod config;
pub mod runner;
