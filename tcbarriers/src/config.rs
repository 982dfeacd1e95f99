//! Batch run configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid configuration, rejected before any I/O happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("radius must be a positive number of cells")]
    ZeroRadius,
    #[error("improvement threshold must be non-negative, got {0}")]
    NegativeThreshold(f64),
    #[error("barrier cost must be non-negative, got {0}")]
    NegativeBarrier(f64),
    #[error("cache capacity must be at least 1")]
    ZeroCacheCapacity,
    #[error("jobs must be at least 1")]
    ZeroJobs,
}

/// Everything a batch run needs, assembled once at startup and immutable
/// afterwards.
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Cost raster path.
    pub cost_path: PathBuf,
    /// Feature-pair store path.
    pub pairs_path: PathBuf,
    /// Crossing search radius in cells.
    pub radius: u32,
    /// Improvements below this threshold count as no benefit.
    pub min_improvement: Option<f64>,
    /// Cells with cost at or above this value are impassable.
    pub barrier: Option<f64>,
    /// Only process pairs whose id contains this substring.
    pub filter: Option<String>,
    /// Skip pairs with an endpoint on a blocked cell instead of
    /// processing them to a null result.
    pub skip_blocked: bool,
    /// Directory receiving per-pair debug grids, if any.
    pub debug_dir: Option<PathBuf>,
    /// Number of accumulated-cost surfaces kept live.
    pub cache_capacity: usize,
    /// Worker threads.
    pub jobs: usize,
}

impl BatchConfig {
    /// A minimal configuration with the defaults of the CLI surface.
    pub fn new(cost_path: PathBuf, pairs_path: PathBuf, radius: u32) -> Self {
        Self {
            cost_path,
            pairs_path,
            radius,
            min_improvement: None,
            barrier: None,
            filter: None,
            skip_blocked: false,
            debug_dir: None,
            cache_capacity: 2,
            jobs: 1,
        }
    }

    /// Check every semantic constraint once, before the run touches any
    /// resource.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius == 0 {
            return Err(ConfigError::ZeroRadius);
        }
        if let Some(t) = self.min_improvement {
            if t < 0.0 {
                return Err(ConfigError::NegativeThreshold(t));
            }
        }
        if let Some(b) = self.barrier {
            if b < 0.0 {
                return Err(ConfigError::NegativeBarrier(b));
            }
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }
        if self.jobs == 0 {
            return Err(ConfigError::ZeroJobs);
        }
        Ok(())
    }
}
