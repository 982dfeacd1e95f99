//! Cost surfaces: [`CostGrid`], [`Reachability`] and [`GridTransform`].

use crate::{Point, Range, ScalarField};

// ---------------------------------------------------------------------------
// Reachability
// ---------------------------------------------------------------------------

/// Predicate deciding which cell values are traversable.
///
/// A cell is unreachable when its value is non-finite, negative, equal to
/// the nodata marker, or at or above the barrier threshold. Both limits
/// are explicit configuration rather than baked-in magic values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Reachability {
    /// Values at or above this cost are treated as impassable barriers.
    pub barrier: Option<f64>,
    /// Raster nodata marker; cells holding it carry no cost information.
    pub nodata: Option<f64>,
}

impl Reachability {
    /// Every finite non-negative cost is traversable.
    pub const OPEN: Self = Self {
        barrier: None,
        nodata: None,
    };

    /// Whether a cell with this value may be entered or left.
    #[inline]
    pub fn is_reachable(&self, value: f64) -> bool {
        if !value.is_finite() || value < 0.0 {
            return false;
        }
        if self.nodata.is_some_and(|nd| value == nd) {
            return false;
        }
        if self.barrier.is_some_and(|b| value >= b) {
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// GridTransform
// ---------------------------------------------------------------------------

/// Affine mapping between world coordinates and cell indices.
///
/// The origin is the world position of the top-left grid corner;
/// `cell_height` is negative for the usual north-up rasters, so that row
/// indices grow southward.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GridTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl GridTransform {
    /// Map a world coordinate to the cell containing it.
    ///
    /// The result may lie outside the grid; callers decide how to treat
    /// coordinates beyond the extent.
    #[inline]
    pub fn world_to_cell(&self, x: f64, y: f64) -> Point {
        let col = ((x - self.origin_x) / self.cell_width).floor() as i32;
        let row = ((y - self.origin_y) / self.cell_height).floor() as i32;
        Point::new(col, row)
    }

    /// World coordinate of the top-left corner of cell `p`.
    #[inline]
    pub fn cell_to_world(&self, p: Point) -> (f64, f64) {
        (
            self.origin_x + p.x as f64 * self.cell_width,
            self.origin_y + p.y as f64 * self.cell_height,
        )
    }
}

// ---------------------------------------------------------------------------
// CostGrid
// ---------------------------------------------------------------------------

/// An immutable cost surface: per-cell traversal costs, a reachability
/// predicate and the transform that maps query coordinates to cells.
#[derive(Clone, Debug)]
pub struct CostGrid {
    field: ScalarField,
    reach: Reachability,
    transform: GridTransform,
}

impl CostGrid {
    /// Build a grid from a cost field, a reachability predicate and the
    /// world transform of the originating raster.
    pub fn new(field: ScalarField, reach: Reachability, transform: GridTransform) -> Self {
        Self {
            field,
            reach,
            transform,
        }
    }

    /// The grid rectangle.
    #[inline]
    pub fn bounds(&self) -> Range {
        self.field.bounds()
    }

    /// The underlying cost field.
    #[inline]
    pub fn field(&self) -> &ScalarField {
        &self.field
    }

    /// The reachability predicate in effect.
    #[inline]
    pub fn reachability(&self) -> Reachability {
        self.reach
    }

    /// The world transform of the originating raster.
    #[inline]
    pub fn transform(&self) -> &GridTransform {
        &self.transform
    }

    /// Raw cost of the cell at `p`.
    ///
    /// Panics if `p` is outside the grid.
    #[inline]
    pub fn cost(&self, p: Point) -> f64 {
        self.field.value(p)
    }

    /// Raw cost of the cell at `p`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, p: Point) -> Option<f64> {
        self.field.get(p)
    }

    /// Traversal cost of the cell at `p`, or `None` when the cell is out
    /// of bounds or unreachable under the grid's predicate.
    #[inline]
    pub fn reachable_cost(&self, p: Point) -> Option<f64> {
        let v = self.field.get(p)?;
        self.reach.is_reachable(v).then_some(v)
    }

    /// Map a world coordinate to the cell containing it.
    #[inline]
    pub fn to_cell(&self, world_x: f64, world_y: f64) -> Point {
        self.transform.world_to_cell(world_x, world_y)
    }
}
