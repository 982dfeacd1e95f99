use corridor_core::{CostGrid, Point, Range};

/// A read-only cost surface the solver can expand over.
pub trait CostSurface {
    /// The grid rectangle of the surface.
    fn bounds(&self) -> Range;

    /// Traversal cost of the cell at `p`, or `None` when the cell is a
    /// barrier or nodata and must never be entered or left. Costs must be
    /// finite and non-negative.
    fn traversal_cost(&self, p: Point) -> Option<f64>;
}

impl CostSurface for CostGrid {
    fn bounds(&self) -> Range {
        CostGrid::bounds(self)
    }

    fn traversal_cost(&self, p: Point) -> Option<f64> {
        self.reachable_cost(p)
    }
}
