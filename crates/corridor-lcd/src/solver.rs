use std::collections::BinaryHeap;

use corridor_core::{Point, Range, ScalarField};

use crate::traits::CostSurface;

/// Sentinel accumulated cost for cells no source can reach.
pub const UNREACHABLE: f64 = f64::INFINITY;

/// Cost of one orthogonal step between two adjacent cells.
///
/// The rule is the arithmetic mean of the two endpoint cell costs. It is
/// symmetric, so crossing from A to B always costs the same as crossing
/// from B to A, and a uniform unit-cost grid accumulates plain Manhattan
/// distances.
#[inline]
fn step_cost(a: f64, b: f64) -> f64 {
    0.5 * (a + b)
}

// ---------------------------------------------------------------------------
// Internal node bookkeeping
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct Node {
    g: f64,
    generation: u32,
    open: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            g: 0.0,
            generation: 0,
            open: false,
        }
    }
}

/// Reference into the node array, ordered by `g` for use in `BinaryHeap`.
#[derive(Clone, Copy)]
struct NodeRef {
    idx: usize,
    g: f64,
}

impl Ord for NodeRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse so BinaryHeap (max-heap) pops the smallest g first.
        // g is never NaN, so total_cmp orders it like a plain <=.
        other
            .g
            .total_cmp(&self.g)
            .then_with(|| other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for NodeRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for NodeRef {}

// ---------------------------------------------------------------------------
// LcdField
// ---------------------------------------------------------------------------

/// A least-cost-distance surface: per-cell accumulated cost from the
/// nearest of its source cells.
///
/// Source cells hold exactly 0; cells no source can reach hold
/// [`UNREACHABLE`].
#[derive(Clone, Debug)]
pub struct LcdField {
    field: ScalarField,
    sources: Vec<Point>,
}

impl LcdField {
    /// The accumulated-cost field.
    #[inline]
    pub fn field(&self) -> &ScalarField {
        &self.field
    }

    /// The source cells this surface was solved from.
    #[inline]
    pub fn sources(&self) -> &[Point] {
        &self.sources
    }

    /// Accumulated cost at `p`.
    ///
    /// Panics if `p` is outside the surface bounds.
    #[inline]
    pub fn cost(&self, p: Point) -> f64 {
        self.field.value(p)
    }

    /// Whether any source reaches `p`.
    #[inline]
    pub fn is_reached(&self, p: Point) -> bool {
        self.field.get(p).is_some_and(|v| v < UNREACHABLE)
    }
}

// ---------------------------------------------------------------------------
// LcdSolver
// ---------------------------------------------------------------------------

/// Multi-source least-cost-distance solver over 4-connected cells.
///
/// The solver owns reusable node scratch so that repeated solves over the
/// same grid rectangle only allocate the output surface. Expansion is a
/// label-setting shortest-path search (grid Dijkstra) with a binary-heap
/// frontier ordered by tentative accumulated cost; diagonal moves are
/// excluded. Barrier and nodata cells are never entered or left.
pub struct LcdSolver {
    bounds: Range,
    width: usize,
    nodes: Vec<Node>,
    generation: u32,
    nbuf: Vec<Point>,
}

impl LcdSolver {
    /// Create a solver for the given grid rectangle.
    ///
    /// Panics if `bounds` is empty.
    pub fn new(bounds: Range) -> Self {
        assert!(!bounds.is_empty(), "solver bounds must be non-empty");
        Self {
            bounds,
            width: bounds.width() as usize,
            nodes: vec![Node::default(); bounds.len()],
            generation: 0,
            nbuf: Vec::with_capacity(4),
        }
    }

    /// The grid rectangle being solved over.
    #[inline]
    pub fn bounds(&self) -> Range {
        self.bounds
    }

    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if !self.bounds.contains(p) {
            return None;
        }
        let x = (p.x - self.bounds.min.x) as usize;
        let y = (p.y - self.bounds.min.y) as usize;
        Some(y * self.width + x)
    }

    #[inline]
    fn point(&self, idx: usize) -> Point {
        let x = (idx % self.width) as i32 + self.bounds.min.x;
        let y = (idx / self.width) as i32 + self.bounds.min.y;
        Point::new(x, y)
    }

    /// Compute the accumulated cost from `sources` to every reachable cell.
    ///
    /// Every source is seeded at cost 0; with several sources each cell
    /// ends up with the cost from its nearest one. A source sitting on an
    /// unreachable cell stays at 0 but never expands outward. Unreachable
    /// destinations are represented as [`UNREACHABLE`], never signalled.
    ///
    /// Panics if `sources` is empty, a source lies outside the grid, or
    /// the surface bounds do not match the solver's.
    pub fn solve<S: CostSurface>(&mut self, surface: &S, sources: &[Point]) -> LcdField {
        assert!(!sources.is_empty(), "at least one source cell is required");
        assert_eq!(
            surface.bounds(),
            self.bounds,
            "cost surface bounds do not match solver bounds",
        );

        self.generation = self.generation.wrapping_add(1);
        let cur_gen = self.generation;

        let mut map = vec![UNREACHABLE; self.bounds.len()];
        let mut open: BinaryHeap<NodeRef> = BinaryHeap::new();

        // Seed sources.
        for &src in sources {
            let si = match self.idx(src) {
                Some(i) => i,
                None => panic!("source cell {src} is outside the grid {}", self.bounds),
            };
            let n = &mut self.nodes[si];
            n.g = 0.0;
            n.generation = cur_gen;
            n.open = true;
            map[si] = 0.0;
            open.push(NodeRef { idx: si, g: 0.0 });
        }

        let bounds = self.bounds;
        let mut nbuf = std::mem::take(&mut self.nbuf);

        while let Some(current) = open.pop() {
            let ci = current.idx;
            let cn = &self.nodes[ci];
            if cn.generation != cur_gen || !cn.open {
                continue;
            }
            let current_g = cn.g;
            self.nodes[ci].open = false;

            let cp = self.point(ci);
            // A source seeded on a barrier cell settles at 0 but expands
            // nowhere.
            let Some(cell_cost) = surface.traversal_cost(cp) else {
                continue;
            };

            nbuf.clear();
            nbuf.extend(cp.neighbors_4().into_iter().filter(|&n| bounds.contains(n)));

            for &np in nbuf.iter() {
                let Some(ni) = self.idx(np) else {
                    continue;
                };
                let Some(neighbor_cost) = surface.traversal_cost(np) else {
                    continue;
                };
                let tentative = current_g + step_cost(cell_cost, neighbor_cost);

                let n = &mut self.nodes[ni];
                if n.generation == cur_gen {
                    if tentative >= n.g {
                        continue;
                    }
                } else {
                    n.generation = cur_gen;
                }

                n.g = tentative;
                n.open = true;
                map[ni] = tentative;
                open.push(NodeRef {
                    idx: ni,
                    g: tentative,
                });
            }
        }

        self.nbuf = nbuf;
        LcdField {
            field: ScalarField::from_values(self.bounds, map),
            sources: sources.to_vec(),
        }
    }
}
