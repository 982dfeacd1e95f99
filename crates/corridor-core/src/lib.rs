//! Core types for least-cost corridor analysis.
//!
//! This crate holds the shared vocabulary of the workspace:
//!
//! - [`Point`] and [`Range`] — integer cell coordinates and grid rectangles
//! - [`ScalarField`] — a dense row-major grid of `f64` values
//! - [`CostGrid`] — a cost surface with an explicit [`Reachability`]
//!   predicate and a [`GridTransform`] mapping world coordinates to cells
//!
//! Everything here is immutable after construction and cheap to share
//! across threads. Out-of-bounds access is a contract violation and
//! panics; use the `get` variants where out-of-range input is expected.

mod field;
mod geom;
mod grid;

pub use field::ScalarField;
pub use geom::{Point, Range};
pub use grid::{CostGrid, GridTransform, Reachability};
