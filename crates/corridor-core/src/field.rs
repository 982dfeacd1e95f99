//! A dense row-major grid of `f64` values.

use crate::{Point, Range};

/// A dense 2D grid of `f64` values over a [`Range`].
///
/// `ScalarField` is the common representation for cost data, accumulated
/// cost surfaces, filtered surfaces and benefit grids. Values are stored
/// row-major; lookups outside the bounds are contract violations and panic.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    bounds: Range,
    width: usize,
    values: Vec<f64>,
}

impl ScalarField {
    /// Create a field over `bounds` with every cell set to `fill`.
    ///
    /// Panics if `bounds` is empty.
    pub fn new_filled(bounds: Range, fill: f64) -> Self {
        assert!(!bounds.is_empty(), "scalar field bounds must be non-empty");
        Self {
            bounds,
            width: bounds.width() as usize,
            values: vec![fill; bounds.len()],
        }
    }

    /// Create a field over `bounds` from row-major `values`.
    ///
    /// Panics if `bounds` is empty or `values.len()` does not match.
    pub fn from_values(bounds: Range, values: Vec<f64>) -> Self {
        assert!(!bounds.is_empty(), "scalar field bounds must be non-empty");
        assert_eq!(
            values.len(),
            bounds.len(),
            "value count does not match field dimensions {}x{}",
            bounds.width(),
            bounds.height(),
        );
        Self {
            bounds,
            width: bounds.width() as usize,
            values,
        }
    }

    /// The grid rectangle covered by this field.
    #[inline]
    pub fn bounds(&self) -> Range {
        self.bounds
    }

    /// Width in cells.
    #[inline]
    pub fn width(&self) -> i32 {
        self.bounds.width()
    }

    /// Height in cells.
    #[inline]
    pub fn height(&self) -> i32 {
        self.bounds.height()
    }

    /// Convert a point to a flat index. Returns `None` if out of bounds.
    #[inline]
    pub(crate) fn idx(&self, p: Point) -> Option<usize> {
        if !self.bounds.contains(p) {
            return None;
        }
        let x = (p.x - self.bounds.min.x) as usize;
        let y = (p.y - self.bounds.min.y) as usize;
        Some(y * self.width + x)
    }

    /// Value at `p`.
    ///
    /// Panics if `p` is outside the field bounds.
    #[inline]
    pub fn value(&self, p: Point) -> f64 {
        match self.idx(p) {
            Some(i) => self.values[i],
            None => panic!("cell {p} is outside the field bounds {}", self.bounds),
        }
    }

    /// Value at `p`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, p: Point) -> Option<f64> {
        self.idx(p).map(|i| self.values[i])
    }

    /// Set the value at `p`.
    ///
    /// Panics if `p` is outside the field bounds.
    #[inline]
    pub fn set(&mut self, p: Point, v: f64) {
        match self.idx(p) {
            Some(i) => self.values[i] = v,
            None => panic!("cell {p} is outside the field bounds {}", self.bounds),
        }
    }

    /// The raw row-major values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Row-major iterator over `(point, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Point, f64)> + '_ {
        self.bounds.iter().zip(self.values.iter().copied())
    }

    /// Minimum value over all cells, ignoring NaN.
    ///
    /// Returns positive infinity if every cell is NaN.
    pub fn min_value(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(f64::INFINITY, f64::min)
    }

    /// Combine two same-shaped fields cell-by-cell.
    ///
    /// Panics if the bounds differ.
    pub fn zip_with(&self, other: &ScalarField, mut f: impl FnMut(f64, f64) -> f64) -> ScalarField {
        assert_eq!(
            self.bounds, other.bounds,
            "cannot combine fields with different bounds",
        );
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        ScalarField {
            bounds: self.bounds,
            width: self.width,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_field_reads_back() {
        let f = ScalarField::new_filled(Range::new(0, 0, 4, 3), 2.5);
        assert_eq!(f.width(), 4);
        assert_eq!(f.height(), 3);
        assert_eq!(f.value(Point::new(3, 2)), 2.5);
        assert_eq!(f.get(Point::new(4, 2)), None);
    }

    #[test]
    fn from_values_row_major() {
        let f = ScalarField::from_values(Range::new(0, 0, 2, 2), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(f.value(Point::new(0, 0)), 1.0);
        assert_eq!(f.value(Point::new(1, 0)), 2.0);
        assert_eq!(f.value(Point::new(0, 1)), 3.0);
        assert_eq!(f.value(Point::new(1, 1)), 4.0);
    }

    #[test]
    #[should_panic(expected = "value count does not match")]
    fn from_values_length_mismatch_panics() {
        ScalarField::from_values(Range::new(0, 0, 2, 2), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    #[should_panic(expected = "outside the field bounds")]
    fn out_of_bounds_value_panics() {
        let f = ScalarField::new_filled(Range::new(0, 0, 2, 2), 0.0);
        f.value(Point::new(2, 0));
    }

    #[test]
    fn set_then_get() {
        let mut f = ScalarField::new_filled(Range::new(0, 0, 3, 3), 0.0);
        f.set(Point::new(1, 2), 7.0);
        assert_eq!(f.value(Point::new(1, 2)), 7.0);
        assert_eq!(f.value(Point::new(2, 1)), 0.0);
    }

    #[test]
    fn min_value_skips_nan() {
        let f = ScalarField::from_values(Range::new(0, 0, 2, 2), vec![3.0, f64::NAN, 1.5, 9.0]);
        assert_eq!(f.min_value(), 1.5);
    }

    #[test]
    fn min_value_of_infinite_field_is_infinite() {
        let f = ScalarField::new_filled(Range::new(0, 0, 2, 2), f64::INFINITY);
        assert_eq!(f.min_value(), f64::INFINITY);
    }

    #[test]
    fn zip_with_adds_cells() {
        let a = ScalarField::from_values(Range::new(0, 0, 2, 1), vec![1.0, 2.0]);
        let b = ScalarField::from_values(Range::new(0, 0, 2, 1), vec![10.0, 20.0]);
        let sum = a.zip_with(&b, |x, y| x + y);
        assert_eq!(sum.values(), &[11.0, 22.0]);
    }

    #[test]
    #[should_panic(expected = "different bounds")]
    fn zip_with_mismatched_bounds_panics() {
        let a = ScalarField::new_filled(Range::new(0, 0, 2, 2), 0.0);
        let b = ScalarField::new_filled(Range::new(0, 0, 3, 2), 0.0);
        a.zip_with(&b, |x, _| x);
    }
}
