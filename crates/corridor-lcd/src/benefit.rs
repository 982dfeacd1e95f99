use corridor_core::ScalarField;

/// Parameters of a benefit evaluation.
#[derive(Copy, Clone, Debug)]
pub struct BenefitParams {
    /// Crossing search radius in cells. Must be positive for a crossing
    /// to be meaningful; the evaluator itself accepts any value.
    pub radius: u32,
    /// Improvements below this threshold are reported as no benefit.
    pub min_improvement: Option<f64>,
}

impl BenefitParams {
    /// Fixed cost of traversing the new crossing itself.
    #[inline]
    pub fn crossing_cost(&self) -> f64 {
        2.0 * self.radius as f64
    }
}

/// Outcome of scoring one pair of accumulated-cost surfaces.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Benefit {
    /// Best existing route cost connecting the two endpoints.
    pub existing: f64,
    /// Best route cost if a crossing were placed at the cheapest nearby
    /// location, including the crossing cost.
    pub improved: f64,
    /// `existing - improved`, floored at zero and gated by the
    /// minimum-improvement threshold.
    pub benefit: f64,
}

/// Best existing route cost: the minimum over all cells of the two
/// accumulated costs summed, i.e. the cheapest path from endpoint A to
/// endpoint B through any intermediate cell.
///
/// Returns infinity when no cell is reached by both surfaces.
///
/// Panics if the surfaces have different bounds.
pub fn existing_min_cost(a: &ScalarField, b: &ScalarField) -> f64 {
    a.zip_with(b, |x, y| x + y).min_value()
}

/// Best improved route cost: the minimum over all cells of the two
/// filtered accumulated costs summed, plus the fixed crossing cost of
/// `2 × radius`.
///
/// Returns infinity when no cell is reached by both filtered surfaces.
pub fn improved_min_cost(filtered_a: &ScalarField, filtered_b: &ScalarField, radius: u32) -> f64 {
    filtered_a.zip_with(filtered_b, |x, y| x + y).min_value() + 2.0 * radius as f64
}

/// Score the crossing benefit for one endpoint pair.
///
/// `a` and `b` are the accumulated-cost surfaces of the two endpoints;
/// `filtered_a` and `filtered_b` their disk-minimum counterparts.
/// Returns `None` when either minimum is non-finite — the endpoints are
/// not connected by any existing route, so no benefit is computed.
pub fn evaluate(
    a: &ScalarField,
    b: &ScalarField,
    filtered_a: &ScalarField,
    filtered_b: &ScalarField,
    params: &BenefitParams,
) -> Option<Benefit> {
    let existing = existing_min_cost(a, b);
    let improved = improved_min_cost(filtered_a, filtered_b, params.radius);
    if !existing.is_finite() || !improved.is_finite() {
        return None;
    }
    let mut benefit = (existing - improved).max(0.0);
    if params.min_improvement.is_some_and(|t| benefit < t) {
        benefit = 0.0;
    }
    Some(Benefit {
        existing,
        improved,
        benefit,
    })
}

/// Per-cell benefit grid: how much cheaper the best route would get if
/// the crossing were placed at each cell.
///
/// A cell scores `existing − (filtered_a + filtered_b + 2 × radius)`
/// where that is an improvement over the existing minimum, and 0
/// elsewhere. When the endpoints have no existing route the whole grid
/// scores 0.
pub fn benefit_field(
    a: &ScalarField,
    b: &ScalarField,
    filtered_a: &ScalarField,
    filtered_b: &ScalarField,
    params: &BenefitParams,
) -> ScalarField {
    let existing = existing_min_cost(a, b);
    let crossing = params.crossing_cost();
    let threshold = params.min_improvement.unwrap_or(0.0);
    filtered_a.zip_with(filtered_b, |x, y| {
        let improved = x + y + crossing;
        if existing.is_finite() && improved.is_finite() && existing - improved >= threshold {
            existing - improved
        } else {
            0.0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_core::{Point, Range};

    fn field(values: Vec<f64>) -> ScalarField {
        ScalarField::from_values(Range::new(0, 0, 3, 1), values)
    }

    #[test]
    fn scores_the_documented_scenario() {
        // Combined existing minimum 100 at the middle cell; filtering
        // lowers the combined best to 80. With radius 3 the crossing adds
        // 6, so improved = 86 and benefit = 14.
        let a = field(vec![70.0, 40.0, 90.0]);
        let b = field(vec![80.0, 60.0, 30.0]);
        let fa = field(vec![40.0, 40.0, 50.0]);
        let fb = field(vec![60.0, 40.0, 30.0]);
        let params = BenefitParams {
            radius: 3,
            min_improvement: None,
        };
        let out = evaluate(&a, &b, &fa, &fb, &params).unwrap();
        assert_eq!(out.existing, 100.0);
        assert_eq!(out.improved, 86.0);
        assert_eq!(out.benefit, 14.0);
    }

    #[test]
    fn benefit_is_never_negative() {
        // Filtering cannot help here; crossing cost makes improved worse.
        let a = field(vec![10.0, 10.0, 10.0]);
        let b = field(vec![10.0, 10.0, 10.0]);
        let params = BenefitParams {
            radius: 2,
            min_improvement: None,
        };
        let out = evaluate(&a, &b, &a, &b, &params).unwrap();
        assert_eq!(out.existing, 20.0);
        assert_eq!(out.improved, 24.0);
        assert_eq!(out.benefit, 0.0);
    }

    #[test]
    fn threshold_gates_small_improvements() {
        let a = field(vec![50.0, 50.0, 50.0]);
        let b = field(vec![50.0, 50.0, 50.0]);
        let fa = field(vec![46.0, 46.0, 46.0]);
        let fb = field(vec![50.0, 50.0, 50.0]);
        // Improvement is 4 - 2 = 2 with radius 1.
        let gated = evaluate(
            &a,
            &b,
            &fa,
            &fb,
            &BenefitParams {
                radius: 1,
                min_improvement: Some(5.0),
            },
        )
        .unwrap();
        assert_eq!(gated.benefit, 0.0);
        let open = evaluate(
            &a,
            &b,
            &fa,
            &fb,
            &BenefitParams {
                radius: 1,
                min_improvement: Some(1.0),
            },
        )
        .unwrap();
        assert_eq!(open.benefit, 2.0);
    }

    #[test]
    fn disconnected_endpoints_yield_no_benefit() {
        let a = field(vec![f64::INFINITY, f64::INFINITY, 5.0]);
        let b = field(vec![3.0, f64::INFINITY, f64::INFINITY]);
        let params = BenefitParams {
            radius: 1,
            min_improvement: None,
        };
        assert_eq!(evaluate(&a, &b, &a, &b, &params), None);
    }

    #[test]
    fn benefit_field_scores_only_improving_cells() {
        let a = field(vec![10.0, 40.0, 90.0]);
        let b = field(vec![90.0, 40.0, 10.0]);
        // existing minimum = 80 at the middle cell.
        let fa = field(vec![10.0, 10.0, 40.0]);
        let fb = field(vec![40.0, 10.0, 10.0]);
        let params = BenefitParams {
            radius: 1,
            min_improvement: None,
        };
        let out = benefit_field(&a, &b, &fa, &fb, &params);
        // Cell 0: improved 10+40+2 = 52, benefit 28.
        assert_eq!(out.value(Point::new(0, 0)), 28.0);
        // Cell 1: improved 22, benefit 58.
        assert_eq!(out.value(Point::new(1, 0)), 58.0);
        // Cell 2: same as cell 0 mirrored.
        assert_eq!(out.value(Point::new(2, 0)), 28.0);
    }

    #[test]
    fn benefit_field_is_zero_when_disconnected() {
        let a = field(vec![f64::INFINITY; 3]);
        let b = field(vec![1.0, 2.0, 3.0]);
        let fa = field(vec![5.0, 5.0, 5.0]);
        let fb = field(vec![1.0, 1.0, 1.0]);
        let params = BenefitParams {
            radius: 2,
            min_improvement: None,
        };
        let out = benefit_field(&a, &b, &fa, &fb, &params);
        assert!(out.values().iter().all(|&v| v == 0.0));
    }
}
