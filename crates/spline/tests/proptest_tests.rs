//! Property-based tests for spline refinement invariants using the `proptest` crate.

use proptest::prelude::*;

use cad_spline::{NurbsCurve, Point3d, Pole, bezier_knots};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Arbitrary 3D coordinate tuple in a modelling-sized range.
fn arb_point() -> impl Strategy<Value = (f64, f64, f64)> {
    (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0)
}

/// Positive weight away from zero.
fn arb_weight() -> impl Strategy<Value = f64> {
    0.5f64..2.0
}

/// Interior parameter of a Bezier segment.
fn arb_param() -> impl Strategy<Value = f64> {
    0.05f64..0.95
}

fn arb_cubic() -> impl Strategy<Value = NurbsCurve> {
    prop::collection::vec((arb_point(), arb_weight()), 4).prop_map(|raw| {
        let poles: Vec<Pole> = raw
            .into_iter()
            .map(|((x, y, z), w)| Pole::new(Point3d::new(x, y, z), w))
            .collect();
        NurbsCurve::from_poles(3, &poles, bezier_knots(3)).expect("four poles fit a cubic")
    })
}

const TOL: f64 = 1e-6;

fn max_deviation(a: &NurbsCurve, b: &NurbsCurve) -> f64 {
    (0..=16)
        .map(|i| {
            let t = i as f64 / 16.0;
            a.evaluate(t).distance_to(&b.evaluate(t))
        })
        .fold(0.0, f64::max)
}

// ---------------------------------------------------------------------------
// 1. Knot insertion leaves the curve unchanged
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn insert_knot_preserves_shape(curve in arb_cubic(), t in arb_param()) {
        let refined = curve.insert_knot(t).unwrap();
        prop_assert_eq!(refined.num_control_points(), 5);
        let dev = max_deviation(&curve, &refined);
        prop_assert!(dev < TOL, "deviation {} after inserting {}", dev, t);
    }
}

// ---------------------------------------------------------------------------
// 2. Degree elevation leaves the curve unchanged
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn increase_degree_preserves_shape(curve in arb_cubic()) {
        let raised = curve.increase_degree(5).unwrap();
        prop_assert_eq!(raised.num_control_points(), 6);
        let dev = max_deviation(&curve, &raised);
        prop_assert!(dev < TOL, "deviation {} after elevation", dev);
    }
}

// ---------------------------------------------------------------------------
// 3. A segment starts and ends on the parent curve
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn segment_endpoints_lie_on_parent(curve in arb_cubic(), t in arb_param()) {
        let seg = curve.segment(0.0, t).unwrap();
        let first = seg.control_points[0];
        let last = *seg.control_points.last().unwrap();
        prop_assert!(first.distance_to(&curve.evaluate(0.0)) < TOL);
        prop_assert!(last.distance_to(&curve.evaluate(t)) < TOL,
            "segment end {:?} vs curve {:?}", last, curve.evaluate(t));
    }
}

// ---------------------------------------------------------------------------
// 4. Reversal twice is the identity
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn reversed_twice_is_identity(curve in arb_cubic()) {
        let back = curve.reversed().reversed();
        prop_assert!(max_deviation(&curve, &back) < TOL);
        prop_assert_eq!(back.knots, curve.knots);
    }
}
