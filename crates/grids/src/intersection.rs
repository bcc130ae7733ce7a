//! Curve/surface intersection by bisection on the curve parameter.

use cad_spline::Point3d;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::IntersectionConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Outcome};
use crate::traits::{CurveQuery, SurfaceQuery};

/// Where a curve meets a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveSurfaceHit {
    pub point: Point3d,
    pub curve_parameter: f64,
    pub surface_parameters: (f64, f64),
    /// Distance between the curve point and its projection on the surface.
    pub distance: f64,
}

struct Probe {
    hit: CurveSurfaceHit,
    /// Projection offset dotted with the surface normal: positive while the
    /// curve point lies below the surface.
    side: f64,
}

fn probe<C: CurveQuery, S: SurfaceQuery>(
    curve: &C,
    surface: &S,
    t: f64,
    diagnostics: &mut Diagnostics,
) -> Probe {
    let point = curve.point_at(t);
    let (u, v) = surface.closest_parameters(&point);
    let offset = surface.point_at(u, v) - point;
    let side = match surface.normal_at(u, v) {
        Some(n) => offset.dot(&n),
        None => {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::SingularNormal,
                    format!("surface normal undefined at ({u:.6}, {v:.6})"),
                )
                .with_value(t),
            );
            0.0
        }
    };
    Probe {
        hit: CurveSurfaceHit {
            point,
            curve_parameter: t,
            surface_parameters: (u, v),
            distance: offset.length(),
        },
        side,
    }
}

/// First crossing of `curve` through `surface`, found by halving the curve
/// parameter span.
///
/// Which half survives each step depends on which side of the surface the
/// curve starts on. `None` when the projection distance does not drop below
/// the tolerance within the iteration budget.
#[instrument(skip_all)]
pub fn intersect_curve_surface<C: CurveQuery, S: SurfaceQuery>(
    curve: &C,
    surface: &S,
    config: &IntersectionConfig,
) -> Outcome<Option<CurveSurfaceHit>> {
    let mut diagnostics = Diagnostics::new();
    let (mut lo, mut hi) = curve.domain();

    let start = probe(curve, surface, lo, &mut diagnostics);
    if start.hit.distance <= config.tolerance {
        return Outcome::new(Some(start.hit), diagnostics);
    }
    let heading_in = if start.side < 0.0 { 1.0 } else { -1.0 };

    let mut last = start;
    for _ in 0..config.max_iterations {
        let mid = 0.5 * (lo + hi);
        let current = probe(curve, surface, mid, &mut diagnostics);
        let side = current.side * heading_in;
        if side < 0.0 {
            lo = mid;
        } else if side > 0.0 {
            hi = mid;
        }
        let done = current.hit.distance <= config.tolerance;
        last = current;
        if done {
            return Outcome::new(Some(last.hit), diagnostics);
        }
    }

    diagnostics.push(
        Diagnostic::warning(
            DiagnosticCode::IntersectionNotConverged,
            format!("no intersection within {} bisection steps", config.max_iterations),
        )
        .with_value(last.hit.distance)
        .with_tolerance(config.tolerance),
    );
    Outcome::new(None, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{build_bicubic_bezier_surface, build_pinned_bezier4};
    use crate::grid::Grid44;
    use crate::test_support::straight;
    use cad_spline::{NurbsCurve, NurbsSurface, Pole};

    fn flat_surface() -> NurbsSurface {
        let poles = (0..16)
            .map(|i| Pole::unit(Point3d::new((i % 4) as f64, (i / 4) as f64, 0.0)))
            .collect();
        build_bicubic_bezier_surface(&Grid44::from_poles(poles).unwrap()).unwrap()
    }

    fn line(a: Point3d, b: Point3d) -> NurbsCurve {
        build_pinned_bezier4(&straight(a, b)).unwrap()
    }

    #[test]
    fn test_line_through_flat_patch() {
        let curve = line(Point3d::new(1.0, 1.0, -1.0), Point3d::new(2.0, 2.0, 2.0));
        let out = intersect_curve_surface(&curve, &flat_surface(), &IntersectionConfig::default());
        let hit = out.value.unwrap();
        assert!((hit.curve_parameter - 1.0 / 3.0).abs() < 1e-7);
        assert!(hit.point.z.abs() < 1e-8);
        let (u, v) = hit.surface_parameters;
        assert!((u - 4.0 / 9.0).abs() < 1e-6 && (v - 4.0 / 9.0).abs() < 1e-6);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn test_line_from_above() {
        let curve = line(Point3d::new(0.5, 2.0, 3.0), Point3d::new(2.5, 1.0, -1.0));
        let out = intersect_curve_surface(&curve, &flat_surface(), &IntersectionConfig::default());
        let hit = out.value.unwrap();
        assert!((hit.curve_parameter - 0.75).abs() < 1e-7);
    }

    #[test]
    fn test_line_missing_the_patch() {
        let curve = line(Point3d::new(1.0, 1.0, 1.0), Point3d::new(2.0, 2.0, 2.0));
        let out = intersect_curve_surface(&curve, &flat_surface(), &IntersectionConfig::default());
        assert!(out.value.is_none());
        assert!(out.diagnostics.has(DiagnosticCode::IntersectionNotConverged));
    }

    #[test]
    fn test_start_on_surface_is_immediate() {
        let curve = line(Point3d::new(1.0, 1.0, 0.0), Point3d::new(1.0, 1.0, 2.0));
        let out = intersect_curve_surface(&curve, &flat_surface(), &IntersectionConfig::default());
        assert_eq!(out.value.unwrap().curve_parameter, 0.0);
    }
}
