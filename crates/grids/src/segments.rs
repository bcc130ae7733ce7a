//! Control polygons and grids cut out of existing curves and surfaces.
//!
//! A surface cut is given by a curve lying along one edge of the surface:
//! its endpoints are projected to `(u, v)`, the constant parameter names the
//! edge, and the varying one gives the span to keep.

use cad_spline::{NurbsCurve, NurbsSurface, Point3d, Pole};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::GridError;
use crate::grid::Grid44;
use crate::poly::Poly4;
use crate::traits::CurveQuery;

/// Normalized distance from a domain end that still counts as on the edge.
const EDGE_BAND: f64 = 1e-3;

/// Where a curve is cut.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CurveCut {
    Parameter(f64),
    /// Projected onto the curve first.
    Point(Point3d),
}

impl CurveCut {
    fn parameter(&self, curve: &NurbsCurve) -> f64 {
        match self {
            CurveCut::Parameter(t) => *t,
            CurveCut::Point(p) => curve.parameter(p),
        }
    }
}

/// The Poly4 of a cubic between two cuts, running in the curve's direction
/// whatever order the cuts come in.
pub fn poly4_segment(curve: &NurbsCurve, a: CurveCut, b: CurveCut) -> Result<Poly4, GridError> {
    let (ta, tb) = (a.parameter(curve), b.parameter(curve));
    let piece = curve.segment(ta.min(tb), ta.max(tb))?;
    Poly4::try_from(piece.poles())
}

/// Surface direction a cut runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutDirection {
    U,
    V,
}

/// Span of the surface a cut curve covers, in its running direction.
fn edge_span<C: CurveQuery>(surface: &NurbsSurface, cut: &C) -> Result<(CutDirection, f64, f64), GridError> {
    let (t0, t1) = cut.domain();
    let start = surface.parameter(&cut.point_at(t0));
    let end = surface.parameter(&cut.point_at(t1));
    let (u_lo, u_hi) = surface.domain_u();
    let (v_lo, v_hi) = surface.domain_v();

    let on_edge = |a: f64, b: f64, lo: f64, hi: f64| {
        let (fa, fb) = ((a - lo) / (hi - lo), (b - lo) / (hi - lo));
        (fa < EDGE_BAND && fb < EDGE_BAND) || (fa > 1.0 - EDGE_BAND && fb > 1.0 - EDGE_BAND)
    };
    let (direction, a, b, lo, hi) = if on_edge(start.1, end.1, v_lo, v_hi) {
        (CutDirection::U, start.0, end.0, u_lo, u_hi)
    } else if on_edge(start.0, end.0, u_lo, u_hi) {
        (CutDirection::V, start.1, end.1, v_lo, v_hi)
    } else {
        return Err(GridError::CutOffEdge {
            start: [start.0, start.1],
            end: [end.0, end.1],
        });
    };
    let span = (a.min(b).max(lo), a.max(b).min(hi));
    debug!(?direction, from = span.0, to = span.1, "edge cut");
    Ok((direction, span.0, span.1))
}

fn grid_of(surface: &NurbsSurface) -> Result<Grid44, GridError> {
    let poles = surface
        .control_points
        .iter()
        .zip(&surface.weights)
        .map(|(p, w)| Pole::new(*p, *w))
        .collect();
    Grid44::from_poles(poles)
}

/// Grid44 of the part of a bicubic surface between the ends of a cut lying
/// on one of its edges. The other direction keeps its full domain.
#[instrument(skip_all)]
pub fn grid44_edge_segment<C: CurveQuery>(surface: &NurbsSurface, cut: &C) -> Result<Grid44, GridError> {
    let (direction, t0, t1) = edge_span(surface, cut)?;
    let (u_lo, u_hi) = surface.domain_u();
    let (v_lo, v_hi) = surface.domain_v();
    let piece = match direction {
        CutDirection::U => surface.segment(t0, t1, v_lo, v_hi)?,
        CutDirection::V => surface.segment(u_lo, u_hi, t0, t1)?,
    };
    grid_of(&piece)
}

/// Grid44 of the corner patch bounded by one cut along u and one along v.
/// Rows come out in reverse order, so row 0 is the high-v side.
#[instrument(skip_all)]
pub fn grid44_two_edge_segments<A: CurveQuery, B: CurveQuery>(
    surface: &NurbsSurface,
    cut_a: &A,
    cut_b: &B,
) -> Result<Grid44, GridError> {
    let a = edge_span(surface, cut_a)?;
    let b = edge_span(surface, cut_b)?;
    let (u_span, v_span) = match (a, b) {
        ((CutDirection::U, u0, u1), (CutDirection::V, v0, v1))
        | ((CutDirection::V, v0, v1), (CutDirection::U, u0, u1)) => ((u0, u1), (v0, v1)),
        ((direction, ..), _) => return Err(GridError::ParallelCuts { direction }),
    };
    let piece = surface.segment(u_span.0, u_span.1, v_span.0, v_span.1)?;
    Ok(grid_of(&piece)?.flipped_vertical())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{build_bicubic_bezier_surface, build_pinned_6p};
    use crate::poly::Poly6;
    use cad_spline::{SplineError, bezier_knots};

    fn domed() -> NurbsSurface {
        let poles = (0..16)
            .map(|i| {
                let (row, col) = (i / 4, i % 4);
                let inner = (1..3).contains(&row) && (1..3).contains(&col);
                Pole::unit(Point3d::new(col as f64, row as f64, if inner { 1.0 } else { 0.2 * col as f64 }))
            })
            .collect();
        build_bicubic_bezier_surface(&Grid44::from_poles(poles).unwrap()).unwrap()
    }

    fn line(a: Point3d, b: Point3d) -> NurbsCurve {
        NurbsCurve::from_poles(1, &[Pole::unit(a), Pole::unit(b)], bezier_knots(1)).unwrap()
    }

    fn close(a: Point3d, b: Point3d) {
        assert!(a.distance_to(&b) < 1e-6, "{a:?} vs {b:?}");
    }

    #[test]
    fn test_poly4_segment_between_points() {
        let s = domed();
        let edge = NurbsCurve::new(
            3,
            s.control_points[..4].to_vec(),
            vec![1.0; 4],
            bezier_knots(3),
        )
        .unwrap();
        let near = edge.evaluate(0.2);
        let far = edge.evaluate(0.7);
        let poly = poly4_segment(&edge, CurveCut::Point(far), CurveCut::Point(near)).unwrap();
        close(poly.first().point, near);
        close(poly.last().point, far);

        let mixed = poly4_segment(&edge, CurveCut::Parameter(0.2), CurveCut::Point(far)).unwrap();
        for (p, q) in poly.points().iter().zip(mixed.points()) {
            close(*p, q);
        }
    }

    #[test]
    fn test_poly4_segment_rejects_empty_and_long_pieces() {
        let six = build_pinned_6p(&Poly6::from_points(std::array::from_fn(|i| {
            Point3d::new(i as f64, (i % 2) as f64, 0.0)
        })))
        .unwrap();
        assert!(matches!(
            poly4_segment(&six, CurveCut::Parameter(0.5), CurveCut::Parameter(0.5)),
            Err(GridError::Spline(SplineError::EmptyRange { .. }))
        ));
        // crosses the knot at 1/3
        assert!(matches!(
            poly4_segment(&six, CurveCut::Parameter(0.1), CurveCut::Parameter(0.5)),
            Err(GridError::PoleCount { expected: 4, found: 5 })
        ));
        assert!(poly4_segment(&six, CurveCut::Parameter(0.4), CurveCut::Parameter(0.6)).is_ok());
    }

    #[test]
    fn test_edge_segment_along_u() {
        let s = domed();
        let cut = line(s.evaluate(0.75, 0.0), s.evaluate(0.25, 0.0));
        let grid = grid44_edge_segment(&s, &cut).unwrap();
        close(grid.point(0, 0), s.evaluate(0.25, 0.0));
        close(grid.point(0, 3), s.evaluate(0.75, 0.0));
        close(grid.point(3, 3), s.evaluate(0.75, 1.0));
        close(grid.point(3, 0), s.evaluate(0.25, 1.0));
    }

    #[test]
    fn test_edge_segment_along_v_on_far_edge() {
        let s = domed();
        let cut = line(s.evaluate(1.0, 0.1), s.evaluate(1.0, 0.6));
        let grid = grid44_edge_segment(&s, &cut).unwrap();
        close(grid.point(0, 0), s.evaluate(0.0, 0.1));
        close(grid.point(3, 3), s.evaluate(1.0, 0.6));
        let rebuilt = build_bicubic_bezier_surface(&grid).unwrap();
        // the Bezier rebuild runs v over [0, 1]
        close(rebuilt.evaluate(0.5, 0.5), s.evaluate(0.5, 0.35));
    }

    #[test]
    fn test_cut_across_the_interior_is_rejected() {
        let s = domed();
        let cut = line(s.evaluate(0.3, 0.4), s.evaluate(0.6, 0.5));
        assert!(matches!(
            grid44_edge_segment(&s, &cut),
            Err(GridError::CutOffEdge { .. })
        ));
    }

    #[test]
    fn test_two_cuts_bound_a_corner_patch() {
        let s = domed();
        let along_u = line(s.evaluate(0.2, 0.0), s.evaluate(0.6, 0.0));
        let along_v = line(s.evaluate(1.0, 0.8), s.evaluate(1.0, 0.3));
        let grid = grid44_two_edge_segments(&s, &along_u, &along_v).unwrap();
        close(grid.point(0, 0), s.evaluate(0.2, 0.8));
        close(grid.point(0, 3), s.evaluate(0.6, 0.8));
        close(grid.point(3, 0), s.evaluate(0.2, 0.3));

        let swapped = grid44_two_edge_segments(&s, &along_v, &along_u).unwrap();
        for (p, q) in grid.poles().iter().zip(swapped.poles()) {
            close(p.point, q.point);
        }
    }

    #[test]
    fn test_two_cuts_in_one_direction_fail() {
        let s = domed();
        let a = line(s.evaluate(0.2, 0.0), s.evaluate(0.6, 0.0));
        let b = line(s.evaluate(0.1, 1.0), s.evaluate(0.5, 1.0));
        assert!(matches!(
            grid44_two_edge_segments(&s, &a, &b),
            Err(GridError::ParallelCuts {
                direction: CutDirection::U
            })
        ));
    }
}
