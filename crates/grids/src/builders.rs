//! Fixed-topology curves and surfaces over synthesized poles.
//!
//! Four-pole directions use the single-segment Bezier knot vector, six-pole
//! directions the 6P vector with interior knots at exact thirds. Surfaces run
//! u along a row (width `W`) and v across rows (height `H`).

use cad_spline::{NurbsCurve, NurbsSurface, SplineError, bezier_knots};

use crate::error::GridError;
use crate::grid::{Grid, Grid44, Grid64, Grid66};
use crate::poly::{Poly4, Poly6};

/// Knots of a pinned cubic through six poles.
pub fn six_pole_knots() -> Vec<f64> {
    vec![0.0, 0.0, 0.0, 0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0, 1.0, 1.0, 1.0]
}

fn cubic_knots(len: usize) -> Vec<f64> {
    if len == 6 { six_pole_knots() } else { bezier_knots(3) }
}

pub fn build_pinned_bezier4(poly: &Poly4) -> Result<NurbsCurve, GridError> {
    Ok(NurbsCurve::from_poles(3, poly.poles(), bezier_knots(3))?)
}

pub fn build_pinned_6p(poly: &Poly6) -> Result<NurbsCurve, GridError> {
    Ok(NurbsCurve::from_poles(3, poly.poles(), six_pole_knots())?)
}

/// A single-segment curve of degree at most 3, raised to a cubic and split
/// at the thirds of its domain.
pub fn split_at_thirds(curve: &NurbsCurve) -> Result<NurbsCurve, SplineError> {
    let cubic = curve.increase_degree(3)?;
    let (start, end) = cubic.domain();
    let span = end - start;
    cubic.insert_knot(start + span / 3.0)?.insert_knot(end - span / 3.0)
}

/// The six poles of a single-segment curve after [`split_at_thirds`].
pub fn poly6_from_cubic(curve: &NurbsCurve) -> Result<Poly6, GridError> {
    Poly6::try_from(split_at_thirds(curve)?.poles())
}

/// A cubic Bezier polygon re-expressed as a 6P polygon with the same shape.
pub fn poly6_from_bezier(poly: &Poly4) -> Result<Poly6, GridError> {
    poly6_from_cubic(&build_pinned_bezier4(poly)?)
}

fn build_surface<const W: usize, const H: usize>(grid: &Grid<W, H>) -> Result<NurbsSurface, GridError> {
    Ok(NurbsSurface::from_poles(
        (3, 3),
        grid.poles(),
        cubic_knots(W),
        cubic_knots(H),
        W,
        H,
    )?)
}

pub fn build_bicubic_bezier_surface(grid: &Grid44) -> Result<NurbsSurface, GridError> {
    build_surface(grid)
}

pub fn build_64_surface(grid: &Grid64) -> Result<NurbsSurface, GridError> {
    build_surface(grid)
}

pub fn build_66_surface(grid: &Grid66) -> Result<NurbsSurface, GridError> {
    build_surface(grid)
}
