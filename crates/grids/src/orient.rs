use cad_spline::Point3d;
use tracing::warn;

use crate::error::GridError;
use crate::poly::Poly;

/// How `orient` arranged its first argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Kept,
    Reversed,
}

/// True iff `|a - b| <= tol`.
pub fn points_equal(a: &Point3d, b: &Point3d, tol: f64) -> bool {
    a.coincident(b, tol)
}

/// Arrange `a` so its last pole is an endpoint of `b`.
///
/// Candidates are tested in order, first match wins: `a.last == b.first`,
/// `a.last == b.last` (both keep), `a.first == b.first`, `a.first == b.last`
/// (both reverse). Weights travel with their points.
pub fn orient<const N: usize, const M: usize>(
    a: &Poly<N>,
    b: &Poly<M>,
    tol: f64,
) -> Result<(Poly<N>, Orientation), GridError> {
    let (a0, a1) = (a.first().point, a.last().point);
    let (b0, b1) = (b.first().point, b.last().point);

    if points_equal(&a1, &b0, tol) || points_equal(&a1, &b1, tol) {
        return Ok((*a, Orientation::Kept));
    }
    if points_equal(&a0, &b0, tol) || points_equal(&a0, &b1, tol) {
        return Ok((a.reversed(), Orientation::Reversed));
    }

    let gap = [a0, a1]
        .iter()
        .flat_map(|p| [p.distance_to(&b0), p.distance_to(&b1)])
        .fold(f64::INFINITY, f64::min);
    warn!(gap, tol, "control polygons share no endpoint");
    Err(GridError::NoSharedEndpoint { gap, tol })
}

/// Orient `a` and return only the polygon.
pub fn oriented<const N: usize, const M: usize>(
    a: &Poly<N>,
    b: &Poly<M>,
    tol: f64,
) -> Result<Poly<N>, GridError> {
    orient(a, b, tol).map(|(poly, _)| poly)
}
