use approx::relative_eq;
use cad_spline::{Point3d, Pole};

use super::BlendScales;
use crate::Tolerance;
use crate::builders::poly6_from_bezier;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::error::GridError;
use crate::orient::{oriented, points_equal};
use crate::poly::{Poly4, Poly6};

/// A G2 blend and what was noticed while building it.
#[derive(Debug, Clone)]
pub struct BlendOutcome {
    pub poly: Poly6,
    pub scales: BlendScales,
    pub diagnostics: Diagnostics,
}

/// Blend two cubic Beziers sharing an endpoint into one 6P curve.
///
/// The blend runs from the far end of `a` to the far end of `b`. Position,
/// tangent direction and curvature at both far ends match the inputs.
pub fn blend_g2(
    a: &Poly4,
    b: &Poly4,
    scales: &BlendScales,
    tol: &Tolerance,
) -> Result<BlendOutcome, GridError> {
    let (a, b) = flowing_pair(a, b, tol)?;
    let a6 = poly6_from_bezier(&a)?;
    let b6 = poly6_from_bezier(&b)?;

    let mut diagnostics = Diagnostics::new();
    let (q1, q2) = rescaled_legs(
        [a6[0].point, a6[1].point, a6[2].point],
        scales.tangent_start,
        scales.inner_start,
        tol,
        &mut diagnostics,
    );
    let (q4, q3) = rescaled_legs(
        [b6[5].point, b6[4].point, b6[3].point],
        scales.tangent_end,
        scales.inner_end,
        tol,
        &mut diagnostics,
    );

    let wa = side_weights(&a, [a6[0].weight, a6[1].weight, a6[2].weight]);
    let wb = side_weights(&b, [b6[3].weight, b6[4].weight, b6[5].weight]);
    let poly = Poly6::new([
        Pole::new(a6[0].point, wa[0]),
        Pole::new(q1, wa[1]),
        Pole::new(q2, wa[2]),
        Pole::new(q3, wb[0]),
        Pole::new(q4, wb[1]),
        Pole::new(b6[5].point, wb[2]),
    ]);

    Ok(BlendOutcome {
        poly,
        scales: *scales,
        diagnostics,
    })
}

/// `a` ending at the shared corner and `b` starting there.
pub(crate) fn flowing_pair(a: &Poly4, b: &Poly4, tol: &Tolerance) -> Result<(Poly4, Poly4), GridError> {
    let a = oriented(a, b, tol.coincidence)?;
    let corner = a.last().point;
    let b = if points_equal(&b.first().point, &corner, tol.coincidence) {
        *b
    } else {
        b.reversed()
    };
    Ok((a, b))
}

/// New second and third poles for the outer end `q[0]`.
///
/// The first leg is scaled by `tangent`. The third pole starts from the
/// unscaled elevated pole `q[1]`: the second leg splits into a part along
/// the tangent, scaled by `inner`, and a height, scaled by `tangent²`.
fn rescaled_legs(
    q: [Point3d; 3],
    tangent: f64,
    inner: f64,
    tol: &Tolerance,
    diagnostics: &mut Diagnostics,
) -> (Point3d, Point3d) {
    let l0 = q[1] - q[0];
    let leg = q[2] - q[1];
    let q1 = q[0] + l0 * tangent;

    if tol.is_zero_length(&l0) {
        diagnostics.push(
            Diagnostic::warning(
                DiagnosticCode::ZeroLengthTangent,
                "first leg has zero length, second leg kept tangential",
            )
            .with_value(l0.length())
            .with_tolerance(tol.zero_length),
        );
        return (q1, q[1] + leg * inner);
    }

    let along = leg.project_onto(&l0);
    let height = leg - along;
    (q1, q[1] + height * (tangent * tangent) + along * inner)
}

/// Output weights of one side, forced to the mean when the input is uniform.
fn side_weights(input: &Poly4, elevated: [f64; 3]) -> [f64; 3] {
    let weights = input.weights();
    let mean = weights.iter().sum::<f64>() / weights.len() as f64;
    if weights
        .iter()
        .all(|&w| relative_eq!(w, mean, max_relative = 0.1))
    {
        [mean; 3]
    } else {
        elevated
    }
}
