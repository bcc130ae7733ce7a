//! Endpoint derivatives and curvature from the first poles of a pinned cubic.
//!
//! Weights are ignored: the formulas treat the poles as non-rational.

use cad_spline::{Point3d, Vec3};
use serde::{Deserialize, Serialize};

/// Knot layout that sets the derivative scaling at an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CurveForm {
    /// Single cubic segment, knots `[0,0,0,0,1,1,1,1]`.
    Bezier,
    /// Three cubic segments, interior knots at 1/3 and 2/3.
    SixPole,
}

pub fn tangent_at_start(p0: Point3d, p1: Point3d, form: CurveForm) -> Vec3 {
    let scale = match form {
        CurveForm::Bezier => 3.0,
        CurveForm::SixPole => 9.0,
    };
    (p1 - p0) * scale
}

pub fn second_derivative_at_start(p0: Point3d, p1: Point3d, p2: Point3d, form: CurveForm) -> Vec3 {
    let (a, b) = (p0.to_vec3(), p1.to_vec3());
    let c = p2.to_vec3();
    match form {
        CurveForm::Bezier => (a - b * 2.0 + c) * 6.0,
        CurveForm::SixPole => (a * 2.0 - b * 3.0 + c) * 27.0,
    }
}

/// `|d1 x d2| / |d1|^3`, or 0 where the tangent vanishes.
pub fn curvature_at_start(p0: Point3d, p1: Point3d, p2: Point3d, form: CurveForm) -> f64 {
    let d1 = tangent_at_start(p0, p1, form);
    let d2 = second_derivative_at_start(p0, p1, p2, form);
    let speed = d1.length();
    if speed < 1e-15 {
        return 0.0;
    }
    d1.cross(&d2).length() / (speed * speed * speed)
}

/// Curvature at the last pole of `poles`.
pub fn curvature_at_end(poles: &[Point3d], form: CurveForm) -> f64 {
    match poles {
        [.., a, b, c] => curvature_at_start(*c, *b, *a, form),
        _ => 0.0,
    }
}
