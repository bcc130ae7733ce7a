use approx::abs_diff_eq;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SplineError;
use crate::point::Point3d;
use crate::pole::Pole;
use crate::vector::Vec3;

/// Two knots closer than this are the same knot.
const KNOT_EPS: f64 = 1e-12;

/// 8-point Gauss-Legendre nodes and weights on [-1, 1].
const GAUSS_LEGENDRE_8: [(f64, f64); 8] = [
    (-0.960_289_856_497_536_3, 0.101_228_536_290_376_3),
    (-0.796_666_477_413_626_7, 0.222_381_034_453_374_5),
    (-0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
    (-0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
    (0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
    (0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
    (0.796_666_477_413_626_7, 0.222_381_034_453_374_5),
    (0.960_289_856_497_536_3, 0.101_228_536_290_376_3),
];

/// Clamped knot vector of a single Bezier segment on [0, 1].
pub fn bezier_knots(degree: usize) -> Vec<f64> {
    let mut knots = vec![0.0; degree + 1];
    knots.extend(std::iter::repeat_n(1.0, degree + 1));
    knots
}

/// Knot span index containing `t`, by binary search.
fn find_span(knots: &[f64], degree: usize, count: usize, t: f64) -> usize {
    let n = count - 1;
    let p = degree;
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[p] {
        return p;
    }
    let mut low = p;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

fn basis_functions(knots: &[f64], span: usize, t: f64, degree: usize) -> Vec<f64> {
    let p = degree;
    let mut n_vals = vec![0.0; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    n_vals[0] = 1.0;
    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = n_vals[r] / (right[r + 1] + left[j - r]);
            n_vals[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n_vals[j] = saved;
    }
    n_vals
}

/// Basis functions and their first derivatives over the `degree + 1`
/// functions that are non-zero in `span`.
fn basis_with_derivatives(knots: &[f64], span: usize, t: f64, degree: usize) -> (Vec<f64>, Vec<f64>) {
    let values = basis_functions(knots, span, t, degree);
    let mut ders = vec![0.0; degree + 1];
    if degree == 0 {
        return (values, ders);
    }
    let p = degree as f64;
    // lower[k] is N_{span-degree+1+k, degree-1}
    let lower = basis_functions(knots, span, t, degree - 1);
    for (i, d) in ders.iter_mut().enumerate() {
        let g = span - degree + i;
        if i >= 1 {
            let denom = knots[g + degree] - knots[g];
            if denom > 0.0 {
                *d += p * lower[i - 1] / denom;
            }
        }
        if i < degree {
            let denom = knots[g + degree + 1] - knots[g + 1];
            if denom > 0.0 {
                *d -= p * lower[i] / denom;
            }
        }
    }
    (values, ders)
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), SplineError> {
    if expected == found {
        Ok(())
    } else {
        Err(SplineError::Dimension {
            what,
            expected,
            found,
        })
    }
}

/// A rational B-spline curve in 3D.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NurbsCurve {
    pub degree: usize,
    pub control_points: Vec<Point3d>,
    /// One weight per control point.
    pub weights: Vec<f64>,
    /// Clamped knot vector, `len = control_points.len() + degree + 1`.
    pub knots: Vec<f64>,
}

impl NurbsCurve {
    pub fn new(
        degree: usize,
        control_points: Vec<Point3d>,
        weights: Vec<f64>,
        knots: Vec<f64>,
    ) -> Result<Self, SplineError> {
        if control_points.len() < degree + 1 {
            return Err(SplineError::Dimension {
                what: "control point count",
                expected: degree + 1,
                found: control_points.len(),
            });
        }
        check_len("weight count", control_points.len(), weights.len())?;
        check_len("knot vector length", control_points.len() + degree + 1, knots.len())?;
        Ok(Self {
            degree,
            control_points,
            weights,
            knots,
        })
    }

    pub fn from_poles(degree: usize, poles: &[Pole], knots: Vec<f64>) -> Result<Self, SplineError> {
        Self::new(
            degree,
            poles.iter().map(|p| p.point).collect(),
            poles.iter().map(|p| p.weight).collect(),
            knots,
        )
    }

    pub fn poles(&self) -> Vec<Pole> {
        self.control_points
            .iter()
            .zip(&self.weights)
            .map(|(&point, &weight)| Pole::new(point, weight))
            .collect()
    }

    pub fn num_control_points(&self) -> usize {
        self.control_points.len()
    }

    /// Parameter domain [t_min, t_max].
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[self.degree], self.knots[self.knots.len() - self.degree - 1])
    }

    fn point_and_derivative(&self, t: f64) -> (Point3d, Vec3) {
        let (t0, t1) = self.domain();
        let t = t.clamp(t0, t1);
        let p = self.degree;
        let span = find_span(&self.knots, p, self.num_control_points(), t);
        let (basis, ders) = basis_with_derivatives(&self.knots, span, t, p);

        let mut a = Vec3::ZERO;
        let mut da = Vec3::ZERO;
        let mut w = 0.0;
        let mut dw = 0.0;
        for i in 0..=p {
            let idx = span - p + i;
            let wi = self.weights[idx];
            let cp = self.control_points[idx].to_vec3() * wi;
            a = a + cp * basis[i];
            da = da + cp * ders[i];
            w += basis[i] * wi;
            dw += ders[i] * wi;
        }
        let c = a / w;
        (Point3d::ORIGIN + c, (da - c * dw) / w)
    }

    /// Evaluate the curve at parameter t (clamped to the domain).
    pub fn evaluate(&self, t: f64) -> Point3d {
        self.point_and_derivative(t).0
    }

    /// First derivative at parameter t, from the rational quotient rule.
    pub fn derivative(&self, t: f64) -> Vec3 {
        self.point_and_derivative(t).1
    }

    /// Arc length over `[t0, t1]`, Gauss-Legendre per knot span.
    pub fn arc_length(&self, t0: f64, t1: f64) -> f64 {
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        let mut breaks = vec![lo];
        for &k in &self.knots {
            if k > lo + KNOT_EPS && k < hi - KNOT_EPS && breaks.last().is_none_or(|&b| k > b + KNOT_EPS) {
                breaks.push(k);
            }
        }
        breaks.push(hi);

        let mut length = 0.0;
        for piece in breaks.windows(2) {
            let half = 0.5 * (piece[1] - piece[0]);
            let mid = 0.5 * (piece[1] + piece[0]);
            for (x, wt) in GAUSS_LEGENDRE_8 {
                length += wt * half * self.derivative(mid + half * x).length();
            }
        }
        length
    }

    fn multiplicity(&self, t: f64) -> usize {
        self.knots
            .iter()
            .filter(|&&k| abs_diff_eq!(k, t, epsilon = KNOT_EPS))
            .count()
    }

    /// Boehm single knot insertion. The curve shape is unchanged.
    pub fn insert_knot(&self, t: f64) -> Result<Self, SplineError> {
        let (start, end) = self.domain();
        if !(t > start + KNOT_EPS && t < end - KNOT_EPS) {
            return Err(SplineError::KnotOutsideDomain { t, start, end });
        }
        let p = self.degree;
        let n = self.num_control_points();
        let k = find_span(&self.knots, p, n, t);
        let poles = self.poles();

        let mut inserted = Vec::with_capacity(n + 1);
        for i in 0..=n {
            let pole = if i + p <= k {
                poles[i]
            } else if i <= k {
                let alpha = (t - self.knots[i]) / (self.knots[i + p] - self.knots[i]);
                poles[i - 1].blend(&poles[i], alpha)
            } else {
                poles[i - 1]
            };
            inserted.push(pole);
        }

        let mut knots = self.knots.clone();
        knots.insert(k + 1, t);
        Self::from_poles(p, &inserted, knots)
    }

    /// Raise the degree of a single-segment (Bezier) curve to `target`.
    pub fn increase_degree(&self, target: usize) -> Result<Self, SplineError> {
        let interior = self.knots.len() - 2 * (self.degree + 1);
        if interior > 0 {
            return Err(SplineError::NotSingleSegment { interior });
        }
        if target < self.degree {
            return Err(SplineError::DegreeDecrease {
                from: self.degree,
                to: target,
            });
        }

        let mut poles = self.poles();
        for d in self.degree..target {
            let mut raised = Vec::with_capacity(poles.len() + 1);
            raised.push(poles[0]);
            for i in 1..=d {
                let alpha = i as f64 / (d + 1) as f64;
                raised.push(poles[i - 1].blend(&poles[i], 1.0 - alpha));
            }
            raised.push(poles[d]);
            poles = raised;
        }

        let (start, end) = self.domain();
        let mut knots = vec![start; target + 1];
        knots.extend(std::iter::repeat_n(end, target + 1));
        Self::from_poles(target, &poles, knots)
    }

    /// The piece of the curve over `[t0, t1]`, keeping its parameterization.
    pub fn segment(&self, t0: f64, t1: f64) -> Result<Self, SplineError> {
        let (start, end) = self.domain();
        if t0 < start - KNOT_EPS || t0 > end + KNOT_EPS {
            return Err(SplineError::KnotOutsideDomain { t: t0, start, end });
        }
        if t1 < start - KNOT_EPS || t1 > end + KNOT_EPS {
            return Err(SplineError::KnotOutsideDomain { t: t1, start, end });
        }
        if t1 - t0 <= KNOT_EPS {
            return Err(SplineError::EmptyRange { t0, t1 });
        }
        let t0 = if t0 - start <= KNOT_EPS { start } else { t0 };
        let t1 = if end - t1 <= KNOT_EPS { end } else { t1 };

        let p = self.degree;
        let mut curve = self.clone();
        for t in [t0, t1] {
            if t == start || t == end {
                continue;
            }
            for _ in curve.multiplicity(t)..p {
                curve = curve.insert_knot(t)?;
            }
        }

        let range_err = || SplineError::EmptyRange { t0, t1 };
        let last_at_t0 = curve
            .knots
            .iter()
            .rposition(|&k| abs_diff_eq!(k, t0, epsilon = KNOT_EPS))
            .ok_or_else(range_err)?;
        let first_at_t1 = curve
            .knots
            .iter()
            .position(|&k| abs_diff_eq!(k, t1, epsilon = KNOT_EPS))
            .ok_or_else(range_err)?;
        let first_pole = last_at_t0.checked_sub(p).ok_or_else(range_err)?;
        let last_pole = first_at_t1.checked_sub(1).ok_or_else(range_err)?;
        if last_pole < first_pole {
            return Err(range_err());
        }

        let mut knots = vec![t0; p + 1];
        knots.extend_from_slice(&curve.knots[last_at_t0 + 1..first_at_t1]);
        knots.extend(std::iter::repeat_n(t1, p + 1));
        Self::new(
            p,
            curve.control_points[first_pole..=last_pole].to_vec(),
            curve.weights[first_pole..=last_pole].to_vec(),
            knots,
        )
    }

    /// Parameter of the curve point closest to `point`: a sampled seed
    /// refined by Newton steps on the squared distance.
    pub fn parameter(&self, point: &Point3d) -> f64 {
        const SEED_SAMPLES: usize = 32;
        const MAX_ITERATIONS: usize = 50;

        let (start, end) = self.domain();
        let mut t = start;
        let mut best_dist = f64::INFINITY;
        for i in 0..=SEED_SAMPLES {
            let s = start + (end - start) * i as f64 / SEED_SAMPLES as f64;
            let d = self.evaluate(s).distance_to(point);
            if d < best_dist {
                best_dist = d;
                t = s;
            }
        }

        for _ in 0..MAX_ITERATIONS {
            let f = self.evaluate(t) - *point;
            let d = self.derivative(t);
            let speed = d.length_squared();
            if speed < 1e-30 {
                debug!(t, "zero curve speed during inverse projection");
                break;
            }
            let delta = -f.dot(&d) / speed;
            t = (t + delta).clamp(start, end);
            if delta.abs() < 1e-14 {
                break;
            }
        }
        t
    }

    /// Same curve traversed backwards over the same domain.
    pub fn reversed(&self) -> Self {
        let (start, end) = self.domain();
        Self {
            degree: self.degree,
            control_points: self.control_points.iter().rev().copied().collect(),
            weights: self.weights.iter().rev().copied().collect(),
            knots: self.knots.iter().rev().map(|k| start + end - k).collect(),
        }
    }
}

/// A tensor-product rational B-spline surface.
///
/// Control points are row-major: `index = v_index * num_u + u_index`, so a
/// row of the net runs along u.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NurbsSurface {
    pub degree_u: usize,
    pub degree_v: usize,
    pub control_points: Vec<Point3d>,
    pub weights: Vec<f64>,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub num_u: usize,
    pub num_v: usize,
}

impl NurbsSurface {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        control_points: Vec<Point3d>,
        weights: Vec<f64>,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        num_u: usize,
        num_v: usize,
    ) -> Result<Self, SplineError> {
        check_len("control net size", num_u * num_v, control_points.len())?;
        check_len("weight count", control_points.len(), weights.len())?;
        check_len("u knot vector length", num_u + degree_u + 1, knots_u.len())?;
        check_len("v knot vector length", num_v + degree_v + 1, knots_v.len())?;
        Ok(Self {
            degree_u,
            degree_v,
            control_points,
            weights,
            knots_u,
            knots_v,
            num_u,
            num_v,
        })
    }

    /// Build from a row-major pole net `num_u` wide and `num_v` tall.
    pub fn from_poles(
        degrees: (usize, usize),
        poles: &[Pole],
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        num_u: usize,
        num_v: usize,
    ) -> Result<Self, SplineError> {
        Self::new(
            degrees.0,
            degrees.1,
            poles.iter().map(|p| p.point).collect(),
            poles.iter().map(|p| p.weight).collect(),
            knots_u,
            knots_v,
            num_u,
            num_v,
        )
    }

    pub fn domain_u(&self) -> (f64, f64) {
        (
            self.knots_u[self.degree_u],
            self.knots_u[self.knots_u.len() - self.degree_u - 1],
        )
    }

    pub fn domain_v(&self) -> (f64, f64) {
        (
            self.knots_v[self.degree_v],
            self.knots_v[self.knots_v.len() - self.degree_v - 1],
        )
    }

    fn point_and_tangents(&self, u: f64, v: f64) -> (Point3d, Vec3, Vec3) {
        let (u0, u1) = self.domain_u();
        let (v0, v1) = self.domain_v();
        let u = u.clamp(u0, u1);
        let v = v.clamp(v0, v1);
        let span_u = find_span(&self.knots_u, self.degree_u, self.num_u, u);
        let span_v = find_span(&self.knots_v, self.degree_v, self.num_v, v);
        let (nu, dnu) = basis_with_derivatives(&self.knots_u, span_u, u, self.degree_u);
        let (nv, dnv) = basis_with_derivatives(&self.knots_v, span_v, v, self.degree_v);

        let mut a = Vec3::ZERO;
        let mut a_u = Vec3::ZERO;
        let mut a_v = Vec3::ZERO;
        let (mut w, mut w_u, mut w_v) = (0.0, 0.0, 0.0);
        for j in 0..=self.degree_v {
            let v_idx = span_v - self.degree_v + j;
            for i in 0..=self.degree_u {
                let u_idx = span_u - self.degree_u + i;
                let idx = v_idx * self.num_u + u_idx;
                let wi = self.weights[idx];
                let cp = self.control_points[idx].to_vec3() * wi;
                a = a + cp * (nu[i] * nv[j]);
                a_u = a_u + cp * (dnu[i] * nv[j]);
                a_v = a_v + cp * (nu[i] * dnv[j]);
                w += nu[i] * nv[j] * wi;
                w_u += dnu[i] * nv[j] * wi;
                w_v += nu[i] * dnv[j] * wi;
            }
        }
        let s = a / w;
        (
            Point3d::ORIGIN + s,
            (a_u - s * w_u) / w,
            (a_v - s * w_v) / w,
        )
    }

    /// Evaluate the surface at (u, v).
    pub fn evaluate(&self, u: f64, v: f64) -> Point3d {
        self.point_and_tangents(u, v).0
    }

    /// Partial derivatives `(dS/du, dS/dv)` at (u, v).
    pub fn tangents(&self, u: f64, v: f64) -> (Vec3, Vec3) {
        let (_, su, sv) = self.point_and_tangents(u, v);
        (su, sv)
    }

    /// Unit normal `Su x Sv`, `None` where the surface is singular.
    pub fn normal(&self, u: f64, v: f64) -> Option<Vec3> {
        let (su, sv) = self.tangents(u, v);
        su.cross(&sv).normalized()
    }

    fn row_curve(&self, row: usize) -> Result<NurbsCurve, SplineError> {
        let range = row * self.num_u..(row + 1) * self.num_u;
        NurbsCurve::new(
            self.degree_u,
            self.control_points[range.clone()].to_vec(),
            self.weights[range].to_vec(),
            self.knots_u.clone(),
        )
    }

    /// The patch over `[u0, u1] x [v0, v1]`, keeping the parameterization.
    ///
    /// Rows are cut along u first, then every resulting column along v.
    pub fn segment(&self, u0: f64, u1: f64, v0: f64, v1: f64) -> Result<Self, SplineError> {
        let rows = (0..self.num_v)
            .map(|row| self.row_curve(row)?.segment(u0, u1))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first_row) = rows.first() else {
            return Err(SplineError::Dimension {
                what: "control net rows",
                expected: self.degree_v + 1,
                found: 0,
            });
        };
        let num_u = first_row.num_control_points();
        let knots_u = first_row.knots.clone();

        let columns = (0..num_u)
            .map(|col| {
                let column = NurbsCurve::new(
                    self.degree_v,
                    rows.iter().map(|r| r.control_points[col]).collect(),
                    rows.iter().map(|r| r.weights[col]).collect(),
                    self.knots_v.clone(),
                )?;
                column.segment(v0, v1)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let num_v = columns[0].num_control_points();
        let knots_v = columns[0].knots.clone();

        let mut control_points = Vec::with_capacity(num_u * num_v);
        let mut weights = Vec::with_capacity(num_u * num_v);
        for row in 0..num_v {
            for column in &columns {
                control_points.push(column.control_points[row]);
                weights.push(column.weights[row]);
            }
        }
        Self::new(
            self.degree_u,
            self.degree_v,
            control_points,
            weights,
            knots_u,
            knots_v,
            num_u,
            num_v,
        )
    }

    /// Parameters of the surface point closest to `point`: a sampled seed
    /// refined by Gauss-Newton.
    pub fn parameter(&self, point: &Point3d) -> (f64, f64) {
        const SEED_SAMPLES: usize = 8;
        const MAX_ITERATIONS: usize = 50;

        let (u0, u1) = self.domain_u();
        let (v0, v1) = self.domain_v();
        let mut best = (u0, v0);
        let mut best_dist = f64::INFINITY;
        for i in 0..=SEED_SAMPLES {
            for j in 0..=SEED_SAMPLES {
                let u = u0 + (u1 - u0) * i as f64 / SEED_SAMPLES as f64;
                let v = v0 + (v1 - v0) * j as f64 / SEED_SAMPLES as f64;
                let d = self.evaluate(u, v).distance_to(point);
                if d < best_dist {
                    best_dist = d;
                    best = (u, v);
                }
            }
        }

        let (mut u, mut v) = best;
        for _ in 0..MAX_ITERATIONS {
            let (s, su, sv) = self.point_and_tangents(u, v);
            let f = s - *point;
            let jtj = Matrix2::new(su.dot(&su), su.dot(&sv), su.dot(&sv), sv.dot(&sv));
            let rhs = Vector2::new(-su.dot(&f), -sv.dot(&f));
            let Some(inv) = jtj.try_inverse() else {
                debug!(u, v, "singular surface tangents during inverse projection");
                break;
            };
            let delta = inv * rhs;
            u = (u + delta[0]).clamp(u0, u1);
            v = (v + delta[1]).clamp(v0, v1);
            if delta.norm() < 1e-14 {
                break;
            }
        }
        (u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc_like_cubic() -> NurbsCurve {
        NurbsCurve::new(
            3,
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 2.0, 0.0),
                Point3d::new(3.0, 3.0, 1.0),
                Point3d::new(5.0, 2.0, 0.0),
            ],
            vec![1.0, 0.8, 1.2, 1.0],
            bezier_knots(3),
        )
        .unwrap()
    }

    fn same_shape(a: &NurbsCurve, b: &NurbsCurve) {
        for i in 0..=20 {
            let t = i as f64 / 20.0;
            let d = a.evaluate(t).distance_to(&b.evaluate(t));
            assert!(d < 1e-10, "curves differ by {} at t={}", d, t);
        }
    }

    #[test]
    fn test_new_rejects_bad_knot_count() {
        let err = NurbsCurve::new(
            3,
            vec![Point3d::ORIGIN; 4],
            vec![1.0; 4],
            vec![0.0, 0.0, 1.0, 1.0],
        )
        .unwrap_err();
        assert!(matches!(err, SplineError::Dimension { expected: 8, found: 4, .. }));
    }

    #[test]
    fn test_bezier_endpoints_interpolate() {
        let c = arc_like_cubic();
        assert!(c.evaluate(0.0).distance_to(&c.control_points[0]) < 1e-12);
        assert!(c.evaluate(1.0).distance_to(&c.control_points[3]) < 1e-12);
    }

    #[test]
    fn test_nurbs_circle_via_rational() {
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let c = NurbsCurve::new(
            2,
            vec![
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(1.0, 1.0, 0.0),
                Point3d::new(0.0, 1.0, 0.0),
            ],
            vec![1.0, w, 1.0],
            bezier_knots(2),
        )
        .unwrap();
        for i in 0..=20 {
            let p = c.evaluate(i as f64 / 20.0);
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!((r - 1.0).abs() < 1e-10, "radius {} at sample {}", r, i);
        }
        let quarter = c.arc_length(0.0, 1.0);
        assert!((quarter - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_derivative_matches_bezier_end_tangent() {
        let c = NurbsCurve::from_poles(
            3,
            &[
                Pole::unit(Point3d::new(0.0, 0.0, 0.0)),
                Pole::unit(Point3d::new(1.0, 1.0, 0.0)),
                Pole::unit(Point3d::new(2.0, 1.0, 0.0)),
                Pole::unit(Point3d::new(3.0, 0.0, 0.0)),
            ],
            bezier_knots(3),
        )
        .unwrap();
        let d = c.derivative(0.0);
        assert!((d - Vec3::new(3.0, 3.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_insert_knot_keeps_shape() {
        let c = arc_like_cubic();
        let refined = c.insert_knot(1.0 / 3.0).unwrap().insert_knot(2.0 / 3.0).unwrap();
        assert_eq!(refined.num_control_points(), 6);
        assert_eq!(refined.knots.len(), 10);
        same_shape(&c, &refined);
        assert!(refined.control_points[0].distance_to(&c.control_points[0]) < 1e-12);
        assert!(refined.control_points[5].distance_to(&c.control_points[3]) < 1e-12);
    }

    #[test]
    fn test_insert_knot_outside_domain_fails() {
        let c = arc_like_cubic();
        assert!(matches!(
            c.insert_knot(1.0),
            Err(SplineError::KnotOutsideDomain { .. })
        ));
    }

    #[test]
    fn test_increase_degree_keeps_shape() {
        let quad = NurbsCurve::from_poles(
            2,
            &[
                Pole::unit(Point3d::new(0.0, 0.0, 0.0)),
                Pole::new(Point3d::new(1.0, 1.0, 0.0), 0.7),
                Pole::unit(Point3d::new(2.0, 0.0, 0.0)),
            ],
            bezier_knots(2),
        )
        .unwrap();
        let cubic = quad.increase_degree(3).unwrap();
        assert_eq!(cubic.degree, 3);
        assert_eq!(cubic.num_control_points(), 4);
        same_shape(&quad, &cubic);
    }

    #[test]
    fn test_increase_degree_rejects_multi_segment() {
        let c = arc_like_cubic().insert_knot(0.5).unwrap();
        assert!(matches!(
            c.increase_degree(4),
            Err(SplineError::NotSingleSegment { interior: 1 })
        ));
    }

    #[test]
    fn test_segment_matches_parent() {
        let c = arc_like_cubic();
        let seg = c.segment(0.0, 0.6).unwrap();
        assert_eq!(seg.num_control_points(), 4);
        assert_eq!(seg.domain(), (0.0, 0.6));
        for i in 0..=10 {
            let t = 0.06 * i as f64;
            assert!(seg.evaluate(t).distance_to(&c.evaluate(t)) < 1e-10);
        }
        assert!(seg.control_points[3].distance_to(&c.evaluate(0.6)) < 1e-10);
    }

    #[test]
    fn test_segment_of_six_pole_curve() {
        let c = arc_like_cubic().insert_knot(1.0 / 3.0).unwrap().insert_knot(2.0 / 3.0).unwrap();
        let seg = c.segment(0.2, 0.9).unwrap();
        assert!(seg.control_points[0].distance_to(&c.evaluate(0.2)) < 1e-10);
        assert!(seg.control_points.last().unwrap().distance_to(&c.evaluate(0.9)) < 1e-10);
        assert!(seg.evaluate(0.5).distance_to(&c.evaluate(0.5)) < 1e-10);
    }

    #[test]
    fn test_reversed_runs_backwards() {
        let c = arc_like_cubic();
        let r = c.reversed();
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            assert!(r.evaluate(t).distance_to(&c.evaluate(1.0 - t)) < 1e-10);
        }
    }

    #[test]
    fn test_curve_parameter_inverts_evaluate() {
        let c = arc_like_cubic();
        for t in [0.0, 0.27, 0.5, 0.81, 1.0] {
            let found = c.parameter(&c.evaluate(t));
            assert!((found - t).abs() < 1e-8, "{found} vs {t}");
        }
        // off-curve points project onto the nearest end
        assert!(c.parameter(&Point3d::new(-5.0, -5.0, 0.0)).abs() < 1e-12);
    }

    #[test]
    fn test_curve_parameter_on_shifted_domain() {
        let c = NurbsCurve::from_poles(
            1,
            &[Pole::unit(Point3d::ORIGIN), Pole::unit(Point3d::new(4.0, 0.0, 0.0))],
            vec![2.0, 2.0, 6.0, 6.0],
        )
        .unwrap();
        assert!((c.parameter(&Point3d::new(1.0, 3.0, 0.0)) - 3.0).abs() < 1e-12);
    }

    fn saddle() -> NurbsSurface {
        let mut poles = Vec::new();
        for row in 0..4 {
            for col in 0..4 {
                let z = if (row == 1 || row == 2) && (col == 1 || col == 2) { 0.5 } else { 0.0 };
                poles.push(Pole::unit(Point3d::new(col as f64, row as f64, z)));
            }
        }
        NurbsSurface::from_poles((3, 3), &poles, bezier_knots(3), bezier_knots(3), 4, 4).unwrap()
    }

    #[test]
    fn test_surface_corners_and_tangents() {
        let s = saddle();
        assert!(s.evaluate(0.0, 0.0).distance_to(&Point3d::ORIGIN) < 1e-12);
        assert!(s.evaluate(1.0, 0.0).distance_to(&Point3d::new(3.0, 0.0, 0.0)) < 1e-12);
        assert!(s.evaluate(0.0, 1.0).distance_to(&Point3d::new(0.0, 3.0, 0.0)) < 1e-12);
        let (su, sv) = s.tangents(0.0, 0.0);
        assert!((su - Vec3::new(3.0, 0.0, 0.0)).length() < 1e-12);
        assert!((sv - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-12);
        let n = s.normal(0.0, 0.0).unwrap();
        assert!((n - Vec3::Z).length() < 1e-12);
    }

    #[test]
    fn test_surface_segment_matches_parent() {
        let s = saddle();
        let seg = s.segment(0.2, 0.7, 0.1, 0.9).unwrap();
        assert_eq!((seg.num_u, seg.num_v), (4, 4));
        assert_eq!(seg.domain_u(), (0.2, 0.7));
        assert_eq!(seg.domain_v(), (0.1, 0.9));
        for (u, v) in [(0.2, 0.1), (0.45, 0.5), (0.7, 0.9), (0.3, 0.8)] {
            assert!(seg.evaluate(u, v).distance_to(&s.evaluate(u, v)) < 1e-10);
        }
        assert!(seg.control_points[0].distance_to(&s.evaluate(0.2, 0.1)) < 1e-10);
        assert!(seg.control_points[15].distance_to(&s.evaluate(0.7, 0.9)) < 1e-10);
    }

    #[test]
    fn test_surface_segment_of_rational_net() {
        let mut s = saddle();
        s.weights[5] = 2.0;
        s.weights[10] = 0.5;
        let seg = s.segment(0.0, 1.0, 0.25, 0.75).unwrap();
        assert_eq!(seg.domain_u(), (0.0, 1.0));
        for (u, v) in [(0.0, 0.25), (0.5, 0.5), (0.9, 0.6)] {
            assert!(seg.evaluate(u, v).distance_to(&s.evaluate(u, v)) < 1e-10);
        }
    }

    #[test]
    fn test_surface_segment_rejects_empty_range() {
        assert!(matches!(
            saddle().segment(0.5, 0.5, 0.0, 1.0),
            Err(SplineError::EmptyRange { .. })
        ));
    }

    #[test]
    fn test_surface_parameter_inverts_evaluate() {
        let s = saddle();
        let p = s.evaluate(0.3, 0.7);
        let (u, v) = s.parameter(&p);
        assert!(s.evaluate(u, v).distance_to(&p) < 1e-9);
        assert!((u - 0.3).abs() < 1e-6);
        assert!((v - 0.7).abs() < 1e-6);
    }
}
