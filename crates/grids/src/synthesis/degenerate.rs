//! Grids with one edge collapsed onto an apex.

use cad_spline::{Point3d, Pole};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::GridConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Outcome};
use crate::error::GridError;
use crate::grid::{Grid44, Grid64};
use crate::orient::oriented;
use crate::poly::{Poly4, Poly6};

/// Placement of the interior poles next to a collapsed edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegenerateMode {
    /// Parallelogram completion; `p21` coincides with `p11`.
    #[default]
    Naive,
    /// `p11` and `p21` fan out in the apex tangent plane, one per row.
    Rotate,
}

/// Triangular Grid44 from three edges. Column 0 collapses onto `p00`.
#[instrument(skip_all, fields(?mode))]
pub fn build_grid44_degenerate(
    p0: &Poly4,
    p1: &Poly4,
    p2: &Poly4,
    mode: DegenerateMode,
    config: &GridConfig,
) -> Result<Outcome<Grid44>, GridError> {
    let tol = config.tolerance.coincidence;
    let quad12 = oriented(p0, p1, tol)?;
    let quad23 = oriented(p1, p2, tol)?;
    let quad31 = oriented(p2, p0, tol)?;

    let mut diagnostics = Diagnostics::new();
    let gap = quad31.last().point.distance_to(&quad12.first().point);
    if gap > tol {
        diagnostics.push(
            Diagnostic::warning(DiagnosticCode::OpenTriangle, "edge loop does not form a triangle")
                .with_value(gap)
                .with_tolerance(tol),
        );
    }

    let apex = quad12.first().point;
    let collapsed = config.collapsed_weight;
    let mut g = Grid44::filled(Pole::new(apex, collapsed));
    g.set_row(0, *quad12.poles());
    g.set(1, 3, quad23[1]);
    g.set(2, 3, quad23[2]);
    g.set(3, 3, quad23[3]);
    g.set(3, 2, quad31[1]);
    g.set(3, 1, quad31[2]);
    g.set(3, 0, Pole::new(apex, quad31[3].weight));

    let p = |r, c| g.point(r, c);
    let w = |r, c| g.weight(r, c);
    let naive11 = p(0, 1) + (p(3, 1) - p(3, 0));
    let p12 = p(0, 2) + (p(1, 3) - p(0, 3));
    let p22 = p(2, 3) + (p(3, 2) - p(3, 3));
    let (p11, p21) = match mode {
        DegenerateMode::Naive => (naive11, naive11),
        DegenerateMode::Rotate => match fan_from_apex(&g) {
            Some(pair) => pair,
            None => {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::RotateFallback,
                    "apex tangent plane undefined, using naive interior",
                ));
                (naive11, naive11)
            }
        },
    };
    let w11 = w(0, 1) * w(1, 0);
    let w12 = w(0, 2) * w(1, 3);
    let w21 = w(3, 1) * w(2, 0);
    let w22 = w(2, 3) * w(3, 1);

    g.set(1, 1, Pole::new(p11, w11));
    g.set(1, 2, Pole::new(p12, w12));
    g.set(2, 1, Pole::new(p21, w21));
    g.set(2, 2, Pole::new(p22, w22));
    Ok(Outcome::new(g, diagnostics))
}

/// Rotate-mode `(p11, p21)`. The apex tangent plane is spanned by the two
/// edges leaving the apex; row `i` points toward its column-3 pole within
/// that plane, at a length blended from the two apex legs.
///
/// The length runs linearly from the row-0 leg to the row-3 leg, so each
/// fanned pole is as far from the apex as the edge leg it sits next to. On a
/// patch with equal apex legs, such as a sphere octant, both poles land on
/// the circle of that radius and the fan stays symmetric.
fn fan_from_apex(g: &Grid44) -> Option<(Point3d, Point3d)> {
    let apex = g.point(0, 0);
    let a = g.point(0, 1) - apex;
    let b = g.point(3, 1) - apex;
    let normal = a.cross(&b).normalized()?;

    let mut fanned = [apex; 2];
    for (slot, row) in fanned.iter_mut().zip([1usize, 2]) {
        let toward = (g.point(row, 3) - apex).reject_from(&normal);
        let dir = toward.normalized()?;
        let s = row as f64 / 3.0;
        let reach = a.length() * (1.0 - s) + b.length() * s;
        *slot = apex + dir * reach;
    }
    Some((fanned[0], fanned[1]))
}

/// Triangular Grid64: a six-pole edge on row 0 and two four-pole edges
/// meeting at an apex that row 3 collapses onto.
#[instrument(skip_all)]
pub fn build_grid64_degenerate(
    p4_0: &Poly4,
    p6_1: &Poly6,
    p4_2: &Poly4,
    config: &GridConfig,
) -> Result<Grid64, GridError> {
    let tol = config.tolerance.coincidence;
    let sext12 = oriented(p6_1, p4_2, tol)?;
    let quad23 = oriented(p4_2, p4_0, tol)?;
    let quad31 = oriented(p4_0, p6_1, tol)?;

    let apex = quad23.last();
    let mut g = Grid64::filled(Pole::new(apex.point, config.collapsed_weight));
    g.set_row(0, *sext12.poles());
    g.set(1, 5, quad23[1]);
    g.set(2, 5, quad23[2]);
    g.set(3, 5, apex);
    g.set(3, 0, Pole::new(apex.point, quad31[0].weight));
    g.set(2, 0, quad31[1]);
    g.set(1, 0, quad31[2]);

    let p = |r, c| g.point(r, c);
    let w = |r, c| g.weight(r, c);
    let p11 = p(0, 1) + (p(1, 0) - p(0, 0));
    let p14 = p(0, 4) + (p(1, 5) - p(0, 5));
    let p21 = p(2, 0) + (p(2, 5) - p(3, 5));
    // damped toward the apex so the collapsed row does not over-pull
    let row1 = [
        Pole::new(p11, w(0, 1) * w(1, 0) * 0.5),
        Pole::new(p11, w(0, 2) * w(1, 0) * 0.5),
        Pole::new(p14, w(0, 3) * w(1, 5) * 0.5),
        Pole::new(p14, w(0, 4) * w(1, 5) * 0.5),
    ];
    let row2 = [
        Pole::new(p21, w(3, 1) * w(2, 0) * 0.25),
        Pole::new(p21, w(3, 2) * w(2, 0) * 0.25),
        Pole::new(p21, w(3, 3) * w(2, 5) * 0.25),
        Pole::new(p21, w(3, 4) * w(2, 5) * 0.25),
    ];
    for (i, (r1, r2)) in row1.into_iter().zip(row2).enumerate() {
        g.set(1, i + 1, r1);
        g.set(2, i + 1, r2);
    }
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{straight, straight6};
    use cad_spline::Vec3;

    fn triangle() -> [Poly4; 3] {
        let o = Point3d::new(0.0, 0.0, 0.0);
        let x = Point3d::new(3.0, 0.0, 0.0);
        let y = Point3d::new(0.0, 3.0, 0.0);
        [straight(o, x), straight(x, y), straight(y, o)]
    }

    #[test]
    fn test_column_zero_collapses_exactly() {
        let [a, b, c] = triangle();
        let out = build_grid44_degenerate(&a, &b, &c, DegenerateMode::Naive, &GridConfig::default()).unwrap();
        assert!(out.is_exact());
        let g = out.value;
        for row in 0..4 {
            assert_eq!(g.point(row, 0), g.point(0, 0));
        }
        assert!((g.weight(1, 0) - 1.0).abs() < 1e-12);
        assert_eq!(g.point(1, 1), g.point(2, 1));
    }

    #[test]
    fn test_naive_interior_formulas() {
        let [a, b, c] = triangle();
        let g = build_grid44_degenerate(&a, &b, &c, DegenerateMode::Naive, &GridConfig::default())
            .unwrap()
            .value;
        // p11 = p01 + p31 - p30 = (1,0) + (0,1)
        assert!(g.point(1, 1).distance_to(&Point3d::new(1.0, 1.0, 0.0)) < 1e-12);
        // p12 = p02 + p13 - p03 = (2,0) + (-1,1)
        assert!(g.point(1, 2).distance_to(&Point3d::new(1.0, 1.0, 0.0)) < 1e-12);
    }

    #[test]
    fn test_collapsed_weight_is_configurable() {
        let [a, b, c] = triangle();
        let config = GridConfig {
            collapsed_weight: 0.5,
            ..GridConfig::default()
        };
        let g = build_grid44_degenerate(&a, &b, &c, DegenerateMode::Naive, &config).unwrap().value;
        assert!((g.weight(2, 0) - 0.5).abs() < 1e-12);
        assert!((g.weight(2, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_open_triangle_warns_but_builds() {
        let o = Point3d::new(0.0, 0.0, 0.0);
        let x = Point3d::new(3.0, 0.0, 0.0);
        let y = Point3d::new(0.0, 3.0, 0.0);
        let a = straight(o, x);
        let b = straight(x, y);
        // c starts at y but stops short of the apex; it still touches a's end
        // through its other endpoint, so orientation succeeds.
        let c = straight(y, x);
        let out = build_grid44_degenerate(&a, &b, &c, DegenerateMode::Naive, &GridConfig::default()).unwrap();
        assert!(out.diagnostics.has(DiagnosticCode::OpenTriangle));
    }

    #[test]
    fn test_rotate_separates_rows_in_tangent_plane() {
        let o = Point3d::new(0.0, 0.0, 0.0);
        let x = Point3d::new(3.0, 0.0, 0.0);
        let y = Point3d::new(0.0, 3.0, 0.0);
        let arch = Poly4::from_points([
            x,
            Point3d::new(2.0, 1.0, 1.0),
            Point3d::new(1.0, 2.0, 1.0),
            y,
        ]);
        let out = build_grid44_degenerate(
            &straight(o, x),
            &arch,
            &straight(y, o),
            DegenerateMode::Rotate,
            &GridConfig::default(),
        )
        .unwrap();
        assert!(out.is_exact());
        let g = out.value;
        let (p11, p21) = (g.point(1, 1), g.point(2, 1));
        assert!(p11.distance_to(&p21) > 1e-3);
        // apex tangent plane is z = 0
        assert!(p11.z.abs() < 1e-12 && p21.z.abs() < 1e-12);
        assert!(((p11 - o).length() - 1.0).abs() < 1e-12);
        // row 1 heads toward p13, which sits above (2, 1)
        let dir = (p11 - o).normalized().unwrap();
        assert!((dir - Vec3::new(2.0, 1.0, 0.0).normalized().unwrap()).length() < 1e-12);
    }

    #[test]
    fn test_rotate_on_sphere_octant_is_symmetric() {
        let k = 4.0 / 3.0 * (std::f64::consts::FRAC_PI_8).tan();
        let apex = Point3d::new(0.0, 0.0, 1.0);
        let x = Point3d::new(1.0, 0.0, 0.0);
        let y = Point3d::new(0.0, 1.0, 0.0);
        let meridian_x = Poly4::from_points([apex, Point3d::new(k, 0.0, 1.0), Point3d::new(1.0, 0.0, k), x]);
        let equator = Poly4::from_points([x, Point3d::new(1.0, k, 0.0), Point3d::new(k, 1.0, 0.0), y]);
        let meridian_y = Poly4::from_points([y, Point3d::new(0.0, 1.0, k), Point3d::new(0.0, k, 1.0), apex]);
        let out = build_grid44_degenerate(
            &meridian_x,
            &equator,
            &meridian_y,
            DegenerateMode::Rotate,
            &GridConfig::default(),
        )
        .unwrap();
        assert!(out.is_exact());
        let g = out.value;
        let (p11, p21) = (g.point(1, 1), g.point(2, 1));
        for p in [p11, p21] {
            assert!((p.z - 1.0).abs() < 1e-12);
            assert!((p.distance_to(&apex) - k).abs() < 1e-12);
        }
        assert!((p11.x - p21.y).abs() < 1e-12 && (p11.y - p21.x).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_falls_back_on_flat_apex() {
        let o = Point3d::new(0.0, 0.0, 0.0);
        let x = Point3d::new(3.0, 0.0, 0.0);
        let back = Point3d::new(-3.0, 0.0, 0.0);
        let out = build_grid44_degenerate(
            &straight(o, x),
            &Poly4::from_points([x, Point3d::new(3.0, 3.0, 0.0), Point3d::new(-3.0, 3.0, 0.0), back]),
            &straight(back, o),
            DegenerateMode::Rotate,
            &GridConfig::default(),
        )
        .unwrap();
        assert!(out.diagnostics.has(DiagnosticCode::RotateFallback));
        assert_eq!(out.value.point(1, 1), out.value.point(2, 1));
    }

    #[test]
    fn test_grid64_degenerate_collapses_row_three() {
        let o = Point3d::new(0.0, 0.0, 0.0);
        let x = Point3d::new(5.0, 0.0, 0.0);
        let apex = Point3d::new(2.5, 3.0, 0.0);
        let g = build_grid64_degenerate(
            &straight(apex, o),
            &straight6(o, x),
            &straight(x, apex),
            &GridConfig::default(),
        )
        .unwrap();
        for col in 0..6 {
            assert!(g.point(3, col).distance_to(&apex) < 1e-12);
        }
        assert_eq!(g.point(0, 0), o);
        assert_eq!(g.point(0, 5), x);
        assert_eq!(g.point(1, 1), g.point(1, 2));
        assert_eq!(g.point(2, 1), g.point(2, 4));
        assert!((g.weight(1, 1) - 0.5).abs() < 1e-12);
        assert!((g.weight(2, 2) - 0.25).abs() < 1e-12);
    }
}
