use cad_spline::Pole;
use tracing::instrument;

use crate::Tolerance;
use crate::error::GridError;
use crate::grid::Grid44;
use crate::orient::oriented;
use crate::poly::Poly4;

/// Grid44 bounded by four cubic edges that close into a loop.
///
/// Edges are oriented head to tail (p0 to p1, p1 to p2, p2 to p3, p3 to p0).
/// Row 0 is p0, column 3 is p1, row 3 is p2 run backwards and column 0 is p3
/// run backwards. Each interior pole completes the parallelogram on its
/// nearest corner.
#[instrument(skip_all)]
pub fn build_grid44(
    p0: &Poly4,
    p1: &Poly4,
    p2: &Poly4,
    p3: &Poly4,
    tol: &Tolerance,
) -> Result<Grid44, GridError> {
    let quad12 = oriented(p0, p1, tol.coincidence)?;
    let quad23 = oriented(p1, p2, tol.coincidence)?;
    let quad34 = oriented(p2, p3, tol.coincidence)?;
    let quad41 = oriented(p3, p0, tol.coincidence)?;

    let mut g = Grid44::filled(quad12.first());
    g.set_row(0, *quad12.poles());
    g.set(1, 3, quad23[1]);
    g.set(2, 3, quad23[2]);
    g.set(3, 3, quad23[3]);
    g.set(3, 2, quad34[1]);
    g.set(3, 1, quad34[2]);
    g.set(3, 0, quad34[3]);
    g.set(2, 0, quad41[1]);
    g.set(1, 0, quad41[2]);

    let p = |r, c| g.point(r, c);
    let w = |r, c| g.weight(r, c);
    let p11 = p(0, 0) + (p(0, 1) - p(0, 0)) + (p(1, 0) - p(0, 0));
    let p12 = p(0, 3) + (p(0, 2) - p(0, 3)) + (p(1, 3) - p(0, 3));
    let p21 = p(3, 0) + (p(3, 1) - p(3, 0)) + (p(2, 0) - p(3, 0));
    let p22 = p(3, 3) + (p(2, 3) - p(3, 3)) + (p(3, 2) - p(3, 3));
    let w11 = w(0, 1) * w(2, 0);
    let w12 = w(0, 2) * w(1, 3);
    let w21 = w(3, 2) * w(1, 0);
    let w22 = w(2, 3) * w(3, 1);

    g.set(1, 1, Pole::new(p11, w11));
    g.set(1, 2, Pole::new(p12, w12));
    g.set(2, 1, Pole::new(p21, w21));
    g.set(2, 2, Pole::new(p22, w22));
    Ok(g)
}

/// Rotate a Grid44 counter-clockwise by `steps` quarter turns
/// (`new[i][j] = old[j][3 - i]`), `steps` taken mod 4.
pub fn rotate_grid44(grid: &Grid44, steps: usize) -> Grid44 {
    let mut out = grid.clone();
    for _ in 0..steps % 4 {
        let prev = out.clone();
        for i in 0..4 {
            for j in 0..4 {
                out.set(i, j, prev.get(j, 3 - i));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flat_loop, straight};
    use cad_spline::Point3d;

    #[test]
    fn test_boundaries_interpolate_inputs() {
        let [a, b, c, d] = flat_loop();
        let g = build_grid44(&a, &b, &c, &d, &Tolerance::default()).unwrap();
        assert_eq!(g.row(0), *a.poles());
        assert_eq!(g.column(3), *b.poles());
        // row 3 is c reversed
        assert_eq!(g.row(3), *c.reversed().poles());
        assert_eq!(g.column(0), *d.reversed().poles());
    }

    #[test]
    fn test_flat_square_interior_is_regular() {
        let [a, b, c, d] = flat_loop();
        let g = build_grid44(&a, &b, &c, &d, &Tolerance::default()).unwrap();
        assert!(g.point(1, 1).distance_to(&Point3d::new(1.0, 1.0, 0.0)) < 1e-12);
        assert!(g.point(1, 2).distance_to(&Point3d::new(2.0, 1.0, 0.0)) < 1e-12);
        assert!(g.point(2, 1).distance_to(&Point3d::new(1.0, 2.0, 0.0)) < 1e-12);
        assert!(g.point(2, 2).distance_to(&Point3d::new(2.0, 2.0, 0.0)) < 1e-12);
    }

    #[test]
    fn test_input_direction_does_not_matter() {
        let [a, b, c, d] = flat_loop();
        let tol = Tolerance::default();
        let g = build_grid44(&a, &b, &c, &d, &tol).unwrap();
        let flipped = build_grid44(&a, &b.reversed(), &c.reversed(), &d, &tol).unwrap();
        assert_eq!(g, flipped);
    }

    #[test]
    fn test_interior_weights_multiply_edge_weights() {
        let [a, b, c, d] = flat_loop();
        let mut poles = *a.poles();
        poles[1].weight = 2.0;
        let a = Poly4::new(poles);
        let mut poles = *d.poles();
        poles[1].weight = 3.0; // d runs from (0,3) down to the origin; becomes p20
        let d = Poly4::new(poles);
        let g = build_grid44(&a, &b, &c, &d, &Tolerance::default()).unwrap();
        assert!((g.weight(2, 0) - 3.0).abs() < 1e-12);
        assert!((g.weight(1, 1) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_open_loop_fails() {
        let [a, b, c, _] = flat_loop();
        let stray = straight(Point3d::new(10.0, 10.0, 0.0), Point3d::new(11.0, 10.0, 0.0));
        assert!(matches!(
            build_grid44(&a, &b, &c, &stray, &Tolerance::default()),
            Err(GridError::NoSharedEndpoint { .. })
        ));
    }

    #[test]
    fn test_rotate_moves_corner() {
        let [a, b, c, d] = flat_loop();
        let g = build_grid44(&a, &b, &c, &d, &Tolerance::default()).unwrap();
        let r = rotate_grid44(&g, 1);
        // new[0][0] = old[0][3]
        assert_eq!(r.get(0, 0), g.get(0, 3));
        assert_eq!(r.get(3, 0), g.get(0, 0));
        assert_eq!(rotate_grid44(&g, 4), g);
        assert_eq!(rotate_grid44(&g, 5), r);
        assert_eq!(rotate_grid44(&rotate_grid44(&g, 3), 1), g);
    }
}
