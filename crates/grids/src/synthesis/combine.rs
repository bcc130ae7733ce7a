//! Corner sub-grids between neighbouring 6x4 grids and their assembly into
//! a full 6x6 grid.

use cad_spline::{Pole, Vec3};
use tracing::{debug, instrument};

use crate::Tolerance;
use crate::error::GridError;
use crate::grid::{Grid64, Grid66, SubGrid33};

/// Corner indices of a Grid64 in the order corner numbers refer to.
const GRID64_CORNERS: [usize; 4] = [0, 5, 18, 23];

fn common_corner(g0: &Grid64, g1: &Grid64, tol: f64) -> Option<(usize, usize)> {
    (0..4)
        .flat_map(|i| (0..4).map(move |j| (i, j)))
        .find(|&(i, j)| {
            g0[GRID64_CORNERS[i]]
                .point
                .coincident(&g1[GRID64_CORNERS[j]].point, tol)
        })
}

/// Corner-focused 3x3 sub-grid where two Grid64s meet.
///
/// `g0` supplies the v direction (one of its four-pole columns at corner 0 or
/// 3), `g1` the u direction (its six-pole row at corner 1 or 2). The pair is
/// swapped first when passed the other way round. Interior poles extend the
/// cross-boundary legs scaled by the ratio of the two tangent lengths;
/// `adjust` nudges `p22` along the two edges.
#[instrument(skip(g0, g1))]
pub fn subgrid33_from_grid64s(
    g0: &Grid64,
    g1: &Grid64,
    adjust: [f64; 2],
    tol: &Tolerance,
) -> Result<SubGrid33, GridError> {
    let (mut g0, mut g1) = (g0, g1);
    let (mut i, mut j) = common_corner(g0, g1, tol.coincidence).ok_or(GridError::NoCommonCorner)?;
    if matches!(i, 1 | 2) && matches!(j, 0 | 3) {
        debug!(i, j, "swapping grid order");
        std::mem::swap(&mut g0, &mut g1);
        (i, j) = (j, i);
    }

    let pick = |g: &Grid64, idx: [usize; 3]| idx.map(|k| g[k]);
    let (v0, v1) = match i {
        0 => (pick(g0, [0, 1, 2]), pick(g0, [6, 7, 8])),
        3 => (pick(g0, [23, 22, 21]), pick(g0, [17, 16, 15])),
        _ => return Err(GridError::UnsupportedCorner { first: i, second: j }),
    };
    let (u0, u1) = match j {
        1 => (pick(g1, [5, 4, 3]), pick(g1, [11, 10, 9])),
        2 => (pick(g1, [18, 19, 20]), pick(g1, [12, 13, 14])),
        _ => return Err(GridError::UnsupportedCorner { first: i, second: j }),
    };

    let leg = |a: &Pole, b: &Pole| b.point - a.point;
    let u_tan_ratio = leg(&u0[0], &u0[1]).length() / leg(&v0[0], &v1[0]).length();
    let v_tan_ratio = leg(&v0[0], &v0[1]).length() / leg(&u0[0], &u1[0]).length();

    let p00 = u0[0].point;
    let p01 = u0[1].point;
    let p02 = u0[2].point;
    let p10 = v0[1].point;
    let p20 = v0[2].point;
    let p11_u = p01 + leg(&u1[1], &u0[1]) * v_tan_ratio;
    let p12 = p02 + leg(&u1[2], &u0[2]) * v_tan_ratio;
    let p11_v = p10 + leg(&v1[1], &v0[1]) * u_tan_ratio;
    let p21 = p20 + leg(&v1[2], &v0[2]) * u_tan_ratio;
    let p11 = p11_u.midpoint(&p11_v);
    let p22_u = p12 + (p21 - p11);
    let p22_v = p21 + (p12 - p11);
    let nudge: Vec3 = (p01 - p00) * adjust[0] + (p10 - p00) * adjust[1];
    let p22 = p22_u.midpoint(&p22_v) + nudge;

    let (w01, w02) = (u0[1].weight, u0[2].weight);
    let (w10, w20) = (v0[1].weight, v0[2].weight);
    Ok(SubGrid33::from_poles(vec![
        u0[0],
        u0[1],
        u0[2],
        v0[1],
        Pole::new(p11, w01 * w10),
        Pole::new(p12, w02 * w10),
        v0[2],
        Pole::new(p21, w01 * w20),
        Pole::new(p22, w02 * w20),
    ])?)
}

/// Source of each Grid66 pole as `(sub-grid, pole index)`, row-major.
const SUBGRID_LAYOUT: [[(usize, usize); 6]; 6] = [
    [(0, 0), (0, 1), (0, 2), (1, 6), (1, 3), (1, 0)],
    [(0, 3), (0, 4), (0, 5), (1, 7), (1, 4), (1, 1)],
    [(0, 6), (0, 7), (0, 8), (1, 8), (1, 5), (1, 2)],
    [(3, 2), (3, 5), (3, 8), (2, 8), (2, 7), (2, 6)],
    [(3, 1), (3, 4), (3, 7), (2, 5), (2, 4), (2, 3)],
    [(3, 0), (3, 3), (3, 6), (2, 2), (2, 1), (2, 0)],
];

/// Assemble a Grid66 from four corner sub-grids, one per corner in the
/// order (0,0), (0,5), (5,5), (5,0). Each sub-grid has its own corner at
/// index 0.
pub fn grid66_from_subgrids(subs: &[SubGrid33; 4]) -> Grid66 {
    let mut g = Grid66::filled(subs[0][0]);
    for (row, sources) in SUBGRID_LAYOUT.iter().enumerate() {
        for (col, &(s, k)) in sources.iter().enumerate() {
            g.set(row, col, subs[s][k]);
        }
    }
    g
}
