use cad_spline::Pole;
use tracing::instrument;

use super::grid44::rotate_grid44;
use crate::Tolerance;
use crate::error::GridError;
use crate::grid::{Grid44, Grid64};
use crate::orient::oriented;
use crate::poly::{Poly4, Poly6};

/// Grid64 bounded by two six-pole edges (rows 0 and 3) and two four-pole
/// edges (columns 5 and 0), oriented head to tail.
#[instrument(skip_all)]
pub fn build_grid64(
    p6_0: &Poly6,
    p4_1: &Poly4,
    p6_2: &Poly6,
    p4_3: &Poly4,
    tol: &Tolerance,
) -> Result<Grid64, GridError> {
    let sext12 = oriented(p6_0, p4_1, tol.coincidence)?;
    let quad23 = oriented(p4_1, p6_2, tol.coincidence)?;
    let sext34 = oriented(p6_2, p4_3, tol.coincidence)?;
    let quad41 = oriented(p4_3, p6_0, tol.coincidence)?;

    let mut g = Grid64::filled(sext12.first());
    g.set_row(0, *sext12.poles());
    for row in 1..4 {
        g.set(row, 5, quad23[row]);
    }
    for col in 0..5 {
        g.set(3, col, sext34[5 - col]);
    }
    g.set(2, 0, quad41[1]);
    g.set(1, 0, quad41[2]);

    let p = |r, c| g.point(r, c);
    let w = |r, c| g.weight(r, c);
    let interior = [
        (1, 1, p(0, 1) + (p(1, 0) - p(0, 0)), w(0, 1) * w(1, 0)),
        (1, 2, p(0, 2) + (p(1, 0) - p(0, 0)), w(0, 2) * w(1, 0)),
        (1, 3, p(0, 3) + (p(1, 5) - p(0, 5)), w(0, 3) * w(1, 5)),
        (1, 4, p(0, 4) + (p(1, 5) - p(0, 5)), w(0, 4) * w(1, 5)),
        (2, 1, p(3, 1) + (p(2, 0) - p(3, 0)), w(3, 1) * w(2, 0)),
        (2, 2, p(3, 2) + (p(2, 0) - p(3, 0)), w(3, 2) * w(2, 0)),
        (2, 3, p(3, 3) + (p(2, 5) - p(3, 5)), w(3, 3) * w(2, 5)),
        (2, 4, p(3, 4) + (p(2, 5) - p(3, 5)), w(3, 4) * w(2, 5)),
    ];
    for (r, c, point, weight) in interior {
        g.set(r, c, Pole::new(point, weight));
    }
    Ok(g)
}

/// Round one corner of a Grid44 into a triangular Grid64.
///
/// The grid is first turned `corner` quarter turns (mod 4). Row 0 of the
/// result runs down the input column 0 and across row 0; row 3 collapses
/// onto the opposite corner. The tangents into the rounded corner are
/// trimmed to half length and the next poles continue along the same line,
/// so the inner legs carry no curvature.
pub fn grid64_from_grid44_corner(grid: &Grid44, corner: usize) -> Grid64 {
    let s = rotate_grid44(grid, corner);
    let sp = |i: usize| s[i].point;
    let sw = |i: usize| s[i].weight;

    let inner = sp(10);
    let p11 = sp(9);
    let p14 = sp(6);
    let p20 = sp(14);
    let p25 = sp(11);
    let p21 = p20 + (inner - p20) * 0.5;
    let p22 = p21 + (inner - p21) * 0.5;
    let p24 = p25 + (inner - p25) * 0.5;
    let p23 = p24 + (inner - p24) * 0.5;
    let p12 = sp(5).midpoint(&p11);
    let p13 = sp(5).midpoint(&p14);

    let mut g = Grid64::filled(Pole::new(sp(15), sw(15)));
    for (col, i) in [12, 8, 4, 1, 2, 3].into_iter().enumerate() {
        g.set(0, col, s[i]);
    }
    g.set(1, 0, s[13]);
    g.set(1, 1, s[9]);
    g.set(1, 4, s[6]);
    g.set(1, 5, s[7]);
    g.set(2, 0, s[14]);
    g.set(2, 5, s[11]);
    for (col, point) in [(1, p21), (2, p22), (3, p23), (4, p24)] {
        g.set(2, col, Pole::new(point, sw(10)));
    }
    g.set(1, 2, Pole::new(p12, (sw(4) + sw(10)) / 2.0));
    g.set(1, 3, Pole::new(p13, (sw(1) + sw(10)) / 2.0));
    g
}
