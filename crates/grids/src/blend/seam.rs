use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{BlendScales, blend_g2};
use crate::Tolerance;
use crate::diagnostics::{Diagnostics, Outcome};
use crate::error::GridError;
use crate::grid::{Grid44, Grid64};
use crate::orient::points_equal;
use crate::poly::Poly4;
use crate::synthesis::rotate_grid44;

/// Scales for blending two Grid44s row by row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeamBlendParams {
    /// Tangent scales of the first and second grid, shared by every row.
    pub tangent: [f64; 2],
    /// Inner scale on the first grid's side, per row.
    pub inner_start: [f64; 4],
    /// Inner scale on the second grid's side, per row.
    pub inner_end: [f64; 4],
}

impl Default for SeamBlendParams {
    fn default() -> Self {
        Self {
            tangent: [2.0, 2.0],
            inner_start: [3.0; 4],
            inner_end: [3.0; 4],
        }
    }
}

impl SeamBlendParams {
    fn row(&self, row: usize) -> BlendScales {
        BlendScales::new(
            self.tangent[0],
            self.inner_start[row],
            self.inner_end[row],
            self.tangent[1],
        )
    }
}

/// Quarter turns that bring a seam (a pair of corner labels in
/// `Grid::corners` order) to the right column of the first grid.
fn turns_to_right(seam: [usize; 2]) -> Option<usize> {
    match seam {
        [1, 2] => Some(0),
        [2, 3] => Some(1),
        [0, 3] => Some(2),
        [0, 1] => Some(3),
        _ => None,
    }
}

/// Quarter turns that bring a seam to the left column of the second grid.
fn turns_to_left(seam: [usize; 2]) -> Option<usize> {
    match seam {
        [0, 3] => Some(0),
        [0, 1] => Some(1),
        [1, 2] => Some(2),
        [2, 3] => Some(3),
        _ => None,
    }
}

fn adjacent(i: usize, j: usize) -> bool {
    (i + 1) % 4 == j || (j + 1) % 4 == i
}

/// Corner labels of each grid lying on the shared edge, sorted.
///
/// Collapsed corners can match more than once. The seam is the first pair of
/// matches that is a real edge in both grids: adjacent labels on each side
/// and two distinct points.
fn find_seam(g0: &Grid44, g1: &Grid44, tol: f64) -> Result<([usize; 2], [usize; 2]), GridError> {
    let c0 = g0.corners();
    let c1 = g1.corners();
    let mut shared = Vec::with_capacity(4);
    for (i, p) in c0.iter().enumerate() {
        for (j, q) in c1.iter().enumerate() {
            if points_equal(&p.point, &q.point, tol) {
                shared.push((i, j));
            }
        }
    }
    for (k, &(i0, j0)) in shared.iter().enumerate() {
        for &(i1, j1) in &shared[k + 1..] {
            if adjacent(i0, i1) && adjacent(j0, j1) && !points_equal(&c0[i0].point, &c0[i1].point, tol) {
                return Ok(([i0.min(i1), i0.max(i1)], [j0.min(j1), j0.max(j1)]));
            }
        }
    }
    Err(GridError::SeamNotFound)
}

/// Grid64 joining two Grid44s that share an edge.
///
/// The first grid is turned so the seam is its right column, the second so
/// the seam is its left column (flipped top to bottom when its rows run the
/// other way). Each row pair is then blended into one six-pole row.
#[instrument(skip_all)]
pub fn blend_grid44_pair(
    g0: &Grid44,
    g1: &Grid44,
    params: &SeamBlendParams,
    tol: &Tolerance,
) -> Result<Outcome<Grid64>, GridError> {
    let (seam0, seam1) = find_seam(g0, g1, tol.coincidence)?;
    let turns0 = turns_to_right(seam0).ok_or(GridError::SeamNotFound)?;
    let turns1 = turns_to_left(seam1).ok_or(GridError::SeamNotFound)?;

    let left = rotate_grid44(g0, turns0);
    let mut right = rotate_grid44(g1, turns1);
    if !points_equal(&left.point(0, 3), &right.point(0, 0), tol.coincidence) {
        right = right.flipped_vertical();
    }

    let mut diagnostics = Diagnostics::new();
    let mut grid = Grid64::filled(left.get(0, 0));
    for row in 0..4 {
        let blend = blend_g2(
            &Poly4::new(left.row(row)),
            &Poly4::new(right.row(row)),
            &params.row(row),
            tol,
        )?;
        diagnostics.extend(blend.diagnostics);
        grid.set_row(row, *blend.poly.poles());
    }
    Ok(Outcome::new(grid, diagnostics))
}
