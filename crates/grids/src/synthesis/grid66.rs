use tracing::instrument;

use crate::Tolerance;
use crate::error::GridError;
use crate::grid::Grid66;
use crate::orient::oriented;
use crate::poly::Poly6;

/// Grid66 bounded by four six-pole edges oriented head to tail.
///
/// Interior poles are chained translations: the ring next to each corner
/// copies the adjacent boundary legs, the central 2x2 copies legs of the
/// ring already placed.
#[instrument(skip_all)]
pub fn build_grid66(
    p0: &Poly6,
    p1: &Poly6,
    p2: &Poly6,
    p3: &Poly6,
    tol: &Tolerance,
) -> Result<Grid66, GridError> {
    let sext12 = oriented(p0, p1, tol.coincidence)?;
    let sext23 = oriented(p1, p2, tol.coincidence)?;
    let sext34 = oriented(p2, p3, tol.coincidence)?;
    let sext41 = oriented(p3, p0, tol.coincidence)?;

    let mut g = Grid66::filled(sext12.first());
    g.set_row(0, *sext12.poles());
    for i in 1..6 {
        g.set(i, 5, sext23[i]);
        g.set(5, 5 - i, sext34[i]);
    }
    for i in 1..5 {
        g.set(5 - i, 0, sext41[i]);
    }

    // Each entry: target, base pole, leg (from, to) added to the base.
    const CHAIN: [((usize, usize), (usize, usize), (usize, usize), (usize, usize)); 16] = [
        ((1, 1), (0, 1), (0, 0), (1, 0)),
        ((1, 4), (0, 4), (0, 5), (1, 5)),
        ((4, 1), (5, 1), (5, 0), (4, 0)),
        ((4, 4), (4, 5), (5, 5), (5, 4)),
        ((1, 2), (0, 2), (0, 0), (1, 0)),
        ((1, 3), (0, 3), (0, 5), (1, 5)),
        ((2, 4), (2, 5), (0, 5), (0, 4)),
        ((3, 4), (3, 5), (5, 5), (5, 4)),
        ((4, 2), (5, 2), (5, 0), (4, 0)),
        ((4, 3), (5, 3), (5, 5), (4, 5)),
        ((2, 1), (2, 0), (0, 0), (0, 1)),
        ((3, 1), (3, 0), (5, 0), (5, 1)),
        ((2, 2), (1, 2), (1, 0), (2, 0)),
        ((2, 3), (1, 3), (1, 5), (2, 5)),
        ((3, 2), (4, 2), (4, 0), (3, 0)),
        ((3, 3), (4, 3), (4, 5), (3, 5)),
    ];
    for ((r, c), base, from, to) in CHAIN {
        let point = g.point(base.0, base.1) + (g.point(to.0, to.1) - g.point(from.0, from.1));
        g.set_point(r, c, point);
    }

    // Weight of each interior pole: product of the two nearest edge weights.
    const WEIGHTS: [((usize, usize), (usize, usize), (usize, usize)); 16] = [
        ((1, 1), (0, 1), (1, 0)),
        ((1, 2), (0, 2), (1, 0)),
        ((2, 1), (0, 1), (2, 0)),
        ((2, 2), (0, 2), (2, 0)),
        ((1, 4), (0, 4), (1, 5)),
        ((1, 3), (0, 3), (1, 5)),
        ((2, 4), (0, 4), (2, 5)),
        ((2, 3), (0, 3), (2, 5)),
        ((4, 4), (4, 5), (5, 4)),
        ((3, 4), (3, 5), (5, 4)),
        ((4, 3), (5, 4), (4, 5)),
        ((3, 3), (3, 5), (5, 3)),
        ((4, 1), (4, 0), (5, 1)),
        ((3, 1), (3, 0), (5, 1)),
        ((4, 2), (5, 2), (4, 0)),
        ((3, 2), (3, 0), (5, 2)),
    ];
    for ((r, c), a, b) in WEIGHTS {
        let weight = g.weight(a.0, a.1) * g.weight(b.0, b.1);
        g.set_weight(r, c, weight);
    }
    Ok(g)
}
