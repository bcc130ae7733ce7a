//! N-sided corner fill over Grid66 sub-grids.
//!
//! Every sub-grid has its center corner at index 35 (row 5, column 5). The
//! column 5 of sub-grid `i` is the seam it shares with row 5 of sub-grid
//! `i + 1`, wrapping around, so `s[i][6r + 5]` and `s[i+1][30 + r]` name the
//! same pole. The fill rewrites the ring of poles around the center from the
//! outside in, keeping shared poles identical on both sides of every seam.

use cad_spline::{Plane, Point3d, Vec3};
use tracing::{debug, instrument};

use crate::config::StarConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Outcome};
use crate::error::GridError;
use crate::grid::Grid66;

/// Smallest and largest supported sub-grid count.
pub const STAR_ARITY: (usize, usize) = (3, 6);

/// Tangential growth of the second leg relative to the first:
/// `t̂(p1 - p0) · (p2 - p1) / |p1 - p0|`.
fn leg_scale(p0: Point3d, p1: Point3d, p2: Point3d) -> f64 {
    let l0 = p1 - p0;
    match l0.normalized() {
        Some(t) => t.dot(&(p2 - p1)) / l0.length(),
        None => 0.0,
    }
}

/// Working state of one star fill.
#[derive(Debug)]
pub struct StarBuilder {
    subs: Vec<Grid66>,
    spread: f64,
    squish: bool,
    diagnostics: Diagnostics,
}

impl StarBuilder {
    pub fn new(subs: Vec<Grid66>, config: &StarConfig) -> Result<Self, GridError> {
        let n = subs.len();
        if !(STAR_ARITY.0..=STAR_ARITY.1).contains(&n) {
            return Err(GridError::StarArity { count: n });
        }

        let mut diagnostics = Diagnostics::new();
        let spread = match config.spread[n - STAR_ARITY.0] {
            Some(k) => k,
            None => {
                diagnostics.push(
                    Diagnostic::warning(
                        DiagnosticCode::UntunedStarArity,
                        format!("no tuned diagonal spread for {n} sub-grids, using 1.0"),
                    )
                    .with_value(n as f64),
                );
                1.0
            }
        };

        Ok(Self {
            subs,
            spread,
            squish: config.squish,
            diagnostics,
        })
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    fn p(&self, sub: usize, index: usize) -> Point3d {
        self.subs[sub][index].point
    }

    fn set(&mut self, sub: usize, index: usize, point: Point3d) {
        self.subs[sub][index].point = point;
    }

    fn next(&self, i: usize) -> usize {
        (i + 1) % self.len()
    }

    fn prev(&self, i: usize) -> usize {
        (i + self.len() - 1) % self.len()
    }

    /// Row 2 of each seam, pushed out along the seam tangent.
    fn row2(&mut self) {
        for s0 in 0..self.len() {
            let s1 = self.next(s0);
            let sc0 = leg_scale(self.p(s0, 2), self.p(s0, 8), self.p(s0, 14));
            let sc1 = leg_scale(self.p(s1, 12), self.p(s1, 13), self.p(s1, 14));
            let mid = 0.5 * (sc0 + sc1);

            let seam = self.p(s0, 17) + (self.p(s0, 11) - self.p(s0, 5)) * mid;
            self.set(s0, 17, seam);
            self.set(s1, 32, seam);
            self.set(s0, 16, self.p(s0, 16) + (self.p(s0, 10) - self.p(s0, 4)) * mid);
            self.set(s1, 26, self.p(s1, 26) + (self.p(s1, 25) - self.p(s1, 24)) * mid);
            self.set(s0, 15, self.p(s0, 15) + (self.p(s0, 9) - self.p(s0, 3)) * (0.5 * (sc0 + mid)));
            self.set(s1, 20, self.p(s1, 20) + (self.p(s1, 19) - self.p(s1, 18)) * (0.5 * (sc1 + mid)));
        }
    }

    fn diag3(&mut self) {
        for s in 0..self.len() {
            let p = self.p(s, 20) + (self.p(s, 15) - self.p(s, 14));
            self.set(s, 21, p);
        }
    }

    fn row3(&mut self) {
        for s0 in 0..self.len() {
            let s1 = self.next(s0);
            let d0 = self.p(s0, 21) - self.p(s0, 15);
            let d1 = self.p(s1, 21) - self.p(s1, 20);
            let seam = self.p(s0, 17) + (d0 + d1) * 0.5;
            self.set(s0, 23, seam);
            self.set(s1, 33, seam);
            self.set(s0, 22, self.p(s0, 16) + (d0 + (seam - self.p(s0, 17))) * 0.5);
            self.set(s1, 27, self.p(s1, 26) + (d1 + (seam - self.p(s1, 32))) * 0.5);
        }
    }

    /// Diagonal pole 28, spread by the arity constant and pulled halfway
    /// towards the planes of both neighbouring seams.
    fn diag4(&mut self) {
        let mut diag = Vec::with_capacity(self.len());
        for s in 0..self.len() {
            let (prev, next) = (self.prev(s), self.next(s));
            let base = self.p(s, 21);
            let raw = self.p(s, 27) + (self.p(s, 22) - base);
            let scaled = base + (raw - base) * self.spread;

            let corner = self.p(s, 33);
            let seam = self.p(s, 23);
            let to_prev = self.project(Plane::through_points(corner, seam, self.p(prev, 33)), scaled, s);
            let to_next = self.project(Plane::through_points(corner, seam, self.p(next, 23)), scaled, s);
            diag.push(scaled.lerp(&to_prev.midpoint(&to_next), 0.5));
        }
        for (s, p) in diag.into_iter().enumerate() {
            self.set(s, 28, p);
        }
    }

    fn project(&mut self, plane: Option<Plane>, p: Point3d, sub: usize) -> Point3d {
        match plane {
            Some(plane) => plane.project_point(&p),
            None => {
                self.diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::DegeneratePlane,
                    format!("seam plane of sub-grid {sub} is degenerate, diagonal left unprojected"),
                ));
                p
            }
        }
    }

    /// Flatten the diagonal poles onto the plane through their centroid.
    fn squish_ring(&mut self) {
        let ring: Vec<Point3d> = (0..self.len()).map(|s| self.p(s, 28)).collect();
        let Some(center) = Point3d::centroid(&ring) else {
            return;
        };
        let normal = (0..ring.len()).fold(Vec3::ZERO, |acc, i| {
            let j = (i + 1) % ring.len();
            acc + (ring[i] - center).cross(&(ring[j] - center))
        });
        let Some(plane) = Plane::new(center, normal) else {
            self.diagnostics.push(Diagnostic::warning(
                DiagnosticCode::DegeneratePlane,
                "diagonal ring has no orientation, squish skipped",
            ));
            return;
        };
        for (s, p) in ring.iter().enumerate() {
            self.set(s, 28, plane.project_point(p));
        }
    }

    fn row4(&mut self) {
        for s0 in 0..self.len() {
            let s1 = self.next(s0);
            let mid = self.p(s0, 28).midpoint(&self.p(s1, 28));
            self.set(s0, 29, mid);
            self.set(s1, 34, mid);
        }
    }

    fn center(&mut self) {
        let row4: Vec<Point3d> = (0..self.len()).map(|s| self.p(s, 29)).collect();
        if let Some(center) = Point3d::centroid(&row4) {
            for s in 0..self.len() {
                self.set(s, 35, center);
            }
        }
    }

    /// Run every step in order and hand back the filled sub-grids.
    #[instrument(skip(self), fields(n = self.len()))]
    pub fn build(mut self) -> Outcome<Vec<Grid66>> {
        self.row2();
        self.diag3();
        self.row3();
        self.diag4();
        if self.squish {
            self.squish_ring();
        }
        self.row4();
        self.center();
        debug!(spread = self.spread, squish = self.squish, "star ring filled");
        Outcome::new(self.subs, self.diagnostics)
    }
}

/// Fill the shared ring of `subs` meeting at one corner.
pub fn fill_star(subs: Vec<Grid66>, config: &StarConfig) -> Result<Outcome<Vec<Grid66>>, GridError> {
    Ok(StarBuilder::new(subs, config)?.build())
}
