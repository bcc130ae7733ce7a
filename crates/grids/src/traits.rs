//! Query traits at the seam between grid algorithms and a spline kernel.
//!
//! The algorithms here need only a handful of evaluations from curves and
//! surfaces. A host with its own kernel implements these traits; the
//! `cad-spline` types implement them below.

use cad_spline::{NurbsCurve, NurbsSurface, Point3d, Vec3};

/// A parametric curve that can be sampled.
pub trait CurveQuery {
    /// Parameter range `(first, last)`.
    fn domain(&self) -> (f64, f64);

    /// Point at parameter `t`.
    fn point_at(&self, t: f64) -> Point3d;
}

/// A parametric surface that can be sampled and projected onto.
pub trait SurfaceQuery {
    fn point_at(&self, u: f64, v: f64) -> Point3d;

    /// Partial derivatives `(dS/du, dS/dv)`.
    fn tangents(&self, u: f64, v: f64) -> (Vec3, Vec3);

    /// Parameters of the surface point closest to `point`.
    fn closest_parameters(&self, point: &Point3d) -> (f64, f64);

    /// Unit normal `Su x Sv`, `None` where the tangents are parallel.
    fn normal_at(&self, u: f64, v: f64) -> Option<Vec3> {
        let (su, sv) = self.tangents(u, v);
        su.cross(&sv).normalized()
    }
}

// ── Implementations ────────────────────────────────────────────────────────

impl CurveQuery for NurbsCurve {
    fn domain(&self) -> (f64, f64) {
        NurbsCurve::domain(self)
    }

    fn point_at(&self, t: f64) -> Point3d {
        self.evaluate(t)
    }
}

impl SurfaceQuery for NurbsSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3d {
        self.evaluate(u, v)
    }

    fn tangents(&self, u: f64, v: f64) -> (Vec3, Vec3) {
        NurbsSurface::tangents(self, u, v)
    }

    fn closest_parameters(&self, point: &Point3d) -> (f64, f64) {
        self.parameter(point)
    }

    fn normal_at(&self, u: f64, v: f64) -> Option<Vec3> {
        self.normal(u, v)
    }
}
