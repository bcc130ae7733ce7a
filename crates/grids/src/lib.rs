//! Control-grid synthesis and blending for pinned rational splines.
//!
//! Boundary polygons go in, control grids come out: bicubic patches from
//! four edges, 6x4 and 6x6 grids with knots at thirds, degenerate three-sided
//! patches, and star fills around an N-sided hole. Curve blends match
//! position, tangent and curvature exactly, and approximate a third-order
//! match by searching the inner leg scales.
//!
//! Recoverable trouble is reported through [`Diagnostics`] alongside the
//! result instead of aborting.

pub mod adapters;
pub mod analysis;
pub mod blend;
pub mod builders;
pub mod config;
pub mod dcds;
pub mod diagnostics;
pub mod error;
pub mod grid;
pub mod intersection;
pub mod orient;
pub mod poly;
pub mod segments;
pub mod star;
pub mod synthesis;
pub mod traits;

#[cfg(test)]
mod test_support;

use cad_spline::{Point3d, Vec3};
use serde::{Deserialize, Serialize};

pub use cad_spline::{NurbsCurve, NurbsSurface, Pole};
pub use config::GridConfig;
pub use diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Outcome};
pub use error::{AdapterError, GridError};
pub use grid::{Grid, Grid44, Grid64, Grid66, SubGrid33};
pub use poly::{Poly, Poly4, Poly6};

/// Global tolerance settings for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Points closer than this are considered coincident.
    pub coincidence: f64,
    /// Vectors shorter than this have no usable direction.
    pub zero_length: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-6,
            zero_length: 1e-12,
        }
    }
}

impl Tolerance {
    pub fn points_coincident(&self, a: &Point3d, b: &Point3d) -> bool {
        a.distance_to(b) <= self.coincidence
    }

    pub fn is_zero_length(&self, v: &Vec3) -> bool {
        v.length() < self.zero_length
    }
}

pub fn default_tolerance() -> Tolerance {
    Tolerance::default()
}
