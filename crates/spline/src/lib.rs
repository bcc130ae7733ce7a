//! Pinned rational B-spline curves and surfaces: the evaluation and
//! refinement operations control-grid synthesis relies on.

pub mod error;
pub mod nurbs;
pub mod plane;
pub mod point;
pub mod pole;
pub mod vector;

pub use error::SplineError;
pub use nurbs::{NurbsCurve, NurbsSurface, bezier_knots};
pub use plane::Plane;
pub use point::Point3d;
pub use pole::Pole;
pub use vector::Vec3;
