use serde::{Deserialize, Serialize};

use crate::point::Point3d;
use crate::vector::Vec3;

/// An infinite plane given by an origin and a unit normal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Plane {
    pub origin: Point3d,
    pub normal: Vec3,
}

impl Plane {
    /// `None` when `normal` has no direction.
    pub fn new(origin: Point3d, normal: Vec3) -> Option<Self> {
        Some(Self {
            origin,
            normal: normal.normalized()?,
        })
    }

    /// Plane through three points, `None` when they are collinear.
    pub fn through_points(a: Point3d, b: Point3d, c: Point3d) -> Option<Self> {
        Self::new(a, (b - a).cross(&(c - a)))
    }

    pub fn distance_to_point(&self, p: &Point3d) -> f64 {
        (*p - self.origin).dot(&self.normal)
    }

    pub fn project_point(&self, p: &Point3d) -> Point3d {
        *p - self.normal * self.distance_to_point(p)
    }
}
