use serde::{Deserialize, Serialize};

use crate::point::Point3d;

/// A weighted control point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pole {
    pub point: Point3d,
    #[serde(default = "unit_weight")]
    pub weight: f64,
}

fn unit_weight() -> f64 {
    1.0
}

impl Pole {
    pub fn new(point: Point3d, weight: f64) -> Self {
        Self { point, weight }
    }

    /// Non-rational pole (weight 1).
    pub fn unit(point: Point3d) -> Self {
        Self::new(point, 1.0)
    }

    /// Homogeneous coordinates `(w x, w y, w z, w)`.
    pub fn homogeneous(&self) -> [f64; 4] {
        let w = self.weight;
        [self.point.x * w, self.point.y * w, self.point.z * w, w]
    }

    pub fn from_homogeneous(h: [f64; 4]) -> Self {
        let w = h[3];
        Self::new(Point3d::new(h[0] / w, h[1] / w, h[2] / w), w)
    }

    /// Affine blend in homogeneous space: `(1 - t) self + t other`.
    pub fn blend(&self, other: &Self, t: f64) -> Self {
        let a = self.homogeneous();
        let b = other.homogeneous();
        let mut h = [0.0; 4];
        for k in 0..4 {
            h[k] = (1.0 - t) * a[k] + t * b[k];
        }
        Self::from_homogeneous(h)
    }
}

impl From<Point3d> for Pole {
    fn from(point: Point3d) -> Self {
        Self::unit(point)
    }
}
