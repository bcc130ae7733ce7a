use std::ops::Index;

use cad_spline::{Point3d, Pole, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// A fixed-length control polygon. First and last poles are the curve
/// endpoints; consecutive poles form the legs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Pole>", into = "Vec<Pole>")]
pub struct Poly<const N: usize> {
    poles: [Pole; N],
}

/// Control polygon of a single cubic Bezier segment.
pub type Poly4 = Poly<4>;
/// Control polygon of a three-segment cubic with knots at thirds.
pub type Poly6 = Poly<6>;

impl<const N: usize> Poly<N> {
    pub fn new(poles: [Pole; N]) -> Self {
        Self { poles }
    }

    /// Non-rational polygon through `points`.
    pub fn from_points(points: [Point3d; N]) -> Self {
        Self::new(points.map(Pole::unit))
    }

    pub fn poles(&self) -> &[Pole; N] {
        &self.poles
    }

    pub fn points(&self) -> [Point3d; N] {
        self.poles.map(|p| p.point)
    }

    pub fn weights(&self) -> [f64; N] {
        self.poles.map(|p| p.weight)
    }

    pub fn first(&self) -> Pole {
        self.poles[0]
    }

    pub fn last(&self) -> Pole {
        self.poles[N - 1]
    }

    pub fn reversed(&self) -> Self {
        let mut poles = self.poles;
        poles.reverse();
        Self { poles }
    }

    /// Leg vectors `p[i+1] - p[i]`.
    pub fn legs(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.poles.windows(2).map(|w| w[1].point - w[0].point)
    }
}

impl<const N: usize> Index<usize> for Poly<N> {
    type Output = Pole;
    fn index(&self, i: usize) -> &Pole {
        &self.poles[i]
    }
}

impl<const N: usize> TryFrom<Vec<Pole>> for Poly<N> {
    type Error = GridError;
    fn try_from(poles: Vec<Pole>) -> Result<Self, GridError> {
        let found = poles.len();
        let poles: [Pole; N] = poles
            .try_into()
            .map_err(|_| GridError::PoleCount { expected: N, found })?;
        Ok(Self { poles })
    }
}

impl<const N: usize> From<Poly<N>> for Vec<Pole> {
    fn from(poly: Poly<N>) -> Self {
        poly.poles.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_keeps_weights_with_points() {
        let poly = Poly4::new([
            Pole::new(Point3d::new(0.0, 0.0, 0.0), 1.0),
            Pole::new(Point3d::new(1.0, 0.0, 0.0), 2.0),
            Pole::new(Point3d::new(2.0, 0.0, 0.0), 3.0),
            Pole::new(Point3d::new(3.0, 0.0, 0.0), 4.0),
        ]);
        let rev = poly.reversed();
        assert_eq!(rev.weights(), [4.0, 3.0, 2.0, 1.0]);
        assert_eq!(rev.first().point, Point3d::new(3.0, 0.0, 0.0));
        assert_eq!(rev.reversed(), poly);
    }

    #[test]
    fn test_legs() {
        let poly = Poly4::from_points([
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(1.0, 2.0, 0.0),
            Point3d::new(1.0, 2.0, 3.0),
        ]);
        let legs: Vec<Vec3> = poly.legs().collect();
        assert_eq!(legs, vec![Vec3::X, Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 0.0, 3.0)]);
    }

    #[test]
    fn test_json_length_is_checked() {
        let json = r#"[{"point":{"x":0.0,"y":0.0,"z":0.0},"weight":1.0},
                       {"point":{"x":1.0,"y":0.0,"z":0.0}}]"#;
        assert!(serde_json::from_str::<Poly4>(json).is_err());
        let poly = Poly4::from_points([Point3d::ORIGIN; 4]);
        let text = serde_json::to_string(&poly).unwrap();
        let back: Poly4 = serde_json::from_str(&text).unwrap();
        assert_eq!(back, poly);
    }
}
