use std::ops::{Index, IndexMut};

use cad_spline::{Point3d, Pole};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// A control grid `W` poles wide and `H` poles tall, stored row-major:
/// `index = row * W + col`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Pole>", into = "Vec<Pole>")]
pub struct Grid<const W: usize, const H: usize> {
    poles: Vec<Pole>,
}

pub type Grid44 = Grid<4, 4>;
/// Six poles wide, four tall.
pub type Grid64 = Grid<6, 4>;
pub type Grid66 = Grid<6, 6>;
/// Corner-focused sub-grid used to assemble a [`Grid66`].
pub type SubGrid33 = Grid<3, 3>;

impl<const W: usize, const H: usize> Grid<W, H> {
    pub const WIDTH: usize = W;
    pub const HEIGHT: usize = H;
    pub const LEN: usize = W * H;

    /// Every pole set to `pole`.
    pub fn filled(pole: Pole) -> Self {
        Self {
            poles: vec![pole; W * H],
        }
    }

    pub fn from_poles(poles: Vec<Pole>) -> Result<Self, GridError> {
        if poles.len() != W * H {
            return Err(GridError::PoleCount {
                expected: W * H,
                found: poles.len(),
            });
        }
        Ok(Self { poles })
    }

    pub fn index_of(row: usize, col: usize) -> usize {
        row * W + col
    }

    pub fn poles(&self) -> &[Pole] {
        &self.poles
    }

    pub fn get(&self, row: usize, col: usize) -> Pole {
        self.poles[Self::index_of(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, pole: Pole) {
        self.poles[Self::index_of(row, col)] = pole;
    }

    pub fn point(&self, row: usize, col: usize) -> Point3d {
        self.get(row, col).point
    }

    pub fn weight(&self, row: usize, col: usize) -> f64 {
        self.get(row, col).weight
    }

    pub fn set_point(&mut self, row: usize, col: usize, point: Point3d) {
        self.poles[Self::index_of(row, col)].point = point;
    }

    pub fn set_weight(&mut self, row: usize, col: usize, weight: f64) {
        self.poles[Self::index_of(row, col)].weight = weight;
    }

    pub fn row(&self, row: usize) -> [Pole; W] {
        std::array::from_fn(|col| self.get(row, col))
    }

    pub fn column(&self, col: usize) -> [Pole; H] {
        std::array::from_fn(|row| self.get(row, col))
    }

    pub fn set_row(&mut self, row: usize, poles: [Pole; W]) {
        for (col, pole) in poles.into_iter().enumerate() {
            self.set(row, col, pole);
        }
    }

    /// Flat indices of the corners, counter-clockwise from the origin:
    /// `[0, W-1, W*H-1, W*(H-1)]`.
    pub fn corner_indices() -> [usize; 4] {
        [0, W - 1, W * H - 1, W * (H - 1)]
    }

    pub fn corners(&self) -> [Pole; 4] {
        Self::corner_indices().map(|i| self.poles[i])
    }

    /// Row order reversed.
    pub fn flipped_vertical(&self) -> Self {
        let mut flipped = self.clone();
        for row in 0..H {
            flipped.set_row(row, self.row(H - 1 - row));
        }
        flipped
    }
}

impl<const W: usize, const H: usize> Index<usize> for Grid<W, H> {
    type Output = Pole;
    fn index(&self, i: usize) -> &Pole {
        &self.poles[i]
    }
}

impl<const W: usize, const H: usize> IndexMut<usize> for Grid<W, H> {
    fn index_mut(&mut self, i: usize) -> &mut Pole {
        &mut self.poles[i]
    }
}

impl<const W: usize, const H: usize> TryFrom<Vec<Pole>> for Grid<W, H> {
    type Error = GridError;
    fn try_from(poles: Vec<Pole>) -> Result<Self, GridError> {
        Self::from_poles(poles)
    }
}

impl<const W: usize, const H: usize> From<Grid<W, H>> for Vec<Pole> {
    fn from(grid: Grid<W, H>) -> Self {
        grid.poles
    }
}
