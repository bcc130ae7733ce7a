//! Shared fixtures for unit tests.

use cad_spline::Point3d;

use crate::poly::{Poly4, Poly6};

/// Straight Poly4 with poles at thirds.
pub fn straight(a: Point3d, b: Point3d) -> Poly4 {
    Poly4::from_points(std::array::from_fn(|i| a.lerp(&b, i as f64 / 3.0)))
}

/// Straight Poly6 with poles at fifths.
pub fn straight6(a: Point3d, b: Point3d) -> Poly6 {
    Poly6::from_points(std::array::from_fn(|i| a.lerp(&b, i as f64 / 5.0)))
}

/// Four straight edges bounding the square [0,3]x[0,3], head to tail
/// counter-clockwise from the origin.
pub fn flat_loop() -> [Poly4; 4] {
    let c = [
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(3.0, 0.0, 0.0),
        Point3d::new(3.0, 3.0, 0.0),
        Point3d::new(0.0, 3.0, 0.0),
    ];
    std::array::from_fn(|i| straight(c[i], c[(i + 1) % 4]))
}

/// Six-pole counterpart of [`flat_loop`] on [0,5]x[0,5].
pub fn flat_loop6() -> [Poly6; 4] {
    let c = [
        Point3d::new(0.0, 0.0, 0.0),
        Point3d::new(5.0, 0.0, 0.0),
        Point3d::new(5.0, 5.0, 0.0),
        Point3d::new(0.0, 5.0, 0.0),
    ];
    std::array::from_fn(|i| straight6(c[i], c[(i + 1) % 4]))
}
