//! Control polygons from world-space sketch primitives.
//!
//! A [`PolyDescriptor`] names how the poles are read off the input: straight
//! from the ends of line chains, from node sketches (an endpoint plus tangent
//! tips), or by raising a single element to a cubic.

use cad_spline::{NurbsCurve, Point3d, Pole, Vec3, bezier_knots};
use serde::{Deserialize, Serialize};

use crate::Tolerance;
use crate::builders::split_at_thirds;
use crate::error::AdapterError;
use crate::poly::{Poly4, Poly6};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Point3d,
    pub end: Point3d,
}

impl LineSegment {
    pub fn new(start: Point3d, end: Point3d) -> Self {
        Self { start, end }
    }
}

/// Circular arc running counter-clockwise about `normal` from `start` to
/// `end`. Sweeps of half a turn or more are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularArc {
    pub center: Point3d,
    pub start: Point3d,
    pub end: Point3d,
    pub normal: Vec3,
}

impl CircularArc {
    /// Sweep angle in `[0, 2pi)`.
    pub fn sweep(&self) -> f64 {
        let a = self.start - self.center;
        let b = self.end - self.center;
        let n = self.normal.normalized().unwrap_or(Vec3::Z);
        let angle = a.cross(&b).dot(&n).atan2(a.dot(&b));
        if angle < 0.0 {
            angle + std::f64::consts::TAU
        } else {
            angle
        }
    }

    /// Rational quadratic with the middle pole on the tangent intersection.
    fn quadratic_poles(&self) -> Result<[Pole; 3], AdapterError> {
        let sweep = self.sweep();
        if !(sweep > 0.0 && sweep < std::f64::consts::PI) {
            return Err(AdapterError::UnsupportedArc { sweep });
        }
        let half = 0.5 * sweep;
        let a = self.start - self.center;
        let b = self.end - self.center;
        let bisector = (a + b).normalized().ok_or(AdapterError::UnsupportedArc { sweep })?;
        let apex = self.center + bisector * (a.length() / half.cos());
        Ok([
            Pole::unit(self.start),
            Pole::new(apex, half.cos()),
            Pole::unit(self.end),
        ])
    }
}

/// One sketch element that can be raised to a cubic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SketchElement {
    Line(LineSegment),
    Arc(CircularArc),
    /// Rational Bezier of degree `poles.len() - 1`.
    Bezier { poles: Vec<Pole> },
}

impl SketchElement {
    /// The element as a single-segment cubic.
    pub fn to_cubic(&self) -> Result<NurbsCurve, AdapterError> {
        let poles = match self {
            SketchElement::Line(line) => vec![Pole::unit(line.start), Pole::unit(line.end)],
            SketchElement::Arc(arc) => arc.quadratic_poles()?.to_vec(),
            SketchElement::Bezier { poles } => poles.clone(),
        };
        let degree = match poles.len() {
            0 | 1 => {
                return Err(AdapterError::WrongElementCount {
                    kind: "Bezier element poles",
                    expected: 2,
                    found: poles.len(),
                });
            }
            n if n > 4 => return Err(AdapterError::DegreeTooHigh { degree: n - 1 }),
            n => n - 1,
        };
        let curve = NurbsCurve::from_poles(degree, &poles, bezier_knots(degree))?;
        Ok(curve.increase_degree(3)?)
    }
}

/// Node sketch: an endpoint and the tips of the tangent legs drawn from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSketch {
    pub center: Point3d,
    pub tips: Vec<Point3d>,
}

impl NodeSketch {
    fn tips<const N: usize>(&self, kind: &'static str) -> Result<[Point3d; N], AdapterError> {
        <[Point3d; N]>::try_from(self.tips.as_slice()).map_err(|_| AdapterError::WrongElementCount {
            kind,
            expected: N,
            found: self.tips.len(),
        })
    }
}

/// How to read a control polygon off sketch input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PolyDescriptor {
    /// Three chained lines: ends of the first and the last.
    ThreeLines { lines: Vec<LineSegment> },
    /// Two nodes with one tip each.
    TwoNodes { nodes: [NodeSketch; 2] },
    /// First element of a sketch raised to a cubic.
    FirstElement { elements: Vec<SketchElement> },
    /// Five chained lines: ends of the first, third and fifth.
    FiveLines { lines: Vec<LineSegment> },
    /// Two nodes with two tips each.
    TwoNodes6 { nodes: [NodeSketch; 2] },
    /// First element raised to a cubic, then split at thirds.
    FirstElement6 { elements: Vec<SketchElement> },
}

/// A polygon of either supported length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ControlPoly {
    Four(Poly4),
    Six(Poly6),
}

impl PolyDescriptor {
    pub fn build(&self, tol: &Tolerance) -> Result<ControlPoly, AdapterError> {
        match self {
            PolyDescriptor::ThreeLines { lines } => {
                let [l0, _, l2] = chain::<3>(lines, "ThreeLines", tol)?;
                Ok(ControlPoly::Four(Poly4::from_points([l0.start, l0.end, l2.start, l2.end])))
            }
            PolyDescriptor::TwoNodes { nodes: [n0, n1] } => {
                let [t0] = n0.tips::<1>("TwoNodes tips")?;
                let [t1] = n1.tips::<1>("TwoNodes tips")?;
                Ok(ControlPoly::Four(Poly4::from_points([n0.center, t0, t1, n1.center])))
            }
            PolyDescriptor::FirstElement { elements } => {
                let curve = first(elements, "FirstElement")?.to_cubic()?;
                Ok(ControlPoly::Four(Poly4::new(fixed_poles(curve, "cubic poles")?)))
            }
            PolyDescriptor::FiveLines { lines } => {
                let [l0, _, l2, _, l4] = chain::<5>(lines, "FiveLines", tol)?;
                Ok(ControlPoly::Six(Poly6::from_points([
                    l0.start, l0.end, l2.start, l2.end, l4.start, l4.end,
                ])))
            }
            PolyDescriptor::TwoNodes6 { nodes: [n0, n1] } => {
                let [a0, a1] = n0.tips::<2>("TwoNodes6 tips")?;
                let [b0, b1] = n1.tips::<2>("TwoNodes6 tips")?;
                Ok(ControlPoly::Six(Poly6::from_points([n0.center, a0, a1, b1, b0, n1.center])))
            }
            PolyDescriptor::FirstElement6 { elements } => {
                let cubic = first(elements, "FirstElement6")?.to_cubic()?;
                let split = split_at_thirds(&cubic)?;
                Ok(ControlPoly::Six(Poly6::new(fixed_poles(split, "6P poles")?)))
            }
        }
    }

    /// Build and require a four-pole result.
    pub fn poly4(&self, tol: &Tolerance) -> Result<Poly4, AdapterError> {
        match self.build(tol)? {
            ControlPoly::Four(p) => Ok(p),
            ControlPoly::Six(_) => Err(AdapterError::WrongElementCount {
                kind: "Poly4 poles",
                expected: 4,
                found: 6,
            }),
        }
    }

    /// Build and require a six-pole result.
    pub fn poly6(&self, tol: &Tolerance) -> Result<Poly6, AdapterError> {
        match self.build(tol)? {
            ControlPoly::Six(p) => Ok(p),
            ControlPoly::Four(_) => Err(AdapterError::WrongElementCount {
                kind: "Poly6 poles",
                expected: 6,
                found: 4,
            }),
        }
    }
}

/// Exactly `N` lines, each starting where the previous one ends.
fn chain<const N: usize>(
    lines: &[LineSegment],
    kind: &'static str,
    tol: &Tolerance,
) -> Result<[LineSegment; N], AdapterError> {
    let lines = <[LineSegment; N]>::try_from(lines).map_err(|_| AdapterError::WrongElementCount {
        kind,
        expected: N,
        found: lines.len(),
    })?;
    for (index, pair) in lines.windows(2).enumerate() {
        if !tol.points_coincident(&pair[0].end, &pair[1].start) {
            return Err(AdapterError::Disconnected {
                index: index + 1,
                gap: pair[0].end.distance_to(&pair[1].start),
            });
        }
    }
    Ok(lines)
}

fn first<'a>(elements: &'a [SketchElement], kind: &'static str) -> Result<&'a SketchElement, AdapterError> {
    elements.first().ok_or(AdapterError::WrongElementCount {
        kind,
        expected: 1,
        found: 0,
    })
}

fn fixed_poles<const N: usize>(curve: NurbsCurve, kind: &'static str) -> Result<[Pole; N], AdapterError> {
    let poles = curve.poles();
    let found = poles.len();
    <[Pole; N]>::try_from(poles).map_err(|_| AdapterError::WrongElementCount {
        kind,
        expected: N,
        found,
    })
}
