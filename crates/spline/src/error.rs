use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplineError {
    #[error("knot {t} lies outside the open domain ({start}, {end})")]
    KnotOutsideDomain { t: f64, start: f64, end: f64 },
    #[error("degree elevation needs a single Bezier segment, curve has {interior} interior knots")]
    NotSingleSegment { interior: usize },
    #[error("cannot lower degree from {from} to {to}")]
    DegreeDecrease { from: usize, to: usize },
    #[error("empty parameter range [{t0}, {t1}]")]
    EmptyRange { t0: f64, t1: f64 },
    #[error("{what}: expected {expected}, found {found}")]
    Dimension {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}
