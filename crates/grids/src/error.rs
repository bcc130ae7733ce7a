use cad_spline::SplineError;
use thiserror::Error;

use crate::segments::CutDirection;

/// Failures that abort grid synthesis or blending.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("polygons share no endpoint (closest endpoints {gap:.3e} apart, tol {tol:.1e})")]
    NoSharedEndpoint { gap: f64, tol: f64 },
    #[error("expected {expected} poles, found {found}")]
    PoleCount { expected: usize, found: usize },
    #[error("grids share no seam")]
    SeamNotFound,
    #[error("grids share no corner")]
    NoCommonCorner,
    #[error("unsupported corner pairing: grid 0 corner {first}, grid 1 corner {second}")]
    UnsupportedCorner { first: usize, second: usize },
    #[error("star fill needs 3 to 6 sub-grids, got {count}")]
    StarArity { count: usize },
    #[error("cut from {start:?} to {end:?} (u, v) does not follow a surface edge")]
    CutOffEdge { start: [f64; 2], end: [f64; 2] },
    #[error("both cuts run along {direction:?}")]
    ParallelCuts { direction: CutDirection },
    #[error("dC/ds target at the {end} of the blend is not finite ({value})")]
    NonFiniteTarget { end: &'static str, value: f64 },
    #[error(transparent)]
    Spline(#[from] SplineError),
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Failures turning sketch input into control polygons.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdapterError {
    #[error("{kind} input needs {expected} elements, found {found}")]
    WrongElementCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("segment {index} does not start where the previous segment ends (gap {gap:.3e})")]
    Disconnected { index: usize, gap: f64 },
    #[error("element of degree {degree} cannot become a cubic")]
    DegreeTooHigh { degree: usize },
    #[error("arc sweep {sweep} rad is outside (0, pi)")]
    UnsupportedArc { sweep: f64 },
    #[error(transparent)]
    Spline(#[from] SplineError),
}
