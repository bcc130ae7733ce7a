//! Rate of change of curvature with arc length at a curve end.
//!
//! The estimate is a secant: curvature at the end of a segment `[0, t]` minus
//! curvature at the start, over the segment's arc length, with `t` shrinking
//! until successive estimates agree. Positive means curvature grows moving
//! into the curve.

use serde::{Deserialize, Serialize};

use crate::analysis::{CurveForm, curvature_at_end, curvature_at_start};
use crate::builders::{build_pinned_6p, build_pinned_bezier4};
use crate::config::DcdsConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Outcome};
use crate::error::GridError;
use crate::poly::{Poly4, Poly6};

/// Result of one dC/ds estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcdsEstimate {
    pub value: f64,
    /// Number of segments measured.
    pub iterations: usize,
    pub converged: bool,
}

fn within(a: f64, b: f64, rel: f64, zero: f64) -> bool {
    (a - b).abs() <= rel * b.abs().max(zero)
}

/// dC/ds at the first pole of a cubic Bezier, moving towards the last.
pub fn dcds_at_start(poly: &Poly4, config: &DcdsConfig) -> Result<Outcome<DcdsEstimate>, GridError> {
    let curve = build_pinned_bezier4(poly)?;
    let pts = poly.points();
    let c0 = curvature_at_start(pts[0], pts[1], pts[2], CurveForm::Bezier);
    // near-zero start curvature drifts on an absolute scale
    let collapse_limit = if c0.abs() > config.zero_threshold {
        config.collapse_tolerance * c0.abs()
    } else {
        config.collapse_tolerance
    };

    let mut diagnostics = Diagnostics::new();
    let mut last: Option<f64> = None;
    let mut t = 1.0;

    for iteration in 1..=config.max_iterations {
        let seg = curve.segment(0.0, t)?;
        let seg_pts = seg.control_points;
        if seg_pts.len() != 4 {
            return Err(GridError::PoleCount {
                expected: 4,
                found: seg_pts.len(),
            });
        }

        let start = curvature_at_start(seg_pts[0], seg_pts[1], seg_pts[2], CurveForm::Bezier);
        if (start - c0).abs() > collapse_limit {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::SegmentationCollapse,
                    format!("segment [0, {t:.3e}] start curvature {start:.6e} drifted from {c0:.6e}"),
                )
                .with_value(start - c0)
                .with_tolerance(collapse_limit),
            );
            let estimate = DcdsEstimate {
                value: last.unwrap_or_default(),
                iterations: iteration,
                converged: false,
            };
            return Ok(Outcome::new(estimate, diagnostics));
        }

        let end = curvature_at_end(&seg_pts, CurveForm::Bezier);
        let length = curve.arc_length(0.0, t);
        // also catches a NaN length
        if !(length > config.zero_threshold) {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::ZeroArcLength,
                    format!("segment [0, {t:.3e}] has no measurable arc length"),
                )
                .with_value(length)
                .with_tolerance(config.zero_threshold),
            );
            let estimate = DcdsEstimate {
                value: last.unwrap_or_default(),
                iterations: iteration,
                converged: false,
            };
            return Ok(Outcome::new(estimate, diagnostics));
        }
        let estimate = (end - c0) / length;

        let settled = last.is_some_and(|prev| {
            within(estimate, prev, config.relative_tolerance, config.zero_threshold)
        });
        if settled {
            let estimate = DcdsEstimate {
                value: estimate,
                iterations: iteration,
                converged: true,
            };
            return Ok(Outcome::new(estimate, diagnostics));
        }
        last = Some(estimate);
        t *= config.shrink;
    }

    diagnostics.push(
        Diagnostic::warning(
            DiagnosticCode::DcdsNotConverged,
            format!("no stable dC/ds after {} segments", config.max_iterations),
        )
        .with_tolerance(config.relative_tolerance),
    );
    let estimate = DcdsEstimate {
        value: last.unwrap_or_default(),
        iterations: config.max_iterations,
        converged: false,
    };
    Ok(Outcome::new(estimate, diagnostics))
}

/// dC/ds at the last pole, moving back into the curve.
pub fn dcds_at_end(poly: &Poly4, config: &DcdsConfig) -> Result<Outcome<DcdsEstimate>, GridError> {
    dcds_at_start(&poly.reversed(), config)
}

/// Bezier poles of the first span of a 6P curve.
pub fn first_span(poly: &Poly6) -> Result<Poly4, GridError> {
    span(poly, 0.0, 1.0 / 3.0)
}

/// Bezier poles of the last span of a 6P curve.
pub fn last_span(poly: &Poly6) -> Result<Poly4, GridError> {
    span(poly, 2.0 / 3.0, 1.0)
}

fn span(poly: &Poly6, t0: f64, t1: f64) -> Result<Poly4, GridError> {
    let piece = build_pinned_6p(poly)?.segment(t0, t1)?;
    Poly4::try_from(piece.poles())
}

/// dC/ds at the start of a 6P curve, measured on its first span.
pub fn dcds_6p_at_start(poly: &Poly6, config: &DcdsConfig) -> Result<Outcome<DcdsEstimate>, GridError> {
    dcds_at_start(&first_span(poly)?, config)
}

/// dC/ds at the end of a 6P curve, moving back into it.
pub fn dcds_6p_at_end(poly: &Poly6, config: &DcdsConfig) -> Result<Outcome<DcdsEstimate>, GridError> {
    dcds_at_end(&last_span(poly)?, config)
}
