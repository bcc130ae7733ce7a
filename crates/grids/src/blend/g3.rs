use tracing::{debug, info, instrument};

use super::g2::flowing_pair;
use super::{BlendScales, blend_g2};
use crate::Tolerance;
use crate::analysis::{CurveForm, curvature_at_end, curvature_at_start};
use crate::config::G3SearchConfig;
use crate::dcds::{dcds_6p_at_end, dcds_6p_at_start, dcds_at_end, dcds_at_start};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics};
use crate::error::GridError;
use crate::poly::{Poly4, Poly6};

/// Result of the approximate G3 search.
#[derive(Debug, Clone)]
pub struct G3Result {
    pub converged: bool,
    pub iterations: usize,
    /// Both ends matched, so the inner scales moved together.
    pub symmetric: bool,
    /// Input tangent scales with the inner scales the search settled on.
    pub scales: BlendScales,
    pub poly: Poly6,
    /// Weighted dC/ds errors at the start and end of the blend.
    pub errors: [f64; 2],
    pub diagnostics: Diagnostics,
}

/// Signed dC/ds error, amplified when the target is close to zero.
fn weighted_error(actual: f64, target: f64) -> f64 {
    let reference = if target == 0.0 { actual.abs() } else { target.abs() };
    if reference == 0.0 {
        return 0.0;
    }
    (actual - target) * (1.0 + 1.0 / reference) / 2.0
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn largest(errors: &[f64; 2]) -> f64 {
    errors[0].abs().max(errors[1].abs())
}

fn finite_targets(targets: [f64; 2]) -> Result<[f64; 2], GridError> {
    for (end, value) in ["start", "end"].into_iter().zip(targets) {
        if !value.is_finite() {
            return Err(GridError::NonFiniteTarget { end, value });
        }
    }
    Ok(targets)
}

struct Search<'a> {
    a: Poly4,
    b: Poly4,
    scales: BlendScales,
    targets: [f64; 2],
    config: &'a G3SearchConfig,
    tol: &'a Tolerance,
}

impl Search<'_> {
    fn errors(&self, inner: [f64; 2]) -> Result<[f64; 2], GridError> {
        let blend = blend_g2(&self.a, &self.b, &self.scales.with_inner(inner[0], inner[1]), self.tol)?;
        let start = dcds_6p_at_start(&blend.poly, &self.config.dcds)?.value.value;
        let end = dcds_6p_at_end(&blend.poly, &self.config.dcds)?.value.value;
        Ok([
            weighted_error(start, self.targets[0]),
            weighted_error(end, self.targets[1]),
        ])
    }

    /// +1 when the error of `param` grows with its scale.
    fn slope(&self, inner: [f64; 2], errors: &[f64; 2], param: usize, symmetric: bool) -> Result<f64, GridError> {
        let mut probe = inner;
        probe[param] += self.config.probe;
        if symmetric {
            probe = [probe[param]; 2];
        }
        let moved = self.errors(probe)?;
        let s = sign(moved[param] - errors[param]);
        Ok(if s == 0.0 { 1.0 } else { s })
    }
}

/// Blend with inner scales tuned so dC/ds at both far ends approximately
/// matches the inputs.
///
/// The search adjusts the inner scale whose error is larger, or both together
/// when the two ends mirror each other. Steps halve when the error changes
/// sign and when both errors grow past their starting size (that move is
/// undone). Scales stay within the configured clamp. A search that runs out
/// of iterations or sits on a clamp limit returns its best scales.
#[instrument(skip(a, b, config, tol))]
pub fn blend_g3(
    a: &Poly4,
    b: &Poly4,
    scales: &BlendScales,
    config: &G3SearchConfig,
    tol: &Tolerance,
) -> Result<G3Result, GridError> {
    let (a, b) = flowing_pair(a, b, tol)?;
    let mut diagnostics = Diagnostics::new();

    let target_start = dcds_at_start(&a, &config.dcds)?;
    let target_end = dcds_at_end(&b, &config.dcds)?;
    let targets = finite_targets([target_start.value.value, target_end.value.value])?;
    diagnostics.extend(target_start.diagnostics);
    diagnostics.extend(target_end.diagnostics);

    let pa = a.points();
    let curvature = [
        curvature_at_start(pa[0], pa[1], pa[2], CurveForm::Bezier),
        curvature_at_end(&b.points(), CurveForm::Bezier),
    ];
    let symmetric = (curvature[0] - curvature[1]).abs() <= config.symmetry_tolerance
        && (targets[0] - targets[1]).abs() <= config.symmetry_tolerance;
    if symmetric {
        diagnostics.push(Diagnostic::info(
            DiagnosticCode::SymmetricSearch,
            "mirrored ends, inner scales move together",
        ));
    }

    let search = Search {
        a,
        b,
        scales: *scales,
        targets,
        config,
        tol,
    };

    let mut inner = [config.initial_scale; 2];
    let mut step = [config.initial_step; 2];
    let mut errors = search.errors(inner)?;
    let initial = errors.map(f64::abs);
    let mut slope = [
        search.slope(inner, &errors, 0, symmetric)?,
        search.slope(inner, &errors, 1, symmetric)?,
    ];
    let mut best = (largest(&errors), inner, errors);
    let mut pinned = 0;
    let mut converged = false;
    let mut iterations = 0;

    for iteration in 1..=config.max_iterations {
        iterations = iteration;
        if largest(&errors) < config.tolerance {
            converged = true;
            best = (largest(&errors), inner, errors);
            break;
        }

        let param = if symmetric || errors[0].abs() >= errors[1].abs() { 0 } else { 1 };
        let direction = -sign(errors[param]) * slope[param];
        let mut trial = inner;
        trial[param] = (inner[param] + direction * step[param]).clamp(config.min_scale, config.max_scale);
        if symmetric {
            trial = [trial[0]; 2];
        }

        let trial_errors = search.errors(trial)?;
        debug!(
            iteration,
            inner_start = trial[0],
            inner_end = trial[1],
            error_start = trial_errors[0],
            error_end = trial_errors[1],
            "g3 step"
        );

        if trial_errors.iter().zip(&initial).all(|(e, bound)| e.abs() > *bound) {
            step[param] /= 2.0;
            continue;
        }

        if sign(trial_errors[param]) != sign(errors[param]) {
            step[param] /= 2.0;
        } else if trial_errors[param].abs() > errors[param].abs() {
            slope[param] = -slope[param];
        }

        let stuck = trial == inner;
        inner = trial;
        errors = trial_errors;
        if largest(&errors) < best.0 {
            best = (largest(&errors), inner, errors);
        }

        let at_limit = inner
            .iter()
            .any(|&s| s == config.min_scale || s == config.max_scale);
        pinned = if stuck && at_limit { pinned + 1 } else { 0 };
        if pinned >= config.pinned_limit {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticCode::ScalePinned,
                    format!("inner scales held at a clamp limit for {pinned} steps"),
                )
                .with_value(inner[param]),
            );
            break;
        }
    }

    let (_, inner, errors) = best;
    if !converged {
        diagnostics.push(
            Diagnostic::warning(
                DiagnosticCode::G3NotConverged,
                format!("dC/ds search stopped after {iterations} iterations"),
            )
            .with_value(largest(&errors))
            .with_tolerance(config.tolerance),
        );
    }

    let final_scales = scales.with_inner(inner[0], inner[1]);
    let blend = blend_g2(&search.a, &search.b, &final_scales, tol)?;
    diagnostics.extend(blend.diagnostics);

    info!(converged, iterations, symmetric, "g3 blend search finished");

    Ok(G3Result {
        converged,
        iterations,
        symmetric,
        scales: final_scales,
        poly: blend.poly,
        errors,
        diagnostics,
    })
}
