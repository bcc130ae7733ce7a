//! Structured status reported alongside best-effort geometry.
//!
//! Operations that can degrade return an [`Outcome`]: the geometry plus the
//! [`Diagnostics`] raised while building it. An empty warning list means the
//! result is exact.

use std::fmt;

use tracing::{debug, warn};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The result deviates from the exact construction.
    Warning,
    /// Informational: the path taken, not a loss of quality.
    Info,
}

/// Enumeration of diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // --- Input shape ---
    /// Degenerate grid edges do not close into a triangle.
    OpenTriangle,
    /// A boundary leg has zero length, so its direction is undefined.
    ZeroLengthTangent,
    /// A curve measured for dC/ds has no arc length.
    ZeroArcLength,

    // --- Numerical fallbacks ---
    /// Rotate mode could not build a tangent plane at the apex.
    RotateFallback,
    /// Three points meant to span a plane are collinear.
    DegeneratePlane,
    /// Star fill with a sub-grid count that has no tuned spread constant.
    UntunedStarArity,

    // --- Iterative procedures ---
    /// Curvature at a shrinking segment start drifted from the full curve start.
    SegmentationCollapse,
    /// dC/ds estimate stopped at the iteration cap.
    DcdsNotConverged,
    /// Inner blend scales reached a clamp limit and stayed there.
    ScalePinned,
    /// G3 search ended without meeting its tolerance.
    G3NotConverged,
    /// G3 search ran the coupled symmetric path.
    SymmetricSearch,
    /// Bisection did not meet its tolerance.
    IntersectionNotConverged,
    /// Surface normal undefined at the projection.
    SingularNormal,
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Measured value, e.g. the gap that failed a closure check.
    pub numeric_value: Option<f64>,
    /// The threshold that was exceeded.
    pub tolerance: Option<f64>,
}

impl Diagnostic {
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: message.into(),
            numeric_value: None,
            tolerance: None,
        }
    }

    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            ..Self::warning(code, message)
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.numeric_value = Some(value);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = Some(tol);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sev = match self.severity {
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
        };
        write!(f, "[{}] {} (code: {})", sev, self.message, self.code)?;
        if let Some(val) = self.numeric_value {
            write!(f, " value={val:.2e}")?;
        }
        if let Some(tol) = self.tolerance {
            write!(f, " tol={tol:.2e}")?;
        }
        Ok(())
    }
}

/// Ordered list of diagnostics raised by one operation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and mirror it to the log.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => warn!(
                code = %diagnostic.code,
                value = diagnostic.numeric_value,
                tol = diagnostic.tolerance,
                "{}",
                diagnostic.message
            ),
            Severity::Info => debug!(code = %diagnostic.code, "{}", diagnostic.message),
        }
        self.entries.push(diagnostic);
    }

    /// Append diagnostics already logged by a nested operation.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Filter by code.
    pub fn of(&self, code: DiagnosticCode) -> Vec<&Diagnostic> {
        self.entries.iter().filter(|d| d.code == code).collect()
    }

    pub fn has(&self, code: DiagnosticCode) -> bool {
        self.entries.iter().any(|d| d.code == code)
    }

    /// True when nothing degraded the result.
    pub fn is_exact(&self) -> bool {
        self.warning_count() == 0
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} diagnostics ({} warnings)", self.len(), self.warning_count())?;
        for d in &self.entries {
            writeln!(f, "  {d}")?;
        }
        Ok(())
    }
}

/// Geometry together with the diagnostics raised while building it.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Diagnostics,
}

impl<T> Outcome<T> {
    pub fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    /// A result with nothing to report.
    pub fn exact(value: T) -> Self {
        Self::new(value, Diagnostics::new())
    }

    pub fn is_exact(&self) -> bool {
        self.diagnostics.is_exact()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome::new(f(self.value), self.diagnostics)
    }

    pub fn into_parts(self) -> (T, Diagnostics) {
        (self.value, self.diagnostics)
    }
}
