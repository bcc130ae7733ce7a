//! Configuration for grid synthesis, blending and analysis.
//!
//! Every struct deserializes with missing fields taken from `Default`, so a
//! JSON document only needs to name the values it overrides.

use serde::{Deserialize, Serialize};

use crate::Tolerance;
use crate::error::GridError;

/// Finite-difference dC/ds estimation on shrinking segments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DcdsConfig {
    /// Maximum number of segment shrinks.
    pub max_iterations: usize,
    /// Factor applied to the segment end parameter each iteration.
    pub shrink: f64,
    /// Relative change between successive estimates that counts as converged.
    pub relative_tolerance: f64,
    /// Relative drift of the segment start curvature that counts as collapse.
    pub collapse_tolerance: f64,
    /// Magnitudes below this are compared absolutely instead of relatively.
    pub zero_threshold: f64,
}

impl Default for DcdsConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            shrink: 0.9,
            relative_tolerance: 1e-2,
            collapse_tolerance: 5e-2,
            zero_threshold: 1e-9,
        }
    }
}

/// Parameter search for the approximate G3 blend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct G3SearchConfig {
    pub max_iterations: usize,
    /// Inner scales the search starts from.
    pub initial_scale: f64,
    /// First step applied to an inner scale.
    pub initial_step: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Both weighted dC/ds errors below this count as converged.
    pub tolerance: f64,
    /// Consecutive steps at a clamp limit before the search gives up.
    pub pinned_limit: usize,
    /// Curvature and dC/ds targets closer than this are symmetric.
    pub symmetry_tolerance: f64,
    /// Scale increment of the finite-difference slope probe.
    pub probe: f64,
    pub dcds: DcdsConfig,
}

impl Default for G3SearchConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            initial_scale: 1.0,
            initial_step: 0.25,
            min_scale: 0.75,
            max_scale: 3.0,
            tolerance: 1e-5,
            pinned_limit: 5,
            symmetry_tolerance: 1e-8,
            probe: 1e-4,
            dcds: DcdsConfig::default(),
        }
    }
}

impl G3SearchConfig {
    /// Loose tolerance and a short budget for interactive previews.
    pub fn preview() -> Self {
        Self {
            max_iterations: 60,
            tolerance: 1e-3,
            ..Self::default()
        }
    }

    /// Tight tolerance with a larger iteration budget.
    pub fn precise() -> Self {
        Self {
            max_iterations: 400,
            tolerance: 1e-7,
            ..Self::default()
        }
    }
}

/// N-sided corner fill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StarConfig {
    /// Diagonal spread for N = 3, 4, 5, 6. `None` is untuned and falls back to 1.0.
    pub spread: [Option<f64>; 4],
    /// Flatten the ring of diagonal poles onto their best-fit plane.
    pub squish: bool,
}

impl Default for StarConfig {
    fn default() -> Self {
        Self {
            spread: [Some(0.75), None, Some(1.25), Some(1.5)],
            squish: false,
        }
    }
}

impl StarConfig {
    pub fn squished() -> Self {
        Self {
            squish: true,
            ..Self::default()
        }
    }
}

/// Bisection for the legacy curve/surface intersection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 100,
        }
    }
}

/// All tunables in one place.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub tolerance: Tolerance,
    /// Weight of the poles that collapse onto a degenerate apex.
    pub collapsed_weight: f64,
    pub g3: G3SearchConfig,
    pub star: StarConfig,
    pub intersection: IntersectionConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            collapsed_weight: 1.0,
            g3: G3SearchConfig::default(),
            star: StarConfig::default(),
            intersection: IntersectionConfig::default(),
        }
    }
}

impl GridConfig {
    pub fn from_json_str(json: &str) -> Result<Self, GridError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = GridConfig::from_json_str(r#"{ "g3": { "max_iterations": 50 }, "star": { "squish": true } }"#)
            .unwrap();
        assert_eq!(cfg.g3.max_iterations, 50);
        assert!((cfg.g3.max_scale - 3.0).abs() < 1e-12);
        assert!(cfg.star.squish);
        assert_eq!(cfg.star.spread[0], Some(0.75));
        assert!((cfg.tolerance.coincidence - 1e-6).abs() < 1e-18);
        assert!((cfg.collapsed_weight - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dcds_settings_live_under_g3() {
        let cfg = GridConfig::from_json_str(r#"{ "g3": { "dcds": { "max_iterations": 7, "shrink": 0.25 } } }"#)
            .unwrap();
        assert_eq!(cfg.g3.dcds.max_iterations, 7);
        assert!((cfg.g3.dcds.shrink - 0.25).abs() < 1e-12);
        assert!((cfg.g3.dcds.relative_tolerance - 1e-2).abs() < 1e-15);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = GridConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, GridError::Config(_)));
    }

    #[test]
    fn test_presets() {
        assert!(G3SearchConfig::preview().tolerance > G3SearchConfig::default().tolerance);
        assert!(G3SearchConfig::precise().max_iterations > G3SearchConfig::default().max_iterations);
        assert!(StarConfig::squished().squish);
    }
}
