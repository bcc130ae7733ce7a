//! Six-pole blend curves joining two cubic Beziers at a shared corner.
//!
//! [`blend_g2`] is exact by construction: it keeps the outer tangent legs of
//! both inputs and rescales leg lengths and leg heights so curvature at the
//! far ends is unchanged. [`blend_g3`] searches the two inner scales so the
//! rate of change of curvature at the far ends also approximately matches.

mod g2;
mod g3;
mod seam;

use serde::{Deserialize, Serialize};

pub use g2::{BlendOutcome, blend_g2};
pub use g3::{G3Result, blend_g3};
pub use seam::{SeamBlendParams, blend_grid44_pair};

/// Leg scales of a blend, from the start of the blend to its end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendScales {
    /// First leg, as a multiple of the first leg of the elevated input.
    pub tangent_start: f64,
    /// Tangential part of the second leg.
    pub inner_start: f64,
    /// Tangential part of the second to last leg.
    pub inner_end: f64,
    /// Last leg.
    pub tangent_end: f64,
}

impl Default for BlendScales {
    fn default() -> Self {
        Self {
            tangent_start: 2.0,
            inner_start: 3.0,
            inner_end: 3.0,
            tangent_end: 2.0,
        }
    }
}

impl BlendScales {
    pub fn new(tangent_start: f64, inner_start: f64, inner_end: f64, tangent_end: f64) -> Self {
        Self {
            tangent_start,
            inner_start,
            inner_end,
            tangent_end,
        }
    }

    /// Same tangent scales, different inner scales.
    pub fn with_inner(&self, inner_start: f64, inner_end: f64) -> Self {
        Self {
            inner_start,
            inner_end,
            ..*self
        }
    }
}
