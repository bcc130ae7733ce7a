//! Control-grid synthesis: boundary poles from oriented input polygons,
//! interior poles from fixed construction rules.
//!
//! Interior weights are the product of the two nearest boundary weights. This
//! is a heuristic: it keeps existing designs stable but carries no rational
//! continuity guarantee.

mod combine;
mod degenerate;
mod grid44;
mod grid64;
mod grid66;

pub use combine::{grid66_from_subgrids, subgrid33_from_grid64s};
pub use degenerate::{DegenerateMode, build_grid44_degenerate, build_grid64_degenerate};
pub use grid44::{build_grid44, rotate_grid44};
pub use grid64::{build_grid64, grid64_from_grid44_corner};
pub use grid66::build_grid66;
