//! Bounding tolerances for nearest-node queries.

use serde::{Deserialize, Serialize};

/// Per-axis rejection thresholds for a nearest-node search.
///
/// A node is a candidate only if `|dx| <= max_xy`, `|dy| <= max_xy`
/// and `|dz| <= max_z`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchTolerance {
    /// Horizontal threshold (m), applied to x and y separately
    pub max_xy: f64,
    /// Vertical threshold (m)
    pub max_z: f64,
}

impl SearchTolerance {
    /// Default horizontal threshold of the coarse policy (m).
    pub const COARSE_XY: f64 = 1000.0;
    /// Default vertical threshold of the coarse policy (m).
    pub const COARSE_Z: f64 = 100.0;
    /// Default horizontal threshold of the fine policy (m).
    pub const FINE_XY: f64 = 25.0;
    /// Default vertical threshold of the fine policy (m).
    pub const FINE_Z: f64 = 5.0;

    pub const fn new(max_xy: f64, max_z: f64) -> Self {
        Self { max_xy, max_z }
    }

    /// Wide tolerance for sparse 3D grids.
    pub const fn coarse() -> Self {
        Self::new(Self::COARSE_XY, Self::COARSE_Z)
    }

    /// Tight tolerance for points converted from geographic coordinates.
    pub const fn fine() -> Self {
        Self::new(Self::FINE_XY, Self::FINE_Z)
    }

    /// Cheap per-axis rejection test.
    #[inline]
    pub fn admits(&self, dx: f64, dy: f64, dz: f64) -> bool {
        dx.abs() <= self.max_xy && dy.abs() <= self.max_xy && dz.abs() <= self.max_z
    }
}

impl Default for SearchTolerance {
    fn default() -> Self {
        Self::coarse()
    }
}
