//! Spatial moment statistics of a distribution.
//!
//! For weights `c_i` at positions `x_i`:
//!
//! ```text
//! M1 = Σ c_i x_i / Σ c_i
//! M2 = Σ c_i (x_i − M1)² / Σ c_i
//! ```
//!
//! A distribution with no positive total has no moments; callers receive
//! `None` rather than NaN.

use serde::{Deserialize, Serialize};

/// First and second moments of a 1D distribution at one timestep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Moments1D {
    /// Σ c_i (sum of weights)
    pub total: f64,
    /// First moment, the weighted centroid
    pub centroid: f64,
    /// Second central moment, the weighted variance
    pub variance: f64,
}

impl Moments1D {
    /// Weighted standard deviation.
    pub fn spread(&self) -> f64 {
        self.variance.max(0.0).sqrt()
    }
}

/// First and second moments of a 2D distribution at one timestep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Moments2D {
    /// Total mass
    pub total: f64,
    /// Mass-weighted center `[x, y]`
    pub center: [f64; 2],
    /// Mass-weighted variance about the center, per axis
    pub variance: [f64; 2],
}

/// Moments of `weights` placed at `positions`.
///
/// Returns `None` when the weights do not sum to a positive finite value.
/// Two passes are used so the variance is taken about the final centroid.
pub fn weighted_moments<I>(samples: I) -> Option<Moments1D>
where
    I: Iterator<Item = (f64, f64)> + Clone,
{
    let (total, first) = samples
        .clone()
        .fold((0.0, 0.0), |(s, m), (x, c)| (s + c, m + c * x));

    if !(total.is_finite() && total > 0.0) {
        return None;
    }
    let centroid = first / total;

    let second = samples.fold(0.0, |acc, (x, c)| {
        let d = x - centroid;
        acc + c * d * d
    });

    Some(Moments1D {
        total,
        centroid,
        variance: second / total,
    })
}
