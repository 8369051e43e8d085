//! Comparison metrics for validating particle-tracking results.
//!
//! The analytical moments are the reference; the moments measured from a
//! particle cloud are the observation.

use crate::solver::{Moments1D, Moments2D};

/// Statistical comparison metrics between two series.
///
/// All metrics assume the first series is the reference and the second is
/// the measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ComparisonMetrics {
    /// Root mean square error: sqrt(mean((measured - reference)²))
    pub rmse: f64,
    /// Mean absolute error: mean(|measured - reference|)
    pub mae: f64,
    /// Bias (mean error): mean(measured - reference)
    pub bias: f64,
    /// Maximum absolute error
    pub max_error: f64,
    /// Largest error relative to the reference magnitude (zero references skipped)
    pub max_relative_error: f64,
    /// Number of data points
    pub n_points: usize,
}

impl ComparisonMetrics {
    /// Compute comparison metrics between reference and measured series.
    ///
    /// Returns `None` for empty series.
    ///
    /// # Panics
    ///
    /// Panics if the series have different lengths.
    pub fn compute(reference: &[f64], measured: &[f64]) -> Option<Self> {
        assert_eq!(
            reference.len(),
            measured.len(),
            "Reference and measured series must have same length"
        );
        if reference.is_empty() {
            return None;
        }
        let n = reference.len() as f64;

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut sum_abs = 0.0;
        let mut max_error = 0.0_f64;
        let mut max_relative_error = 0.0_f64;

        for (&r, &m) in reference.iter().zip(measured) {
            let e = m - r;
            sum += e;
            sum_sq += e * e;
            sum_abs += e.abs();
            max_error = max_error.max(e.abs());
            if r.abs() > 1e-12 {
                max_relative_error = max_relative_error.max((e / r).abs());
            }
        }

        Some(Self {
            rmse: (sum_sq / n).sqrt(),
            mae: sum_abs / n,
            bias: sum / n,
            max_error,
            max_relative_error,
            n_points: reference.len(),
        })
    }

    /// Check if every point is within `tolerance` of the reference.
    pub fn within(&self, tolerance: f64) -> bool {
        self.max_error <= tolerance
    }
}

/// Agreement between reference and measured 1D moment series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MomentComparison {
    /// Errors in the first moment (centroid)
    pub centroid: ComparisonMetrics,
    /// Errors in the second moment (variance)
    pub variance: ComparisonMetrics,
}

/// Compare two moment series timestep by timestep.
///
/// Only timesteps where both series have moments are paired. Returns
/// `None` if no timestep pairs up.
///
/// # Panics
///
/// Panics if the series have different lengths.
pub fn compare_moment_series(
    reference: &[Option<Moments1D>],
    measured: &[Option<Moments1D>],
) -> Option<MomentComparison> {
    assert_eq!(
        reference.len(),
        measured.len(),
        "Moment series must cover the same timesteps"
    );

    let (mut r1, mut m1, mut r2, mut m2) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    for (r, m) in reference.iter().zip(measured) {
        if let (Some(r), Some(m)) = (r, m) {
            r1.push(r.centroid);
            m1.push(m.centroid);
            r2.push(r.variance);
            m2.push(m.variance);
        }
    }

    Some(MomentComparison {
        centroid: ComparisonMetrics::compute(&r1, &m1)?,
        variance: ComparisonMetrics::compute(&r2, &m2)?,
    })
}

/// Agreement between reference and measured 2D moment series, per axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MomentComparison2D {
    pub x: MomentComparison,
    pub y: MomentComparison,
}

/// Compare two 2D moment series axis by axis.
pub fn compare_moment_series_2d(
    reference: &[Option<Moments2D>],
    measured: &[Option<Moments2D>],
) -> Option<MomentComparison2D> {
    let project = |series: &[Option<Moments2D>], axis: usize| -> Vec<Option<Moments1D>> {
        series
            .iter()
            .map(|m| {
                m.map(|m| Moments1D {
                    total: m.total,
                    centroid: m.center[axis],
                    variance: m.variance[axis],
                })
            })
            .collect()
    };

    Some(MomentComparison2D {
        x: compare_moment_series(&project(reference, 0), &project(measured, 0))?,
        y: compare_moment_series(&project(reference, 1), &project(measured, 1))?,
    })
}
