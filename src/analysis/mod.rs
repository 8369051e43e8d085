//! Validation of particle-tracking results against analytical moments.
//!
//! # Example
//!
//! ```
//! use adr_rs::analysis::compare_moment_series;
//! use adr_rs::solver::{Moments1D, weighted_moments};
//!
//! // Reference moments from a solver, measured moments from particle positions
//! let reference = vec![Some(Moments1D { total: 1.0, centroid: 600.5, variance: 0.0 })];
//! let particles = [600.0, 601.0];
//! let measured = vec![weighted_moments(particles.iter().map(|&x| (x, 1.0)))];
//!
//! let cmp = compare_moment_series(&reference, &measured).unwrap();
//! assert!(cmp.centroid.within(1e-9));
//! assert!((cmp.variance.max_error - 0.25).abs() < 1e-12);
//! ```

mod metrics;

pub use metrics::{
    ComparisonMetrics, MomentComparison, MomentComparison2D, compare_moment_series,
    compare_moment_series_2d,
};
