//! Error types for transport solver setup.

use thiserror::Error;

/// Errors raised while configuring a velocity field or a transport solver.
///
/// Degenerate numerical cases (zero dispersion, zero elapsed time, zero
/// total mass) are not errors; they have defined fallbacks in the solvers.
#[derive(Debug, Error, PartialEq)]
pub enum TransportError {
    /// Two arrays that must agree in length do not
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A count or length that must be strictly positive
    #[error("{what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: f64 },

    /// A physical parameter that must be non-negative
    #[error("{what} must be non-negative, got {value}")]
    Negative { what: &'static str, value: f64 },

    /// NaN or infinite input
    #[error("{what} must be finite")]
    NonFinite { what: &'static str },

    /// Time axis has no entries
    #[error("Time axis contains no timestamps")]
    EmptyTimeAxis,

    /// Time axis is not strictly increasing
    #[error("Non-monotonic time axis at index {index}")]
    NonMonotonicTime { index: usize },

    /// Injection lies outside the discretized domain
    #[error("{what} {value} lies outside the discretized domain")]
    OutsideDomain { what: &'static str, value: f64 },

    /// Injection location does not match the solver geometry
    #[error("Injection location kind mismatch: expected a {expected} location")]
    LocationMismatch { expected: &'static str },

    /// Material tag beyond the configured material count
    #[error("Material {material} out of range (solver has {n_materials})")]
    MaterialOutOfRange { material: usize, n_materials: usize },

    /// Builder is missing a required part
    #[error("Solver is not configured: missing {0}")]
    Unconfigured(&'static str),
}

/// Result alias for transport setup.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Require `value > 0` and finite.
pub(crate) fn ensure_positive(what: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(TransportError::NonFinite { what });
    }
    if value <= 0.0 {
        return Err(TransportError::NonPositive { what, value });
    }
    Ok(value)
}

/// Require `value >= 0` and finite.
pub(crate) fn ensure_non_negative(what: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(TransportError::NonFinite { what });
    }
    if value < 0.0 {
        return Err(TransportError::Negative { what, value });
    }
    Ok(value)
}

/// Require a finite value of any sign.
pub(crate) fn ensure_finite(what: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(TransportError::NonFinite { what })
    }
}
