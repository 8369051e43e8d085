//! # adr-rs
//!
//! Analytical (closed-form) solutions of the advection-dispersion equation
//! for contaminant transport, used as a reference when validating a
//! Lagrangian particle tracker.
//!
//! This crate provides:
//! - A spatiotemporal velocity field with nearest-node and time-interpolated queries
//! - A 1D channel solver on equal segments (Gaussian and pure-advection cases)
//! - A 2D surface solver on a regular raster with per-material mass layers
//! - Spatial moments (centroid, variance) and comparison metrics
//! - Serde scenario configuration
//!
//! All interfaces are in-memory; file formats, particle simulation and
//! rendering live elsewhere.

pub mod analysis;
pub mod config;
pub mod error;
pub mod field;
pub mod mesh;
pub mod solver;
pub mod source;
pub mod time;
pub mod types;

pub use analysis::{ComparisonMetrics, MomentComparison, compare_moment_series};
pub use config::{ConfigError, Scenario, ScenarioConfig};
pub use error::{Result, TransportError};
pub use field::{Node, SearchTolerance, VelocityField};
pub use mesh::{ChannelMesh, Raster2D};
pub use solver::{
    ChannelFlow, ChannelTransportSolver, Moments1D, Moments2D, ProgressReporter, SolveProgress,
    SolverState, SurfaceFlow, SurfaceTransportSolver,
};
pub use source::{Injection, InjectionLocation};
pub use time::TimeAxis;
