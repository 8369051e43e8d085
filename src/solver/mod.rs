//! Analytical transport solvers.
//!
//! # Submodules
//!
//! - [`channel`]: 1D equal-segment channel solver
//! - [`surface`]: 2D raster surface solver
//! - [`grid`]: dense accumulation grids owned by the solvers
//! - [`moments`]: centroid and variance statistics
//! - [`diagnostics`]: progress reporting
//!
//! Each solver owns its grid exclusively. Injections are applied one after
//! another; within an injection the per-cell work is independent.

pub mod channel;
pub mod diagnostics;
pub mod grid;
pub mod moments;
pub mod surface;

pub use channel::{ChannelFlow, ChannelSolverBuilder, ChannelTransportSolver};
pub use diagnostics::{ProgressReporter, SolveProgress};
pub use grid::{ConcentrationGrid, MassGrid};
pub use moments::{Moments1D, Moments2D, weighted_moments};
pub use surface::{SurfaceFlow, SurfaceSolverBuilder, SurfaceTransportSolver};

/// Lifecycle of a configured solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverState {
    /// Geometry and flow fixed, grid holds no solved injection
    Discretized,
    /// At least one injection has been applied
    Solved,
}
