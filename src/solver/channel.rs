//! Analytical 1D channel transport.
//!
//! Closed-form solution of the 1D advection-dispersion equation for a
//! point-mass injection of mass `m` into segment `i0` of a channel with
//! uniform velocity `v`, water level `h`, width `w` and dispersion `D`:
//!
//! ```text
//! c_ini = m / (w·h·L)
//! c(x, τ) = c_ini·L / sqrt(4πDτ) · exp(−(x − x0 − vτ)² / (4Dτ))     D > 0
//! ```
//!
//! With `D = 0` the injected slug is advected without spreading and split
//! linearly between the two segments bracketing `x0 + vτ`. At `τ = 0` the
//! whole `c_ini` sits in segment `i0`.
//!
//! Injections superpose: every contribution is added to the grid.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use adr_rs::mesh::ChannelMesh;
//! use adr_rs::solver::{ChannelFlow, ChannelTransportSolver};
//! use adr_rs::source::Injection;
//! use adr_rs::time::TimeAxis;
//! use adr_rs::types::TimeIndex;
//!
//! let mesh = Arc::new(ChannelMesh::uniform(1000.0, 1000).unwrap());
//! let axis = TimeAxis::uniform(0, 1000, 101).unwrap().shared();
//! let flow = ChannelFlow::new(1.0, 1.0, 1.0, 0.0).unwrap();
//!
//! let mut solver = ChannelTransportSolver::builder()
//!     .mesh(mesh)
//!     .flow(flow)
//!     .time_axis(axis)
//!     .build()
//!     .unwrap();
//!
//! solver.add_injection(Injection::channel(500.5, 0, 10.0));
//! solver.solve().unwrap();
//!
//! let m = solver.moments(TimeIndex::new(100)).unwrap();
//! assert!((m.centroid - 600.5).abs() < 1e-6);
//! ```

use std::f64::consts::PI;
use std::sync::Arc;

use crate::error::{Result, TransportError, ensure_finite, ensure_non_negative, ensure_positive};
use crate::mesh::ChannelMesh;
use crate::source::{Injection, InjectionLocation, is_contributing};
use crate::time::TimeAxis;
use crate::types::{SegmentIndex, TimeIndex};

use super::diagnostics::SolveProgress;
use super::grid::ConcentrationGrid;
use super::moments::{Moments1D, weighted_moments};
use super::SolverState;

/// Uniform flow parameters of a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelFlow {
    /// Flow velocity along the channel (m/s)
    pub velocity: f64,
    /// Water level (m)
    pub water_level: f64,
    /// Channel width (m)
    pub width: f64,
    /// Longitudinal dispersion coefficient (m²/s); zero means pure advection
    pub dispersion: f64,
}

impl ChannelFlow {
    /// Validate and create flow parameters.
    ///
    /// # Errors
    /// `NonPositive` for water level or width, `Negative` for dispersion,
    /// `NonFinite` for a NaN/infinite velocity.
    pub fn new(velocity: f64, water_level: f64, width: f64, dispersion: f64) -> Result<Self> {
        Ok(Self {
            velocity: ensure_finite("flow velocity", velocity)?,
            water_level: ensure_positive("water level", water_level)?,
            width: ensure_positive("channel width", width)?,
            dispersion: ensure_non_negative("dispersion coefficient", dispersion)?,
        })
    }

    /// Wetted cross-section `w·h`.
    #[inline]
    pub fn cross_section(&self) -> f64 {
        self.width * self.water_level
    }
}

/// Unconfigured channel solver; collects geometry, flow and time axis.
#[derive(Default)]
pub struct ChannelSolverBuilder {
    mesh: Option<Arc<ChannelMesh>>,
    flow: Option<ChannelFlow>,
    axis: Option<Arc<TimeAxis>>,
}

impl ChannelSolverBuilder {
    pub fn mesh(mut self, mesh: Arc<ChannelMesh>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn flow(mut self, flow: ChannelFlow) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn time_axis(mut self, axis: Arc<TimeAxis>) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Allocate the concentration grid.
    ///
    /// # Errors
    /// `Unconfigured` naming the first missing part.
    pub fn build(self) -> Result<ChannelTransportSolver> {
        let mesh = self.mesh.ok_or(TransportError::Unconfigured("channel mesh"))?;
        let flow = self.flow.ok_or(TransportError::Unconfigured("channel flow"))?;
        let axis = self.axis.ok_or(TransportError::Unconfigured("time axis"))?;
        Ok(ChannelTransportSolver::new(mesh, flow, axis))
    }
}

/// Injection resolved onto the discretization.
#[derive(Clone, Copy, Debug)]
struct ResolvedInjection {
    segment: SegmentIndex,
    time_millis: i64,
    mass: f64,
}

/// 1D analytical transport on an equal-segment channel.
///
/// Lifecycle: [`ChannelSolverBuilder`] (unconfigured) →
/// [`SolverState::Discretized`] → [`SolverState::Solved`].
/// [`reset_concentration`](Self::reset_concentration) returns to
/// `Discretized` and keeps the geometry.
pub struct ChannelTransportSolver {
    mesh: Arc<ChannelMesh>,
    flow: ChannelFlow,
    axis: Arc<TimeAxis>,
    concentration: ConcentrationGrid,
    pending: Vec<Injection>,
    state: SolverState,
}

impl ChannelTransportSolver {
    pub fn builder() -> ChannelSolverBuilder {
        ChannelSolverBuilder::default()
    }

    /// Create a discretized solver with a zeroed grid.
    pub fn new(mesh: Arc<ChannelMesh>, flow: ChannelFlow, axis: Arc<TimeAxis>) -> Self {
        let concentration = ConcentrationGrid::zeros(mesh.n_segments(), axis.len());
        log::debug!(
            "channel solver: {} segments of {:.3} m, {} timesteps",
            mesh.n_segments(),
            mesh.segment_length(),
            axis.len()
        );
        Self {
            mesh,
            flow,
            axis,
            concentration,
            pending: Vec::new(),
            state: SolverState::Discretized,
        }
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn mesh(&self) -> &Arc<ChannelMesh> {
        &self.mesh
    }

    pub fn flow(&self) -> &ChannelFlow {
        &self.flow
    }

    pub fn time_axis(&self) -> &Arc<TimeAxis> {
        &self.axis
    }

    /// Read-only concentration grid.
    pub fn concentration(&self) -> &ConcentrationGrid {
        &self.concentration
    }

    /// Injections registered but not yet solved.
    pub fn pending_injections(&self) -> &[Injection] {
        &self.pending
    }

    /// Register an injection for the next [`solve`](Self::solve).
    pub fn add_injection(&mut self, injection: Injection) {
        self.pending.push(injection);
    }

    pub fn add_injections(&mut self, injections: impl IntoIterator<Item = Injection>) {
        self.pending.extend(injections);
    }

    /// Apply all pending injections.
    pub fn solve(&mut self) -> Result<()> {
        self.solve_with_progress(|_| {})
    }

    /// Apply all pending injections, reporting advisory progress.
    ///
    /// Every pending injection is resolved before any is applied, so a
    /// failing injection leaves the grid untouched and the queue intact.
    ///
    /// # Errors
    /// `LocationMismatch` for surface locations, `OutsideDomain` for
    /// distances outside the channel.
    pub fn solve_with_progress<F>(&mut self, mut progress: F) -> Result<()>
    where
        F: FnMut(SolveProgress),
    {
        let resolved = self
            .pending
            .iter()
            .map(|inj| self.resolve(inj))
            .collect::<Result<Vec<_>>>()?;
        self.pending.clear();

        let total: usize = resolved
            .iter()
            .map(|r| self.timesteps_from(r.time_millis).len())
            .sum();
        let mut completed = 0;

        for r in &resolved {
            self.apply(r, &mut |n| {
                completed += n;
                progress(SolveProgress::new(completed, total));
            });
        }

        self.state = SolverState::Solved;
        Ok(())
    }

    /// Inject immediately at a distance along the channel.
    pub fn inject(&mut self, injection: &Injection) -> Result<()> {
        let r = self.resolve(injection)?;
        self.apply(&r, &mut |_| {});
        self.state = SolverState::Solved;
        Ok(())
    }

    /// Inject `mass` into segment `i0` at `time_millis`.
    ///
    /// # Panics
    /// Panics if `i0` is outside the discretization.
    pub fn inject_at_segment(&mut self, i0: SegmentIndex, time_millis: i64, mass: f64) {
        assert!(
            i0.get() < self.mesh.n_segments(),
            "segment {} out of range (0..{})",
            i0,
            self.mesh.n_segments()
        );
        let r = ResolvedInjection {
            segment: i0,
            time_millis,
            mass,
        };
        self.apply(&r, &mut |_| {});
        self.state = SolverState::Solved;
    }

    /// Inject a uniform `concentration` over the span `[start_x, stop_x]`.
    ///
    /// Each covered segment receives one point injection whose mass is the
    /// concentration times the covered part of the segment volume.
    /// Returns the number of segments injected.
    pub fn inject_rectangular(
        &mut self,
        start_x: f64,
        stop_x: f64,
        time_millis: i64,
        concentration: f64,
    ) -> usize {
        let segment_volume = self.flow.cross_section() * self.mesh.segment_length();
        let mut count = 0;

        for i in SegmentIndex::iter(self.mesh.n_segments()) {
            let coverage = self.mesh.coverage(i, start_x, stop_x);
            if coverage <= 0.0 {
                continue;
            }
            self.inject_at_segment(i, time_millis, concentration * segment_volume * coverage);
            count += 1;
        }

        if count == 0 {
            log::debug!(
                "rectangular injection [{}, {}] covers no segment",
                start_x,
                stop_x
            );
        }
        count
    }

    /// Zero the grid and return to [`SolverState::Discretized`].
    pub fn reset_concentration(&mut self) {
        self.concentration.fill_zero();
        self.state = SolverState::Discretized;
    }

    fn resolve(&self, injection: &Injection) -> Result<ResolvedInjection> {
        let InjectionLocation::Channel { distance } = injection.location else {
            return Err(TransportError::LocationMismatch {
                expected: "channel",
            });
        };
        let segment = self
            .mesh
            .segment_containing(distance)
            .ok_or(TransportError::OutsideDomain {
                what: "channel distance",
                value: distance,
            })?;
        Ok(ResolvedInjection {
            segment,
            time_millis: injection.time_millis,
            mass: injection.mass,
        })
    }

    /// Timesteps at or after an injection time.
    fn timesteps_from(&self, time_millis: i64) -> std::ops::Range<usize> {
        match self.axis.first_index_at_or_after(time_millis) {
            Some(t0) => t0.get()..self.axis.len(),
            None => 0..0,
        }
    }

    fn apply(&mut self, r: &ResolvedInjection, on_step: &mut dyn FnMut(usize)) {
        let steps = self.timesteps_from(r.time_millis);

        if !is_contributing(r.mass) {
            log::debug!(
                "skipping non-contributing injection of {} kg at {}",
                r.mass,
                r.segment
            );
            on_step(steps.len());
            return;
        }
        if steps.is_empty() {
            log::debug!(
                "injection at t={} ms lies after the last timestep",
                r.time_millis
            );
            return;
        }

        let l = self.mesh.segment_length();
        let c_ini = r.mass / (self.flow.cross_section() * l);
        let x0 = self.mesh.centerline(r.segment);
        let mut dropped = 0.0_f64;

        for t in steps.map(TimeIndex::new) {
            let tau = self.axis.elapsed_seconds(t, r.time_millis);

            if tau == 0.0 {
                self.concentration.add(r.segment, t, c_ini);
            } else if !self.resolves_spread(tau) {
                // Spread below one segment is deposited as pure advection
                let lost = self.deposit_advected(r.segment, t, tau, c_ini);
                dropped = dropped.max(lost);
            } else {
                self.deposit_gaussian(x0, t, tau, c_ini);
            }
            on_step(1);
        }

        if dropped > 0.0 {
            log::warn!(
                "injection at {} (t={} ms) advected out of the channel; up to {:.1}% of its mass dropped",
                r.segment,
                r.time_millis,
                dropped * 100.0
            );
        }
    }

    /// True if the dispersive spread `sqrt(2Dτ)` spans at least one segment.
    fn resolves_spread(&self, tau: f64) -> bool {
        (2.0 * self.flow.dispersion * tau).sqrt() >= self.mesh.segment_length()
    }

    /// Pure advection: linear split between the bracketing segments.
    ///
    /// Portions that fall outside the channel are dropped. Returns the
    /// dropped fraction of `c_ini`.
    fn deposit_advected(&mut self, i0: SegmentIndex, t: TimeIndex, tau: f64, c_ini: f64) -> f64 {
        let n = self.mesh.n_segments() as f64;
        let pos = i0.get() as f64 + self.flow.velocity * tau / self.mesh.segment_length();
        let lower = pos.floor();
        let frac = pos - lower;

        let mut dropped = 0.0;
        for (index, weight) in [(lower, 1.0 - frac), (lower + 1.0, frac)] {
            if weight == 0.0 {
                continue;
            }
            if index >= 0.0 && index < n {
                self.concentration
                    .add(SegmentIndex::new(index as usize), t, c_ini * weight);
            } else {
                dropped += weight;
            }
        }
        dropped
    }

    /// Advection with dispersion: Gaussian over every segment.
    fn deposit_gaussian(&mut self, x0: f64, t: TimeIndex, tau: f64, c_ini: f64) {
        let d = self.flow.dispersion;
        let l = self.mesh.segment_length();
        let peak = c_ini * l / (4.0 * PI * d * tau).sqrt();
        let center = x0 + self.flow.velocity * tau;
        let denom = 4.0 * d * tau;

        for i in SegmentIndex::iter(self.mesh.n_segments()) {
            let dx = self.mesh.centerline(i) - center;
            let c = peak * (-dx * dx / denom).exp();
            if c > 0.0 {
                self.concentration.add(i, t, c);
            }
        }
    }

    // =========================================================================
    // Derived statistics
    // =========================================================================

    /// First and second moments over all segments at timestep `t`.
    ///
    /// Returns `None` when the channel holds no mass at `t`.
    pub fn moments(&self, t: TimeIndex) -> Option<Moments1D> {
        weighted_moments(
            self.mesh
                .centerlines()
                .iter()
                .copied()
                .zip(self.concentration.profile(t)),
        )
    }

    /// Moments for every timestep.
    pub fn moment_series(&self) -> Vec<Option<Moments1D>> {
        self.axis.indices().map(|t| self.moments(t)).collect()
    }

    /// Mass-weighted centroid at `t`.
    pub fn first_moment(&self, t: TimeIndex) -> Option<f64> {
        self.moments(t).map(|m| m.centroid)
    }

    /// Mass-weighted variance about the centroid at `t`.
    pub fn second_moment(&self, t: TimeIndex) -> Option<f64> {
        self.moments(t).map(|m| m.variance)
    }

    /// Mass in the channel at `t`: `Σ c_i·w·h·L`.
    pub fn total_mass(&self, t: TimeIndex) -> f64 {
        let volume = self.flow.cross_section() * self.mesh.segment_length();
        self.concentration.profile(t).sum::<f64>() * volume
    }

    /// Concentration time series at one segment (breakthrough curve).
    pub fn breakthrough(&self, i: SegmentIndex) -> &[f64] {
        self.concentration.segment_series(i)
    }

    /// Segment with the highest concentration at `t`, if any is positive.
    pub fn peak_segment(&self, t: TimeIndex) -> Option<SegmentIndex> {
        self.concentration
            .profile(t)
            .enumerate()
            .filter(|&(_, c)| c > 0.0)
            .fold(None, |best: Option<(usize, f64)>, (i, c)| match best {
                Some((_, bc)) if bc >= c => best,
                _ => Some((i, c)),
            })
            .map(|(i, _)| SegmentIndex::new(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn solver(n: usize, length: f64, dispersion: f64, steps: usize) -> ChannelTransportSolver {
        let mesh = Arc::new(ChannelMesh::uniform(length, n).unwrap());
        let axis = TimeAxis::uniform(0, 1000, steps).unwrap().shared();
        let flow = ChannelFlow::new(1.0, 1.0, 1.0, dispersion).unwrap();
        ChannelTransportSolver::new(mesh, flow, axis)
    }

    #[test]
    fn test_builder_requires_all_parts() {
        let err = ChannelTransportSolver::builder().build().err().unwrap();
        assert_eq!(err, TransportError::Unconfigured("channel mesh"));
    }

    #[test]
    fn test_flow_validation() {
        assert!(ChannelFlow::new(1.0, 0.0, 1.0, 0.0).is_err());
        assert!(ChannelFlow::new(1.0, 1.0, 1.0, -0.1).is_err());
        assert!(ChannelFlow::new(f64::NAN, 1.0, 1.0, 0.0).is_err());
        assert!(ChannelFlow::new(-1.0, 1.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn test_state_transitions() {
        let mut s = solver(10, 10.0, 0.0, 3);
        assert_eq!(s.state(), SolverState::Discretized);
        s.inject_at_segment(SegmentIndex::new(2), 0, 1.0);
        assert_eq!(s.state(), SolverState::Solved);
        s.reset_concentration();
        assert_eq!(s.state(), SolverState::Discretized);
        assert!(s.concentration().as_slice().iter().all(|&c| c == 0.0));
        assert_eq!(s.mesh().n_segments(), 10);
    }

    #[test]
    fn test_zero_elapsed_deposits_initial_concentration() {
        let mut s = solver(10, 20.0, 0.5, 3);
        s.inject_at_segment(SegmentIndex::new(4), 0, 6.0);

        // c_ini = m / (w·h·L) = 6 / 2
        let t0 = TimeIndex::ZERO;
        assert!((s.concentration().get(SegmentIndex::new(4), t0) - 3.0).abs() < TOL);
        let others: f64 = s.concentration().profile(t0).sum::<f64>() - 3.0;
        assert!(others.abs() < TOL);
    }

    #[test]
    fn test_advection_split_between_segments() {
        // v·τ / L = 0.5 per second
        let mut s = solver(10, 20.0, 0.0, 3);
        s.inject_at_segment(SegmentIndex::new(2), 0, 2.0);

        let t1 = TimeIndex::new(1);
        assert!((s.concentration().get(SegmentIndex::new(2), t1) - 0.5).abs() < TOL);
        assert!((s.concentration().get(SegmentIndex::new(3), t1) - 0.5).abs() < TOL);
        assert!((s.total_mass(t1) - 2.0).abs() < TOL);

        let t2 = TimeIndex::new(2);
        assert!((s.concentration().get(SegmentIndex::new(3), t2) - 1.0).abs() < TOL);
    }

    #[test]
    fn test_advection_out_of_domain_drops_mass() {
        let mut s = solver(5, 5.0, 0.0, 4);
        s.inject_at_segment(SegmentIndex::new(4), 0, 1.0);
        assert!((s.total_mass(TimeIndex::ZERO) - 1.0).abs() < TOL);
        assert_eq!(s.total_mass(TimeIndex::new(2)), 0.0);
        assert!(s.moments(TimeIndex::new(2)).is_none());
    }

    #[test]
    fn test_non_positive_mass_is_noop() {
        let mut s = solver(10, 10.0, 1.0, 5);
        s.inject_at_segment(SegmentIndex::new(3), 0, 0.0);
        s.inject_at_segment(SegmentIndex::new(3), 0, -4.0);
        assert!(s.concentration().as_slice().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_gaussian_conserves_mass() {
        let mut s = solver(400, 400.0, 0.5, 50);
        s.inject_at_segment(SegmentIndex::new(100), 0, 3.0);
        for t in [1, 10, 49] {
            let m = s.total_mass(TimeIndex::new(t));
            assert!((m - 3.0).abs() < 1e-6, "mass {} at t={}", m, t);
        }

        // Variance grows as 2Dτ
        let m = s.moments(TimeIndex::new(40)).unwrap();
        assert!((m.variance - 2.0 * 0.5 * 40.0).abs() < 0.1);
        assert!((m.centroid - (100.5 + 40.0)).abs() < 1e-6);
    }

    #[test]
    fn test_narrow_spread_conserves_mass() {
        // sqrt(2Dτ) stays far below one segment for the whole run
        let mut s = solver(100, 100.0, 1e-4, 4);
        s.inject_at_segment(SegmentIndex::new(10), 0, 1.0);
        for t in 1..4 {
            let t = TimeIndex::new(t);
            assert!((s.total_mass(t) - 1.0).abs() < TOL, "mass at {}", t);
            assert!((s.first_moment(t).unwrap() - (10.5 + t.get() as f64)).abs() < TOL);
        }
    }

    #[test]
    fn test_spread_switches_to_gaussian_once_resolved() {
        // D = 0.125: sqrt(2Dτ) reaches L = 1 at τ = 4 s
        let mut s = solver(200, 200.0, 0.125, 10);
        s.inject_at_segment(SegmentIndex::new(50), 0, 2.0);

        let t3 = TimeIndex::new(3);
        assert_eq!(s.concentration().get(SegmentIndex::new(53), t3), 2.0);
        assert!((s.total_mass(t3) - 2.0).abs() < TOL);

        let t9 = TimeIndex::new(9);
        assert!(s.concentration().get(SegmentIndex::new(59), t9) < 2.0);
        assert!((s.total_mass(t9) - 2.0).abs() < 1e-6);
        assert!((s.second_moment(t9).unwrap() - 2.0 * 0.125 * 9.0).abs() < 1e-3);
    }

    #[test]
    fn test_injection_between_timesteps() {
        let mut s = solver(100, 100.0, 0.0, 5);
        s.inject(&Injection::channel(10.5, 500, 1.0)).unwrap();

        // Nothing before the injection, advected by 0.5 m at the first later step
        assert_eq!(s.total_mass(TimeIndex::ZERO), 0.0);
        let m = s.moments(TimeIndex::new(1)).unwrap();
        assert!((m.centroid - 11.0).abs() < TOL);
    }

    #[test]
    fn test_resolve_errors_keep_queue() {
        let mut s = solver(10, 10.0, 0.0, 3);
        s.add_injection(Injection::channel(1.0, 0, 1.0));
        s.add_injection(Injection::channel(50.0, 0, 1.0));

        let err = s.solve().unwrap_err();
        assert!(matches!(err, TransportError::OutsideDomain { .. }));
        assert_eq!(s.pending_injections().len(), 2);
        assert!(s.concentration().as_slice().iter().all(|&c| c == 0.0));

        let err = s.inject(&Injection::surface(1.0, 1.0, 0, 1.0)).unwrap_err();
        assert_eq!(err, TransportError::LocationMismatch { expected: "channel" });
    }

    #[test]
    fn test_rectangular_profile() {
        let mut s = solver(10, 10.0, 0.0, 2);
        // Covers half of segment 2, all of 3 and 4
        let n = s.inject_rectangular(2.5, 5.0, 0, 2.0);
        assert_eq!(n, 3);
        let t0 = TimeIndex::ZERO;
        assert!((s.concentration().get(SegmentIndex::new(2), t0) - 1.0).abs() < TOL);
        assert!((s.concentration().get(SegmentIndex::new(3), t0) - 2.0).abs() < TOL);
        assert!((s.total_mass(t0) - 5.0).abs() < TOL);
    }

    #[test]
    fn test_progress_reaches_total() {
        let mut s = solver(10, 10.0, 0.0, 4);
        s.add_injection(Injection::channel(1.0, 0, 1.0));
        s.add_injection(Injection::channel(2.0, 2000, 1.0));

        let mut last = None;
        s.solve_with_progress(|p| last = Some(p)).unwrap();
        assert_eq!(last, Some(SolveProgress::new(6, 6)));
        assert_eq!(s.state(), SolverState::Solved);
    }

    #[test]
    fn test_peak_segment() {
        let mut s = solver(10, 10.0, 0.0, 3);
        assert_eq!(s.peak_segment(TimeIndex::ZERO), None);
        s.inject_at_segment(SegmentIndex::new(6), 0, 1.0);
        assert_eq!(s.peak_segment(TimeIndex::ZERO), Some(SegmentIndex::new(6)));
        assert_eq!(s.breakthrough(SegmentIndex::new(7))[1], 1.0);
    }
}
