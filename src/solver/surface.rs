//! Analytical 2D surface transport.
//!
//! Closed-form solution of the 2D advection-dispersion equation for a
//! point-mass injection `m` at `(x0, y0)` in uniform flow `(vx, vy)` with
//! dispersion `(Dx, Dy)`:
//!
//! ```text
//! m(x, y, τ) = m / (4πτ·sqrt(Dx·Dy)) · exp(−dx²/(4Dx·τ) − dy²/(4Dy·τ))
//! dx = x − x0 − vx·(τ + ε0),  dy = y − y0 − vy·(τ + ε0)
//! ```
//!
//! multiplied by the cell area and accumulated into `mass[x][y][t][material]`.
//! The kernel factors into one weight per column times one weight per row,
//! which is how it is evaluated here. A zero dispersion on an axis collapses
//! that axis to the cell containing the advected position.

use std::f64::consts::PI;
use std::sync::Arc;

use crate::error::{Result, TransportError, ensure_finite, ensure_non_negative, ensure_positive};
use crate::mesh::Raster2D;
use crate::source::{Injection, InjectionLocation, is_contributing};
use crate::time::TimeAxis;
use crate::types::{CellIndex, MaterialIndex, TimeIndex};

use super::diagnostics::SolveProgress;
use super::grid::MassGrid;
use super::moments::Moments2D;
use super::SolverState;

/// Uniform flow over the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceFlow {
    /// Flow velocity `[vx, vy]` (m/s)
    pub velocity: [f64; 2],
    /// Water depth (m)
    pub depth: f64,
    /// Dispersion coefficients `[Dx, Dy]` (m²/s)
    pub dispersion: [f64; 2],
    /// Offset ε0 added to the elapsed time in the advection term (s)
    pub first_step_offset: f64,
    /// Elapsed time used at τ = 0 (s). `None` deposits the full mass in
    /// the injection cell instead, at `(x0, y0)` without the ε0 shift.
    pub elapsed_floor: Option<f64>,
}

impl SurfaceFlow {
    /// Validate and create flow parameters.
    pub fn new(velocity: [f64; 2], depth: f64, dispersion: [f64; 2]) -> Result<Self> {
        Ok(Self {
            velocity: [
                ensure_finite("flow velocity x", velocity[0])?,
                ensure_finite("flow velocity y", velocity[1])?,
            ],
            depth: ensure_positive("water depth", depth)?,
            dispersion: [
                ensure_non_negative("dispersion coefficient x", dispersion[0])?,
                ensure_non_negative("dispersion coefficient y", dispersion[1])?,
            ],
            first_step_offset: 0.0,
            elapsed_floor: None,
        })
    }

    pub fn with_first_step_offset(mut self, seconds: f64) -> Self {
        self.first_step_offset = seconds;
        self
    }

    pub fn with_elapsed_floor(mut self, seconds: f64) -> Self {
        self.elapsed_floor = Some(seconds);
        self
    }

    /// Use one nominal timestep of `axis` as the elapsed floor.
    ///
    /// A single-sample axis has no step; the solver then rejects the flow.
    pub fn with_step_floor(self, axis: &TimeAxis) -> Self {
        self.with_elapsed_floor(axis.nominal_step_seconds())
    }

    fn validate(&self) -> Result<()> {
        ensure_non_negative("first step offset", self.first_step_offset)?;
        if let Some(eps) = self.elapsed_floor {
            ensure_positive("elapsed time floor", eps)?;
        }
        Ok(())
    }
}

/// Unconfigured surface solver.
pub struct SurfaceSolverBuilder {
    raster: Option<Arc<Raster2D>>,
    flow: Option<SurfaceFlow>,
    axis: Option<Arc<TimeAxis>>,
    n_materials: usize,
}

impl Default for SurfaceSolverBuilder {
    fn default() -> Self {
        Self {
            raster: None,
            flow: None,
            axis: None,
            n_materials: 1,
        }
    }
}

impl SurfaceSolverBuilder {
    pub fn raster(mut self, raster: Arc<Raster2D>) -> Self {
        self.raster = Some(raster);
        self
    }

    pub fn flow(mut self, flow: SurfaceFlow) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn time_axis(mut self, axis: Arc<TimeAxis>) -> Self {
        self.axis = Some(axis);
        self
    }

    /// Number of material layers (default 1).
    pub fn materials(mut self, n_materials: usize) -> Self {
        self.n_materials = n_materials;
        self
    }

    pub fn build(self) -> Result<SurfaceTransportSolver> {
        let raster = self.raster.ok_or(TransportError::Unconfigured("raster"))?;
        let flow = self.flow.ok_or(TransportError::Unconfigured("surface flow"))?;
        let axis = self.axis.ok_or(TransportError::Unconfigured("time axis"))?;
        SurfaceTransportSolver::new(raster, flow, axis, self.n_materials)
    }
}

#[derive(Clone, Copy, Debug)]
struct ResolvedInjection {
    x0: f64,
    y0: f64,
    time_millis: i64,
    mass: f64,
    material: MaterialIndex,
}

/// 2D analytical transport on a regular raster.
pub struct SurfaceTransportSolver {
    raster: Arc<Raster2D>,
    flow: SurfaceFlow,
    axis: Arc<TimeAxis>,
    n_materials: usize,
    /// Allocated on the first contributing injection
    grid: Option<MassGrid>,
    pending: Vec<Injection>,
    state: SolverState,
}

impl SurfaceTransportSolver {
    pub fn builder() -> SurfaceSolverBuilder {
        SurfaceSolverBuilder::default()
    }

    /// Create a discretized solver. The mass grid is not allocated yet.
    ///
    /// # Errors
    /// `NonPositive` for zero materials or a non-positive elapsed floor.
    pub fn new(
        raster: Arc<Raster2D>,
        flow: SurfaceFlow,
        axis: Arc<TimeAxis>,
        n_materials: usize,
    ) -> Result<Self> {
        if n_materials == 0 {
            return Err(TransportError::NonPositive {
                what: "material count",
                value: 0.0,
            });
        }
        flow.validate()?;

        Ok(Self {
            raster,
            flow,
            axis,
            n_materials,
            grid: None,
            pending: Vec::new(),
            state: SolverState::Discretized,
        })
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn raster(&self) -> &Arc<Raster2D> {
        &self.raster
    }

    pub fn flow(&self) -> &SurfaceFlow {
        &self.flow
    }

    pub fn time_axis(&self) -> &Arc<TimeAxis> {
        &self.axis
    }

    pub fn n_materials(&self) -> usize {
        self.n_materials
    }

    /// Read-only mass grid, `None` before the first contributing injection.
    pub fn mass_grid(&self) -> Option<&MassGrid> {
        self.grid.as_ref()
    }

    pub fn pending_injections(&self) -> &[Injection] {
        &self.pending
    }

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

    /// Apply all pending injections, reporting advisory progress after
    /// each (injection, timestep) sweep.
    ///
    /// # Errors
    /// `LocationMismatch`, `NonFinite` or `MaterialOutOfRange` for an
    /// invalid injection; nothing is applied in that case.
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

    /// Apply one injection immediately.
    pub fn inject(&mut self, injection: &Injection) -> Result<()> {
        let r = self.resolve(injection)?;
        self.apply(&r, &mut |_| {});
        self.state = SolverState::Solved;
        Ok(())
    }

    /// Drop the mass grid and return to [`SolverState::Discretized`].
    pub fn reset_mass(&mut self) {
        self.grid = None;
        self.state = SolverState::Discretized;
    }

    fn resolve(&self, injection: &Injection) -> Result<ResolvedInjection> {
        let InjectionLocation::Surface { x, y } = injection.location else {
            return Err(TransportError::LocationMismatch {
                expected: "surface",
            });
        };
        ensure_finite("injection x", x)?;
        ensure_finite("injection y", y)?;
        if injection.material >= self.n_materials {
            return Err(TransportError::MaterialOutOfRange {
                material: injection.material,
                n_materials: self.n_materials,
            });
        }
        Ok(ResolvedInjection {
            x0: x,
            y0: y,
            time_millis: injection.time_millis,
            mass: injection.mass,
            material: injection.material_index(),
        })
    }

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
                "skipping non-contributing surface injection of {} kg at ({}, {})",
                r.mass,
                r.x0,
                r.y0
            );
            on_step(steps.len());
            return;
        }
        if steps.is_empty() {
            log::debug!(
                "surface injection at t={} ms lies after the last timestep",
                r.time_millis
            );
            return;
        }

        let raster = Arc::clone(&self.raster);
        let (n_times, n_materials) = (self.axis.len(), self.n_materials);
        let grid = self.grid.get_or_insert_with(|| {
            log::debug!(
                "allocating surface mass grid {} x {} x {} x {}",
                raster.nx,
                raster.ny,
                n_times,
                n_materials
            );
            MassGrid::zeros(raster.nx, raster.ny, n_times, n_materials)
        });

        for t in steps.map(TimeIndex::new) {
            let tau = self.axis.elapsed_seconds(t, r.time_millis);
            let kernel = SeparableKernel::evaluate(&raster, &self.flow, r.x0, r.y0, tau);
            deposit(grid, &kernel, t, r.material, r.mass);
            on_step(1);
        }
    }

    // =========================================================================
    // Derived queries
    // =========================================================================

    /// Mass in a cell at (timestep, material); zero before allocation.
    ///
    /// # Panics
    /// Panics if any index is outside the discretization.
    pub fn mass(&self, cell: CellIndex, t: TimeIndex, material: MaterialIndex) -> f64 {
        self.check_indices(cell, t, material);
        self.grid
            .as_ref()
            .map_or(0.0, |g| g.get(cell, t, material))
    }

    /// Depth-averaged concentration in a cell (kg/m³).
    pub fn concentration(&self, cell: CellIndex, t: TimeIndex, material: MaterialIndex) -> f64 {
        self.mass(cell, t, material) / (self.raster.cell_area() * self.flow.depth)
    }

    /// Total mass over the raster at `t`, all materials.
    pub fn total_mass(&self, t: TimeIndex) -> f64 {
        self.weighted_sum(t, |_, _, m| m)
    }

    /// Total mass of one material at `t`.
    pub fn total_material_mass(&self, t: TimeIndex, material: MaterialIndex) -> f64 {
        self.check_indices(CellIndex::new(0, 0), t, material);
        let Some(grid) = &self.grid else {
            return 0.0;
        };
        let mut sum = 0.0;
        for ix in 0..self.raster.nx {
            for iy in 0..self.raster.ny {
                sum += grid.get(CellIndex::new(ix, iy), t, material);
            }
        }
        sum
    }

    /// Mass-weighted center `[x, y]` at `t`, or `None` with no mass.
    pub fn center_of_mass(&self, t: TimeIndex) -> Option<[f64; 2]> {
        let total = self.positive_total(t)?;
        let sx = self.weighted_sum(t, |x, _, m| m * x);
        let sy = self.weighted_sum(t, |_, y, m| m * y);
        Some([sx / total, sy / total])
    }

    /// Mass-weighted squared deviation `[σx², σy²]` about `center` at `t`,
    /// or `None` with no mass.
    pub fn variance(&self, t: TimeIndex, center: [f64; 2]) -> Option<[f64; 2]> {
        let total = self.positive_total(t)?;
        let vx = self.weighted_sum(t, |x, _, m| m * (x - center[0]).powi(2));
        let vy = self.weighted_sum(t, |_, y, m| m * (y - center[1]).powi(2));
        Some([vx / total, vy / total])
    }

    /// Total mass, center and variance about that center at `t`.
    pub fn moments(&self, t: TimeIndex) -> Option<Moments2D> {
        let center = self.center_of_mass(t)?;
        let variance = self.variance(t, center)?;
        Some(Moments2D {
            total: self.total_mass(t),
            center,
            variance,
        })
    }

    /// Moments for every timestep.
    pub fn moment_series(&self) -> Vec<Option<Moments2D>> {
        self.axis.indices().map(|t| self.moments(t)).collect()
    }

    fn positive_total(&self, t: TimeIndex) -> Option<f64> {
        let total = self.total_mass(t);
        (total.is_finite() && total > 0.0).then_some(total)
    }

    /// Σ f(x_center, y_center, cell mass) over the raster at `t`.
    fn weighted_sum<F>(&self, t: TimeIndex, f: F) -> f64
    where
        F: Fn(f64, f64, f64) -> f64,
    {
        assert!(
            t.get() < self.axis.len(),
            "timestep {} out of range (0..{})",
            t,
            self.axis.len()
        );
        let Some(grid) = &self.grid else {
            return 0.0;
        };
        let mut sum = 0.0;
        for ix in 0..self.raster.nx {
            let x = self.raster.center_x(ix);
            for iy in 0..self.raster.ny {
                let m = grid.cell_total(CellIndex::new(ix, iy), t);
                if m != 0.0 {
                    sum += f(x, self.raster.center_y(iy), m);
                }
            }
        }
        sum
    }

    fn check_indices(&self, cell: CellIndex, t: TimeIndex, material: MaterialIndex) {
        assert!(
            cell.ix < self.raster.nx && cell.iy < self.raster.ny,
            "cell {} out of range ({} x {})",
            cell,
            self.raster.nx,
            self.raster.ny
        );
        assert!(
            t.get() < self.axis.len(),
            "timestep {} out of range (0..{})",
            t,
            self.axis.len()
        );
        assert!(
            material.get() < self.n_materials,
            "material {} out of range (0..{})",
            material,
            self.n_materials
        );
    }
}

/// Per-column and per-row weights of one (injection, timestep) kernel.
///
/// `wx[ix]·wy[iy]` is the fraction of the injected mass landing in cell
/// `(ix, iy)`.
struct SeparableKernel {
    wx: Vec<f64>,
    wy: Vec<f64>,
}

impl SeparableKernel {
    fn evaluate(raster: &Raster2D, flow: &SurfaceFlow, x0: f64, y0: f64, tau: f64) -> Self {
        // τ = 0 without a floor: whole mass in the injection cell
        let (tau, point) = if tau > 0.0 {
            (tau, false)
        } else {
            match flow.elapsed_floor {
                Some(eps) => (eps, false),
                None => (0.0, true),
            }
        };

        let (cx, cy) = if point {
            (x0, y0)
        } else {
            let advect = tau + flow.first_step_offset;
            (x0 + flow.velocity[0] * advect, y0 + flow.velocity[1] * advect)
        };

        let dx_disp = if point { 0.0 } else { flow.dispersion[0] };
        let dy_disp = if point { 0.0 } else { flow.dispersion[1] };

        let wx = axis_weights(
            (0..raster.nx).map(|i| raster.center_x(i)),
            raster.dx,
            cx,
            dx_disp,
            tau,
            raster.column_containing(cx),
        );
        let wy = axis_weights(
            (0..raster.ny).map(|i| raster.center_y(i)),
            raster.dy,
            cy,
            dy_disp,
            tau,
            raster.row_containing(cy),
        );

        Self { wx, wy }
    }
}

/// 1D factor of the kernel along one raster axis.
///
/// `sqrt(2Dτ) ≥ cell`: `cell / sqrt(4πDτ) · exp(−(x_i − center)² / (4Dτ))`.
/// Narrower spreads (including `D = 0`): one in the cell containing
/// `center`, zero elsewhere, so the axis still sums to one.
fn axis_weights(
    cell_centers: impl ExactSizeIterator<Item = f64>,
    cell: f64,
    center: f64,
    dispersion: f64,
    tau: f64,
    containing: Option<usize>,
) -> Vec<f64> {
    if dispersion > 0.0 && (2.0 * dispersion * tau).sqrt() >= cell {
        let denom = 4.0 * dispersion * tau;
        let scale = cell / (PI * denom).sqrt();
        return cell_centers
            .map(|xi| {
                let d = xi - center;
                scale * (-d * d / denom).exp()
            })
            .collect();
    }

    let mut w = vec![0.0; cell_centers.len()];
    if let Some(i) = containing {
        w[i] = 1.0;
    }
    w
}

fn deposit(
    grid: &mut MassGrid,
    kernel: &SeparableKernel,
    t: TimeIndex,
    m: MaterialIndex,
    mass: f64,
) {
    #[cfg(feature = "parallel")]
    deposit_parallel(grid, kernel, t, m, mass);
    #[cfg(not(feature = "parallel"))]
    deposit_serial(grid, kernel, t, m, mass);
}

/// `(offset within a column block, y weight)` for every row with mass.
fn row_targets(
    grid: &MassGrid,
    kernel: &SeparableKernel,
    t: TimeIndex,
    m: MaterialIndex,
) -> Vec<(usize, f64)> {
    kernel
        .wy
        .iter()
        .enumerate()
        .filter(|&(_, &w)| w > 0.0)
        .map(|(iy, &w)| (grid.column_offset(iy, t, m), w))
        .collect()
}

#[inline]
fn fill_column(column: &mut [f64], wx: f64, rows: &[(usize, f64)], mass: f64) {
    if wx > 0.0 {
        let scaled = mass * wx;
        for &(k, wy) in rows {
            column[k] += scaled * wy;
        }
    }
}

#[cfg(any(test, not(feature = "parallel")))]
fn deposit_serial(
    grid: &mut MassGrid,
    kernel: &SeparableKernel,
    t: TimeIndex,
    m: MaterialIndex,
    mass: f64,
) {
    let rows = row_targets(grid, kernel, t, m);
    if rows.is_empty() {
        return;
    }
    for (ix, column) in grid.columns_mut().enumerate() {
        fill_column(column, kernel.wx[ix], &rows, mass);
    }
}

/// Columns are disjoint, so each one is filled on its own rayon task.
#[cfg(feature = "parallel")]
fn deposit_parallel(
    grid: &mut MassGrid,
    kernel: &SeparableKernel,
    t: TimeIndex,
    m: MaterialIndex,
    mass: f64,
) {
    use rayon::prelude::*;

    let rows = row_targets(grid, kernel, t, m);
    if rows.is_empty() {
        return;
    }
    grid.par_columns_mut()
        .enumerate()
        .for_each(|(ix, column)| fill_column(column, kernel.wx[ix], &rows, mass));
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    fn solver(flow: SurfaceFlow, n_materials: usize) -> SurfaceTransportSolver {
        let raster = Arc::new(Raster2D::new((0.0, 0.0), 1.0, 1.0, 100, 80).unwrap());
        let axis = TimeAxis::uniform(0, 1000, 21).unwrap().shared();
        SurfaceTransportSolver::new(raster, flow, axis, n_materials).unwrap()
    }

    fn flow(v: [f64; 2], d: [f64; 2]) -> SurfaceFlow {
        SurfaceFlow::new(v, 1.0, d).unwrap()
    }

    #[test]
    fn test_lazy_allocation() {
        let mut s = solver(flow([0.0, 0.0], [0.1, 0.1]), 1);
        assert!(s.mass_grid().is_none());
        s.inject(&Injection::surface(10.0, 10.0, 0, 0.0)).unwrap();
        assert!(s.mass_grid().is_none());
        assert_eq!(s.total_mass(TimeIndex::new(3)), 0.0);
        assert!(s.center_of_mass(TimeIndex::new(3)).is_none());

        s.inject(&Injection::surface(10.0, 10.0, 0, 1.0)).unwrap();
        assert!(s.mass_grid().is_some());
    }

    #[test]
    fn test_zero_elapsed_point_deposit() {
        let mut s = solver(flow([1.0, 0.0], [0.5, 0.5]), 1);
        s.inject(&Injection::surface(20.5, 30.5, 0, 4.0)).unwrap();
        let t0 = TimeIndex::ZERO;
        let cell = CellIndex::new(20, 30);
        assert_eq!(s.mass(cell, t0, MaterialIndex::ZERO), 4.0);
        assert_eq!(s.total_mass(t0), 4.0);
    }

    #[test]
    fn test_elapsed_floor_spreads_at_injection_time() {
        let f = flow([0.0, 0.0], [0.5, 0.5]).with_elapsed_floor(1.0);
        let mut s = solver(f, 1);
        s.inject(&Injection::surface(20.5, 30.5, 0, 4.0)).unwrap();
        let t0 = TimeIndex::ZERO;
        assert!(s.mass(CellIndex::new(20, 30), t0, MaterialIndex::ZERO) < 4.0);
        assert!((s.total_mass(t0) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_gaussian_mass_and_moments() {
        let mut s = solver(flow([1.0, 0.5], [0.5, 0.25]), 1);
        s.inject(&Injection::surface(20.5, 20.5, 0, 2.0)).unwrap();

        let t = TimeIndex::new(10);
        assert!((s.total_mass(t) - 2.0).abs() < 1e-6);

        let m = s.moments(t).unwrap();
        assert!((m.center[0] - 30.5).abs() < 1e-6);
        assert!((m.center[1] - 25.5).abs() < 1e-6);
        assert!((m.variance[0] - 2.0 * 0.5 * 10.0).abs() < 0.05);
        assert!((m.variance[1] - 2.0 * 0.25 * 10.0).abs() < 0.05);
    }

    #[test]
    fn test_first_step_offset_shifts_center() {
        let f = flow([2.0, 0.0], [0.5, 0.5]).with_first_step_offset(1.0);
        let mut s = solver(f, 1);
        s.inject(&Injection::surface(10.5, 40.5, 0, 1.0)).unwrap();
        let c = s.center_of_mass(TimeIndex::new(5)).unwrap();
        assert!((c[0] - (10.5 + 2.0 * 6.0)).abs() < 1e-6);
    }

    #[test]
    fn test_zero_dispersion_axis_collapses() {
        let mut s = solver(flow([1.0, 0.0], [0.0, 0.5]), 1);
        s.inject(&Injection::surface(5.5, 40.5, 0, 1.0)).unwrap();
        let t = TimeIndex::new(4);
        // All mass in column 9
        let column: f64 = (0..80)
            .map(|iy| s.mass(CellIndex::new(9, iy), t, MaterialIndex::ZERO))
            .sum();
        assert!((column - 1.0).abs() < 1e-6);
        assert!((s.total_mass(t) - column).abs() < TOL);
    }

    #[test]
    fn test_materials_are_separate_layers() {
        let mut s = solver(flow([0.0, 0.0], [0.2, 0.2]), 2);
        s.inject(&Injection::surface(50.0, 40.0, 0, 1.0)).unwrap();
        s.inject(&Injection::surface(50.0, 40.0, 0, 3.0).with_material(1))
            .unwrap();
        let t = TimeIndex::new(5);
        assert!((s.total_material_mass(t, MaterialIndex::new(0)) - 1.0).abs() < 1e-6);
        assert!((s.total_material_mass(t, MaterialIndex::new(1)) - 3.0).abs() < 1e-6);
        assert!((s.total_mass(t) - 4.0).abs() < 1e-6);

        let err = s
            .inject(&Injection::surface(1.0, 1.0, 0, 1.0).with_material(2))
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::MaterialOutOfRange {
                material: 2,
                n_materials: 2
            }
        );
    }

    #[test]
    fn test_before_injection_is_empty() {
        let mut s = solver(flow([0.0, 0.0], [0.2, 0.2]), 1);
        s.add_injection(Injection::surface(50.0, 40.0, 5000, 1.0));
        s.solve().unwrap();
        assert_eq!(s.total_mass(TimeIndex::new(4)), 0.0);
        assert_eq!(s.mass(CellIndex::new(50, 40), TimeIndex::new(5), MaterialIndex::ZERO), 1.0);
        assert_eq!(s.state(), SolverState::Solved);
    }

    #[test]
    fn test_reset_mass() {
        let mut s = solver(flow([0.0, 0.0], [0.2, 0.2]), 1);
        s.inject(&Injection::surface(50.0, 40.0, 0, 1.0)).unwrap();
        s.reset_mass();
        assert!(s.mass_grid().is_none());
        assert_eq!(s.state(), SolverState::Discretized);
    }

    #[test]
    fn test_validation() {
        assert!(SurfaceFlow::new([0.0, 0.0], 0.0, [0.1, 0.1]).is_err());
        assert!(SurfaceFlow::new([0.0, 0.0], 1.0, [-0.1, 0.1]).is_err());

        let raster = Arc::new(Raster2D::new((0.0, 0.0), 1.0, 1.0, 2, 2).unwrap());
        let axis = TimeAxis::uniform(0, 1000, 2).unwrap().shared();
        let bad = flow([0.0, 0.0], [0.1, 0.1]).with_elapsed_floor(0.0);
        assert!(SurfaceTransportSolver::new(raster.clone(), bad, axis.clone(), 1).is_err());
        assert!(SurfaceTransportSolver::new(raster, flow([0.0, 0.0], [0.1, 0.1]), axis, 0).is_err());
    }

    #[test]
    fn test_narrow_spread_stays_in_one_cell() {
        // sqrt(2Dτ) < 1 m cell on both axes until τ = 5 s
        let mut s = solver(flow([1.0, 1.0], [0.1, 0.1]), 1);
        s.inject(&Injection::surface(20.5, 30.5, 0, 2.0)).unwrap();
        for t in 1..5 {
            let t = TimeIndex::new(t);
            let k = t.get();
            assert_eq!(s.mass(CellIndex::new(20 + k, 30 + k), t, MaterialIndex::ZERO), 2.0);
            assert!((s.total_mass(t) - 2.0).abs() < TOL);
        }
        let t = TimeIndex::new(5);
        assert!(s.mass(CellIndex::new(25, 35), t, MaterialIndex::ZERO) < 2.0);
        assert!((s.total_mass(t) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_step_floor_uses_nominal_step() {
        let axis = TimeAxis::uniform(0, 1500, 4).unwrap();
        let f = flow([0.0, 0.0], [0.5, 0.5]).with_step_floor(&axis);
        assert_eq!(f.elapsed_floor, Some(1.5));

        let single = TimeAxis::uniform(0, 1500, 1).unwrap();
        let f = flow([0.0, 0.0], [0.5, 0.5]).with_step_floor(&single);
        let raster = Arc::new(Raster2D::new((0.0, 0.0), 1.0, 1.0, 2, 2).unwrap());
        assert!(SurfaceTransportSolver::new(raster, f, single.shared(), 1).is_err());
    }

    #[test]
    fn test_point_deposit_ignores_first_step_offset() {
        let f = flow([2.0, 0.0], [0.5, 0.5]).with_first_step_offset(3.0);
        let mut s = solver(f, 1);
        s.inject(&Injection::surface(10.5, 40.5, 0, 1.0)).unwrap();
        assert_eq!(s.mass(CellIndex::new(10, 40), TimeIndex::ZERO, MaterialIndex::ZERO), 1.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_sweep_matches_serial() {
        let raster = Raster2D::new((0.0, 0.0), 1.0, 1.0, 40, 30).unwrap();
        let f = flow([0.5, 0.25], [0.4, 0.3]);
        let mut serial = MassGrid::zeros(40, 30, 3, 2);
        let mut parallel = MassGrid::zeros(40, 30, 3, 2);

        for (k, (x0, y0, m)) in [(15.5, 12.0, 1.0), (20.0, 9.5, 0.5)].into_iter().enumerate() {
            let material = MaterialIndex::new(k);
            for t in 0..3 {
                let t = TimeIndex::new(t);
                let kernel = SeparableKernel::evaluate(&raster, &f, x0, y0, 4.0 + t.get() as f64);
                deposit_serial(&mut serial, &kernel, t, material, m);
                deposit_parallel(&mut parallel, &kernel, t, material, m);
            }
        }

        assert_eq!(serial.as_slice(), parallel.as_slice());
        assert!(serial.as_slice().iter().any(|&v| v > 0.0));
    }

    #[test]
    #[should_panic(expected = "cell C(100, 0) out of range")]
    fn test_cell_out_of_range() {
        let s = solver(flow([0.0, 0.0], [0.2, 0.2]), 1);
        s.mass(CellIndex::new(100, 0), TimeIndex::ZERO, MaterialIndex::ZERO);
    }
}
