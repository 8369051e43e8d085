//! Integration tests for the analytical channel solver.
//!
//! These tests verify:
//! 1. Mass conservation under pure advection
//! 2. Superposition of independent injections
//! 3. The zero-mass moment guard
//! 4. The reference scenario (1000 segments, 10 kg at segment 500)

use std::sync::Arc;

use adr_rs::mesh::ChannelMesh;
use adr_rs::solver::{ChannelFlow, ChannelTransportSolver, ProgressReporter, SolverState};
use adr_rs::source::Injection;
use adr_rs::time::TimeAxis;
use adr_rs::types::{SegmentIndex, TimeIndex};

const TOL: f64 = 1e-9;

/// 1000 m channel, 1 m segments, v = h = w = 1, one-second steps.
fn scenario_solver(dispersion: f64, steps: usize) -> ChannelTransportSolver {
    let mesh = Arc::new(ChannelMesh::uniform(1000.0, 1000).unwrap());
    let axis = TimeAxis::uniform(0, 1000, steps).unwrap().shared();
    let flow = ChannelFlow::new(1.0, 1.0, 1.0, dispersion).unwrap();
    ChannelTransportSolver::builder()
        .mesh(mesh)
        .flow(flow)
        .time_axis(axis)
        .build()
        .unwrap()
}

// ============================================================================
// Conservation
// ============================================================================

/// With D = 0 the linear split conserves Σ c·w·h·L = m at every t ≥ t0.
#[test]
fn test_mass_conservation_pure_advection() {
    let mesh = Arc::new(ChannelMesh::uniform(300.0, 120).unwrap());
    let axis = TimeAxis::uniform(0, 700, 60).unwrap().shared();
    let flow = ChannelFlow::new(0.83, 0.4, 2.5, 0.0).unwrap();
    let mut solver = ChannelTransportSolver::new(mesh, flow, axis.clone());

    let mass = 7.25;
    solver.inject_at_segment(SegmentIndex::new(10), 1400, mass);

    for t in axis.indices() {
        let m = solver.total_mass(t);
        if axis.millis(t) < 1400 {
            assert_eq!(m, 0.0);
        } else {
            assert!((m - mass).abs() < 1e-9, "mass {} at {}", m, t);
        }
    }
}

// ============================================================================
// Superposition
// ============================================================================

fn assert_superposes(dispersion: f64) {
    let a = Injection::channel(200.5, 0, 3.0);
    let b = Injection::channel(240.5, 5000, 5.0);

    let mut together = scenario_solver(dispersion, 40);
    together.add_injections([a, b]);
    together.solve().unwrap();

    let mut only_a = scenario_solver(dispersion, 40);
    only_a.inject(&a).unwrap();
    let mut only_b = scenario_solver(dispersion, 40);
    only_b.inject(&b).unwrap();

    let sum = together.concentration().as_slice();
    let pa = only_a.concentration().as_slice();
    let pb = only_b.concentration().as_slice();
    for k in 0..sum.len() {
        assert!((sum[k] - (pa[k] + pb[k])).abs() < 1e-12);
    }
}

#[test]
fn test_superposition_advection() {
    assert_superposes(0.0);
}

#[test]
fn test_superposition_dispersion() {
    assert_superposes(0.75);
}

#[test]
fn test_reset_then_resolve_matches_fresh_solve() {
    let mut solver = scenario_solver(0.5, 20);
    solver.inject(&Injection::channel(100.5, 0, 1.0)).unwrap();
    let first = solver.concentration().clone();

    solver.reset_concentration();
    assert_eq!(solver.state(), SolverState::Discretized);
    solver.inject(&Injection::channel(100.5, 0, 1.0)).unwrap();
    assert_eq!(solver.concentration(), &first);
}

// ============================================================================
// Moments
// ============================================================================

#[test]
fn test_moment_guard_for_empty_timesteps() {
    let mut solver = scenario_solver(0.0, 10);
    solver.inject(&Injection::channel(10.5, 5000, 1.0)).unwrap();

    let series = solver.moment_series();
    assert!(series[..5].iter().all(Option::is_none));
    assert!(series[5..].iter().all(Option::is_some));
    assert!(solver.first_moment(TimeIndex::new(2)).is_none());
    assert!(solver.second_moment(TimeIndex::new(2)).is_none());
}

#[test]
fn test_variance_grows_linearly_with_dispersion() {
    let d = 1.5;
    let mut solver = scenario_solver(d, 61);
    solver.inject(&Injection::channel(300.5, 0, 1.0)).unwrap();

    for t in [10, 30, 60] {
        let m = solver.moments(TimeIndex::new(t)).unwrap();
        let expected = 2.0 * d * t as f64;
        assert!(
            (m.variance - expected).abs() < 1e-3 * expected,
            "variance {} vs {} at t={}",
            m.variance,
            expected,
            t
        );
        assert!((m.centroid - (300.5 + t as f64)).abs() < 1e-6);
    }
}

// ============================================================================
// Reference scenario
// ============================================================================

/// 10 kg injected at segment 500 at t = 0; after 100 s the slug sits at 600.
#[test]
fn test_reference_scenario_peak_and_centroid() {
    let mut solver = scenario_solver(0.0, 101);
    solver.inject_at_segment(SegmentIndex::new(500), 0, 10.0);

    let t = TimeIndex::new(100);
    assert_eq!(solver.peak_segment(t), Some(SegmentIndex::new(600)));
    assert!((solver.concentration().get(SegmentIndex::new(600), t) - 10.0).abs() < TOL);

    let elsewhere: f64 = solver
        .concentration()
        .profile(t)
        .enumerate()
        .filter(|&(i, _)| i != 600)
        .map(|(_, c)| c)
        .sum();
    assert!(elsewhere.abs() < TOL);

    // Centerline of segment 600
    let m1 = solver.first_moment(t).unwrap();
    assert!((m1 - 600.5).abs() < 1e-9);
    assert!(solver.second_moment(t).unwrap().abs() < 1e-9);
}

#[test]
fn test_zero_elapsed_deposits_only_at_injection_segment() {
    let mut solver = scenario_solver(2.0, 5);
    solver.inject_at_segment(SegmentIndex::new(500), 0, 10.0);

    let t0 = TimeIndex::ZERO;
    for (i, c) in solver.concentration().profile(t0).enumerate() {
        if i == 500 {
            assert!((c - 10.0).abs() < TOL);
        } else {
            assert_eq!(c, 0.0);
        }
    }
}

#[test]
fn test_progress_reporter_callback() {
    let mut solver = scenario_solver(0.0, 50);
    solver.add_injection(Injection::channel(10.5, 0, 1.0));
    let mut reporter = ProgressReporter::new(10);
    solver.solve_with_progress(reporter.callback()).unwrap();
    assert_eq!(reporter.last_reported_pct(), 100);
}
