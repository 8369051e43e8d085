//! Progress reporting for long solves.
//!
//! Solvers report advisory progress through a callback after each
//! (injection, timestep) sweep. The callback cannot cancel the solve.
//!
//! # Example
//!
//! ```
//! use adr_rs::solver::{ProgressReporter, SolveProgress};
//!
//! let mut reporter = ProgressReporter::new(25);
//! for done in 1..=8 {
//!     reporter.observe(SolveProgress::new(done, 8));
//! }
//! assert_eq!(reporter.last_reported_pct(), 100);
//! ```

use std::time::Instant;

/// Advisory solve progress, in units of (injection, timestep) sweeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolveProgress {
    /// Sweeps completed so far
    pub completed: usize,
    /// Sweeps scheduled for this solve
    pub total: usize,
}

impl SolveProgress {
    pub fn new(completed: usize, total: usize) -> Self {
        Self { completed, total }
    }

    /// Completed fraction in `[0, 1]`; an empty solve counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Logs solve progress at fixed percentage intervals.
///
/// Pass [`ProgressReporter::callback`] (or a closure calling
/// [`ProgressReporter::observe`]) to a solver's `solve_with_progress`.
pub struct ProgressReporter {
    /// Start time of the solve (wall clock)
    start_instant: Instant,
    /// Last reported progress percentage
    last_reported_pct: u32,
    /// Report interval in percentage points
    report_interval_pct: u32,
}

impl ProgressReporter {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    /// * `report_interval_pct` - Report every N percent (e.g., 10 for 10%, 20%, ...)
    pub fn new(report_interval_pct: u32) -> Self {
        Self {
            start_instant: Instant::now(),
            last_reported_pct: 0,
            report_interval_pct: report_interval_pct.clamp(1, 100),
        }
    }

    pub fn last_reported_pct(&self) -> u32 {
        self.last_reported_pct
    }

    /// Log progress if the next threshold has been reached.
    ///
    /// Returns true if progress was reported.
    pub fn observe(&mut self, progress: SolveProgress) -> bool {
        let pct = (progress.fraction() * 100.0) as u32;
        let threshold = self.last_reported_pct + self.report_interval_pct;

        if pct >= threshold || (pct == 100 && self.last_reported_pct < 100) {
            self.report(progress);
            self.last_reported_pct = if pct == 100 {
                100
            } else {
                (pct / self.report_interval_pct) * self.report_interval_pct
            };
            true
        } else {
            false
        }
    }

    /// Borrow as a solver callback.
    pub fn callback(&mut self) -> impl FnMut(SolveProgress) + '_ {
        move |p| {
            self.observe(p);
        }
    }

    fn report(&self, progress: SolveProgress) {
        let elapsed = self.start_instant.elapsed().as_secs_f64();
        let fraction = progress.fraction();

        let eta = if fraction > 0.001 {
            format_duration(elapsed / fraction - elapsed)
        } else {
            "calculating...".to_string()
        };

        log::info!(
            "[{:>5.1}%] {}/{} sweeps | elapsed={} | ETA={}",
            fraction * 100.0,
            progress.completed,
            progress.total,
            format_duration(elapsed),
            eta
        );
    }
}

/// Format a duration in seconds as human-readable string.
fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let s = secs - mins * 60.0;
        format!("{:.0}m{:.0}s", mins, s)
    } else {
        let hours = (secs / 3600.0).floor();
        let mins = ((secs - hours * 3600.0) / 60.0).floor();
        format!("{:.0}h{:.0}m", hours, mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction() {
        assert_eq!(SolveProgress::new(0, 0).fraction(), 1.0);
        assert_eq!(SolveProgress::new(1, 4).fraction(), 0.25);
    }

    #[test]
    fn test_reporter_thresholds() {
        let mut reporter = ProgressReporter::new(50);
        assert!(!reporter.observe(SolveProgress::new(1, 10)));
        assert!(reporter.observe(SolveProgress::new(5, 10)));
        assert_eq!(reporter.last_reported_pct(), 50);
        assert!(!reporter.observe(SolveProgress::new(6, 10)));
        assert!(reporter.observe(SolveProgress::new(10, 10)));
        assert_eq!(reporter.last_reported_pct(), 100);
        assert!(!reporter.observe(SolveProgress::new(10, 10)));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30.0s");
        assert_eq!(format_duration(90.0), "1m30s");
        assert_eq!(format_duration(3700.0), "1h1m");
    }
}
