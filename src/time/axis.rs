//! Shared time axis for all time-indexed arrays.
//!
//! Timestamps are integer milliseconds. Every grid that is indexed by time
//! holds the same axis through an `Arc`, so index `t` means the same
//! instant in a velocity field, a channel grid and a surface grid.

use std::sync::Arc;

use crate::error::{Result, TransportError};
use crate::types::TimeIndex;

/// Milliseconds per second.
pub const MILLIS_PER_SECOND: f64 = 1000.0;

/// Position on the time axis between two samples.
///
/// `fraction` is in `[0, 1)`; a fraction of exactly zero means the query
/// time coincides with `index`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalIndex {
    pub index: TimeIndex,
    pub fraction: f64,
}

/// Strictly increasing sequence of millisecond timestamps.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeAxis {
    millis: Vec<i64>,
}

impl TimeAxis {
    /// Create a time axis from explicit timestamps.
    ///
    /// # Errors
    /// - `EmptyTimeAxis` if no timestamps are given
    /// - `NonMonotonicTime` if timestamps are not strictly increasing
    pub fn new(millis: Vec<i64>) -> Result<Self> {
        if millis.is_empty() {
            return Err(TransportError::EmptyTimeAxis);
        }
        for i in 1..millis.len() {
            if millis[i] <= millis[i - 1] {
                return Err(TransportError::NonMonotonicTime { index: i });
            }
        }
        Ok(Self { millis })
    }

    /// Create `count` equally spaced timestamps starting at `start_millis`.
    pub fn uniform(start_millis: i64, step_millis: i64, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(TransportError::EmptyTimeAxis);
        }
        if step_millis <= 0 {
            return Err(TransportError::NonPositive {
                what: "time step",
                value: step_millis as f64,
            });
        }
        let millis = (0..count as i64)
            .map(|i| start_millis + i * step_millis)
            .collect();
        Ok(Self { millis })
    }

    /// Wrap in an `Arc` for sharing between grids.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Number of timestamps (never zero).
    pub fn len(&self) -> usize {
        self.millis.len()
    }

    /// Always false; an axis is never empty.
    pub fn is_empty(&self) -> bool {
        self.millis.is_empty()
    }

    /// Timestamp at `index` in milliseconds.
    ///
    /// # Panics
    /// Panics if `index` is outside the axis.
    #[inline]
    pub fn millis(&self, index: TimeIndex) -> i64 {
        self.millis[index]
    }

    /// All timestamps.
    pub fn as_slice(&self) -> &[i64] {
        &self.millis
    }

    pub fn first_millis(&self) -> i64 {
        self.millis[0]
    }

    pub fn last_millis(&self) -> i64 {
        self.millis[self.millis.len() - 1]
    }

    /// Last valid index.
    pub fn last_index(&self) -> TimeIndex {
        TimeIndex::new(self.millis.len() - 1)
    }

    /// Iterate over all indices.
    pub fn indices(&self) -> impl Iterator<Item = TimeIndex> + ExactSizeIterator {
        TimeIndex::iter(self.millis.len())
    }

    /// Seconds elapsed between `since_millis` and the timestamp at `index`.
    ///
    /// Negative when `index` lies before `since_millis`.
    #[inline]
    pub fn elapsed_seconds(&self, index: TimeIndex, since_millis: i64) -> f64 {
        (self.millis[index] - since_millis) as f64 / MILLIS_PER_SECOND
    }

    /// Mean spacing between timestamps in seconds (zero for a single sample).
    pub fn nominal_step_seconds(&self) -> f64 {
        if self.millis.len() < 2 {
            return 0.0;
        }
        (self.last_millis() - self.first_millis()) as f64
            / (self.millis.len() - 1) as f64
            / MILLIS_PER_SECOND
    }

    /// Exact lookup of a timestamp.
    pub fn index_of(&self, millis: i64) -> Option<TimeIndex> {
        self.millis.binary_search(&millis).ok().map(TimeIndex::new)
    }

    /// First index whose timestamp is at or after `millis`.
    pub fn first_index_at_or_after(&self, millis: i64) -> Option<TimeIndex> {
        let i = self.millis.partition_point(|&t| t < millis);
        (i < self.millis.len()).then(|| TimeIndex::new(i))
    }

    /// Fractional index for a query time.
    ///
    /// - Before the first timestamp: `(0, 0.0)` (clamped)
    /// - At or after the last timestamp: `(last, 0.0)` (clamped)
    /// - Otherwise: bracketing lower index and the fraction towards the next
    pub fn fractional_index(&self, millis: i64) -> FractionalIndex {
        if millis <= self.first_millis() {
            return FractionalIndex {
                index: TimeIndex::ZERO,
                fraction: 0.0,
            };
        }
        if millis >= self.last_millis() {
            return FractionalIndex {
                index: self.last_index(),
                fraction: 0.0,
            };
        }

        // partition_point returns the first entry > millis; lower bracket is one before.
        let upper = self.millis.partition_point(|&t| t <= millis);
        let lower = upper - 1;
        let t0 = self.millis[lower];
        let t1 = self.millis[upper];
        let fraction = if millis == t0 {
            0.0
        } else {
            (millis - t0) as f64 / (t1 - t0) as f64
        };

        FractionalIndex {
            index: TimeIndex::new(lower),
            fraction,
        }
    }
}
