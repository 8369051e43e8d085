//! Equal-segment channel discretization.
//!
//! A channel of length `total_length` is split into `n_segments` segments of
//! length `L = total_length / n_segments`. Segment `i` spans `[i·L, (i+1)·L)`
//! and has its centerline at `(i + 0.5)·L`.

use crate::error::{Result, TransportError, ensure_positive};
use crate::types::SegmentIndex;

/// Uniform 1D channel discretization.
///
/// Constructed once and shared (`Arc<ChannelMesh>`) with every consumer
/// that needs segment positions.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelMesh {
    n_segments: usize,
    segment_length: f64,
    /// Centerline distance of each segment
    centerlines: Vec<f64>,
}

impl ChannelMesh {
    /// Create a uniform mesh of `[0, total_length]` with `n_segments` segments.
    ///
    /// # Errors
    /// `NonPositive` if the segment count or the length is not positive.
    pub fn uniform(total_length: f64, n_segments: usize) -> Result<Self> {
        if n_segments == 0 {
            return Err(TransportError::NonPositive {
                what: "segment count",
                value: 0.0,
            });
        }
        let total_length = ensure_positive("channel length", total_length)?;
        let segment_length = total_length / n_segments as f64;

        Ok(Self::from_parts(n_segments, segment_length))
    }

    /// Create a mesh from a segment count and segment length.
    pub fn with_segment_length(n_segments: usize, segment_length: f64) -> Result<Self> {
        if n_segments == 0 {
            return Err(TransportError::NonPositive {
                what: "segment count",
                value: 0.0,
            });
        }
        let segment_length = ensure_positive("segment length", segment_length)?;
        Ok(Self::from_parts(n_segments, segment_length))
    }

    fn from_parts(n_segments: usize, segment_length: f64) -> Self {
        let centerlines = (0..n_segments)
            .map(|i| (i as f64 + 0.5) * segment_length)
            .collect();
        Self {
            n_segments,
            segment_length,
            centerlines,
        }
    }

    #[inline]
    pub fn n_segments(&self) -> usize {
        self.n_segments
    }

    #[inline]
    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    /// Total channel length.
    pub fn length(&self) -> f64 {
        self.segment_length * self.n_segments as f64
    }

    /// Centerline distance of segment `i`.
    ///
    /// # Panics
    /// Panics if `i` is outside the discretization.
    #[inline]
    pub fn centerline(&self, i: SegmentIndex) -> f64 {
        self.centerlines[i]
    }

    /// Centerline distances of all segments.
    pub fn centerlines(&self) -> &[f64] {
        &self.centerlines
    }

    /// Segment containing distance `x`, or `None` outside `[0, length)`.
    pub fn segment_containing(&self, x: f64) -> Option<SegmentIndex> {
        if x.is_nan() || x < 0.0 {
            return None;
        }
        let i = (x / self.segment_length).floor() as usize;
        (i < self.n_segments).then(|| SegmentIndex::new(i))
    }

    /// Fraction of segment `i` covered by the span `[start, stop]`.
    pub fn coverage(&self, i: SegmentIndex, start: f64, stop: f64) -> f64 {
        let (lo, hi) = if start <= stop { (start, stop) } else { (stop, start) };
        let seg_lo = i.get() as f64 * self.segment_length;
        let seg_hi = seg_lo + self.segment_length;
        let overlap = hi.min(seg_hi) - lo.max(seg_lo);
        (overlap / self.segment_length).clamp(0.0, 1.0)
    }
}
