//! Dense accumulation grids owned by the transport solvers.
//!
//! Grids are written only by their owning solver; callers get `&` access.

use crate::types::{CellIndex, MaterialIndex, SegmentIndex, TimeIndex};

/// Channel concentration `c[segment][time]`.
///
/// Stored segment-major, so the time series of one segment is contiguous.
#[derive(Clone, Debug, PartialEq)]
pub struct ConcentrationGrid {
    n_segments: usize,
    n_times: usize,
    data: Vec<f64>,
}

impl ConcentrationGrid {
    /// Zeroed grid.
    pub fn zeros(n_segments: usize, n_times: usize) -> Self {
        Self {
            n_segments,
            n_times,
            data: vec![0.0; n_segments * n_times],
        }
    }

    pub fn n_segments(&self) -> usize {
        self.n_segments
    }

    pub fn n_times(&self) -> usize {
        self.n_times
    }

    #[inline]
    fn offset(&self, i: SegmentIndex, t: TimeIndex) -> usize {
        assert!(
            i.get() < self.n_segments,
            "segment {} out of range (0..{})",
            i,
            self.n_segments
        );
        assert!(
            t.get() < self.n_times,
            "timestep {} out of range (0..{})",
            t,
            self.n_times
        );
        i.get() * self.n_times + t.get()
    }

    /// Concentration at (segment, timestep).
    ///
    /// # Panics
    /// Panics if either index is out of range.
    #[inline]
    pub fn get(&self, i: SegmentIndex, t: TimeIndex) -> f64 {
        self.data[self.offset(i, t)]
    }

    #[inline]
    pub(crate) fn add(&mut self, i: SegmentIndex, t: TimeIndex, value: f64) {
        let k = self.offset(i, t);
        self.data[k] += value;
    }

    /// Time series of one segment.
    pub fn segment_series(&self, i: SegmentIndex) -> &[f64] {
        let start = self.offset(i, TimeIndex::ZERO);
        &self.data[start..start + self.n_times]
    }

    /// Concentrations of all segments at timestep `t`.
    pub fn profile(&self, t: TimeIndex) -> impl Iterator<Item = f64> + Clone + '_ {
        assert!(
            t.get() < self.n_times,
            "timestep {} out of range (0..{})",
            t,
            self.n_times
        );
        self.data.iter().skip(t.get()).step_by(self.n_times).copied()
    }

    /// Raw segment-major storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn fill_zero(&mut self) {
        self.data.iter_mut().for_each(|c| *c = 0.0);
    }
}

/// Surface mass `mass[x][y][time][material]`.
///
/// Stored with material varying fastest, then time, then y, then x, so one
/// raster column (fixed x) is a contiguous block.
#[derive(Clone, Debug, PartialEq)]
pub struct MassGrid {
    nx: usize,
    ny: usize,
    n_times: usize,
    n_materials: usize,
    data: Vec<f64>,
}

impl MassGrid {
    /// Zeroed grid.
    pub fn zeros(nx: usize, ny: usize, n_times: usize, n_materials: usize) -> Self {
        Self {
            nx,
            ny,
            n_times,
            n_materials,
            data: vec![0.0; nx * ny * n_times * n_materials],
        }
    }

    pub fn dims(&self) -> (usize, usize, usize, usize) {
        (self.nx, self.ny, self.n_times, self.n_materials)
    }

    /// Length of one raster column block.
    #[inline]
    pub(crate) fn column_len(&self) -> usize {
        self.ny * self.n_times * self.n_materials
    }

    /// Offset of (y, time, material) within a column block.
    #[inline]
    pub(crate) fn column_offset(&self, iy: usize, t: TimeIndex, m: MaterialIndex) -> usize {
        (iy * self.n_times + t.get()) * self.n_materials + m.get()
    }

    #[inline]
    fn offset(&self, cell: CellIndex, t: TimeIndex, m: MaterialIndex) -> usize {
        assert!(
            cell.ix < self.nx && cell.iy < self.ny,
            "cell {} out of range ({} x {})",
            cell,
            self.nx,
            self.ny
        );
        assert!(
            t.get() < self.n_times,
            "timestep {} out of range (0..{})",
            t,
            self.n_times
        );
        assert!(
            m.get() < self.n_materials,
            "material {} out of range (0..{})",
            m,
            self.n_materials
        );
        cell.ix * self.column_len() + self.column_offset(cell.iy, t, m)
    }

    /// Mass in a cell at (timestep, material).
    ///
    /// # Panics
    /// Panics if any index is out of range.
    #[inline]
    pub fn get(&self, cell: CellIndex, t: TimeIndex, m: MaterialIndex) -> f64 {
        self.data[self.offset(cell, t, m)]
    }

    /// Mass in a cell at timestep `t`, summed over materials.
    pub fn cell_total(&self, cell: CellIndex, t: TimeIndex) -> f64 {
        let start = self.offset(cell, t, MaterialIndex::ZERO);
        self.data[start..start + self.n_materials].iter().sum()
    }

    #[cfg(test)]
    pub(crate) fn add(&mut self, cell: CellIndex, t: TimeIndex, m: MaterialIndex, value: f64) {
        let k = self.offset(cell, t, m);
        self.data[k] += value;
    }

    /// Mutable column blocks, one per x index.
    pub(crate) fn columns_mut(&mut self) -> std::slice::ChunksExactMut<'_, f64> {
        let len = self.column_len();
        self.data.chunks_exact_mut(len)
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn par_columns_mut(&mut self) -> rayon::slice::ChunksExactMut<'_, f64> {
        use rayon::prelude::*;
        let len = self.column_len();
        self.data.par_chunks_exact_mut(len)
    }

    /// Raw storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
