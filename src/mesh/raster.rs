//! Regular raster discretization of a planar surface.

use crate::error::{Result, TransportError, ensure_finite, ensure_positive};
use crate::types::{Bounds2D, CellIndex};

/// Regular rectangular raster.
///
/// Cell `(ix, iy)` spans `[x0 + ix·dx, x0 + (ix+1)·dx) × [y0 + iy·dy, y0 + (iy+1)·dy)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster2D {
    /// Lower-left corner
    pub origin: (f64, f64),
    /// Cell width
    pub dx: f64,
    /// Cell height
    pub dy: f64,
    /// Cells in x
    pub nx: usize,
    /// Cells in y
    pub ny: usize,
}

impl Raster2D {
    /// Create a raster from origin, cell size and cell counts.
    ///
    /// # Errors
    /// `NonPositive` for zero cell counts or non-positive cell sizes.
    pub fn new(origin: (f64, f64), dx: f64, dy: f64, nx: usize, ny: usize) -> Result<Self> {
        ensure_finite("raster origin x", origin.0)?;
        ensure_finite("raster origin y", origin.1)?;
        let dx = ensure_positive("cell width", dx)?;
        let dy = ensure_positive("cell height", dy)?;
        if nx == 0 {
            return Err(TransportError::NonPositive {
                what: "cell count in x",
                value: 0.0,
            });
        }
        if ny == 0 {
            return Err(TransportError::NonPositive {
                what: "cell count in y",
                value: 0.0,
            });
        }
        Ok(Self {
            origin,
            dx,
            dy,
            nx,
            ny,
        })
    }

    /// Cover `bounds` with cells of size `dx × dy`, rounding the counts up.
    /// A degenerate axis still gets one cell.
    pub fn covering(bounds: Bounds2D, dx: f64, dy: f64) -> Result<Self> {
        let dx = ensure_positive("cell width", dx)?;
        let dy = ensure_positive("cell height", dy)?;
        let nx = ((bounds.width() / dx).ceil() as usize).max(1);
        let ny = ((bounds.height() / dy).ceil() as usize).max(1);
        Self::new((bounds.x_min, bounds.y_min), dx, dy, nx, ny)
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.nx * self.ny
    }

    #[inline]
    pub fn cell_area(&self) -> f64 {
        self.dx * self.dy
    }

    /// Spatial extent of the raster.
    pub fn bounds(&self) -> Bounds2D {
        Bounds2D::new(
            self.origin.0,
            self.origin.0 + self.nx as f64 * self.dx,
            self.origin.1,
            self.origin.1 + self.ny as f64 * self.dy,
        )
    }

    /// x-coordinate of the center of column `ix`.
    #[inline]
    pub fn center_x(&self, ix: usize) -> f64 {
        self.origin.0 + (ix as f64 + 0.5) * self.dx
    }

    /// y-coordinate of the center of row `iy`.
    #[inline]
    pub fn center_y(&self, iy: usize) -> f64 {
        self.origin.1 + (iy as f64 + 0.5) * self.dy
    }

    /// Center of a cell.
    pub fn cell_center(&self, cell: CellIndex) -> (f64, f64) {
        (self.center_x(cell.ix), self.center_y(cell.iy))
    }

    /// Column containing `x`, if inside the raster.
    pub fn column_containing(&self, x: f64) -> Option<usize> {
        let s = (x - self.origin.0) / self.dx;
        if s.is_nan() || s < 0.0 {
            return None;
        }
        let ix = s.floor() as usize;
        (ix < self.nx).then_some(ix)
    }

    /// Row containing `y`, if inside the raster.
    pub fn row_containing(&self, y: f64) -> Option<usize> {
        let s = (y - self.origin.1) / self.dy;
        if s.is_nan() || s < 0.0 {
            return None;
        }
        let iy = s.floor() as usize;
        (iy < self.ny).then_some(iy)
    }

    /// Cell containing `(x, y)`, if inside the raster.
    pub fn cell_containing(&self, x: f64, y: f64) -> Option<CellIndex> {
        Some(CellIndex::new(
            self.column_containing(x)?,
            self.row_containing(y)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_geometry() {
        let r = Raster2D::new((100.0, 200.0), 2.0, 4.0, 10, 5).unwrap();
        assert_eq!(r.n_cells(), 50);
        assert_eq!(r.cell_area(), 8.0);
        assert_eq!(r.cell_center(CellIndex::new(0, 0)), (101.0, 202.0));
        let b = r.bounds();
        assert_eq!((b.x_max, b.y_max), (120.0, 220.0));
    }

    #[test]
    fn test_invalid_raster() {
        assert!(Raster2D::new((0.0, 0.0), 0.0, 1.0, 1, 1).is_err());
        assert!(Raster2D::new((0.0, 0.0), 1.0, 1.0, 0, 1).is_err());
        assert!(Raster2D::new((f64::NAN, 0.0), 1.0, 1.0, 1, 1).is_err());
    }

    #[test]
    fn test_cell_containing() {
        let r = Raster2D::new((0.0, 0.0), 1.0, 1.0, 4, 4).unwrap();
        assert_eq!(r.cell_containing(2.5, 0.1), Some(CellIndex::new(2, 0)));
        assert_eq!(r.cell_containing(4.0, 0.1), None);
        assert_eq!(r.cell_containing(-0.5, 1.0), None);
    }

    #[test]
    fn test_covering_rounds_up() {
        let r = Raster2D::covering(Bounds2D::new(0.0, 10.5, 0.0, 3.0), 1.0, 1.0).unwrap();
        assert_eq!((r.nx, r.ny), (11, 3));

        let point = Bounds2D::new(4.0, 4.0, 2.0, 2.0);
        let r = Raster2D::covering(point, 1.0, 1.0).unwrap();
        assert_eq!((r.nx, r.ny), (1, 1));
        assert_eq!(r.cell_containing(4.0, 2.0), Some(CellIndex::new(0, 0)));
    }
}
