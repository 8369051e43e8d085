//! Axis-aligned horizontal extents.

use std::fmt;

/// Horizontal bounding box `[x_min, x_max] × [y_min, y_max]`.
///
/// # Example
///
/// ```
/// use adr_rs::types::Bounds2D;
///
/// let b = Bounds2D::from_points([(3.0, 1.0), (-1.0, 4.0)]).unwrap();
/// assert_eq!((b.width(), b.height()), (4.0, 3.0));
/// assert!(b.expanded(0.5).contains(-1.5, 4.5));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2D {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Bounds2D {
    /// # Panics
    ///
    /// Panics if either axis is inverted or not finite.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        assert!(
            x_min.is_finite() && x_max.is_finite() && x_min <= x_max,
            "invalid x extent [{}, {}]",
            x_min,
            x_max
        );
        assert!(
            y_min.is_finite() && y_max.is_finite() && y_min <= y_max,
            "invalid y extent [{}, {}]",
            y_min,
            y_max
        );
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Smallest box holding every finite point; `None` if there are none.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        points
            .into_iter()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .fold(None, |acc: Option<Self>, (x, y)| {
                Some(match acc {
                    None => Self {
                        x_min: x,
                        x_max: x,
                        y_min: y,
                        y_max: y,
                    },
                    Some(b) => Self {
                        x_min: b.x_min.min(x),
                        x_max: b.x_max.max(x),
                        y_min: b.y_min.min(y),
                        y_max: b.y_max.max(y),
                    },
                })
            })
    }

    /// Grow every side by `margin`; negative margins are clamped to zero.
    pub fn expanded(&self, margin: f64) -> Self {
        let m = margin.max(0.0);
        Self {
            x_min: self.x_min - m,
            x_max: self.x_max + m,
            y_min: self.y_min - m,
            y_max: self.y_max + m,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Inclusive on all four edges.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (self.x_min..=self.x_max).contains(&x) && (self.y_min..=self.y_max).contains(&y)
    }
}

impl fmt::Display for Bounds2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x [{:.2}, {:.2}] y [{:.2}, {:.2}]",
            self.x_min, self.x_max, self.y_min, self.y_max
        )
    }
}
